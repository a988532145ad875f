//! Anytime plan search: a small population of multi-turn plans, each
//! generation mutating one control per plan and keeping the best half.

use std::time::{Duration, Instant};

use pod_race_core::constants::{MAX_ROTATION_DEG, MAX_THRUST};
use pod_race_core::fitness::evaluate;
use pod_race_core::rng::SeededRng;
use pod_race_core::{FitnessWeights, Plan, Pod, PodCommand, Race, TurnCommands};

use crate::config::PlannerConfig;

/// When the generation loop must stop. Checked before every generation only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Budget {
    Deadline(Instant),
    Generations(u32),
}

impl Budget {
    pub fn within(duration: Duration) -> Self {
        Self::Deadline(Instant::now() + duration)
    }

    fn allows(&self, completed: u32) -> bool {
        match *self {
            Self::Deadline(deadline) => Instant::now() < deadline,
            Self::Generations(limit) => completed < limit,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchReport {
    pub generations: u32,
    pub evaluations: u32,
    pub best_fitness: f64,
}

pub struct Planner {
    race: Race,
    weights: FitnessWeights,
    mutation: [u32; 4],
    flag_chance_pct: u32,
    population_size: usize,
    rng: SeededRng,
    population: Vec<Plan>,
    primed: bool,
    scratch: Vec<Pod>,
}

impl Planner {
    /// Seeds a random population. A long opening straight makes every plan
    /// open with boost on every controlled pod.
    pub fn new(cfg: &PlannerConfig, race: Race) -> Self {
        let mut rng = SeededRng::new(cfg.seed);
        let horizon = cfg.horizon.max(1);
        let population_size = cfg.population.max(1);
        let pods = race.controlled();

        let mut population: Vec<Plan> = (0..population_size)
            .map(|_| {
                let turns = (0..horizon)
                    .map(|_| random_turn(&mut rng, pods, cfg.flag_chance_pct))
                    .collect();
                Plan::new(turns)
            })
            .collect();

        if race.track().opening_stretch_sq() > cfg.boost_opening_threshold_sq {
            for plan in &mut population {
                if let Some(first) = plan.turns.first_mut() {
                    for cmd in first.iter_mut() {
                        cmd.boost = true;
                    }
                }
            }
        }

        Self {
            race,
            weights: cfg.weights(),
            mutation: cfg.mutation.as_array(),
            flag_chance_pct: cfg.flag_chance_pct,
            population_size,
            rng,
            population,
            primed: false,
            scratch: Vec::new(),
        }
    }

    pub fn race(&self) -> &Race {
        &self.race
    }

    pub fn population(&self) -> &[Plan] {
        &self.population
    }

    /// Top-ranked plan of the last completed generation.
    pub fn best(&self) -> &Plan {
        &self.population[0]
    }

    /// Runs one decision cycle from the ground-truth `pods`.
    ///
    /// Every cycle after the first starts by shifting each surviving plan one
    /// turn forward. The population is always fully scored on return, even if
    /// the budget allows no generation at all.
    pub fn search(&mut self, pods: &[Pod], budget: Budget) -> SearchReport {
        if self.primed {
            for i in 0..self.population.len() {
                let tail =
                    random_turn(&mut self.rng, self.race.controlled(), self.flag_chance_pct);
                self.population[i].shift(tail);
            }
        }
        self.primed = true;

        let mut evaluations = 0;
        for plan in &mut self.population {
            score_plan(&self.race, &self.weights, &mut self.scratch, pods, plan);
            evaluations += 1;
        }
        self.population.sort_by(Plan::rank);

        let mut generations = 0;
        while budget.allows(generations) {
            let parents = self.population.len();
            for i in 0..parents {
                let mut child = self.population[i].clone();
                mutate(&mut self.rng, &mut child, &self.mutation);
                score_plan(&self.race, &self.weights, &mut self.scratch, pods, &mut child);
                evaluations += 1;
                self.population.push(child);
            }
            self.population.sort_by(Plan::rank);
            self.population.truncate(self.population_size);
            generations += 1;
        }

        SearchReport {
            generations,
            evaluations,
            best_fitness: self.best().fitness,
        }
    }
}

/// Rolls `plan` out on a private copy of `snapshot` and stores its fitness.
pub fn score_plan(
    race: &Race,
    weights: &FitnessWeights,
    scratch: &mut Vec<Pod>,
    snapshot: &[Pod],
    plan: &mut Plan,
) {
    scratch.clear();
    scratch.extend_from_slice(snapshot);
    race.rollout(scratch, plan);
    plan.fitness = evaluate(race, scratch, weights);
}

/// Biased toward the extremes and toward going straight: draws above 36 mean
/// "no turn", the rest saturate at the rotation limit.
fn random_rotation(rng: &mut SeededRng) -> i32 {
    let r = rng.next_range(-36, 54);
    if r > 36 {
        0
    } else {
        r.clamp(-MAX_ROTATION_DEG, MAX_ROTATION_DEG)
    }
}

/// Negative draws coast, draws past the cap run at full thrust.
fn random_thrust(rng: &mut SeededRng) -> i32 {
    rng.next_range(-50, 200).clamp(0, MAX_THRUST)
}

fn random_command(rng: &mut SeededRng, flag_chance_pct: u32) -> PodCommand {
    let mut cmd = PodCommand::new(random_rotation(rng), random_thrust(rng));
    cmd.shield = rng.chance_pct(flag_chance_pct);
    cmd.boost = rng.chance_pct(flag_chance_pct);
    cmd
}

pub fn random_turn(rng: &mut SeededRng, pods: usize, flag_chance_pct: u32) -> TurnCommands {
    (0..pods)
        .map(|_| random_command(rng, flag_chance_pct))
        .collect()
}

/// Resamples or toggles exactly one field of one pod in one turn.
fn mutate(rng: &mut SeededRng, plan: &mut Plan, weights: &[u32; 4]) {
    if plan.turns.is_empty() {
        return;
    }
    let turn = rng.next_index(plan.turns.len());
    let commands = &mut plan.turns[turn];
    if commands.is_empty() {
        return;
    }
    let pod = rng.next_index(commands.len());
    let field = rng.pick_weighted(weights);

    let cmd = &mut commands[pod];
    match field {
        0 => cmd.rotation = random_rotation(rng),
        1 => cmd.thrust = random_thrust(rng),
        2 => cmd.shield = !cmd.shield,
        _ => cmd.boost = !cmd.boost,
    }
    plan.fitness = f64::NEG_INFINITY;
}
