//! Offline referee: generates a track, plays two planners against each other
//! through the text protocol and the shared simulator.

use anyhow::{anyhow, Context, Result};
use pod_race_core::constants::{MAX_ROTATION_DEG, MAX_THRUST, TOTAL_PODS};
use pod_race_core::fitness::pod_score;
use pod_race_core::protocol::{ActionLine, PodTelemetry, Power};
use pod_race_core::rng::SeededRng;
use pod_race_core::{FitnessWeights, Pod, PodCommand, Race, Track, Vec2};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PlannerConfig;
use crate::driver::Driver;
use crate::search::Budget;
use crate::util::seed_to_hex;

pub const FIELD_WIDTH: i32 = 16_000;
pub const FIELD_HEIGHT: i32 = 9_000;
pub const FIELD_MARGIN: i32 = 1_000;
pub const RACE_LAPS: u32 = 3;
pub const MIN_CHECKPOINTS: i32 = 3;
pub const MAX_CHECKPOINTS: i32 = 8;
pub const MIN_SEPARATION: f64 = 2_500.0;
const PLACEMENT_ATTEMPTS: u32 = 10_000;
/// Distances from the start line's centre, home pods first.
const GRID_OFFSETS: [f64; TOTAL_PODS] = [-500.0, 1_500.0, 500.0, -1_500.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Home,
    Away,
}

impl Team {
    pub fn of_pod(index: usize) -> Self {
        if index < TOTAL_PODS / 2 {
            Self::Home
        } else {
            Self::Away
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finish {
    Completed,
    TurnLimit,
}

#[derive(Clone, Debug)]
pub struct ArenaConfig {
    pub home: PlannerConfig,
    pub away: PlannerConfig,
    pub max_turns: u32,
    /// Generations per decision. Fixed counts keep races reproducible.
    pub generations: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            home: PlannerConfig::default(),
            away: PlannerConfig::default(),
            max_turns: 400,
            generations: 40,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RaceResult {
    pub seed: u32,
    pub seed_hex: String,
    pub home: String,
    pub away: String,
    pub laps: u32,
    pub checkpoints: usize,
    pub required: u32,
    pub turns: u32,
    pub finish: Finish,
    pub winner: Option<Team>,
    pub passed: Vec<u32>,
    pub collisions: u32,
}

/// Random checkpoints inside the field, pairwise at least `MIN_SEPARATION` apart.
pub fn random_track(rng: &mut SeededRng) -> Result<Track> {
    let wanted = rng.next_range(MIN_CHECKPOINTS, MAX_CHECKPOINTS + 1) as usize;
    let mut checkpoints: Vec<Vec2> = Vec::with_capacity(wanted);

    for _ in 0..PLACEMENT_ATTEMPTS {
        if checkpoints.len() == wanted {
            break;
        }
        let candidate = Vec2::new(
            rng.next_range(FIELD_MARGIN, FIELD_WIDTH - FIELD_MARGIN) as f64,
            rng.next_range(FIELD_MARGIN, FIELD_HEIGHT - FIELD_MARGIN) as f64,
        );
        if checkpoints
            .iter()
            .all(|cp| cp.dist(candidate) >= MIN_SEPARATION)
        {
            checkpoints.push(candidate);
        }
    }

    if checkpoints.len() < MIN_CHECKPOINTS as usize {
        return Err(anyhow!("could only place {} checkpoints", checkpoints.len()));
    }
    Track::new(RACE_LAPS, checkpoints).context("generated track is empty")
}

/// Four pods abreast on the line through checkpoint 0, perpendicular to the
/// opening stretch, all heading for checkpoint 1.
pub fn starting_grid(track: &Track) -> Vec<Pod> {
    let start = track.checkpoint(0);
    let along = (track.checkpoint(1) - start)
        .normalized()
        .unwrap_or(Vec2::new(1.0, 0.0));
    let across = Vec2::new(-along.y, along.x);

    GRID_OFFSETS
        .iter()
        .map(|&offset| {
            Pod::new((start + across * offset).rounded()).with_progress(track.next_index(0), 0)
        })
        .collect()
}

/// Telemetry from one team's point of view: its own pods come first.
pub fn telemetry_for(pods: &[Pod], team: Team) -> Vec<PodTelemetry> {
    let half = pods.len() / 2;
    let (own, other) = match team {
        Team::Home => (&pods[..half], &pods[half..]),
        Team::Away => (&pods[half..], &pods[..half]),
    };
    own.iter()
        .chain(other)
        .map(PodTelemetry::from_pod)
        .collect()
}

/// Turns an action line back into a command for `pod`. Rotation is limited
/// per turn except on the very first one, where the pod may face anywhere.
pub fn command_from_action(pod: &Pod, action: &ActionLine) -> PodCommand {
    let toward = Vec2::from(action.target) - pod.position;
    let rotation = match (toward.normalized(), pod.heading) {
        (None, _) => 0,
        (Some(dir), None) => dir.degrees().round() as i32,
        (Some(dir), Some(heading)) => {
            let desired = dir.degrees().round() as i32;
            let delta = (desired - heading + 540).rem_euclid(360) - 180;
            delta.clamp(-MAX_ROTATION_DEG, MAX_ROTATION_DEG)
        }
    };

    let mut cmd = PodCommand {
        rotation,
        ..PodCommand::default()
    };
    match action.power {
        Power::Thrust(thrust) => cmd.thrust = thrust,
        Power::Shield => cmd.shield = true,
        Power::Boost => {
            cmd.thrust = MAX_THRUST;
            cmd.boost = true;
        }
    }
    cmd
}

fn agent_actions(
    driver: &mut Driver,
    pods: &[Pod],
    team: Team,
    budget: Budget,
) -> Result<Vec<ActionLine>> {
    driver.observe(&telemetry_for(pods, team));
    let (actions, _) = driver.decide(budget);
    let mut parsed = Vec::with_capacity(actions.len());
    for action in actions {
        let text = action.to_string();
        parsed.push(
            text.parse::<ActionLine>()
                .with_context(|| format!("{team:?} emitted unreadable action {text:?}"))?,
        );
    }
    Ok(parsed)
}

pub fn run_race(seed: u32, cfg: &ArenaConfig) -> Result<RaceResult> {
    let mut rng = SeededRng::new(seed);
    let track = random_track(&mut rng)
        .with_context(|| format!("track generation failed for seed {}", seed_to_hex(seed)))?;
    let required = track.total_required();

    let home_cfg = PlannerConfig {
        seed: seed ^ 0x0000_0001,
        ..cfg.home.clone()
    };
    let away_cfg = PlannerConfig {
        seed: seed ^ 0x0000_0002,
        ..cfg.away.clone()
    };
    let mut home = Driver::new(home_cfg, track.clone());
    let mut away = Driver::new(away_cfg, track.clone());

    let race = Race::new(track.clone(), TOTAL_PODS);
    let mut pods = starting_grid(&track);
    let budget = Budget::Generations(cfg.generations);

    let mut turns = 0;
    let mut collisions = 0;
    let mut finished = false;
    while turns < cfg.max_turns {
        let home_actions = agent_actions(&mut home, &pods, Team::Home, budget)?;
        let away_actions = agent_actions(&mut away, &pods, Team::Away, budget)?;

        let turn: Vec<PodCommand> = pods
            .iter()
            .zip(home_actions.iter().chain(&away_actions))
            .map(|(pod, action)| command_from_action(pod, action))
            .collect();

        collisions += race.step(&mut pods, &turn).collisions;
        turns += 1;

        if pods.iter().any(|p| p.passed >= required) {
            finished = true;
            break;
        }
    }

    let winner = if finished {
        decide_by(&pods, |p| p.passed as f64)
    } else {
        let weights = FitnessWeights::default();
        decide_by(&pods, |p| pod_score(&track, p, weights.checkpoint_bonus))
    };

    let result = RaceResult {
        seed,
        seed_hex: seed_to_hex(seed),
        home: cfg.home.id.clone(),
        away: cfg.away.id.clone(),
        laps: track.laps(),
        checkpoints: track.len(),
        required,
        turns,
        finish: if finished {
            Finish::Completed
        } else {
            Finish::TurnLimit
        },
        winner,
        passed: pods.iter().map(|p| p.passed).collect(),
        collisions,
    };
    info!(
        seed = %result.seed_hex,
        turns = result.turns,
        winner = ?result.winner,
        "race finished"
    );
    Ok(result)
}

/// Team of the pod with the strictly highest metric; `None` on a cross-team tie.
fn decide_by<F>(pods: &[Pod], metric: F) -> Option<Team>
where
    F: Fn(&Pod) -> f64,
{
    let best_of = |team: Team| {
        pods.iter()
            .enumerate()
            .filter(|(i, _)| Team::of_pod(*i) == team)
            .map(|(_, p)| metric(p))
            .fold(f64::NEG_INFINITY, f64::max)
    };
    let home = best_of(Team::Home);
    let away = best_of(Team::Away);
    if home > away {
        Some(Team::Home)
    } else if away > home {
        Some(Team::Away)
    } else {
        None
    }
}
