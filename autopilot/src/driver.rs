use std::io::{self, BufRead, Write};
use std::iter::Peekable;

use anyhow::{Context, Result};
use pod_race_core::constants::TOTAL_PODS;
use pod_race_core::protocol::{parse_telemetry, parse_track, ActionLine, PodTelemetry};
use pod_race_core::{Pod, Race, Track};
use tracing::{debug, info};

use crate::config::PlannerConfig;
use crate::search::{Budget, Planner, SearchReport};

/// Decision-cycle state for one team: the ground-truth pods as last reported,
/// plus the planner that carries its population from cycle to cycle.
pub struct Driver {
    cfg: PlannerConfig,
    planner: Planner,
    pods: Vec<Pod>,
    turn: u32,
}

impl Driver {
    pub fn new(cfg: PlannerConfig, track: Track) -> Self {
        let race = Race::standard(track);
        let planner = Planner::new(&cfg, race);
        Self {
            cfg,
            planner,
            pods: vec![Pod::default(); TOTAL_PODS],
            turn: 0,
        }
    }

    pub fn pods(&self) -> &[Pod] {
        &self.pods
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Budget for the next decision, already reduced by the safeguard.
    pub fn next_budget(&self) -> Budget {
        Budget::within(self.cfg.turn_budget(self.turn == 0))
    }

    /// Folds one telemetry block into the ground-truth pods.
    ///
    /// A change of target counts as one checkpoint passed. The very first
    /// report therefore counts the start line, which the fitness accounts for
    /// by requiring strictly more than the lap total.
    pub fn observe(&mut self, telemetry: &[PodTelemetry]) {
        let track = self.planner.race().track();
        for (pod, seen) in self.pods.iter_mut().zip(telemetry) {
            pod.position = seen.position();
            pod.velocity = seen.velocity();

            if seen.angle >= 0 {
                pod.heading = Some(seen.angle.rem_euclid(360));
            } else if pod.heading.is_none() {
                let toward = track.checkpoint(1) - pod.position;
                let heading = toward.normalized().map_or(0, |dir| dir.degrees() as i32);
                pod.heading = Some(heading);
            }

            if seen.next_checkpoint != pod.target {
                pod.target = seen.next_checkpoint;
                pod.passed += 1;
            }
        }
    }

    /// Searches, emits the first turn of the best plan and commits the
    /// shield and boost it used.
    pub fn decide(&mut self, budget: Budget) -> (Vec<ActionLine>, SearchReport) {
        let report = self.planner.search(&self.pods, budget);
        let mut actions = Vec::new();
        if let Some(turn) = self.planner.best().first_turn() {
            for (pod, cmd) in self.pods.iter_mut().zip(turn) {
                actions.push(ActionLine::for_command(pod, cmd));
                pod.manage_shield(cmd.shield);
                if pod.shield_cooldown == 0 && cmd.boost {
                    pod.use_boost();
                }
            }
        }
        self.turn += 1;
        (actions, report)
    }
}

/// Line iterator that stops at the first read error and keeps it for later.
struct LineSource<B: BufRead> {
    lines: Peekable<io::Lines<B>>,
    error: Option<io::Error>,
}

impl<B: BufRead> LineSource<B> {
    fn new(input: B) -> Self {
        Self {
            lines: input.lines().peekable(),
            error: None,
        }
    }

    fn at_eof(&mut self) -> bool {
        self.lines.peek().is_none()
    }

    fn check(&mut self) -> Result<()> {
        match self.error.take() {
            Some(err) => Err(err).context("failed reading input"),
            None => Ok(()),
        }
    }
}

impl<B: BufRead> Iterator for LineSource<B> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match self.lines.next()? {
            Ok(line) => Some(line),
            Err(err) => {
                self.error = Some(err);
                None
            }
        }
    }
}

/// Plays one race over the text protocol. Returns the number of decisions
/// made once the input ends cleanly between two turns.
pub fn run_session<R, W>(cfg: PlannerConfig, input: R, mut output: W) -> Result<u32>
where
    R: BufRead,
    W: Write,
{
    let mut lines = LineSource::new(input);
    let parsed = parse_track(&mut lines);
    lines.check()?;
    let track = parsed.context("failed reading track header")?;
    info!(
        laps = track.laps(),
        checkpoints = track.len(),
        planner = %cfg.id,
        "track loaded"
    );

    let mut driver = Driver::new(cfg, track.clone());
    while !lines.at_eof() {
        let parsed = parse_telemetry(&mut lines, TOTAL_PODS, &track);
        lines.check()?;
        let telemetry =
            parsed.with_context(|| format!("bad telemetry on turn {}", driver.turn()))?;

        let budget = driver.next_budget();
        driver.observe(&telemetry);
        let (actions, report) = driver.decide(budget);
        debug!(
            turn = driver.turn(),
            generations = report.generations,
            evaluations = report.evaluations,
            best_fitness = report.best_fitness,
            "decision"
        );

        for action in &actions {
            writeln!(output, "{action}").context("failed writing action")?;
        }
        output.flush().context("failed flushing actions")?;
    }
    lines.check()?;

    info!(turns = driver.turn(), "input closed");
    Ok(driver.turn())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pod_race_core::Vec2;

    fn track() -> Track {
        Track::new(
            3,
            vec![
                Vec2::new(1_000.0, 1_000.0),
                Vec2::new(1_000.0, 5_000.0),
                Vec2::new(8_000.0, 3_000.0),
            ],
        )
        .expect("non-empty")
    }

    fn seen(x: i32, y: i32, angle: i32, next_checkpoint: usize) -> PodTelemetry {
        PodTelemetry {
            x,
            y,
            vx: 0,
            vy: 0,
            angle,
            next_checkpoint,
        }
    }

    #[test]
    fn first_sight_points_unknown_headings_at_checkpoint_one() {
        let mut driver = Driver::new(PlannerConfig::default(), track());
        driver.observe(&[
            seen(1_000, 1_000, -1, 1),
            seen(1_000, 5_000, -1, 1),
            seen(3_000, 1_000, 200, 1),
            seen(0, 0, -1, 1),
        ]);

        let headings: Vec<_> = driver.pods().iter().map(|p| p.heading).collect();
        assert_eq!(headings[0], Some(90));
        assert_eq!(headings[1], Some(0), "already on the checkpoint");
        assert_eq!(headings[2], Some(200));
    }

    #[test]
    fn target_changes_count_as_passed_checkpoints() {
        let mut driver = Driver::new(PlannerConfig::default(), track());
        let block = |next| vec![seen(0, 0, 0, next); TOTAL_PODS];

        driver.observe(&block(1));
        driver.observe(&block(1));
        driver.observe(&block(2));
        driver.observe(&block(0));

        assert!(driver.pods().iter().all(|p| p.passed == 3 && p.target == 0));
    }

    #[test]
    fn committing_a_boost_spends_it() {
        let mut driver = Driver::new(PlannerConfig::default(), track());
        driver.observe(&[
            seen(1_000, 1_000, -1, 1),
            seen(2_000, 1_000, -1, 1),
            seen(5_000, 1_000, -1, 1),
            seen(6_000, 1_000, -1, 1),
        ]);

        let (actions, _) = driver.decide(Budget::Generations(0));

        assert_eq!(actions.len(), 2);
        assert_eq!(driver.turn(), 1);
        for (pod, action) in driver.pods().iter().zip(&actions) {
            let spent = !pod.boost_available();
            let shielded = pod.shield_cooldown > 0;
            assert!(!(spent && shielded));
            assert_eq!(spent, action.power == pod_race_core::protocol::Power::Boost);
        }
    }
}
