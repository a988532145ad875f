//! Forward race simulation: one decision turn at a time, with continuous
//! collision handling inside the turn.

use crate::command::{Plan, PodCommand};
use crate::constants::{
    CHECKPOINT_RADIUS_SQ, CONTROLLED_PODS, FRICTION, MAX_SUBSTEPS, TURN_DURATION,
};
use crate::pod::Pod;
use crate::track::Track;


#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    pub a: usize,
    pub b: usize,
    pub time: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    pub collisions: u32,
    pub captures: u32,
}

/// Track plus roster shape. The first `controlled` pods receive commands;
/// the rest coast on their current velocity.
#[derive(Clone, Debug)]
pub struct Race {
    track: Track,
    controlled: usize,
}

impl Race {
    pub fn new(track: Track, controlled: usize) -> Self {
        Self { track, controlled }
    }

    pub fn standard(track: Track) -> Self {
        Self::new(track, CONTROLLED_PODS)
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn controlled(&self) -> usize {
        self.controlled
    }

    /// Advances every pod by one turn. `turn` holds one command per controlled pod.
    pub fn step(&self, pods: &mut [Pod], turn: &[PodCommand]) -> TurnOutcome {
        let controlled = self.controlled.min(turn.len()).min(pods.len());

        for (pod, cmd) in pods.iter_mut().zip(turn).take(controlled) {
            pod.rotate(cmd.rotation);
        }
        for (pod, cmd) in pods.iter_mut().zip(turn).take(controlled) {
            pod.accelerate(cmd.thrust, cmd.boost, cmd.shield);
        }

        let outcome = self.integrate(pods);

        for pod in pods.iter_mut() {
            pod.velocity *= FRICTION;
            pod.snap();
        }
        outcome
    }

    pub fn rollout(&self, pods: &mut [Pod], plan: &Plan) -> TurnOutcome {
        let mut total = TurnOutcome::default();
        for turn in &plan.turns {
            let outcome = self.step(pods, turn);
            total.collisions += outcome.collisions;
            total.captures += outcome.captures;
        }
        total
    }

    fn integrate(&self, pods: &mut [Pod]) -> TurnOutcome {
        debug_assert!(pods.len() <= u64::BITS as usize);
        let mut captured = 0u64;
        let mut outcome = TurnOutcome::default();
        let mut t = 0.0;

        for substep in 0.. {
            let remaining = TURN_DURATION - t;
            let hit = if substep < MAX_SUBSTEPS {
                earliest_collision(pods, remaining)
            } else {
                None
            };
            let dt = hit.map_or(remaining, |c| c.time);

            for pod in pods.iter_mut() {
                pod.advance(dt);
            }
            outcome.captures += self.capture_checkpoints(pods, &mut captured);

            let Some(collision) = hit else {
                break;
            };
            let (a, b) = pair_mut(pods, collision.a, collision.b);
            a.rebound(b);
            outcome.collisions += 1;
            t += dt;
        }
        outcome
    }

    /// Each pod may advance its target at most once per turn; `captured` is
    /// the per-turn bitmask of pods that already did.
    fn capture_checkpoints(&self, pods: &mut [Pod], captured: &mut u64) -> u32 {
        let mut count = 0;
        for (i, pod) in pods.iter_mut().enumerate() {
            let bit = 1u64 << i;
            if *captured & bit != 0 {
                continue;
            }
            let checkpoint = self.track.checkpoint(pod.target);
            if pod.position.dist_sq(checkpoint) < CHECKPOINT_RADIUS_SQ {
                pod.target = self.track.next_index(pod.target);
                pod.passed += 1;
                *captured |= bit;
                count += 1;
            }
        }
        count
    }
}

/// Scans every pair for the earliest contact strictly before `within`.
pub fn earliest_collision(pods: &[Pod], within: f64) -> Option<Collision> {
    let mut best: Option<Collision> = None;
    for a in 0..pods.len() {
        for b in (a + 1)..pods.len() {
            let time = pods[a].collision_time(&pods[b]);
            let limit = best.map_or(within, |c| c.time);
            if time < limit {
                best = Some(Collision { a, b, time });
            }
        }
    }
    best
}

fn pair_mut(pods: &mut [Pod], a: usize, b: usize) -> (&mut Pod, &mut Pod) {
    debug_assert!(a < b);
    let (head, tail) = pods.split_at_mut(b);
    (&mut head[a], &mut tail[0])
}
