//! Scores a simulated end state from the controlled team's point of view.

use serde::{Deserialize, Serialize};

use crate::constants::{CHECKPOINT_BONUS, PROGRESS_BIAS};
use crate::pod::Pod;
use crate::sim::Race;
use crate::track::Track;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitnessWeights {
    /// Reward per checkpoint passed; must dwarf any single-turn distance change.
    pub checkpoint_bonus: f64,
    /// Weight of the race-progress difference over the blocking term.
    pub bias: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            checkpoint_bonus: CHECKPOINT_BONUS,
            bias: PROGRESS_BIAS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roles {
    pub lead: usize,
    pub threat: Option<usize>,
}

pub fn pod_score(track: &Track, pod: &Pod, checkpoint_bonus: f64) -> f64 {
    let remaining = pod.position.dist(track.checkpoint(pod.target));
    checkpoint_bonus * pod.passed as f64 - remaining
}

/// Writes `score` on every pod and picks the lead and threat. Ties go to the
/// later index. `pods` must contain at least one controlled pod.
pub fn assign_roles(race: &Race, pods: &mut [Pod], weights: &FitnessWeights) -> Roles {
    for pod in pods.iter_mut() {
        pod.score = pod_score(race.track(), pod, weights.checkpoint_bonus);
    }

    let controlled = race.controlled().clamp(1, pods.len());
    let best_of = |range: core::ops::Range<usize>| {
        range.max_by(|&a, &b| pods[a].score.total_cmp(&pods[b].score))
    };

    Roles {
        lead: best_of(0..controlled).unwrap_or(0),
        threat: best_of(controlled..pods.len()),
    }
}

/// Fitness of a rolled-out roster; higher is better.
///
/// `+∞` once the lead has passed more than the required checkpoints, `-∞`
/// once the threat has, checked in that order.
pub fn evaluate(race: &Race, pods: &mut [Pod], weights: &FitnessWeights) -> f64 {
    let roles = assign_roles(race, pods, weights);
    let required = race.track().total_required();
    let lead = &pods[roles.lead];

    if lead.passed > required {
        return f64::INFINITY;
    }
    let Some(threat_idx) = roles.threat else {
        return weights.bias * lead.score;
    };
    let threat = &pods[threat_idx];
    if threat.passed > required {
        return f64::NEG_INFINITY;
    }

    let threat_checkpoint = race.track().checkpoint(threat.target);
    let controlled = race.controlled().clamp(1, pods.len());
    let blocking: f64 = (0..controlled)
        .filter(|&i| i != roles.lead)
        .map(|i| -pods[i].position.dist(threat_checkpoint))
        .sum();

    weights.bias * (lead.score - threat.score) + blocking
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vec2;

    fn race() -> Race {
        let track = Track::new(
            1,
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(10_000.0, 0.0),
                Vec2::new(10_000.0, 8_000.0),
            ],
        )
        .expect("non-empty");
        Race::standard(track)
    }

    fn pod(x: f64, y: f64, target: usize, passed: u32) -> Pod {
        Pod::new(Vec2::new(x, y)).with_progress(target, passed)
    }

    #[test]
    fn roles_follow_scores() {
        let race = race();
        let mut pods = [
            pod(9_000.0, 0.0, 1, 1),
            pod(0.0, 0.0, 2, 2),
            pod(5_000.0, 0.0, 1, 1),
            pod(10_000.0, 7_000.0, 2, 2),
        ];
        let roles = assign_roles(&race, &mut pods, &FitnessWeights::default());
        assert_eq!(roles.lead, 1);
        assert_eq!(roles.threat, Some(3));
    }

    #[test]
    fn finite_fitness_combines_progress_and_blocking() {
        let race = race();
        let weights = FitnessWeights::default();
        let mut pods = [
            pod(9_000.0, 0.0, 1, 1),
            pod(2_000.0, 0.0, 1, 1),
            pod(7_000.0, 0.0, 1, 1),
            pod(3_000.0, 0.0, 1, 1),
        ];
        let fitness = evaluate(&race, &mut pods, &weights);
        // lead misses cp1 by 1000, threat by 3000; support is 8000 from cp1.
        let expected = weights.bias * (-1_000.0 - -3_000.0) - 8_000.0;
        assert!((fitness - expected).abs() < 1e-9, "fitness={fitness}");
    }

    #[test]
    fn win_is_checked_before_loss() {
        let race = race();
        let required = race.track().total_required();
        let weights = FitnessWeights::default();

        let mut pods = [
            pod(0.0, 0.0, 1, required + 1),
            pod(0.0, 0.0, 1, 0),
            pod(0.0, 0.0, 1, required + 1),
            pod(0.0, 0.0, 1, 0),
        ];
        assert_eq!(evaluate(&race, &mut pods, &weights), f64::INFINITY);

        pods[0].passed = required;
        assert_eq!(evaluate(&race, &mut pods, &weights), f64::NEG_INFINITY);

        pods[2].passed = required;
        assert!(evaluate(&race, &mut pods, &weights).is_finite());
    }
}
