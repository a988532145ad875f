//! Control commands and fixed-horizon plans.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_ROTATION_DEG, MAX_THRUST};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodCommand {
    pub rotation: i32,
    pub thrust: i32,
    pub shield: bool,
    pub boost: bool,
}

impl PodCommand {
    pub fn new(rotation: i32, thrust: i32) -> Self {
        Self {
            rotation: rotation.clamp(-MAX_ROTATION_DEG, MAX_ROTATION_DEG),
            thrust: thrust.clamp(0, MAX_THRUST),
            shield: false,
            boost: false,
        }
    }

    pub fn with_shield(self) -> Self {
        Self {
            shield: true,
            ..self
        }
    }

    pub fn with_boost(self) -> Self {
        Self {
            boost: true,
            ..self
        }
    }
}

pub type TurnCommands = Vec<PodCommand>;

/// A candidate sequence of turns for the controlled pods.
///
/// `fitness` is only meaningful after the plan has been rolled out; fresh and
/// mutated plans carry `f64::NEG_INFINITY` until then.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub turns: Vec<TurnCommands>,
    pub fitness: f64,
}

impl Plan {
    pub fn new(turns: Vec<TurnCommands>) -> Self {
        Self {
            turns,
            fitness: f64::NEG_INFINITY,
        }
    }

    pub fn horizon(&self) -> usize {
        self.turns.len()
    }

    pub fn first_turn(&self) -> Option<&TurnCommands> {
        self.turns.first()
    }

    /// Drops the executed first turn and appends `tail`. The score is stale afterwards.
    pub fn shift(&mut self, tail: TurnCommands) {
        if !self.turns.is_empty() {
            self.turns.remove(0);
        }
        self.turns.push(tail);
        self.fitness = f64::NEG_INFINITY;
    }

    pub fn rank(a: &Plan, b: &Plan) -> core::cmp::Ordering {
        b.fitness.total_cmp(&a.fitness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_constructor_clamps_limits() {
        let cmd = PodCommand::new(90, 250);
        assert_eq!(cmd.rotation, MAX_ROTATION_DEG);
        assert_eq!(cmd.thrust, MAX_THRUST);
        let cmd = PodCommand::new(-90, -5);
        assert_eq!(cmd.rotation, -MAX_ROTATION_DEG);
        assert_eq!(cmd.thrust, 0);
    }

    #[test]
    fn shift_drops_first_and_appends_tail() {
        let turn = |r| vec![PodCommand::new(r, 10), PodCommand::new(-r, 20)];
        let mut plan = Plan::new(vec![turn(1), turn(2), turn(3), turn(4)]);
        plan.fitness = 12.0;
        plan.shift(turn(9));

        assert_eq!(plan.turns, vec![turn(2), turn(3), turn(4), turn(9)]);
        assert_eq!(plan.fitness, f64::NEG_INFINITY);
    }

    #[test]
    fn ranking_puts_infinite_fitness_first() {
        let mut plans = vec![
            Plan { turns: vec![], fitness: 5.0 },
            Plan { turns: vec![], fitness: f64::INFINITY },
            Plan { turns: vec![], fitness: f64::NEG_INFINITY },
            Plan { turns: vec![], fitness: 9.0 },
        ];
        plans.sort_by(Plan::rank);
        let order: Vec<f64> = plans.iter().map(|p| p.fitness).collect();
        assert_eq!(order, vec![f64::INFINITY, 9.0, 5.0, f64::NEG_INFINITY]);
    }
}
