//! Deterministic pod-race rules: geometry, pod physics, the turn simulator and
//! the fitness used to rank candidate plans.

pub mod command;
pub mod constants;
pub mod error;
pub mod fitness;
pub mod pod;
pub mod protocol;
pub mod rng;
pub mod sim;
pub mod track;
pub mod vector;

pub use command::{Plan, PodCommand, TurnCommands};
pub use error::ProtocolError;
pub use fitness::{evaluate, FitnessWeights, Roles};
pub use pod::Pod;
pub use sim::{earliest_collision, Collision, Race, TurnOutcome};
pub use track::Track;
pub use vector::Vec2;
