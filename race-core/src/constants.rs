//! Race rules shared by the simulator, the evaluator and the protocol codec.
//!
//! Distances are in track units, angles in whole degrees, times in turns.

// Roster
pub const TOTAL_PODS: usize = 4;
pub const CONTROLLED_PODS: usize = 2;

// Control limits
pub const MAX_THRUST: i32 = 100;
pub const BOOST_THRUST: i32 = 650;
pub const MAX_ROTATION_DEG: i32 = 18;

// Shield
pub const SHIELD_COOLDOWN: i32 = 4;
pub const SHIELDED_MASS: f64 = 10.0;
pub const POD_MASS: f64 = 1.0;

// Geometry
pub const POD_RADIUS: f64 = 400.0;
pub const CHECKPOINT_RADIUS: f64 = 600.0;
pub const CHECKPOINT_RADIUS_SQ: f64 = CHECKPOINT_RADIUS * CHECKPOINT_RADIUS;

// Collisions
pub const MIN_IMPULSE: f64 = 120.0;
pub const COLLISION_TOLERANCE: f64 = 1e-6;
// Caps the per-tick collision chain; the remainder of the tick is integrated freely.
pub const MAX_SUBSTEPS: usize = 32;

// Integration
pub const FRICTION: f64 = 0.85;
pub const TURN_DURATION: f64 = 1.0;

// Output: the steering point is projected this far along the chosen heading.
pub const TARGET_PROJECTION: f64 = 10_000.0;

// Default scoring weights
pub const CHECKPOINT_BONUS: f64 = 30_000.0;
pub const PROGRESS_BIAS: f64 = 2.0;
