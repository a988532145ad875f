use serde::{Deserialize, Serialize};

use crate::constants::{
    BOOST_THRUST, COLLISION_TOLERANCE, MAX_THRUST, MIN_IMPULSE, POD_MASS, POD_RADIUS,
    SHIELDED_MASS, SHIELD_COOLDOWN,
};
use crate::vector::Vec2;

/// Kinematic and race-progress state of one pod.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Heading in degrees within `[0, 360)`; `None` until first observed.
    pub heading: Option<i32>,
    pub target: usize,
    pub passed: u32,
    /// 0 when inactive; set to `SHIELD_COOLDOWN` when the shield is raised.
    pub shield_cooldown: i32,
    boost_available: bool,
    #[serde(skip)]
    pub score: f64,
}

impl Default for Pod {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl Pod {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            heading: None,
            target: 0,
            passed: 0,
            shield_cooldown: 0,
            boost_available: true,
            score: 0.0,
        }
    }

    pub fn with_velocity(self, velocity: Vec2) -> Self {
        Self { velocity, ..self }
    }

    pub fn with_heading(self, degrees: i32) -> Self {
        Self {
            heading: Some(degrees.rem_euclid(360)),
            ..self
        }
    }

    pub fn with_progress(self, target: usize, passed: u32) -> Self {
        Self {
            target,
            passed,
            ..self
        }
    }

    pub fn heading_deg(&self) -> i32 {
        self.heading.unwrap_or(0)
    }

    pub fn facing(&self) -> Vec2 {
        Vec2::from_degrees(self.heading_deg() as f64)
    }

    pub fn boost_available(&self) -> bool {
        self.boost_available
    }

    /// Consumes the boost. Returns `false` if it was already spent.
    pub fn use_boost(&mut self) -> bool {
        if self.boost_available {
            self.boost_available = false;
            return true;
        }
        false
    }

    /// Raises the shield, or lets an active one cool down by one turn.
    pub fn manage_shield(&mut self, on: bool) {
        if on {
            self.shield_cooldown = SHIELD_COOLDOWN;
        } else if self.shield_cooldown > 0 {
            self.shield_cooldown -= 1;
        }
    }

    /// Heavy only on the turn the shield was raised.
    pub fn mass(&self) -> f64 {
        if self.shield_cooldown == SHIELD_COOLDOWN {
            SHIELDED_MASS
        } else {
            POD_MASS
        }
    }

    pub fn rotate(&mut self, delta: i32) {
        self.heading = Some((self.heading_deg() + delta).rem_euclid(360));
    }

    /// Applies shield bookkeeping then thrust along the current heading.
    /// Returns the thrust actually applied.
    pub fn accelerate(&mut self, thrust: i32, boost: bool, shield: bool) -> i32 {
        self.manage_shield(shield);
        if self.shield_cooldown > 0 {
            return 0;
        }

        let applied = if boost && self.use_boost() {
            BOOST_THRUST
        } else {
            thrust.clamp(0, MAX_THRUST)
        };
        self.velocity += self.facing() * applied as f64;
        applied
    }

    /// Earliest time in `(0, ∞)` at which the two pods touch, or `f64::INFINITY`.
    pub fn collision_time(&self, other: &Pod) -> f64 {
        let dp = other.position - self.position;
        let dv = other.velocity - self.velocity;

        let a = dv.length_sq();
        if a < COLLISION_TOLERANCE {
            return f64::INFINITY;
        }

        let contact = 2.0 * POD_RADIUS;
        let b = -2.0 * dp.dot(dv);
        let c = dp.length_sq() - contact * contact;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return f64::INFINITY;
        }

        let t = (b - discriminant.sqrt()) / (2.0 * a);
        if t <= COLLISION_TOLERANCE {
            return f64::INFINITY;
        }
        t
    }

    /// Elastic bounce along the line of centres. Returns the impulse applied,
    /// which always separates the pair and is at least `MIN_IMPULSE`.
    /// Coincident centres are skipped.
    pub fn rebound(&mut self, other: &mut Pod) -> f64 {
        let m1 = self.mass();
        let m2 = other.mass();

        let Some(normal) = (other.position - self.position).normalized() else {
            return 0.0;
        };
        let dv = other.velocity - self.velocity;

        let reduced = (m1 * m2) / (m1 + m2);
        let raw = -2.0 * reduced * dv.dot(normal);
        let impulse = raw.max(MIN_IMPULSE);

        self.velocity += normal * (-impulse / m1);
        other.velocity += normal * (impulse / m2);
        impulse
    }

    pub fn advance(&mut self, dt: f64) {
        self.position += self.velocity * dt;
    }

    /// End-of-turn precision: velocity truncated, position rounded.
    pub fn snap(&mut self) {
        self.velocity = self.velocity.truncated();
        self.position = self.position.rounded();
    }
}
