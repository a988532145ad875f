use anyhow::{anyhow, Context, Result};
use pod_race_core::constants::{CHECKPOINT_BONUS, PROGRESS_BIAS};
use pod_race_core::FitnessWeights;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Relative odds of each control field being resampled by a mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationWeights {
    pub rotation: u32,
    pub thrust: u32,
    pub shield: u32,
    pub boost: u32,
}

impl MutationWeights {
    pub fn as_array(&self) -> [u32; 4] {
        [self.rotation, self.thrust, self.shield, self.boost]
    }
}

impl Default for MutationWeights {
    fn default() -> Self {
        Self {
            rotation: 6,
            thrust: 5,
            shield: 1,
            boost: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub id: String,
    pub description: String,

    // Search shape
    pub horizon: usize,
    pub population: usize,
    pub mutation: MutationWeights,
    /// Chance, in percent, that a freshly drawn turn raises shield or requests boost.
    pub flag_chance_pct: u32,

    // Scoring
    pub checkpoint_bonus: f64,
    pub bias: f64,
    /// Opening stretches at least this long (squared) start every plan with boost.
    pub boost_opening_threshold_sq: f64,

    // Timing
    pub first_turn_timeout_ms: u64,
    pub turn_timeout_ms: u64,
    pub timeout_safeguard: f64,

    pub seed: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            description: "Four-turn lookahead, six plans, progress weighted 2:1 over blocking."
                .to_string(),
            horizon: 4,
            population: 6,
            mutation: MutationWeights::default(),
            flag_chance_pct: 30,
            checkpoint_bonus: CHECKPOINT_BONUS,
            bias: PROGRESS_BIAS,
            boost_opening_threshold_sq: 9_000_000.0,
            first_turn_timeout_ms: 500,
            turn_timeout_ms: 75,
            timeout_safeguard: 0.95,
            seed: 100,
        }
    }
}

impl PlannerConfig {
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "cautious" => Some(Self {
                id: "cautious".to_string(),
                description: "Longer lookahead, rarely shields.".to_string(),
                horizon: 6,
                population: 8,
                mutation: MutationWeights {
                    shield: 0,
                    ..MutationWeights::default()
                },
                flag_chance_pct: 10,
                ..Self::default()
            }),
            "aggressive" => Some(Self {
                id: "aggressive".to_string(),
                description: "Pure race pace; blocking barely counts.".to_string(),
                bias: 6.0,
                flag_chance_pct: 20,
                ..Self::default()
            }),
            _ => None,
        }
    }

    pub fn preset_names() -> &'static [&'static str] {
        &["default", "cautious", "aggressive"]
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed reading config {}", path.display()))?;
        let mut cfg: Self = serde_json::from_str(&data)
            .with_context(|| format!("failed parsing config {}", path.display()))?;
        cfg.clamp();
        Ok(cfg)
    }

    /// Config file wins over preset; preset name must exist when given.
    pub fn resolve(path: Option<&Path>, preset: Option<&str>) -> Result<Self> {
        match (path, preset) {
            (Some(path), _) => Self::load(path),
            (None, Some(name)) => Self::preset(name).ok_or_else(|| {
                anyhow!(
                    "unknown preset '{name}'. available: {}",
                    Self::preset_names().join(", ")
                )
            }),
            (None, None) => Ok(Self::default()),
        }
    }

    pub fn clamp(&mut self) {
        self.horizon = self.horizon.clamp(1, 12);
        self.population = self.population.clamp(1, 64);
        self.flag_chance_pct = self.flag_chance_pct.min(100);
        self.checkpoint_bonus = self.checkpoint_bonus.max(1_000.0);
        self.bias = self.bias.clamp(0.0, 100.0);
        self.timeout_safeguard = self.timeout_safeguard.clamp(0.1, 1.0);
        if self.mutation.as_array().iter().all(|&w| w == 0) {
            self.mutation = MutationWeights::default();
        }
    }

    pub fn weights(&self) -> FitnessWeights {
        FitnessWeights {
            checkpoint_bonus: self.checkpoint_bonus,
            bias: self.bias,
        }
    }

    /// Search time for one decision, with the I/O safety margin already removed.
    pub fn turn_budget(&self, first_turn: bool) -> Duration {
        let nominal = if first_turn {
            self.first_turn_timeout_ms
        } else {
            self.turn_timeout_ms
        };
        Duration::from_secs_f64(nominal as f64 * self.timeout_safeguard / 1_000.0)
    }
}
