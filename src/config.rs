//! Training configuration
//!
//! All reward-shaping constants and schedules are tunable here; the defaults
//! are a reasonable starting point, not a canonical setting.

use std::{fs::File, io::BufReader, path::Path};

use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, tictactoe::Mark, weighted::SelectionRule};

/// Who opens a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StartPolicy {
    O,
    X,
    /// O opens even-numbered games, X odd-numbered ones
    Alternate,
    #[default]
    Random,
}

impl StartPolicy {
    /// First mover for the `game_index`-th game of a batch
    pub fn first_mover<R: Rng + ?Sized>(self, game_index: usize, rng: &mut R) -> Mark {
        match self {
            StartPolicy::O => Mark::O,
            StartPolicy::X => Mark::X,
            StartPolicy::Alternate => {
                if game_index.is_multiple_of(2) {
                    Mark::O
                } else {
                    Mark::X
                }
            }
            StartPolicy::Random => {
                if rng.random::<bool>() {
                    Mark::X
                } else {
                    Mark::O
                }
            }
        }
    }
}

/// Weighted-table learner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightedConfig {
    /// Credit for moves of the winning mark
    pub win_delta: i32,
    /// Credit for moves of the losing mark
    pub lose_delta: i32,
    /// Credit for every move of a drawn game
    pub draw_delta: i32,
    /// Per-step decay walking back from the terminal move
    pub gamma: f64,
    /// Weight given to every legal move of a fresh table entry
    pub default_weight: u32,
    /// Floor a move's weight is raised to once it has been played, by
    /// either mark. Equal to `default_weight` it changes nothing.
    pub chosen_weight: u32,
    pub selection: SelectionRule,
    /// Temperature never drops below this
    pub min_temperature: f64,
    /// Games over which temperature falls linearly from 1.0
    pub temperature_horizon: u64,
}

impl Default for WeightedConfig {
    fn default() -> Self {
        Self {
            win_delta: 10,
            lose_delta: 1,
            draw_delta: 5,
            gamma: 0.9,
            default_weight: 1,
            chosen_weight: 1,
            selection: SelectionRule::Linear,
            min_temperature: 0.1,
            temperature_horizon: 10_000,
        }
    }
}

/// Q-learning agent settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    /// Learning rate α
    pub alpha: f64,
    /// Discount γ
    pub gamma: f64,
    /// Initial exploration rate ε
    pub epsilon: f64,
    /// Multiplicative ε decay per finished game
    pub epsilon_decay: f64,
    pub min_epsilon: f64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.95,
            epsilon: 0.1,
            epsilon_decay: 0.999,
            min_epsilon: 0.01,
        }
    }
}

/// Complete configuration of a self-play training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of training loops
    pub loops: usize,
    /// Games per batch (three batches per loop)
    pub each_times: usize,
    /// Random seed
    pub seed: Option<u64>,
    /// First mover in self-play batches
    pub self_play_start: StartPolicy,
    pub weighted: WeightedConfig,
    pub q_learning: QLearningConfig,
    /// Games played by the evaluation pass
    pub evaluation_games: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            loops: 10,
            each_times: 100,
            seed: None,
            self_play_start: StartPolicy::Random,
            weighted: WeightedConfig::default(),
            q_learning: QLearningConfig::default(),
            evaluation_games: 100,
        }
    }
}

impl TrainingConfig {
    pub fn with_loops(mut self, loops: usize) -> Self {
        self.loops = loops;
        self
    }

    pub fn with_each_times(mut self, each_times: usize) -> Self {
        self.each_times = each_times;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_self_play_start(mut self, policy: StartPolicy) -> Self {
        self.self_play_start = policy;
        self
    }

    pub fn with_weighted(mut self, weighted: WeightedConfig) -> Self {
        self.weighted = weighted;
        self
    }

    pub fn with_q_learning(mut self, q_learning: QLearningConfig) -> Self {
        self.q_learning = q_learning;
        self
    }

    pub fn with_evaluation_games(mut self, games: usize) -> Self {
        self.evaluation_games = games;
        self
    }

    /// Games a full run plays: three batches per loop, or `None` when that
    /// does not fit in a `usize`
    pub fn checked_total_games(&self) -> Option<usize> {
        self.loops.checked_mul(self.each_times)?.checked_mul(3)
    }

    /// Games a full run plays; saturates for configurations that
    /// [`TrainingConfig::validate`] rejects
    pub fn total_games(&self) -> usize {
        self.checked_total_games().unwrap_or(usize::MAX)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let w = &self.weighted;
        let q = &self.q_learning;
        let invalid = |message: String| Err(Error::InvalidConfiguration { message });

        if self.checked_total_games().is_none() {
            return invalid(format!(
                "loops {} x each_times {} x 3 games overflows",
                self.loops, self.each_times
            ));
        }

        if !(w.gamma > 0.0 && w.gamma <= 1.0) {
            return invalid(format!("weighted.gamma {} must be in (0, 1]", w.gamma));
        }
        if w.win_delta < 0 || w.lose_delta < 0 || w.draw_delta < 0 {
            return invalid("weighted reward deltas must be non-negative".to_string());
        }
        if !(w.min_temperature >= 0.0 && w.min_temperature.is_finite()) {
            return invalid(format!(
                "weighted.min_temperature {} must be non-negative",
                w.min_temperature
            ));
        }
        if w.temperature_horizon == 0 {
            return invalid("weighted.temperature_horizon must be positive".to_string());
        }
        if !(q.alpha > 0.0 && q.alpha <= 1.0) {
            return invalid(format!("q_learning.alpha {} must be in (0, 1]", q.alpha));
        }
        if !(q.gamma > 0.0 && q.gamma <= 1.0) {
            return invalid(format!("q_learning.gamma {} must be in (0, 1]", q.gamma));
        }
        if !(0.0..=1.0).contains(&q.epsilon) || !(0.0..=1.0).contains(&q.min_epsilon) {
            return invalid("q_learning epsilon values must be in [0, 1]".to_string());
        }
        if q.min_epsilon > q.epsilon {
            return invalid(format!(
                "q_learning.min_epsilon {} exceeds epsilon {}",
                q.min_epsilon, q.epsilon
            ));
        }
        if !(q.epsilon_decay > 0.0 && q.epsilon_decay <= 1.0) {
            return invalid(format!(
                "q_learning.epsilon_decay {} must be in (0, 1]",
                q.epsilon_decay
            ));
        }
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load configuration from a JSON file; missing fields take defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }
}
