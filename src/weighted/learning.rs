//! Backward credit assignment for the weighted-table learner

use super::ptable::WeightedTable;
use crate::{
    Result,
    config::WeightedConfig,
    episode::{Episode, WeightedStep},
    tictactoe::{GameOutcome, Mark, Rotation},
};

/// Reward shaping constants applied at the end of a game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardShaping {
    pub win_delta: i32,
    pub lose_delta: i32,
    pub draw_delta: i32,
    /// Decay per step away from the terminal move
    pub gamma: f64,
    /// Weight for actions of entries created during refinement
    pub default_weight: u32,
}

impl RewardShaping {
    /// Undiscounted credit for a move by `mark` in a game ending with `outcome`
    pub fn base_delta(&self, mark: Mark, outcome: GameOutcome) -> i32 {
        match outcome {
            GameOutcome::Draw => self.draw_delta,
            GameOutcome::Win(winner) if winner == mark => self.win_delta,
            GameOutcome::Win(_) => self.lose_delta,
        }
    }
}

impl From<&WeightedConfig> for RewardShaping {
    fn from(config: &WeightedConfig) -> Self {
        Self {
            win_delta: config.win_delta,
            lose_delta: config.lose_delta,
            draw_delta: config.draw_delta,
            gamma: config.gamma,
            default_weight: config.default_weight,
        }
    }
}

impl Default for RewardShaping {
    fn default() -> Self {
        Self::from(&WeightedConfig::default())
    }
}

/// Credit every step of `episode`, most recent first.
///
/// The terminal step gets the full delta; each earlier step gets the delta
/// scaled by one more factor of gamma, floored to an integer.
pub fn refine(
    table: &mut WeightedTable,
    episode: &Episode<WeightedStep>,
    outcome: GameOutcome,
    shaping: &RewardShaping,
) -> Result<()> {
    let mut factor = 1.0;

    for step in episode.iter_rev() {
        let entry = table.ensure_built(&step.state, &step.legal, shaping.default_weight)?;
        let base = shaping.base_delta(step.mark, outcome);
        let delta = (f64::from(base) * factor).floor() as i64;
        if delta != 0 {
            entry.add_weight(step.action, delta)?;
        }
        factor *= shaping.gamma;
    }

    Ok(())
}

/// [`refine`] on the episode and on its three quarter-turn rotations
pub fn refine_with_rotations(
    table: &mut WeightedTable,
    episode: &Episode<WeightedStep>,
    outcome: GameOutcome,
    shaping: &RewardShaping,
) -> Result<()> {
    refine(table, episode, outcome, shaping)?;
    for rotation in Rotation::AUGMENTATIONS {
        refine(table, &episode.rotated(rotation), outcome, shaping)?;
    }
    Ok(())
}
