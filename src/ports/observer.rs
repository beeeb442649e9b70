//! Observer port - abstraction for watching a training run
//!
//! The trainer reports through this trait only, so progress bars, metrics
//! collection and event forwarding to another thread are all interchangeable
//! adapters.

use crate::{
    Result,
    pipeline::report::{BatchReport, GameProgress, LoopReport, TrainingSummary},
};

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total_games)` - once
/// 2. For each loop:
///    - `on_game_end(progress)` after every game
///    - `on_batch_end(report)` after each of the three batches
///    - `on_loop_end(report)` after the loop's episodes were refined
/// 3. `on_training_end(summary)` - once, also after a cancel
///
/// # Examples
///
/// ```no_run
/// use tictactoe_learn::{pipeline::report::GameProgress, ports::TrainingObserver};
///
/// struct GameCounter {
///     games: usize,
/// }
///
/// impl TrainingObserver for GameCounter {
///     fn on_game_end(&mut self, _progress: &GameProgress) -> tictactoe_learn::Result<()> {
///         self.games += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait TrainingObserver: Send {
    fn on_training_start(&mut self, _total_games: usize) -> Result<()> {
        Ok(())
    }

    fn on_game_end(&mut self, _progress: &GameProgress) -> Result<()> {
        Ok(())
    }

    fn on_batch_end(&mut self, _report: &BatchReport) -> Result<()> {
        Ok(())
    }

    fn on_loop_end(&mut self, _report: &LoopReport) -> Result<()> {
        Ok(())
    }

    /// Last call of a run. Use this to finalize outputs.
    fn on_training_end(&mut self, _summary: &TrainingSummary) -> Result<()> {
        Ok(())
    }
}
