//! Observer adapters for training runs

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use super::report::{GameProgress, GameStats, LoopReport, TrainingSummary};
use crate::{Error, Result, ports::TrainingObserver};

/// Progress bar observer - shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    stats: GameStats,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            stats: GameStats::default(),
        }
    }

    fn message(&self) -> String {
        format!(
            "{} D:{} L:{}",
            self.stats.wins, self.stats.draws, self.stats.losses
        )
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingObserver for ProgressObserver {
    fn on_training_start(&mut self, total_games: usize) -> Result<()> {
        let pb = ProgressBar::new(total_games as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} games {prefix} (W:{msg})",
                )
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_game_end(&mut self, progress: &GameProgress) -> Result<()> {
        self.stats = progress.stats;
        if let Some(pb) = &self.progress_bar {
            pb.set_position(progress.game_index as u64 + 1);
            pb.set_prefix(format!("loop {} {}", progress.loop_index + 1, progress.phase));
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_training_end(&mut self, summary: &TrainingSummary) -> Result<()> {
        self.stats = summary.stats;
        if let Some(pb) = &self.progress_bar {
            if summary.cancelled {
                pb.abandon_with_message(format!("{} (cancelled)", self.message()));
            } else {
                pb.finish_with_message(self.message());
            }
        }
        Ok(())
    }
}

/// Metrics observer - tracks results and a per-loop learning curve
#[derive(Debug, Default)]
pub struct MetricsObserver {
    stats: GameStats,
    move_counts: Vec<usize>,
    loops: Vec<LoopReport>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get average game length
    pub fn avg_game_length(&self) -> f64 {
        if self.move_counts.is_empty() {
            0.0
        } else {
            self.move_counts.iter().sum::<usize>() as f64 / self.move_counts.len() as f64
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            stats: self.stats,
            avg_game_length: self.avg_game_length(),
            loop_win_rates: self.loops.iter().map(|l| l.stats.win_rate).collect(),
        }
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub stats: GameStats,
    pub avg_game_length: f64,
    /// X's win rate in each completed loop
    pub loop_win_rates: Vec<f64>,
}

impl TrainingObserver for MetricsObserver {
    fn on_game_end(&mut self, progress: &GameProgress) -> Result<()> {
        self.stats = progress.stats;
        self.move_counts.push(progress.move_count);
        Ok(())
    }

    fn on_loop_end(&mut self, report: &LoopReport) -> Result<()> {
        self.loops.push(*report);
        Ok(())
    }
}

/// Calls a closure after every game
pub struct CallbackObserver<F>
where
    F: FnMut(&GameProgress) + Send,
{
    callback: F,
}

impl<F> CallbackObserver<F>
where
    F: FnMut(&GameProgress) + Send,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> TrainingObserver for CallbackObserver<F>
where
    F: FnMut(&GameProgress) + Send,
{
    fn on_game_end(&mut self, progress: &GameProgress) -> Result<()> {
        (self.callback)(progress);
        Ok(())
    }
}
