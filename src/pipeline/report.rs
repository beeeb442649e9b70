//! Statistics and progress reports produced by training and evaluation

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use super::regimen::TrainingPhase;
use crate::{
    Result,
    tictactoe::{GameOutcome, GameResult, Mark},
    utils::rate,
};

/// Win/draw/loss counts from one side's point of view
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    /// Total games played
    pub total_games: usize,

    /// Number of wins
    pub wins: usize,

    /// Number of draws
    pub draws: usize,

    /// Number of losses
    pub losses: usize,

    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
}

impl GameStats {
    pub fn new(total_games: usize, wins: usize, draws: usize, losses: usize) -> Self {
        Self {
            total_games,
            wins,
            draws,
            losses,
            win_rate: rate(wins, total_games),
            draw_rate: rate(draws, total_games),
            loss_rate: rate(losses, total_games),
        }
    }

    /// Count one more game
    pub fn record(&mut self, result: GameResult) {
        let (mut wins, mut draws, mut losses) = (self.wins, self.draws, self.losses);
        match result {
            GameResult::Win => wins += 1,
            GameResult::Draw => draws += 1,
            GameResult::Loss => losses += 1,
        }
        *self = Self::new(self.total_games + 1, wins, draws, losses);
    }

    /// Count `outcome` as seen by `mark`
    pub fn record_outcome(&mut self, outcome: GameOutcome, mark: Mark) {
        self.record(outcome.result_for(mark));
    }

    pub fn merge(&mut self, other: &GameStats) {
        *self = Self::new(
            self.total_games + other.total_games,
            self.wins + other.wins,
            self.draws + other.draws,
            self.losses + other.losses,
        );
    }

    /// Rates sum to 1 (or all are 0 for no games)
    pub fn is_consistent(&self) -> bool {
        let counted = self.wins + self.draws + self.losses == self.total_games;
        let sum = self.win_rate + self.draw_rate + self.loss_rate;
        let rates_ok = if self.total_games == 0 {
            sum == 0.0
        } else {
            (sum - 1.0).abs() < 1e-9
        };
        counted && rates_ok
    }
}

impl std::fmt::Display for GameStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "W:{} D:{} L:{} ({:.1}% / {:.1}% / {:.1}%)",
            self.wins,
            self.draws,
            self.losses,
            self.win_rate * 100.0,
            self.draw_rate * 100.0,
            self.loss_rate * 100.0
        )
    }
}

/// Sent after every training game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameProgress {
    /// 0-based index over the whole run
    pub game_index: usize,
    pub total_games: usize,
    pub loop_index: usize,
    pub phase: TrainingPhase,
    pub first_mover: Mark,
    pub outcome: GameOutcome,
    pub move_count: usize,
    /// Running statistics over the whole run, X's point of view
    pub stats: GameStats,
}

/// Sent after every batch of `each_times` games
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub loop_index: usize,
    pub phase: TrainingPhase,
    pub stats: GameStats,
}

/// Sent once a loop's episodes have been refined
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopReport {
    pub loop_index: usize,
    pub loops: usize,
    /// Games of this loop only
    pub stats: GameStats,
    pub refined_episodes: usize,
    /// Entries in the shared table or brain after refinement
    pub store_size: usize,
}

/// Result of a training run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// All games played, X's point of view
    pub stats: GameStats,
    pub loops_completed: usize,
    /// True when stopped by a cancel request
    pub cancelled: bool,
    pub store_size: usize,
}

impl TrainingSummary {
    /// Save summary to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load summary from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let summary = serde_json::from_reader(BufReader::new(file))?;
        Ok(summary)
    }
}
