//! Training and evaluation pipeline
//!
//! This module provides:
//! - The self-play orchestrator and its loop regimen
//! - Evaluation of frozen policies against a seeded random opponent
//! - Baseline players
//! - Observers and background (worker thread) training

pub mod background;
pub mod baselines;
pub mod evaluation;
pub mod observers;
pub mod regimen;
pub mod report;
pub mod selfplay;

pub use background::{BackgroundTraining, CancelToken, TrainingEvent};
pub use baselines::{FirstLegalAgent, FrozenAgent, HeuristicAgent, RandomAgent};
pub use evaluation::{EvaluationReport, GameTranscript, evaluate};
pub use observers::{CallbackObserver, MetricsObserver, MetricsSummary, ProgressObserver};
pub use regimen::TrainingPhase;
pub use report::{BatchReport, GameProgress, GameStats, LoopReport, TrainingSummary};
pub use selfplay::{PlayedGame, SelfPlayTrainer, play_game, train_model};

pub use crate::ports::{Agent, LearningAgent, TrainingObserver};
