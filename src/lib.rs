//! Tic-tac-toe learning core
//!
//! This crate provides:
//! - Board rules, rotation symmetry and a game state machine with a silent
//!   simulation path and a logging interactive path
//! - A weighted-table learner and a Q-learning agent behind one agent port
//! - A self-play orchestrator with evaluation, progress observers and
//!   cancellable background training
//! - Model persistence and the `ttt` command line front end

pub mod cli;
pub mod config;
pub mod episode;
pub mod error;
pub mod persistence;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod tictactoe;
pub mod utils;
pub mod weighted;

pub use config::{QLearningConfig, StartPolicy, TrainingConfig, WeightedConfig};
pub use error::{Error, Result};
pub use persistence::{LearnedModel, LearnerKind, SavedModel};
