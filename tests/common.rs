//! Shared helpers for the integration tests

#![allow(dead_code)]

use tictactoe_learn::{TrainingConfig, tictactoe::Board};

/// Small seeded run: `loops` loops of three batches of `each_times` games
pub fn quick_config(loops: usize, each_times: usize, seed: u64) -> TrainingConfig {
    TrainingConfig::default()
        .with_loops(loops)
        .with_each_times(each_times)
        .with_seed(seed)
}

/// Board from its nine-character encoding, e.g. `"OX.X.O..."`
pub fn board(encoded: &str) -> Board {
    encoded.parse().expect("valid board encoding")
}
