//! Shared Q-value store

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tictactoe::Board;

/// Board encoding -> Q-value per position.
///
/// One brain is shared by both marks in self-play so a single value
/// function is learned regardless of who is to move.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QBrain {
    values: HashMap<String, [f64; 9]>,
}

impl QBrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Q-values for `board`, all 0 when first seen
    pub fn q_values(&self, board: &Board) -> [f64; 9] {
        self.values
            .get(&board.encode())
            .copied()
            .unwrap_or([0.0; 9])
    }

    /// Mutable Q-values for `board`, inserted as zeros on first access
    pub fn q_values_mut(&mut self, board: &Board) -> &mut [f64; 9] {
        self.values.entry(board.encode()).or_insert([0.0; 9])
    }

    /// Largest Q-value over all nine positions of `board`
    pub fn max_q(&self, board: &Board) -> f64 {
        self.q_values(board)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// One TD(0) step toward `reward + gamma * next_max`; returns the new value.
    pub fn td_update(
        &mut self,
        state: &Board,
        action: usize,
        reward: f64,
        next_max: f64,
        alpha: f64,
        gamma: f64,
    ) -> f64 {
        let q = &mut self.q_values_mut(state)[action];
        let td_target = reward + gamma * next_max;
        *q += alpha * (td_target - *q);
        *q
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Human-readable listing, sorted by board encoding
    pub fn dump(&self) -> String {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();

        let mut out = format!("QBrain size={}\n", self.values.len());
        for key in keys {
            let q: Vec<String> = self.values[key].iter().map(|v| format!("{v:.3}")).collect();
            out.push_str(&format!("{key} [{}]\n", q.join(", ")));
        }
        out
    }
}
