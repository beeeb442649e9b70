//! Per-state action weight tables

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    tictactoe::{Board, board::check_position},
};

/// Non-negative integer weights for the nine actions of one board state.
///
/// A weight of 0 means the action is illegal or unassigned. The running
/// total is kept in sync so sampling never has to re-sum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PTable {
    weights: [u32; 9],
    total: u64,
    built: bool,
}

impl PTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give every legal position `default_weight`.
    ///
    /// No-op once built; call [`PTable::clear`] first to rebuild.
    pub fn build(&mut self, legal: &[usize], default_weight: u32) -> Result<()> {
        if self.built {
            return Ok(());
        }
        for &pos in legal {
            check_position(pos)?;
        }
        for &pos in legal {
            self.set_raw(pos, default_weight);
        }
        self.built = true;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.weights = [0; 9];
        self.total = 0;
        self.built = false;
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Weight of `pos`, 0 for out-of-range positions
    pub fn weight(&self, pos: usize) -> u32 {
        self.weights.get(pos).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn set_weight(&mut self, pos: usize, weight: u32) -> Result<()> {
        check_position(pos)?;
        self.set_raw(pos, weight);
        Ok(())
    }

    /// Raise the weight of `pos` to `weight`; never lowers it.
    pub fn set_weight_max(&mut self, pos: usize, weight: u32) -> Result<()> {
        check_position(pos)?;
        if weight > self.weights[pos] {
            self.set_raw(pos, weight);
        }
        Ok(())
    }

    /// Add `delta` to the weight of `pos`, clamping at 0.
    pub fn add_weight(&mut self, pos: usize, delta: i64) -> Result<()> {
        check_position(pos)?;
        let updated = (i64::from(self.weights[pos]) + delta).clamp(0, i64::from(u32::MAX));
        self.set_raw(pos, updated as u32);
        Ok(())
    }

    /// Positions with a positive weight, ascending
    pub fn entries(&self) -> Vec<(usize, u32)> {
        self.weights
            .iter()
            .enumerate()
            .filter(|&(_, &w)| w > 0)
            .map(|(pos, &w)| (pos, w))
            .collect()
    }

    fn set_raw(&mut self, pos: usize, weight: u32) {
        self.total = self.total - u64::from(self.weights[pos]) + u64::from(weight);
        self.weights[pos] = weight;
    }
}

/// Board encoding -> [`PTable`]; grows until explicitly cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedTable {
    entries: HashMap<String, PTable>,
}

impl WeightedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `board`, created and built on first access
    pub fn ensure_built(
        &mut self,
        board: &Board,
        legal: &[usize],
        default_weight: u32,
    ) -> Result<&mut PTable> {
        let entry = self.entries.entry(board.encode()).or_default();
        entry.build(legal, default_weight)?;
        Ok(entry)
    }

    /// Build the entry for `board` if needed and promote `pos` to at least
    /// `chosen_weight`
    pub fn mark_chosen(
        &mut self,
        board: &Board,
        legal: &[usize],
        default_weight: u32,
        pos: usize,
        chosen_weight: u32,
    ) -> Result<()> {
        self.ensure_built(board, legal, default_weight)?
            .set_weight_max(pos, chosen_weight)
    }

    pub fn get(&self, board: &Board) -> Option<&PTable> {
        self.entries.get(&board.encode())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Human-readable listing, sorted by board encoding
    pub fn dump(&self) -> String {
        let mut keys: Vec<&String> = self.entries.keys().collect();
        keys.sort();

        let mut out = format!("WeightedTable size={}\n", self.entries.len());
        for key in keys {
            let entry = &self.entries[key];
            let weights: Vec<String> = entry
                .entries()
                .iter()
                .map(|(pos, w)| format!("{pos}:{w}"))
                .collect();
            out.push_str(&format!(
                "{key} total={} [{}]\n",
                entry.total(),
                weights.join(" ")
            ));
        }
        out
    }
}
