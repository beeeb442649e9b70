//! Action selection over a [`PTable`]

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use super::ptable::PTable;

/// How positive-temperature selection turns weights into probabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    /// Roulette proportional to the raw weights
    #[default]
    Linear,
    /// Softmax of weights scaled by temperature
    Softmax,
}

/// Pick one of `legal` from `table`.
///
/// A temperature of 0 or below is greedy with uniform tie-breaking.
/// Returns `None` only when `legal` is empty.
pub fn select_action<R: Rng + ?Sized>(
    table: &PTable,
    legal: &[usize],
    temperature: f64,
    rule: SelectionRule,
    rng: &mut R,
) -> Option<usize> {
    if legal.is_empty() {
        return None;
    }
    if temperature <= 0.0 {
        return greedy(table, legal, rng);
    }
    match rule {
        SelectionRule::Linear => linear(table, legal, rng),
        SelectionRule::Softmax => softmax(table, legal, temperature, rng),
    }
}

/// Highest weight; ties broken uniformly at random
pub fn greedy<R: Rng + ?Sized>(table: &PTable, legal: &[usize], rng: &mut R) -> Option<usize> {
    let best = legal.iter().map(|&pos| table.weight(pos)).max()?;
    let ties: Vec<usize> = legal
        .iter()
        .copied()
        .filter(|&pos| table.weight(pos) == best)
        .collect();
    ties.choose(rng).copied()
}

/// Roulette over the raw weights in ascending position order
pub fn linear<R: Rng + ?Sized>(table: &PTable, legal: &[usize], rng: &mut R) -> Option<usize> {
    let mut sorted = legal.to_vec();
    sorted.sort_unstable();

    let total: f64 = sorted.iter().map(|&pos| f64::from(table.weight(pos))).sum();
    if total <= 0.0 {
        return sorted.choose(rng).copied();
    }

    let ticket = rng.random::<f64>() * total;
    let mut acc = 0.0;
    for &pos in &sorted {
        acc += f64::from(table.weight(pos));
        if ticket < acc {
            return Some(pos);
        }
    }
    sorted.last().copied()
}

/// Softmax with max-shift; degenerate sums fall back to uniform
pub fn softmax<R: Rng + ?Sized>(
    table: &PTable,
    legal: &[usize],
    temperature: f64,
    rng: &mut R,
) -> Option<usize> {
    let max_weight = legal
        .iter()
        .map(|&pos| f64::from(table.weight(pos)))
        .fold(f64::NEG_INFINITY, f64::max);
    let scores: Vec<(usize, f64)> = legal
        .iter()
        .map(|&pos| {
            let w = f64::from(table.weight(pos));
            (pos, ((w - max_weight) / temperature).exp())
        })
        .collect();

    let sum: f64 = scores.iter().map(|(_, s)| s).sum();
    if sum <= 0.0 || !sum.is_finite() {
        return legal.choose(rng).copied();
    }

    let ticket = rng.random::<f64>() * sum;
    let mut acc = 0.0;
    for &(pos, score) in &scores {
        acc += score;
        if ticket < acc {
            return Some(pos);
        }
    }
    scores.last().map(|&(pos, _)| pos)
}
