//! Per-game episode buffers
//!
//! An [`Episode`] is owned by one agent for one game. Credit assignment walks
//! it backward by index once the game is over.

use serde::{Deserialize, Serialize};

use crate::tictactoe::{Board, Mark, Rotate, Rotation};

/// Ordered, append-only sequence of steps taken during one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode<S> {
    steps: Vec<S>,
}

impl<S> Episode<S> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn push(&mut self, step: S) {
        self.steps.push(step);
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[S] {
        &self.steps
    }

    pub fn last_mut(&mut self) -> Option<&mut S> {
        self.steps.last_mut()
    }

    /// Most recent step first
    pub fn iter_rev(&self) -> impl Iterator<Item = &S> {
        (0..self.steps.len()).rev().map(move |i| &self.steps[i])
    }
}

impl<S: Rotate> Episode<S> {
    /// The same episode with every step carried through `rotation`
    pub fn rotated(&self, rotation: Rotation) -> Self {
        Self {
            steps: self.steps.iter().map(|s| s.rotated(rotation)).collect(),
        }
    }
}

impl<S> Default for Episode<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// One recorded decision of the weighted-table learner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedStep {
    /// Board before the move
    pub state: Board,
    pub action: usize,
    /// Legal positions at that time
    pub legal: Vec<usize>,
    /// Mark that made the move
    pub mark: Mark,
}

impl Rotate for WeightedStep {
    fn rotated(&self, rotation: Rotation) -> Self {
        Self {
            state: self.state.rotated(rotation),
            action: self.action.rotated(rotation),
            legal: self.legal.iter().map(|p| p.rotated(rotation)).collect(),
            mark: self.mark,
        }
    }
}

/// One TD transition of the Q-learning agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: Board,
    pub action: usize,
    /// Immediate reward, filled in by the engine's step hook
    pub reward: f64,
    /// Board after the move, if the hook has reported it
    pub next: Option<Board>,
}

impl Transition {
    pub fn new(state: Board, action: usize) -> Self {
        Self {
            state,
            action,
            reward: 0.0,
            next: None,
        }
    }
}

impl Rotate for Transition {
    fn rotated(&self, rotation: Rotation) -> Self {
        Self {
            state: self.state.rotated(rotation),
            action: self.action.rotated(rotation),
            reward: self.reward,
            next: self.next.map(|b| b.rotated(rotation)),
        }
    }
}
