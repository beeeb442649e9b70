//! Training regimen
//!
//! Every loop runs the same fixed cycle of phases: a self-play batch, two
//! batches against a random opponent and a refinement pass over everything
//! the loop collected.

use serde::{Deserialize, Serialize};

use crate::tictactoe::Mark;

/// One phase of a training loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingPhase {
    /// Two learners on a shared store
    SelfPlay,
    /// The X learner against a random O that moves first
    VsRandomAfter,
    /// The X learner moving first against a random O
    VsRandomFirst,
    /// Refine every episode collected in the loop, in play order
    BatchRefine,
}

impl TrainingPhase {
    /// Phases that play games, in loop order
    pub const PLAYING: [TrainingPhase; 3] = [
        TrainingPhase::SelfPlay,
        TrainingPhase::VsRandomAfter,
        TrainingPhase::VsRandomFirst,
    ];

    /// Successor in the loop cycle
    pub fn next(self) -> TrainingPhase {
        match self {
            TrainingPhase::SelfPlay => TrainingPhase::VsRandomAfter,
            TrainingPhase::VsRandomAfter => TrainingPhase::VsRandomFirst,
            TrainingPhase::VsRandomFirst => TrainingPhase::BatchRefine,
            TrainingPhase::BatchRefine => TrainingPhase::SelfPlay,
        }
    }

    pub fn plays_games(self) -> bool {
        self != TrainingPhase::BatchRefine
    }

    /// Fixed first mover of the random-opponent phases
    pub fn fixed_first_mover(self) -> Option<Mark> {
        match self {
            TrainingPhase::VsRandomAfter => Some(Mark::O),
            TrainingPhase::VsRandomFirst => Some(Mark::X),
            TrainingPhase::SelfPlay | TrainingPhase::BatchRefine => None,
        }
    }

    /// Get short label
    pub fn label(self) -> &'static str {
        match self {
            TrainingPhase::SelfPlay => "self-play",
            TrainingPhase::VsRandomAfter => "vs-random-after",
            TrainingPhase::VsRandomFirst => "vs-random-first",
            TrainingPhase::BatchRefine => "batch-refine",
        }
    }
}

impl std::fmt::Display for TrainingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_cycle() {
        let mut phase = TrainingPhase::SelfPlay;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(phase);
            phase = phase.next();
        }
        assert_eq!(phase, TrainingPhase::SelfPlay);
        assert_eq!(&seen[..3], &TrainingPhase::PLAYING);
        assert_eq!(seen[3], TrainingPhase::BatchRefine);
        assert!(!TrainingPhase::BatchRefine.plays_games());
    }

    #[test]
    fn test_random_phase_first_movers() {
        assert_eq!(
            TrainingPhase::VsRandomAfter.fixed_first_mover(),
            Some(Mark::O)
        );
        assert_eq!(
            TrainingPhase::VsRandomFirst.fixed_first_mover(),
            Some(Mark::X)
        );
        assert_eq!(TrainingPhase::SelfPlay.fixed_first_mover(), None);
    }
}
