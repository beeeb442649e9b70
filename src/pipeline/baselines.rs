//! Non-learning players and the frozen wrapper used for evaluation

use rand::{Rng, rngs::StdRng, seq::IndexedRandom};

use crate::{
    Result,
    ports::{Agent, ResetScope},
    tictactoe::{Board, GameOutcome, LineAnalyzer, Mark},
    utils::build_rng,
};

/// Uniformly random legal moves (baseline)
#[derive(Debug)]
pub struct RandomAgent {
    name: String,
    mark: Mark,
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(mark: Mark) -> Self {
        Self {
            name: format!("random-{mark}"),
            mark,
            rng: build_rng(None),
        }
    }

    /// Create a random agent with a deterministic seed
    pub fn with_seed(mark: Mark, seed: u64) -> Self {
        Self {
            rng: build_rng(Some(seed)),
            ..Self::new(mark)
        }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn mark(&self) -> Mark {
        self.mark
    }

    fn choose_move(&mut self, board: &Board) -> Result<Option<usize>> {
        Ok(board.legal_moves().choose(&mut self.rng).copied())
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.rng = build_rng(Some(seed));
        Ok(())
    }
}

/// Always the lowest free position; fully predictable, for tests
#[derive(Debug)]
pub struct FirstLegalAgent {
    name: String,
    mark: Mark,
}

impl FirstLegalAgent {
    pub fn new(mark: Mark) -> Self {
        Self {
            name: format!("first-legal-{mark}"),
            mark,
        }
    }
}

impl Agent for FirstLegalAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn mark(&self) -> Mark {
        self.mark
    }

    fn choose_move(&mut self, board: &Board) -> Result<Option<usize>> {
        Ok(board.legal_moves().first().copied())
    }
}

/// Rule-based player.
///
/// In order of preference:
/// 1. Complete one of its own lines
/// 2. Block an opponent line
/// 3. Create a threat (two in a line with the third open)
/// 4. Take the centre
/// 5. Play randomly
#[derive(Debug)]
pub struct HeuristicAgent {
    name: String,
    mark: Mark,
    rng: StdRng,
}

impl HeuristicAgent {
    pub fn new(mark: Mark) -> Self {
        Self {
            name: format!("heuristic-{mark}"),
            mark,
            rng: build_rng(None),
        }
    }

    pub fn with_seed(mark: Mark, seed: u64) -> Self {
        Self {
            rng: build_rng(Some(seed)),
            ..Self::new(mark)
        }
    }
}

impl Agent for HeuristicAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn mark(&self) -> Mark {
        self.mark
    }

    fn choose_move(&mut self, board: &Board) -> Result<Option<usize>> {
        let legal = board.legal_moves();
        if legal.is_empty() {
            return Ok(None);
        }

        if let Some(pos) = LineAnalyzer::winning_move(board, self.mark) {
            return Ok(Some(pos));
        }
        if let Some(&pos) = legal
            .iter()
            .find(|&&pos| LineAnalyzer::blocks_threat(board, pos, self.mark))
        {
            return Ok(Some(pos));
        }

        let threats: Vec<usize> = legal
            .iter()
            .copied()
            .filter(|&pos| LineAnalyzer::creates_threat(board, pos, self.mark))
            .collect();
        if let Some(&pos) = threats.choose(&mut self.rng) {
            return Ok(Some(pos));
        }

        if board.is_empty(4) {
            return Ok(Some(4));
        }
        let index = self.rng.random_range(0..legal.len());
        Ok(Some(legal[index]))
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.rng = build_rng(Some(seed));
        Ok(())
    }
}

/// Frozen agent wrapper - plays greedily and learns nothing.
///
/// Exploration is pinned to 0 for the wrapper's lifetime and game ends are
/// swallowed, so the wrapped agent's store is never refined. The previous
/// exploration override comes back when the wrapper is dropped.
pub struct FrozenAgent<'a> {
    inner: &'a mut dyn Agent,
    previous: Option<f64>,
}

impl<'a> FrozenAgent<'a> {
    pub fn new(inner: &'a mut dyn Agent) -> Self {
        let previous = inner.exploration_override();
        inner.set_exploration_override(Some(0.0));
        Self { inner, previous }
    }
}

impl Drop for FrozenAgent<'_> {
    fn drop(&mut self) {
        self.inner.set_exploration_override(self.previous);
    }
}

impl Agent for FrozenAgent<'_> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn mark(&self) -> Mark {
        self.inner.mark()
    }

    fn choose_move(&mut self, board: &Board) -> Result<Option<usize>> {
        self.inner.choose_move(board)
    }

    fn observe_final(&mut self, board: &Board) {
        self.inner.observe_final(board);
    }

    fn on_game_end(&mut self, _outcome: GameOutcome) -> Result<()> {
        Ok(())
    }

    fn reset(&mut self, scope: ResetScope) -> Result<()> {
        // per-game bookkeeping only; learned state stays untouched
        match scope {
            ResetScope::ForNewGame => self.inner.reset(scope),
            ResetScope::ForgetAll => Ok(()),
        }
    }

    fn dump_state(&self) -> String {
        self.inner.dump_state()
    }

    fn exploration(&self) -> Option<f64> {
        self.inner.exploration()
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.inner.set_rng_seed(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::WeightedConfig, weighted::WeightedTableAgent};

    #[test]
    fn test_random_agent_is_seeded() {
        let board = Board::new();
        let mut a = RandomAgent::with_seed(Mark::O, 9);
        let mut b = RandomAgent::with_seed(Mark::O, 9);
        for _ in 0..10 {
            assert_eq!(a.choose_move(&board).unwrap(), b.choose_move(&board).unwrap());
        }
        let full: Board = "OXOXOXXOX".parse().unwrap();
        assert_eq!(a.choose_move(&full).unwrap(), None);
    }

    #[test]
    fn test_first_legal() {
        let mut agent = FirstLegalAgent::new(Mark::X);
        let board: Board = "OX.......".parse().unwrap();
        assert_eq!(agent.choose_move(&board).unwrap(), Some(2));
    }

    #[test]
    fn test_heuristic_preferences() {
        let mut agent = HeuristicAgent::with_seed(Mark::X, 1);

        // X can win at 2 and must also block O at 5: winning comes first
        let board: Board = "XX.OO....".parse().unwrap();
        assert_eq!(agent.choose_move(&board).unwrap(), Some(2));

        // only O threatens
        let board: Board = "OO..X....".parse().unwrap();
        assert_eq!(agent.choose_move(&board).unwrap(), Some(2));

        // empty board: no threat possible, take the centre
        assert_eq!(agent.choose_move(&Board::new()).unwrap(), Some(4));
    }

    #[test]
    fn test_frozen_agent_pins_and_restores_exploration() {
        let mut learner = WeightedTableAgent::standalone(Mark::X, WeightedConfig::default());
        learner.set_exploration_override(Some(0.7));
        {
            let mut frozen = FrozenAgent::new(&mut learner);
            assert_eq!(frozen.exploration(), Some(0.0));
            frozen.choose_move(&Board::new()).unwrap();
            frozen.on_game_end(GameOutcome::Win(Mark::X)).unwrap();
            frozen.reset(ResetScope::ForgetAll).unwrap();
        }
        assert_eq!(learner.exploration_override(), Some(0.7));
        assert_eq!(learner.games_played(), 0);
        assert_eq!(learner.table().borrow().len(), 1);
    }
}
