//! Agent port - the capability set shared by every player variant
//!
//! The interactive layer and the self-play orchestrator both drive players
//! exclusively through [`Agent`]. Learners additionally implement
//! [`LearningAgent`], which splits "game over" into its parts so that the
//! orchestrator can defer refinement to the end of a training loop.

use crate::{
    Result,
    tictactoe::{Board, GameOutcome, Mark},
};

/// What a [`Agent::reset`] call clears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    /// Clear per-game bookkeeping only; learned parameters survive
    ForNewGame,
    /// Clear per-game bookkeeping and all learned parameters
    ForgetAll,
}

/// A player that can be asked for moves and told how games end.
///
/// # Event Sequence
///
/// 1. `reset(ResetScope::ForNewGame)`
/// 2. `choose_move` on each of the agent's turns; after every move the agent
///    made, `record_step_outcome` if `wants_step_rewards` is true
/// 3. `observe_final(board)` with the terminal board
/// 4. `on_game_end(outcome)`
pub trait Agent {
    fn name(&self) -> &str;

    /// The mark this agent plays
    fn mark(&self) -> Mark;

    /// Pick a position for `board`, or `None` when no move is possible.
    fn choose_move(&mut self, board: &Board) -> Result<Option<usize>>;

    /// Terminal board, used to record an opponent's final move.
    fn observe_final(&mut self, _board: &Board) {}

    /// Game finished; learners refine on the collected episode here.
    fn on_game_end(&mut self, _outcome: GameOutcome) -> Result<()> {
        Ok(())
    }

    /// Whether the engine should feed per-move rewards to this agent
    fn wants_step_rewards(&self) -> bool {
        false
    }

    /// Immediate reward and resulting board for the agent's latest move
    fn record_step_outcome(&mut self, _reward: f64, _next: &Board) {}

    fn reset(&mut self, _scope: ResetScope) -> Result<()> {
        Ok(())
    }

    /// Human-readable dump of learned state (diagnostic only)
    fn dump_state(&self) -> String {
        format!("{} ({}): no learned state", self.name(), self.mark())
    }

    /// Effective exploration parameter (epsilon or temperature)
    fn exploration(&self) -> Option<f64> {
        None
    }

    fn exploration_override(&self) -> Option<f64> {
        None
    }

    /// Replace (or with `None`, release) the exploration parameter.
    fn set_exploration_override(&mut self, _value: Option<f64>) {}

    fn set_rng_seed(&mut self, _seed: u64) -> Result<()> {
        Ok(())
    }
}

/// Agents that learn from whole episodes.
pub trait LearningAgent: Agent {
    type Episode;

    /// Detach the episode collected in the current game
    fn take_episode(&mut self) -> Self::Episode;

    /// Credit assignment for one finished episode
    fn refine_episode(&mut self, episode: &Self::Episode, outcome: GameOutcome) -> Result<()>;

    /// One step of the agent's exploration schedule
    fn decay_exploration(&mut self);

    /// Entries in the (possibly shared) learned store
    fn store_size(&self) -> usize;
}

/// Run `f` with the agent's exploration pinned to `value`.
///
/// The previous override is restored when `f` returns or unwinds.
pub fn with_exploration<A, T>(agent: &mut A, value: f64, f: impl FnOnce(&mut A) -> T) -> T
where
    A: Agent + ?Sized,
{
    let mut guard = ExplorationGuard::new(agent, value);
    f(&mut *guard.agent)
}

struct ExplorationGuard<'a, A: Agent + ?Sized> {
    agent: &'a mut A,
    previous: Option<f64>,
}

impl<'a, A: Agent + ?Sized> ExplorationGuard<'a, A> {
    fn new(agent: &'a mut A, value: f64) -> Self {
        let previous = agent.exploration_override();
        agent.set_exploration_override(Some(value));
        Self { agent, previous }
    }
}

impl<A: Agent + ?Sized> Drop for ExplorationGuard<'_, A> {
    fn drop(&mut self) {
        self.agent.set_exploration_override(self.previous);
    }
}
