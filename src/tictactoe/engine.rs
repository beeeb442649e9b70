//! Agent-facing entry points of the state machine
//!
//! [`step_with_agent`] is the silent path used by self-play: it applies a move
//! and feeds the acting TD learner its immediate reward. The remaining
//! functions form the interactive path, which logs every move and tolerates
//! stray clicks.

use log::{debug, info, warn};

use super::game::GameState;
use crate::{Result, ports::Agent};

/// Apply `pos` and, if `agent` just moved, hand it the step reward.
///
/// The hook fires only when the move was applied, it was `agent`'s mark that
/// moved and the agent asks for step rewards. The reward is 0 for a
/// non-terminal move and the terminal reward from the agent's side otherwise.
pub fn step_with_agent<A: Agent + ?Sized>(
    state: &GameState,
    pos: usize,
    agent: &mut A,
) -> Result<GameState> {
    let mover = state.turn;
    let next = state.step(pos)?;

    if next.move_count != state.move_count && mover == agent.mark() && agent.wants_step_rewards()
    {
        let reward = next.outcome.map_or(0.0, |outcome| outcome.reward_for(mover));
        agent.record_step_outcome(reward, &next.board);
    }

    Ok(next)
}

/// Interactive version of [`GameState::step`] that logs what happened.
pub fn apply_move(state: &GameState, pos: usize) -> Result<GameState> {
    let next = state.step(pos)?;
    log_transition(state, pos, &next);
    Ok(next)
}

/// Handle a human click on `pos`, then let the AI reply.
///
/// Clicks are ignored once the game is over, and while it is the AI's turn.
/// When the human move ends the game the AI is shown the final board so it
/// can record that move before learning.
pub fn on_cell_click(
    state: &GameState,
    pos: usize,
    ai: Option<&mut dyn Agent>,
) -> Result<GameState> {
    if state.is_terminal() {
        debug!("click on A[{pos}] ignored: game is over");
        return Ok(*state);
    }

    let Some(ai) = ai else {
        return apply_move(state, pos);
    };

    if state.turn == ai.mark() {
        debug!("click on A[{pos}] ignored: waiting for {}", ai.name());
        return Ok(*state);
    }

    let after_human = apply_move(state, pos)?;
    if after_human.move_count == state.move_count {
        return Ok(after_human);
    }

    if after_human.is_terminal() {
        ai.observe_final(&after_human.board);
        return Ok(after_human);
    }

    ai_reply(&after_human, ai)
}

/// Let the AI open the game when it is the first mover.
pub fn ai_first_move(state: &GameState, ai: &mut dyn Agent) -> Result<GameState> {
    if state.is_terminal() || state.turn != ai.mark() {
        return Ok(*state);
    }
    ai_reply(state, ai)
}

fn ai_reply(state: &GameState, ai: &mut dyn Agent) -> Result<GameState> {
    let Some(pos) = ai.choose_move(&state.board)? else {
        warn!("{} found no move", ai.name());
        return Ok(*state);
    };

    info!("AI chooses A[{pos}]");
    let next = step_with_agent(state, pos, ai)?;
    log_transition(state, pos, &next);
    Ok(next)
}

fn log_transition(before: &GameState, pos: usize, after: &GameState) {
    if after.move_count == before.move_count {
        if before.is_terminal() {
            warn!("A[{pos}] ignored: game is over");
        } else {
            warn!(
                "A[{pos}] has been put {} already",
                before.board.get(pos).to_char()
            );
        }
        return;
    }

    info!("{} takes A[{pos}]", before.turn);
    if let Some(outcome) = after.outcome {
        info!("{outcome}");
    }
}
