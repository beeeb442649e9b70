//! Weighted-table learning agent

use std::{cell::RefCell, rc::Rc};

use log::{info, trace, warn};
use rand::rngs::StdRng;

use super::{
    learning::{RewardShaping, refine_with_rotations},
    ptable::WeightedTable,
    selection::select_action,
};
use crate::{
    Error, Result,
    config::WeightedConfig,
    episode::{Episode, WeightedStep},
    ports::{Agent, LearningAgent, ResetScope},
    tictactoe::{Board, GameOutcome, Mark},
    utils::build_rng,
};

/// A table that several agents may learn into, one writer at a time
pub type SharedTable = Rc<RefCell<WeightedTable>>;

/// Plays from a [`WeightedTable`] and learns by additive reward shaping.
///
/// The agent is only consulted on its own turns, so it reconstructs the
/// opponent's intervening move by diffing the board it left behind against
/// the board it is shown. Both marks' moves end up in the episode.
#[derive(Debug)]
pub struct WeightedTableAgent {
    name: String,
    mark: Mark,
    table: SharedTable,
    config: WeightedConfig,
    shaping: RewardShaping,
    episode: Episode<WeightedStep>,
    last_after_my_move: Option<Board>,
    games_played: u64,
    exploration_override: Option<f64>,
    rng: StdRng,
}

impl WeightedTableAgent {
    pub fn new(mark: Mark, table: SharedTable, config: WeightedConfig) -> Self {
        Self {
            name: format!("weighted-{mark}"),
            mark,
            table,
            shaping: RewardShaping::from(&config),
            config,
            episode: Episode::new(),
            last_after_my_move: None,
            games_played: 0,
            exploration_override: None,
            rng: build_rng(None),
        }
    }

    /// Agent owning a fresh, unshared table
    pub fn standalone(mark: Mark, config: WeightedConfig) -> Self {
        Self::new(mark, Rc::new(RefCell::new(WeightedTable::new())), config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    /// Resume the temperature schedule after `games` finished games
    pub fn with_games_played(mut self, games: u64) -> Self {
        self.games_played = games;
        self
    }

    pub fn table(&self) -> &SharedTable {
        &self.table
    }

    pub fn games_played(&self) -> u64 {
        self.games_played
    }

    pub fn episode(&self) -> &Episode<WeightedStep> {
        &self.episode
    }

    /// Current temperature: the override, else a linear decay to the floor
    pub fn temperature(&self) -> f64 {
        self.exploration_override.unwrap_or_else(|| {
            let progress = self.games_played as f64 / self.config.temperature_horizon as f64;
            (1.0 - progress).max(self.config.min_temperature)
        })
    }

    /// Record the opponent's move that led from our last board to `board`.
    fn record_opponent_move(&mut self, board: &Board) -> Result<()> {
        let previous = self.last_after_my_move.unwrap_or_default();
        match Board::infer_move(&previous, board) {
            Ok(pos) => {
                let legal = previous.legal_moves();
                self.table.borrow_mut().mark_chosen(
                    &previous,
                    &legal,
                    self.config.default_weight,
                    pos,
                    self.config.chosen_weight,
                )?;
                trace!("{}: opponent played A[{pos}]", self.name);
                self.episode.push(WeightedStep {
                    state: previous,
                    action: pos,
                    legal,
                    mark: self.mark.opponent(),
                });
                Ok(())
            }
            Err(Error::AmbiguousTransition { reason }) => {
                trace!("{}: no opponent move to record ({reason})", self.name);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl Agent for WeightedTableAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn mark(&self) -> Mark {
        self.mark
    }

    fn choose_move(&mut self, board: &Board) -> Result<Option<usize>> {
        self.record_opponent_move(board)?;

        let legal = board.legal_moves();
        if legal.is_empty() {
            return Ok(None);
        }

        let temperature = self.temperature();
        let chosen = {
            let mut table = self.table.borrow_mut();
            let entry = table.ensure_built(board, &legal, self.config.default_weight)?;
            select_action(
                entry,
                &legal,
                temperature,
                self.config.selection,
                &mut self.rng,
            )
        };
        let Some(pos) = chosen else {
            return Ok(None);
        };
        self.table.borrow_mut().mark_chosen(
            board,
            &legal,
            self.config.default_weight,
            pos,
            self.config.chosen_weight,
        )?;

        self.episode.push(WeightedStep {
            state: *board,
            action: pos,
            legal,
            mark: self.mark,
        });
        self.last_after_my_move = Some(board.apply_mark(pos, self.mark)?);
        Ok(Some(pos))
    }

    fn observe_final(&mut self, board: &Board) {
        if let Err(e) = self.record_opponent_move(board) {
            warn!("{}: could not record final move: {e}", self.name);
        }
        self.last_after_my_move = Some(*board);
    }

    fn on_game_end(&mut self, outcome: GameOutcome) -> Result<()> {
        let episode = self.take_episode();
        self.refine_episode(&episode, outcome)?;
        self.decay_exploration();
        Ok(())
    }

    fn reset(&mut self, scope: ResetScope) -> Result<()> {
        self.episode.clear();
        self.last_after_my_move = None;
        if scope == ResetScope::ForgetAll {
            self.table.borrow_mut().clear();
            self.games_played = 0;
            info!("{}: forgot table, episode and game count", self.name);
        }
        Ok(())
    }

    fn dump_state(&self) -> String {
        let mut out = self.table.borrow().dump();
        out.push_str(&format!("Episode size={}\n", self.episode.len()));
        for (idx, step) in self.episode.steps().iter().enumerate() {
            out.push_str(&format!(
                "[{idx}] sa={}, pos={}, legal={:?}, player={}\n",
                step.state.encode(),
                step.action,
                step.legal,
                step.mark
            ));
        }
        out.push_str(&format!(
            "Global games played: {} (current temp: {:.3})\n",
            self.games_played,
            self.temperature()
        ));
        out
    }

    fn exploration(&self) -> Option<f64> {
        Some(self.temperature())
    }

    fn exploration_override(&self) -> Option<f64> {
        self.exploration_override
    }

    fn set_exploration_override(&mut self, value: Option<f64>) {
        self.exploration_override = value;
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.rng = build_rng(Some(seed));
        Ok(())
    }
}

impl LearningAgent for WeightedTableAgent {
    type Episode = Episode<WeightedStep>;

    fn take_episode(&mut self) -> Self::Episode {
        std::mem::take(&mut self.episode)
    }

    fn refine_episode(&mut self, episode: &Self::Episode, outcome: GameOutcome) -> Result<()> {
        let mut table = self.table.borrow_mut();
        refine_with_rotations(&mut table, episode, outcome, &self.shaping)
    }

    fn decay_exploration(&mut self) {
        self.games_played += 1;
    }

    fn store_size(&self) -> usize {
        self.table.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tictactoe::{GameState, Rotation};

    fn agent(mark: Mark) -> WeightedTableAgent {
        WeightedTableAgent::standalone(mark, WeightedConfig::default()).with_seed(11)
    }

    #[test]
    fn test_first_move_records_only_own_step() {
        let mut ai = agent(Mark::O);
        let pos = ai.choose_move(&Board::new()).unwrap().unwrap();
        assert!(pos < 9);
        assert_eq!(ai.episode().len(), 1);
        assert_eq!(ai.episode().steps()[0].mark, Mark::O);
        assert_eq!(ai.table().borrow().len(), 1);
    }

    #[test]
    fn test_opponent_move_is_inferred() {
        let mut ai = agent(Mark::X);
        // O opened at 4, X has not moved yet
        let board = Board::new().apply_mark(4, Mark::O).unwrap();
        ai.choose_move(&board).unwrap().unwrap();

        let steps = ai.episode().steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].state, Board::new());
        assert_eq!(steps[0].action, 4);
        assert_eq!(steps[0].mark, Mark::O);
        assert_eq!(steps[1].mark, Mark::X);
    }

    #[test]
    fn test_observe_final_records_winning_opponent_move() {
        let mut ai = agent(Mark::X);
        ai.set_exploration_override(Some(0.0));
        let mut state = GameState::new(Mark::X);
        // X moves, O replies; then O finishes a line on the board it is shown
        let pos = ai.choose_move(&state.board).unwrap().unwrap();
        state = state.step(pos).unwrap();
        let reply = state.board.legal_moves()[0];
        state = state.step(reply).unwrap();
        ai.choose_move(&state.board).unwrap().unwrap();
        assert_eq!(ai.episode().len(), 3);

        let last = ai.last_after_my_move.unwrap();
        let final_move = last.legal_moves()[0];
        let final_board = last.apply_mark(final_move, Mark::O).unwrap();
        ai.observe_final(&final_board);

        assert_eq!(ai.episode().len(), 4);
        assert_eq!(ai.episode().steps()[3].action, final_move);
        // shown twice: nothing new to infer
        ai.observe_final(&final_board);
        assert_eq!(ai.episode().len(), 4);
    }

    #[test]
    fn test_temperature_schedule_and_override() {
        let mut ai = agent(Mark::O);
        assert_eq!(ai.temperature(), 1.0);
        for _ in 0..5_000 {
            ai.decay_exploration();
        }
        assert!((ai.temperature() - 0.5).abs() < 1e-9);

        let ai = ai.with_games_played(50_000);
        assert_eq!(ai.temperature(), 0.1);

        let mut ai = ai;
        ai.set_exploration_override(Some(0.0));
        assert_eq!(ai.exploration(), Some(0.0));
    }

    #[test]
    fn test_game_end_refines_and_decays() {
        let mut ai = agent(Mark::O);
        let pos = ai.choose_move(&Board::new()).unwrap().unwrap();
        ai.on_game_end(GameOutcome::Win(Mark::O)).unwrap();

        assert!(ai.episode().is_empty());
        assert_eq!(ai.games_played(), 1);
        // the centre is fixed by every rotation and collects all four credits
        let credits = Rotation::ALL
            .iter()
            .filter(|r| r.rotate_position(pos) == pos)
            .count() as u32;
        let table = ai.table().borrow();
        assert_eq!(table.get(&Board::new()).unwrap().weight(pos), 1 + 10 * credits);
    }

    #[test]
    fn test_played_moves_are_promoted_to_chosen_weight() {
        let config = WeightedConfig {
            chosen_weight: 3,
            ..WeightedConfig::default()
        };
        let mut ai = WeightedTableAgent::standalone(Mark::X, config).with_seed(2);
        let opened = Board::new().apply_mark(4, Mark::O).unwrap();
        let pos = ai.choose_move(&opened).unwrap().unwrap();

        let table = ai.table().borrow();
        let root = table.get(&Board::new()).unwrap();
        assert_eq!(root.weight(4), 3);
        assert_eq!(root.total(), 8 + 3);
        let mine = table.get(&opened).unwrap();
        assert_eq!(mine.weight(pos), 3);
        assert_eq!(mine.total(), 7 + 3);
    }

    #[test]
    fn test_default_chosen_weight_leaves_fresh_entries_flat() {
        let mut ai = agent(Mark::O);
        ai.choose_move(&Board::new()).unwrap().unwrap();
        assert_eq!(ai.table().borrow().get(&Board::new()).unwrap().total(), 9);
    }

    #[test]
    fn test_reset_scopes() {
        let mut ai = agent(Mark::O);
        ai.choose_move(&Board::new()).unwrap();
        ai.on_game_end(GameOutcome::Draw).unwrap();
        ai.choose_move(&Board::new()).unwrap();

        ai.reset(ResetScope::ForNewGame).unwrap();
        assert!(ai.episode().is_empty());
        assert!(!ai.table().borrow().is_empty());
        assert_eq!(ai.games_played(), 1);

        ai.reset(ResetScope::ForgetAll).unwrap();
        assert!(ai.table().borrow().is_empty());
        assert_eq!(ai.games_played(), 0);
    }

    #[test]
    fn test_shared_table_is_seen_by_both_marks() {
        let table: SharedTable = Rc::new(RefCell::new(WeightedTable::new()));
        let mut o = WeightedTableAgent::new(Mark::O, table.clone(), WeightedConfig::default());
        let mut x = WeightedTableAgent::new(Mark::X, table.clone(), WeightedConfig::default());

        let board = Board::new();
        let pos = o.choose_move(&board).unwrap().unwrap();
        let board = board.apply_mark(pos, Mark::O).unwrap();
        x.choose_move(&board).unwrap().unwrap();

        assert_eq!(table.borrow().len(), 2);
        assert!(x.dump_state().contains("WeightedTable size=2"));
    }
}
