//! Q-learning agent
//!
//! ε-greedy play from a shared [`QBrain`], and a backward TD(0) pass over the
//! finished episode, repeated for the three rotated transcripts.

use std::{cell::RefCell, rc::Rc};

use log::info;
use rand::{Rng, rngs::StdRng, seq::IndexedRandom};

use super::brain::QBrain;
use crate::{
    Result,
    config::QLearningConfig,
    episode::{Episode, Transition},
    ports::{Agent, LearningAgent, ResetScope, with_exploration},
    tictactoe::{Board, GameOutcome, Mark, Rotation},
    utils::build_rng,
};

/// A brain shared by both marks, one writer at a time
pub type SharedBrain = Rc<RefCell<QBrain>>;

/// Q-learning agent (off-policy TD control) over a shared brain
#[derive(Debug)]
pub struct QLearningAgent {
    name: String,
    mark: Mark,
    brain: SharedBrain,
    config: QLearningConfig,
    epsilon: f64,
    exploration_override: Option<f64>,
    episode: Episode<Transition>,
    rng: StdRng,
}

impl QLearningAgent {
    pub fn new(mark: Mark, brain: SharedBrain, config: QLearningConfig) -> Self {
        Self {
            name: format!("q-learning-{mark}"),
            mark,
            brain,
            epsilon: config.epsilon,
            config,
            exploration_override: None,
            episode: Episode::new(),
            rng: build_rng(None),
        }
    }

    /// Agent owning a fresh, unshared brain
    pub fn standalone(mark: Mark, config: QLearningConfig) -> Self {
        Self::new(mark, Rc::new(RefCell::new(QBrain::new())), config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    /// Resume from a previously decayed exploration rate
    pub fn with_current_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn brain(&self) -> &SharedBrain {
        &self.brain
    }

    pub fn episode(&self) -> &Episode<Transition> {
        &self.episode
    }

    /// Effective exploration rate
    pub fn epsilon(&self) -> f64 {
        self.exploration_override.unwrap_or(self.epsilon)
    }

    /// `ε ← max(min_epsilon, ε · epsilon_decay)`
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.min_epsilon);
    }

    /// Run `f` with ε pinned to `epsilon`; the previous setting is restored
    /// however `f` exits.
    pub fn with_epsilon<T>(&mut self, epsilon: f64, f: impl FnOnce(&mut Self) -> T) -> T {
        with_exploration(self, epsilon, f)
    }

    /// First legal position with the strictly greatest Q-value
    fn greedy(&self, board: &Board, legal: &[usize]) -> usize {
        let q = self.brain.borrow().q_values(board);
        let mut best = legal[0];
        let mut best_q = f64::NEG_INFINITY;
        for &pos in legal {
            if q[pos] > best_q {
                best_q = q[pos];
                best = pos;
            }
        }
        best
    }

    /// Backward TD(0) over one transcript.
    ///
    /// The first (terminal) update bootstraps from `bootstrap`; each later
    /// one from the best Q-value of the board that followed the step just
    /// updated.
    fn backward_update(&self, brain: &mut QBrain, episode: &Episode<Transition>, bootstrap: f64) {
        let mut next_max = bootstrap;
        for step in episode.iter_rev() {
            brain.td_update(
                &step.state,
                step.action,
                step.reward,
                next_max,
                self.config.alpha,
                self.config.gamma,
            );
            next_max = step.next.map_or(0.0, |next| brain.max_q(&next));
        }
    }
}

impl Agent for QLearningAgent {
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

        let action = if self.rng.random::<f64>() < self.epsilon() {
            match legal.choose(&mut self.rng) {
                Some(&pos) => pos,
                None => return Ok(None),
            }
        } else {
            self.greedy(board, &legal)
        };

        self.episode.push(Transition::new(*board, action));
        Ok(Some(action))
    }

    fn on_game_end(&mut self, outcome: GameOutcome) -> Result<()> {
        let episode = self.take_episode();
        self.refine_episode(&episode, outcome)?;
        self.decay_exploration();
        Ok(())
    }

    fn wants_step_rewards(&self) -> bool {
        true
    }

    fn record_step_outcome(&mut self, reward: f64, next: &Board) {
        if let Some(last) = self.episode.last_mut() {
            last.reward = reward;
            last.next = Some(*next);
        }
    }

    fn reset(&mut self, scope: ResetScope) -> Result<()> {
        self.episode.clear();
        if scope == ResetScope::ForgetAll {
            self.brain.borrow_mut().clear();
            info!("{}: forgot brain and episode", self.name);
        }
        Ok(())
    }

    fn dump_state(&self) -> String {
        let mut out = self.brain.borrow().dump();
        out.push_str(&format!("Transitions size={}\n", self.episode.len()));
        for (idx, t) in self.episode.steps().iter().enumerate() {
            out.push_str(&format!(
                "[{idx}] s={}, a={}, r={}, s'={}\n",
                t.state.encode(),
                t.action,
                t.reward,
                t.next.map(|b| b.encode()).unwrap_or_default()
            ));
        }
        out.push_str(&format!("epsilon: {:.4}\n", self.epsilon()));
        out
    }

    fn exploration(&self) -> Option<f64> {
        Some(self.epsilon())
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

impl LearningAgent for QLearningAgent {
    type Episode = Episode<Transition>;

    fn take_episode(&mut self) -> Self::Episode {
        std::mem::take(&mut self.episode)
    }

    fn refine_episode(&mut self, episode: &Self::Episode, outcome: GameOutcome) -> Result<()> {
        if episode.is_empty() {
            return Ok(());
        }

        let bootstrap = outcome.reward_for(self.mark);
        let mut brain = self.brain.borrow_mut();
        self.backward_update(&mut brain, episode, bootstrap);
        for rotation in Rotation::AUGMENTATIONS {
            self.backward_update(&mut brain, &episode.rotated(rotation), bootstrap);
        }
        Ok(())
    }

    fn decay_exploration(&mut self) {
        self.decay_epsilon();
    }

    fn store_size(&self) -> usize {
        self.brain.borrow().len()
    }
}
