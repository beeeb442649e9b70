//! Self-play orchestrator
//!
//! Two learners of the same kind share one store. Each loop plays a
//! self-play batch, then two batches of the X learner against a random O,
//! and finally refines every collected episode in play order.

use std::{cell::RefCell, rc::Rc};

use log::{debug, info, trace};
use rand::rngs::StdRng;

use super::{
    background::CancelToken,
    baselines::RandomAgent,
    regimen::TrainingPhase,
    report::{BatchReport, GameProgress, GameStats, LoopReport, TrainingSummary},
};
use crate::{
    Error, Result,
    config::TrainingConfig,
    persistence::LearnedModel,
    ports::{Agent, LearningAgent, ResetScope, TrainingObserver},
    q_learning::{QBrain, QLearningAgent},
    tictactoe::{GameOutcome, GameState, Mark, board::check_position, engine::step_with_agent},
    utils::{build_rng, derive_seed},
    weighted::{WeightedTable, WeightedTableAgent},
};

/// A finished game: who opened, what was played and how it ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedGame {
    pub first_mover: Mark,
    pub moves: Vec<usize>,
    pub outcome: GameOutcome,
}

/// Play one game between `agent_o` and `agent_x` on the silent path.
///
/// Both participants are reset for a new game first and shown the terminal
/// board at the end. Learning is left to the caller.
///
/// # Errors
///
/// - [`Error::NoValidMoves`] if a participant passes on a live board
/// - [`Error::InvalidMove`] if a participant picks an occupied cell
pub fn play_game(
    agent_o: &mut dyn Agent,
    agent_x: &mut dyn Agent,
    first_mover: Mark,
) -> Result<PlayedGame> {
    agent_o.reset(ResetScope::ForNewGame)?;
    agent_x.reset(ResetScope::ForNewGame)?;

    let mut state = GameState::new(first_mover);
    let mut moves = Vec::with_capacity(9);

    let outcome = loop {
        if let Some(outcome) = state.outcome {
            break outcome;
        }
        let mover: &mut dyn Agent = match state.turn {
            Mark::O => &mut *agent_o,
            Mark::X => &mut *agent_x,
        };

        let pos = mover.choose_move(&state.board)?.ok_or(Error::NoValidMoves)?;
        check_position(pos)?;
        if !state.board.is_empty(pos) {
            return Err(Error::InvalidMove { position: pos });
        }

        state = step_with_agent(&state, pos, mover)?;
        moves.push(pos);
    };

    agent_o.observe_final(&state.board);
    agent_x.observe_final(&state.board);
    trace!("game {first_mover} first {moves:?}: {outcome}");

    Ok(PlayedGame {
        first_mover,
        moves,
        outcome,
    })
}

/// Episode waiting for the loop's refinement pass
struct PendingEpisode<E> {
    owner: Mark,
    episode: E,
    outcome: GameOutcome,
}

/// Self-play trainer over two learners sharing one store
pub struct SelfPlayTrainer<A: LearningAgent> {
    config: TrainingConfig,
    agent_o: A,
    agent_x: A,
    opponent: RandomAgent,
    observers: Vec<Box<dyn TrainingObserver>>,
    cancel: Option<CancelToken>,
    rng: StdRng,
}

impl<A: LearningAgent> SelfPlayTrainer<A> {
    /// Trainer over two prepared learners, which should share their store.
    ///
    /// When the configuration carries a seed, every random stream of the
    /// run (both learners, the random opponent, the first-mover draw) is
    /// derived from it.
    pub fn new(mut agent_o: A, mut agent_x: A, config: &TrainingConfig) -> Result<Self> {
        config.validate()?;

        let seed_for = |stream: u64| config.seed.map(|seed| derive_seed(seed, stream));
        if let Some(seed) = seed_for(1) {
            agent_o.set_rng_seed(seed)?;
        }
        if let Some(seed) = seed_for(2) {
            agent_x.set_rng_seed(seed)?;
        }
        let opponent = match seed_for(3) {
            Some(seed) => RandomAgent::with_seed(Mark::O, seed),
            None => RandomAgent::new(Mark::O),
        };

        Ok(Self {
            config: config.clone(),
            agent_o,
            agent_x,
            opponent,
            observers: Vec::new(),
            cancel: None,
            rng: build_rng(seed_for(0)),
        })
    }

    /// Add an observer to the trainer
    pub fn with_observer(mut self, observer: Box<dyn TrainingObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn agent_o(&self) -> &A {
        &self.agent_o
    }

    pub fn agent_x(&self) -> &A {
        &self.agent_x
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Run every configured loop, or until cancelled.
    ///
    /// A cancel request is honoured between games. The episodes the current
    /// loop collected so far are then dropped unrefined, so the store only
    /// ever reflects whole loops.
    pub fn run(&mut self) -> Result<TrainingSummary> {
        let total_games = self.config.total_games();
        for observer in &mut self.observers {
            observer.on_training_start(total_games)?;
        }
        info!(
            "training {} loops x 3 batches x {} games",
            self.config.loops, self.config.each_times
        );

        let mut overall = GameStats::default();
        let mut loops_completed = 0;
        let mut cancelled = false;

        for loop_index in 0..self.config.loops {
            let mut pending = Vec::new();
            let mut loop_stats = GameStats::default();
            let mut phase = TrainingPhase::SelfPlay;

            while phase.plays_games() {
                let mut batch = GameStats::default();
                for game in 0..self.config.each_times {
                    if self.is_cancelled() {
                        cancelled = true;
                        break;
                    }
                    let played = self.play_phase_game(phase, game, &mut pending)?;
                    batch.record_outcome(played.outcome, Mark::X);
                    overall.record_outcome(played.outcome, Mark::X);

                    let progress = GameProgress {
                        game_index: overall.total_games - 1,
                        total_games,
                        loop_index,
                        phase,
                        first_mover: played.first_mover,
                        outcome: played.outcome,
                        move_count: played.moves.len(),
                        stats: overall,
                    };
                    for observer in &mut self.observers {
                        observer.on_game_end(&progress)?;
                    }
                }
                if cancelled {
                    break;
                }

                debug!("loop {loop_index} {phase}: {batch}");
                let report = BatchReport {
                    loop_index,
                    phase,
                    stats: batch,
                };
                for observer in &mut self.observers {
                    observer.on_batch_end(&report)?;
                }
                loop_stats.merge(&batch);
                phase = phase.next();
            }

            if cancelled {
                info!(
                    "training cancelled in loop {loop_index}; discarding {} pending episodes",
                    pending.len()
                );
                break;
            }

            let refined_episodes = pending.len();
            self.refine_pending(pending)?;
            loops_completed += 1;

            let report = LoopReport {
                loop_index,
                loops: self.config.loops,
                stats: loop_stats,
                refined_episodes,
                store_size: self.agent_x.store_size(),
            };
            info!(
                "loop {}/{}: {} (refined {} episodes, store size {})",
                loop_index + 1,
                self.config.loops,
                loop_stats,
                refined_episodes,
                report.store_size
            );
            for observer in &mut self.observers {
                observer.on_loop_end(&report)?;
            }
        }

        let summary = TrainingSummary {
            stats: overall,
            loops_completed,
            cancelled,
            store_size: self.agent_x.store_size(),
        };
        for observer in &mut self.observers {
            observer.on_training_end(&summary)?;
        }
        Ok(summary)
    }

    fn play_phase_game(
        &mut self,
        phase: TrainingPhase,
        game: usize,
        pending: &mut Vec<PendingEpisode<A::Episode>>,
    ) -> Result<PlayedGame> {
        let played = match phase.fixed_first_mover() {
            None => {
                let first = self.config.self_play_start.first_mover(game, &mut self.rng);
                let played = play_game(&mut self.agent_o, &mut self.agent_x, first)?;
                pending.push(PendingEpisode {
                    owner: Mark::O,
                    episode: self.agent_o.take_episode(),
                    outcome: played.outcome,
                });
                played
            }
            Some(first) => play_game(&mut self.opponent, &mut self.agent_x, first)?,
        };

        pending.push(PendingEpisode {
            owner: Mark::X,
            episode: self.agent_x.take_episode(),
            outcome: played.outcome,
        });
        Ok(played)
    }

    /// Refine in play order; each episode advances its owner's schedule once.
    fn refine_pending(&mut self, pending: Vec<PendingEpisode<A::Episode>>) -> Result<()> {
        for item in pending {
            let agent = match item.owner {
                Mark::O => &mut self.agent_o,
                Mark::X => &mut self.agent_x,
            };
            agent.refine_episode(&item.episode, item.outcome)?;
            agent.decay_exploration();
        }
        Ok(())
    }
}

/// Take the value out of a shared store once every other holder is gone.
fn reclaim<T>(store: Rc<RefCell<T>>) -> Result<T> {
    Rc::try_unwrap(store)
        .map(RefCell::into_inner)
        .map_err(|store| Error::SharedStoreInUse {
            references: Rc::strong_count(&store),
        })
}

impl SelfPlayTrainer<WeightedTableAgent> {
    /// Two weighted learners on `table`
    pub fn weighted(table: WeightedTable, config: &TrainingConfig) -> Result<Self> {
        Self::weighted_resumed(table, 0, config)
    }

    /// Two weighted learners on `table`, with the temperature schedule
    /// resumed after `games_played` games
    pub fn weighted_resumed(
        table: WeightedTable,
        games_played: u64,
        config: &TrainingConfig,
    ) -> Result<Self> {
        let table = Rc::new(RefCell::new(table));
        let agent_o = WeightedTableAgent::new(Mark::O, Rc::clone(&table), config.weighted.clone())
            .with_games_played(games_played);
        let agent_x = WeightedTableAgent::new(Mark::X, table, config.weighted.clone())
            .with_games_played(games_played);
        Self::new(agent_o, agent_x, config)
    }

    /// Give back the shared table
    pub fn into_store(self) -> Result<WeightedTable> {
        let table = Rc::clone(self.agent_x.table());
        drop(self);
        reclaim(table)
    }

    /// The trained table together with the X learner's schedule position
    pub fn into_model(self) -> Result<LearnedModel> {
        let games_played = self.agent_x.games_played();
        Ok(LearnedModel::Weighted {
            table: self.into_store()?,
            games_played,
        })
    }
}

impl SelfPlayTrainer<QLearningAgent> {
    /// Two Q-learners on `brain`
    pub fn q_learning(brain: QBrain, config: &TrainingConfig) -> Result<Self> {
        Self::q_learning_resumed(brain, config.q_learning.epsilon, config)
    }

    /// Two Q-learners on `brain`, exploring at `epsilon`
    pub fn q_learning_resumed(brain: QBrain, epsilon: f64, config: &TrainingConfig) -> Result<Self> {
        let brain = Rc::new(RefCell::new(brain));
        let agent_o = QLearningAgent::new(Mark::O, Rc::clone(&brain), config.q_learning.clone())
            .with_current_epsilon(epsilon);
        let agent_x = QLearningAgent::new(Mark::X, brain, config.q_learning.clone())
            .with_current_epsilon(epsilon);
        Self::new(agent_o, agent_x, config)
    }

    /// Give back the shared brain
    pub fn into_store(self) -> Result<QBrain> {
        let brain = Rc::clone(self.agent_x.brain());
        drop(self);
        reclaim(brain)
    }

    /// The trained brain together with the X learner's exploration rate
    pub fn into_model(self) -> Result<LearnedModel> {
        let epsilon = self.agent_x.epsilon();
        Ok(LearnedModel::QLearning {
            brain: self.into_store()?,
            epsilon,
        })
    }
}

/// Train `model` in place of its store and hand back the trained model.
///
/// This is the whole training run in one call, as used by the background
/// worker and the CLI.
pub fn train_model(
    model: LearnedModel,
    config: &TrainingConfig,
    observers: Vec<Box<dyn TrainingObserver>>,
    cancel: Option<CancelToken>,
) -> Result<(LearnedModel, TrainingSummary)> {
    match model {
        LearnedModel::Weighted {
            table,
            games_played,
        } => {
            let mut trainer = attach(
                SelfPlayTrainer::weighted_resumed(table, games_played, config)?,
                observers,
                cancel,
            );
            let summary = trainer.run()?;
            Ok((trainer.into_model()?, summary))
        }
        LearnedModel::QLearning { brain, epsilon } => {
            let mut trainer = attach(
                SelfPlayTrainer::q_learning_resumed(brain, epsilon, config)?,
                observers,
                cancel,
            );
            let summary = trainer.run()?;
            Ok((trainer.into_model()?, summary))
        }
    }
}

fn attach<A: LearningAgent>(
    mut trainer: SelfPlayTrainer<A>,
    observers: Vec<Box<dyn TrainingObserver>>,
    cancel: Option<CancelToken>,
) -> SelfPlayTrainer<A> {
    for observer in observers {
        trainer = trainer.with_observer(observer);
    }
    match cancel {
        Some(token) => trainer.with_cancel_token(token),
        None => trainer,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::pipeline::baselines::FirstLegalAgent;

    /// Records every event into shared vectors
    #[derive(Clone, Default)]
    struct Recorder {
        games: Arc<Mutex<Vec<GameProgress>>>,
        batches: Arc<Mutex<Vec<BatchReport>>>,
        loops: Arc<Mutex<Vec<LoopReport>>>,
    }

    impl TrainingObserver for Recorder {
        fn on_game_end(&mut self, progress: &GameProgress) -> Result<()> {
            self.games.lock().unwrap().push(*progress);
            Ok(())
        }

        fn on_batch_end(&mut self, report: &BatchReport) -> Result<()> {
            self.batches.lock().unwrap().push(*report);
            Ok(())
        }

        fn on_loop_end(&mut self, report: &LoopReport) -> Result<()> {
            self.loops.lock().unwrap().push(*report);
            Ok(())
        }
    }

    fn small_config() -> TrainingConfig {
        TrainingConfig::default()
            .with_loops(2)
            .with_each_times(5)
            .with_seed(42)
    }

    #[test]
    fn test_play_game_first_legal_pair() {
        let mut o = FirstLegalAgent::new(Mark::O);
        let mut x = FirstLegalAgent::new(Mark::X);
        let played = play_game(&mut o, &mut x, Mark::O).unwrap();
        // O: 0, 2, 4, 6 / X: 1, 3, 5 -> O completes 2-4-6
        assert_eq!(played.moves, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(played.outcome, GameOutcome::Win(Mark::O));
    }

    #[test]
    fn test_play_game_rejects_occupied_choice() {
        struct Stubborn;
        impl Agent for Stubborn {
            fn name(&self) -> &str {
                "stubborn"
            }
            fn mark(&self) -> Mark {
                Mark::X
            }
            fn choose_move(&mut self, _board: &crate::tictactoe::Board) -> Result<Option<usize>> {
                Ok(Some(0))
            }
        }

        let mut o = FirstLegalAgent::new(Mark::O);
        let err = play_game(&mut o, &mut Stubborn, Mark::O).unwrap_err();
        assert!(matches!(err, Error::InvalidMove { position: 0 }));
    }

    #[test]
    fn test_weighted_run_reports_every_phase() {
        let recorder = Recorder::default();
        let mut trainer = SelfPlayTrainer::weighted(WeightedTable::new(), &small_config())
            .unwrap()
            .with_observer(Box::new(recorder.clone()));
        let summary = trainer.run().unwrap();

        assert_eq!(summary.stats.total_games, 30);
        assert_eq!(summary.loops_completed, 2);
        assert!(!summary.cancelled);
        assert!(summary.stats.is_consistent());

        let games = recorder.games.lock().unwrap();
        assert_eq!(games.len(), 30);
        assert!(
            games
                .iter()
                .filter(|g| g.phase == TrainingPhase::VsRandomAfter)
                .all(|g| g.first_mover == Mark::O)
        );
        assert!(
            games
                .iter()
                .filter(|g| g.phase == TrainingPhase::VsRandomFirst)
                .all(|g| g.first_mover == Mark::X)
        );

        let phases: Vec<TrainingPhase> =
            recorder.batches.lock().unwrap().iter().map(|b| b.phase).collect();
        assert_eq!(phases.len(), 6);
        assert_eq!(&phases[..3], &TrainingPhase::PLAYING);

        let loops = recorder.loops.lock().unwrap();
        // self-play yields two episodes per game, the random phases one
        assert!(loops.iter().all(|l| l.refined_episodes == 5 * 2 + 5 + 5));

        // X refined 15 episodes per loop, O 5
        assert_eq!(trainer.agent_x().games_played(), 30);
        assert_eq!(trainer.agent_o().games_played(), 10);

        let table = trainer.into_store().unwrap();
        assert!(!table.is_empty());
    }

    #[test]
    fn test_q_learning_run_decays_epsilon() {
        let mut trainer = SelfPlayTrainer::q_learning(QBrain::new(), &small_config()).unwrap();
        let summary = trainer.run().unwrap();
        assert_eq!(summary.stats.total_games, 30);
        assert!(trainer.agent_x().epsilon() < 0.1);

        match trainer.into_model().unwrap() {
            LearnedModel::QLearning { brain, epsilon } => {
                assert!(!brain.is_empty());
                assert!(epsilon < 0.1);
            }
            LearnedModel::Weighted { .. } => panic!("expected a Q-learning model"),
        }
    }

    #[test]
    fn test_cancel_before_start_discards_everything() {
        let token = CancelToken::new();
        token.cancel();
        let mut trainer = SelfPlayTrainer::weighted(WeightedTable::new(), &small_config())
            .unwrap()
            .with_cancel_token(token);
        let summary = trainer.run().unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.loops_completed, 0);
        assert_eq!(summary.stats.total_games, 0);
        assert_eq!(trainer.agent_x().games_played(), 0);
    }

    #[test]
    fn test_cancel_mid_loop_keeps_only_whole_loops() {
        /// Fires the token after a fixed number of games
        struct CancelAfter {
            token: CancelToken,
            games: usize,
        }
        impl TrainingObserver for CancelAfter {
            fn on_game_end(&mut self, progress: &GameProgress) -> Result<()> {
                if progress.game_index + 1 == self.games {
                    self.token.cancel();
                }
                Ok(())
            }
        }

        let token = CancelToken::new();
        let mut trainer = SelfPlayTrainer::weighted(WeightedTable::new(), &small_config())
            .unwrap()
            .with_cancel_token(token.clone())
            .with_observer(Box::new(CancelAfter {
                token,
                games: 20,
            }));
        let summary = trainer.run().unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.loops_completed, 1);
        assert_eq!(summary.stats.total_games, 20);
        // only loop 0's episodes were refined
        assert_eq!(trainer.agent_x().games_played(), 15);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut trainer =
                SelfPlayTrainer::weighted(WeightedTable::new(), &small_config()).unwrap();
            let summary = trainer.run().unwrap();
            (summary, trainer.into_store().unwrap())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_into_store_fails_while_shared() {
        let trainer = SelfPlayTrainer::weighted(WeightedTable::new(), &small_config()).unwrap();
        let extra = Rc::clone(trainer.agent_x().table());
        let err = trainer.into_store().unwrap_err();
        assert!(matches!(err, Error::SharedStoreInUse { references: 2 }));
        drop(extra);
    }
}
