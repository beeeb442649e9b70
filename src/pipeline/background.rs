//! Training on a worker thread
//!
//! The learned store is moved into exactly one worker, which is the only code
//! that touches it until [`BackgroundTraining::join`] hands it back. Progress
//! flows out as [`TrainingEvent`]s over a channel; a shared flag carries
//! cancel requests in.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
    },
    thread::{self, JoinHandle},
};

use log::debug;

use super::{
    report::{BatchReport, GameProgress, LoopReport, TrainingSummary},
    selfplay::train_model,
};
use crate::{
    Error, Result, config::TrainingConfig, persistence::LearnedModel, ports::TrainingObserver,
};

/// Cooperative cancel flag, checked by the trainer between games
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress published by a background run
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvent {
    Started { total_games: usize },
    GameFinished(GameProgress),
    BatchFinished(BatchReport),
    LoopFinished(LoopReport),
    Finished(TrainingSummary),
}

impl TrainingEvent {
    /// Replay this event into `observer` on the receiving side
    pub fn dispatch(&self, observer: &mut dyn TrainingObserver) -> Result<()> {
        match self {
            TrainingEvent::Started { total_games } => observer.on_training_start(*total_games),
            TrainingEvent::GameFinished(progress) => observer.on_game_end(progress),
            TrainingEvent::BatchFinished(report) => observer.on_batch_end(report),
            TrainingEvent::LoopFinished(report) => observer.on_loop_end(report),
            TrainingEvent::Finished(summary) => observer.on_training_end(summary),
        }
    }
}

/// Forwards every observer call to a channel.
///
/// A hung-up receiver is not an error: training keeps going and the
/// results are still returned through the join handle.
struct ChannelObserver {
    sender: Sender<TrainingEvent>,
}

impl ChannelObserver {
    fn send(&self, event: TrainingEvent) -> Result<()> {
        if self.sender.send(event).is_err() {
            debug!("training event receiver hung up");
        }
        Ok(())
    }
}

impl TrainingObserver for ChannelObserver {
    fn on_training_start(&mut self, total_games: usize) -> Result<()> {
        self.send(TrainingEvent::Started { total_games })
    }

    fn on_game_end(&mut self, progress: &GameProgress) -> Result<()> {
        self.send(TrainingEvent::GameFinished(*progress))
    }

    fn on_batch_end(&mut self, report: &BatchReport) -> Result<()> {
        self.send(TrainingEvent::BatchFinished(*report))
    }

    fn on_loop_end(&mut self, report: &LoopReport) -> Result<()> {
        self.send(TrainingEvent::LoopFinished(*report))
    }

    fn on_training_end(&mut self, summary: &TrainingSummary) -> Result<()> {
        self.send(TrainingEvent::Finished(*summary))
    }
}

/// A training run owned by a worker thread
pub struct BackgroundTraining {
    handle: JoinHandle<Result<(LearnedModel, TrainingSummary)>>,
    events: Receiver<TrainingEvent>,
    cancel: CancelToken,
}

impl BackgroundTraining {
    /// Move `model` into a new worker and start training it.
    pub fn spawn(model: LearnedModel, config: TrainingConfig) -> Result<Self> {
        Self::spawn_with_observers(model, config, Vec::new())
    }

    /// Like [`BackgroundTraining::spawn`], with extra observers running on
    /// the worker thread
    pub fn spawn_with_observers(
        model: LearnedModel,
        config: TrainingConfig,
        mut observers: Vec<Box<dyn TrainingObserver>>,
    ) -> Result<Self> {
        config.validate()?;

        let (sender, events) = mpsc::channel();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        observers.push(Box::new(ChannelObserver { sender }));

        let handle = thread::Builder::new()
            .name("ttt-trainer".to_string())
            .spawn(move || train_model(model, &config, observers, Some(worker_cancel)))
            .map_err(|source| Error::Io {
                operation: "spawn training worker".to_string(),
                source,
            })?;

        Ok(Self {
            handle,
            events,
            cancel,
        })
    }

    /// Ask the worker to stop after the current game
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Blocking iterator over events; ends when the worker finishes
    pub fn events(&self) -> impl Iterator<Item = TrainingEvent> + '_ {
        self.events.iter()
    }

    /// Events published so far, without blocking
    pub fn try_events(&self) -> Vec<TrainingEvent> {
        self.events.try_iter().collect()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker and take back the model.
    ///
    /// # Errors
    ///
    /// The worker's own training error, or [`Error::WorkerPanicked`].
    pub fn join(self) -> Result<(LearnedModel, TrainingSummary)> {
        self.handle.join().map_err(|_| Error::WorkerPanicked)?
    }
}
