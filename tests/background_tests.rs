//! Training on a worker thread

mod common;

use common::quick_config;
use tictactoe_learn::{
    LearnedModel, LearnerKind,
    pipeline::{BackgroundTraining, MetricsObserver, TrainingEvent, train_model},
};

#[test]
fn worker_returns_the_same_model_as_a_direct_run() {
    let config = quick_config(2, 6, 99);
    let model = LearnedModel::new(LearnerKind::Weighted, &config);

    let (direct, direct_summary) = train_model(model.clone(), &config, Vec::new(), None).unwrap();

    let training = BackgroundTraining::spawn(model, config).unwrap();
    let events: Vec<TrainingEvent> = training.events().collect();
    let (trained, summary) = training.join().unwrap();

    assert_eq!(trained, direct);
    assert_eq!(summary, direct_summary);

    assert!(matches!(
        events.first(),
        Some(TrainingEvent::Started { total_games: 36 })
    ));
    assert!(matches!(events.last(), Some(TrainingEvent::Finished(s)) if !s.cancelled));
    let games = events
        .iter()
        .filter(|e| matches!(e, TrainingEvent::GameFinished(_)))
        .count();
    let loops = events
        .iter()
        .filter(|e| matches!(e, TrainingEvent::LoopFinished(_)))
        .count();
    let batches = events
        .iter()
        .filter(|e| matches!(e, TrainingEvent::BatchFinished(_)))
        .count();
    assert_eq!((games, batches, loops), (36, 6, 2));
}

#[test]
fn cancel_stops_between_games() {
    let config = quick_config(1_000, 100, 7);
    let training = BackgroundTraining::spawn(
        LearnedModel::new(LearnerKind::QLearning, &config),
        config.clone(),
    )
    .unwrap();

    for event in training.events() {
        if let TrainingEvent::LoopFinished(report) = event {
            if report.loop_index == 0 {
                training.cancel();
            }
        }
    }
    let (model, summary) = training.join().unwrap();

    assert!(summary.cancelled);
    assert!(summary.loops_completed >= 1);
    assert!(summary.loops_completed < config.loops);
    assert_eq!(model.store_size(), summary.store_size);
}

#[test]
fn observers_run_on_the_worker() {
    let config = quick_config(1, 3, 1);
    let training = BackgroundTraining::spawn_with_observers(
        LearnedModel::new(LearnerKind::Weighted, &config),
        config,
        vec![Box::new(MetricsObserver::new())],
    )
    .unwrap();
    let (_, summary) = training.join().unwrap();
    assert_eq!(summary.stats.total_games, 9);
}

#[test]
fn invalid_config_is_rejected_before_spawning() {
    let mut config = quick_config(1, 1, 1);
    config.q_learning.alpha = 0.0;
    let result = BackgroundTraining::spawn(
        LearnedModel::new(LearnerKind::QLearning, &config),
        config,
    );
    assert!(result.is_err());
}
