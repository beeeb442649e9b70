//! The command line front end, end to end through files

use std::io::Cursor;

use clap::Parser;
use tempfile::tempdir;
use tictactoe_learn::{
    LearnerKind, SavedModel, TrainingConfig,
    cli::commands::{dump, evaluate, play, train},
    pipeline::TrainingSummary,
};

#[test]
fn train_evaluate_and_dump_a_model() {
    let tmp = tempdir().unwrap();
    let model_path = tmp.path().join("weighted.ttt");
    let summary_path = tmp.path().join("summary.json");
    let report_path = tmp.path().join("report.json");

    let args = train::TrainArgs::parse_from([
        "train",
        "weighted",
        "--loops",
        "2",
        "--each-times",
        "5",
        "--seed",
        "3",
        "--no-progress",
        "--evaluate",
        "10",
        "--output",
        model_path.to_str().unwrap(),
        "--summary",
        summary_path.to_str().unwrap(),
    ]);
    train::execute(args).expect("training should succeed");

    let saved = SavedModel::load_from_file(&model_path).unwrap();
    assert_eq!(saved.metadata.games_trained, 30);
    assert_eq!(saved.metadata.loops_completed, 2);
    assert_eq!(saved.metadata.seed, Some(3));
    assert_eq!(saved.model.kind(), LearnerKind::Weighted);

    let summary = TrainingSummary::load(&summary_path).unwrap();
    assert_eq!(summary.stats.total_games, 30);

    let args = evaluate::EvaluateArgs::parse_from([
        "evaluate",
        model_path.to_str().unwrap(),
        "--games",
        "12",
        "--seed",
        "9",
        "--mark",
        "o",
        "--export",
        report_path.to_str().unwrap(),
    ]);
    evaluate::execute(args).expect("evaluation should succeed");

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["stats"]["total_games"], 12);
    assert_eq!(report["transcripts"].as_array().unwrap().len(), 12);

    let args = dump::DumpArgs::parse_from(["dump", model_path.to_str().unwrap()]);
    dump::execute(args).expect("dump should succeed");
}

#[test]
fn resume_accumulates_metadata() {
    let tmp = tempdir().unwrap();
    let model_path = tmp.path().join("q.ttt");
    let path = model_path.to_str().unwrap();

    let first = train::TrainArgs::parse_from([
        "train", "q-learning", "-l", "1", "-n", "4", "--seed", "1", "--no-progress", "-O", path,
    ]);
    train::execute(first).unwrap();

    let second = train::TrainArgs::parse_from([
        "train", "q-learning", "-l", "1", "-n", "4", "--seed", "2", "--no-progress", "--resume",
        path, "-O", path,
    ]);
    train::execute(second).unwrap();

    let saved = SavedModel::load_from_file(&model_path).unwrap();
    assert_eq!(saved.metadata.games_trained, 24);
    assert_eq!(saved.metadata.loops_completed, 2);
    assert_eq!(saved.metadata.seed, Some(2));
}

#[test]
fn resume_rejects_a_different_learner() {
    let tmp = tempdir().unwrap();
    let model_path = tmp.path().join("w.ttt");
    let path = model_path.to_str().unwrap();

    train::execute(train::TrainArgs::parse_from([
        "train", "weighted", "-l", "1", "-n", "2", "--no-progress", "-O", path,
    ]))
    .unwrap();

    let err = train::execute(train::TrainArgs::parse_from([
        "train", "q-learning", "-l", "1", "-n", "2", "--no-progress", "--resume", path,
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("weighted"));
}

#[test]
fn play_session_scripted() {
    let args = play::PlayArgs::parse_from(["play", "--seed", "5"]);
    let input = Cursor::new("4\n4\nfoo\n12\ndump\nnew\nforget\nquit\n8\n");
    let mut output = Vec::new();
    play::execute_with_io(args, input, &mut output).unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.starts_with("You are O"));
    assert!(text.contains("Unknown command: foo"));
    assert!(text.contains("Positions run from 0 to 8"));
    assert!(text.contains("WeightedTable size="));
    assert!(text.contains("forgot everything"));
}

#[test]
fn play_uses_the_given_config() {
    let tmp = tempdir().unwrap();
    let config_path = tmp.path().join("config.json");
    let mut config = TrainingConfig::default();
    config.q_learning.epsilon = 0.5;
    config.save(&config_path).unwrap();

    let args = play::PlayArgs::parse_from([
        "play",
        "--learner",
        "q-learning",
        "--config",
        config_path.to_str().unwrap(),
        "--seed",
        "1",
    ]);
    let mut output = Vec::new();
    play::execute_with_io(args, Cursor::new("dump\nquit\n"), &mut output).unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("epsilon: 0.5000"), "{text}");
}

#[test]
fn play_reports_a_missing_config() {
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("absent.json");
    let args = play::PlayArgs::parse_from(["play", "-c", missing.to_str().unwrap()]);
    let err = play::execute_with_io(args, Cursor::new(""), Vec::new()).unwrap_err();
    assert!(err.to_string().contains("Failed to load config"));
}

#[test]
fn train_rejects_an_overflowing_game_count() {
    let loops = usize::MAX.to_string();
    let args = train::TrainArgs::parse_from([
        "train", "weighted", "--loops", loops.as_str(), "--each-times", "2", "--no-progress",
    ]);
    assert!(train::execute(args).is_err());
}
