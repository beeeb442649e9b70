//! Train command - self-play training on a background worker

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::{
    cli::output::{format_number, print_kv, print_section, print_stats},
    config::{StartPolicy, TrainingConfig},
    persistence::{LearnedModel, LearnerKind, SavedModel, TrainingMetadata},
    pipeline::{BackgroundTraining, ProgressObserver, TrainingSummary, evaluate},
    tictactoe::Mark,
};

#[derive(Parser, Debug)]
#[command(about = "Train a learner by self-play")]
pub struct TrainArgs {
    /// Type of learner to train
    #[arg(value_enum)]
    pub learner: LearnerKind,

    /// Number of training loops
    #[arg(long, short = 'l')]
    pub loops: Option<usize>,

    /// Games per batch (three batches per loop)
    #[arg(long, short = 'n')]
    pub each_times: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON training configuration; flags override its values
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Continue training a previously saved model
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Output file for the trained model
    #[arg(long, short = 'O')]
    pub output: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Evaluate the trained X learner over this many games afterwards
    #[arg(long)]
    pub evaluate: Option<usize>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

/// Build the effective configuration from file and flags
pub fn resolve_config(args: &TrainArgs) -> Result<TrainingConfig> {
    let mut config = match &args.config {
        Some(path) => TrainingConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => TrainingConfig::default(),
    };
    if let Some(loops) = args.loops {
        config.loops = loops;
    }
    if let Some(each_times) = args.each_times {
        config.each_times = each_times;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn load_or_create(
    args: &TrainArgs,
    config: &TrainingConfig,
) -> Result<(LearnedModel, TrainingMetadata)> {
    let Some(path) = &args.resume else {
        return Ok((
            LearnedModel::new(args.learner, config),
            TrainingMetadata::default(),
        ));
    };

    let saved = SavedModel::load_from_file(path)?;
    let metadata = saved.metadata.clone();
    let model = saved.into_model()?;
    if model.kind() != args.learner {
        bail!(
            "{} holds a {} model, not {}",
            path.display(),
            model.kind(),
            args.learner
        );
    }
    println!(
        "Resuming {} model with {} states",
        model.kind(),
        format_number(model.store_size())
    );
    Ok((model, metadata))
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let (model, mut metadata) = load_or_create(&args, &config)?;

    print_section("Training");
    print_kv("Learner", &args.learner.to_string());
    print_kv("Loops", &format_number(config.loops));
    print_kv("Games per batch", &format_number(config.each_times));
    print_kv("Total games", &format_number(config.total_games()));
    if let Some(seed) = config.seed {
        print_kv("Seed", &seed.to_string());
    }

    let training = BackgroundTraining::spawn(model, config.clone())?;
    let mut progress = ProgressObserver::new();
    for event in training.events() {
        if !args.no_progress {
            event.dispatch(&mut progress)?;
        }
    }
    let (model, summary) = training.join()?;

    report_summary(&summary, &model);

    metadata.games_trained += summary.stats.total_games;
    metadata.loops_completed += summary.loops_completed;
    metadata.seed = config.seed;

    if let Some(games) = args.evaluate {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut agent = model.to_agent(Mark::X, &config);
        let report = evaluate(agent.as_mut(), games, seed, StartPolicy::Alternate)?;
        print_section("Evaluation vs random (X, alternating first move)");
        print_stats(&report.stats);
    }

    if let Some(path) = &args.summary {
        summary
            .save(path)
            .with_context(|| format!("Failed to write summary: {}", path.display()))?;
        println!("Summary written to {}", path.display());
    }

    if let Some(path) = &args.output {
        SavedModel::new(model, metadata).save_to_file(path)?;
        println!("Model saved to {}", path.display());
    }

    Ok(())
}

fn report_summary(summary: &TrainingSummary, model: &LearnedModel) {
    print_section(if summary.cancelled {
        "Training cancelled"
    } else {
        "Training complete"
    });
    print_kv("Loops completed", &format_number(summary.loops_completed));
    print_kv("States learned", &format_number(model.store_size()));
    println!("\nResults from X's point of view:");
    print_stats(&summary.stats);
}
