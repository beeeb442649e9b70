//! Evaluate command - frozen play of a saved model against a random opponent

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::output::{format_number, print_kv, print_section, print_stats},
    config::{StartPolicy, TrainingConfig},
    persistence::SavedModel,
    pipeline::evaluate,
    tictactoe::Mark,
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate a saved model against a random opponent")]
pub struct EvaluateArgs {
    /// Path to a saved model
    pub model: PathBuf,

    /// Number of evaluation games
    #[arg(long, short = 'g', default_value_t = 100)]
    pub games: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Who opens each game
    #[arg(long, value_enum, default_value_t = StartPolicy::Alternate)]
    pub start: StartPolicy,

    /// Mark played by the model (`o` or `x`)
    #[arg(long, default_value = "X")]
    pub mark: Mark,

    /// Export the report, including transcripts, as JSON
    #[arg(long)]
    pub export: Option<PathBuf>,
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    let saved = SavedModel::load_from_file(&args.model)?;
    let metadata = saved.metadata.clone();
    let model = saved.into_model()?;

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut agent = model.to_agent(args.mark, &TrainingConfig::default());
    let report = evaluate(agent.as_mut(), args.games, seed, args.start)?;

    print_section("Evaluation");
    print_kv("Model", &model.kind().to_string());
    print_kv("States", &format_number(model.store_size()));
    print_kv("Games trained", &format_number(metadata.games_trained));
    print_kv("Plays", &args.mark.to_string());
    print_kv("Seed", &seed.to_string());
    println!();
    print_stats(&report.stats);

    if let Some(path) = &args.export {
        let file = File::create(path)
            .with_context(|| format!("Failed to create file: {}", path.display()))?;
        serde_json::to_writer_pretty(file, &report)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        println!("\nReport written to {}", path.display());
    }

    Ok(())
}
