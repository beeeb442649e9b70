//! ttt CLI - train, evaluate and play against tic-tac-toe learners

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use tictactoe_learn::cli::commands::{dump, evaluate, play, train};

#[derive(Parser)]
#[command(name = "ttt")]
#[command(version, about = "Self-play learners for tic-tac-toe", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a learner by self-play
    Train(Box<train::TrainArgs>),

    /// Evaluate a saved model against a random opponent
    Evaluate(evaluate::EvaluateArgs),

    /// Play against a learner in the terminal
    Play(play::PlayArgs),

    /// Print the contents of a saved model
    Dump(dump::DumpArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    match cli.command {
        Commands::Train(args) => train::execute(*args),
        Commands::Evaluate(args) => evaluate::execute(args),
        Commands::Play(args) => play::execute(args),
        Commands::Dump(args) => dump::execute(args),
    }
}
