//! Dump command - print the learned store of a saved model

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::{
    cli::output::{format_number, print_kv, print_section},
    persistence::SavedModel,
};

#[derive(Parser, Debug)]
#[command(about = "Print the contents of a saved model")]
pub struct DumpArgs {
    /// Path to a saved model
    pub model: PathBuf,
}

pub fn execute(args: DumpArgs) -> Result<()> {
    let saved = SavedModel::load_from_file(&args.model)?;
    let metadata = saved.metadata.clone();
    let model = saved.into_model()?;

    print_section(&format!("{} model", model.kind()));
    print_kv("States", &format_number(model.store_size()));
    print_kv("Games trained", &format_number(metadata.games_trained));
    print_kv("Loops completed", &format_number(metadata.loops_completed));
    if let Some(seed) = metadata.seed {
        print_kv("Seed", &seed.to_string());
    }
    println!();
    print!("{}", model.dump());
    Ok(())
}
