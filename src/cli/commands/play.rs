//! Play command - an interactive session against a learner
//!
//! The human plays O and the learner plays X. The learner keeps learning
//! online after every finished game; the session never writes the model back.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use crate::{
    cli::output::render_board,
    config::TrainingConfig,
    persistence::{LearnedModel, LearnerKind, SavedModel},
    ports::{Agent, ResetScope},
    tictactoe::{
        GameOutcome, GameState, Mark,
        engine::{ai_first_move, on_cell_click},
    },
    utils::build_rng,
};

#[derive(Parser, Debug)]
#[command(about = "Play against a learner in the terminal")]
pub struct PlayArgs {
    /// Saved model to play against (a fresh learner otherwise)
    #[arg(long, short = 'm')]
    pub model: Option<PathBuf>,

    /// JSON training configuration for the learner's exploration and rewards
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Learner to create when no model is given
    #[arg(long, value_enum, default_value_t = LearnerKind::Weighted)]
    pub learner: LearnerKind,

    /// Pick the first mover of each game at random (O opens otherwise)
    #[arg(long, default_value_t = false)]
    pub random_first: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn execute(args: PlayArgs) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    execute_with_io(args, stdin.lock(), stdout.lock())
}

/// Run a session reading commands from `input` until `quit` or end of input.
pub fn execute_with_io<R: BufRead, W: Write>(args: PlayArgs, input: R, mut output: W) -> Result<()> {
    let config = match &args.config {
        Some(path) => TrainingConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => TrainingConfig::default(),
    };
    let model = match &args.model {
        Some(path) => SavedModel::load_from_file(path)?.into_model()?,
        None => LearnedModel::new(args.learner, &config),
    };
    let mut ai = model.to_agent(Mark::X, &config);
    if let Some(seed) = args.seed {
        ai.set_rng_seed(seed)?;
    }
    let mut rng = build_rng(args.seed);

    writeln!(
        output,
        "You are O, {} is X. Enter 0-8, 'new', 'forget', 'dump' or 'quit'.",
        ai.name()
    )?;

    let mut state = new_game(ai.as_mut(), args.random_first, &mut rng)?;
    show(&mut output, &state)?;

    for line in input.lines() {
        let line = line?;
        match line.trim() {
            "" => continue,
            "quit" | "q" => break,
            "new" => {
                state = new_game(ai.as_mut(), args.random_first, &mut rng)?;
            }
            "forget" => {
                ai.reset(ResetScope::ForgetAll)?;
                writeln!(output, "{} forgot everything it learned.", ai.name())?;
                state = new_game(ai.as_mut(), args.random_first, &mut rng)?;
            }
            "dump" => {
                writeln!(output, "{}", ai.dump_state())?;
                continue;
            }
            other => {
                let Ok(pos) = other.parse::<usize>() else {
                    writeln!(output, "Unknown command: {other}")?;
                    continue;
                };
                if pos > 8 {
                    writeln!(output, "Positions run from 0 to 8")?;
                    continue;
                }
                state = on_cell_click(&state, pos, Some(ai.as_mut()))?;
                if let Some(outcome) = state.outcome {
                    show(&mut output, &state)?;
                    writeln!(output, "{}", verdict(outcome))?;
                    ai.on_game_end(outcome)?;
                    state = new_game(ai.as_mut(), args.random_first, &mut rng)?;
                }
            }
        }
        show(&mut output, &state)?;
    }

    Ok(())
}

fn new_game(
    ai: &mut dyn Agent,
    random_first: bool,
    rng: &mut rand::rngs::StdRng,
) -> Result<GameState> {
    ai.reset(ResetScope::ForNewGame)?;
    let state = GameState::initial(random_first, rng);
    info!("new game, {} moves first", state.turn);
    Ok(ai_first_move(&state, ai)?)
}

fn show<W: Write>(output: &mut W, state: &GameState) -> Result<()> {
    writeln!(output, "\n{}", render_board(&state.board))?;
    if !state.is_terminal() {
        writeln!(output, "{} to move", state.turn)?;
    }
    Ok(())
}

fn verdict(outcome: GameOutcome) -> &'static str {
    match outcome {
        GameOutcome::Win(Mark::O) => "You win!",
        GameOutcome::Win(Mark::X) => "The computer wins.",
        GameOutcome::Draw => "Draw.",
    }
}
