//! Evaluation of a learned policy against a seeded random opponent

use log::info;
use serde::{Deserialize, Serialize};

use super::{
    baselines::{FrozenAgent, RandomAgent},
    report::GameStats,
    selfplay::{PlayedGame, play_game},
};
use crate::{
    Result,
    config::StartPolicy,
    ports::Agent,
    tictactoe::{GameOutcome, Mark},
    utils::{build_rng, derive_seed},
};

/// One evaluation game as played
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTranscript {
    pub first_mover: Mark,
    pub moves: Vec<usize>,
    pub outcome: GameOutcome,
}

impl From<PlayedGame> for GameTranscript {
    fn from(game: PlayedGame) -> Self {
        Self {
            first_mover: game.first_mover,
            moves: game.moves,
            outcome: game.outcome,
        }
    }
}

/// Results of [`evaluate`], from the evaluated agent's point of view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub agent: String,
    pub mark: Mark,
    pub seed: u64,
    pub stats: GameStats,
    pub transcripts: Vec<GameTranscript>,
}

/// Play `games` games of `agent`, frozen, against a random opponent.
///
/// Exploration is forced to 0 and nothing is learned. The agent and the
/// opponent are both reseeded from `seed`, so equal seeds on an unchanged
/// store give identical reports.
pub fn evaluate(
    agent: &mut dyn Agent,
    games: usize,
    seed: u64,
    start: StartPolicy,
) -> Result<EvaluationReport> {
    agent.set_rng_seed(seed)?;
    let name = agent.name().to_string();
    let mark = agent.mark();

    let mut frozen = FrozenAgent::new(agent);
    let mut opponent = RandomAgent::with_seed(mark.opponent(), derive_seed(seed, 1));
    let mut start_rng = build_rng(Some(derive_seed(seed, 2)));

    let mut stats = GameStats::default();
    let mut transcripts = Vec::with_capacity(games);
    for game in 0..games {
        let first = start.first_mover(game, &mut start_rng);
        let played = match mark {
            Mark::O => play_game(&mut frozen, &mut opponent, first)?,
            Mark::X => play_game(&mut opponent, &mut frozen, first)?,
        };
        stats.record_outcome(played.outcome, mark);
        transcripts.push(GameTranscript::from(played));
    }

    info!("evaluated {name} over {games} games: {stats}");
    Ok(EvaluationReport {
        agent: name,
        mark,
        seed,
        stats,
        transcripts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{QLearningConfig, WeightedConfig},
        pipeline::baselines::FirstLegalAgent,
        q_learning::QLearningAgent,
        weighted::WeightedTableAgent,
    };

    #[test]
    fn test_counts_every_game() {
        let mut agent = FirstLegalAgent::new(Mark::X);
        let report = evaluate(&mut agent, 20, 7, StartPolicy::Alternate).unwrap();
        assert_eq!(report.stats.total_games, 20);
        assert_eq!(report.transcripts.len(), 20);
        assert!(report.stats.is_consistent());
        assert_eq!(report.transcripts[0].first_mover, Mark::O);
        assert_eq!(report.transcripts[1].first_mover, Mark::X);
    }

    #[test]
    fn test_same_seed_same_report() {
        let mut agent = WeightedTableAgent::standalone(Mark::X, WeightedConfig::default());
        let a = evaluate(&mut agent, 15, 99, StartPolicy::Random).unwrap();
        let b = evaluate(&mut agent, 15, 99, StartPolicy::Random).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_evaluation_learns_nothing() {
        let mut agent = QLearningAgent::standalone(Mark::O, QLearningConfig::default());
        evaluate(&mut agent, 10, 1, StartPolicy::O).unwrap();
        assert!(agent.brain().borrow().is_empty());
        assert_eq!(agent.epsilon(), 0.1);
        assert_eq!(agent.exploration_override(), None);
    }
}
