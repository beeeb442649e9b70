//! Save/load support for learned models
//!
//! Models are written as MessagePack. The whole learned store of either
//! learner kind travels as one [`LearnedModel`] value, which is also what the
//! background trainer moves into and out of its worker thread.

use std::{
    cell::RefCell,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
    rc::Rc,
};

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    config::TrainingConfig,
    ports::Agent,
    q_learning::{QBrain, QLearningAgent},
    tictactoe::Mark,
    weighted::{WeightedTable, WeightedTableAgent},
};

/// Which learner a model belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LearnerKind {
    /// Weighted action tables with additive reward shaping
    Weighted,
    /// Tabular Q-learning
    QLearning,
}

impl std::fmt::Display for LearnerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LearnerKind::Weighted => write!(f, "weighted"),
            LearnerKind::QLearning => write!(f, "q-learning"),
        }
    }
}

/// Everything a learner kind needs to resume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LearnedModel {
    Weighted {
        table: WeightedTable,
        /// Position in the temperature schedule
        games_played: u64,
    },
    QLearning {
        brain: QBrain,
        /// Current exploration rate
        epsilon: f64,
    },
}

impl LearnedModel {
    /// Untrained model of `kind`
    pub fn new(kind: LearnerKind, config: &TrainingConfig) -> Self {
        match kind {
            LearnerKind::Weighted => LearnedModel::Weighted {
                table: WeightedTable::new(),
                games_played: 0,
            },
            LearnerKind::QLearning => LearnedModel::QLearning {
                brain: QBrain::new(),
                epsilon: config.q_learning.epsilon,
            },
        }
    }

    pub fn kind(&self) -> LearnerKind {
        match self {
            LearnedModel::Weighted { .. } => LearnerKind::Weighted,
            LearnedModel::QLearning { .. } => LearnerKind::QLearning,
        }
    }

    /// Number of board states in the store
    pub fn store_size(&self) -> usize {
        match self {
            LearnedModel::Weighted { table, .. } => table.len(),
            LearnedModel::QLearning { brain, .. } => brain.len(),
        }
    }

    /// A standalone agent for `mark` over a copy of this model
    pub fn to_agent(&self, mark: Mark, config: &TrainingConfig) -> Box<dyn Agent> {
        match self {
            LearnedModel::Weighted {
                table,
                games_played,
            } => Box::new(
                WeightedTableAgent::new(
                    mark,
                    Rc::new(RefCell::new(table.clone())),
                    config.weighted.clone(),
                )
                .with_games_played(*games_played),
            ),
            LearnedModel::QLearning { brain, epsilon } => Box::new(
                QLearningAgent::new(
                    mark,
                    Rc::new(RefCell::new(brain.clone())),
                    config.q_learning.clone(),
                )
                .with_current_epsilon(*epsilon),
            ),
        }
    }

    /// Human-readable dump of the store
    pub fn dump(&self) -> String {
        match self {
            LearnedModel::Weighted {
                table,
                games_played,
            } => format!("{}Global games played: {games_played}\n", table.dump()),
            LearnedModel::QLearning { brain, epsilon } => {
                format!("{}epsilon: {epsilon:.4}\n", brain.dump())
            }
        }
    }
}

/// Training metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// Games played across every training run of this model
    pub games_trained: usize,
    /// Loops completed across every training run of this model
    pub loops_completed: usize,
    /// Random seed of the last run (if any)
    pub seed: Option<u64>,
}

/// Serializable model with format version and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModel {
    /// Version of the save format
    pub version: u32,
    pub model: LearnedModel,
    pub metadata: TrainingMetadata,
}

impl SavedModel {
    /// Current save format version
    pub const VERSION: u32 = 1;

    pub fn new(model: LearnedModel, metadata: TrainingMetadata) -> Self {
        Self {
            version: Self::VERSION,
            model,
            metadata,
        }
    }

    /// The model, if this file's format is supported
    pub fn into_model(self) -> Result<LearnedModel> {
        if self.version != Self::VERSION {
            return Err(anyhow!(
                "Unsupported model save format version: {}. Expected {}",
                self.version,
                Self::VERSION
            ));
        }
        Ok(self.model)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, self).context("Failed to serialize model")?;
        info!(
            "saved {} model ({} states) to {}",
            self.model.kind(),
            self.model.store_size(),
            path.display()
        );
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
        let reader = BufReader::new(file);

        rmp_serde::decode::from_read(reader)
            .with_context(|| format!("Failed to deserialize model: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SelfPlayTrainer;

    fn config() -> TrainingConfig {
        TrainingConfig::default()
            .with_loops(1)
            .with_each_times(3)
            .with_seed(5)
    }

    #[test]
    fn test_weighted_round_trip() -> Result<()> {
        let mut trainer = SelfPlayTrainer::weighted(WeightedTable::new(), &config())?;
        trainer.run()?;
        let model = trainer.into_model()?;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("weighted.ttt");
        let metadata = TrainingMetadata {
            games_trained: 9,
            loops_completed: 1,
            seed: Some(5),
        };
        SavedModel::new(model.clone(), metadata.clone()).save_to_file(&path)?;

        let loaded = SavedModel::load_from_file(&path)?;
        assert_eq!(loaded.metadata, metadata);
        assert_eq!(loaded.into_model()?, model);
        Ok(())
    }

    #[test]
    fn test_q_learning_round_trip_in_memory() -> Result<()> {
        let mut trainer = SelfPlayTrainer::q_learning(QBrain::new(), &config())?;
        trainer.run()?;
        let model = trainer.into_model()?;
        assert_eq!(model.kind(), LearnerKind::QLearning);

        let bytes = rmp_serde::to_vec(&SavedModel::new(model.clone(), TrainingMetadata::default()))?;
        let loaded: SavedModel = rmp_serde::from_slice(&bytes)?;
        assert_eq!(loaded.into_model()?, model);
        Ok(())
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let mut saved = SavedModel::new(
            LearnedModel::new(LearnerKind::Weighted, &config()),
            TrainingMetadata::default(),
        );
        saved.version = 99;
        let err = saved.into_model().unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = SavedModel::load_from_file("/nonexistent/model.ttt").unwrap_err();
        assert!(err.to_string().contains("Failed to open file"));
    }

    #[test]
    fn test_to_agent_uses_a_copy() {
        let model = LearnedModel::new(LearnerKind::Weighted, &config());
        let mut agent = model.to_agent(Mark::X, &config());
        agent.choose_move(&crate::tictactoe::Board::new()).unwrap();
        assert_eq!(model.store_size(), 0);
        assert!(model.dump().contains("WeightedTable size=0"));
    }
}
