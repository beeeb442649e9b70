//! Q-learning agent
//!
//! A tabular Q-function shared by both marks, ε-greedy selection and a
//! backward TD(0) pass with rotation augmentation at the end of each game.

pub mod agent;
pub mod brain;

pub use agent::{QLearningAgent, SharedBrain};
pub use brain::QBrain;
