//! Ports (trait boundaries) between the learners and the outside world.
//!
//! Players are driven through [`Agent`]; training progress leaves the
//! pipeline through [`TrainingObserver`].

pub mod agent;
pub mod observer;

pub use agent::{Agent, LearningAgent, ResetScope, with_exploration};
pub use observer::TrainingObserver;
