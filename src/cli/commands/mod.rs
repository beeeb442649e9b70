//! CLI command implementations

pub mod dump;
pub mod evaluate;
pub mod play;
pub mod train;
