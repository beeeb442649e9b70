//! Command-line interface
//!
//! Each command module exposes an `Args` struct for clap and an `execute`
//! entry point; `src/bin/ttt.rs` only dispatches.

pub mod commands;
pub mod output;
