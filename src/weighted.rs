//! Weighted-table learner
//!
//! One [`PTable`] of non-negative integer action weights per board seen,
//! stochastic selection over those weights and backward, gamma-decayed
//! credit assignment with rotation augmentation.

pub mod agent;
pub mod learning;
pub mod ptable;
pub mod selection;

pub use agent::{SharedTable, WeightedTableAgent};
pub use learning::{RewardShaping, refine, refine_with_rotations};
pub use ptable::{PTable, WeightedTable};
pub use selection::{SelectionRule, select_action};
