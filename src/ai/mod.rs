//! Opponent AI
//!
//! - `evaluator`: candidate generation, scoring and the fallback chain
//! - `memory`: anti-repetition window
//! - `opponent`: the scheduled decision cycle

pub mod evaluator;
pub mod memory;
pub mod opponent;

pub use evaluator::{Decision, ShotCandidate, ShotEvaluator, ShotPlan};
pub use memory::ShotMemory;
pub use opponent::{Opponent, OpponentState, ScheduledTask};
