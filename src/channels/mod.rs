//! Channel list: reconciliation of system and live records, plus aggregate stats.

mod board;
mod reconcile;

pub use board::*;
pub use reconcile::*;
