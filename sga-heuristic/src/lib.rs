//! Admissible lower bounds for A\* sequence-to-graph alignment: the
//! seed-membership heuristic and the memoized prefix-lookahead heuristic,
//! behind a common trait object interface.

mod cli;
mod heuristic;
mod prefix;
mod seeds;

pub use cli::*;
pub use heuristic::*;
pub use prefix::*;
pub use seeds::*;
