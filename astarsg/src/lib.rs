//! Optimal sequence-to-graph alignment: A\* over `<read position, node>`
//! states with greedy fast-forward, cost capping and k-best traceback.

mod astar;
mod queue;

pub mod stats;

#[cfg(feature = "cli")]
pub mod cli;

pub use astar::*;

#[cfg(test)]
mod tests;
