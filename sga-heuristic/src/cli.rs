use clap::Parser;
use serde::{Deserialize, Serialize};
use sga_types::{Cost, I};

/// Parameters of the seed heuristic.
#[derive(Parser, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[clap(next_help_heading = "Seed heuristic")]
pub struct SeedsParams {
    /// Seed length in bp; must exceed the trie depth.
    #[clap(long, default_value_t = 12)]
    pub seed_len: I,

    /// Maximal number of edits per seed occurrence.
    #[clap(long, default_value_t = 0)]
    pub max_seed_errors: i32,

    /// Deletions tolerated around the trie boundary on backward paths.
    #[clap(long, default_value_t = 0)]
    pub shifts_allowed: i32,
}

impl Default for SeedsParams {
    fn default() -> Self {
        SeedsParams {
            seed_len: 12,
            max_seed_errors: 0,
            shifts_allowed: 0,
        }
    }
}

/// Parameters of the prefix-lookahead heuristic.
#[derive(Parser, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[clap(next_help_heading = "Prefix heuristic")]
pub struct PrefixParams {
    /// Length cap of the upcoming read window.
    #[clap(long = "AStarLengthCap", default_value_t = 5)]
    pub max_prefix_len: I,

    /// Cost cap of the lookahead; larger values are clamped to the cap.
    #[clap(long = "AStarCostCap", default_value_t = 5.0)]
    pub max_prefix_cost: Cost,

    /// Collapse vertices with identical futures into equivalence classes.
    #[clap(long = "AStarNodeEqivClasses")]
    pub compress_vertices: bool,
}

impl Default for PrefixParams {
    fn default() -> Self {
        PrefixParams {
            max_prefix_len: 5,
            max_prefix_cost: 5.0,
            compress_vertices: false,
        }
    }
}
