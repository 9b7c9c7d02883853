use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use sga_heuristic::{PrefixParams, SeedsParams};
use sga_types::{Cost, EditCosts, I};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum Algorithm {
    /// No heuristic.
    Dijkstra,
    /// Memoized prefix lookahead.
    AstarPrefix,
    /// Seed heuristic with a bounded per-seed error budget.
    #[default]
    AstarSeeds,
}

#[derive(Parser, Debug)]
#[clap(author, about, disable_version_flag(true))]
pub struct Cli {
    /// Reference graph in forward-strand GFA (canonicalize with gfa-fwd).
    pub graph: PathBuf,

    /// Reads to align: .fa/.fasta/.fna or .fq/.fastq.
    pub query: PathBuf,

    /// Directory for alignments.tsv; omitted, no output file is written.
    #[clap(short, long)]
    pub output_dir: Option<PathBuf>,

    #[clap(short, long, value_enum, default_value_t)]
    pub algorithm: Algorithm,

    /// Greedily extend along chains of unique exactly-matching reference
    /// edges.
    #[clap(long, action = clap::ArgAction::Set, default_value_t = true)]
    pub greedy_match: bool,

    /// Trie depth; defaults to log4 of the reference size.
    #[clap(short = 'D', long)]
    pub tree_depth: Option<I>,

    /// Use --tree-depth exactly instead of clamping it to the auto-sized
    /// depth.
    #[clap(long)]
    pub fixed_trie_depth: bool,

    #[clap(short, long, default_value_t = 1)]
    pub threads: usize,

    /// Abandon a read once the best f-value exceeds this cost.
    #[clap(long, default_value_t = Cost::INFINITY)]
    pub max_align_cost: Cost,

    /// Report up to this many co-optimal alignments per read.
    #[clap(long, default_value_t = 1)]
    pub k_best: usize,

    #[clap(flatten)]
    pub seeds: SeedsParams,

    #[clap(flatten)]
    pub prefix: PrefixParams,

    #[clap(flatten)]
    pub costs: CostArgs,

    /// Verbosity; repeat for more.
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Parser, Debug, Clone, Copy, Serialize, Deserialize)]
#[clap(next_help_heading = "Edit costs")]
pub struct CostArgs {
    #[clap(long = "match", default_value_t = 0.0)]
    pub match_cost: Cost,

    #[clap(long = "subst", default_value_t = 1.0)]
    pub subst_cost: Cost,

    #[clap(long = "ins", default_value_t = 5.0)]
    pub ins_cost: Cost,

    #[clap(long = "del", default_value_t = 5.0)]
    pub del_cost: Cost,
}

impl CostArgs {
    pub fn to_costs(&self) -> EditCosts {
        EditCosts::new(self.match_cost, self.subst_cost, self.ins_cost, self.del_cost)
    }
}

impl Cli {
    /// Trie depth for a reference of `ref_nodes` nodes: the explicit
    /// `--tree-depth` (clamped to the auto-sized depth unless
    /// `--fixed-trie-depth`), or the auto-sized depth.
    pub fn resolved_tree_depth(&self, ref_nodes: usize) -> I {
        let auto = (ref_nodes.max(2) as f64).log(4.0).ceil() as I;
        match self.tree_depth {
            Some(d) if self.fixed_trie_depth => d,
            Some(d) => d.min(auto),
            None => auto,
        }
    }
}
