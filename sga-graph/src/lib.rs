//! The immutable alignment graph: reference nodes with labeled `Orig` edges,
//! a prefix trie attached to the supersource, and on-the-fly synthesis of
//! edit (`Sub`/`Del`/`Ins`) edges during expansion.

mod gfa;
mod graph;
mod trie;

pub use gfa::{load_gfa, parse_gfa, GfaError};
pub use graph::{Graph, GraphBuilder};
