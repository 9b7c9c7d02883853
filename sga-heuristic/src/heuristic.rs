use std::io::{self, Write};

use sga_types::*;

/// A per-read lower bound on the remaining alignment cost. The aligner holds
/// one of these as a trait object and drives the per-read lifecycle around
/// each `readmap`.
pub trait AstarHeuristic {
    /// Set the current read and build per-read state.
    fn before_every_alignment(&mut self, r: &Read);

    /// Admissible lower bound on the cost of completing the alignment from
    /// `st`. Must be `0` at `st.i == read_len`.
    fn h(&self, st: &State) -> Cost;

    /// Restore invariants so the next read starts clean.
    fn after_every_alignment(&mut self);

    fn print_params(&self, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }

    fn print_stats(&self, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }
}

/// The zero heuristic; turns the search into Dijkstra.
pub struct NoCost;

impl AstarHeuristic for NoCost {
    fn before_every_alignment(&mut self, _r: &Read) {}

    fn h(&self, _st: &State) -> Cost {
        0.0
    }

    fn after_every_alignment(&mut self) {}
}
