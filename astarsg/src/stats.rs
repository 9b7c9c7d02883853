use std::io::{self, Write};

use derive_more::AddAssign;
use sga_types::Cost;

#[derive(Debug, Default, Clone, Copy, AddAssign)]
pub struct Timing {
    /// Whole `readmap` calls.
    pub total: f32,
    /// Heuristic queries during the search.
    pub astar: f32,
    /// Greedy fast-forward.
    pub ff: f32,
}

#[derive(Debug, Default, Clone, Copy, AddAssign)]
pub struct AlignStatus {
    pub unique: usize,
    pub ambiguous: usize,
    pub no_alignment: usize,
    /// Summed optimal cost over aligned reads; `0` contributed when the cost
    /// cap was hit.
    pub cost: Cost,
}

/// Counters observed by callers, aggregated over reads (and threads) with
/// `+=`.
#[derive(Debug, Default, Clone, Copy, AddAssign)]
pub struct AlignStats {
    pub reads: usize,
    /// States pushed to the queue or skipped through greedily.
    pub explored_states: usize,
    pub popped_trie: usize,
    pub popped_ref: usize,
    /// Pops suppressed by the visited mask.
    pub repeated_visits: usize,
    /// Characters matched by greedy fast-forward.
    pub greedy_matched: usize,
    pub align_status: AlignStatus,
    pub timing: Timing,
}

impl AlignStats {
    pub fn print(&self, out: &mut dyn Write) -> io::Result<()> {
        let s = &self.align_status;
        writeln!(out, "            reads: {}", self.reads)?;
        writeln!(
            out,
            "          aligned: {} unique, {} ambiguous, {} without alignment",
            s.unique, s.ambiguous, s.no_alignment
        )?;
        let aligned = (s.unique + s.ambiguous).max(1);
        writeln!(out, "   avg. best cost: {:.3}", s.cost / aligned as Cost)?;
        writeln!(out, "  explored states: {}", self.explored_states)?;
        writeln!(
            out,
            "           popped: {} in trie, {} in reference",
            self.popped_trie, self.popped_ref
        )?;
        writeln!(out, "  repeated visits: {}", self.repeated_visits)?;
        writeln!(out, "   greedy matched: {}", self.greedy_matched)?;
        writeln!(
            out,
            "             time: {:.3}s total, {:.3}s heuristic, {:.3}s fast-forward",
            self.timing.total, self.timing.astar, self.timing.ff
        )
    }
}
