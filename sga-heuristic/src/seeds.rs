use std::io::{self, Write};

use log::debug;
use sga_graph::Graph;
use sga_types::*;

use crate::{AstarHeuristic, SeedsParams};

/// Accumulated over all reads, for reporting.
#[derive(Debug, Default, Clone, Copy)]
struct SeedsTotals {
    reads: usize,
    seeds: usize,
    seed_matches: usize,
    paths_considered: usize,
    marked_states: usize,
    best_heuristic_sum: Cost,
}

/// Seed heuristic with a bounded per-seed error budget.
///
/// The read is cut into non-overlapping seeds of length `seed_len`, starting
/// from its right end. Each seed is matched approximately through the
/// trie+graph; for every occurrence, every node on a backward path from the
/// occurrence to the supersource gets the seed's bit in the per-error-level
/// mask `h_masks[errors][node]`. `h` then counts how many of the seeds still
/// ahead of a state are missing from the state's node and charges the
/// cheapest edit for each.
pub struct SeedsWithErrors<'g> {
    graph: &'g Graph,
    costs: EditCosts,
    params: SeedsParams,

    /// Current read; replaced by `before_every_alignment`.
    read: Read,
    /// `h_masks[e][v]` bit `p`: `v` lies on an admissible backward path for
    /// seed `p` matched with `e` errors.
    h_masks: Vec<Vec<u64>>,

    // Per-read counters.
    seeds: usize,
    seed_matches: usize,
    paths_considered: usize,
    marked_states: usize,

    totals: SeedsTotals,
}

impl<'g> SeedsWithErrors<'g> {
    pub fn new(graph: &'g Graph, costs: EditCosts, params: SeedsParams) -> Self {
        assert!(params.seed_len > 0);
        assert!(params.max_seed_errors >= 0);
        assert!(params.shifts_allowed >= 0);
        assert!(
            params.seed_len > graph.trie_depth(),
            "seed_len must exceed the trie depth"
        );
        let h_masks = vec![vec![0u64; graph.num_nodes()]; params.max_seed_errors as usize + 1];
        SeedsWithErrors {
            graph,
            costs,
            params,
            read: Read::default(),
            h_masks,
            seeds: 0,
            seed_matches: 0,
            paths_considered: 0,
            marked_states: 0,
            totals: SeedsTotals::default(),
        }
    }

    /// Cut the read into seeds from its right end and apply `dval` to the
    /// masks for every occurrence. Returns the number of seeds.
    fn gen_seeds_and_update(&mut self, dval: i32) -> usize {
        let l = self.params.seed_len;
        let mut seeds = 0;
        let mut start = self.read.len() - l;
        while start >= 0 {
            self.match_seed_and_update(seeds, start, start, 0, dval, self.params.max_seed_errors);
            seeds += 1;
            start -= l;
        }
        seeds
    }

    /// Match seed `p` (`read[start, start+seed_len)`) from the supersource
    /// through the trie and the reference, spending one error per edit edge.
    fn match_seed_and_update(
        &mut self,
        p: usize,
        start: I,
        i: I,
        v: Node,
        dval: i32,
        remaining_errors: i32,
    ) {
        if i < start + self.params.seed_len {
            let c = self.read.seq[i as usize];
            let g = self.graph;
            for e in g.matching_edges(v, c) {
                let i_next = if e.consumes() { i + 1 } else { i };
                let errors = remaining_errors - e.ty.is_edit() as i32;
                if errors >= 0 {
                    self.match_seed_and_update(p, start, i_next, e.to, dval, errors);
                }
            }
        } else {
            // An error-heavy walk can consume the whole seed without leaving
            // the trie; that is not an occurrence.
            if self.graph.node_in_trie(v) {
                return;
            }
            // An occurrence too close to the graph front has no backward
            // path of the required length; its marks are harmless (extra
            // bits only lower the bound).
            let errors = (self.params.max_seed_errors - remaining_errors) as usize;
            self.update_path_backwards(p, i, v, dval, self.params.shifts_allowed, errors);
            self.seed_matches += 1;
        }
    }

    /// Apply `dval` to bit `p` of `h_masks[errors]` for all nodes on
    /// backward paths from `(i, v)` to the supersource. A step from `v` back
    /// to `u` is allowed if `v` is already in the trie, or the walk is
    /// within `shifts_remaining` of the trie boundary, or it stays in the
    /// reference. Returns whether the supersource was reached at least once.
    fn update_path_backwards(
        &mut self,
        p: usize,
        i: I,
        v: Node,
        dval: i32,
        shifts_remaining: i32,
        errors: usize,
    ) -> bool {
        let bit = 1u64 << p;
        if dval > 0 {
            if self.h_masks[errors][v as usize] & bit == 0 {
                self.marked_states += 1;
                self.h_masks[errors][v as usize] |= bit;
            }
        } else {
            self.h_masks[errors][v as usize] &= !bit;
        }

        if v == 0 {
            self.paths_considered += 1;
            return true;
        }

        let g = self.graph;
        let trie_depth = g.trie_depth();
        let mut reached = false;
        for e in g.rev_base_edges(v) {
            if g.node_in_trie(v)
                || (i - 1 - trie_depth).abs() <= shifts_remaining
                || (i - 1 > trie_depth && !g.node_in_trie(e.to))
            {
                if self.update_path_backwards(p, i - 1, e.to, dval, shifts_remaining, errors) {
                    reached = true;
                }
            }
        }
        reached
    }
}

impl AstarHeuristic for SeedsWithErrors<'_> {
    fn before_every_alignment(&mut self, r: &Read) {
        self.totals.reads += 1;
        self.seed_matches = 0;
        self.paths_considered = 0;
        self.marked_states = 0;

        self.read = r.clone();
        assert!(
            self.read.len() / self.params.seed_len <= 64,
            "read too long for the seed bitmasks"
        );
        self.seeds = self.gen_seeds_and_update(1);

        self.totals.seeds += self.seeds;
        self.totals.seed_matches += self.seed_matches;
        self.totals.paths_considered += self.paths_considered;
        self.totals.marked_states += self.marked_states;
        let h0 = self.h(&State::new(0.0, 0, 0));
        self.totals.best_heuristic_sum += h0;

        debug!(
            "{}: {} seeds matching at {} graph positions, {} paths over {} states, h0={}",
            r.comment, self.seeds, self.seed_matches, self.paths_considered, self.marked_states, h0
        );
    }

    /// Count the whole seeds still ahead of `st`, credit each matched seed
    /// at its lowest error level only, and charge the cheapest edit per
    /// remaining error. O(max_seed_errors).
    fn h(&self, st: &State) -> Cost {
        let all_seeds_ahead = ((self.read.len() - st.i - 1) / self.params.seed_len).max(0) as i64;
        let e_max = self.params.max_seed_errors as i64;

        let mut errors_penalty = (e_max + 1) * all_seeds_ahead;
        let mut unused: u64 = (1u64 << all_seeds_ahead) - 1;
        for errors in 0..=e_max as usize {
            let matched_here = self.h_masks[errors][st.v as usize] & unused;
            let matched = matched_here.count_ones() as i64;
            debug_assert!(matched <= all_seeds_ahead);
            unused &= !matched_here;
            errors_penalty -= matched * (e_max + 1 - errors as i64);
        }
        debug_assert!(errors_penalty >= 0);
        errors_penalty as Cost * self.costs.min_mismatch_cost()
    }

    /// Revert the updates by re-applying them with `dval = -1`.
    fn after_every_alignment(&mut self) {
        self.gen_seeds_and_update(-1);
        #[cfg(debug_assertions)]
        for masks in &self.h_masks {
            debug_assert!(masks.iter().all(|&m| m == 0));
        }
    }

    fn print_params(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "     seed length: {} bp", self.params.seed_len)?;
        writeln!(out, " max seed errors: {}", self.params.max_seed_errors)?;
        writeln!(out, "  shifts allowed: {}", self.params.shifts_allowed)
    }

    fn print_stats(&self, out: &mut dyn Write) -> io::Result<()> {
        let t = &self.totals;
        let per_read = |x: usize| x as f64 / t.reads.max(1) as f64;
        writeln!(out, "Seed heuristic over {} reads:", t.reads)?;
        writeln!(out, "              seeds: {}", t.seeds)?;
        writeln!(
            out,
            "       seed matches: {} ({:.1} per read)",
            t.seed_matches,
            per_read(t.seed_matches)
        )?;
        writeln!(out, "   paths considered: {}", t.paths_considered)?;
        writeln!(out, " graph nodes marked: {}", t.marked_states)?;
        writeln!(
            out,
            "best heuristic (avg): {:.2}",
            t.best_heuristic_sum as f64 / t.reads.max(1) as f64
        )
    }
}
