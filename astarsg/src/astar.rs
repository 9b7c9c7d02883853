use std::collections::hash_map::Entry;
use std::time::Instant;

use log::{debug, trace};
use rustc_hash::FxHashMap as HashMap;
use sga_graph::Graph;
use sga_heuristic::AstarHeuristic;
use sga_types::*;

use crate::queue::Queue;
use crate::stats::AlignStats;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignParams {
    pub costs: EditCosts,
    /// Skip the queue along chains of unique exactly-matching reference
    /// edges.
    pub greedy_match: bool,
    /// Abandon the search once the best f-value exceeds this cost.
    pub max_align_cost: Cost,
}

impl Default for AlignParams {
    fn default() -> Self {
        AlignParams {
            costs: EditCosts::default(),
            greedy_match: true,
            max_align_cost: INF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unique,
    Ambiguous,
    NoAlignment,
}

/// Result of aligning one read: up to `k_best` co-optimal final states and
/// the edge path of the best one, from the supersource to the read end.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub final_states: Vec<State>,
    pub edge_path: Vec<Edge>,
    pub outcome: Outcome,
}

impl Alignment {
    pub fn cost(&self) -> Option<Cost> {
        self.final_states.first().map(|s| s.cost)
    }

    /// The nodes visited by the best alignment, in order.
    pub fn path_nodes(&self) -> Vec<Node> {
        self.edge_path.iter().map(|e| e.to).collect()
    }
}

/// Best known path to `<i, v>`; `optimize` gates both map updates and queue
/// insertion.
type PathMap = HashMap<(I, Node), State>;
/// Incoming edge chosen when the path store was last improved.
type PrevEdgeMap = HashMap<(I, Node), Edge>;

fn optimize(p: &mut PathMap, s: State) -> bool {
    match p.entry((s.i, s.v)) {
        Entry::Occupied(mut e) => {
            if s.cost < e.get().cost {
                e.insert(s);
                true
            } else {
                false
            }
        }
        Entry::Vacant(e) => {
            e.insert(s);
            true
        }
    }
}

/// A\* search over the product of the graph and a read. Holds non-owning
/// references to the graph and the heuristic; all per-read state lives
/// inside `readmap`.
pub struct Aligner<'a> {
    graph: &'a Graph,
    params: AlignParams,
    heuristic: &'a mut dyn AstarHeuristic,
    pub stats: AlignStats,
}

impl<'a> Aligner<'a> {
    pub fn new(graph: &'a Graph, params: AlignParams, heuristic: &'a mut dyn AstarHeuristic) -> Self {
        params.costs.validate();
        Aligner {
            graph,
            params,
            heuristic,
            stats: AlignStats::default(),
        }
    }

    /// Align `r` from the supersource to its end, returning up to `k_best`
    /// co-optimal final states. Fails softly (empty result) when no path
    /// exists or the cost cap is exceeded first.
    pub fn readmap(&mut self, r: &Read, k_best: usize) -> Alignment {
        debug!("aligning read {}: {} of length {}", r.comment, String::from_utf8_lossy(&r.seq), r.len());
        assert!(k_best >= 1);
        assert!(!r.is_empty(), "cannot align an empty read");
        assert!(r.seq.iter().all(|&c| is_nucl(c)), "read contains non-ACGT characters");
        assert!(self.graph.has_supersource(), "graph has no supersource");

        let t_total = Instant::now();
        self.stats.reads += 1;
        self.heuristic.before_every_alignment(r);

        let mut p = PathMap::default();
        let mut pe = PrevEdgeMap::default();
        // g-value at the last expansion of each state.
        let mut vis: HashMap<(I, Node), Cost> = HashMap::default();
        let mut queue = Queue::default();
        let mut final_states: Vec<State> = Vec::new();
        let mut capped = false;

        {
            let start = State::new(0.0, 0, 0);
            queue.push(0.0, start);
            optimize(&mut p, start);
        }

        while let Some((f_curr, mut curr)) = queue.pop() {
            if self.graph.node_in_trie(curr.v) {
                self.stats.popped_trie += 1;
            } else {
                self.stats.popped_ref += 1;
            }

            if f_curr > self.params.max_align_cost {
                self.stats.align_status.ambiguous += 1;
                capped = true;
                break;
            }

            // Duplicate suppression. A state is re-expanded only when a
            // strictly better path to it appeared after its last expansion,
            // which requires a locally inconsistent heuristic (seed changes
            // near the trie boundary, prefix-class boundaries).
            let best = p[&(curr.i, curr.v)];
            match vis.entry((curr.i, curr.v)) {
                Entry::Occupied(mut expanded_g) => {
                    self.stats.repeated_visits += 1;
                    if best.cost < *expanded_g.get() {
                        expanded_g.insert(best.cost);
                    } else {
                        continue;
                    }
                }
                Entry::Vacant(e) => {
                    e.insert(best.cost);
                }
            }
            // The queue entry may be stale; continue from the best known
            // path to this state.
            curr = best;

            debug_assert!(curr.i <= r.len());
            if let Some(first) = final_states.first() {
                if !approx_eq(first.cost, curr.cost) {
                    break;
                }
            }
            if curr.i == r.len() {
                let final_state = p[&(curr.i, curr.v)];
                trace!(
                    "target reached at <{}, {}> with cost {}",
                    final_state.i,
                    final_state.v,
                    final_state.cost
                );
                final_states.push(final_state);
                if final_states.len() >= k_best {
                    break;
                } else {
                    continue;
                }
            }

            // Lazy DP: skip deterministic exact matches without the queue.
            if self.params.greedy_match {
                curr = self.proceed_identity(&mut p, &mut pe, curr, r);
            }

            let g = self.graph;
            let c = r.seq[curr.i as usize];
            for e in g.matching_edges(curr.v, c) {
                self.try_edge(&curr, &mut p, &mut pe, &mut queue, e);
            }
        }

        let outcome = if let Some(best) = final_states.first() {
            self.stats.align_status.cost += best.cost;
            if final_states.len() > 1 {
                self.stats.align_status.ambiguous += 1;
                Outcome::Ambiguous
            } else {
                self.stats.align_status.unique += 1;
                Outcome::Unique
            }
        } else if capped {
            // Cost recorded as 0 for the cap case.
            Outcome::Ambiguous
        } else {
            self.stats.align_status.no_alignment += 1;
            Outcome::NoAlignment
        };

        let edge_path = match final_states.first() {
            Some(best) => self.traceback(&p, &pe, best),
            None => vec![],
        };

        self.heuristic.after_every_alignment();
        self.stats.timing.total += t_total.elapsed().as_secs_f32();

        debug!(
            "{}: {} best alignments, outcome {:?}",
            r.comment,
            final_states.len(),
            outcome
        );
        Alignment {
            final_states,
            edge_path,
            outcome,
        }
    }

    /// Relax `curr --e--> next`: push iff a strictly better path cost was
    /// found, with `f = g + h`.
    fn try_edge(
        &mut self,
        curr: &State,
        p: &mut PathMap,
        pe: &mut PrevEdgeMap,
        queue: &mut Queue,
        e: Edge,
    ) {
        let edge_cost = self.params.costs.edge_cost(e.ty);

        // Insertions and deletions move zero or one positions in the read.
        let i_next = if e.consumes() { curr.i + 1 } else { curr.i };
        let g = p[&(curr.i, curr.v)].cost + edge_cost;
        debug_assert!(g >= 0.0 && g < INF);

        let next = State::with_prev(g, i_next, e.to, curr.i, curr.v);
        if optimize(p, next) {
            pe.insert((i_next, e.to), e);

            let t_h = Instant::now();
            let h = self.heuristic.h(&next);
            self.stats.timing.astar += t_h.elapsed().as_secs_f32();

            trace!(
                "from ({}, {}) push ({}, {}) with f=g+h = {} + {}",
                curr.i,
                curr.v,
                next.i,
                next.v,
                g,
                h
            );
            queue.push(g + h, next);
            self.stats.explored_states += 1;
        }
    }

    /// Greedy fast-forward along unique exactly-matching reference edges.
    /// The last read character is left to the regular expansion so that
    /// final states always come off the queue.
    fn proceed_identity(
        &mut self,
        p: &mut PathMap,
        pe: &mut PrevEdgeMap,
        mut curr: State,
        r: &Read,
    ) -> State {
        let t_ff = Instant::now();
        let g = self.graph;
        while let Some(e) = g.unique_orig_out_edge(curr.v) {
            if curr.i >= r.len() - 1 || e.label != r.seq[curr.i as usize] {
                break;
            }
            self.stats.greedy_matched += 1;
            let next = State::with_prev(
                curr.cost + self.params.costs.edge_cost(e.ty),
                curr.i + 1,
                e.to,
                curr.i,
                curr.v,
            );
            if optimize(p, next) {
                pe.insert((next.i, next.v), e);
            } else {
                self.stats.timing.ff += t_ff.elapsed().as_secs_f32();
                return curr;
            }
            curr = next;
            self.stats.explored_states += 1;
        }
        self.stats.timing.ff += t_ff.elapsed().as_secs_f32();
        curr
    }

    /// Walk the prev-edge store from `final_state` back to the supersource.
    fn traceback(&self, p: &PathMap, pe: &PrevEdgeMap, final_state: &State) -> Vec<Edge> {
        let mut path = Vec::new();
        let mut key = (final_state.i, final_state.v);
        while key != (0, 0) {
            let e = pe[&key];
            path.push(e);
            key = p[&key].prev.expect("traceback fell off the path store");
        }
        path.reverse();
        debug_assert!(approx_eq(
            path.iter()
                .map(|e| self.params.costs.edge_cost(e.ty))
                .sum::<Cost>(),
            final_state.cost
        ));
        path
    }
}
