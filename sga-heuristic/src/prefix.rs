use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};
use std::sync::Arc;

use log::info;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use sga_graph::Graph;
use sga_types::*;

use crate::{AstarHeuristic, PrefixParams};

const MEMO_SHARDS: usize = 16;

/// Concurrent memo of lookahead values, sharded by key. Writers and readers
/// take only the shard's lock, briefly; the table grows monotonically over a
/// program run.
struct PrefixMemo {
    shards: Vec<Mutex<FxHashMap<u64, Cost>>>,
    queries: AtomicUsize,
    misses: AtomicUsize,
}

impl PrefixMemo {
    fn new() -> Self {
        PrefixMemo {
            shards: (0..MEMO_SHARDS).map(|_| Mutex::default()).collect(),
            queries: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn shard(&self, key: u64) -> &Mutex<FxHashMap<u64, Cost>> {
        &self.shards[key as usize % MEMO_SHARDS]
    }

    fn get(&self, key: u64) -> Option<Cost> {
        self.shard(key).lock().get(&key).copied()
    }

    fn insert(&self, key: u64, value: Cost) {
        self.shard(key).lock().insert(key, value);
    }

    fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }
}

/// Graph-wide state of the prefix heuristic, shared between the per-thread
/// instances: hashing tables, vertex equivalence classes, and the memo.
pub struct PrefixShared<'g> {
    graph: &'g Graph,
    costs: EditCosts,
    params: PrefixParams,

    /// `prev_group_sum[l]`: number of strings strictly shorter than `l`.
    prev_group_sum: Vec<u64>,
    /// Exclusive upper bound of [`hash_str`]; class keys are multiples.
    k_max_str_hash: u64,

    vertex2class: Vec<u32>,
    class2repr: Vec<Node>,
    compressable_vertices: usize,

    memo: PrefixMemo,
}

impl<'g> PrefixShared<'g> {
    pub fn new(graph: &'g Graph, costs: EditCosts, params: PrefixParams) -> Arc<Self> {
        assert!(params.max_prefix_len > 0);
        assert!(params.max_prefix_cost >= 0.0);
        costs.validate();

        let mut prev_group_sum = vec![0u64];
        let mut four_power = 1u64;
        for _ in 1..=params.max_prefix_len {
            prev_group_sum.push(prev_group_sum.last().unwrap() + four_power);
            four_power <<= 2;
        }
        let k_max_str_hash = prev_group_sum.last().unwrap() + four_power;

        let (vertex2class, class2repr, compressable_vertices) = build_classes(graph, &params, &costs);
        info!(
            "prefix lookahead: len cap {}, cost cap {}, {} classes for {} nodes ({} compressible)",
            params.max_prefix_len,
            params.max_prefix_cost,
            class2repr.len(),
            graph.num_nodes(),
            compressable_vertices
        );

        Arc::new(PrefixShared {
            graph,
            costs,
            params,
            prev_group_sum,
            k_max_str_hash,
            vertex2class,
            class2repr,
            compressable_vertices,
            memo: PrefixMemo::new(),
        })
    }

    /// Base-4 value of `s` plus its length-group offset, in
    /// `[0, k_max_str_hash)`.
    fn hash_str(&self, s: &[u8]) -> u64 {
        let mut h = 0u64;
        for &c in s {
            h = (h << 2) + nucl_bits(c);
        }
        h + self.prev_group_sum[s.len()]
    }

    /// Minimum edit cost of consuming `w` along any path leaving `u`,
    /// clamped to the cost cap. Branches at or above the running best are
    /// pruned; edits keep every partial strictly increasing, so the DFS
    /// terminates on cyclic graphs.
    fn prefix_cost_dfs(&self, u: Node, w: &[u8], idx: usize, acc: Cost, best: &mut Cost) {
        if acc >= *best {
            return;
        }
        if idx == w.len() {
            *best = acc;
            return;
        }
        let c = w[idx];
        for e in self.graph.base_edges(u) {
            let along = if e.label == c {
                self.costs.match_cost
            } else {
                self.costs.subst_cost
            };
            self.prefix_cost_dfs(e.to, w, idx + 1, acc + along, best);
            self.prefix_cost_dfs(e.to, w, idx, acc + self.costs.del_cost, best);
        }
        self.prefix_cost_dfs(u, w, idx + 1, acc + self.costs.ins_cost, best);
    }

    fn lookahead(&self, v: Node, w: &[u8]) -> Cost {
        if w.is_empty() {
            return 0.0;
        }
        let cls = self.vertex2class[v as usize];
        let key = cls as u64 * self.k_max_str_hash + self.hash_str(w);

        self.memo.queries.fetch_add(1, Relaxed);
        if let Some(cost) = self.memo.get(key) {
            return cost;
        }
        self.memo.misses.fetch_add(1, Relaxed);

        let mut best = self.params.max_prefix_cost;
        self.prefix_cost_dfs(self.class2repr[cls as usize], w, 0, 0.0, &mut best);
        self.memo.insert(key, best);
        best
    }
}

/// When compression is on, nodes with identical unique `Orig`-path
/// spellings share a class evaluated at one representative; everything else
/// is a singleton class. Spellings are compared out to the deepest node the
/// bounded DFS can reach (deletions can push it past the window length), so
/// merged nodes answer every query identically.
fn build_classes(graph: &Graph, params: &PrefixParams, costs: &EditCosts) -> (Vec<u32>, Vec<Node>, usize) {
    let n = graph.num_nodes();
    let mut vertex2class = Vec::with_capacity(n);
    let mut class2repr = Vec::new();
    let mut compressable = 0;

    if !params.compress_vertices {
        for v in 0..n as Node {
            vertex2class.push(v);
            class2repr.push(v);
        }
        return (vertex2class, class2repr, 0);
    }

    let probe_len =
        params.max_prefix_len + (params.max_prefix_cost / costs.del_cost).ceil() as I;
    let mut by_spelling: FxHashMap<Vec<u8>, u32> = FxHashMap::default();
    for v in 0..n as Node {
        let cls = match linear_spelling(graph, v, probe_len) {
            Some(spelling) => match by_spelling.get(&spelling) {
                Some(&cls) => {
                    compressable += 1;
                    cls
                }
                None => {
                    let cls = class2repr.len() as u32;
                    by_spelling.insert(spelling, cls);
                    class2repr.push(v);
                    cls
                }
            },
            None => {
                let cls = class2repr.len() as u32;
                class2repr.push(v);
                cls
            }
        };
        vertex2class.push(cls);
    }
    (vertex2class, class2repr, compressable)
}

/// The spelling of the unique `Orig` path of length `len` leaving `v`, if
/// there is exactly one.
fn linear_spelling(graph: &Graph, v: Node, len: I) -> Option<Vec<u8>> {
    let mut u = v;
    let mut spelling = Vec::with_capacity(len as usize);
    for _ in 0..len {
        let e = graph.unique_orig_out_edge(u)?;
        spelling.push(e.label);
        u = e.to;
    }
    Some(spelling)
}

/// Memoized prefix-lookahead heuristic: `h(<i, v>)` is the minimum edit cost
/// between the upcoming read window and any path leaving `v`, capped at
/// `max_prefix_cost`.
pub struct PrefixLookahead<'g> {
    shared: Arc<PrefixShared<'g>>,
    read: Read,
}

impl<'g> PrefixLookahead<'g> {
    pub fn new(shared: Arc<PrefixShared<'g>>) -> Self {
        PrefixLookahead {
            shared,
            read: Read::default(),
        }
    }
}

impl AstarHeuristic for PrefixLookahead<'_> {
    fn before_every_alignment(&mut self, r: &Read) {
        self.read = r.clone();
    }

    fn h(&self, st: &State) -> Cost {
        let s = &self.shared;
        let end = (st.i + s.params.max_prefix_len).min(self.read.len());
        let w = &self.read.seq[st.i as usize..end as usize];
        s.lookahead(st.v, w)
    }

    fn after_every_alignment(&mut self) {}

    fn print_params(&self, out: &mut dyn Write) -> io::Result<()> {
        let s = &self.shared;
        writeln!(out, "                 cost cap: {}", s.params.max_prefix_cost)?;
        writeln!(out, " upcoming seq. length cap: {}", s.params.max_prefix_len)?;
        writeln!(
            out,
            "      node equiv. classes?: {}",
            s.params.compress_vertices
        )?;
        writeln!(
            out,
            "       compressible nodes: {} ({:.1}%)",
            s.compressable_vertices,
            100.0 * s.compressable_vertices as f64 / s.graph.num_nodes() as f64
        )
    }

    fn print_stats(&self, out: &mut dyn Write) -> io::Result<()> {
        let s = &self.shared;
        let queries = s.memo.queries.load(Relaxed);
        let misses = s.memo.misses.load(Relaxed);
        writeln!(out, "       memo entries: {}", s.memo.len())?;
        writeln!(
            out,
            "  memoization misses: {:.1}%",
            100.0 * misses as f64 / queries.max(1) as f64
        )
    }
}
