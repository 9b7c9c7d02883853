//! End-to-end tests of the aligner: hand-built scenario graphs plus seeded
//! random inputs checked against a brute-force DP oracle.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sga_graph::{Graph, GraphBuilder};
use sga_heuristic::*;
use sga_types::*;

use crate::{Aligner, AlignParams, Outcome};

const NUCLS: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Supersource chained directly into a linear reference; alignments start at
/// the first character.
fn anchored_graph(reference: &[u8]) -> Graph {
    let mut b = GraphBuilder::new();
    let mut prev = 0;
    for &c in reference {
        let v = b.add_node(c);
        b.add_edge(prev, v, EdgeType::Orig);
        prev = v;
    }
    b.finish()
}

/// Linear reference with a prefix trie; alignments may start anywhere.
fn trie_graph(reference: &[u8], depth: I) -> Graph {
    let mut b = GraphBuilder::new();
    let mut prev = None;
    for &c in reference {
        let v = b.add_node(c);
        if let Some(u) = prev {
            b.add_edge(u, v, EdgeType::Orig);
        }
        prev = Some(v);
    }
    b.add_trie(depth);
    b.finish()
}

fn align(
    graph: &Graph,
    h: &mut dyn AstarHeuristic,
    params: AlignParams,
    read: &[u8],
    k_best: usize,
) -> crate::Alignment {
    let mut aligner = Aligner::new(graph, params, h);
    aligner.readmap(&Read::new("test", read.to_vec()), k_best)
}

fn unit_params() -> AlignParams {
    AlignParams {
        costs: EditCosts::unit(),
        ..AlignParams::default()
    }
}

/// Minimum edit cost of aligning `read` against a prefix-anchored or
/// free-floating window of a linear reference, with a free end. The
/// independent oracle for the A\* results.
fn oracle_cost(reference: &[u8], read: &[u8], costs: &EditCosts, free_start: bool) -> Cost {
    let n = reference.len();
    let m = read.len();
    let mut prev: Vec<Cost> = (0..=n)
        .map(|j| if free_start { 0.0 } else { j as Cost * costs.del_cost })
        .collect();
    for i in 1..=m {
        let mut row = vec![INF; n + 1];
        row[0] = prev[0] + costs.ins_cost;
        for j in 1..=n {
            let along = if read[i - 1] == reference[j - 1] {
                costs.match_cost
            } else {
                costs.subst_cost
            };
            row[j] = (prev[j - 1] + along)
                .min(prev[j] + costs.ins_cost)
                .min(row[j - 1] + costs.del_cost);
        }
        prev = row;
    }
    prev.into_iter().fold(INF, Cost::min)
}

#[test]
fn linear_graph_exact_match() {
    let g = anchored_graph(b"ACGT");
    let a = align(&g, &mut NoCost, unit_params(), b"ACGT", 1);
    assert_eq!(a.cost(), Some(0.0));
    assert_eq!(a.outcome, Outcome::Unique);
    assert_eq!(a.path_nodes(), vec![1, 2, 3, 4]);
}

#[test]
fn one_substitution() {
    let g = anchored_graph(b"ACGT");
    let a = align(&g, &mut NoCost, unit_params(), b"AGGT", 1);
    assert_eq!(a.cost(), Some(1.0));
    assert_eq!(a.outcome, Outcome::Unique);
    assert_eq!(a.path_nodes(), vec![1, 2, 3, 4]);
    assert_eq!(a.edge_path[1].ty, EdgeType::Sub);
}

#[test]
fn insertion_in_read() {
    let g = anchored_graph(b"ACGT");
    let a = align(&g, &mut NoCost, unit_params(), b"ACAGT", 1);
    assert_eq!(a.cost(), Some(1.0));
    assert_eq!(a.outcome, Outcome::Unique);
    assert!(a.edge_path.iter().any(|e| e.ty == EdgeType::Ins));
}

#[test]
fn branching_graph_is_ambiguous() {
    // The supersource branches into two chains both spelling ACGT.
    let mut b = GraphBuilder::new();
    for _ in 0..2 {
        let mut prev = 0;
        for &c in b"ACGT" {
            let v = b.add_node(c);
            b.add_edge(prev, v, EdgeType::Orig);
            prev = v;
        }
    }
    let g = b.finish();

    let a = align(&g, &mut NoCost, unit_params(), b"ACGT", 2);
    assert_eq!(a.cost(), Some(0.0));
    assert_eq!(a.outcome, Outcome::Ambiguous);
    assert!(a.final_states.len() >= 2);
}

#[test]
fn cost_cap_gives_empty_result() {
    let g = anchored_graph(b"AAAA");
    let params = AlignParams {
        costs: EditCosts::unit(),
        max_align_cost: 2.0,
        ..AlignParams::default()
    };
    let mut h = NoCost;
    let mut aligner = Aligner::new(&g, params, &mut h);
    let a = aligner.readmap(&Read::new("capped", b"CCCC".to_vec()), 1);
    assert!(a.final_states.is_empty());
    assert_eq!(a.outcome, Outcome::Ambiguous);
    assert_eq!(aligner.stats.align_status.ambiguous, 1);
    assert_eq!(aligner.stats.align_status.cost, 0.0);
}

#[test]
fn seed_heuristic_full_read() {
    let reference = b"ACGTTGCAGTAC";
    let g = trie_graph(reference, 2);
    let mut h = SeedsWithErrors::new(
        &g,
        EditCosts::unit(),
        SeedsParams {
            seed_len: 4,
            max_seed_errors: 0,
            shifts_allowed: 0,
        },
    );
    let a = align(&g, &mut h, unit_params(), reference, 1);
    assert_eq!(a.cost(), Some(0.0));
}

#[test]
fn repeated_runs_are_deterministic() {
    let reference = b"ACGTTGCAGTACGGAT";
    let g = trie_graph(reference, 2);
    let mut h = SeedsWithErrors::new(
        &g,
        EditCosts::unit(),
        SeedsParams {
            seed_len: 4,
            max_seed_errors: 0,
            shifts_allowed: 0,
        },
    );
    let mut aligner = Aligner::new(&g, unit_params(), &mut h);
    let read = Read::new("twice", b"TTGCAGTACGGA".to_vec());
    let first = aligner.readmap(&read, 1);
    let second = aligner.readmap(&read, 1);
    assert_eq!(first.cost(), second.cost());
    assert_eq!(first.path_nodes(), second.path_nodes());
}

#[test]
fn greedy_match_does_not_change_the_optimum() {
    let mut rng = ChaCha8Rng::seed_from_u64(31415);
    for _ in 0..20 {
        let reference: Vec<u8> = (0..40).map(|_| NUCLS[rng.gen_range(0..4)]).collect();
        let read = mutate(&reference[5..25], &mut rng, 3);
        let g = anchored_graph(&reference);

        let with = align(&g, &mut NoCost, unit_params(), &read, 1);
        let without = align(
            &g,
            &mut NoCost,
            AlignParams {
                costs: EditCosts::unit(),
                greedy_match: false,
                ..AlignParams::default()
            },
            &read,
            1,
        );
        assert_eq!(with.cost(), without.cost());
    }
}

/// Copy `seq` with up to `edits` random substitutions/insertions/deletions.
fn mutate(seq: &[u8], rng: &mut ChaCha8Rng, edits: usize) -> Vec<u8> {
    let mut out = seq.to_vec();
    for _ in 0..rng.gen_range(0..=edits) {
        if out.is_empty() {
            break;
        }
        let pos = rng.gen_range(0..out.len());
        match rng.gen_range(0..3) {
            0 => out[pos] = NUCLS[rng.gen_range(0..4)],
            1 => out.insert(pos, NUCLS[rng.gen_range(0..4)]),
            _ => {
                out.remove(pos);
            }
        }
    }
    out
}

/// Copy `seq` with up to `edits` random substitutions. The seed heuristic
/// assumes substitution-dominated reads (its backward paths pair read
/// positions with graph distances one to one), so its oracle comparison
/// uses this instead of [`mutate`].
fn mutate_subs(seq: &[u8], rng: &mut ChaCha8Rng, edits: usize) -> Vec<u8> {
    let mut out = seq.to_vec();
    for _ in 0..rng.gen_range(0..=edits) {
        let pos = rng.gen_range(0..out.len());
        out[pos] = NUCLS[rng.gen_range(0..4)];
    }
    out
}

#[test]
fn dijkstra_matches_oracle_on_anchored_graphs() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for case in 0..30 {
        let n = rng.gen_range(10..50);
        let reference: Vec<u8> = (0..n).map(|_| NUCLS[rng.gen_range(0..4)]).collect();
        let m = rng.gen_range(1..n);
        let read = mutate(&reference[..m], &mut rng, 3);
        if read.is_empty() {
            continue;
        }
        let g = anchored_graph(&reference);
        let a = align(&g, &mut NoCost, unit_params(), &read, 1);
        let expected = oracle_cost(&reference, &read, &EditCosts::unit(), false);
        assert_eq!(a.cost(), Some(expected), "case {case}: read {:?}", String::from_utf8_lossy(&read));
    }
}

#[test]
fn seed_heuristic_matches_oracle_on_trie_graphs() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for case in 0..20 {
        let n = rng.gen_range(20..60);
        let reference: Vec<u8> = (0..n).map(|_| NUCLS[rng.gen_range(0..4)]).collect();
        let start = rng.gen_range(0..n - 12);
        let read = mutate_subs(&reference[start..start + 12], &mut rng, 1);
        let g = trie_graph(&reference, 2);
        let mut h = SeedsWithErrors::new(
            &g,
            EditCosts::unit(),
            SeedsParams {
                seed_len: 4,
                max_seed_errors: 0,
                shifts_allowed: 0,
            },
        );
        let a = align(&g, &mut h, unit_params(), &read, 1);
        let expected = oracle_cost(&reference, &read, &EditCosts::unit(), true);
        assert_eq!(a.cost(), Some(expected), "case {case}: read {:?}", String::from_utf8_lossy(&read));
    }
}

#[test]
fn prefix_heuristic_matches_oracle_on_trie_graphs() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    for compress in [false, true] {
        for case in 0..15 {
            let n = rng.gen_range(20..60);
            let reference: Vec<u8> = (0..n).map(|_| NUCLS[rng.gen_range(0..4)]).collect();
            let start = rng.gen_range(0..n - 10);
            let read = mutate(&reference[start..start + 10], &mut rng, 2);
            if read.len() < 6 {
                continue;
            }
            let g = trie_graph(&reference, 2);
            let shared = PrefixShared::new(
                &g,
                EditCosts::unit(),
                PrefixParams {
                    max_prefix_len: 4,
                    max_prefix_cost: 5.0,
                    compress_vertices: compress,
                },
            );
            let mut h = PrefixLookahead::new(shared);
            let a = align(&g, &mut h, unit_params(), &read, 1);
            let expected = oracle_cost(&reference, &read, &EditCosts::unit(), true);
            assert_eq!(
                a.cost(),
                Some(expected),
                "case {case} compress {compress}: read {:?}",
                String::from_utf8_lossy(&read)
            );
        }
    }
}

#[test]
fn insertions_continue_past_a_dead_end() {
    // A single-node graph; the read continues past the end of the reference
    // and must be consumed by insertions.
    let mut b = GraphBuilder::new();
    let v = b.add_node(b'A');
    b.add_edge(0, v, EdgeType::Orig);
    let g = b.finish();
    let a = align(&g, &mut NoCost, unit_params(), b"AAAA", 1);
    assert_eq!(a.cost(), Some(3.0));
    assert_eq!(a.outcome, Outcome::Unique);
}

#[test]
fn non_unit_costs_are_respected() {
    let costs = EditCosts::new(0.0, 2.0, 3.0, 3.0);
    let g = anchored_graph(b"ACGT");
    let params = AlignParams {
        costs,
        ..AlignParams::default()
    };
    let a = align(&g, &mut NoCost, params, b"AGGT", 1);
    assert_eq!(a.cost(), Some(2.0));

    let mut rng = ChaCha8Rng::seed_from_u64(5);
    for _ in 0..10 {
        let reference: Vec<u8> = (0..30).map(|_| NUCLS[rng.gen_range(0..4)]).collect();
        let read = mutate(&reference[..15], &mut rng, 2);
        if read.is_empty() {
            continue;
        }
        let a = align(&g_ref(&reference), &mut NoCost, params, &read, 1);
        assert_eq!(a.cost(), Some(oracle_cost(&reference, &read, &costs, false)));
    }
}

fn g_ref(reference: &[u8]) -> Graph {
    anchored_graph(reference)
}
