use std::collections::BTreeMap;

use log::debug;
use sga_types::*;

use crate::graph::GraphBuilder;

/// Attach a uniform-depth prefix trie to the supersource.
///
/// A trie node at depth `d` stands for the class of reference nodes that can
/// be entered by consuming `d` characters starting anywhere in the
/// reference. Intra-trie edges are labeled `Jump` edges; depth-`depth`
/// leaves hop into the reference with labeled `Jump` edges onto the
/// successors of their class.
///
/// With `depth == 0` the supersource itself is the single leaf, which links
/// it directly to every reference node.
pub(crate) fn add_trie(b: &mut GraphBuilder, depth: I) {
    assert!(depth >= 0);
    assert_eq!(b.trie_depth, 0, "trie already attached");
    assert!(
        b.out[0].is_empty(),
        "supersource already has explicit start edges"
    );

    let ref_nodes: Vec<Node> = (1..b.num_nodes() as Node).collect();

    // (trie node, reference nodes enterable by the next consumed character).
    let mut level: Vec<(Node, Vec<Node>)> = vec![(0, ref_nodes)];

    for _ in 0..depth {
        let mut next = Vec::new();
        for (t, enterable) in level {
            let mut by_label: BTreeMap<u8, Vec<Node>> = BTreeMap::new();
            for &w in &enterable {
                by_label.entry(b.labels[w as usize]).or_default().push(w);
            }
            for (label, entered) in by_label {
                let child = b.add_trie_node(label);
                b.add_edge(t, child, EdgeType::Jump);
                let mut succ: Vec<Node> = entered
                    .iter()
                    .flat_map(|&w| b.out[w as usize].iter().map(|e| e.to))
                    .collect();
                succ.sort_unstable();
                succ.dedup();
                next.push((child, succ));
            }
        }
        level = next;
    }

    // Leaves enter the reference.
    for (t, enterable) in level {
        for w in enterable {
            b.add_edge(t, w, EdgeType::Jump);
        }
    }

    b.trie_depth = depth;
    debug!(
        "trie of depth {depth}: {} nodes total",
        b.num_nodes()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::chain_nodes;

    fn builder_for(seq: &[u8]) -> GraphBuilder {
        let mut b = GraphBuilder::new();
        chain_nodes(&mut b, None, seq);
        b
    }

    #[test]
    fn depth_zero_links_supersource_everywhere() {
        let mut b = builder_for(b"ACGT");
        b.add_trie(0);
        let g = b.finish();
        assert_eq!(g.trie_depth(), 0);
        // One Jump edge from the supersource per reference node.
        let targets: Vec<Node> = g.base_edges(0).iter().map(|e| e.to).collect();
        assert_eq!(targets, vec![1, 2, 3, 4]);
        assert!(g.base_edges(0).iter().all(|e| e.ty == EdgeType::Jump));
        assert!((0..g.num_nodes()).all(|v| !g.node_in_trie(v as Node)));
    }

    #[test]
    fn uniform_depth_and_leaf_hops() {
        // ACAC: depth-1 trie nodes for 'A' and 'C'.
        let mut b = builder_for(b"ACAC");
        b.add_trie(1);
        let g = b.finish();
        assert_eq!(g.trie_depth(), 1);

        let roots = g.base_edges(0);
        assert_eq!(roots.len(), 2);
        assert!(roots.iter().all(|e| g.node_in_trie(e.to)));
        let a_leaf = roots.iter().find(|e| e.label == b'A').unwrap().to;
        let c_leaf = roots.iter().find(|e| e.label == b'C').unwrap().to;

        // After consuming 'A' (positions 1 and 3), the next character can
        // enter node 2 or node 4; both are 'C'.
        let hops: Vec<Node> = g.base_edges(a_leaf).iter().map(|e| e.to).collect();
        assert_eq!(hops, vec![2, 4]);
        assert!(g.base_edges(a_leaf).iter().all(|e| !g.node_in_trie(e.to)));

        // After consuming 'C' (positions 2 and 4), only node 3 follows.
        let hops: Vec<Node> = g.base_edges(c_leaf).iter().map(|e| e.to).collect();
        assert_eq!(hops, vec![3]);
    }

    #[test]
    fn trie_nodes_have_no_orig_out_edges() {
        let mut b = builder_for(b"ACGTACGT");
        b.add_trie(2);
        let g = b.finish();
        for v in 0..g.num_nodes() as Node {
            if g.node_in_trie(v) {
                assert!(g
                    .base_edges(v)
                    .iter()
                    .all(|e| e.ty == EdgeType::Jump));
            }
        }
    }
}
