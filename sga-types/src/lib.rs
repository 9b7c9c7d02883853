//! Shared types for sequence-to-graph alignment: costs, nodes, edges,
//! search states and reads.

use serde::{Deserialize, Serialize};

/// Cost of a (partial) alignment. Real-valued; compare with [`approx_eq`].
pub type Cost = f32;

pub const INF: Cost = Cost::INFINITY;

/// Position in a read.
pub type I = i32;

/// Graph node id. Node `0` is the supersource.
pub type Node = u32;

/// Label of an edge that does not consume a read character.
pub const EPS: u8 = 0;

/// Absolute tolerance for cost equality. All components must use the same
/// tolerance or co-optimal alignments are missed.
pub const COST_EPS: Cost = 1e-4;

#[inline]
pub fn approx_eq(a: Cost, b: Cost) -> bool {
    (a - b).abs() < COST_EPS
}

#[inline]
pub fn is_nucl(c: u8) -> bool {
    matches!(c, b'A' | b'C' | b'G' | b'T')
}

/// Two-bit encoding: A=00, C=01, T=10, G=11.
#[inline]
pub fn nucl_bits(c: u8) -> u64 {
    debug_assert!(is_nucl(c));
    ((c >> 1) & 0b11) as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    /// Reference edge bearing the label of its head node.
    Orig,
    /// Consume one read character without moving in the graph.
    Ins,
    /// Move in the graph without consuming a read character; label `EPS`.
    Del,
    /// Move along a reference edge while consuming a different character.
    Sub,
    /// Trie transition: within the trie, or from a trie leaf into the
    /// reference.
    Jump,
}

impl EdgeType {
    /// Whether taking an edge of this type counts as an edit when matching
    /// seeds approximately.
    #[inline]
    pub fn is_edit(&self) -> bool {
        !matches!(self, EdgeType::Orig | EdgeType::Jump)
    }
}

/// A directed edge of the alignment graph. Stored edges are `Orig`/`Jump`;
/// `Sub`/`Del`/`Ins` variants are synthesized during expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub to: Node,
    pub label: u8,
    pub ty: EdgeType,
}

impl Edge {
    /// Whether traversing this edge consumes a read character.
    #[inline]
    pub fn consumes(&self) -> bool {
        self.label != EPS
    }
}

/// A state of the product graph: the first `i` read characters have been
/// aligned along a path ending at `v`, at the given cost. `prev` is the
/// predecessor state used for traceback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub cost: Cost,
    pub i: I,
    pub v: Node,
    pub prev: Option<(I, Node)>,
}

impl State {
    pub fn new(cost: Cost, i: I, v: Node) -> Self {
        State {
            cost,
            i,
            v,
            prev: None,
        }
    }

    pub fn with_prev(cost: Cost, i: I, v: Node, prev_i: I, prev_v: Node) -> Self {
        State {
            cost,
            i,
            v,
            prev: Some((prev_i, prev_v)),
        }
    }
}

/// A sequencing read over `{A,C,G,T}`.
#[derive(Debug, Clone, Default)]
pub struct Read {
    pub comment: String,
    pub seq: Vec<u8>,
}

impl Read {
    pub fn new(comment: impl Into<String>, seq: impl Into<Vec<u8>>) -> Self {
        let read = Read {
            comment: comment.into(),
            seq: seq.into(),
        };
        debug_assert!(read.seq.iter().all(|&c| is_nucl(c)));
        read
    }

    #[inline]
    pub fn len(&self) -> I {
        self.seq.len() as I
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// Edit costs per edge type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditCosts {
    pub match_cost: Cost,
    pub subst_cost: Cost,
    pub ins_cost: Cost,
    pub del_cost: Cost,
}

impl Default for EditCosts {
    fn default() -> Self {
        EditCosts {
            match_cost: 0.0,
            subst_cost: 1.0,
            ins_cost: 5.0,
            del_cost: 5.0,
        }
    }
}

impl EditCosts {
    pub fn new(match_cost: Cost, subst_cost: Cost, ins_cost: Cost, del_cost: Cost) -> Self {
        let costs = EditCosts {
            match_cost,
            subst_cost,
            ins_cost,
            del_cost,
        };
        costs.validate();
        costs
    }

    /// Levenshtein costs.
    pub fn unit() -> Self {
        EditCosts::new(0.0, 1.0, 1.0, 1.0)
    }

    /// Edit costs must be non-negative, and edits strictly positive so that
    /// bounded searches terminate.
    pub fn validate(&self) {
        assert!(self.match_cost >= 0.0);
        assert!(self.subst_cost > 0.0);
        assert!(self.ins_cost > 0.0);
        assert!(self.del_cost > 0.0);
    }

    #[inline]
    pub fn edge_cost(&self, ty: EdgeType) -> Cost {
        match ty {
            EdgeType::Orig | EdgeType::Jump => self.match_cost,
            EdgeType::Sub => self.subst_cost,
            EdgeType::Ins => self.ins_cost,
            EdgeType::Del => self.del_cost,
        }
    }

    /// The cheapest way to pay for one edit; scales the seed heuristic.
    #[inline]
    pub fn min_mismatch_cost(&self) -> Cost {
        self.subst_cost.min(self.ins_cost).min(self.del_cost)
    }
}
