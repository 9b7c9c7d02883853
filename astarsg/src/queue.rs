use std::cmp::Ordering;
use std::collections::BinaryHeap;

use sga_types::{Cost, State};

/// Min-heap of `(f, state)` ordered by `f`; ties resolve in insertion order.
#[derive(Default)]
pub struct Queue {
    heap: BinaryHeap<QueueElement>,
    next_seq: u64,
}

impl Queue {
    pub fn push(&mut self, f: Cost, state: State) {
        debug_assert!(f.is_finite());
        self.heap.push(QueueElement {
            f,
            seq: self.next_seq,
            state,
        });
        self.next_seq += 1;
    }

    pub fn pop(&mut self) -> Option<(Cost, State)> {
        self.heap.pop().map(|e| (e.f, e.state))
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

struct QueueElement {
    f: Cost,
    seq: u64,
    state: State,
}

impl PartialEq for QueueElement {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueElement {}

impl PartialOrd for QueueElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueElement {
    // Inverted: BinaryHeap is a max-heap, the smallest f must surface first,
    // and among equal f the earliest insertion.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_by_f_then_insertion_order() {
        let mut q = Queue::default();
        q.push(2.0, State::new(2.0, 2, 2));
        q.push(1.0, State::new(1.0, 1, 1));
        q.push(1.0, State::new(1.0, 3, 3));
        q.push(0.5, State::new(0.5, 4, 4));

        let order: Vec<_> = std::iter::from_fn(|| q.pop()).map(|(_, s)| s.v).collect();
        assert_eq!(order, vec![4, 1, 3, 2]);
        assert!(q.is_empty());
    }
}
