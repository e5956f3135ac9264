/// Fixed-size binary min-heap over records ordered by an extracted key.
///
/// Unlike `std::collections::BinaryHeap` the heap never grows or shrinks after
/// [`MinHeap::build`]: the merge keeps one record per run for its whole
/// lifetime and only ever replaces the root. Children of node `i` live at
/// `2i + 1` and `2i + 2`.
pub struct MinHeap<T, K, F>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    nodes: Vec<T>,
    key: F,
}

impl<T, K, F> MinHeap<T, K, F>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    /// Heapify `nodes` bottom-up in O(n).
    pub fn build(nodes: Vec<T>, key: F) -> Self {
        let mut heap = Self { nodes, key };
        for index in (0..heap.nodes.len() / 2).rev() {
            heap.sift_down(index);
        }
        heap
    }

    /// Record with the smallest key.
    pub fn peek(&self) -> Option<&T> {
        self.nodes.first()
    }

    /// Overwrite the root with `record` and restore the heap order.
    ///
    /// Returns the record that was at the root. On an empty heap the record is
    /// handed back unchanged.
    pub fn replace_root(&mut self, record: T) -> T {
        if self.nodes.is_empty() {
            return record;
        }
        let old = std::mem::replace(&mut self.nodes[0], record);
        self.sift_down(0);
        old
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.nodes
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.nodes.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;
            if left < len && (self.key)(&self.nodes[left]) < (self.key)(&self.nodes[smallest]) {
                smallest = left;
            }
            if right < len && (self.key)(&self.nodes[right]) < (self.key)(&self.nodes[smallest]) {
                smallest = right;
            }
            if smallest == index {
                return;
            }
            self.nodes.swap(index, smallest);
            index = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_heap<T, K: Ord>(nodes: &[T], key: impl Fn(&T) -> K) -> bool {
        (1..nodes.len()).all(|i| key(&nodes[(i - 1) / 2]) <= key(&nodes[i]))
    }

    #[test]
    fn test_build_puts_minimum_at_root() {
        let heap = MinHeap::build(vec![9, 4, 7, 1, 8, 2], |v: &u32| *v);
        assert_eq!(heap.peek(), Some(&1));
        assert_eq!(heap.len(), 6);
        let nodes = heap.into_vec();
        assert!(is_heap(&nodes, |v| *v));
    }

    #[test]
    fn test_replace_root_yields_ascending_sequence() {
        let mut heap = MinHeap::build(vec![5u32, 3, 8, 1], |v: &u32| *v);
        let mut out = Vec::new();
        for _ in 0..4 {
            let min = *heap.peek().unwrap();
            out.push(min);
            heap.replace_root(u32::MAX);
        }
        assert_eq!(out, vec![1, 3, 5, 8]);
        assert_eq!(heap.len(), 4);
    }

    #[test]
    fn test_key_extraction_on_records() {
        #[derive(Debug, Clone, Copy, PartialEq)]
        struct Rec {
            id: usize,
            head: u32,
        }

        let records = vec![
            Rec { id: 0, head: 30 },
            Rec { id: 1, head: 10 },
            Rec { id: 2, head: 20 },
        ];
        let mut heap = MinHeap::build(records, |r: &Rec| r.head);
        assert_eq!(heap.peek().unwrap().id, 1);

        let old = heap.replace_root(Rec { id: 1, head: 25 });
        assert_eq!(old.head, 10);
        assert_eq!(heap.peek().unwrap().id, 2);
        assert!(is_heap(&heap.into_vec(), |r| r.head));
    }

    #[test]
    fn test_empty_heap() {
        let mut heap = MinHeap::build(Vec::<u32>::new(), |v: &u32| *v);
        assert!(heap.is_empty());
        assert_eq!(heap.peek(), None);
        assert_eq!(heap.replace_root(7), 7);
    }
}
