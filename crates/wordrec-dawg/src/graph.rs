// Immutable word graph: the compacted form of a trie.
//
// Nodes are not stored. A node is the index of the first edge of its run;
// runs are sorted by symbol and end at the edge carrying the marker flag.
// An edge whose next-node field is 0 leads nowhere (the root is never a
// target).

use wordrec_core::symbols::SymbolId;

use crate::layout::{EdgeLayout, EdgeRecord};
use crate::{Dawg, EdgeRef, NodeRef};

/// Read-only dictionary, shareable across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordGraph {
    layout: EdgeLayout,
    symbol_count: usize,
    edges: Vec<EdgeRecord>,
}

impl WordGraph {
    /// A graph that accepts nothing.
    pub fn empty(symbol_count: usize) -> Self {
        Self::from_edges(symbol_count, Vec::new())
    }

    /// Wrap an already validated edge array.
    pub(crate) fn from_edges(symbol_count: usize, edges: Vec<EdgeRecord>) -> Self {
        Self {
            layout: EdgeLayout::new(symbol_count),
            symbol_count,
            edges,
        }
    }

    pub fn layout(&self) -> &EdgeLayout {
        &self.layout
    }

    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of nodes: one per edge run plus the shared terminal node.
    pub fn num_nodes(&self) -> usize {
        if self.edges.is_empty() {
            return 0;
        }
        self.edges
            .iter()
            .filter(|&&rec| self.layout.is_marker(rec))
            .count()
            + 1
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Start indices of all edge runs, in layout order.
    pub fn node_starts(&self) -> Vec<usize> {
        let mut starts = Vec::new();
        let mut at_start = true;
        for (i, &rec) in self.edges.iter().enumerate() {
            if at_start {
                starts.push(i);
            }
            at_start = self.layout.is_marker(rec);
        }
        starts
    }

    /// Every accepted word, in lexicographic symbol order.
    pub fn words(&self) -> Vec<Vec<SymbolId>> {
        let mut out = Vec::new();
        if !self.edges.is_empty() {
            let mut prefix = Vec::new();
            self.collect_words(NodeRef::ROOT, &mut prefix, &mut out);
        }
        out
    }

    fn collect_words(&self, node: NodeRef, prefix: &mut Vec<SymbolId>, out: &mut Vec<Vec<SymbolId>>) {
        for (symbol, edge) in self.children(node) {
            prefix.push(symbol);
            if self.is_word_end(edge) {
                out.push(prefix.clone());
            }
            let next = self.next_node(edge);
            if !next.is_none() {
                self.collect_words(next, prefix, out);
            }
            prefix.pop();
        }
    }

    fn record(&self, edge: EdgeRef) -> EdgeRecord {
        assert!(!edge.is_none(), "dereferenced EdgeRef::NONE");
        self.edges[edge.0 as usize]
    }
}

impl Dawg for WordGraph {
    fn edge_for(&self, node: NodeRef, symbol: SymbolId, word_end: bool) -> Option<EdgeRef> {
        if node.is_none() {
            return None;
        }
        let mut i = node.0 as usize;
        while i < self.edges.len() {
            let rec = self.edges[i];
            let s = self.layout.symbol(rec);
            if s == symbol {
                return (!word_end || self.layout.is_word_end(rec)).then_some(EdgeRef(i as u64));
            }
            if s > symbol || self.layout.is_marker(rec) {
                return None;
            }
            i += 1;
        }
        None
    }

    fn next_node(&self, edge: EdgeRef) -> NodeRef {
        match self.layout.next_node(self.record(edge)) {
            0 => NodeRef::NONE,
            next => NodeRef(next),
        }
    }

    fn is_word_end(&self, edge: EdgeRef) -> bool {
        self.layout.is_word_end(self.record(edge))
    }

    fn symbol_of(&self, edge: EdgeRef) -> SymbolId {
        self.layout.symbol(self.record(edge))
    }

    fn children(&self, node: NodeRef) -> Vec<(SymbolId, EdgeRef)> {
        let mut out = Vec::new();
        if node.is_none() {
            return out;
        }
        let mut i = node.0 as usize;
        while i < self.edges.len() {
            let rec = self.edges[i];
            out.push((self.layout.symbol(rec), EdgeRef(i as u64)));
            if self.layout.is_marker(rec) {
                break;
            }
            i += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::{DictOptions, Trie};

    /// Hand-built graph for {"ab", "b"} over symbols a=0, b=1:
    /// node 0: a -> node 2, b (end) -> none; node 2: b (end) -> none.
    fn tiny() -> WordGraph {
        let layout = EdgeLayout::new(2);
        WordGraph::from_edges(
            2,
            vec![
                layout.pack(2, 0, false, false, false),
                layout.pack(0, 1, true, false, true),
                layout.pack(0, 1, true, false, true),
            ],
        )
    }

    #[test]
    fn hand_built_graph_traversal() {
        let g = tiny();
        assert!(g.contains(&[0, 1]));
        assert!(g.contains(&[1]));
        assert!(!g.contains(&[0]));
        assert!(!g.contains(&[1, 1]));
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.node_starts(), vec![0, 2]);
    }

    #[test]
    fn edge_for_stops_at_run_end() {
        let g = tiny();
        // Symbol 0 only appears in the root run.
        assert!(g.edge_for(NodeRef(2), 0, false).is_none());
        let e = g.edge_for(NodeRef::ROOT, 1, true).unwrap();
        assert_eq!(e, EdgeRef(1));
        assert!(g.next_node(e).is_none());
        assert!(g.edge_for(NodeRef::NONE, 1, false).is_none());
    }

    #[test]
    fn words_enumerates_language_sorted() {
        assert_eq!(tiny().words(), vec![vec![0, 1], vec![1]]);

        let mut trie = Trie::new(4, &DictOptions::default());
        for w in [[3u32, 0].as_slice(), &[0, 1, 2], &[0, 1], &[2]] {
            trie.insert(w).unwrap();
        }
        let graph = trie.compact();
        assert_eq!(
            graph.words(),
            vec![vec![0, 1], vec![0, 1, 2], vec![2], vec![3, 0]]
        );
    }

    #[test]
    fn walk_follows_prefix() {
        let g = tiny();
        let e = g.walk(&[0]).unwrap();
        assert_eq!(g.symbol_of(e), 0);
        assert!(g.walk(&[0, 0]).is_none());
        assert!(g.walk(&[1, 0]).is_none());
    }

    #[test]
    #[should_panic(expected = "EdgeRef::NONE")]
    fn next_node_of_none_panics() {
        tiny().next_node(EdgeRef::NONE);
    }

    #[test]
    fn empty_graph_accepts_nothing() {
        let g = WordGraph::empty(3);
        assert!(g.words().is_empty());
        assert!(g.children(NodeRef::ROOT).is_empty());
        assert!(!g.contains(&[0]));
    }
}
