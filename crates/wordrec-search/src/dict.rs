// Dictionary traversal over one or more word graphs.
//
// Each loaded graph is a sub-dictionary. A search keeps one active
// traversal per sub-dictionary whose prefix is still consistent with the
// symbols chosen so far; consuming a symbol maps each traversal to at most
// one successor, so the active set never grows.

use wordrec_core::symbols::SymbolId;
use wordrec_dawg::graph::WordGraph;
use wordrec_dawg::{Dawg, NodeRef};

/// In-progress prefix match in one sub-dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveTraversal {
    /// Index of the graph in the [`Dictionary`].
    pub graph: usize,
    /// Node the next symbol is looked up from.
    pub node: NodeRef,
    /// Whether the symbols consumed so far form a complete word.
    pub word_end: bool,
}

impl ActiveTraversal {
    pub fn at_root(graph: usize) -> Self {
        Self {
            graph,
            node: NodeRef::ROOT,
            word_end: false,
        }
    }
}

/// The loaded sub-dictionaries, immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    graphs: Vec<WordGraph>,
}

impl Dictionary {
    pub fn new(graphs: Vec<WordGraph>) -> Self {
        Self { graphs }
    }

    pub fn graphs(&self) -> &[WordGraph] {
        &self.graphs
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub(crate) fn push(&mut self, graph: WordGraph) {
        self.graphs.push(graph);
    }

    /// One traversal per non-empty graph, each at its root.
    pub fn initial_traversals(&self) -> Vec<ActiveTraversal> {
        self.graphs
            .iter()
            .enumerate()
            .filter(|(_, g)| !g.is_empty())
            .map(|(i, _)| ActiveTraversal::at_root(i))
            .collect()
    }

    /// Consume one symbol.
    pub fn advance(&self, traversal: &ActiveTraversal, symbol: SymbolId) -> Option<ActiveTraversal> {
        let graph = self.graphs.get(traversal.graph)?;
        let edge = graph.edge_for(traversal.node, symbol, false)?;
        Some(ActiveTraversal {
            graph: traversal.graph,
            node: graph.next_node(edge),
            word_end: graph.is_word_end(edge),
        })
    }

    /// Consume one symbol in every traversal, dropping those that fail.
    pub fn advance_all(&self, active: &[ActiveTraversal], symbol: SymbolId) -> Vec<ActiveTraversal> {
        active
            .iter()
            .filter_map(|t| self.advance(t, symbol))
            .collect()
    }

    /// Consume a symbol sequence.
    pub fn advance_seq(&self, active: &[ActiveTraversal], symbols: &[SymbolId]) -> Vec<ActiveTraversal> {
        let mut current = active.to_vec();
        for &symbol in symbols {
            if current.is_empty() {
                break;
            }
            current = self.advance_all(&current, symbol);
        }
        current
    }

    /// Whether any traversal has just completed a word.
    pub fn any_word_end(active: &[ActiveTraversal]) -> bool {
        active.iter().any(|t| t.word_end)
    }

    /// Whether any sub-dictionary accepts `word`.
    pub fn contains(&self, word: &[SymbolId]) -> bool {
        self.graphs.iter().any(|g| g.contains(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordrec_dawg::trie::{DictOptions, Trie};

    fn graph(words: &[&[SymbolId]]) -> WordGraph {
        let mut trie = Trie::new(6, &DictOptions::default());
        for w in words {
            trie.insert(w).unwrap();
        }
        trie.compact()
    }

    #[test]
    fn active_set_only_shrinks() {
        let dict = Dictionary::new(vec![graph(&[&[0, 1], &[0, 2]]), graph(&[&[0, 3]])]);
        let start = dict.initial_traversals();
        assert_eq!(start.len(), 2);
        let after_0 = dict.advance_all(&start, 0);
        assert_eq!(after_0.len(), 2);
        assert!(!Dictionary::any_word_end(&after_0));
        let after_3 = dict.advance_all(&after_0, 3);
        assert_eq!(after_3.len(), 1);
        assert_eq!(after_3[0].graph, 1);
        assert!(Dictionary::any_word_end(&after_3));
        assert!(dict.advance_all(&after_3, 0).is_empty());
    }

    #[test]
    fn empty_graphs_are_not_seeded() {
        let dict = Dictionary::new(vec![WordGraph::empty(6), graph(&[&[4]])]);
        let start = dict.initial_traversals();
        assert_eq!(start, vec![ActiveTraversal::at_root(1)]);
    }

    #[test]
    fn advance_seq_matches_contains() {
        let dict = Dictionary::new(vec![graph(&[&[1, 2, 3], &[1, 2]])]);
        let end = dict.advance_seq(&dict.initial_traversals(), &[1, 2]);
        assert!(Dictionary::any_word_end(&end));
        assert!(dict.contains(&[1, 2, 3]));
        assert!(!dict.contains(&[1]));
        assert!(dict.advance_seq(&dict.initial_traversals(), &[2]).is_empty());
    }
}
