// Mutable trie with forward and backward edges, and its compaction into a
// word graph.
//
// Each node keeps its outgoing (forward) edges and, mirrored, its incoming
// (backward) edges. Backward edges exist only so that compaction can find
// and merge equivalent predecessors without a full scan.

use hashbrown::HashMap;
use wordrec_core::diagnostics::{LoadSummary, SkipReason};
use wordrec_core::symbols::{SymbolId, SymbolSet};

use crate::graph::WordGraph;
use crate::layout::{EdgeLayout, EdgeRecord};
use crate::{Dawg, DawgError, EdgeRef, Insertion, NodeRef};

/// Dictionary construction options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictOptions {
    /// Upper bound on forward plus backward edges held by a trie. Inserting
    /// past it clears the trie. Default: 10 000 000.
    pub max_num_edges: usize,
}

impl Default for DictOptions {
    fn default() -> Self {
        Self {
            max_num_edges: 10_000_000,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TrieNode {
    forward: Vec<EdgeRecord>,
    backward: Vec<EdgeRecord>,
}

/// Growable dictionary. One forward edge per `(node, symbol)`; the edge
/// carries the word-end flag.
#[derive(Debug, Clone)]
pub struct Trie {
    layout: EdgeLayout,
    symbol_count: usize,
    nodes: Vec<TrieNode>,
    /// Forward plus backward edges.
    num_edges: usize,
    max_num_edges: usize,
    resets: usize,
}

impl Trie {
    pub fn new(symbol_count: usize, options: &DictOptions) -> Self {
        let layout = EdgeLayout::new(symbol_count);
        let capacity = usize::try_from(layout.max_next_node())
            .unwrap_or(usize::MAX)
            .min(u32::MAX as usize);
        Self {
            layout,
            symbol_count,
            nodes: vec![TrieNode::default()],
            num_edges: 0,
            max_num_edges: options.max_num_edges.min(capacity),
            resets: 0,
        }
    }

    /// Re-expand a compacted graph into a trie accepting the same words.
    pub fn from_graph(graph: &WordGraph, options: &DictOptions) -> Result<Self, DawgError> {
        let mut trie = Self::new(graph.symbol_count(), options);
        for word in graph.words() {
            trie.insert(&word)?;
        }
        Ok(trie)
    }

    pub fn layout(&self) -> &EdgeLayout {
        &self.layout
    }

    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }

    /// Forward plus backward edges.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn num_forward_edges(&self) -> usize {
        self.num_edges / 2
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_edges == 0
    }

    /// How many times the edge budget forced the trie to be cleared.
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Remove every word.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(TrieNode::default());
        self.num_edges = 0;
    }

    /// Add a word.
    ///
    /// Empty words and symbols outside the vocabulary are rejected. When
    /// the word would push the trie past its edge budget, the trie is
    /// cleared and the word inserted into the empty trie.
    pub fn insert(&mut self, word: &[SymbolId]) -> Result<Insertion, DawgError> {
        self.validate(word)?;
        if self.try_insert(word) {
            return Ok(Insertion::Added);
        }
        if !self.is_empty() {
            log::warn!(
                "trie edge budget of {} exceeded; clearing {} edges",
                self.max_num_edges,
                self.num_edges
            );
            self.clear();
            self.resets += 1;
            if self.try_insert(word) {
                return Ok(Insertion::AfterReset);
            }
        }
        log::warn!(
            "dropping word of {} symbols: larger than the trie edge budget of {}",
            word.len(),
            self.max_num_edges
        );
        Ok(Insertion::TooLarge)
    }

    /// Insert one word per line of `text`, encoded with `symbols`.
    ///
    /// Lines with symbols outside the set, or that cannot be inserted, are
    /// skipped and reported in the summary.
    pub fn read_word_list(&mut self, text: &str, symbols: &SymbolSet) -> LoadSummary {
        let mut summary = LoadSummary::new();
        for (idx, line) in text.lines().enumerate() {
            let word = line.trim();
            if word.is_empty() {
                continue;
            }
            let ids = match symbols.encode(word) {
                Ok(ids) => ids,
                Err(rest) => {
                    let unknown = rest.chars().next().map(String::from).unwrap_or_default();
                    summary.skip("word list", idx + 1, SkipReason::UnknownSymbol(unknown));
                    continue;
                }
            };
            match self.insert(&ids) {
                Ok(Insertion::Added | Insertion::AfterReset) => summary.accepted += 1,
                Ok(Insertion::TooLarge) => summary.skip(
                    "word list",
                    idx + 1,
                    SkipReason::Rejected("word exceeds the edge budget".to_string()),
                ),
                Err(err) => {
                    summary.skip("word list", idx + 1, SkipReason::Rejected(err.to_string()))
                }
            }
        }
        summary
    }

    fn validate(&self, word: &[SymbolId]) -> Result<(), DawgError> {
        if word.is_empty() {
            return Err(DawgError::InvalidWord("empty word".to_string()));
        }
        if let Some((pos, symbol)) = word
            .iter()
            .enumerate()
            .find(|&(_, &s)| s as usize >= self.symbol_count)
        {
            return Err(DawgError::InvalidWord(format!(
                "symbol {symbol} at position {pos} is outside the vocabulary of {}",
                self.symbol_count
            )));
        }
        Ok(())
    }

    /// Insert if the word fits the budget. Leaves the trie untouched and
    /// returns `false` otherwise.
    fn try_insert(&mut self, word: &[SymbolId]) -> bool {
        let mut node = 0;
        let mut existing = 0;
        for &symbol in word {
            match self.forward_index(node, symbol) {
                Some(idx) => {
                    node = self.target(node, idx);
                    existing += 1;
                }
                None => break,
            }
        }
        let new_edges = word.len() - existing;
        if self.num_edges + 2 * new_edges > self.max_num_edges {
            return false;
        }
        if (self.nodes.len() + new_edges) as u64 > self.layout.max_next_node() + 1 {
            return false;
        }

        let mut node = 0;
        for (i, &symbol) in word.iter().enumerate() {
            let last = i + 1 == word.len();
            node = match self.forward_index(node, symbol) {
                Some(idx) => {
                    let next = self.target(node, idx);
                    if last {
                        self.set_word_end(node, idx, next);
                    }
                    next
                }
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.add_edge_pair(node, next, symbol, last);
                    next
                }
            };
        }
        true
    }

    fn forward_index(&self, node: usize, symbol: SymbolId) -> Option<usize> {
        self.nodes[node]
            .forward
            .iter()
            .position(|&rec| self.layout.symbol(rec) == symbol)
    }

    fn target(&self, node: usize, idx: usize) -> usize {
        self.layout.next_node(self.nodes[node].forward[idx]) as usize
    }

    fn add_edge_pair(&mut self, from: usize, to: usize, symbol: SymbolId, word_end: bool) {
        let layout = self.layout;
        self.nodes[from]
            .forward
            .push(layout.pack(to as u64, symbol, word_end, false, false));
        self.nodes[to]
            .backward
            .push(layout.pack(from as u64, symbol, word_end, true, false));
        self.num_edges += 2;
    }

    fn set_word_end(&mut self, node: usize, idx: usize, next: usize) {
        let layout = self.layout;
        let rec = self.nodes[node].forward[idx];
        let symbol = layout.symbol(rec);
        self.nodes[node].forward[idx] = layout.with_word_end(rec);
        if let Some(back) = self.nodes[next]
            .backward
            .iter_mut()
            .find(|b| layout.symbol(**b) == symbol && layout.next_node(**b) == node as u64)
        {
            *back = layout.with_word_end(*back);
        }
    }

    fn make_edge_ref(&self, node: usize, idx: usize) -> EdgeRef {
        EdgeRef(((node as u64) << self.layout.letter_bits()) | idx as u64)
    }

    fn deref_edge(&self, edge: EdgeRef) -> EdgeRecord {
        assert!(!edge.is_none(), "dereferenced EdgeRef::NONE");
        let node = (edge.0 >> self.layout.letter_bits()) as usize;
        let idx = (edge.0 & self.layout.letter_mask()) as usize;
        self.nodes[node].forward[idx]
    }

    // -- Compaction ------------------------------------------------------

    /// Merge equivalent sub-structure and serialize the result.
    ///
    /// The returned graph accepts exactly the words of this trie. The trie
    /// is left empty.
    pub fn compact(&mut self) -> WordGraph {
        let (nodes_before, edges_before) = (self.num_nodes(), self.num_forward_edges());
        let mut removed = vec![false; self.nodes.len()];
        self.merge_leaves(&mut removed);
        let mut passes = 0;
        loop {
            passes += 1;
            let mut merges = 0;
            for node in 1..self.nodes.len() {
                if !removed[node] {
                    merges += self.reduce_node_input(node, &mut removed);
                }
            }
            if merges == 0 {
                break;
            }
        }
        let graph = self.serialize();
        log::debug!(
            "compacted trie: {nodes_before} nodes / {edges_before} edges -> {} nodes / {} edges in {passes} passes",
            graph.num_nodes(),
            graph.num_edges()
        );
        self.clear();
        graph
    }

    /// Redirect every edge that ends in a childless node to one shared
    /// terminal node.
    fn merge_leaves(&mut self, removed: &mut [bool]) {
        let layout = self.layout;
        let Some(terminal) = (1..self.nodes.len()).find(|&n| self.nodes[n].forward.is_empty())
        else {
            return;
        };
        for leaf in terminal + 1..self.nodes.len() {
            if !self.nodes[leaf].forward.is_empty() {
                continue;
            }
            for back in std::mem::take(&mut self.nodes[leaf].backward) {
                self.redirect(layout.next_node(back) as usize, layout.symbol(back), leaf, terminal);
                self.nodes[terminal].backward.push(back);
            }
            removed[leaf] = true;
        }
    }

    /// Merge predecessors of `node` that reach it with the same label and
    /// have identical forward edges. Returns the number of merges.
    fn reduce_node_input(&mut self, node: usize, removed: &mut [bool]) -> usize {
        let layout = self.layout;
        let mut backward = self.nodes[node].backward.clone();
        backward.sort_by_key(|&b| (layout.label(b), layout.next_node(b)));

        let mut merges = 0;
        for group in backward.chunk_by(|a, b| layout.label(*a) == layout.label(*b)) {
            if group.len() < 2 {
                continue;
            }
            let mut seen: HashMap<Vec<EdgeRecord>, usize> = HashMap::new();
            for &back in group {
                let pred = layout.next_node(back) as usize;
                if pred == 0 || removed[pred] {
                    continue;
                }
                let mut signature = self.nodes[pred].forward.clone();
                signature.sort_by_key(|r| r.0);
                match seen.get(&signature) {
                    Some(&keep) if keep != pred => {
                        self.merge_nodes(keep, pred, removed);
                        merges += 1;
                    }
                    Some(_) => {}
                    None => {
                        seen.insert(signature, pred);
                    }
                }
            }
        }
        merges
    }

    /// Fold `drop` into `keep`. Both must have identical forward edges.
    fn merge_nodes(&mut self, keep: usize, drop: usize, removed: &mut [bool]) {
        let layout = self.layout;
        for fwd in std::mem::take(&mut self.nodes[drop].forward) {
            let target = layout.next_node(fwd) as usize;
            let label = layout.label(fwd);
            let back = &mut self.nodes[target].backward;
            if let Some(pos) = back
                .iter()
                .position(|&b| layout.label(b) == label && layout.next_node(b) == drop as u64)
            {
                back.swap_remove(pos);
            }
            self.num_edges -= 2;
        }
        for back in std::mem::take(&mut self.nodes[drop].backward) {
            self.redirect(layout.next_node(back) as usize, layout.symbol(back), drop, keep);
            self.nodes[keep].backward.push(back);
        }
        removed[drop] = true;
    }

    /// Point the `symbol` edge of `pred` at `to` instead of `from`.
    fn redirect(&mut self, pred: usize, symbol: SymbolId, from: usize, to: usize) {
        let layout = self.layout;
        if let Some(fwd) = self.nodes[pred]
            .forward
            .iter_mut()
            .find(|f| layout.symbol(**f) == symbol && layout.next_node(**f) == from as u64)
        {
            *fwd = layout.with_next_node(*fwd, to as u64);
        }
    }

    /// Lay out the nodes reachable from the root breadth-first, each as a
    /// symbol-sorted run of edges. Edges into childless nodes store 0, which
    /// the graph reads as [`NodeRef::NONE`] since the root is never a target.
    fn serialize(&self) -> WordGraph {
        let layout = self.layout;
        let sorted = |node: usize| {
            let mut edges = self.nodes[node].forward.clone();
            edges.sort_by_key(|&r| layout.symbol(r));
            edges
        };

        let mut order = vec![0usize];
        let mut start_of: HashMap<usize, u64> = HashMap::new();
        start_of.insert(0, 0);
        let mut next_start = self.nodes[0].forward.len() as u64;
        let mut i = 0;
        while i < order.len() {
            for rec in sorted(order[i]) {
                let target = layout.next_node(rec) as usize;
                let width = self.nodes[target].forward.len();
                if width > 0 && !start_of.contains_key(&target) {
                    start_of.insert(target, next_start);
                    next_start += width as u64;
                    order.push(target);
                }
            }
            i += 1;
        }

        let mut edges = Vec::with_capacity(next_start as usize);
        for &node in &order {
            let run = sorted(node);
            let len = run.len();
            for (k, rec) in run.into_iter().enumerate() {
                let target = layout.next_node(rec) as usize;
                let next = start_of.get(&target).copied().unwrap_or(0);
                edges.push(layout.pack(
                    next,
                    layout.symbol(rec),
                    layout.is_word_end(rec),
                    false,
                    k + 1 == len,
                ));
            }
        }
        WordGraph::from_edges(self.symbol_count, edges)
    }
}

impl Dawg for Trie {
    fn edge_for(&self, node: NodeRef, symbol: SymbolId, word_end: bool) -> Option<EdgeRef> {
        if node.is_none() {
            return None;
        }
        let n = node.0 as usize;
        self.nodes[n]
            .forward
            .iter()
            .position(|&rec| {
                self.layout.symbol(rec) == symbol && (!word_end || self.layout.is_word_end(rec))
            })
            .map(|idx| self.make_edge_ref(n, idx))
    }

    fn next_node(&self, edge: EdgeRef) -> NodeRef {
        let target = self.layout.next_node(self.deref_edge(edge));
        if self.nodes[target as usize].forward.is_empty() {
            NodeRef::NONE
        } else {
            NodeRef(target)
        }
    }

    fn is_word_end(&self, edge: EdgeRef) -> bool {
        self.layout.is_word_end(self.deref_edge(edge))
    }

    fn symbol_of(&self, edge: EdgeRef) -> SymbolId {
        self.layout.symbol(self.deref_edge(edge))
    }

    fn children(&self, node: NodeRef) -> Vec<(SymbolId, EdgeRef)> {
        if node.is_none() {
            return Vec::new();
        }
        let n = node.0 as usize;
        self.nodes[n]
            .forward
            .iter()
            .enumerate()
            .map(|(idx, &rec)| (self.layout.symbol(rec), self.make_edge_ref(n, idx)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> SymbolSet {
        SymbolSet::from_symbols("abcdefghijklmnopqrstuvwxyz".chars().map(String::from))
    }

    fn build(words: &[&str]) -> (SymbolSet, Trie) {
        let set = symbols();
        let mut trie = Trie::new(set.len(), &DictOptions::default());
        for w in words {
            let ids = set.encode(w).unwrap();
            assert_eq!(trie.insert(&ids).unwrap(), Insertion::Added);
        }
        (set, trie)
    }

    fn ids(set: &SymbolSet, w: &str) -> Vec<SymbolId> {
        set.encode(w).unwrap()
    }

    #[test]
    fn trie_accepts_inserted_words_only() {
        let (set, trie) = build(&["cat", "car", "cart"]);
        for w in ["cat", "car", "cart"] {
            assert!(trie.contains(&ids(&set, w)), "{w}");
        }
        for w in ["ca", "ct", "cats", "c", "carts"] {
            assert!(!trie.contains(&ids(&set, w)), "{w}");
        }
    }

    #[test]
    fn edge_for_respects_word_end() {
        let (set, trie) = build(&["car", "cart"]);
        let c = trie.edge_for(NodeRef::ROOT, ids(&set, "c")[0], false).unwrap();
        assert_eq!(trie.symbol_of(c), ids(&set, "c")[0]);
        assert!(!trie.is_word_end(c));
        assert!(trie.edge_for(NodeRef::ROOT, ids(&set, "c")[0], true).is_none());
        let a = trie.edge_for(trie.next_node(c), ids(&set, "a")[0], false).unwrap();
        let r = trie.edge_for(trie.next_node(a), ids(&set, "r")[0], true).unwrap();
        assert!(trie.is_word_end(r));
        let t = trie.edge_for(trie.next_node(r), ids(&set, "t")[0], true).unwrap();
        assert!(trie.next_node(t).is_none());
    }

    #[test]
    #[should_panic(expected = "EdgeRef::NONE")]
    fn decoding_none_panics() {
        let (_, trie) = build(&["a"]);
        trie.symbol_of(EdgeRef::NONE);
    }

    #[test]
    fn insert_rejects_invalid_words() {
        let mut trie = Trie::new(3, &DictOptions::default());
        assert!(matches!(trie.insert(&[]), Err(DawgError::InvalidWord(_))));
        assert!(matches!(trie.insert(&[0, 3]), Err(DawgError::InvalidWord(_))));
        assert!(trie.is_empty());
    }

    #[test]
    fn duplicate_insert_adds_no_edges() {
        let (set, mut trie) = build(&["cat"]);
        let before = trie.num_edges();
        trie.insert(&ids(&set, "cat")).unwrap();
        assert_eq!(trie.num_edges(), before);
        assert_eq!(trie.num_forward_edges(), 3);
    }

    #[test]
    fn budget_overflow_clears_and_retries() {
        let set = symbols();
        let options = DictOptions { max_num_edges: 6 };
        let mut trie = Trie::new(set.len(), &options);
        assert_eq!(trie.insert(&ids(&set, "cat")).unwrap(), Insertion::Added);
        assert_eq!(trie.insert(&ids(&set, "dog")).unwrap(), Insertion::AfterReset);
        assert!(trie.contains(&ids(&set, "dog")));
        assert!(!trie.contains(&ids(&set, "cat")));
        assert_eq!(trie.resets(), 1);
    }

    #[test]
    fn word_larger_than_budget_is_dropped() {
        let set = symbols();
        let mut trie = Trie::new(set.len(), &DictOptions { max_num_edges: 4 });
        assert_eq!(trie.insert(&ids(&set, "ab")).unwrap(), Insertion::Added);
        assert_eq!(trie.insert(&ids(&set, "cat")).unwrap(), Insertion::TooLarge);
        assert!(trie.is_empty());
        assert_eq!(trie.resets(), 1);
    }

    #[test]
    fn read_word_list_reports_unknown_symbols() {
        let set = SymbolSet::from_symbols(["c", "a", "t", "r"]);
        let mut trie = Trie::new(set.len(), &DictOptions::default());
        let summary = trie.read_word_list("cat\n\ncar\ncow\n  cart  \n", &set);
        assert_eq!(summary.accepted, 3);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].line, 4);
        assert_eq!(
            summary.skipped[0].reason,
            SkipReason::UnknownSymbol("o".to_string())
        );
        assert!(trie.contains(&set.encode("cart").unwrap()));
    }

    #[test]
    fn compacted_graph_accepts_same_words() {
        let (set, mut trie) = build(&["cat", "car", "cart"]);
        let graph = trie.compact();
        for w in ["cat", "car", "cart"] {
            assert!(graph.contains(&ids(&set, w)), "{w}");
        }
        for w in ["ca", "ct", "cats"] {
            assert!(!graph.contains(&ids(&set, w)), "{w}");
        }
        assert!(trie.is_empty());
    }

    #[test]
    fn compaction_merges_shared_suffixes() {
        let (_, mut trie) = build(&["cats", "bats", "rats"]);
        assert_eq!(trie.num_forward_edges(), 12);
        assert_eq!(trie.num_nodes(), 13);
        let graph = trie.compact();
        // Root (3 edges) -> a -> t -> s -> terminal.
        assert_eq!(graph.num_edges(), 6);
        assert_eq!(graph.num_nodes(), 5);
    }

    #[test]
    fn compaction_keeps_word_end_distinct() {
        // "bar" ends a word at r, "cat" does not share that suffix.
        let (set, mut trie) = build(&["bar", "bart", "car", "cart", "dart"]);
        let graph = trie.compact();
        assert!(graph.contains(&ids(&set, "car")));
        assert!(graph.contains(&ids(&set, "dart")));
        assert!(!graph.contains(&ids(&set, "dar")));
        assert_eq!(
            graph.words().len(),
            5,
            "compaction must not add or drop words"
        );
    }

    #[test]
    fn compaction_never_grows_and_is_idempotent() {
        let (_, mut trie) = build(&[
            "recognize", "recognizer", "recognition", "cognition", "ignition", "ignite",
            "unite", "united", "untied", "tied", "tide",
        ]);
        let (nodes, edges) = (trie.num_nodes(), trie.num_forward_edges());
        let graph = trie.compact();
        assert!(graph.num_edges() <= edges);
        assert!(graph.num_nodes() <= nodes);

        let mut again = Trie::from_graph(&graph, &DictOptions::default()).unwrap();
        let graph2 = again.compact();
        assert_eq!(graph2.num_edges(), graph.num_edges());
        assert_eq!(graph2.num_nodes(), graph.num_nodes());
        assert_eq!(graph2, graph);
    }

    #[test]
    fn compaction_preserves_language_exhaustively() {
        // Deterministic pseudo-random words over a three-letter alphabet.
        let set = SymbolSet::from_symbols(["a", "b", "c"]);
        let mut trie = Trie::new(set.len(), &DictOptions::default());
        let mut words = Vec::new();
        let mut seed: u32 = 12345;
        for _ in 0..40 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let len = 1 + (seed >> 16) as usize % 5;
            let mut word = Vec::with_capacity(len);
            for _ in 0..len {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
                word.push((seed >> 16) % 3);
            }
            trie.insert(&word).unwrap();
            words.push(word);
        }
        let graph = trie.compact();

        // Every string of length 1..=5 is accepted iff it was inserted.
        let mut frontier: Vec<Vec<SymbolId>> = vec![vec![]];
        for _ in 0..5 {
            let mut next = Vec::new();
            for prefix in &frontier {
                for s in 0..3 {
                    let mut w = prefix.clone();
                    w.push(s);
                    assert_eq!(graph.contains(&w), words.contains(&w), "{w:?}");
                    next.push(w);
                }
            }
            frontier = next;
        }
    }

    #[test]
    fn empty_trie_compacts_to_empty_graph() {
        let mut trie = Trie::new(5, &DictOptions::default());
        let graph = trie.compact();
        assert!(graph.is_empty());
        assert_eq!(graph.num_nodes(), 0);
        assert!(!graph.contains(&[0]));
    }

    #[test]
    fn children_lists_forward_edges() {
        let (set, trie) = build(&["ab", "ac", "b"]);
        let mut root: Vec<SymbolId> = trie
            .children(NodeRef::ROOT)
            .into_iter()
            .map(|(s, _)| s)
            .collect();
        root.sort();
        assert_eq!(root, ids(&set, "ab"));
        let a = trie.walk(&ids(&set, "a")).unwrap();
        assert_eq!(trie.children(trie.next_node(a)).len(), 2);
    }
}
