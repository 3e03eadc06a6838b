//! Dictionary graph for the wordrec search core.
//!
//! Words are accumulated in a mutable [`Trie`](trie::Trie) and compacted into
//! an immutable [`WordGraph`](graph::WordGraph) that the search traverses one
//! symbol at a time.
//!
//! # Architecture
//!
//! - [`layout`] -- Bit-packed edge records and the layout derived from vocabulary size
//! - [`trie`] -- Mutable trie: insertion, word list loading, compaction
//! - [`graph`] -- Immutable, symbol-sorted word graph
//! - [`format`] -- Binary persistence of word graphs

pub mod format;
pub mod graph;
pub mod layout;
pub mod trie;

use wordrec_core::symbols::SymbolId;

/// Error type for dictionary construction and persistence.
#[derive(Debug, thiserror::Error)]
pub enum DawgError {
    #[error("invalid word: {0}")]
    InvalidWord(String),
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("invalid magic number in word graph header")]
    InvalidMagic,
    #[error("unsupported word graph version {0}")]
    UnsupportedVersion(u32),
    #[error("edge count mismatch: header declares {declared}, data holds {actual}")]
    EdgeCountMismatch { declared: usize, actual: usize },
    #[error("edge {index} points to {target}, which does not start a node")]
    DanglingEdge { index: usize, target: u64 },
    #[error("edge {index} carries symbol {symbol} outside the vocabulary")]
    InvalidSymbol { index: usize, symbol: SymbolId },
    #[error("edge run starting before {index} is not terminated")]
    UnterminatedNode { index: usize },
    #[error("edge {index} is out of symbol order within its run")]
    UnsortedNode { index: usize },
    #[error("edge {index} closes a cycle")]
    CyclicGraph { index: usize },
    #[error("{field} {value} does not fit the word graph header")]
    HeaderOverflow { field: &'static str, value: usize },
}

/// Reference to one edge of a dictionary.
///
/// For a trie this packs `(node, edge index)`; for a word graph it is an
/// index into the edge array. Either way it is opaque to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeRef(pub u64);

impl EdgeRef {
    /// "No edge".
    pub const NONE: EdgeRef = EdgeRef(u64::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Reference to one node of a dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub u64);

impl NodeRef {
    pub const ROOT: NodeRef = NodeRef(0);
    /// The edge leading here ends every word that passes through it.
    pub const NONE: NodeRef = NodeRef(u64::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Read access shared by the trie and the compacted word graph.
pub trait Dawg {
    /// Edge leaving `node` labelled `symbol`. With `word_end` set, only an
    /// edge that ends a word matches.
    fn edge_for(&self, node: NodeRef, symbol: SymbolId, word_end: bool) -> Option<EdgeRef>;

    /// Node reached by following `edge`. Panics on [`EdgeRef::NONE`].
    fn next_node(&self, edge: EdgeRef) -> NodeRef;

    /// Whether `edge` ends a word. Panics on [`EdgeRef::NONE`].
    fn is_word_end(&self, edge: EdgeRef) -> bool;

    /// Symbol labelling `edge`. Panics on [`EdgeRef::NONE`].
    fn symbol_of(&self, edge: EdgeRef) -> SymbolId;

    /// All `(symbol, edge)` pairs leaving `node`.
    fn children(&self, node: NodeRef) -> Vec<(SymbolId, EdgeRef)>;

    /// Whether the complete symbol sequence is a word of this dictionary.
    fn contains(&self, word: &[SymbolId]) -> bool {
        let Some((&last, prefix)) = word.split_last() else {
            return false;
        };
        let mut node = NodeRef::ROOT;
        for &symbol in prefix {
            let Some(edge) = self.edge_for(node, symbol, false) else {
                return false;
            };
            node = self.next_node(edge);
            if node.is_none() {
                return false;
            }
        }
        self.edge_for(node, last, true).is_some()
    }

    /// Edge reached after consuming `prefix` from the root, if every symbol
    /// of it has an edge.
    fn walk(&self, prefix: &[SymbolId]) -> Option<EdgeRef> {
        let mut node = NodeRef::ROOT;
        let mut edge = None;
        for &symbol in prefix {
            if node.is_none() {
                return None;
            }
            let e = self.edge_for(node, symbol, false)?;
            node = self.next_node(e);
            edge = Some(e);
        }
        edge
    }
}

/// Outcome of inserting one word into a trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The word was added (or was already present).
    Added,
    /// The edge budget was exceeded: the trie was cleared and the word was
    /// added to the empty trie.
    AfterReset,
    /// The word does not fit even an empty trie and was dropped.
    TooLarge,
}
