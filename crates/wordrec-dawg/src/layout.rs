// Bit-packed edge records.
//
// Record layout, low bits first:
//   [0, letter_bits)                    symbol id
//   [letter_bits, letter_bits + 3)      flags: marker, backward, word end
//   [letter_bits + 3, 64)               next node
//
// `letter_bits` is the smallest width that holds every symbol id of the
// vocabulary, so the node field shrinks as the vocabulary grows.

use bytemuck::{Pod, Zeroable};
use wordrec_core::symbols::SymbolId;

/// Number of flag bits between the symbol and the next-node field.
pub const NUM_FLAG_BITS: u32 = 3;

/// Last edge of a node (word graph only).
pub const MARKER_FLAG: u64 = 1;
/// Backward edge (trie only).
pub const BACKWARD_FLAG: u64 = 2;
/// Following this edge completes a word.
pub const WORD_END_FLAG: u64 = 4;

/// One packed edge.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct EdgeRecord(pub u64);

const _: () = assert!(size_of::<EdgeRecord>() == 8);

/// Field positions for a given vocabulary size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeLayout {
    letter_bits: u32,
    letter_mask: u64,
    flag_start: u32,
    next_node_start: u32,
}

impl EdgeLayout {
    /// Layout for a vocabulary of `symbol_count` symbols.
    pub fn new(symbol_count: usize) -> Self {
        let letter_bits = letter_bits_for(symbol_count);
        Self {
            letter_bits,
            letter_mask: (1u64 << letter_bits) - 1,
            flag_start: letter_bits,
            next_node_start: letter_bits + NUM_FLAG_BITS,
        }
    }

    #[inline]
    pub fn letter_bits(&self) -> u32 {
        self.letter_bits
    }

    #[inline]
    pub fn letter_mask(&self) -> u64 {
        self.letter_mask
    }

    /// Largest value the next-node field can hold.
    pub fn max_next_node(&self) -> u64 {
        (1u64 << (64 - self.next_node_start)) - 1
    }

    pub fn pack(
        &self,
        next: u64,
        symbol: SymbolId,
        word_end: bool,
        backward: bool,
        marker: bool,
    ) -> EdgeRecord {
        debug_assert!(next <= self.max_next_node());
        debug_assert!((symbol as u64) <= self.letter_mask);
        let mut flags = 0;
        if marker {
            flags |= MARKER_FLAG;
        }
        if backward {
            flags |= BACKWARD_FLAG;
        }
        if word_end {
            flags |= WORD_END_FLAG;
        }
        EdgeRecord(
            (next << self.next_node_start) | (flags << self.flag_start) | symbol as u64,
        )
    }

    #[inline]
    pub fn symbol(&self, rec: EdgeRecord) -> SymbolId {
        (rec.0 & self.letter_mask) as SymbolId
    }

    #[inline]
    pub fn next_node(&self, rec: EdgeRecord) -> u64 {
        rec.0 >> self.next_node_start
    }

    #[inline]
    fn flags(&self, rec: EdgeRecord) -> u64 {
        (rec.0 >> self.flag_start) & ((1 << NUM_FLAG_BITS) - 1)
    }

    #[inline]
    pub fn is_marker(&self, rec: EdgeRecord) -> bool {
        self.flags(rec) & MARKER_FLAG != 0
    }

    #[inline]
    pub fn is_backward(&self, rec: EdgeRecord) -> bool {
        self.flags(rec) & BACKWARD_FLAG != 0
    }

    #[inline]
    pub fn is_word_end(&self, rec: EdgeRecord) -> bool {
        self.flags(rec) & WORD_END_FLAG != 0
    }

    pub fn with_word_end(&self, rec: EdgeRecord) -> EdgeRecord {
        EdgeRecord(rec.0 | (WORD_END_FLAG << self.flag_start))
    }

    pub fn with_marker(&self, rec: EdgeRecord, marker: bool) -> EdgeRecord {
        let bit = MARKER_FLAG << self.flag_start;
        EdgeRecord(if marker { rec.0 | bit } else { rec.0 & !bit })
    }

    pub fn with_next_node(&self, rec: EdgeRecord, next: u64) -> EdgeRecord {
        debug_assert!(next <= self.max_next_node());
        let low = rec.0 & ((1u64 << self.next_node_start) - 1);
        EdgeRecord((next << self.next_node_start) | low)
    }

    /// Key used to group and sort edges: symbol first, then word end.
    pub fn label(&self, rec: EdgeRecord) -> (SymbolId, bool) {
        (self.symbol(rec), self.is_word_end(rec))
    }
}

/// Smallest bit width holding ids `0..symbol_count`, at least 1.
pub fn letter_bits_for(symbol_count: usize) -> u32 {
    if symbol_count <= 2 {
        return 1;
    }
    usize::BITS - (symbol_count - 1).leading_zeros()
}
