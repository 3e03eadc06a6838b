// Word graph persistence.
//
// Layout (little-endian):
//   bytes 0..4    magic "WDAG"
//   bytes 4..8    format version
//   bytes 8..12   vocabulary size the graph was built for
//   bytes 12..16  edge count
//   bytes 16..    edge records, 8 bytes each

use bytemuck::{Pod, Zeroable};

use crate::DawgError;
use crate::graph::WordGraph;
use crate::layout::{EdgeLayout, EdgeRecord};

/// "WDAG" read as a little-endian u32.
pub const MAGIC: u32 = 0x4741_4457;

pub const VERSION: u32 = 1;

/// Size of the header in bytes.
pub const HEADER_SIZE: usize = 16;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GraphHeader {
    magic: u32,
    version: u32,
    symbol_count: u32,
    edge_count: u32,
}

const _: () = assert!(size_of::<GraphHeader>() == HEADER_SIZE);

impl WordGraph {
    /// Serialize the graph.
    ///
    /// Fails when the vocabulary size or the edge count does not fit the
    /// 32-bit header fields.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DawgError> {
        let header = GraphHeader {
            magic: MAGIC.to_le(),
            version: VERSION.to_le(),
            symbol_count: header_field("symbol count", self.symbol_count())?.to_le(),
            edge_count: header_field("edge count", self.num_edges())?.to_le(),
        };
        let mut out = Vec::with_capacity(HEADER_SIZE + 8 * self.num_edges());
        out.extend_from_slice(bytemuck::bytes_of(&header));
        for rec in self.edges() {
            out.extend_from_slice(&rec.0.to_le_bytes());
        }
        Ok(out)
    }

    /// Load and validate a graph written by [`WordGraph::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> Result<WordGraph, DawgError> {
        if data.len() < HEADER_SIZE {
            return Err(DawgError::TooShort {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }
        let header: GraphHeader = bytemuck::pod_read_unaligned(&data[..HEADER_SIZE]);
        if u32::from_le(header.magic) != MAGIC {
            return Err(DawgError::InvalidMagic);
        }
        let version = u32::from_le(header.version);
        if version != VERSION {
            return Err(DawgError::UnsupportedVersion(version));
        }
        let symbol_count = u32::from_le(header.symbol_count) as usize;
        let declared = u32::from_le(header.edge_count) as usize;

        let body = &data[HEADER_SIZE..];
        if body.len() % 8 != 0 || body.len() / 8 != declared {
            return Err(DawgError::EdgeCountMismatch {
                declared,
                actual: body.len() / 8,
            });
        }
        let edges: Vec<EdgeRecord> = body
            .chunks_exact(8)
            .map(|chunk| EdgeRecord(u64::from_le(bytemuck::pod_read_unaligned(chunk))))
            .collect();

        validate_edges(&EdgeLayout::new(symbol_count), symbol_count, &edges)?;
        Ok(WordGraph::from_edges(symbol_count, edges))
    }
}

fn header_field(field: &'static str, value: usize) -> Result<u32, DawgError> {
    u32::try_from(value).map_err(|_| DawgError::HeaderOverflow { field, value })
}

/// Every symbol is in the vocabulary, every run is sorted by symbol, every
/// target starts a run, the last run is terminated and no path loops.
fn validate_edges(
    layout: &EdgeLayout,
    symbol_count: usize,
    edges: &[EdgeRecord],
) -> Result<(), DawgError> {
    let mut starts = vec![false; edges.len()];
    let mut at_start = true;
    for (i, &rec) in edges.iter().enumerate() {
        starts[i] = at_start;
        at_start = layout.is_marker(rec);
    }
    if !at_start {
        return Err(DawgError::UnterminatedNode { index: edges.len() });
    }
    for (index, &rec) in edges.iter().enumerate() {
        let symbol = layout.symbol(rec);
        if symbol as usize >= symbol_count {
            return Err(DawgError::InvalidSymbol { index, symbol });
        }
        if !starts[index] && layout.symbol(edges[index - 1]) >= symbol {
            return Err(DawgError::UnsortedNode { index });
        }
        let target = layout.next_node(rec);
        if target != 0 && !starts.get(target as usize).copied().unwrap_or(false) {
            return Err(DawgError::DanglingEdge { index, target });
        }
    }
    check_acyclic(layout, edges, &starts)
}

/// Depth-first walk over every run; a target still on the stack closes a
/// cycle.
fn check_acyclic(
    layout: &EdgeLayout,
    edges: &[EdgeRecord],
    starts: &[bool],
) -> Result<(), DawgError> {
    const UNSEEN: u8 = 0;
    const ON_STACK: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; edges.len()];
    for root in (0..edges.len()).filter(|&i| starts[i]) {
        if state[root] != UNSEEN {
            continue;
        }
        state[root] = ON_STACK;
        // (run start, next edge to follow)
        let mut stack = vec![(root, root)];
        while let Some(frame) = stack.last_mut() {
            let (node, i) = *frame;
            if i > node && layout.is_marker(edges[i - 1]) {
                state[node] = DONE;
                stack.pop();
                continue;
            }
            frame.1 += 1;
            let target = layout.next_node(edges[i]) as usize;
            if target == 0 {
                continue;
            }
            match state[target] {
                UNSEEN => {
                    state[target] = ON_STACK;
                    stack.push((target, target));
                }
                ON_STACK => return Err(DawgError::CyclicGraph { index: i }),
                _ => {}
            }
        }
    }
    Ok(())
}
