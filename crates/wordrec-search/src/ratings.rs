// Classification cache for one word.
//
// A square matrix over piece indices: cell (start, end) holds the sorted
// classifier result for pieces start..=end once that range has been
// classified. The matrix belongs to one search and is dropped with it.

use hashbrown::HashMap;
use wordrec_core::choice::{BlobChoice, sort_choices};
use wordrec_core::geometry::BoundingBox;

use crate::Classifier;
use crate::pieces::{Seam, WordPieces};

/// Per-word ratings, filled lazily.
#[derive(Debug, Clone)]
pub struct RatingsMatrix {
    dimension: usize,
    cells: Vec<Option<Vec<BlobChoice>>>,
    classifier_calls: usize,
}

impl RatingsMatrix {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            cells: vec![None; dimension * dimension],
            classifier_calls: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of times the classifier has been invoked through this matrix.
    pub fn classifier_calls(&self) -> usize {
        self.classifier_calls
    }

    fn index(&self, start: usize, end: usize) -> usize {
        assert!(
            start <= end && end < self.dimension,
            "ratings cell ({start}, {end}) outside a {0}x{0} matrix",
            self.dimension
        );
        start * self.dimension + end
    }

    /// Stored result for a range, if it has been classified.
    pub fn get(&self, start: usize, end: usize) -> Option<&[BlobChoice]> {
        self.cells[self.index(start, end)].as_deref()
    }

    /// Store a result, sorting it best-first. Overwrites nothing: a cell
    /// that is already filled keeps its value.
    pub fn put(&mut self, start: usize, end: usize, mut choices: Vec<BlobChoice>) -> bool {
        let i = self.index(start, end);
        if self.cells[i].is_some() {
            return false;
        }
        sort_choices(&mut choices);
        self.cells[i] = Some(choices);
        true
    }

    /// Classifier result for pieces `start..=end`.
    ///
    /// The first call joins the range, classifies the blob and breaks the
    /// range again; later calls return the stored list.
    pub fn get_rating<C: Classifier + ?Sized>(
        &mut self,
        pieces: &mut WordPieces,
        seams: &[Seam],
        classifier: &C,
        start: usize,
        end: usize,
    ) -> &[BlobChoice] {
        let i = self.index(start, end);
        if self.cells[i].is_none() {
            pieces.join(seams, start, end);
            let mut choices = classifier.classify(&pieces.blob(start));
            pieces.break_pieces(seams, start, end);
            self.classifier_calls += 1;
            sort_choices(&mut choices);
            log::trace!(
                "classified pieces {start}..={end}: {} choices",
                choices.len()
            );
            self.cells[i] = Some(choices);
        }
        self.cells[i].as_deref().unwrap_or(&[])
    }

    /// Fill empty cells whose range bounding box was classified before.
    /// Returns the number of cells filled.
    pub fn prefill(&mut self, table: &BoundsMatchTable, pieces: &WordPieces) -> usize {
        if table.is_empty() {
            return 0;
        }
        let mut filled = 0;
        for start in 0..self.dimension {
            for end in start..self.dimension {
                if self.get(start, end).is_some() {
                    continue;
                }
                if let Some(choices) = table.get(&pieces.bounds_of_range(start, end)) {
                    self.put(start, end, choices.to_vec());
                    filled += 1;
                }
            }
        }
        filled
    }

    /// Copy every filled cell into `table`, keyed by its range bounding box.
    pub fn export(&self, table: &mut BoundsMatchTable, pieces: &WordPieces) {
        for start in 0..self.dimension {
            for end in start..self.dimension {
                if let Some(choices) = self.get(start, end) {
                    table.put(pieces.bounds_of_range(start, end), choices.to_vec());
                }
            }
        }
    }
}

/// Classifier results keyed by blob bounding box.
///
/// Owned by the caller and reused across several searches over the same
/// word, so a blob seen in one pass is not classified again in the next.
#[derive(Debug, Clone, Default)]
pub struct BoundsMatchTable {
    entries: HashMap<u64, Vec<BlobChoice>>,
}

impl BoundsMatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result. An existing entry for the same box is kept.
    pub fn put(&mut self, bbox: BoundingBox, choices: Vec<BlobChoice>) {
        self.entries.entry(bbox.key()).or_insert(choices);
    }

    pub fn get(&self, bbox: &BoundingBox) -> Option<&[BlobChoice]> {
        self.entries.get(&bbox.key()).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
