// Segmentation hypotheses as seam bit masks.

/// Most seams one word may have.
pub const MAX_SEAMS: usize = 64;

/// Most pieces one word may have.
pub const MAX_PIECES: usize = MAX_SEAMS + 1;

/// One grouping of a word's pieces: bit `x` set means seam `x` is revealed,
/// so pieces `x` and `x + 1` belong to different blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegState {
    bits: u64,
    num_seams: usize,
}

impl SegState {
    /// Every seam revealed: one blob per piece.
    pub fn fully_split(num_seams: usize) -> Self {
        assert!(num_seams <= MAX_SEAMS, "{num_seams} seams exceed {MAX_SEAMS}");
        let bits = if num_seams == MAX_SEAMS {
            u64::MAX
        } else {
            (1u64 << num_seams) - 1
        };
        Self { bits, num_seams }
    }

    /// Every seam hidden: the whole word is one blob.
    pub fn fully_joined(num_seams: usize) -> Self {
        assert!(num_seams <= MAX_SEAMS, "{num_seams} seams exceed {MAX_SEAMS}");
        Self { bits: 0, num_seams }
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn num_seams(&self) -> usize {
        self.num_seams
    }

    pub fn is_revealed(&self, seam: usize) -> bool {
        seam < self.num_seams && self.bits & (1 << seam) != 0
    }

    /// The same state with seam `seam` flipped.
    pub fn toggle(&self, seam: usize) -> Self {
        assert!(seam < self.num_seams, "seam {seam} outside 0..{}", self.num_seams);
        Self {
            bits: self.bits ^ (1 << seam),
            num_seams: self.num_seams,
        }
    }

    pub fn num_revealed(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Inclusive piece ranges of the blobs, left to right.
    pub fn ranges(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.num_revealed() + 1);
        let mut start = 0;
        for seam in 0..self.num_seams {
            if self.is_revealed(seam) {
                out.push((start, seam));
                start = seam + 1;
            }
        }
        out.push((start, self.num_seams));
        out
    }
}
