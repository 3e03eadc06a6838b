// Piece/seam manager: reversible joining of adjacent outline pieces.
//
// All outline points of a word live in one arena. Each outline is a closed
// ring of points; the outlines of one piece form a chain. Joining a range
// hides the edges along its seams (a counter per point, no unlinking) and
// splices the chains of the range together so that one traversal from the
// first piece covers the merged blob. Breaking undoes both.

use wordrec_core::geometry::{BoundingBox, Point};

/// Index of a point in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointId(pub u32);

/// Index of an outline in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutlineId(pub u32);

#[derive(Debug, Clone)]
struct EdgePoint {
    pos: Point,
    /// Next point of the ring.
    next: PointId,
    /// Number of seams currently hiding the edge that leaves this point.
    hide_count: u16,
}

#[derive(Debug, Clone)]
struct Outline {
    first: PointId,
    next: Option<OutlineId>,
    piece: usize,
}

#[derive(Debug, Clone)]
struct Piece {
    outline: Option<OutlineId>,
    bbox: BoundingBox,
}

/// Two points, one on each side of a seam, where the pieces may be
/// split or joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPair {
    pub point1: PointId,
    pub point2: PointId,
}

impl SplitPair {
    pub fn new(point1: PointId, point2: PointId) -> Self {
        Self { point1, point2 }
    }
}

/// Where pieces `x` and `x + 1` meet.
///
/// `widthp` and `widthn` say how many further pieces to the right and left
/// the seam's splits reach: the seam is only hidden when a joined range
/// covers all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Seam {
    splits: Vec<SplitPair>,
    pub widthp: usize,
    pub widthn: usize,
    /// Cost of keeping this seam split (higher is worse).
    pub priority: f32,
}

impl Seam {
    /// A seam with 1 to 3 splits. Panics on any other count.
    pub fn new(splits: Vec<SplitPair>, priority: f32) -> Self {
        assert!(
            (1..=3).contains(&splits.len()),
            "a seam has 1 to 3 splits, got {}",
            splits.len()
        );
        Self {
            splits,
            widthp: 0,
            widthn: 0,
            priority,
        }
    }

    pub fn with_widths(mut self, widthn: usize, widthp: usize) -> Self {
        self.widthn = widthn;
        self.widthp = widthp;
        self
    }

    pub fn splits(&self) -> &[SplitPair] {
        &self.splits
    }
}

/// Builds the point arena for one word, piece by piece, left to right.
#[derive(Debug, Default)]
pub struct WordPiecesBuilder {
    points: Vec<EdgePoint>,
    outlines: Vec<Outline>,
    pieces: Vec<Piece>,
}

impl WordPiecesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a piece made of the given closed rings and return its index.
    /// Empty rings are ignored.
    pub fn add_piece(&mut self, rings: &[&[Point]]) -> usize {
        let index = self.pieces.len();
        let mut head: Option<OutlineId> = None;
        let mut tail: Option<OutlineId> = None;
        let mut bbox: Option<BoundingBox> = None;
        for ring in rings.iter().filter(|r| !r.is_empty()) {
            let base = self.points.len() as u32;
            for (i, &pos) in ring.iter().enumerate() {
                let next = base + ((i + 1) % ring.len()) as u32;
                self.points.push(EdgePoint {
                    pos,
                    next: PointId(next),
                    hide_count: 0,
                });
                match bbox.as_mut() {
                    Some(b) => b.include(pos),
                    None => bbox = Some(BoundingBox::from_point(pos)),
                }
            }
            let id = OutlineId(self.outlines.len() as u32);
            self.outlines.push(Outline {
                first: PointId(base),
                next: None,
                piece: index,
            });
            match tail {
                Some(t) => self.outlines[t.0 as usize].next = Some(id),
                None => head = Some(id),
            }
            tail = Some(id);
        }
        self.pieces.push(Piece {
            outline: head,
            bbox: bbox.unwrap_or(BoundingBox::new(0, 0, 0, 0)),
        });
        index
    }

    pub fn build(self) -> WordPieces {
        let seams = self.pieces.len().saturating_sub(1);
        WordPieces {
            points: self.points,
            outlines: self.outlines,
            pieces: self.pieces,
            seam_hidden: vec![false; seams],
            joined: None,
        }
    }
}

/// The pieces of one word and their shared outline arena.
#[derive(Debug, Clone)]
pub struct WordPieces {
    points: Vec<EdgePoint>,
    outlines: Vec<Outline>,
    pieces: Vec<Piece>,
    seam_hidden: Vec<bool>,
    joined: Option<(usize, usize)>,
}

impl WordPieces {
    pub fn num_pieces(&self) -> usize {
        self.pieces.len()
    }

    pub fn piece_bounds(&self, piece: usize) -> BoundingBox {
        self.pieces[piece].bbox
    }

    /// Union bounding box of pieces `start..=end`.
    pub fn bounds_of_range(&self, start: usize, end: usize) -> BoundingBox {
        self.check_range(start, end);
        self.pieces[start + 1..=end]
            .iter()
            .fold(self.pieces[start].bbox, |acc, p| acc.union(&p.bbox))
    }

    /// First point of `piece` located at `pos`, for building seams.
    pub fn point_at(&self, piece: usize, pos: Point) -> Option<PointId> {
        let mut outline = self.pieces[piece].outline;
        while let Some(id) = outline {
            let o = &self.outlines[id.0 as usize];
            if o.piece != piece {
                break;
            }
            if let Some(p) = self.ring(o.first).find(|&p| self.points[p.0 as usize].pos == pos) {
                return Some(p);
            }
            outline = o.next;
        }
        None
    }

    pub fn point_pos(&self, point: PointId) -> Point {
        self.points[point.0 as usize].pos
    }

    /// Whether the edge leaving `point` is hidden.
    pub fn is_hidden(&self, point: PointId) -> bool {
        self.points[point.0 as usize].hide_count > 0
    }

    /// Currently joined range, if any.
    pub fn joined(&self) -> Option<(usize, usize)> {
        self.joined
    }

    pub fn is_seam_hidden(&self, seam: usize) -> bool {
        self.seam_hidden[seam]
    }

    fn check_range(&self, start: usize, end: usize) {
        assert!(
            start <= end && end < self.pieces.len(),
            "piece range {start}..={end} outside 0..{}",
            self.pieces.len()
        );
    }

    fn check_seams(&self, seams: &[Seam]) {
        assert_eq!(
            seams.len(),
            self.pieces.len().saturating_sub(1),
            "expected one seam between each pair of pieces"
        );
    }

    /// Present pieces `start..=end` as one blob.
    ///
    /// Seams inside the range whose splits stay within it are hidden and the
    /// outline chains are spliced. Must be undone by [`break_pieces`] with
    /// the same range before another join.
    ///
    /// [`break_pieces`]: WordPieces::break_pieces
    pub fn join(&mut self, seams: &[Seam], start: usize, end: usize) {
        self.check_range(start, end);
        self.check_seams(seams);
        assert!(
            self.joined.is_none(),
            "join {start}..={end} while {:?} is still joined",
            self.joined
        );
        for x in start..end {
            let seam = &seams[x];
            if x >= start + seam.widthn && x + seam.widthp < end {
                self.hide_seam(seams, x);
            }
            let tail = self.chain_tail(x);
            let next_head = self.pieces[x + 1].outline;
            if let Some(tail) = tail {
                self.outlines[tail.0 as usize].next = next_head;
            }
        }
        self.joined = Some((start, end));
    }

    /// Undo [`join`](WordPieces::join) for the same range.
    pub fn break_pieces(&mut self, seams: &[Seam], start: usize, end: usize) {
        assert_eq!(
            self.joined,
            Some((start, end)),
            "break of {start}..={end} does not match the current join"
        );
        for x in start..end {
            if self.seam_hidden[x] {
                self.reveal_seam(seams, x);
            }
        }
        for x in start..=end {
            if let Some(tail) = self.chain_tail(x) {
                self.outlines[tail.0 as usize].next = None;
            }
        }
        self.joined = None;
    }

    /// Hide every split of seam `x`. Panics if it is already hidden.
    pub fn hide_seam(&mut self, seams: &[Seam], x: usize) {
        assert!(!self.seam_hidden[x], "seam {x} is already hidden");
        for split in seams[x].splits() {
            self.walk_edge_pair(split.point1, split.point2, true);
        }
        self.seam_hidden[x] = true;
    }

    /// Reveal every split of seam `x`. Panics if it is not hidden.
    pub fn reveal_seam(&mut self, seams: &[Seam], x: usize) {
        assert!(self.seam_hidden[x], "seam {x} is not hidden");
        for split in seams[x].splits() {
            self.walk_edge_pair(split.point1, split.point2, false);
        }
        self.seam_hidden[x] = false;
    }

    /// From each point of the pair, walk its ring up to the position of the
    /// other point, hiding (or revealing) every edge passed.
    fn walk_edge_pair(&mut self, pt1: PointId, pt2: PointId, hide: bool) {
        for (from, to) in [(pt1, pt2), (pt2, pt1)] {
            let target = self.point_pos(to);
            let mut p = from;
            loop {
                let point = &mut self.points[p.0 as usize];
                if hide {
                    point.hide_count += 1;
                } else {
                    point.hide_count = point.hide_count.saturating_sub(1);
                }
                p = point.next;
                if p == from || self.point_pos(p) == target {
                    break;
                }
            }
        }
    }

    /// Last outline of the chain belonging to `piece`.
    fn chain_tail(&self, piece: usize) -> Option<OutlineId> {
        let mut tail = self.pieces[piece].outline?;
        while let Some(next) = self.outlines[tail.0 as usize].next {
            if self.outlines[next.0 as usize].piece != piece {
                break;
            }
            tail = next;
        }
        Some(tail)
    }

    fn ring(&self, first: PointId) -> RingIter<'_> {
        RingIter {
            pieces: self,
            first,
            current: Some(first),
        }
    }

    /// Read-only view of the blob starting at piece `start`: the piece
    /// alone, or the whole joined range when `start` begins it.
    pub fn blob(&self, start: usize) -> Blob<'_> {
        let end = match self.joined {
            Some((s, e)) if s == start => e,
            _ => start,
        };
        Blob {
            pieces: self,
            start,
            end,
        }
    }
}

struct RingIter<'a> {
    pieces: &'a WordPieces,
    first: PointId,
    current: Option<PointId>,
}

impl Iterator for RingIter<'_> {
    type Item = PointId;

    fn next(&mut self) -> Option<PointId> {
        let p = self.current?;
        let next = self.pieces.points[p.0 as usize].next;
        self.current = (next != self.first).then_some(next);
        Some(p)
    }
}

/// What the classifier sees: one or more joined pieces.
#[derive(Clone, Copy)]
pub struct Blob<'a> {
    pieces: &'a WordPieces,
    start: usize,
    end: usize,
}

impl<'a> Blob<'a> {
    /// First and last piece of the blob.
    pub fn range(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub fn num_pieces(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.pieces.bounds_of_range(self.start, self.end)
    }

    /// Outlines reached by following the chain from the first piece.
    pub fn outlines(&self) -> Vec<OutlineId> {
        let mut out = Vec::new();
        let mut outline = self.pieces.pieces[self.start].outline;
        while let Some(id) = outline {
            let o = &self.pieces.outlines[id.0 as usize];
            if o.piece > self.end {
                break;
            }
            out.push(id);
            outline = o.next;
        }
        out
    }

    /// Points of one outline with the visibility of the edge leaving each.
    pub fn points(&self, outline: OutlineId) -> Vec<(Point, bool)> {
        let first = self.pieces.outlines[outline.0 as usize].first;
        self.pieces
            .ring(first)
            .map(|p| (self.pieces.point_pos(p), !self.pieces.is_hidden(p)))
            .collect()
    }

    /// Number of visible edges over all outlines of the blob.
    pub fn visible_edges(&self) -> usize {
        self.outlines()
            .into_iter()
            .map(|o| self.points(o).iter().filter(|(_, visible)| *visible).count())
            .sum()
    }
}

impl std::fmt::Debug for Blob<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("bbox", &self.bounding_box())
            .finish()
    }
}

/// Pieces laid out as unit-height boxes side by side, with one single-split
/// seam between neighbours. Used by tests and benchmarks.
pub fn box_row(widths: &[i16], height: i16) -> (WordPieces, Vec<Seam>) {
    let mut builder = WordPiecesBuilder::new();
    let mut x0 = 0i16;
    let mut edges = Vec::with_capacity(widths.len());
    for &w in widths {
        let x1 = x0 + w;
        let ring = [
            Point::new(x0, 0),
            Point::new(x1, 0),
            Point::new(x1, height),
            Point::new(x0, height),
        ];
        builder.add_piece(&[&ring]);
        edges.push((x0, x1));
        x0 = x1;
    }
    let pieces = builder.build();
    let mut seams = Vec::with_capacity(widths.len().saturating_sub(1));
    for i in 0..widths.len().saturating_sub(1) {
        let x = edges[i].1;
        let left = pieces.point_at(i, Point::new(x, 0));
        let right = pieces.point_at(i + 1, Point::new(x, height));
        if let (Some(p1), Some(p2)) = (left, right) {
            seams.push(Seam::new(vec![SplitPair::new(p1, p2)], 1.0));
        }
    }
    (pieces, seams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_row_builds_seams_between_neighbours() {
        let (pieces, seams) = box_row(&[10, 10, 10], 20);
        assert_eq!(pieces.num_pieces(), 3);
        assert_eq!(seams.len(), 2);
        assert_eq!(pieces.piece_bounds(1), BoundingBox::new(10, 0, 20, 20));
        assert_eq!(pieces.bounds_of_range(0, 2), BoundingBox::new(0, 0, 30, 20));
    }

    #[test]
    fn join_hides_inner_seams_and_splices_chain() {
        let (mut pieces, seams) = box_row(&[10, 10, 10], 20);
        pieces.join(&seams, 0, 2);
        assert!(pieces.is_seam_hidden(0));
        assert!(pieces.is_seam_hidden(1));
        let blob = pieces.blob(0);
        assert_eq!(blob.num_pieces(), 3);
        assert_eq!(blob.outlines().len(), 3);
        // 12 edges, of which each seam hides one on each side.
        assert_eq!(blob.visible_edges(), 8);
        assert_eq!(blob.bounding_box(), BoundingBox::new(0, 0, 30, 20));
        pieces.break_pieces(&seams, 0, 2);
        assert!(!pieces.is_seam_hidden(0));
        assert_eq!(pieces.blob(0).outlines().len(), 1);
        assert_eq!(pieces.blob(0).visible_edges(), 4);
        assert_eq!(pieces.joined(), None);
    }

    #[test]
    fn join_respects_seam_widths() {
        let (mut pieces, mut seams) = box_row(&[10, 10, 10], 20);
        // Seam 1 reaches one piece further right than the range allows.
        seams[1] = seams[1].clone().with_widths(0, 1);
        pieces.join(&seams, 0, 2);
        assert!(pieces.is_seam_hidden(0));
        assert!(!pieces.is_seam_hidden(1));
        pieces.break_pieces(&seams, 0, 2);
    }

    #[test]
    fn break_restores_every_point() {
        let (mut pieces, seams) = box_row(&[5, 7, 9, 4], 12);
        let before: Vec<bool> = (0..pieces.points.len() as u32)
            .map(|i| pieces.is_hidden(PointId(i)))
            .collect();
        for (s, e) in [(0, 3), (1, 2), (2, 3), (0, 0)] {
            pieces.join(&seams, s, e);
            pieces.break_pieces(&seams, s, e);
        }
        let after: Vec<bool> = (0..pieces.points.len() as u32)
            .map(|i| pieces.is_hidden(PointId(i)))
            .collect();
        assert_eq!(before, after);
        for piece in 0..4 {
            assert_eq!(pieces.blob(piece).outlines().len(), 1);
        }
    }

    #[test]
    fn multi_outline_piece_keeps_its_chain() {
        let mut builder = WordPiecesBuilder::new();
        let outer = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        let hole = [Point::new(3, 3), Point::new(3, 6), Point::new(6, 6)];
        builder.add_piece(&[&outer, &hole]);
        builder.add_piece(&[&[
            Point::new(10, 0),
            Point::new(20, 0),
            Point::new(20, 10),
            Point::new(10, 10),
        ]]);
        let mut pieces = builder.build();
        let p1 = pieces.point_at(0, Point::new(10, 0)).unwrap();
        let p2 = pieces.point_at(1, Point::new(10, 10)).unwrap();
        let seams = vec![Seam::new(vec![SplitPair::new(p1, p2)], 0.0)];
        assert_eq!(pieces.blob(0).outlines().len(), 2);
        pieces.join(&seams, 0, 1);
        assert_eq!(pieces.blob(0).outlines().len(), 3);
        pieces.break_pieces(&seams, 0, 1);
        assert_eq!(pieces.blob(0).outlines().len(), 2);
        assert_eq!(pieces.blob(1).outlines().len(), 1);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn join_out_of_range_panics() {
        let (mut pieces, seams) = box_row(&[10, 10], 20);
        pieces.join(&seams, 1, 2);
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn break_without_join_panics() {
        let (mut pieces, seams) = box_row(&[10, 10], 20);
        pieces.break_pieces(&seams, 0, 1);
    }

    #[test]
    #[should_panic(expected = "not hidden")]
    fn reveal_unhidden_seam_panics() {
        let (mut pieces, seams) = box_row(&[10, 10], 20);
        pieces.reveal_seam(&seams, 0);
    }

    #[test]
    #[should_panic(expected = "already hidden")]
    fn double_hide_panics() {
        let (mut pieces, seams) = box_row(&[10, 10], 20);
        pieces.hide_seam(&seams, 0);
        pieces.hide_seam(&seams, 0);
    }

    #[test]
    #[should_panic(expected = "still joined")]
    fn nested_join_panics() {
        let (mut pieces, seams) = box_row(&[10, 10, 10], 20);
        pieces.join(&seams, 0, 1);
        pieces.join(&seams, 1, 2);
    }
}
