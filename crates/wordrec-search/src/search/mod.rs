//! Best-first search over segmentations of one word.
//!
//! A segmentation is a [`SegState`]: which seams between the word's pieces
//! are revealed. The search starts fully split, pops the cheapest state,
//! classifies its blobs through the [`RatingsMatrix`], evaluates the word
//! against the dictionary and pushes every single-seam toggle not yet
//! explored. The best dictionary word and the best raw word only ever
//! improve.

mod lattice;
pub mod state;

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::HashSet;
use wordrec_core::choice::{BlobChoice, Permuter, WordChoice};
use wordrec_core::symbols::SymbolId;

use crate::Classifier;
use crate::ambigs::{AmbigKind, AmbigMatch, AmbigTable};
use crate::dict::{ActiveTraversal, Dictionary};
use crate::hyphen::HyphenSeed;
use crate::pieces::{Seam, WordPieces};
use crate::ratings::RatingsMatrix;

use self::lattice::Lattice;
pub use self::state::{MAX_PIECES, MAX_SEAMS, SegState};

/// Search tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Most states popped from the open set. Default: 30.
    pub max_states: usize,
    /// Classifier choices considered per blob. Default: 5.
    pub max_choices_per_position: usize,
    /// Penalty for each revealed seam. Default: 0.5.
    pub split_cost: f32,
    /// Weight of a revealed seam's own priority. Default: 0.1.
    pub seam_priority_weight: f32,
    /// Stop once the best dictionary word is unambiguous and at least this
    /// certain. Default: -1.25.
    pub accept_certainty: f32,
    /// Soft limit on lattice nodes visited per state. Default: 10 000.
    pub max_lattice_nodes: usize,
    /// Text of the hyphen symbol. Default: "-".
    pub hyphen: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_states: 30,
            max_choices_per_position: 5,
            split_cost: 0.5,
            seam_priority_weight: 0.1,
            accept_certainty: -1.25,
            max_lattice_nodes: 10_000,
            hyphen: "-".to_string(),
        }
    }
}

/// Why a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No unexplored state left.
    Exhausted,
    /// `max_states` reached.
    MaxStates,
    /// The best word was good enough.
    Accepted,
}

/// Read-only inputs shared by every search of a language.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    pub dictionary: &'a Dictionary,
    pub ambigs: &'a AmbigTable,
    pub options: &'a SearchOptions,
    /// Hyphen symbol id, if the vocabulary has one.
    pub hyphen: Option<SymbolId>,
}

/// Per-word inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchRequest<'a> {
    /// Continuation of a hyphenated word from the previous line.
    pub seed: Option<HyphenSeed<'a>>,
    pub last_word_on_line: bool,
}

/// Result of one word search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best dictionary word, or the raw choice if no word matched.
    pub best_choice: WordChoice,
    /// Best top-choice reading, ignoring the dictionary.
    pub raw_choice: WordChoice,
    /// Segmentation of `best_choice`.
    pub best_state: SegState,
    pub states_explored: usize,
    pub classifier_calls: usize,
    pub stop_reason: StopReason,
    /// Dictionary traversals after `best_choice` (after its prefix for a
    /// hyphenated word).
    pub final_traversals: Vec<ActiveTraversal>,
    /// Ambiguity rules applied in `best_choice`.
    pub ambiguities: Vec<AmbigMatch>,
}

impl SearchOutcome {
    /// Inclusive piece ranges of the blobs of `best_choice`.
    pub fn best_ranges(&self) -> Vec<(usize, usize)> {
        self.best_state.ranges()
    }

    /// Whether `best_choice` came from the dictionary.
    pub fn is_dictionary_word(&self) -> bool {
        matches!(
            self.best_choice.permuter,
            Permuter::Dictionary | Permuter::HyphenPrefix
        )
    }

    /// Dangerous ambiguities of `best_choice`, for hyphen continuation.
    pub fn dangerous_ambiguities(&self) -> Vec<AmbigMatch> {
        self.ambiguities
            .iter()
            .filter(|m| m.kind == AmbigKind::Dangerous)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    priority: f32,
    state: SegState,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Reversed: BinaryHeap pops the cheapest state first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.state.bits().cmp(&self.state.bits()))
    }
}

/// Search state for one word: open and closed sets, the ratings cache and
/// the best choices so far.
#[derive(Debug, Clone)]
pub struct SearchRecord {
    open: BinaryHeap<Candidate>,
    closed: HashSet<SegState>,
    ratings: RatingsMatrix,
    num_seams: usize,
    best_choice: WordChoice,
    best_state: Option<SegState>,
    best_traversals: Vec<ActiveTraversal>,
    best_ambiguities: Vec<AmbigMatch>,
    raw_choice: WordChoice,
    raw_state: Option<SegState>,
    states_explored: usize,
    lattice_nodes: usize,
}

impl SearchRecord {
    /// Empty record for a word of `num_pieces` pieces.
    pub fn new(num_pieces: usize) -> Self {
        assert!(
            (1..=MAX_PIECES).contains(&num_pieces),
            "a word has 1 to {MAX_PIECES} pieces, got {num_pieces}"
        );
        Self {
            open: BinaryHeap::new(),
            closed: HashSet::new(),
            ratings: RatingsMatrix::new(num_pieces),
            num_seams: num_pieces - 1,
            best_choice: WordChoice::bad(),
            best_state: None,
            best_traversals: Vec::new(),
            best_ambiguities: Vec::new(),
            raw_choice: WordChoice::bad(),
            raw_state: None,
            states_explored: 0,
            lattice_nodes: 0,
        }
    }

    pub fn ratings(&self) -> &RatingsMatrix {
        &self.ratings
    }

    pub fn ratings_mut(&mut self) -> &mut RatingsMatrix {
        &mut self.ratings
    }

    /// Run the search to completion and report the best choices.
    pub fn run<C: Classifier + ?Sized>(
        &mut self,
        ctx: &SearchContext<'_>,
        request: &SearchRequest<'_>,
        pieces: &mut WordPieces,
        seams: &[Seam],
        classifier: &C,
    ) -> SearchOutcome {
        assert_eq!(pieces.num_pieces(), self.num_seams + 1, "record built for another word");
        assert_eq!(seams.len(), self.num_seams, "expected one seam between each pair of pieces");

        let start: Vec<ActiveTraversal> = match request.seed {
            Some(seed) => seed.active.to_vec(),
            None => ctx.dictionary.initial_traversals(),
        };
        let inherited_ambiguous = request.seed.is_some_and(|s| !s.constraints.is_empty());
        let hyphen = if request.last_word_on_line { ctx.hyphen } else { None };

        let initial = SegState::fully_split(self.num_seams);
        if !self.closed.contains(&initial) {
            self.open.push(Candidate {
                priority: 0.0,
                state: initial,
            });
        }

        let stop = loop {
            let Some(Candidate { state, .. }) = self.open.pop() else {
                break StopReason::Exhausted;
            };
            if !self.closed.insert(state) {
                continue;
            }
            self.states_explored += 1;
            let dead = self.evaluate(ctx, state, &start, inherited_ambiguous, hyphen, pieces, seams, classifier);
            if self.accepted(ctx.options) {
                break StopReason::Accepted;
            }
            if self.states_explored >= ctx.options.max_states {
                break StopReason::MaxStates;
            }
            self.expand(ctx.options, state, dead, seams);
        };
        log::debug!(
            "search: {:?} after {} states, {} classifier calls, {} lattice nodes, best rating {}",
            stop,
            self.states_explored,
            self.ratings.classifier_calls(),
            self.lattice_nodes,
            self.best_choice.rating
        );
        self.outcome(stop)
    }

    /// Classify and score one state. Returns the first blob range with no
    /// classifier choice, if any.
    #[allow(clippy::too_many_arguments)]
    fn evaluate<C: Classifier + ?Sized>(
        &mut self,
        ctx: &SearchContext<'_>,
        state: SegState,
        start: &[ActiveTraversal],
        inherited_ambiguous: bool,
        hyphen: Option<SymbolId>,
        pieces: &mut WordPieces,
        seams: &[Seam],
        classifier: &C,
    ) -> Option<(usize, usize)> {
        let k = ctx.options.max_choices_per_position.max(1);
        let mut positions: Vec<Vec<BlobChoice>> = Vec::new();
        for (s, e) in state.ranges() {
            let choices = self.ratings.get_rating(pieces, seams, classifier, s, e);
            if choices.is_empty() {
                log::trace!("search: no choice for pieces {s}..={e}");
                return Some((s, e));
            }
            positions.push(choices[..choices.len().min(k)].to_vec());
        }
        let penalty = segmentation_penalty(ctx.options, state, seams);
        let lattice = Lattice {
            positions: &positions,
            dictionary: ctx.dictionary,
            ambigs: ctx.ambigs,
            hyphen,
            max_nodes: ctx.options.max_lattice_nodes,
        };

        if let Some(mut raw) = lattice.raw_choice() {
            raw.rating += penalty;
            if raw.improves_on(&self.raw_choice) {
                self.raw_choice = raw;
                self.raw_state = Some(state);
            }
        }

        let bound = if self.best_choice.is_bad() {
            f32::MAX
        } else {
            self.best_choice.rating - penalty
        };
        let (found, nodes) = lattice.best_word(start, inherited_ambiguous, bound);
        self.lattice_nodes += nodes;
        if let Some(mut found) = found {
            found.word.rating += penalty;
            if found.word.improves_on(&self.best_choice) {
                log::trace!("search: new best rating {} in state {:#b}", found.word.rating, state.bits());
                self.best_choice = found.word;
                self.best_state = Some(state);
                self.best_traversals = found.final_traversals;
                self.best_ambiguities = found.ambiguities;
            }
        }
        None
    }

    fn accepted(&self, options: &SearchOptions) -> bool {
        !self.best_choice.is_bad()
            && !self.best_choice.ambiguous
            && self.best_choice.certainty >= options.accept_certainty
    }

    /// Push every single-seam toggle of `state` not explored yet. With a
    /// dead range, only toggles of the seams bounding or inside it.
    fn expand(&mut self, options: &SearchOptions, state: SegState, dead: Option<(usize, usize)>, seams: &[Seam]) {
        if self.num_seams == 0 {
            return;
        }
        let toggles = match dead {
            Some((s, e)) => s.saturating_sub(1)..(e + 1).min(self.num_seams),
            None => 0..self.num_seams,
        };
        for seam in toggles {
            let next = state.toggle(seam);
            if self.closed.contains(&next) {
                continue;
            }
            if let Some(priority) = self.priority(options, next, seams) {
                self.open.push(Candidate { priority, state: next });
            }
        }
    }

    /// Known best ratings of the state's blobs plus its segmentation
    /// penalty, or `None` if one of its blobs is known to be dead.
    fn priority(&self, options: &SearchOptions, state: SegState, seams: &[Seam]) -> Option<f32> {
        let mut total = segmentation_penalty(options, state, seams);
        for (s, e) in state.ranges() {
            match self.ratings.get(s, e) {
                Some([]) => return None,
                Some(choices) => total += choices[0].rating,
                None => {}
            }
        }
        Some(total)
    }

    fn outcome(&self, stop_reason: StopReason) -> SearchOutcome {
        let fallback = SegState::fully_split(self.num_seams);
        let (best_choice, best_state, final_traversals, ambiguities) = match self.best_state {
            Some(state) => (
                self.best_choice.clone(),
                state,
                self.best_traversals.clone(),
                self.best_ambiguities.clone(),
            ),
            None => (
                self.raw_choice.clone(),
                self.raw_state.unwrap_or(fallback),
                Vec::new(),
                Vec::new(),
            ),
        };
        SearchOutcome {
            best_choice,
            raw_choice: self.raw_choice.clone(),
            best_state,
            states_explored: self.states_explored,
            classifier_calls: self.ratings.classifier_calls(),
            stop_reason,
            final_traversals,
            ambiguities,
        }
    }
}

/// Cost of the revealed seams of `state`.
pub fn segmentation_penalty(options: &SearchOptions, state: SegState, seams: &[Seam]) -> f32 {
    seams
        .iter()
        .enumerate()
        .filter(|&(x, _)| state.is_revealed(x))
        .map(|(_, seam)| options.split_cost + options.seam_priority_weight * seam.priority)
        .sum()
}
