// Hyphen continuation across a line break.
//
// When the last word of a line is a dictionary prefix followed by a hyphen,
// the prefix and the dictionary traversals it reached are kept so that the
// first word of the next line is searched as a continuation.

use wordrec_core::choice::WordChoice;

use crate::ambigs::AmbigMatch;
use crate::dict::ActiveTraversal;

/// Whether stored hyphen state survives into a word, given whether the
/// previous and the current word end their lines.
///
/// State is kept only when moving from a line-final word to a word that is
/// not itself line-final.
pub fn keeps_hyphen_state(previous_last_word_on_line: bool, current_last_word_on_line: bool) -> bool {
    previous_last_word_on_line && !current_last_word_on_line
}

/// Stored continuation for the next word's dictionary search.
#[derive(Debug, Clone, Copy)]
pub struct HyphenSeed<'a> {
    /// Traversals reached by the prefix; the search starts here instead of
    /// at the dictionary roots.
    pub active: &'a [ActiveTraversal],
    /// Dangerous ambiguities found in the prefix. A continued word inherits
    /// them and is marked ambiguous.
    pub constraints: &'a [AmbigMatch],
    /// The prefix itself, without its hyphen.
    pub prefix: &'a WordChoice,
}

/// Per text flow; one word at a time, in reading order.
#[derive(Debug, Clone, Default)]
pub struct HyphenTracker {
    word: Option<WordChoice>,
    active: Vec<ActiveTraversal>,
    constraints: Vec<AmbigMatch>,
    last_word_on_line: bool,
}

impl HyphenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call before each word. Clears the stored state unless the previous
    /// word ended its line and this one does not. Returns whether state was
    /// cleared.
    pub fn reset_if_needed(&mut self, last_word_on_line: bool) -> bool {
        let keep = keeps_hyphen_state(self.last_word_on_line, last_word_on_line);
        self.last_word_on_line = last_word_on_line;
        if keep {
            return false;
        }
        let had_state = self.word.is_some();
        self.clear();
        had_state
    }

    /// Store a hyphenated prefix if it rates better than the stored one.
    ///
    /// `word` must end with the hyphen symbol; it is removed before storing.
    pub fn update(
        &mut self,
        word: &WordChoice,
        active: Vec<ActiveTraversal>,
        constraints: Vec<AmbigMatch>,
    ) -> bool {
        if self.word.as_ref().is_some_and(|stored| !word.improves_on(stored)) {
            return false;
        }
        let mut prefix = word.clone();
        prefix.remove_last();
        log::debug!(
            "hyphen: storing {}-symbol prefix with {} active traversals",
            prefix.len(),
            active.len()
        );
        self.word = Some(prefix);
        self.active = active;
        self.constraints = constraints;
        true
    }

    pub fn seed(&self) -> Option<HyphenSeed<'_>> {
        self.word.as_ref().map(|prefix| HyphenSeed {
            active: &self.active,
            constraints: &self.constraints,
            prefix,
        })
    }

    pub fn is_hyphenated(&self) -> bool {
        self.word.is_some()
    }

    /// Stored prefix, without its hyphen.
    pub fn word(&self) -> Option<&WordChoice> {
        self.word.as_ref()
    }

    pub fn clear(&mut self) {
        self.word = None;
        self.active.clear();
        self.constraints.clear();
    }
}
