// Classifier choices and word choices.

use std::cmp::Ordering;

use crate::symbols::{SymbolId, SymbolSet};

/// One candidate returned by the classifier for a blob.
///
/// `rating` is a distance (lower is better, non-negative). `certainty` is a
/// log-like confidence (0 is best, more negative is worse).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobChoice {
    pub symbol: SymbolId,
    pub rating: f32,
    pub certainty: f32,
}

impl BlobChoice {
    pub const fn new(symbol: SymbolId, rating: f32, certainty: f32) -> Self {
        Self {
            symbol,
            rating,
            certainty,
        }
    }

    /// Best-first ordering: lower rating first, ties broken by higher
    /// certainty.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.rating
            .total_cmp(&other.rating)
            .then_with(|| other.certainty.total_cmp(&self.certainty))
    }
}

/// Sort a classifier result list best-first in place.
pub fn sort_choices(choices: &mut [BlobChoice]) {
    choices.sort_by(BlobChoice::rank_cmp);
}

/// Which evaluator produced a word choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Permuter {
    /// Not produced by any evaluator (an empty or bad choice).
    #[default]
    NoPermuter,
    /// Top classifier choice per position, ignoring the dictionary.
    TopChoice,
    /// A complete dictionary word.
    Dictionary,
    /// A dictionary prefix followed by a line-final hyphen.
    HyphenPrefix,
}

/// A candidate word: a symbol sequence with accumulated scores.
#[derive(Debug, Clone, PartialEq)]
pub struct WordChoice {
    pub symbols: Vec<SymbolId>,
    /// Sum of per-position ratings plus any penalties (lower is better).
    pub rating: f32,
    /// Minimum per-position certainty.
    pub certainty: f32,
    pub permuter: Permuter,
    /// Set when an ambiguity rule that is not definite was applied, or a
    /// dangerous ambiguity was inherited from a hyphenated prefix.
    pub ambiguous: bool,
}

impl Default for WordChoice {
    fn default() -> Self {
        Self::new(Permuter::NoPermuter)
    }
}

impl WordChoice {
    /// An empty word with zero rating.
    pub fn new(permuter: Permuter) -> Self {
        Self {
            symbols: Vec::new(),
            rating: 0.0,
            certainty: 0.0,
            permuter,
            ambiguous: false,
        }
    }

    /// A placeholder that any real choice improves on.
    pub fn bad() -> Self {
        Self {
            rating: f32::MAX,
            certainty: f32::MIN,
            ..Self::new(Permuter::NoPermuter)
        }
    }

    pub fn is_bad(&self) -> bool {
        self.rating == f32::MAX
    }

    /// Append one position.
    pub fn push(&mut self, symbol: SymbolId, rating: f32, certainty: f32) {
        self.symbols.push(symbol);
        self.rating += rating;
        self.certainty = if self.symbols.len() == 1 {
            certainty
        } else {
            self.certainty.min(certainty)
        };
    }

    pub fn push_choice(&mut self, choice: &BlobChoice) {
        self.push(choice.symbol, choice.rating, choice.certainty);
    }

    /// Remove the last symbol. Rating and certainty are left unchanged.
    pub fn remove_last(&mut self) -> Option<SymbolId> {
        self.symbols.pop()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn last_symbol(&self) -> Option<SymbolId> {
        self.symbols.last().copied()
    }

    /// Strictly better (lower rating) than `other`.
    pub fn improves_on(&self, other: &WordChoice) -> bool {
        self.rating < other.rating
    }

    pub fn text(&self, symbols: &SymbolSet) -> String {
        symbols.render(&self.symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_choices_best_first() {
        let mut choices = vec![
            BlobChoice::new(0, 3.0, -2.0),
            BlobChoice::new(1, 1.0, -1.0),
            BlobChoice::new(2, 1.0, -0.5),
        ];
        sort_choices(&mut choices);
        let order: Vec<SymbolId> = choices.iter().map(|c| c.symbol).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn push_accumulates_rating_and_min_certainty() {
        let mut word = WordChoice::new(Permuter::TopChoice);
        word.push(0, 1.5, -0.5);
        word.push(1, 2.0, -3.0);
        word.push(2, 0.5, -1.0);
        assert_eq!(word.len(), 3);
        assert!((word.rating - 4.0).abs() < 1e-6);
        assert_eq!(word.certainty, -3.0);
        assert_eq!(word.last_symbol(), Some(2));
    }

    #[test]
    fn bad_choice_loses_to_anything() {
        let bad = WordChoice::bad();
        assert!(bad.is_bad());
        let mut word = WordChoice::new(Permuter::Dictionary);
        word.push(0, 100.0, -20.0);
        assert!(word.improves_on(&bad));
        assert!(!bad.improves_on(&word));
    }

    #[test]
    fn equal_rating_is_not_an_improvement() {
        let mut a = WordChoice::new(Permuter::Dictionary);
        a.push(0, 1.0, -1.0);
        let b = a.clone();
        assert!(!a.improves_on(&b));
    }

    #[test]
    fn remove_last_and_text() {
        let set = SymbolSet::from_symbols(["b", "a", "s", "e", "-"]);
        let mut word = WordChoice::new(Permuter::HyphenPrefix);
        for id in set.encode("base-").unwrap() {
            word.push(id, 1.0, -1.0);
        }
        assert_eq!(word.remove_last(), set.id_of("-"));
        assert_eq!(word.text(&set), "base");
    }
}
