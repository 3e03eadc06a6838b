// Dictionary evaluation of one segmentation.
//
// Each blob of the segmentation is one position with a short list of
// classifier choices. The best dictionary word is found by depth-first
// branch and bound over the positions, carrying the active dictionary
// traversals along. Ambiguity rules whose wrong sequence can be read at a
// position contribute their correction fragments, one per position, so the
// number of positions never changes. The dictionary only sees the correct
// symbols once the last fragment has been consumed.

use wordrec_core::choice::{BlobChoice, Permuter, WordChoice};
use wordrec_core::symbols::SymbolId;

use crate::ambigs::{AmbigKind, AmbigMatch, AmbigRule, AmbigTable, MAX_AMBIG_SIZE};
use crate::dict::{ActiveTraversal, Dictionary};

/// Best word found for one segmentation.
#[derive(Debug, Clone)]
pub(crate) struct LatticeMatch {
    pub word: WordChoice,
    /// Traversals after the word, or after the prefix for a hyphenated word.
    pub final_traversals: Vec<ActiveTraversal>,
    pub ambiguities: Vec<AmbigMatch>,
}

pub(crate) struct Lattice<'a> {
    pub positions: &'a [Vec<BlobChoice>],
    pub dictionary: &'a Dictionary,
    pub ambigs: &'a AmbigTable,
    /// Hyphen symbol, set only when the word ends its line.
    pub hyphen: Option<SymbolId>,
    pub max_nodes: usize,
}

impl<'a> Lattice<'a> {
    /// Top choice per position, or `None` if a position has no choice.
    pub fn raw_choice(&self) -> Option<WordChoice> {
        let mut word = WordChoice::new(Permuter::TopChoice);
        for choices in self.positions {
            word.push_choice(choices.first()?);
        }
        Some(word)
    }

    /// Best dictionary word rating strictly below `bound`, and the number
    /// of lattice nodes visited.
    pub fn best_word(
        &self,
        start: &[ActiveTraversal],
        inherited_ambiguous: bool,
        bound: f32,
    ) -> (Option<LatticeMatch>, usize) {
        if start.is_empty() || self.positions.is_empty() {
            return (None, 0);
        }
        let mut word = WordChoice::new(Permuter::NoPermuter);
        word.ambiguous = inherited_ambiguous;
        let mut walk = Walk {
            lattice: self,
            word,
            used: Vec::new(),
            bound,
            best: None,
            nodes: 0,
        };
        walk.visit(0, start, None);
        if walk.nodes > self.max_nodes {
            log::debug!("lattice: node budget {} reached", self.max_nodes);
        }
        (walk.best, walk.nodes)
    }
}

fn find(choices: &[BlobChoice], symbol: SymbolId) -> Option<&BlobChoice> {
    choices.iter().find(|c| c.symbol == symbol)
}

struct Walk<'l, 'a> {
    lattice: &'l Lattice<'a>,
    word: WordChoice,
    used: Vec<AmbigMatch>,
    bound: f32,
    best: Option<LatticeMatch>,
    nodes: usize,
}

impl<'a> Walk<'_, 'a> {
    fn visit(&mut self, i: usize, active: &[ActiveTraversal], pending: Option<(&'a AmbigRule, usize)>) {
        self.nodes += 1;
        if self.nodes > self.lattice.max_nodes || self.word.rating >= self.bound {
            return;
        }
        let positions = self.lattice.positions;
        if i == positions.len() {
            if pending.is_none() {
                let ends: Vec<ActiveTraversal> =
                    active.iter().filter(|t| t.word_end).copied().collect();
                if !ends.is_empty() {
                    self.record(Permuter::Dictionary, ends);
                }
            }
            return;
        }
        if let Some((rule, j)) = pending {
            if let Some(&observed) = find(&positions[i], rule.wrong[j]) {
                self.take_fragment(i, rule, j, observed, active);
            }
            return;
        }

        if i + 1 == positions.len() && i > 0 {
            self.try_hyphen(i, active);
        }

        let dictionary = self.lattice.dictionary;
        for &choice in &positions[i] {
            if !self.completes_definite(i, choice.symbol) {
                let next = dictionary.advance_all(active, choice.symbol);
                if !next.is_empty() {
                    let saved = self.save();
                    self.word.push_choice(&choice);
                    self.visit(i + 1, &next, None);
                    self.restore(saved);
                }
            }
            for rule in self.lattice.ambigs.lookup(choice.symbol) {
                if self.rule_fits(i, rule) {
                    self.take_fragment(i, rule, 0, choice, active);
                }
            }
        }
    }

    /// Consume fragment `j` of `rule` at position `i`, priced like the
    /// wrong symbol observed there.
    fn take_fragment(
        &mut self,
        i: usize,
        rule: &'a AmbigRule,
        j: usize,
        observed: BlobChoice,
        active: &[ActiveTraversal],
    ) {
        let saved = self.save();
        self.word.push(rule.fragments[j], observed.rating, observed.certainty);
        if rule.kind == AmbigKind::Dangerous {
            self.word.ambiguous = true;
        }
        if j == 0 {
            self.used.push(AmbigMatch::new(rule, i));
        }
        if j + 1 == rule.wrong.len() {
            let next = self.lattice.dictionary.advance_seq(active, &rule.correct);
            if !next.is_empty() {
                self.visit(i + 1, &next, None);
            }
        } else {
            self.visit(i + 1, active, Some((rule, j + 1)));
        }
        if j == 0 {
            self.used.pop();
        }
        self.restore(saved);
    }

    /// Line-final hyphen after a valid prefix.
    fn try_hyphen(&mut self, i: usize, active: &[ActiveTraversal]) {
        let Some(hyphen) = self.lattice.hyphen else {
            return;
        };
        let Some(&choice) = find(&self.lattice.positions[i], hyphen) else {
            return;
        };
        let open: Vec<ActiveTraversal> = active.iter().filter(|t| !t.node.is_none()).copied().collect();
        if open.is_empty() {
            return;
        }
        let saved = self.save();
        self.word.push_choice(&choice);
        self.record(Permuter::HyphenPrefix, open);
        self.restore(saved);
    }

    /// Whether reading `symbol` at `i` after the current word completes the
    /// wrong sequence of a definite rule, which must be read corrected.
    fn completes_definite(&self, i: usize, symbol: SymbolId) -> bool {
        let read = &self.word.symbols;
        (1..=MAX_AMBIG_SIZE.min(i + 1)).any(|n| {
            let first = if n == 1 { symbol } else { read[i + 1 - n] };
            self.lattice.ambigs.lookup(first).iter().any(|rule| {
                rule.kind == AmbigKind::Definite
                    && rule.wrong.len() == n
                    && rule.wrong[n - 1] == symbol
                    && rule.wrong[..n - 1] == read[i + 1 - n..i]
            })
        })
    }

    /// Whether the rest of the rule's wrong sequence is among the choices
    /// of the following positions.
    fn rule_fits(&self, i: usize, rule: &AmbigRule) -> bool {
        let positions = self.lattice.positions;
        i + rule.wrong.len() <= positions.len()
            && rule.wrong[1..]
                .iter()
                .enumerate()
                .all(|(k, &s)| find(&positions[i + 1 + k], s).is_some())
    }

    fn record(&mut self, permuter: Permuter, final_traversals: Vec<ActiveTraversal>) {
        if self.word.rating >= self.bound {
            return;
        }
        let mut word = self.word.clone();
        word.permuter = permuter;
        self.bound = word.rating;
        self.best = Some(LatticeMatch {
            word,
            final_traversals,
            ambiguities: self.used.clone(),
        });
    }

    fn save(&self) -> (f32, f32, bool) {
        (self.word.rating, self.word.certainty, self.word.ambiguous)
    }

    fn restore(&mut self, saved: (f32, f32, bool)) {
        self.word.remove_last();
        (self.word.rating, self.word.certainty, self.word.ambiguous) = saved;
    }
}
