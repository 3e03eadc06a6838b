// Symbol ids and the symbol set (the active vocabulary of recognizable units).

use hashbrown::HashMap;

use crate::SymbolSetError;
use crate::diagnostics::{LoadSummary, SkipReason};

/// Integer id of one recognizable unit (character, ngram or fragment).
pub type SymbolId = u32;

/// Reserved id meaning "no symbol".
pub const INVALID_SYMBOL: SymbolId = u32::MAX;

/// Largest number of symbols a set may hold (all ids below the sentinel).
pub const MAX_SYMBOLS: usize = INVALID_SYMBOL as usize;

/// Position of a fragment within the ngram it was cut from.
///
/// An n-to-m ambiguity replaces n observed symbols with n fragments of the
/// correct ngram, so the number of search positions does not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fragment {
    /// The whole ngram this fragment belongs to.
    pub base: SymbolId,
    /// 0-based position of this fragment.
    pub pos: u16,
    /// Number of fragments the ngram was cut into.
    pub total: u16,
}

impl Fragment {
    pub fn is_first(&self) -> bool {
        self.pos == 0
    }

    pub fn is_last(&self) -> bool {
        self.pos + 1 == self.total
    }
}

#[derive(Debug, Clone)]
struct SymbolProps {
    text: String,
    is_ngram: bool,
    fragment: Option<Fragment>,
}

/// Ordered vocabulary mapping symbol text to dense ids.
///
/// Ids are assigned in insertion order and never change, so a symbol set
/// can only grow. Ambiguity loading relies on this to register ngrams and
/// fragments after the base characters are known.
#[derive(Debug, Clone, Default)]
pub struct SymbolSet {
    props: Vec<SymbolProps>,
    ids: HashMap<String, SymbolId>,
    /// Longest symbol text in chars, for greedy encoding.
    max_symbol_chars: usize,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a symbol set from an iterator of symbol strings.
    /// Duplicates map to the id of their first occurrence.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for s in symbols {
            set.insert(s.as_ref());
        }
        set
    }

    /// Parse a symbol set from text: one symbol per non-blank line (the first
    /// whitespace-delimited field). Duplicate lines are skipped with a
    /// diagnostic.
    pub fn from_text(text: &str) -> Result<(Self, LoadSummary), SymbolSetError> {
        let mut set = Self::new();
        let mut summary = LoadSummary::new();
        for (idx, line) in text.lines().enumerate() {
            let Some(symbol) = line.split_whitespace().next() else {
                continue;
            };
            if set.contains(symbol) {
                summary.skip("symbol set", idx + 1, SkipReason::Duplicate(symbol.to_string()));
                continue;
            }
            if set.len() >= MAX_SYMBOLS {
                return Err(SymbolSetError::TooLarge {
                    count: set.len() + 1,
                    max: MAX_SYMBOLS,
                });
            }
            set.insert(symbol);
            summary.accepted += 1;
        }
        if set.is_empty() {
            return Err(SymbolSetError::Empty);
        }
        Ok((set, summary))
    }

    /// Insert a symbol if not already present and return its id.
    pub fn insert(&mut self, text: &str) -> SymbolId {
        if let Some(&id) = self.ids.get(text) {
            return id;
        }
        let id = self.props.len() as SymbolId;
        self.max_symbol_chars = self.max_symbol_chars.max(text.chars().count());
        self.props.push(SymbolProps {
            text: text.to_string(),
            is_ngram: false,
            fragment: None,
        });
        self.ids.insert(text.to_string(), id);
        id
    }

    /// Insert fragment `pos` of `total` of the ngram `base`.
    ///
    /// Fragment text uses the `|text|pos|total` convention so that it can
    /// never collide with an ordinary symbol.
    pub fn insert_fragment(&mut self, base: SymbolId, pos: u16, total: u16) -> SymbolId {
        debug_assert!(pos < total);
        let text = fragment_text(self.text(base), pos, total);
        let id = self.insert(&text);
        self.props[id as usize].fragment = Some(Fragment { base, pos, total });
        id
    }

    pub fn id_of(&self, text: &str) -> Option<SymbolId> {
        self.ids.get(text).copied()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.ids.contains_key(text)
    }

    pub fn contains_id(&self, id: SymbolId) -> bool {
        (id as usize) < self.props.len()
    }

    /// Text of a symbol. Panics on an id that is not in the set.
    pub fn text(&self, id: SymbolId) -> &str {
        &self.props[id as usize].text
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn is_ngram(&self, id: SymbolId) -> bool {
        self.props[id as usize].is_ngram
    }

    pub fn set_ngram(&mut self, id: SymbolId, is_ngram: bool) {
        self.props[id as usize].is_ngram = is_ngram;
    }

    pub fn fragment(&self, id: SymbolId) -> Option<Fragment> {
        self.props.get(id as usize).and_then(|p| p.fragment)
    }

    /// Lowercase counterpart of a symbol, or the symbol itself when the
    /// lowercase text is not in the set.
    pub fn to_lower(&self, id: SymbolId) -> SymbolId {
        let text = self.text(id);
        let lower = text.to_lowercase();
        if lower == text {
            return id;
        }
        self.id_of(&lower).unwrap_or(id)
    }

    /// Encode text into symbol ids using greedy longest match.
    ///
    /// Returns `Err(rest)` with the unencodable remainder when some position
    /// matches no symbol.
    pub fn encode<'a>(&self, text: &'a str) -> Result<Vec<SymbolId>, &'a str> {
        let mut ids = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            let boundaries: Vec<usize> = rest
                .char_indices()
                .map(|(i, _)| i)
                .skip(1)
                .chain(std::iter::once(rest.len()))
                .take(self.max_symbol_chars.max(1))
                .collect();
            let found = boundaries
                .iter()
                .rev()
                .find_map(|&end| self.id_of(&rest[..end]).map(|id| (id, end)));
            match found {
                Some((id, end)) => {
                    ids.push(id);
                    rest = &rest[end..];
                }
                None => return Err(rest),
            }
        }
        Ok(ids)
    }

    /// Render a symbol sequence as text. A run of fragments renders as the
    /// text of its ngram, once.
    pub fn render(&self, ids: &[SymbolId]) -> String {
        let mut out = String::new();
        for &id in ids {
            if id == INVALID_SYMBOL || !self.contains_id(id) {
                out.push('\u{FFFD}');
                continue;
            }
            match self.fragment(id) {
                Some(frag) if frag.is_first() => out.push_str(self.text(frag.base)),
                Some(_) => {}
                None => out.push_str(self.text(id)),
            }
        }
        out
    }
}

/// Text used to register a fragment symbol.
pub fn fragment_text(base_text: &str, pos: u16, total: u16) -> String {
    format!("|{base_text}|{pos}|{total}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_and_stable() {
        let mut set = SymbolSet::from_symbols(["a", "b", "c"]);
        assert_eq!(set.id_of("a"), Some(0));
        assert_eq!(set.id_of("c"), Some(2));
        assert_eq!(set.insert("b"), 1);
        assert_eq!(set.insert("d"), 3);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn from_text_skips_blank_and_duplicate_lines() {
        let (set, summary) = SymbolSet::from_text("a\n\nb extra fields\na\n").unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.id_of("b"), Some(1));
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].line, 4);
    }

    #[test]
    fn from_text_rejects_empty() {
        assert!(matches!(
            SymbolSet::from_text("\n \n"),
            Err(SymbolSetError::Empty)
        ));
    }

    #[test]
    fn encode_prefers_longest_match() {
        let set = SymbolSet::from_symbols(["f", "i", "fi", "n"]);
        let ids = set.encode("fin").unwrap();
        assert_eq!(ids, vec![set.id_of("fi").unwrap(), set.id_of("n").unwrap()]);
    }

    #[test]
    fn encode_reports_unknown_remainder() {
        let set = SymbolSet::from_symbols(["c", "a"]);
        assert_eq!(set.encode("cat"), Err("t"));
    }

    #[test]
    fn encode_multibyte() {
        let set = SymbolSet::from_symbols(["ä", "ö"]);
        assert_eq!(set.encode("öä").unwrap(), vec![1, 0]);
    }

    #[test]
    fn to_lower_links_case_pairs() {
        let set = SymbolSet::from_symbols(["A", "a", "B"]);
        assert_eq!(set.to_lower(0), 1);
        assert_eq!(set.to_lower(1), 1);
        // No lowercase counterpart registered.
        assert_eq!(set.to_lower(2), 2);
    }

    #[test]
    fn fragments_render_as_their_ngram() {
        let mut set = SymbolSet::from_symbols(["r", "n", "m"]);
        let m = set.id_of("m").unwrap();
        let f0 = set.insert_fragment(m, 0, 2);
        let f1 = set.insert_fragment(m, 1, 2);
        assert_eq!(set.text(f0), "|m|0|2");
        assert_eq!(set.fragment(f1).unwrap().pos, 1);
        assert!(set.fragment(f1).unwrap().is_last());
        let r = set.id_of("r").unwrap();
        assert_eq!(set.render(&[r, f0, f1]), "rm");
    }

    #[test]
    fn render_marks_invalid_ids() {
        let set = SymbolSet::from_symbols(["a"]);
        assert_eq!(set.render(&[0, INVALID_SYMBOL]), "a\u{FFFD}");
    }
}
