// Language data and the per-text-flow recognizer handle.
//
// A Language bundles the symbol set, the dictionary and the ambiguity table.
// It is built once and shared read-only through an Arc. A WordRecognizer
// owns one hyphen tracker and so follows one text flow, word by word.

use std::sync::Arc;

use wordrec_core::choice::Permuter;
use wordrec_core::diagnostics::LoadSummary;
use wordrec_core::symbols::{SymbolId, SymbolSet};
use wordrec_dawg::DawgError;
use wordrec_dawg::graph::WordGraph;
use wordrec_dawg::trie::{DictOptions, Trie};

use crate::Classifier;
use crate::ambigs::{AmbigOptions, AmbigTable};
use crate::dict::Dictionary;
use crate::hyphen::HyphenTracker;
use crate::pieces::{Seam, WordPieces};
use crate::ratings::BoundsMatchTable;
use crate::search::{MAX_PIECES, SearchContext, SearchOptions, SearchOutcome, SearchRecord, SearchRequest};

/// Error type for language loading and recognition.
#[derive(Debug, thiserror::Error)]
pub enum RecognizerError {
    /// A word graph uses more symbols than the symbol set holds.
    #[error("word graph built for {graph} symbols, symbol set has {symbols}")]
    SymbolSetMismatch { graph: usize, symbols: usize },

    /// A persisted word graph could not be read.
    #[error("failed to load word graph: {0}")]
    GraphLoad(#[from] DawgError),

    #[error("word has no pieces")]
    NoPieces,

    #[error("word has {count} pieces (max {max})")]
    TooManyPieces { count: usize, max: usize },

    #[error("expected {expected} seams between the pieces, got {actual}")]
    SeamCountMismatch { expected: usize, actual: usize },
}

/// Everything a search needs about one language. Immutable once built.
#[derive(Debug, Clone)]
pub struct Language {
    symbols: SymbolSet,
    dictionary: Dictionary,
    ambigs: AmbigTable,
}

impl Language {
    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn ambigs(&self) -> &AmbigTable {
        &self.ambigs
    }
}

/// Assembles a [`Language`].
///
/// Load the ambiguity rules before the word lists: loading rules adds the
/// correction symbols to the symbol set.
#[derive(Debug)]
pub struct LanguageBuilder {
    symbols: SymbolSet,
    dictionary: Dictionary,
    ambigs: AmbigTable,
    dict_options: DictOptions,
    ambig_options: AmbigOptions,
}

impl LanguageBuilder {
    pub fn new(symbols: SymbolSet) -> Self {
        Self {
            symbols,
            dictionary: Dictionary::default(),
            ambigs: AmbigTable::new(),
            dict_options: DictOptions::default(),
            ambig_options: AmbigOptions::default(),
        }
    }

    pub fn dict_options(mut self, options: DictOptions) -> Self {
        self.dict_options = options;
        self
    }

    pub fn ambig_options(mut self, options: AmbigOptions) -> Self {
        self.ambig_options = options;
        self
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    /// Replace the ambiguity table with rules parsed from `text`.
    pub fn load_ambigs(&mut self, text: &str) -> LoadSummary {
        if !self.dictionary.is_empty() {
            log::warn!("ambiguity rules loaded after word lists; new correction symbols are not in those graphs");
        }
        let (table, summary) = AmbigTable::load(text, &mut self.symbols, &self.ambig_options);
        self.ambigs = table;
        summary
    }

    /// Build a sub-dictionary from a word list, one word per line.
    pub fn add_word_list(&mut self, text: &str) -> LoadSummary {
        let mut trie = Trie::new(self.symbols.len(), &self.dict_options);
        let summary = trie.read_word_list(text, &self.symbols);
        let trie_edges = trie.num_edges();
        let graph = trie.compact();
        log::debug!(
            "word list: {} words, {} trie edges compacted to {}",
            summary.accepted,
            trie_edges,
            graph.num_edges()
        );
        self.dictionary.push(graph);
        summary
    }

    /// Add a sub-dictionary persisted with [`WordGraph::to_bytes`].
    pub fn add_graph_bytes(&mut self, data: &[u8]) -> Result<(), RecognizerError> {
        let graph = WordGraph::from_bytes(data)?;
        self.add_graph(graph)
    }

    pub fn add_graph(&mut self, graph: WordGraph) -> Result<(), RecognizerError> {
        if graph.symbol_count() > self.symbols.len() {
            return Err(RecognizerError::SymbolSetMismatch {
                graph: graph.symbol_count(),
                symbols: self.symbols.len(),
            });
        }
        self.dictionary.push(graph);
        Ok(())
    }

    pub fn build(self) -> Arc<Language> {
        Arc::new(Language {
            symbols: self.symbols,
            dictionary: self.dictionary,
            ambigs: self.ambigs,
        })
    }
}

/// Recognizes the words of one text flow in reading order.
#[derive(Debug, Clone)]
pub struct WordRecognizer {
    language: Arc<Language>,
    options: SearchOptions,
    hyphen_symbol: Option<SymbolId>,
    hyphen: HyphenTracker,
}

impl WordRecognizer {
    pub fn new(language: Arc<Language>) -> Self {
        Self::with_options(language, SearchOptions::default())
    }

    pub fn with_options(language: Arc<Language>, options: SearchOptions) -> Self {
        let hyphen_symbol = language.symbols.id_of(&options.hyphen);
        if hyphen_symbol.is_none() {
            log::debug!("hyphen {:?} is not a symbol; hyphen continuation disabled", options.hyphen);
        }
        Self {
            language,
            options,
            hyphen_symbol,
            hyphen: HyphenTracker::new(),
        }
    }

    pub fn language(&self) -> &Arc<Language> {
        &self.language
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn hyphen_tracker(&self) -> &HyphenTracker {
        &self.hyphen
    }

    /// Search the best reading of one word.
    ///
    /// `last_word_on_line` drives hyphen continuation: a line-final word may
    /// end in a hyphenated dictionary prefix, which then seeds the first
    /// word of the next line.
    pub fn recognize_word<C: Classifier + ?Sized>(
        &mut self,
        pieces: &mut WordPieces,
        seams: &[Seam],
        classifier: &C,
        last_word_on_line: bool,
    ) -> Result<SearchOutcome, RecognizerError> {
        self.recognize(pieces, seams, classifier, last_word_on_line, None)
    }

    /// Like [`recognize_word`](Self::recognize_word), reusing and extending
    /// classifier results from earlier passes over the same word.
    pub fn recognize_word_with_table<C: Classifier + ?Sized>(
        &mut self,
        pieces: &mut WordPieces,
        seams: &[Seam],
        classifier: &C,
        last_word_on_line: bool,
        table: &mut BoundsMatchTable,
    ) -> Result<SearchOutcome, RecognizerError> {
        self.recognize(pieces, seams, classifier, last_word_on_line, Some(table))
    }

    fn recognize<C: Classifier + ?Sized>(
        &mut self,
        pieces: &mut WordPieces,
        seams: &[Seam],
        classifier: &C,
        last_word_on_line: bool,
        mut table: Option<&mut BoundsMatchTable>,
    ) -> Result<SearchOutcome, RecognizerError> {
        check_word(pieces, seams)?;
        self.hyphen.reset_if_needed(last_word_on_line);

        let mut record = SearchRecord::new(pieces.num_pieces());
        if let Some(table) = table.as_deref_mut() {
            let filled = record.ratings_mut().prefill(table, pieces);
            log::trace!("recognizer: {filled} ratings taken from the match table");
        }
        let ctx = SearchContext {
            dictionary: &self.language.dictionary,
            ambigs: &self.language.ambigs,
            options: &self.options,
            hyphen: self.hyphen_symbol,
        };
        let request = SearchRequest {
            seed: self.hyphen.seed(),
            last_word_on_line,
        };
        let outcome = record.run(&ctx, &request, pieces, seams, classifier);
        if let Some(table) = table {
            record.ratings().export(table, pieces);
        }

        if outcome.best_choice.permuter == Permuter::HyphenPrefix {
            self.hyphen.update(
                &outcome.best_choice,
                outcome.final_traversals.clone(),
                outcome.dangerous_ambiguities(),
            );
        }
        Ok(outcome)
    }
}

fn check_word(pieces: &WordPieces, seams: &[Seam]) -> Result<(), RecognizerError> {
    let count = pieces.num_pieces();
    if count == 0 {
        return Err(RecognizerError::NoPieces);
    }
    if count > MAX_PIECES {
        return Err(RecognizerError::TooManyPieces {
            count,
            max: MAX_PIECES,
        });
    }
    if seams.len() != count - 1 {
        return Err(RecognizerError::SeamCountMismatch {
            expected: count - 1,
            actual: seams.len(),
        });
    }
    Ok(())
}
