// Line-numbered diagnostics for text inputs (symbol sets, word lists,
// ambiguity rules). Malformed lines never abort a load; they are skipped
// and reported here.

/// Why an input line was skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("unknown symbol {0:?}")]
    UnknownSymbol(String),
    #[error("invalid count field {0:?}")]
    InvalidCount(String),
    #[error("too many symbols: {count} (max {max})")]
    TooManySymbols { count: usize, max: usize },
    #[error("missing {0}")]
    MissingField(&'static str),
    #[error("invalid type code {0:?}")]
    InvalidType(String),
    #[error("duplicate entry {0:?}")]
    Duplicate(String),
    #[error("rejected: {0}")]
    Rejected(String),
}

/// A skipped line together with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line: usize,
    pub reason: SkipReason,
}

/// Outcome of loading a line-oriented text input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Number of lines that produced an entry.
    pub accepted: usize,
    /// Lines that were skipped, in input order.
    pub skipped: Vec<SkippedLine>,
}

impl LoadSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped line and emit a warning through the `log` facade.
    ///
    /// `source` names the input kind in the log message ("word list",
    /// "ambiguity rules", ...).
    pub fn skip(&mut self, source: &str, line: usize, reason: SkipReason) {
        log::warn!("{source}: skipping line {line}: {reason}");
        self.skipped.push(SkippedLine { line, reason });
    }

    /// Total number of non-blank lines seen.
    pub fn lines_seen(&self) -> usize {
        self.accepted + self.skipped.len()
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}
