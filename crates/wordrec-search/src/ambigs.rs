// Ambiguity table: known classifier confusions and their corrections.
//
// Rules text, one rule per line:
//
//   <wrong-count> <wrong symbols...> <correct-count> <correct symbols...> [type]
//
// Blank lines and lines starting with `#` are ignored. An optional `v<N>`
// line before the first rule declares the format version; from version 1
// on, the type field is required. Declared counts above MAX_AMBIG_SIZE
// reject the line even when fewer symbols are listed.

use hashbrown::HashMap;
use wordrec_core::diagnostics::{LoadSummary, SkipReason};
use wordrec_core::symbols::{SymbolId, SymbolSet};

/// Longest wrong or correct sequence a rule may have.
pub const MAX_AMBIG_SIZE: usize = 10;

const SOURCE: &str = "ambiguity rules";

/// How a rule's correction is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmbigKind {
    /// Code 0. The correction is an alternative reading only.
    NotAmbiguous,
    /// Code 1. The wrong sequence is always replaced by the correction.
    Definite,
    /// Code 2. The correction is an alternative; a word that uses it is
    /// marked ambiguous.
    Dangerous,
    /// Code 3, and every 1-to-1 rule whose sides differ only in case.
    CaseOnly,
}

impl AmbigKind {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::NotAmbiguous),
            1 => Some(Self::Definite),
            2 => Some(Self::Dangerous),
            3 => Some(Self::CaseOnly),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::NotAmbiguous => 0,
            Self::Definite => 1,
            Self::Dangerous => 2,
            Self::CaseOnly => 3,
        }
    }
}

/// One confusion: `wrong` is what the classifier tends to report, `correct`
/// is what was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbigRule {
    pub wrong: Vec<SymbolId>,
    pub correct: Vec<SymbolId>,
    /// Symbol for the concatenated correct text (an ngram when `correct`
    /// has more than one symbol).
    pub correct_ngram: SymbolId,
    /// One symbol per wrong position: fragments of `correct_ngram`, or
    /// `correct_ngram` itself for a 1-symbol wrong side.
    pub fragments: Vec<SymbolId>,
    pub kind: AmbigKind,
}

/// Ambiguity loading options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbigOptions {
    /// Also index 1-to-1 definite rules for classifier-level substitution
    /// ([`AmbigTable::one_to_one_definite`]). Default: false.
    pub collect_one_to_one_definite: bool,
}

/// Rules indexed by the first wrong symbol, each list sorted by wrong
/// sequence.
#[derive(Debug, Clone, Default)]
pub struct AmbigTable {
    rules: HashMap<SymbolId, Vec<AmbigRule>>,
    one_to_one_definite: HashMap<SymbolId, Vec<SymbolId>>,
    version: u32,
    len: usize,
}

impl AmbigTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse rules from `text`.
    ///
    /// Correct sequences (and their fragments) are registered in `symbols`
    /// as a side effect. Malformed lines are skipped and reported.
    pub fn load(text: &str, symbols: &mut SymbolSet, options: &AmbigOptions) -> (Self, LoadSummary) {
        let mut table = Self::new();
        let mut summary = LoadSummary::new();
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx, line.trim()))
            .filter(|&(_, line)| !line.is_empty() && !line.starts_with('#'))
            .peekable();

        let first_line = lines.peek().map(|&(_, line)| line);
        if let Some(rest) = first_line.and_then(|line| line.strip_prefix('v')) {
            table.version = rest.trim().parse().unwrap_or_else(|_| {
                log::warn!("{SOURCE}: unreadable version line v{rest:?}, assuming v0");
                0
            });
            lines.next();
        }

        for (idx, line) in lines {
            let parsed = match parse_line(line, table.version, symbols) {
                Ok(parsed) => parsed,
                Err(reason) => {
                    summary.skip(SOURCE, idx + 1, reason);
                    continue;
                }
            };
            if table.contains_rule(&parsed.wrong, &parsed.correct) {
                summary.skip(SOURCE, idx + 1, SkipReason::Duplicate(line.to_string()));
                continue;
            }
            table.insert(parsed, symbols, options);
            summary.accepted += 1;
        }
        log::debug!(
            "{SOURCE}: loaded {} rules (v{}), skipped {} lines",
            table.len,
            table.version,
            summary.skipped.len()
        );
        (table, summary)
    }

    fn contains_rule(&self, wrong: &[SymbolId], correct: &[SymbolId]) -> bool {
        self.lookup(wrong[0])
            .iter()
            .any(|r| r.wrong == wrong && r.correct == correct)
    }

    fn insert(&mut self, parsed: ParsedRule, symbols: &mut SymbolSet, options: &AmbigOptions) {
        let ParsedRule {
            wrong,
            correct,
            mut kind,
        } = parsed;
        if wrong.len() == 1
            && correct.len() == 1
            && symbols.to_lower(wrong[0]) == symbols.to_lower(correct[0])
        {
            kind = AmbigKind::CaseOnly;
        }

        let correct_text: String = correct.iter().map(|&id| symbols.text(id)).collect();
        let correct_ngram = symbols.insert(&correct_text);
        if correct.len() > 1 {
            symbols.set_ngram(correct_ngram, true);
        }
        let fragments = if wrong.len() == 1 {
            vec![correct_ngram]
        } else {
            let total = wrong.len() as u16;
            (0..total)
                .map(|pos| symbols.insert_fragment(correct_ngram, pos, total))
                .collect()
        };

        if options.collect_one_to_one_definite
            && kind == AmbigKind::Definite
            && wrong.len() == 1
            && correct.len() == 1
        {
            self.one_to_one_definite
                .entry(wrong[0])
                .or_default()
                .push(correct_ngram);
        }

        let rule = AmbigRule {
            wrong,
            correct,
            correct_ngram,
            fragments,
            kind,
        };
        let list = self.rules.entry(rule.wrong[0]).or_default();
        let at = list.partition_point(|r| r.wrong <= rule.wrong);
        list.insert(at, rule);
        self.len += 1;
    }

    /// Rules whose wrong sequence starts with `symbol`, sorted by wrong
    /// sequence.
    pub fn lookup(&self, symbol: SymbolId) -> &[AmbigRule] {
        self.rules.get(&symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rules whose wrong sequence matches `symbols` starting at `pos`.
    pub fn find_matches(&self, symbols: &[SymbolId], pos: usize) -> Vec<&AmbigRule> {
        let Some(&first) = symbols.get(pos) else {
            return Vec::new();
        };
        self.lookup(first)
            .iter()
            .filter(|r| symbols[pos..].starts_with(&r.wrong))
            .collect()
    }

    /// Corrections of 1-to-1 definite rules for `symbol`. Empty unless the
    /// table was loaded with `collect_one_to_one_definite`.
    pub fn one_to_one_definite(&self, symbol: SymbolId) -> &[SymbolId] {
        self.one_to_one_definite
            .get(&symbol)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declared format version (0 when absent).
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &AmbigRule> {
        self.rules.values().flatten()
    }
}

/// A rule applied while reading a word, at the position where its wrong
/// sequence starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbigMatch {
    pub wrong: Vec<SymbolId>,
    pub correct: Vec<SymbolId>,
    pub kind: AmbigKind,
    pub position: usize,
}

impl AmbigMatch {
    pub fn new(rule: &AmbigRule, position: usize) -> Self {
        Self {
            wrong: rule.wrong.clone(),
            correct: rule.correct.clone(),
            kind: rule.kind,
            position,
        }
    }
}

struct ParsedRule {
    wrong: Vec<SymbolId>,
    correct: Vec<SymbolId>,
    kind: AmbigKind,
}

fn parse_count(token: &str) -> Option<usize> {
    token.parse::<usize>().ok().filter(|&n| n > 0)
}

fn parse_line(line: &str, version: u32, symbols: &SymbolSet) -> Result<ParsedRule, SkipReason> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let wrong_count =
        parse_count(tokens[0]).ok_or_else(|| SkipReason::InvalidCount(tokens[0].to_string()))?;
    check_size(wrong_count)?;

    // Wrong side: the declared count is honoured when a count follows it;
    // otherwise the run extends to the next numeric field.
    let declared_end = 1 + wrong_count;
    let wrong_end = if tokens.get(declared_end).and_then(|t| parse_count(t)).is_some() {
        declared_end
    } else {
        let end = (1..tokens.len())
            .find(|&i| parse_count(tokens[i]).is_some())
            .ok_or(SkipReason::MissingField("correct count"))?;
        log::warn!(
            "{SOURCE}: {line:?} declares {wrong_count} wrong symbols but lists {}",
            end - 1
        );
        end
    };
    let wrong = resolve(&tokens[1..wrong_end], symbols)?;

    let correct_count = parse_count(tokens[wrong_end])
        .ok_or_else(|| SkipReason::InvalidCount(tokens[wrong_end].to_string()))?;
    check_size(correct_count)?;
    let start = wrong_end + 1;

    // Correct side: consistent when at most a type code follows it.
    let declared_end = start + correct_count;
    let rest = tokens.get(declared_end..).unwrap_or(&[]);
    let consistent = declared_end <= tokens.len()
        && (rest.is_empty() || (rest.len() == 1 && rest[0].parse::<u32>().is_ok()));
    let (correct_end, type_token) = if consistent {
        (declared_end, rest.first().copied())
    } else {
        let last = tokens[tokens.len() - 1];
        let (end, ty) = if tokens.len() > start + 1 && last.parse::<u32>().is_ok() {
            (tokens.len() - 1, Some(last))
        } else {
            (tokens.len(), None)
        };
        log::warn!(
            "{SOURCE}: {line:?} declares {correct_count} correct symbols but lists {}",
            end - start
        );
        (end, ty)
    };
    let correct = resolve(&tokens[start..correct_end], symbols)?;

    let kind = match type_token {
        Some(token) => token
            .parse::<u32>()
            .ok()
            .and_then(AmbigKind::from_code)
            .ok_or_else(|| SkipReason::InvalidType(token.to_string()))?,
        None if version > 0 => return Err(SkipReason::MissingField("type")),
        None => AmbigKind::NotAmbiguous,
    };
    Ok(ParsedRule {
        wrong,
        correct,
        kind,
    })
}

/// Declared and listed sequence lengths are both bounded.
fn check_size(count: usize) -> Result<(), SkipReason> {
    if count > MAX_AMBIG_SIZE {
        return Err(SkipReason::TooManySymbols {
            count,
            max: MAX_AMBIG_SIZE,
        });
    }
    Ok(())
}

fn resolve(tokens: &[&str], symbols: &SymbolSet) -> Result<Vec<SymbolId>, SkipReason> {
    if tokens.is_empty() {
        return Err(SkipReason::MissingField("symbols"));
    }
    check_size(tokens.len())?;
    tokens
        .iter()
        .map(|&t| {
            symbols
                .id_of(t)
                .ok_or_else(|| SkipReason::UnknownSymbol(t.to_string()))
        })
        .collect()
}
