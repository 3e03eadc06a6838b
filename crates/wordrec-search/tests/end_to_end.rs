//! End-to-end tests: language loading, word search and hyphen continuation
//! through the public API.
//!
//! Scenario fixtures live in tests/fixtures/scenarios.json.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use wordrec_core::choice::{BlobChoice, Permuter};
use wordrec_core::symbols::SymbolSet;
use wordrec_search::ambigs::AmbigKind;
use wordrec_search::pieces::{Blob, box_row};
use wordrec_search::ratings::RatingsMatrix;
use wordrec_search::testing::ScriptedClassifier;
use wordrec_search::{Classifier, Language, LanguageBuilder, SearchOptions, StopReason, WordRecognizer};
use wordrec_dawg::Dawg;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ScriptEntry {
    start: usize,
    end: usize,
    choices: Vec<(String, f32, f32)>,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    name: String,
    symbols: Vec<String>,
    words: Vec<String>,
    ambigs: String,
    widths: Vec<i16>,
    script: Vec<ScriptEntry>,
    expected_best: String,
    expected_permuter: String,
    expected_raw: String,
    expected_ranges: Vec<(usize, usize)>,
}

fn load_scenarios() -> Vec<Scenario> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/scenarios.json");
    let contents = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
    serde_json::from_str(&contents)
        .unwrap_or_else(|e| panic!("failed to parse {}: {}", path.display(), e))
}

fn build_language(symbols: &[&str], words: &[&str], ambigs: &str) -> Arc<Language> {
    let mut builder = LanguageBuilder::new(SymbolSet::from_symbols(symbols));
    let summary = builder.load_ambigs(ambigs);
    assert!(summary.is_clean(), "ambiguity rules: {:?}", summary.skipped);
    let summary = builder.add_word_list(&words.join("\n"));
    assert!(summary.is_clean(), "word list: {:?}", summary.skipped);
    builder.build()
}

fn scripted(language: &Language, script: &[((usize, usize), &[(&str, f32, f32)])]) -> ScriptedClassifier {
    let symbols = language.symbols();
    script.iter().fold(ScriptedClassifier::new(), |classifier, &(range, choices)| {
        let choices = choices
            .iter()
            .map(|&(s, r, c)| BlobChoice::new(symbols.id_of(s).unwrap(), r, c))
            .collect();
        classifier.with(range, choices)
    })
}

// ---------------------------------------------------------------------------
// Dictionary and ambiguity loading
// ---------------------------------------------------------------------------

#[test]
fn cat_car_cart_dictionary() {
    let language = build_language(&["c", "a", "t", "r", "s"], &["cat", "car", "cart"], "");
    let graph = &language.dictionary().graphs()[0];
    let enc = |w: &str| language.symbols().encode(w).unwrap();
    for word in ["cat", "car", "cart"] {
        assert!(graph.contains(&enc(word)), "{word} should be accepted");
    }
    for word in ["ca", "ct", "cats"] {
        assert!(!graph.contains(&enc(word)), "{word} should be rejected");
    }
}

#[test]
fn rn_to_m_rule_resolves_ids() {
    let language = build_language(&["r", "n", "m"], &["m"], "1 r n 1 m 1\n");
    let symbols = language.symbols();
    let (r, n, m) = (
        symbols.id_of("r").unwrap(),
        symbols.id_of("n").unwrap(),
        symbols.id_of("m").unwrap(),
    );
    let rules = language.ambigs().lookup(r);
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].wrong, vec![r, n]);
    assert_eq!(rules[0].correct, vec![m]);
    assert_eq!(rules[0].correct_ngram, m);
    assert_eq!(rules[0].kind, AmbigKind::Definite);
}

#[test]
fn case_only_rule_overrides_declared_type() {
    let language = build_language(&["A", "a"], &["a"], "1 A 1 a 1\n");
    let a_upper = language.symbols().id_of("A").unwrap();
    assert_eq!(language.ambigs().lookup(a_upper)[0].kind, AmbigKind::CaseOnly);
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn fixture_scenarios() {
    let scenarios = load_scenarios();
    assert!(!scenarios.is_empty());
    for scenario in &scenarios {
        let symbols: Vec<&str> = scenario.symbols.iter().map(String::as_str).collect();
        let words: Vec<&str> = scenario.words.iter().map(String::as_str).collect();
        let language = build_language(&symbols, &words, &scenario.ambigs);
        let classifier = scenario.script.iter().fold(ScriptedClassifier::new(), |c, entry| {
            let choices = entry
                .choices
                .iter()
                .map(|(s, r, cert)| BlobChoice::new(language.symbols().id_of(s).unwrap(), *r, *cert))
                .collect();
            c.with((entry.start, entry.end), choices)
        });

        let (mut pieces, seams) = box_row(&scenario.widths, 10);
        let mut recognizer = WordRecognizer::new(language.clone());
        let outcome = recognizer
            .recognize_word(&mut pieces, &seams, &classifier, false)
            .unwrap();

        let name = &scenario.name;
        assert_eq!(outcome.best_choice.text(language.symbols()), scenario.expected_best, "{name}");
        assert_eq!(format!("{:?}", outcome.best_choice.permuter), scenario.expected_permuter, "{name}");
        assert_eq!(outcome.raw_choice.text(language.symbols()), scenario.expected_raw, "{name}");
        assert_eq!(outcome.best_ranges(), scenario.expected_ranges, "{name}");
        assert_eq!(pieces.joined(), None, "{name}");
    }
}

// ---------------------------------------------------------------------------
// Hyphen continuation
// ---------------------------------------------------------------------------

fn hyphen_language() -> Arc<Language> {
    build_language(&["c", "a", "t", "r", "-"], &["cat", "car", "cart"], "")
}

/// "ca-" at the end of line 1.
fn first_line_word(recognizer: &mut WordRecognizer) {
    let language = recognizer.language().clone();
    let classifier = scripted(
        &language,
        &[
            ((0, 0), &[("c", 1.0, -0.5)]),
            ((1, 1), &[("a", 1.0, -0.5)]),
            ((2, 2), &[("-", 1.0, -0.5)]),
        ],
    );
    let (mut pieces, seams) = box_row(&[4, 4, 2], 10);
    let outcome = recognizer
        .recognize_word(&mut pieces, &seams, &classifier, true)
        .unwrap();
    assert_eq!(outcome.best_choice.permuter, Permuter::HyphenPrefix);
    assert_eq!(outcome.best_choice.text(language.symbols()), "ca-");
    assert!(recognizer.hyphen_tracker().is_hyphenated());
}

/// "rt" as the first word of line 2.
fn second_line_word(recognizer: &mut WordRecognizer, last_word_on_line: bool) -> Permuter {
    let language = recognizer.language().clone();
    let classifier = scripted(
        &language,
        &[((0, 0), &[("r", 1.0, -0.5)]), ((1, 1), &[("t", 1.0, -0.5)])],
    );
    let (mut pieces, seams) = box_row(&[4, 4], 10);
    let outcome = recognizer
        .recognize_word(&mut pieces, &seams, &classifier, last_word_on_line)
        .unwrap();
    assert_eq!(outcome.best_choice.text(language.symbols()), "rt");
    outcome.best_choice.permuter
}

#[test]
fn hyphenated_word_continues_on_next_line() {
    let mut recognizer = WordRecognizer::new(hyphen_language());
    first_line_word(&mut recognizer);
    assert_eq!(second_line_word(&mut recognizer, false), Permuter::Dictionary);
    assert_eq!(recognizer.hyphen_tracker().word().unwrap().symbols.len(), 2);
}

#[test]
fn single_line_word_drops_hyphen_state() {
    let mut recognizer = WordRecognizer::new(hyphen_language());
    first_line_word(&mut recognizer);
    assert_eq!(second_line_word(&mut recognizer, true), Permuter::TopChoice);
    assert!(!recognizer.hyphen_tracker().is_hyphenated());
}

#[test]
fn hyphen_state_is_used_once() {
    let mut recognizer = WordRecognizer::new(hyphen_language());
    first_line_word(&mut recognizer);
    assert_eq!(second_line_word(&mut recognizer, false), Permuter::Dictionary);
    // The next word on line 2 starts from the dictionary roots again.
    assert_eq!(second_line_word(&mut recognizer, false), Permuter::TopChoice);
}

// ---------------------------------------------------------------------------
// Cache, concurrency, monotonicity
// ---------------------------------------------------------------------------

#[test]
fn classification_cache_invokes_classifier_once_per_range() {
    let classifier = ScriptedClassifier::uniform(BlobChoice::new(0, 1.0, -1.0));
    let (mut pieces, seams) = box_row(&[3, 3, 3], 6);
    let mut ratings = RatingsMatrix::new(3);
    let first = ratings.get_rating(&mut pieces, &seams, &classifier, 0, 2).to_vec();
    let second = ratings.get_rating(&mut pieces, &seams, &classifier, 0, 2).to_vec();
    assert_eq!(first, second);
    assert_eq!(classifier.calls(), 1);
}

#[test]
fn concurrent_searches_share_language() {
    let language = hyphen_language();
    let classifier = scripted(
        &language,
        &[
            ((0, 0), &[("c", 1.0, -0.5)]),
            ((1, 1), &[("a", 1.2, -0.6), ("t", 1.4, -0.7)]),
            ((2, 2), &[("r", 0.9, -0.4), ("t", 1.0, -0.5)]),
            ((1, 2), &[("a", 2.5, -1.5)]),
        ],
    );
    let run = || {
        let mut recognizer = WordRecognizer::new(language.clone());
        let (mut pieces, seams) = box_row(&[4, 4, 4], 10);
        recognizer
            .recognize_word(&mut pieces, &seams, &classifier, false)
            .unwrap()
            .best_choice
    };
    let expected = run();
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4).map(|_| scope.spawn(run)).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for result in results {
        assert_eq!(result, expected);
    }
    assert_eq!(expected.text(language.symbols()), "car");
}

/// Rates each blob from its piece range so every segmentation differs.
struct RangeRater;

impl Classifier for RangeRater {
    fn classify(&self, blob: &Blob<'_>) -> Vec<BlobChoice> {
        let (s, e) = blob.range();
        let rating = (e - s + 1) as f32 * 0.7 + ((s * 7 + e * 3) % 5) as f32 * 0.3;
        vec![BlobChoice::new(0, rating, -rating)]
    }
}

#[test]
fn best_rating_never_regresses_with_more_states() {
    let language = build_language(&["a"], &["a", "aa", "aaa"], "");
    let mut previous_word = f32::MAX;
    let mut previous_raw = f32::MAX;
    for max_states in 1..=16 {
        let options = SearchOptions {
            max_states,
            accept_certainty: 1.0,
            ..SearchOptions::default()
        };
        let mut recognizer = WordRecognizer::with_options(language.clone(), options);
        let (mut pieces, seams) = box_row(&[3, 3, 3, 3, 3], 6);
        let outcome = recognizer
            .recognize_word(&mut pieces, &seams, &RangeRater, false)
            .unwrap();
        assert!(outcome.states_explored <= max_states);

        let raw = outcome.raw_choice.rating;
        assert!(raw <= previous_raw, "max_states {max_states}: raw {raw} > {previous_raw}");
        previous_raw = raw;

        if outcome.is_dictionary_word() {
            let rating = outcome.best_choice.rating;
            assert!(rating <= previous_word, "max_states {max_states}: {rating} > {previous_word}");
            previous_word = rating;
        } else {
            assert_eq!(previous_word, f32::MAX, "max_states {max_states}: dictionary word lost");
        }
    }
    assert!(previous_word < f32::MAX);
}

#[test]
fn search_terminates_without_revisiting_states() {
    let language = build_language(&["a"], &["aaaaaaa"], "");
    let options = SearchOptions {
        max_states: usize::MAX,
        accept_certainty: 1.0,
        ..SearchOptions::default()
    };
    let mut recognizer = WordRecognizer::with_options(language, options);
    let (mut pieces, seams) = box_row(&[3, 3, 3, 3, 3], 6);
    let outcome = recognizer
        .recognize_word(&mut pieces, &seams, &RangeRater, false)
        .unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Exhausted);
    // Four seams: at most 2^4 segmentations.
    assert_eq!(outcome.states_explored, 16);
    // Every contiguous range classified exactly once.
    assert_eq!(outcome.classifier_calls, 15);
}
