//! Word recognition search for the wordrec OCR core.
//!
//! Given the outline pieces of one word, the seams between them and a
//! classifier, find the grouping of pieces into characters and the symbol
//! sequence that best fits both the classifier and the dictionary.
//!
//! # Architecture
//!
//! - [`pieces`] -- Outline arena, seams, reversible join/break of piece ranges
//! - [`ratings`] -- Per-word classification cache and bounding-box match table
//! - [`ambigs`] -- Ambiguity rules: known classifier confusions
//! - [`dict`] -- Traversal of one or more word graphs
//! - [`search`] -- Best-first search over segmentations
//! - [`hyphen`] -- Hyphen continuation across line breaks
//! - [`recognizer`] -- Shared language data and the per-text-flow handle

pub mod ambigs;
pub mod dict;
pub mod hyphen;
pub mod pieces;
pub mod ratings;
pub mod recognizer;
pub mod search;

/// Scripted classifier for tests and benchmarks. Not part of the public API.
#[doc(hidden)]
pub mod testing;

use wordrec_core::choice::BlobChoice;

use crate::pieces::Blob;

pub use crate::recognizer::{Language, LanguageBuilder, RecognizerError, WordRecognizer};
pub use crate::search::{SearchOptions, SearchOutcome, StopReason};

/// The character classifier the search consults.
///
/// Must be deterministic for identical blobs. An empty result means the blob
/// cannot be read as any symbol.
pub trait Classifier {
    /// Ranked choices for `blob`. Order does not matter; the search sorts
    /// them.
    fn classify(&self, blob: &Blob<'_>) -> Vec<BlobChoice>;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn classify(&self, blob: &Blob<'_>) -> Vec<BlobChoice> {
        (**self).classify(blob)
    }
}
