// Classifier stand-in that answers from a table keyed by piece range.

use std::sync::atomic::{AtomicUsize, Ordering};

use hashbrown::HashMap;
use wordrec_core::choice::BlobChoice;

use crate::Classifier;
use crate::pieces::Blob;

/// Returns fixed choices per blob range and counts its invocations.
/// Ranges without an entry get the fallback, or no choice at all.
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    script: HashMap<(usize, usize), Vec<BlobChoice>>,
    fallback: Vec<BlobChoice>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same single choice for every blob.
    pub fn uniform(choice: BlobChoice) -> Self {
        Self {
            fallback: vec![choice],
            ..Self::default()
        }
    }

    /// Answer `choices` for pieces `range.0..=range.1`.
    pub fn with(mut self, range: (usize, usize), choices: Vec<BlobChoice>) -> Self {
        self.script.insert(range, choices);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Classifier for ScriptedClassifier {
    fn classify(&self, blob: &Blob<'_>) -> Vec<BlobChoice> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.script
            .get(&blob.range())
            .unwrap_or(&self.fallback)
            .clone()
    }
}
