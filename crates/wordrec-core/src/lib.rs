//! Shared types for the wordrec word-recognition core.
//!
//! # Architecture
//!
//! - [`symbols`] -- Symbol ids and the symbol set (vocabulary)
//! - [`choice`] -- Classifier choices and word choices
//! - [`geometry`] -- Points and bounding boxes of outline pieces
//! - [`diagnostics`] -- Line-numbered diagnostics for skipped input lines

pub mod choice;
pub mod diagnostics;
pub mod geometry;
pub mod symbols;

/// Error type for symbol set loading.
#[derive(Debug, thiserror::Error)]
pub enum SymbolSetError {
    #[error("symbol set is empty")]
    Empty,
    #[error("symbol set too large: {count} symbols (max {max})")]
    TooLarge { count: usize, max: usize },
}
