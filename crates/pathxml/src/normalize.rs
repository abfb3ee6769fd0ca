//! Path event normalization
//!
//! Converts the tokenizer's element boundaries into the path-addressed event
//! stream builders consume.

pub mod event;
pub mod normalizer;

pub use event::{EventKind, PathEvent};
pub use normalizer::Normalizer;
