//! Adapter implementations for the governance context.

mod keyword;
pub mod memory;
pub mod postgres;
mod registry;

pub use keyword::KeywordClassifier;
