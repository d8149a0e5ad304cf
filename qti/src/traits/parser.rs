//! Parser Trait
//!
//! This module defines the [`Parser`] trait, the common interface of every QTI document parser in
//! this crate. Implementations validate the raw document text and convert it into the matching
//! domain type, failing fast with a [`QtiError`].
//!
//! # Example
//!
//! ```rust
//! use qti::error::QtiError;
//! use qti::traits::parser::Parser;
//!
//! struct LineCounter;
//!
//! impl<'a> Parser<&'a str, usize> for LineCounter {
//!     fn parse(&self, raw: &'a str) -> Result<usize, QtiError> {
//!         Ok(raw.lines().count())
//!     }
//! }
//!
//! assert_eq!(LineCounter.parse("a\nb").unwrap(), 2);
//! ```

use crate::error::QtiError;

/// A generic trait for parsing a document into a strongly-typed Rust structure.
///
/// # Type Parameters
///
/// * `Input` - The input type to be parsed (usually `&str` XML).
/// * `Output` - The output type produced by the parser.
pub trait Parser<Input, Output> {
    /// Parse an input value into the target type.
    ///
    /// # Errors
    ///
    /// Returns a [`QtiError`] if the input is malformed or misses required structure.
    fn parse(&self, input: Input) -> Result<Output, QtiError>;
}
