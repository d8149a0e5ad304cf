//!
//! Traits Module
//!
//! Core traits shared by the QTI document parsers.
//!
//! - [`parser`]: Defines the generic trait for parsing QTI XML (and the legacy mapping CSV) into
//!   Rust types.

pub mod parser;
