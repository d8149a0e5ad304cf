//! # Parsers
//!
//! This module is responsible for parsing the documents of a QTI package and its result files.
//! Each sub-module is dedicated to one document kind and implements the
//! [`Parser`](crate::traits::parser::Parser) trait, so every parser shares the same fail-fast
//! interface.
//!
//! The available parsers are:
//! - [`assessment_test_parser`]: ordered item references of a `qti-assessment-test`.
//! - [`item_parser`]: `qti-assessment-item` documents and their identifiers.
//! - [`result_parser`]: `assessmentResult` documents, full and validation-grade views.
//! - [`mapping_parser`]: the legacy result-to-item mapping CSV.

pub mod assessment_test_parser;
pub mod item_parser;
pub mod mapping_parser;
pub mod result_parser;
