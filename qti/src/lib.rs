//! # QTI Library
//!
//! This crate provides the core logic for grading QTI 3.0 assessments against learner result
//! files. It parses an assessment package (one `qti-assessment-test` plus its item documents),
//! checks that the package and every uploaded result file agree with each other, maps the items of
//! each result file onto the canonical assessment items, and turns rubric outcome flags into
//! scores and result-file updates.
//!
//! ## Key Concepts
//! - **Href resolution**: item references resolve relative to the assessment test, with a unique
//!   basename fallback for packages whose folders were flattened ([`href`]).
//! - **Consistency validation**: every problem of an upload is collected in one report
//!   ([`validation`]).
//! - **Remapping**: result entries are matched to items by position, identifier, legacy mapping or
//!   `Q<N>` placeholder ([`remap`]).
//! - **Scoring**: rubric criteria are authoritative whenever an item has them ([`scorer`]).
//! - **Result updates**: grading edits are written back into the result XML ([`result_update`]).
//!
//! Everything here is synchronous and free of I/O; callers read files and persist output.

pub mod error;
pub mod href;
pub mod parsers;
pub mod remap;
pub mod result_update;
pub mod scorer;
pub mod scoring_input;
pub mod traits;
pub mod types;
pub mod validation;
pub mod xml;

pub use error::{ErrorKind, QtiError};
pub use remap::{RemapResult, RemapTier, ResultRemapper};
pub use validation::{PackageUpload, ResultFile, ValidationReport, validate};
