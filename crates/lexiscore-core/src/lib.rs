//! lexiscore-core — Essay scoring, CEFR estimation, and follow-up test selection.
//!
//! This crate defines the data model, the collaborator traits (annotation,
//! rule checking, lexical database, word frequencies), and the scoring logic
//! that turns one annotated essay into grammar and vocabulary scores, weak
//! areas, and a short diagnostic test.

pub mod analyzer;
pub mod cache;
pub mod diagnostic;
pub mod diversity;
pub mod document;
pub mod error;
pub mod grading;
pub mod grammar;
pub mod lexicon;
pub mod model;
pub mod parser;
pub mod question_bank;
pub mod results;
pub mod semantic;
pub mod statistics;
pub mod traits;
pub mod vocabulary;
pub mod weak_areas;

#[cfg(test)]
mod test_support;
