//! lexiscore-providers — collaborator integrations.
//!
//! Implements the `lexiscore-core` collaborator traits over an HTTP
//! annotation service, pre-annotated files, a LanguageTool server, and
//! file-backed lexical and frequency data.

pub mod config;
pub mod error;
pub mod file_annotator;
pub mod http_annotator;
pub mod languagetool;
pub mod lexicon_file;
pub mod mock;

pub use config::{
    create_annotator, create_frequencies, create_lexicon, create_rule_checker, load_config,
    load_config_from, AnnotatorConfig, LexiscoreConfig, RuleCheckerConfig,
};
pub use error::ProviderError;
