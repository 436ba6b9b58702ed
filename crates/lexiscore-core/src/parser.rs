//! TOML question-bank parser.
//!
//! Loads question banks from TOML files and directories, merges them and
//! validates them.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{CefrLevel, GrammarAspect, QuestionBank, QuestionType, TestQuestion};
use crate::question_bank::irt_params;

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(rename = "type")]
    question_type: QuestionType,
    aspect: String,
    question: String,
    #[serde(default)]
    options: Vec<String>,
    answer: String,
    level: String,
    #[serde(default)]
    topic: String,
    /// Overrides the level-derived IRT difficulty.
    #[serde(default)]
    difficulty_param: Option<f64>,
    /// Overrides the level-derived IRT discrimination.
    #[serde(default)]
    discrimination_param: Option<f64>,
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let difficulty: CefrLevel = q
                .level
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;
            let aspect: GrammarAspect = q
                .aspect
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;
            let (difficulty_param, discrimination_param) = irt_params(difficulty);

            Ok(TestQuestion {
                id: q.id,
                question_type: q.question_type,
                aspect,
                question: q.question,
                options: q.options,
                correct_answer: q.answer,
                difficulty,
                topic: q.topic,
                difficulty_param: q.difficulty_param.unwrap_or(difficulty_param),
                discrimination_param: q.discrimination_param.unwrap_or(discrimination_param),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        questions,
    })
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load a bank file, or every bank under a directory.
pub fn load_banks(path: &Path) -> Result<Vec<QuestionBank>> {
    if path.is_dir() {
        load_bank_directory(path)
    } else {
        Ok(vec![parse_bank(path)?])
    }
}

/// Concatenate banks into one question list. A later question replaces an
/// earlier one with the same id, keeping the earlier position.
pub fn merge_banks(base: &[TestQuestion], banks: &[QuestionBank]) -> Vec<TestQuestion> {
    let mut merged: Vec<TestQuestion> = base.to_vec();
    let mut index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, q)| (q.id.clone(), i))
        .collect();

    for bank in banks {
        for q in &bank.questions {
            match index.get(&q.id) {
                Some(&i) => {
                    tracing::debug!(id = %q.id, bank = %bank.id, "question overridden");
                    merged[i] = q.clone();
                }
                None => {
                    index.insert(q.id.clone(), merged.len());
                    merged.push(q.clone());
                }
            }
        }
    }
    merged
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a bank for common issues.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let warn = |q: &TestQuestion, message: String| ValidationWarning {
        question_id: Some(q.id.clone()),
        message,
    };

    if bank.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "bank has no questions".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for q in &bank.questions {
        if !seen_ids.insert(&q.id) {
            warnings.push(warn(q, format!("duplicate question ID: {}", q.id)));
        }
    }

    for q in &bank.questions {
        if q.question.trim().is_empty() {
            warnings.push(warn(q, "question prompt is empty".into()));
        }
        if q.options.len() < 2 {
            warnings.push(warn(
                q,
                format!("needs at least two options, has {}", q.options.len()),
            ));
        }
        if !q.options.iter().any(|o| o == &q.correct_answer) {
            warnings.push(warn(
                q,
                format!("answer '{}' is not among the options", q.correct_answer),
            ));
        }
    }

    warnings
}
