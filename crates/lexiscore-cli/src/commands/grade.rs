//! The `lexiscore grade` command.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::Table;
use serde::de::DeserializeOwned;

use lexiscore_core::grading::grade_followup;
use lexiscore_core::model::TestQuestion;
use lexiscore_core::results::AnalysisResult;

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what}: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {what} JSON"))
}

pub fn execute(
    result_path: PathBuf,
    questions_path: PathBuf,
    answers_path: PathBuf,
    format: String,
) -> Result<()> {
    let result = AnalysisResult::load_json(&result_path)?;
    let questions: Vec<TestQuestion> = read_json(&questions_path, "questions")?;
    let answers: HashMap<String, String> = read_json(&answers_path, "answers")?;

    let unknown: Vec<&String> = answers
        .keys()
        .filter(|id| !questions.iter().any(|q| &q.id == *id))
        .collect();
    if !unknown.is_empty() {
        eprintln!("Warning: answers for unknown questions ignored: {unknown:?}");
    }

    let grade = grade_followup(&result, &questions, &answers);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&grade)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Question", "Given", "Correct answer", "Result"]);
    for a in &grade.answers {
        table.add_row(vec![
            a.question_id.clone(),
            a.given.clone().unwrap_or_else(|| "-".to_string()),
            a.correct_answer.clone(),
            if a.correct { "OK" } else { "WRONG" }.to_string(),
        ]);
    }
    println!("{table}");
    println!(
        "Score: {}/{} ({:.1}%)",
        grade.correct, grade.total, grade.accuracy
    );
    println!(
        "Level: {} (preliminary {})",
        grade.final_cefr, grade.preliminary_cefr
    );

    let confirmed: Vec<String> = grade
        .confirmed()
        .map(|a| format!("{} ({})", a.kind, a.description))
        .collect();
    if confirmed.is_empty() {
        println!("No weak areas confirmed.");
    } else {
        println!("Confirmed weak areas:");
        for c in confirmed {
            println!("  - {c}");
        }
    }

    Ok(())
}
