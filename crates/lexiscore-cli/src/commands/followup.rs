//! The `lexiscore followup` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::Table;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use lexiscore_core::analyzer::explain_followup;
use lexiscore_core::diagnostic::DiagnosticEngine;
use lexiscore_core::parser::{load_banks, merge_banks};
use lexiscore_core::question_bank::default_bank;
use lexiscore_core::results::AnalysisResult;
use lexiscore_providers::config::load_config_from;

pub fn execute(
    result_path: PathBuf,
    seed: Option<u64>,
    bank_paths: Vec<PathBuf>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let result = AnalysisResult::load_json(&result_path)?;

    let mut banks = Vec::new();
    for path in config.question_banks.iter().chain(&bank_paths) {
        banks.extend(
            load_banks(path)
                .with_context(|| format!("failed to load question bank: {}", path.display()))?,
        );
    }
    let engine = DiagnosticEngine::new(merge_banks(default_bank(), &banks));

    let questions = match seed.or(config.followup_seed) {
        Some(seed) => {
            engine.generate_followup_test_with_rng(&result, &mut ChaCha8Rng::seed_from_u64(seed))
        }
        None => engine.generate_followup_test(&result),
    };

    let mut table = Table::new();
    table.set_header(vec!["#", "ID", "Level", "Question", "Options"]);
    for (i, q) in questions.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            q.id.clone(),
            q.difficulty.to_string(),
            q.question.clone(),
            q.options.join(" / "),
        ]);
    }
    println!("{table}");
    println!("{}", explain_followup(&result, &questions));

    if let Some(out) = output {
        let json = serde_json::to_string_pretty(&questions)?;
        std::fs::write(&out, json)
            .with_context(|| format!("failed to write questions to {}", out.display()))?;
        eprintln!("Questions saved to: {}", out.display());
    }

    Ok(())
}
