//! The `lexiscore analyze` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::Table;

use lexiscore_core::analyzer::{feedback, Analyzer};
use lexiscore_core::results::AnalysisResult;
use lexiscore_core::traits::Annotator;
use lexiscore_providers::config::load_config_from;
use lexiscore_providers::file_annotator::FileAnnotator;
use lexiscore_providers::{create_annotator, create_frequencies, create_lexicon, create_rule_checker};

/// One essay read from disk.
struct Essay {
    name: String,
    text: String,
}

fn read_essays(path: &Path) -> Result<Vec<Essay>> {
    let read = |file: &Path| -> Result<Essay> {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read essay: {}", file.display()))?;
        let name = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "essay".to_string());
        Ok(Essay { name, text })
    };

    if !path.is_dir() {
        return Ok(vec![read(path)?]);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)
        .with_context(|| format!("failed to read directory: {}", path.display()))?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    anyhow::ensure!(!files.is_empty(), "no .txt essays in {}", path.display());

    files.iter().map(|f| read(f)).collect()
}

pub async fn execute(
    text_path: PathBuf,
    annotations: Option<PathBuf>,
    output: Option<PathBuf>,
    format: String,
    no_rule_check: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        matches!(format.as_str(), "json" | "table"),
        "unknown format '{format}', expected json or table"
    );

    let config = load_config_from(config_path.as_deref())?;
    let essays = read_essays(&text_path)?;

    let annotator: Arc<dyn Annotator> = match annotations {
        Some(path) => Arc::new(FileAnnotator::new(path)),
        None => create_annotator(&config)?,
    };
    let checker = if no_rule_check {
        None
    } else {
        create_rule_checker(&config)?
    };
    if checker.is_none() {
        tracing::info!("rule checking disabled, using local accuracy heuristic");
    }

    let analyzer = Analyzer::new(
        annotator,
        checker,
        create_lexicon(&config),
        create_frequencies(&config),
        config.analyzer_config(),
    );

    let texts: Vec<String> = essays.iter().map(|e| e.text.clone()).collect();
    let outcomes = if texts.len() == 1 {
        vec![analyzer.analyze(&texts[0]).await]
    } else {
        eprintln!("Analyzing {} essays", texts.len());
        analyzer.analyze_batch(&texts).await
    };

    let mut analyzed: Vec<(&Essay, AnalysisResult)> = Vec::new();
    let mut failed = 0;
    for (essay, outcome) in essays.iter().zip(outcomes) {
        match outcome {
            Ok(result) => analyzed.push((essay, result)),
            Err(e) => {
                eprintln!("  {}: {e}", essay.name);
                failed += 1;
            }
        }
    }

    if let Some(out) = &output {
        save_results(out, &analyzed)?;
    }

    match format.as_str() {
        "json" => {
            let json = if analyzed.len() == 1 && essays.len() == 1 {
                serde_json::to_string_pretty(&analyzed[0].1)?
            } else {
                let all: Vec<&AnalysisResult> = analyzed.iter().map(|(_, r)| r).collect();
                serde_json::to_string_pretty(&all)?
            };
            println!("{json}");
        }
        _ => {
            for (essay, result) in &analyzed {
                if essays.len() > 1 {
                    println!("== {} ==", essay.name);
                }
                print_result(result);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} essay(s) could not be analyzed", essays.len());
    }
    Ok(())
}

fn save_results(out: &Path, analyzed: &[(&Essay, AnalysisResult)]) -> Result<()> {
    if let [(_, result)] = analyzed {
        if !out.is_dir() {
            result.save_json(out)?;
            eprintln!("Analysis saved to: {}", out.display());
            return Ok(());
        }
    }

    std::fs::create_dir_all(out)?;
    for (essay, result) in analyzed {
        let path = out.join(format!("{}.json", essay.name));
        result.save_json(&path)?;
        eprintln!("Analysis saved to: {}", path.display());
    }
    Ok(())
}

fn print_result(result: &AnalysisResult) {
    let mut table = Table::new();
    table.set_header(vec!["Measure", "Value"]);
    table.add_row(vec![
        "Words".to_string(),
        result.text.word_count.to_string(),
    ]);
    table.add_row(vec![
        "Sentences".to_string(),
        result.text.sentence_count.to_string(),
    ]);
    table.add_row(vec![
        "Grammar".to_string(),
        format!("{:.1}", result.grammar.overall_grammar),
    ]);
    table.add_row(vec![
        "Vocabulary".to_string(),
        format!("{:.1}", result.vocabulary.overall_vocabulary),
    ]);
    table.add_row(vec![
        "Preliminary".to_string(),
        format!("{} ({:.1})", result.preliminary_cefr, result.preliminary_score),
    ]);
    table.add_row(vec![
        "Estimated level".to_string(),
        format!("{} (confidence {:.0}%)", result.estimated_level, result.confidence),
    ]);
    println!("{table}");

    if !result.weak_areas.is_empty() {
        let mut weak = Table::new();
        weak.set_header(vec!["Weak area", "Score", "Description"]);
        for area in &result.weak_areas {
            weak.add_row(vec![
                area.kind.to_string(),
                format!("{:.1}", area.score),
                area.description.clone(),
            ]);
        }
        println!("{weak}");
    }

    if !result.specific_errors.is_empty() {
        let mut errors = Table::new();
        errors.set_header(vec!["Error", "Severity", "Description"]);
        for err in &result.specific_errors {
            errors.add_row(vec![
                err.kind.clone(),
                format!("{:?}", err.severity).to_lowercase(),
                err.description.clone(),
            ]);
        }
        println!("{errors}");
    }

    let summary = feedback(result);
    println!("{}", summary.grammar);
    println!("{}", summary.vocabulary);
    println!("{}", summary.structure);
    println!("{}", summary.overall);

    for rec in &result.recommendations {
        println!("  - {rec}");
    }
}
