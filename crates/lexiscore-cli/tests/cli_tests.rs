//! CLI integration tests using assert_cmd.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use lexiscore_core::document::{DocumentBuilder, Number, Pos};
use lexiscore_core::model::TestQuestion;

fn lexiscore() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("lexiscore").unwrap()
}

/// Offline fixture: an essay, its annotation, and a config without a rule checker.
struct Fixture {
    dir: TempDir,
    essay: PathBuf,
    annotations: PathBuf,
    config: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();

    let mut builder = DocumentBuilder::new();
    for _ in 0..19 {
        builder = builder
            .push("Anna", "Anna", Pos::Propn, "NNP", "nsubj", 1)
            .number(Number::Sing)
            .push("reads", "read", Pos::Verb, "VBZ", "ROOT", 1)
            .number(Number::Sing)
            .push("short", "short", Pos::Adj, "JJ", "amod", 3)
            .push("stories", "story", Pos::Noun, "NNS", "dobj", 1)
            .number(Number::Plur)
            .push("slowly", "slowly", Pos::Adv, "RB", "advmod", 1)
            .push(".", ".", Pos::Punct, ".", "punct", 1)
            .end_sentence();
    }
    let doc = builder.build();

    let essay = dir.path().join("essay.txt");
    std::fs::write(&essay, doc.text()).unwrap();
    let annotations = dir.path().join("essay.json");
    std::fs::write(&annotations, serde_json::to_string(&doc).unwrap()).unwrap();
    let config = dir.path().join("lexiscore.toml");
    std::fs::write(&config, "[rule_checker]\ntype = \"none\"\n").unwrap();

    Fixture {
        dir,
        essay,
        annotations,
        config,
    }
}

fn analyze(f: &Fixture, extra: &[&str]) -> assert_cmd::assert::Assert {
    lexiscore()
        .current_dir(f.dir.path())
        .arg("analyze")
        .arg("--text")
        .arg(&f.essay)
        .arg("--annotations")
        .arg(&f.annotations)
        .arg("--config")
        .arg(&f.config)
        .args(extra)
        .assert()
}

#[test]
fn validate_travel_bank() {
    lexiscore()
        .arg("validate-bank")
        .arg("--bank")
        .arg("../../question-banks/travel.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("8 questions"))
        .stdout(predicate::str::contains("All question banks valid"));
}

#[test]
fn validate_bank_directory() {
    lexiscore()
        .arg("validate-bank")
        .arg("--bank")
        .arg("../../question-banks")
        .assert()
        .success()
        .stdout(predicate::str::contains("Travel English"))
        .stdout(predicate::str::contains("Business English"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[bank]
id = "broken"
name = "Broken"

[[questions]]
id = "b1"
type = "grammar_articles"
aspect = "articles"
question = "She is ______ engineer."
options = ["a", "the"]
answer = "an"
level = "A1"
"#,
    )
    .unwrap();

    lexiscore()
        .arg("validate-bank")
        .arg("--bank")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[b1] WARNING"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_bank() {
    lexiscore()
        .arg("validate-bank")
        .arg("--bank")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    lexiscore()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created lexiscore.toml"))
        .stdout(predicate::str::contains("Created question-banks/example.toml"));

    assert!(dir.path().join("lexiscore.toml").exists());

    lexiscore()
        .arg("validate-bank")
        .arg("--bank")
        .arg(dir.path().join("question-banks/example.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("All question banks valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    lexiscore()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    lexiscore()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn analyze_table_output() {
    let f = fixture();
    analyze(&f, &[])
        .success()
        .stdout(predicate::str::contains("Preliminary"))
        .stdout(predicate::str::contains("Grammar"))
        .stdout(predicate::str::contains("follow-up test will confirm"));
}

#[test]
fn analyze_json_output() {
    let f = fixture();
    let out = analyze(&f, &["--format", "json"]).success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["word_count"], 95);
    assert_eq!(json["sentence_count"], 19);
    assert!(json["grammar"]["used_aspects"]["present_simple"].is_number());
}

#[test]
fn analyze_rejects_short_text() {
    let f = fixture();
    let short = f.dir.path().join("short.txt");
    std::fs::write(&short, "This essay is far too short to be scored.").unwrap();

    lexiscore()
        .current_dir(f.dir.path())
        .arg("analyze")
        .arg("--text")
        .arg(&short)
        .arg("--config")
        .arg(&f.config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("TOO_SHORT"));
}

#[test]
fn analyze_rejects_unknown_format() {
    let f = fixture();
    analyze(&f, &["--format", "xml"])
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

fn run_pipeline(f: &Fixture) -> (PathBuf, PathBuf) {
    let result = f.dir.path().join("analysis.json");
    analyze(f, &["--output", result.to_str().unwrap()]).success();
    assert!(result.exists());

    let questions = f.dir.path().join("questions.json");
    lexiscore()
        .current_dir(f.dir.path())
        .arg("followup")
        .arg("--result")
        .arg(&result)
        .arg("--seed")
        .arg("7")
        .arg("--config")
        .arg(&f.config)
        .arg("--output")
        .arg(&questions)
        .assert()
        .success()
        .stdout(predicate::str::contains("The follow-up test will help"));

    (result, questions)
}

fn load_questions(path: &Path) -> Vec<TestQuestion> {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn followup_is_stable_under_seed() {
    let f = fixture();
    let (result, first) = run_pipeline(&f);
    let first = load_questions(&first);
    assert!(!first.is_empty());
    assert!(first.len() <= 10);

    let second = f.dir.path().join("questions-2.json");
    lexiscore()
        .current_dir(f.dir.path())
        .arg("followup")
        .arg("--result")
        .arg(&result)
        .arg("--seed")
        .arg("7")
        .arg("--config")
        .arg(&f.config)
        .arg("--output")
        .arg(&second)
        .assert()
        .success();

    let ids = |qs: &[TestQuestion]| qs.iter().map(|q| q.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&load_questions(&second)));
}

#[test]
fn grade_all_correct() {
    let f = fixture();
    let (result, questions_path) = run_pipeline(&f);
    let questions = load_questions(&questions_path);

    let answers: HashMap<String, String> = questions
        .iter()
        .map(|q| (q.id.clone(), q.correct_answer.clone()))
        .collect();
    let answers_path = f.dir.path().join("answers.json");
    std::fs::write(&answers_path, serde_json::to_string(&answers).unwrap()).unwrap();

    lexiscore()
        .arg("grade")
        .arg("--result")
        .arg(&result)
        .arg("--questions")
        .arg(&questions_path)
        .arg("--answers")
        .arg(&answers_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("(100.0%)"))
        .stdout(predicate::str::contains("Level: C2"))
        .stdout(predicate::str::contains("No weak areas confirmed"));
}

#[test]
fn grade_unanswered_json() {
    let f = fixture();
    let (result, questions_path) = run_pipeline(&f);
    let answers_path = f.dir.path().join("answers.json");
    std::fs::write(&answers_path, "{}").unwrap();

    let out = lexiscore()
        .arg("grade")
        .arg("--result")
        .arg(&result)
        .arg("--questions")
        .arg(&questions_path)
        .arg("--answers")
        .arg(&answers_path)
        .arg("--format")
        .arg("json")
        .assert()
        .success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    let grade: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(grade["correct"], 0);
    assert_eq!(grade["final_cefr"], "A1");
}
