//! End-to-end pipeline tests with mock collaborators.
//!
//! These run the analyzer, follow-up generation and grading in process, the
//! way the CLI chains them, with the annotator and rule checker mocked.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lexiscore_core::analyzer::{Analyzer, AnalyzerConfig};
use lexiscore_core::diagnostic::{DiagnosticEngine, MAX_QUESTIONS};
use lexiscore_core::document::{AnnotatedDocument, DocumentBuilder, Number, Pos};
use lexiscore_core::error::{AnalysisError, LengthStatus};
use lexiscore_core::grading::grade_followup;
use lexiscore_core::model::GrammarAspect;
use lexiscore_core::traits::{NoFrequencies, NoLexicon, RuleChecker, RuleMatch};
use lexiscore_providers::mock::{MockAnnotator, MockRuleChecker};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// `n` sentences of "Tom writes long letters quickly." (5n words).
fn essay(n: usize) -> AnnotatedDocument {
    let mut builder = DocumentBuilder::new();
    for _ in 0..n {
        builder = builder
            .push("Tom", "Tom", Pos::Propn, "NNP", "nsubj", 1)
            .number(Number::Sing)
            .push("writes", "write", Pos::Verb, "VBZ", "ROOT", 1)
            .number(Number::Sing)
            .push("long", "long", Pos::Adj, "JJ", "amod", 3)
            .push("letters", "letter", Pos::Noun, "NNS", "dobj", 1)
            .number(Number::Plur)
            .push("quickly", "quickly", Pos::Adv, "RB", "advmod", 1)
            .push(".", ".", Pos::Punct, ".", "punct", 1)
            .end_sentence();
    }
    builder.build()
}

fn analyzer(checker: Option<Arc<dyn RuleChecker>>, config: AnalyzerConfig) -> Analyzer {
    Analyzer::new(
        Arc::new(MockAnnotator::new([essay(19), essay(81)])),
        checker,
        Arc::new(NoLexicon),
        Arc::new(NoFrequencies),
        config,
    )
}

#[tokio::test]
async fn e2e_clean_essay_to_grade() {
    let checker = Arc::new(MockRuleChecker::clean());
    let analyzer = analyzer(Some(checker.clone()), AnalyzerConfig::default());

    let text = essay(19).text().to_string();
    let result = analyzer.analyze(&text).await.unwrap();

    assert_eq!(checker.call_count(), 1);
    assert_eq!(result.text.word_count, 95);
    assert!(result.grammar.rule_check.available);
    assert_eq!(result.grammar.rule_check.total_errors, 0);
    assert!(result.grammar.used_aspects.contains_key(&GrammarAspect::PresentSimple));
    assert!(!result.unused_aspects.contains(&GrammarAspect::PresentSimple));
    assert_eq!(
        result.grammar.used_aspects.len() + result.unused_aspects.len(),
        GrammarAspect::TRACKED.len()
    );
    assert!((0.0..=100.0).contains(&result.preliminary_score));

    let engine = DiagnosticEngine::default();
    let questions =
        engine.generate_followup_test_with_rng(&result, &mut ChaCha8Rng::seed_from_u64(11));
    assert!(!questions.is_empty());
    assert!(questions.len() <= MAX_QUESTIONS);

    // Miss the first question, answer the rest correctly.
    let answers: HashMap<String, String> = questions
        .iter()
        .skip(1)
        .map(|q| (q.id.clone(), q.correct_answer.clone()))
        .collect();
    let grade = grade_followup(&result, &questions, &answers);
    assert_eq!(grade.total, questions.len());
    assert_eq!(grade.correct, questions.len() - 1);
    assert_eq!(grade.preliminary_cefr, result.preliminary_cefr);
    assert!(!grade.answers[0].correct);
}

#[tokio::test]
async fn e2e_rule_errors_flow_into_result() {
    let text = essay(19).text().to_string();
    let checker = Arc::new(MockRuleChecker::new(vec![RuleMatch {
        rule_id: "MISSING_ARTICLE".into(),
        message: "Consider adding an article.".into(),
        offset: 4,
        length: 6,
        replacements: vec!["writes a".into()],
        context: String::new(),
    }]));
    let analyzer = analyzer(Some(checker.clone()), AnalyzerConfig::default());

    let result = analyzer.analyze(&text).await.unwrap();
    assert_eq!(checker.last_text().as_deref(), Some(text.as_str()));
    assert_eq!(result.grammar.rule_check.total_errors, 1);
    assert!(result
        .grammar
        .rule_check
        .errors_by_aspect
        .contains_key(&GrammarAspect::Articles));
    assert!(result.specific_errors.iter().any(|e| e.kind == "rule_articles"));
}

#[tokio::test(start_paused = true)]
async fn e2e_slow_checker_falls_back() {
    let checker = Arc::new(MockRuleChecker::clean().with_delay(Duration::from_secs(60)));
    let config = AnalyzerConfig {
        rule_check_timeout: Duration::from_secs(2),
        ..AnalyzerConfig::default()
    };
    let analyzer = analyzer(Some(checker.clone()), config);

    let result = analyzer.analyze(essay(19).text()).await.unwrap();
    assert_eq!(checker.call_count(), 1);
    assert!(!result.grammar.rule_check.available);
    assert!(result.grammar.overall_grammar > 0.0);
}

#[tokio::test]
async fn e2e_failing_checker_falls_back() {
    let checker = Arc::new(MockRuleChecker::failing("connection refused"));
    let analyzer = analyzer(Some(checker), AnalyzerConfig::default());

    let result = analyzer.analyze(essay(19).text()).await.unwrap();
    assert!(!result.grammar.rule_check.available);
}

#[tokio::test]
async fn e2e_missing_annotation_is_an_error() {
    let analyzer = analyzer(None, AnalyzerConfig::default());
    let text = vec!["word"; 120].join(" ");

    let err = analyzer.analyze(&text).await.unwrap_err();
    assert!(matches!(err, AnalysisError::AnnotationUnavailable(_)));
}

#[tokio::test]
async fn e2e_batch_keeps_input_order() {
    let analyzer = analyzer(None, AnalyzerConfig::default());
    let texts = vec![
        essay(19).text().to_string(),
        "Too short.".to_string(),
        essay(81).text().to_string(),
    ];

    let results = analyzer.analyze_batch(&texts).await;
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().text.word_count, 95);
    assert_eq!(
        results[1].as_ref().unwrap_err().length_status(),
        Some(LengthStatus::TooShort)
    );
    assert_eq!(
        results[2].as_ref().unwrap_err().length_status(),
        Some(LengthStatus::TooLong)
    );
}
