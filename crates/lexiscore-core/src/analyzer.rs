//! Essay analyzer.
//!
//! Validates the text, annotates it once, runs grammar and vocabulary scoring
//! concurrently over the shared document and merges both into a single
//! [`AnalysisResult`] with a preliminary level, weak areas and advice.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::document::AnnotatedDocument;
use crate::error::{AnalysisError, LengthStatus};
use crate::grammar::GrammarScorer;
use crate::model::{CefrLevel, TestQuestion};
use crate::results::{
    AnalysisResult, GrammarAnalysis, Insights, Severity, SpecificError, TextMetrics,
    VocabularyAnalysis,
};
use crate::statistics::{mean, round2};
use crate::traits::{Annotator, FrequencyCorpus, LexicalDatabase, RuleChecker};
use crate::vocabulary::VocabularyScorer;
use crate::weak_areas::{identify_weak_areas, recommendations, WEAK_THRESHOLD};

/// Sentence-structure scores below this are listed as specific errors.
const STRUCTURE_ERROR_THRESHOLD: f64 = 70.0;
/// Rule-check buckets larger than this are reported as high severity.
const HIGH_SEVERITY_BUCKET: usize = 3;
const MAX_SUGGESTIONS: usize = 3;
/// Characters shown when a highlight offset falls outside the text.
const HIGHLIGHT_FALLBACK_CHARS: usize = 200;

/// Configuration for the analyzer.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Fewest whitespace-separated words accepted.
    pub min_words: usize,
    /// Most whitespace-separated words accepted.
    pub max_words: usize,
    /// Upper bound on a single rule-checker call.
    pub rule_check_timeout: Duration,
    /// Characters of context on each side of a highlighted error.
    pub highlight_radius: usize,
    /// Maximum concurrent analyses in [`Analyzer::analyze_batch`].
    pub parallelism: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_words: 90,
            max_words: 400,
            rule_check_timeout: Duration::from_secs(10),
            highlight_radius: 100,
            parallelism: 4,
        }
    }
}

/// The essay analyzer.
pub struct Analyzer {
    annotator: Arc<dyn Annotator>,
    grammar: GrammarScorer,
    vocabulary: VocabularyScorer,
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(
        annotator: Arc<dyn Annotator>,
        checker: Option<Arc<dyn RuleChecker>>,
        lexicon: Arc<dyn LexicalDatabase>,
        corpus: Arc<dyn FrequencyCorpus>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            annotator,
            grammar: GrammarScorer::new(checker, config.rule_check_timeout),
            vocabulary: VocabularyScorer::new(lexicon, corpus),
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Check the whitespace word count against the configured bounds.
    pub fn validate(&self, text: &str) -> Result<usize, AnalysisError> {
        let word_count = text.split_whitespace().count();
        let status = if word_count < self.config.min_words {
            LengthStatus::TooShort
        } else if word_count > self.config.max_words {
            LengthStatus::TooLong
        } else {
            LengthStatus::Valid
        };

        if status == LengthStatus::Valid {
            Ok(word_count)
        } else {
            Err(AnalysisError::TextLengthInvalid {
                word_count,
                status,
                min: self.config.min_words,
                max: self.config.max_words,
            })
        }
    }

    /// Analyze one essay.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let word_count = self.validate(text)?;

        let doc = self
            .annotator
            .annotate(text)
            .await
            .map_err(|e| AnalysisError::AnnotationUnavailable(format!("{e:#}")))?;

        Ok(self.score(Arc::new(doc), word_count, started).await)
    }

    /// Analyze an essay that was annotated elsewhere.
    pub async fn analyze_document(
        &self,
        doc: AnnotatedDocument,
    ) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let word_count = self.validate(doc.text())?;
        Ok(self.score(Arc::new(doc), word_count, started).await)
    }

    /// Analyze many essays with at most `parallelism` in flight.
    ///
    /// Results come back in input order.
    pub async fn analyze_batch(
        &self,
        texts: &[String],
    ) -> Vec<Result<AnalysisResult, AnalysisError>> {
        let semaphore = Semaphore::new(self.config.parallelism.max(1));
        let semaphore = &semaphore;
        let mut futures = FuturesUnordered::new();

        for (idx, text) in texts.iter().enumerate() {
            futures.push(async move {
                let _permit = semaphore.acquire().await.ok();
                (idx, self.analyze(text).await)
            });
        }

        let mut slots: Vec<Option<Result<AnalysisResult, AnalysisError>>> =
            texts.iter().map(|_| None).collect();
        while let Some((idx, result)) = futures.next().await {
            if let Err(e) = &result {
                warn!(index = idx, error = %e, "essay rejected");
            }
            slots[idx] = Some(result);
        }
        slots.into_iter().flatten().collect()
    }

    async fn score(
        &self,
        doc: Arc<AnnotatedDocument>,
        word_count: usize,
        started: Instant,
    ) -> AnalysisResult {
        let (grammar, vocabulary) = tokio::join!(self.grammar.analyze(&doc), async {
            self.vocabulary.analyze(&doc)
        });

        let text = doc.text();
        let insights = collect_insights(&grammar, &vocabulary);
        let estimated_level = estimate_global_cefr(&grammar, &vocabulary);
        let confidence = confidence(&grammar, &vocabulary);
        let specific_errors =
            specific_errors(text, &grammar, &vocabulary, self.config.highlight_radius);

        let preliminary_score = preliminary_score(&grammar, &vocabulary);
        let preliminary_cefr = preliminary_cefr(preliminary_score);
        let weak_areas = identify_weak_areas(&grammar, &vocabulary);
        let unused_aspects = grammar.unused_aspects.clone();
        let recommendations = recommendations(&weak_areas, &unused_aspects);

        debug!(
            preliminary_score,
            preliminary = %preliminary_cefr,
            estimated = %estimated_level,
            confidence,
            weak = weak_areas.len(),
            "analysis merged"
        );

        AnalysisResult {
            id: Uuid::new_v4(),
            text: text_metrics(text, word_count),
            grammar,
            vocabulary,
            insights,
            estimated_level,
            confidence,
            preliminary_score,
            preliminary_cefr,
            weak_areas,
            unused_aspects,
            specific_errors,
            recommendations,
            processing_ms: started.elapsed().as_millis() as u64,
            analyzed_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Character, word and sentence counts. Sentences are split on runs of
/// `.`, `!` and `?`.
pub fn text_metrics(text: &str, word_count: usize) -> TextMetrics {
    let sentence_count = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count();
    TextMetrics {
        text_length: text.chars().count(),
        word_count,
        sentence_count,
        avg_sentence_length: if sentence_count == 0 {
            0.0
        } else {
            round2(word_count as f64 / sentence_count as f64)
        },
    }
}

pub fn collect_insights(grammar: &GrammarAnalysis, vocabulary: &VocabularyAnalysis) -> Insights {
    let metrics = &grammar.rule_check.metrics;
    let cognitive_maturity = round2(mean(&[
        grammar.overall_grammar,
        vocabulary.overall_vocabulary,
        metrics.coherence_score,
        metrics.grammatical_density,
    ]));

    Insights {
        syntactic_depth_avg: metrics.syntactic_depth_avg,
        coherence_score: metrics.coherence_score,
        grammatical_density: metrics.grammatical_density,
        sentence_types: metrics.sentence_types,
        subject_verb_agreement_issues: metrics.subject_verb_agreement_issues.clone(),
        lexical_diversity: vocabulary.lexical_diversity,
        lexical_sophistication: vocabulary.lexical_sophistication,
        word_appropriateness: vocabulary.word_appropriateness,
        grammar_score: grammar.overall_grammar,
        vocabulary_score: vocabulary.overall_vocabulary,
        cognitive_maturity,
    }
}

/// Global level table over the mean of grammar, vocabulary and coherence.
const GLOBAL_CEFR_TABLE: [(f64, CefrLevel); 5] = [
    (90.0, CefrLevel::C2),
    (80.0, CefrLevel::C1),
    (70.0, CefrLevel::B2),
    (60.0, CefrLevel::B1),
    (50.0, CefrLevel::A2),
];

/// Level table for the preliminary essay score. C2 is never assigned from
/// an essay alone.
const PRELIMINARY_CEFR_TABLE: [(f64, CefrLevel); 4] = [
    (85.0, CefrLevel::C1),
    (70.0, CefrLevel::B2),
    (55.0, CefrLevel::B1),
    (40.0, CefrLevel::A2),
];

fn level_at_or_above(score: f64, table: &[(f64, CefrLevel)]) -> CefrLevel {
    table
        .iter()
        .find(|(min, _)| score >= *min)
        .map_or(CefrLevel::A1, |&(_, level)| level)
}

pub fn estimate_global_cefr(grammar: &GrammarAnalysis, vocabulary: &VocabularyAnalysis) -> CefrLevel {
    let avg = mean(&[
        grammar.overall_grammar,
        vocabulary.overall_vocabulary,
        grammar.rule_check.metrics.coherence_score,
    ]);
    level_at_or_above(avg, &GLOBAL_CEFR_TABLE)
}

/// Grows with text length, shrinks when grammar and vocabulary disagree.
pub fn confidence(grammar: &GrammarAnalysis, vocabulary: &VocabularyAnalysis) -> f64 {
    let word_count = grammar.rule_check.metrics.word_count as f64;
    let diff = (grammar.overall_grammar - vocabulary.overall_vocabulary).abs();
    let raw = 40.0 + f64::min(30.0, word_count / 5.0) - f64::min(20.0, diff / 3.0);
    raw.clamp(25.0, 95.0)
}

pub fn preliminary_score(grammar: &GrammarAnalysis, vocabulary: &VocabularyAnalysis) -> f64 {
    round2(grammar.overall_grammar * 0.5 + vocabulary.overall_vocabulary * 0.5)
}

pub fn preliminary_cefr(score: f64) -> CefrLevel {
    level_at_or_above(score, &PRELIMINARY_CEFR_TABLE)
}

/// Text around `offset` with the flagged span in brackets:
/// `...left[span]right...`. Offsets and lengths count characters.
pub fn highlight(text: &str, offset: usize, length: usize, radius: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if offset >= chars.len() {
        return chars.iter().take(HIGHLIGHT_FALLBACK_CHARS).collect();
    }

    let span_end = (offset + length).min(chars.len());
    let start = offset.saturating_sub(radius);
    let end = (span_end + radius).min(chars.len());

    let left: String = chars[start..offset].iter().collect();
    let span: String = chars[offset..span_end].iter().collect();
    let right: String = chars[span_end..end].iter().collect();
    format!("...{left}[{span}]{right}...")
}

/// Every concrete problem found, in a fixed order: weak aspects, structure,
/// rule-checker findings, lexical errors, collocations, agreement.
pub fn specific_errors(
    text: &str,
    grammar: &GrammarAnalysis,
    vocabulary: &VocabularyAnalysis,
    radius: usize,
) -> Vec<SpecificError> {
    let mut errors = Vec::new();

    for (aspect, &score) in &grammar.used_aspects {
        if score < WEAK_THRESHOLD {
            errors.push(plain_error(
                format!("grammar_{aspect}"),
                Severity::Medium,
                format!("Low accuracy using {}: {score:.1}%", aspect.label()),
            ));
        }
    }

    if grammar.sentence_structure < STRUCTURE_ERROR_THRESHOLD {
        errors.push(plain_error(
            "sentence_structure".to_string(),
            Severity::Medium,
            format!(
                "Problems with sentence construction ({:.1}%)",
                grammar.sentence_structure
            ),
        ));
    }

    for (aspect, findings) in &grammar.rule_check.errors_by_aspect {
        let severity = if findings.len() > HIGH_SEVERITY_BUCKET {
            Severity::High
        } else {
            Severity::Low
        };
        for finding in findings {
            errors.push(SpecificError {
                kind: format!("rule_{aspect}"),
                severity,
                description: if finding.message.is_empty() {
                    "Grammar issue".to_string()
                } else {
                    finding.message.clone()
                },
                suggestions: finding.replacements.iter().take(MAX_SUGGESTIONS).cloned().collect(),
                example: Some(highlight(text, finding.offset, finding.length, radius)),
            });
        }
    }

    for err in &vocabulary.lexical_errors {
        errors.push(plain_error("vocabulary_usage".into(), Severity::Low, err.clone()));
    }
    for err in &vocabulary.collocation_errors {
        errors.push(plain_error(
            "vocabulary_collocations".into(),
            Severity::Medium,
            err.clone(),
        ));
    }
    for issue in &grammar.rule_check.metrics.subject_verb_agreement_issues {
        errors.push(plain_error(
            "subject_verb_agreement".into(),
            Severity::Medium,
            issue.clone(),
        ));
    }

    errors
}

fn plain_error(kind: String, severity: Severity, description: String) -> SpecificError {
    SpecificError {
        kind,
        severity,
        description,
        suggestions: Vec::new(),
        example: None,
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// One-line summaries of an analysis, one per dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub grammar: String,
    pub vocabulary: String,
    pub structure: String,
    pub overall: String,
}

fn band(score: f64) -> &'static str {
    if score >= 80.0 {
        "strong"
    } else if score >= 60.0 {
        "adequate"
    } else {
        "needs work"
    }
}

pub fn feedback(result: &AnalysisResult) -> Feedback {
    let grammar = &result.grammar;
    let vocabulary = &result.vocabulary;

    Feedback {
        grammar: format!(
            "Grammar {:.0}/100 ({}): {} aspects used, {} rule-check findings.",
            grammar.overall_grammar,
            band(grammar.overall_grammar),
            grammar.used_aspects.len(),
            grammar.rule_check.total_errors,
        ),
        vocabulary: format!(
            "Vocabulary {:.0}/100 ({}): diversity {:.0}, sophistication {:.0}, {} lexical errors.",
            vocabulary.overall_vocabulary,
            band(vocabulary.overall_vocabulary),
            vocabulary.lexical_diversity,
            vocabulary.lexical_sophistication,
            vocabulary.lexical_errors.len() + vocabulary.collocation_errors.len(),
        ),
        structure: format!(
            "Sentence structure {:.0}/100 ({}), {:.0}% complex sentences.",
            grammar.sentence_structure,
            band(grammar.sentence_structure),
            grammar.sentence_complexity,
        ),
        overall: format!(
            "Preliminary level {} ({:.1}); a follow-up test will confirm it.",
            result.preliminary_cefr, result.preliminary_score,
        ),
    }
}

/// Why the follow-up test was recommended.
pub fn explain_followup(result: &AnalysisResult, questions: &[TestQuestion]) -> String {
    if questions.is_empty() {
        return "No follow-up questions generated".to_string();
    }

    let mut reasons = Vec::new();
    if !result.unused_aspects.is_empty() {
        reasons.push(format!(
            "check {} unused grammar aspects",
            result.unused_aspects.len()
        ));
    }
    if !result.weak_areas.is_empty() {
        reasons.push("clarify the identified weak areas".to_string());
    }
    reasons.push("pin down your level".to_string());

    format!("The follow-up test will help: {}", reasons.join(", "))
}
