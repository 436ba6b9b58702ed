//! Result types produced by the scorers and the analyzer.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diversity::DiversityBreakdown;
use crate::model::{CefrLevel, GrammarAspect, WeakArea};

// ---------------------------------------------------------------------------
// Grammar
// ---------------------------------------------------------------------------

/// Aspect scores in the order the aspects were first detected.
pub type AspectScores = IndexMap<GrammarAspect, f64>;

/// Multi-dimensional grammar score for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarAnalysis {
    /// Detected aspects and their adjusted correctness scores.
    pub used_aspects: AspectScores,
    /// Tracked aspects that never occurred in the text.
    pub unused_aspects: BTreeSet<GrammarAspect>,
    pub sentence_structure: f64,
    pub sentence_complexity: f64,
    pub grammatical_accuracy: f64,
    pub overall_grammar: f64,
    pub rule_check: RuleCheckReport,
}

impl GrammarAnalysis {
    /// Mean of the used-aspect scores, `None` when nothing was detected.
    pub fn aspect_mean(&self) -> Option<f64> {
        if self.used_aspects.is_empty() {
            return None;
        }
        Some(self.used_aspects.values().sum::<f64>() / self.used_aspects.len() as f64)
    }
}

/// Rule-checker findings plus grammar-side auxiliary metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleCheckReport {
    /// False when the checker was missing, failed or timed out.
    pub available: bool,
    pub total_errors: usize,
    pub errors_by_aspect: BTreeMap<GrammarAspect, Vec<RuleFinding>>,
    pub errors_summary: ErrorSummary,
    pub dominant_errors: Vec<String>,
    pub corrected_text: String,
    pub tips: Vec<Tip>,
    pub extras: RuleCheckExtras,
    pub metrics: GrammarMetrics,
}

/// One rule-checker match, kept for the consolidated error list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFinding {
    pub rule_id: String,
    pub message: String,
    pub context: String,
    pub replacements: Vec<String>,
    /// Character offset into the original text.
    pub offset: usize,
    pub length: usize,
}

/// Rule matches counted by rough category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub grammar: usize,
    pub style: usize,
    pub punctuation: usize,
    pub agreement: usize,
    pub other: usize,
}

impl ErrorSummary {
    pub fn entries(&self) -> [(&'static str, usize); 5] {
        [
            ("grammar", self.grammar),
            ("style", self.style),
            ("punctuation", self.punctuation),
            ("agreement", self.agreement),
            ("other", self.other),
        ]
    }

    /// Categories sharing the highest non-zero count.
    pub fn dominant(&self) -> Vec<String> {
        let max = self.entries().iter().map(|(_, n)| *n).max().unwrap_or(0);
        if max == 0 {
            return Vec::new();
        }
        self.entries()
            .iter()
            .filter(|(_, n)| *n == max)
            .map(|(name, _)| name.to_string())
            .collect()
    }
}

/// A practice tip tied to an error category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tip {
    pub aspect: String,
    pub tip: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleCheckExtras {
    /// Rule matches per word.
    pub error_density: f64,
    pub avg_sentence_length: f64,
    /// Flesch reading ease clamped to `[0, 100]`.
    pub readability_index: f64,
    /// `1 - similarity(original, corrected)`.
    pub correction_intensity: f64,
}

/// Auxiliary grammar metrics. Exposed for insights, never folded into the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarMetrics {
    /// Alphabetic tokens in the annotated document.
    pub word_count: usize,
    pub subject_verb_agreement_issues: Vec<String>,
    pub syntactic_depth_avg: f64,
    /// Connective density proxy, 0–100.
    pub coherence_score: f64,
    /// Share of content words, in percent.
    pub grammatical_density: f64,
    pub sentence_types: SentenceTypes,
    /// Grammar-only level estimate.
    pub estimated_cefr: CefrLevel,
}

impl Default for GrammarMetrics {
    fn default() -> Self {
        Self {
            word_count: 0,
            subject_verb_agreement_issues: Vec::new(),
            syntactic_depth_avg: 0.0,
            coherence_score: 0.0,
            grammatical_density: 0.0,
            sentence_types: SentenceTypes::default(),
            estimated_cefr: CefrLevel::A1,
        }
    }
}

/// Sentence-type distribution in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentenceTypes {
    pub simple: f64,
    pub compound: f64,
    pub complex: f64,
}

impl Default for SentenceTypes {
    fn default() -> Self {
        Self {
            simple: 100.0,
            compound: 0.0,
            complex: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// Multi-dimensional vocabulary score for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyAnalysis {
    /// Count of trigger words per CEFR level; levels with no hits are absent.
    pub level_distribution: BTreeMap<CefrLevel, usize>,
    pub lexical_diversity: f64,
    pub lexical_sophistication: f64,
    pub word_appropriateness: f64,
    pub lexical_errors: Vec<String>,
    pub collocation_errors: Vec<String>,
    pub overall_vocabulary: f64,
    pub semantic: SemanticRichness,
    pub profile: VocabularyProfile,
}

impl VocabularyAnalysis {
    /// Highest CEFR level among the observed trigger words.
    pub fn highest_level(&self) -> Option<CefrLevel> {
        self.level_distribution.keys().next_back().copied()
    }
}

/// Profile figures that feed the overall vocabulary score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabularyProfile {
    /// Percentage of alphabetic tokens per coarse POS tag.
    pub pos_profile: BTreeMap<String, f64>,
    pub content_word_ratio: f64,
    pub avg_word_len: f64,
    pub rare_word_ratio: f64,
    pub style_meta: StyleMeta,
    pub collocation_suggestions: Vec<CollocationSuggestion>,
    pub diversity_breakdown: DiversityBreakdown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleMeta {
    pub informal_ratio: f64,
    pub academic_ratio: f64,
    pub formality: f64,
}

/// Suggested replacements for a generic adjective or verb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollocationSuggestion {
    pub pattern: String,
    pub suggestions: Vec<String>,
    pub note: String,
}

/// Metrics derived from the lexical database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticRichness {
    pub synonym_diversity: f64,
    pub polysemy_score: f64,
    pub semantic_density: f64,
    pub word_frequency: WordFrequency,
    pub extras: SemanticExtras,
}

impl SemanticRichness {
    /// Weighted blend used by the overall vocabulary score.
    pub fn component(&self) -> f64 {
        0.55 * self.synonym_diversity + 0.30 * self.polysemy_score + 0.15 * self.semantic_density
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub common_short: usize,
    pub common_long: usize,
    pub uncommon: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticExtras {
    /// Multiword noun phrases, at most 15.
    pub noun_phrases: Vec<String>,
    pub semantic_coherence: f64,
    pub taxonomy_depth: f64,
    pub avg_hypernyms: f64,
    pub avg_hyponyms: f64,
    pub antonym_contrast_ratio: f64,
    pub derivational_variety: usize,
    pub sense_entropy: f64,
    /// Most common semantic domains of the assigned senses, at most 15.
    pub lexname_distribution: Vec<LexnameCount>,
    pub lexname_diversity: f64,
    pub unique_content_types: usize,
    pub zipf_stats: ZipfStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexnameCount {
    pub lexname: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZipfStats {
    pub mean: f64,
    pub p10: f64,
    pub p90: f64,
}

// ---------------------------------------------------------------------------
// Aggregate result
// ---------------------------------------------------------------------------

/// Plain counts over the submitted text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    /// Length in characters.
    pub text_length: usize,
    /// Whitespace-separated words.
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_sentence_length: f64,
}

/// Headline figures merged from both scorers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub syntactic_depth_avg: f64,
    pub coherence_score: f64,
    pub grammatical_density: f64,
    pub sentence_types: SentenceTypes,
    pub subject_verb_agreement_issues: Vec<String>,
    pub lexical_diversity: f64,
    pub lexical_sophistication: f64,
    pub word_appropriateness: f64,
    pub grammar_score: f64,
    pub vocabulary_score: f64,
    /// Mean of grammar, vocabulary, coherence and grammatical density.
    pub cognitive_maturity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One concrete problem found in the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificError {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// The text around the problem with the flagged span in brackets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Everything produced by one analysis call. Read-only once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    #[serde(flatten)]
    pub text: TextMetrics,
    pub grammar: GrammarAnalysis,
    pub vocabulary: VocabularyAnalysis,
    pub insights: Insights,
    /// Global level estimate from grammar, vocabulary and coherence.
    pub estimated_level: CefrLevel,
    pub confidence: f64,
    pub preliminary_score: f64,
    /// Level used to pick follow-up questions.
    pub preliminary_cefr: CefrLevel,
    pub weak_areas: Vec<WeakArea>,
    pub unused_aspects: BTreeSet<GrammarAspect>,
    pub specific_errors: Vec<SpecificError>,
    pub recommendations: Vec<String>,
    pub processing_ms: u64,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Save the result as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize analysis")?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write analysis to {}", path.display()))?;
        Ok(())
    }

    /// Load a result from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analysis from {}", path.display()))?;
        let result: AnalysisResult =
            serde_json::from_str(&content).context("failed to parse analysis JSON")?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_errors_ties_and_empty() {
        let empty = ErrorSummary::default();
        assert!(empty.dominant().is_empty());

        let summary = ErrorSummary {
            grammar: 2,
            style: 0,
            punctuation: 2,
            agreement: 1,
            other: 0,
        };
        assert_eq!(summary.dominant(), vec!["grammar", "punctuation"]);
    }

    #[test]
    fn specific_error_omits_empty_fields() {
        let err = SpecificError {
            kind: "sentence_structure".into(),
            severity: Severity::Medium,
            description: "Sentence structure problems".into(),
            suggestions: Vec::new(),
            example: None,
        };
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"sentence_structure\""));
        assert!(json.contains("\"medium\""));
        assert!(!json.contains("suggestions"));
        assert!(!json.contains("example"));
    }

    #[test]
    fn semantic_component_weights() {
        let s = SemanticRichness {
            synonym_diversity: 100.0,
            polysemy_score: 50.0,
            semantic_density: 20.0,
            ..Default::default()
        };
        assert!((s.component() - (55.0 + 15.0 + 3.0)).abs() < 1e-9);
    }
}
