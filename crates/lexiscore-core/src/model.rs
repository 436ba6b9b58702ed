//! Core data model types for lexiscore.
//!
//! Proficiency levels, grammar aspects, question types, weak areas and the
//! diagnostic questions drawn from a bank.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CEFR proficiency level, ordered from A1 (lowest) to C2 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// Every level in ascending order.
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    /// The level directly above this one, or `None` for C2.
    pub fn next(self) -> Option<CefrLevel> {
        let idx = self.rank();
        Self::ALL.get(idx + 1).copied()
    }

    /// Zero-based position on the ladder (A1 = 0, C2 = 5).
    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CefrLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A1" => Ok(CefrLevel::A1),
            "A2" => Ok(CefrLevel::A2),
            "B1" => Ok(CefrLevel::B1),
            "B2" => Ok(CefrLevel::B2),
            "C1" => Ok(CefrLevel::C1),
            "C2" => Ok(CefrLevel::C2),
            other => Err(format!("unknown CEFR level: {other}")),
        }
    }
}

/// A grammar feature tracked independently by the grammar scorer.
///
/// The first fifteen variants form the tracked universe. The last three are
/// buckets that only rule-checker findings map into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarAspect {
    PresentSimple,
    PresentContinuous,
    PastSimple,
    PastContinuous,
    PresentPerfect,
    PastPerfect,
    FutureSimple,
    FutureContinuous,
    FuturePerfect,
    Conditionals,
    PassiveVoice,
    ModalVerbs,
    RelativeClauses,
    Articles,
    Prepositions,
    VocabularyUsage,
    VocabularyCollocations,
    SentenceStructure,
}

impl GrammarAspect {
    /// The fixed universe of aspects that used/unused partition.
    pub const TRACKED: [GrammarAspect; 15] = [
        GrammarAspect::PresentSimple,
        GrammarAspect::PresentContinuous,
        GrammarAspect::PastSimple,
        GrammarAspect::PastContinuous,
        GrammarAspect::PresentPerfect,
        GrammarAspect::PastPerfect,
        GrammarAspect::FutureSimple,
        GrammarAspect::FutureContinuous,
        GrammarAspect::FuturePerfect,
        GrammarAspect::Conditionals,
        GrammarAspect::PassiveVoice,
        GrammarAspect::ModalVerbs,
        GrammarAspect::RelativeClauses,
        GrammarAspect::Articles,
        GrammarAspect::Prepositions,
    ];

    pub fn is_tracked(self) -> bool {
        !matches!(
            self,
            GrammarAspect::VocabularyUsage
                | GrammarAspect::VocabularyCollocations
                | GrammarAspect::SentenceStructure
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GrammarAspect::PresentSimple => "present_simple",
            GrammarAspect::PresentContinuous => "present_continuous",
            GrammarAspect::PastSimple => "past_simple",
            GrammarAspect::PastContinuous => "past_continuous",
            GrammarAspect::PresentPerfect => "present_perfect",
            GrammarAspect::PastPerfect => "past_perfect",
            GrammarAspect::FutureSimple => "future_simple",
            GrammarAspect::FutureContinuous => "future_continuous",
            GrammarAspect::FuturePerfect => "future_perfect",
            GrammarAspect::Conditionals => "conditionals",
            GrammarAspect::PassiveVoice => "passive_voice",
            GrammarAspect::ModalVerbs => "modal_verbs",
            GrammarAspect::RelativeClauses => "relative_clauses",
            GrammarAspect::Articles => "articles",
            GrammarAspect::Prepositions => "prepositions",
            GrammarAspect::VocabularyUsage => "vocabulary_usage",
            GrammarAspect::VocabularyCollocations => "vocabulary_collocations",
            GrammarAspect::SentenceStructure => "sentence_structure",
        }
    }

    /// Human-readable label, e.g. "present perfect".
    pub fn label(self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for GrammarAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrammarAspect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::TRACKED
            .iter()
            .chain(&[
                GrammarAspect::VocabularyUsage,
                GrammarAspect::VocabularyCollocations,
                GrammarAspect::SentenceStructure,
            ])
            .copied()
            .find(|aspect| aspect.as_str() == wanted)
            .ok_or_else(|| format!("unknown grammar aspect: {s}"))
    }
}

/// Category of a diagnostic question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    GrammarTenses,
    GrammarArticles,
    GrammarPrepositions,
    GrammarConditionals,
    VocabularyComplexity,
    VocabularyAppropriateness,
    VocabularyCollocations,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuestionType::GrammarTenses => "grammar_tenses",
            QuestionType::GrammarArticles => "grammar_articles",
            QuestionType::GrammarPrepositions => "grammar_prepositions",
            QuestionType::GrammarConditionals => "grammar_conditionals",
            QuestionType::VocabularyComplexity => "vocabulary_complexity",
            QuestionType::VocabularyAppropriateness => "vocabulary_appropriateness",
            QuestionType::VocabularyCollocations => "vocabulary_collocations",
        };
        f.write_str(s)
    }
}

/// A single diagnostic question from the bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestQuestion {
    /// Unique identifier within the bank.
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Grammar aspect the question targets.
    pub aspect: GrammarAspect,
    /// Prompt shown to the learner, usually with a `______` gap.
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    /// CEFR level the question is pitched at.
    pub difficulty: CefrLevel,
    #[serde(default)]
    pub topic: String,
    /// IRT item difficulty, derived from `difficulty`.
    pub difficulty_param: f64,
    /// IRT item discrimination, derived from `difficulty`.
    pub discrimination_param: f64,
}

/// A named collection of questions loaded from a bank file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    pub description: String,
    pub questions: Vec<TestQuestion>,
}

/// What a weak area refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum WeakAreaKind {
    Grammar(GrammarAspect),
    SentenceStructure,
    VocabularyRange,
    LexicalErrors,
}

impl WeakAreaKind {
    /// Stable identifier such as `grammar_present_simple` or `vocabulary_range`.
    pub fn id(&self) -> String {
        match self {
            WeakAreaKind::Grammar(aspect) => format!("grammar_{aspect}"),
            WeakAreaKind::SentenceStructure => "sentence_structure".to_string(),
            WeakAreaKind::VocabularyRange => "vocabulary_range".to_string(),
            WeakAreaKind::LexicalErrors => "lexical_errors".to_string(),
        }
    }

    pub fn is_grammar(&self) -> bool {
        matches!(self, WeakAreaKind::Grammar(_))
    }

    pub fn is_vocabulary(&self) -> bool {
        matches!(self, WeakAreaKind::VocabularyRange)
    }
}

impl fmt::Display for WeakAreaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl From<WeakAreaKind> for String {
    fn from(kind: WeakAreaKind) -> Self {
        kind.id()
    }
}

impl TryFrom<String> for WeakAreaKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "sentence_structure" => Ok(WeakAreaKind::SentenceStructure),
            "vocabulary_range" => Ok(WeakAreaKind::VocabularyRange),
            "lexical_errors" => Ok(WeakAreaKind::LexicalErrors),
            other => other
                .strip_prefix("grammar_")
                .ok_or_else(|| format!("unknown weak area: {other}"))
                .and_then(GrammarAspect::from_str)
                .map(WeakAreaKind::Grammar),
        }
    }
}

/// A weakness derived from the essay, optionally confirmed by a follow-up test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakArea {
    #[serde(rename = "aspect")]
    pub kind: WeakAreaKind,
    pub score: f64,
    pub description: String,
    pub recommendations: Vec<String>,
    /// Only set once a follow-up test corroborates the weakness.
    #[serde(default)]
    pub confirmed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cefr_total_order_and_next() {
        assert!(CefrLevel::A1 < CefrLevel::A2);
        assert!(CefrLevel::C1 < CefrLevel::C2);
        assert_eq!(CefrLevel::B1.next(), Some(CefrLevel::B2));
        assert_eq!(CefrLevel::C2.next(), None);
        assert_eq!("b2".parse::<CefrLevel>().unwrap(), CefrLevel::B2);
        assert!("D1".parse::<CefrLevel>().is_err());
    }

    #[test]
    fn tracked_universe_has_fifteen_aspects() {
        assert_eq!(GrammarAspect::TRACKED.len(), 15);
        assert!(GrammarAspect::TRACKED.iter().all(|a| a.is_tracked()));
        assert!(!GrammarAspect::SentenceStructure.is_tracked());
    }

    #[test]
    fn aspect_serde_and_parse() {
        let json = serde_json::to_string(&GrammarAspect::PastPerfect).unwrap();
        assert_eq!(json, "\"past_perfect\"");
        assert_eq!(
            "vocabulary_usage".parse::<GrammarAspect>().unwrap(),
            GrammarAspect::VocabularyUsage
        );
    }

    #[test]
    fn weak_area_kind_round_trips_through_id() {
        let kind = WeakAreaKind::Grammar(GrammarAspect::Articles);
        assert_eq!(kind.id(), "grammar_articles");
        let json = serde_json::to_string(&kind).unwrap();
        let back: WeakAreaKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
        assert!(WeakAreaKind::try_from("grammar_nonsense".to_string()).is_err());
    }
}
