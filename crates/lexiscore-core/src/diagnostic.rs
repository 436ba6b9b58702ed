//! Follow-up test generation.
//!
//! Picks a short test from a question bank that probes the grammar the essay
//! avoided, the aspects it got wrong, the estimated level and the level
//! above it, and vocabulary at the estimated level.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::model::{CefrLevel, GrammarAspect, QuestionType, TestQuestion};
use crate::question_bank::default_bank;
use crate::results::AnalysisResult;
use crate::weak_areas::WEAK_THRESHOLD;

/// Upper bound on follow-up test length.
pub const MAX_QUESTIONS: usize = 10;
/// Unused aspects considered, in aspect order.
const UNUSED_ASPECTS_PROBED: usize = 4;
const LEVEL_QUESTIONS: usize = 2;
const NEXT_LEVEL_QUESTIONS: usize = 1;

/// Question type that covers an unused aspect. Aspects without a type are
/// not probed when unused.
pub fn question_type_for(aspect: GrammarAspect) -> Option<QuestionType> {
    match aspect {
        GrammarAspect::PresentSimple
        | GrammarAspect::PresentContinuous
        | GrammarAspect::PastSimple
        | GrammarAspect::PastContinuous
        | GrammarAspect::PresentPerfect
        | GrammarAspect::PastPerfect
        | GrammarAspect::FutureSimple
        | GrammarAspect::FutureContinuous
        | GrammarAspect::FuturePerfect => Some(QuestionType::GrammarTenses),
        GrammarAspect::Articles => Some(QuestionType::GrammarArticles),
        GrammarAspect::Prepositions => Some(QuestionType::GrammarPrepositions),
        _ => None,
    }
}

/// Builds follow-up tests from a fixed question bank. Holds no state between
/// calls.
#[derive(Debug, Clone)]
pub struct DiagnosticEngine {
    bank: Vec<TestQuestion>,
}

impl Default for DiagnosticEngine {
    fn default() -> Self {
        Self::new(default_bank().to_vec())
    }
}

impl DiagnosticEngine {
    pub fn new(bank: Vec<TestQuestion>) -> Self {
        Self { bank }
    }

    pub fn bank(&self) -> &[TestQuestion] {
        &self.bank
    }

    /// Generate a follow-up test in random order.
    pub fn generate_followup_test(&self, result: &AnalysisResult) -> Vec<TestQuestion> {
        self.generate_followup_test_with_rng(result, &mut rand::thread_rng())
    }

    /// Generate a follow-up test, shuffling with `rng`.
    pub fn generate_followup_test_with_rng<R: Rng + ?Sized>(
        &self,
        result: &AnalysisResult,
        rng: &mut R,
    ) -> Vec<TestQuestion> {
        let mut questions = self.candidates(result);
        questions.shuffle(rng);
        questions.truncate(MAX_QUESTIONS);
        questions
    }

    /// Every candidate in selection order, deduplicated by id, before
    /// shuffling and truncation.
    pub fn candidates(&self, result: &AnalysisResult) -> Vec<TestQuestion> {
        let level = result.preliminary_cefr;
        let mut picked: Vec<&TestQuestion> = Vec::new();

        let unused = result
            .grammar
            .unused_aspects
            .iter()
            .take(UNUSED_ASPECTS_PROBED)
            .filter(|aspect| question_type_for(**aspect).is_some());
        for &aspect in unused {
            picked.extend(self.by_aspect(aspect, level).take(1));
        }
        let after_unused = picked.len();

        for (&aspect, &score) in &result.grammar.used_aspects {
            if score < WEAK_THRESHOLD {
                picked.extend(self.by_aspect(aspect, level).take(1));
            }
        }
        let after_weak = picked.len();

        picked.extend(self.by_level(level).take(LEVEL_QUESTIONS));
        if let Some(next) = level.next() {
            picked.extend(self.by_level(next).take(NEXT_LEVEL_QUESTIONS));
        }
        let after_level = picked.len();

        for ty in [
            QuestionType::VocabularyComplexity,
            QuestionType::VocabularyAppropriateness,
        ] {
            picked.extend(self.by_type(ty, level).take(1));
        }

        let mut seen = HashSet::new();
        let candidates: Vec<TestQuestion> = picked
            .into_iter()
            .filter(|q| seen.insert(q.id.as_str()))
            .cloned()
            .collect();

        debug!(
            level = %level,
            unused = after_unused,
            weak = after_weak - after_unused,
            level_probe = after_level - after_weak,
            unique = candidates.len(),
            "follow-up candidates selected"
        );
        candidates
    }

    fn by_aspect(
        &self,
        aspect: GrammarAspect,
        level: CefrLevel,
    ) -> impl Iterator<Item = &TestQuestion> + '_ {
        self.bank
            .iter()
            .filter(move |q| q.aspect == aspect && q.difficulty == level)
    }

    fn by_type(
        &self,
        ty: QuestionType,
        level: CefrLevel,
    ) -> impl Iterator<Item = &TestQuestion> + '_ {
        self.bank
            .iter()
            .filter(move |q| q.question_type == ty && q.difficulty == level)
    }

    fn by_level(&self, level: CefrLevel) -> impl Iterator<Item = &TestQuestion> + '_ {
        self.bank.iter().filter(move |q| q.difficulty == level)
    }
}
