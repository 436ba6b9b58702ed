//! Grading of a completed follow-up test.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::{CefrLevel, GrammarAspect, QuestionType, TestQuestion, WeakArea, WeakAreaKind};
use crate::results::AnalysisResult;

/// Level table for follow-up accuracy, as `(exclusive upper bound, level)`.
const COMPLETION_CEFR_TABLE: [(f64, CefrLevel); 5] = [
    (40.0, CefrLevel::A1),
    (50.0, CefrLevel::A2),
    (60.0, CefrLevel::B1),
    (75.0, CefrLevel::B2),
    (90.0, CefrLevel::C1),
];

/// Final level from follow-up accuracy in percent.
pub fn completion_cefr(accuracy: f64) -> CefrLevel {
    COMPLETION_CEFR_TABLE
        .iter()
        .find(|(below, _)| accuracy < *below)
        .map_or(CefrLevel::C2, |&(_, level)| level)
}

/// How one question was answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub question_id: String,
    pub given: Option<String>,
    pub correct_answer: String,
    pub correct: bool,
}

/// Outcome of a follow-up test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowupGrade {
    pub total: usize,
    pub correct: usize,
    /// Percent of questions answered correctly; unanswered count as wrong.
    pub accuracy: f64,
    pub final_cefr: CefrLevel,
    pub preliminary_cefr: CefrLevel,
    /// The essay's weak areas, plus aspects the essay avoided and the test
    /// then caught. `confirmed` is set where a targeting question was missed.
    pub weak_areas: Vec<WeakArea>,
    pub answers: Vec<AnswerOutcome>,
}

impl FollowupGrade {
    pub fn confirmed(&self) -> impl Iterator<Item = &WeakArea> + '_ {
        self.weak_areas.iter().filter(|a| a.confirmed)
    }
}

fn answer_matches(given: &str, expected: &str) -> bool {
    given.trim().eq_ignore_ascii_case(expected.trim())
}

/// Whether `question` probes the weakness `kind`.
pub fn targets(question: &TestQuestion, kind: WeakAreaKind) -> bool {
    match kind {
        WeakAreaKind::Grammar(aspect) => question.aspect == aspect,
        WeakAreaKind::SentenceStructure => question.aspect == GrammarAspect::SentenceStructure,
        WeakAreaKind::VocabularyRange => matches!(
            question.question_type,
            QuestionType::VocabularyComplexity | QuestionType::VocabularyAppropriateness
        ),
        WeakAreaKind::LexicalErrors => matches!(
            question.question_type,
            QuestionType::VocabularyCollocations | QuestionType::VocabularyAppropriateness
        ),
    }
}

/// Grade answers (question id → chosen option) to a follow-up test.
pub fn grade_followup(
    result: &AnalysisResult,
    questions: &[TestQuestion],
    answers: &HashMap<String, String>,
) -> FollowupGrade {
    let outcomes: Vec<AnswerOutcome> = questions
        .iter()
        .map(|q| {
            let given = answers.get(&q.id).cloned();
            let correct = given
                .as_deref()
                .is_some_and(|g| answer_matches(g, &q.correct_answer));
            AnswerOutcome {
                question_id: q.id.clone(),
                given,
                correct_answer: q.correct_answer.clone(),
                correct,
            }
        })
        .collect();

    let total = outcomes.len();
    let correct = outcomes.iter().filter(|o| o.correct).count();
    let accuracy = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };

    let missed: Vec<&TestQuestion> = questions
        .iter()
        .zip(&outcomes)
        .filter(|(_, o)| !o.correct)
        .map(|(q, _)| q)
        .collect();

    let mut weak_areas: Vec<WeakArea> = result
        .weak_areas
        .iter()
        .map(|area| WeakArea {
            confirmed: missed.iter().any(|q| targets(q, area.kind)),
            ..area.clone()
        })
        .collect();

    // Aspects the essay never used but the test caught.
    let caught: BTreeSet<GrammarAspect> = missed
        .iter()
        .map(|q| q.aspect)
        .filter(|a| result.unused_aspects.contains(a))
        .collect();
    for aspect in caught {
        let asked: Vec<&TestQuestion> = questions.iter().filter(|q| q.aspect == aspect).collect();
        let right = asked
            .iter()
            .filter(|q| {
                outcomes
                    .iter()
                    .any(|o| o.question_id == q.id && o.correct)
            })
            .count();
        weak_areas.push(WeakArea {
            kind: WeakAreaKind::Grammar(aspect),
            score: right as f64 / asked.len() as f64 * 100.0,
            description: format!("Follow-up test errors using {}", aspect.label()),
            recommendations: vec![format!("Practise using {}", aspect.label())],
            confirmed: true,
        });
    }

    let final_cefr = completion_cefr(accuracy);
    tracing::debug!(total, correct, accuracy, level = %final_cefr, "follow-up graded");

    FollowupGrade {
        total,
        correct,
        accuracy,
        final_cefr,
        preliminary_cefr: result.preliminary_cefr,
        weak_areas,
        answers: outcomes,
    }
}
