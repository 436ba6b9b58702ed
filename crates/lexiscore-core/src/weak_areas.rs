//! Weak-area identification and the recommendations built from it.

use std::collections::BTreeSet;

use crate::model::{GrammarAspect, WeakArea, WeakAreaKind};
use crate::results::{GrammarAnalysis, VocabularyAnalysis};

/// Scores below this mark a weak area.
pub const WEAK_THRESHOLD: f64 = 60.0;

const LEXICAL_ERROR_OFFSET: f64 = 15.0;
const LEXICAL_ERROR_FLOOR: f64 = 40.0;
const UNUSED_IN_RECOMMENDATION: usize = 3;

fn weak_area(kind: WeakAreaKind, score: f64, description: String, recommendations: &[&str]) -> WeakArea {
    WeakArea {
        kind,
        score,
        description,
        recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
        confirmed: false,
    }
}

/// One entry per weak grammar aspect in detection order, then structure, vocabulary range and
/// lexical errors. No kind appears twice. `confirmed` is always false here;
/// only a follow-up test sets it.
pub fn identify_weak_areas(grammar: &GrammarAnalysis, vocabulary: &VocabularyAnalysis) -> Vec<WeakArea> {
    let mut areas: Vec<WeakArea> = grammar
        .used_aspects
        .iter()
        .filter(|(_, &score)| score < WEAK_THRESHOLD)
        .map(|(&aspect, &score)| WeakArea {
            kind: WeakAreaKind::Grammar(aspect),
            score,
            description: format!("Low accuracy using {}", aspect.label()),
            recommendations: vec![format!("Practise using {}", aspect.label())],
            confirmed: false,
        })
        .collect();

    if grammar.sentence_structure < WEAK_THRESHOLD {
        areas.push(weak_area(
            WeakAreaKind::SentenceStructure,
            grammar.sentence_structure,
            "Problems with sentence construction".to_string(),
            &["Drill basic sentence structure", "Practise complex sentences"],
        ));
    }

    if vocabulary.overall_vocabulary < WEAK_THRESHOLD {
        areas.push(weak_area(
            WeakAreaKind::VocabularyRange,
            vocabulary.overall_vocabulary,
            "Limited vocabulary range".to_string(),
            &["Read more in English", "Learn new words in context"],
        ));
    }

    if !vocabulary.lexical_errors.is_empty() {
        areas.push(weak_area(
            WeakAreaKind::LexicalErrors,
            f64::max(
                LEXICAL_ERROR_FLOOR,
                vocabulary.overall_vocabulary - LEXICAL_ERROR_OFFSET,
            ),
            format!("Lexical errors found ({})", vocabulary.lexical_errors.len()),
            &["Study word collocations", "Choose words more carefully"],
        ));
    }

    areas
}

/// Short study advice from the weak areas and the aspects never used.
pub fn recommendations(weak_areas: &[WeakArea], unused: &BTreeSet<GrammarAspect>) -> Vec<String> {
    if weak_areas.is_empty() && unused.is_empty() {
        return vec!["Good work! Keep practising.".to_string()];
    }

    let mut out = Vec::new();
    if weak_areas.iter().any(|a| a.kind.is_grammar()) {
        out.push("Pay extra attention to grammar.".to_string());
    }
    if weak_areas.iter().any(|a| a.kind.is_vocabulary()) {
        out.push("Keep expanding your vocabulary.".to_string());
    }
    if !unused.is_empty() {
        let names: Vec<String> = unused
            .iter()
            .take(UNUSED_IN_RECOMMENDATION)
            .map(|a| a.label())
            .collect();
        out.push(format!("Practise: {}", names.join(", ")));
    }
    out
}
