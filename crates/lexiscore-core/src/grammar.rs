//! Grammar scoring.
//!
//! Aspect detection is a single fold over the tokens (first occurrence
//! wins). Rule-checker findings adjust the detected aspects and feed the
//! accuracy and global penalty; when the checker is missing, fails or times
//! out, a local heuristic score stands in for it.
//!
//! Everything except [`GrammarScorer::analyze`] is a pure function of the
//! document and the rule-check outcome.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::document::{AnnotatedDocument, Pos};
use crate::model::{CefrLevel, GrammarAspect};
use crate::results::{
    AspectScores, ErrorSummary, GrammarAnalysis, GrammarMetrics, RuleCheckExtras, RuleCheckReport, RuleFinding,
    SentenceTypes, Tip,
};
use crate::statistics::{mean, round2, round_to, similarity_ratio};
use crate::traits::{RuleChecker, RuleMatch};

const MODAL_SCORE: f64 = 80.0;
const PASSIVE_SCORE: f64 = 85.0;
const RELATIVE_CLAUSE_SCORE: f64 = 80.0;
const PREPOSITION_SCORE: f64 = 75.0;

const ARTICLE_MISMATCH_SCORE: f64 = 40.0;
const ARTICLE_MATCH_SCORE: f64 = 85.0;
const ARTICLE_NO_NOUN_SCORE: f64 = 70.0;

const ASPECT_PENALTY_STEP: f64 = 5.0;
const ASPECT_PENALTY_MAX: f64 = 20.0;
const GLOBAL_PENALTY_STEP: f64 = 1.5;
const GLOBAL_PENALTY_MAX: f64 = 15.0;
const SCORE_FLOOR: f64 = 30.0;

const ASPECT_WEIGHT: f64 = 0.5;
const STRUCTURE_WEIGHT: f64 = 0.3;
const ACCURACY_WEIGHT: f64 = 0.2;

const VOWELS: &str = "aeiou";

const SUBJECT_DEPS: &[&str] = &["nsubj", "nsubjpass", "csubj"];
const OBJECT_DEPS: &[&str] = &["dobj", "iobj", "pobj", "obj"];
const SUBORDINATE_DEPS: &[&str] = &["acl", "advcl", "relcl", "ccomp", "xcomp"];
const COORD_CONJ: &[&str] = &["and", "but", "or", "nor", "yet", "so"];
const COHERENCE_CONNECTIVES: &[&str] = &[
    "because",
    "although",
    "therefore",
    "however",
    "meanwhile",
    "furthermore",
    "nevertheless",
    "moreover",
    "since",
    "whereas",
    "while",
];

/// Rule-id fragments and the aspect they map to, checked in this order.
pub const RULE_ASPECT_TABLE: &[(&str, GrammarAspect)] = &[
    ("ENGLISH_WORD_REPEAT_RULE", GrammarAspect::VocabularyUsage),
    ("UPPERCASE_SENTENCE_START", GrammarAspect::SentenceStructure),
    ("SENTENCE_WHITESPACE", GrammarAspect::SentenceStructure),
    ("ARTICLE", GrammarAspect::Articles),
    ("TENSE", GrammarAspect::PresentSimple),
    ("PREPOSITION", GrammarAspect::Prepositions),
    ("CONFUSED_WORDS", GrammarAspect::VocabularyUsage),
    ("COLLOCATIONS", GrammarAspect::VocabularyCollocations),
    ("AGREEMENT", GrammarAspect::SentenceStructure),
    ("TYPOGRAPHY", GrammarAspect::SentenceStructure),
    ("COMMA", GrammarAspect::SentenceStructure),
];

/// Map a rule identifier to an aspect bucket. Matching is case-insensitive;
/// unmatched and empty ids land in sentence structure.
pub fn map_rule_to_aspect(rule_id: &str) -> GrammarAspect {
    let upper = rule_id.to_uppercase();
    if upper.is_empty() {
        return GrammarAspect::SentenceStructure;
    }
    RULE_ASPECT_TABLE
        .iter()
        .find(|(pattern, _)| upper.contains(pattern))
        .map(|(_, aspect)| *aspect)
        .unwrap_or(GrammarAspect::SentenceStructure)
}

/// Base correctness score of a detected tense.
pub fn base_tense_score(aspect: GrammarAspect) -> f64 {
    match aspect {
        GrammarAspect::PresentSimple => 85.0,
        GrammarAspect::PastSimple => 80.0,
        GrammarAspect::PresentContinuous => 75.0,
        GrammarAspect::PastContinuous => 70.0,
        GrammarAspect::PresentPerfect => 72.0,
        GrammarAspect::PastPerfect => 68.0,
        GrammarAspect::FutureSimple => 78.0,
        GrammarAspect::FutureContinuous => 70.0,
        GrammarAspect::FuturePerfect => 68.0,
        GrammarAspect::Conditionals => 72.0,
        _ => 70.0,
    }
}

// ---------------------------------------------------------------------------
// Rule checking
// ---------------------------------------------------------------------------

/// What the rule checker produced for one text.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCheckOutcome {
    Checked {
        matches: Vec<RuleMatch>,
        corrected_text: String,
    },
    /// The checker was missing, failed or timed out.
    Unavailable { reason: String },
}

impl RuleCheckOutcome {
    /// A successful check that found nothing.
    pub fn clean(text: &str) -> Self {
        RuleCheckOutcome::Checked {
            matches: Vec::new(),
            corrected_text: text.to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, RuleCheckOutcome::Checked { .. })
    }

    pub fn matches(&self) -> &[RuleMatch] {
        match self {
            RuleCheckOutcome::Checked { matches, .. } => matches,
            RuleCheckOutcome::Unavailable { .. } => &[],
        }
    }
}

/// Score derived from the rule-checker error ratio.
pub fn rule_checker_score(error_count: usize, word_count: usize) -> f64 {
    if word_count == 0 {
        return 100.0;
    }
    let ratio = error_count as f64 / word_count as f64;
    if ratio == 0.0 {
        100.0
    } else if ratio < 0.01 {
        90.0
    } else if ratio < 0.03 {
        80.0
    } else if ratio < 0.05 {
        70.0
    } else if ratio < 0.1 {
        60.0
    } else {
        50.0
    }
}

/// Heuristic stand-in for the rule checker: sentences starting in lowercase
/// plus doubled punctuation, as a ratio of the word count.
pub fn fallback_grammar_score(text: &str, word_count: usize) -> f64 {
    if word_count == 0 {
        return 100.0;
    }
    let capitalization_errors = text
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| !s.chars().next().is_some_and(char::is_uppercase))
        .count();
    let punctuation_errors =
        text.matches("..").count() + text.matches("??").count() + text.matches("!!").count();

    let ratio = (capitalization_errors + punctuation_errors) as f64 / word_count as f64;
    if ratio == 0.0 {
        95.0
    } else if ratio < 0.02 {
        85.0
    } else if ratio < 0.05 {
        75.0
    } else if ratio < 0.1 {
        65.0
    } else {
        55.0
    }
}

fn classify_rule(rule_id: &str, summary: &mut ErrorSummary) {
    let id = rule_id.to_uppercase();
    if id.contains("SPELL") || id.contains("TYPOS") {
        summary.grammar += 1;
    } else if id.contains("STYLE") || id.contains("WORDY") {
        summary.style += 1;
    } else if id.contains("COMMA") || id.contains("PUNCT") {
        summary.punctuation += 1;
    } else if id.contains("AGREEMENT") {
        summary.agreement += 1;
    } else {
        summary.other += 1;
    }
}

fn tip(aspect: &str, tip: &str) -> Tip {
    Tip {
        aspect: aspect.to_string(),
        tip: tip.to_string(),
    }
}

fn tips_for(summary: &ErrorSummary) -> Vec<Tip> {
    let mut tips = Vec::new();
    if summary.grammar > 5 {
        tips.push(tip(
            "GRAMMAR",
            "Review subject-verb agreement and sentence structure rules.",
        ));
    }
    if summary.style > 2 {
        tips.push(tip(
            "STYLE",
            "Try to make sentences more concise. Avoid redundant expressions.",
        ));
    }
    if summary.punctuation > 2 {
        tips.push(tip(
            "PUNCTUATION",
            "Check comma placement and punctuation consistency.",
        ));
    }
    if summary.agreement > 1 {
        tips.push(tip("AGREEMENT", "Ensure verbs match subjects in number and tense."));
    }
    if tips.is_empty() {
        tips.push(tip(
            "GENERAL",
            "Good grammar overall. Focus on clarity and coherence.",
        ));
    }
    tips
}

/// Runs of alphanumeric characters, the way a `\w+` scan counts words.
fn count_words(text: &str) -> usize {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .count()
}

fn sentence_word_lengths(text: &str) -> Vec<usize> {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.split_whitespace().count())
        .collect()
}

/// Syllable estimate: vowel groups, minus a trailing silent `e`, at least one.
pub fn count_syllables(word: &str) -> usize {
    let word: String = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();
    let mut count: usize = 0;
    let mut prev_vowel = false;
    for c in word.chars() {
        let vowel = "aeiouy".contains(c);
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }
    if word.ends_with('e') {
        count = count.saturating_sub(1).max(1);
    }
    count.max(1)
}

/// Flesch reading ease clamped to `[0, 100]`.
pub fn flesch_reading_ease(text: &str) -> f64 {
    let words: Vec<&str> = text
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect();
    let sentences = sentence_word_lengths(text).len();
    if words.is_empty() || sentences == 0 {
        return 0.0;
    }
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let asl = words.len() as f64 / sentences as f64;
    let asw = syllables as f64 / words.len() as f64;
    (206.835 - 1.015 * asl - 84.6 * asw).clamp(0.0, 100.0)
}

fn build_report(text: &str, outcome: &RuleCheckOutcome, metrics: GrammarMetrics) -> RuleCheckReport {
    let lengths = sentence_word_lengths(text);
    let avg_sentence_length = if lengths.is_empty() {
        0.0
    } else {
        lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
    };
    let readability_index = round2(flesch_reading_ease(text));

    let (matches, corrected_text) = match outcome {
        RuleCheckOutcome::Checked {
            matches,
            corrected_text,
        } => (matches.as_slice(), corrected_text.clone()),
        RuleCheckOutcome::Unavailable { .. } => {
            return RuleCheckReport {
                available: false,
                corrected_text: text.to_string(),
                extras: RuleCheckExtras {
                    avg_sentence_length: round2(avg_sentence_length),
                    readability_index,
                    ..Default::default()
                },
                metrics,
                ..Default::default()
            };
        }
    };

    let mut errors_by_aspect: BTreeMap<GrammarAspect, Vec<RuleFinding>> = BTreeMap::new();
    let mut summary = ErrorSummary::default();
    for m in matches {
        errors_by_aspect
            .entry(map_rule_to_aspect(&m.rule_id))
            .or_default()
            .push(RuleFinding {
                rule_id: m.rule_id.clone(),
                message: m.message.clone(),
                context: m.context.trim().to_string(),
                replacements: m.replacements.clone(),
                offset: m.offset,
                length: m.length,
            });
        classify_rule(&m.rule_id, &mut summary);
    }

    let word_count = count_words(text);
    let error_density = if word_count > 0 {
        matches.len() as f64 / word_count as f64
    } else {
        0.0
    };
    let correction_intensity = (1.0 - similarity_ratio(text, &corrected_text)).clamp(0.0, 1.0);

    RuleCheckReport {
        available: true,
        total_errors: matches.len(),
        errors_by_aspect,
        errors_summary: summary,
        dominant_errors: summary.dominant(),
        corrected_text,
        tips: tips_for(&summary),
        extras: RuleCheckExtras {
            error_density: round_to(error_density, 4),
            avg_sentence_length: round2(avg_sentence_length),
            readability_index,
            correction_intensity: round_to(correction_intensity, 3),
        },
        metrics,
    }
}

// ---------------------------------------------------------------------------
// Aspect detection
// ---------------------------------------------------------------------------

fn lower_is(text: &str, options: &[&str]) -> bool {
    let lower = text.to_lowercase();
    options.contains(&lower.as_str())
}

fn child_texts(doc: &AnnotatedDocument, i: usize) -> Vec<String> {
    doc.children(i).map(|c| c.lower()).collect()
}

/// Tense of token `i`, if it carries one.
fn identify_tense(doc: &AnnotatedDocument, i: usize) -> Option<GrammarAspect> {
    let token = doc.token(i);
    let low = token.lower();
    let head = doc.head(i);

    // "will go" is future simple; "will be going" and "will have gone" are
    // picked up on the main verb.
    if low == "will" && head.pos == Pos::Verb && token.head != i && head.tag == "VB" {
        return Some(GrammarAspect::FutureSimple);
    }
    if low == "going" && doc.children(i).any(|c| c.lower() == "to") {
        return Some(GrammarAspect::FutureSimple);
    }
    if low == "would" && head.pos == Pos::Verb && token.head != i {
        return Some(GrammarAspect::Conditionals);
    }

    if token.pos != Pos::Verb {
        return None;
    }

    let children = child_texts(doc, i);
    let has = |word: &str| children.iter().any(|c| c == word);
    match token.tag.as_str() {
        "VBP" | "VBZ" => Some(GrammarAspect::PresentSimple),
        "VBD" => Some(GrammarAspect::PastSimple),
        "VBG" => {
            if has("will") && has("be") {
                return Some(GrammarAspect::FutureContinuous);
            }
            for child in &children {
                if lower_is(child, &["am", "is", "are"]) {
                    return Some(GrammarAspect::PresentContinuous);
                }
                if lower_is(child, &["was", "were"]) {
                    return Some(GrammarAspect::PastContinuous);
                }
            }
            Some(GrammarAspect::PresentContinuous)
        }
        "VBN" => {
            if has("will") && has("have") {
                return Some(GrammarAspect::FuturePerfect);
            }
            for child in &children {
                if lower_is(child, &["have", "has"]) {
                    return Some(GrammarAspect::PresentPerfect);
                }
                if child == "had" {
                    return Some(GrammarAspect::PastPerfect);
                }
            }
            let head_text = head.lower();
            if lower_is(&head_text, &["have", "has"]) {
                return Some(GrammarAspect::PresentPerfect);
            }
            if head_text == "had" {
                return Some(GrammarAspect::PastPerfect);
            }
            Some(GrammarAspect::PresentPerfect)
        }
        _ => None,
    }
}

/// Article check against the following token's leading letter.
fn article_score(doc: &AnnotatedDocument, i: usize) -> f64 {
    let article = doc.token(i).lower();
    let Some(next) = doc.tokens().get(i + 1) else {
        return ARTICLE_NO_NOUN_SCORE;
    };
    if next.pos != Pos::Noun {
        return ARTICLE_NO_NOUN_SCORE;
    }
    let starts_with_vowel = next
        .text
        .chars()
        .next()
        .map(|c| VOWELS.contains(c.to_ascii_lowercase()))
        .unwrap_or(false);
    match (article.as_str(), starts_with_vowel) {
        ("a", true) | ("an", false) => ARTICLE_MISMATCH_SCORE,
        _ => ARTICLE_MATCH_SCORE,
    }
}

/// Every aspect token `i` evidences, with its score.
fn aspect_hits(doc: &AnnotatedDocument, i: usize) -> Vec<(GrammarAspect, f64)> {
    let token = doc.token(i);
    let mut hits = Vec::new();

    if let Some(tense) = identify_tense(doc, i) {
        hits.push((tense, base_tense_score(tense)));
    }
    if lower_is(&token.text, &["a", "an", "the"]) {
        hits.push((GrammarAspect::Articles, article_score(doc, i)));
    }
    if token.pos == Pos::Adp {
        hits.push((GrammarAspect::Prepositions, PREPOSITION_SCORE));
    }
    if token.tag == "MD" {
        hits.push((GrammarAspect::ModalVerbs, MODAL_SCORE));
    }
    let head = doc.head(i);
    if token.dep == "auxpass" || (head.dep == "auxpass" && token.pos == Pos::Verb) {
        hits.push((GrammarAspect::PassiveVoice, PASSIVE_SCORE));
    }
    if token.dep == "relcl" {
        hits.push((GrammarAspect::RelativeClauses, RELATIVE_CLAUSE_SCORE));
    }
    hits
}

/// Detected aspects and their base scores, in detection order; the first
/// occurrence of each aspect decides its score.
pub fn detect_aspects(doc: &AnnotatedDocument) -> AspectScores {
    (0..doc.len()).fold(AspectScores::new(), |mut found, i| {
        for (aspect, score) in aspect_hits(doc, i) {
            found.entry(aspect).or_insert(score);
        }
        found
    })
}

/// Subtract `min(20, errors × 5)` from every used aspect that also has
/// rule-checker findings, flooring at 30.
pub fn adjust_aspect_scores(
    used: &AspectScores,
    errors_by_aspect: &BTreeMap<GrammarAspect, Vec<RuleFinding>>,
) -> AspectScores {
    used.iter()
        .map(|(&aspect, &score)| {
            let errors = errors_by_aspect.get(&aspect).map_or(0, Vec::len);
            if errors == 0 {
                return (aspect, score);
            }
            let penalty = f64::min(ASPECT_PENALTY_MAX, errors as f64 * ASPECT_PENALTY_STEP);
            (aspect, f64::max(SCORE_FLOOR, score - penalty))
        })
        .collect()
}

/// The tracked universe minus the used aspects.
pub fn unused_aspects(used: &AspectScores) -> BTreeSet<GrammarAspect> {
    GrammarAspect::TRACKED
        .iter()
        .copied()
        .filter(|a| !used.contains_key(a))
        .collect()
}

// ---------------------------------------------------------------------------
// Structure and auxiliary metrics
// ---------------------------------------------------------------------------

fn has_dep(tokens: &[crate::document::AnnotatedToken], deps: &[&str]) -> bool {
    tokens.iter().any(|t| deps.contains(&t.dep.as_str()))
}

/// Mean per-sentence structure score (90 / 75 / 60 / 40), 60 without sentences.
pub fn sentence_structure(doc: &AnnotatedDocument) -> f64 {
    let scores: Vec<f64> = doc
        .sentences()
        .map(|sent| {
            let subject = has_dep(sent, SUBJECT_DEPS);
            let verb = sent.iter().any(|t| t.pos == Pos::Verb);
            let object = has_dep(sent, OBJECT_DEPS);
            match (subject, verb, object) {
                (true, true, true) => 90.0,
                (true, true, false) => 75.0,
                (_, true, _) => 60.0,
                _ => 40.0,
            }
        })
        .collect();
    if scores.is_empty() {
        return 60.0;
    }
    mean(&scores)
}

/// Percentage of sentences with a subordinate clause, a coordinating
/// conjunction, or more than one non-finite verb.
pub fn sentence_complexity(doc: &AnnotatedDocument) -> f64 {
    let total = doc.sentence_count();
    if total == 0 {
        return 0.0;
    }
    let complex = doc
        .sentences()
        .filter(|sent| {
            let subordinate = has_dep(sent, SUBORDINATE_DEPS);
            let coordinated = sent.iter().any(|t| lower_is(&t.text, COORD_CONJ));
            let non_finite = sent
                .iter()
                .filter(|t| (t.tag == "VBG" || t.tag == "VBN") && t.dep != "aux")
                .count();
            subordinate || coordinated || non_finite > 1
        })
        .count();
    complex as f64 / total as f64 * 100.0
}

/// Subject tokens whose morphological number disagrees with their verb.
pub fn agreement_issues(doc: &AnnotatedDocument) -> Vec<String> {
    (0..doc.len())
        .filter_map(|i| {
            let token = doc.token(i);
            if token.head == i || !(token.dep == "nsubj" || token.dep == "nsubjpass") {
                return None;
            }
            let verb = doc.head(i);
            if verb.pos != Pos::Verb {
                return None;
            }
            match (token.number, verb.number) {
                (Some(subject), Some(predicate)) if subject != predicate => Some(format!(
                    "Subject-verb agreement: '{}' / '{}' (Number {:?} vs {:?})",
                    token.text, verb.text, subject, predicate
                )),
                _ => None,
            }
        })
        .collect()
}

fn subtree_depth(doc: &AnnotatedDocument, i: usize, budget: usize) -> usize {
    if budget == 0 {
        return 1;
    }
    1 + doc
        .child_indices(i)
        .iter()
        .map(|&c| subtree_depth(doc, c, budget - 1))
        .max()
        .unwrap_or(0)
}

/// Average depth of the deepest root per sentence.
pub fn syntactic_depth_avg(doc: &AnnotatedDocument) -> f64 {
    let depths: Vec<f64> = doc
        .sentence_ranges()
        .filter_map(|range| {
            range
                .filter(|&i| doc.token(i).dep.eq_ignore_ascii_case("root"))
                .map(|i| subtree_depth(doc, i, doc.len()))
                .max()
                .map(|d| d as f64)
        })
        .collect();
    mean(&depths)
}

/// Connectives per sentence × 100, capped at 100.
pub fn coherence_score(doc: &AnnotatedDocument) -> f64 {
    let sentences = doc.sentence_count().max(1);
    let connectives = doc
        .tokens()
        .iter()
        .filter(|t| lower_is(&t.text, COHERENCE_CONNECTIVES))
        .count();
    (connectives as f64 / sentences as f64 * 100.0).min(100.0)
}

/// Content words as a percentage of alphabetic tokens.
pub fn grammatical_density(doc: &AnnotatedDocument) -> f64 {
    let total = doc.alpha_tokens().count();
    if total == 0 {
        return 0.0;
    }
    let content = doc.tokens().iter().filter(|t| t.pos.is_content()).count();
    round2((content as f64 / total as f64 * 100.0).min(100.0))
}

pub fn sentence_type_distribution(doc: &AnnotatedDocument) -> SentenceTypes {
    let total = doc.sentence_count();
    if total == 0 {
        return SentenceTypes::default();
    }
    let (mut compound, mut complex) = (0usize, 0usize);
    for sent in doc.sentences() {
        let subordinate = has_dep(sent, SUBORDINATE_DEPS);
        let coordinated = sent
            .iter()
            .any(|t| t.dep == "cc" && lower_is(&t.text, COORD_CONJ));
        if subordinate {
            complex += 1;
        } else if coordinated {
            compound += 1;
        }
    }
    let pct = |n: usize| round2(n as f64 / total as f64 * 100.0);
    SentenceTypes {
        simple: pct(total - compound - complex),
        compound: pct(compound),
        complex: pct(complex),
    }
}

// ---------------------------------------------------------------------------
// Integral scores
// ---------------------------------------------------------------------------

pub fn grammatical_accuracy(used: &AspectScores, checker_score: f64) -> f64 {
    if used.is_empty() {
        return f64::max(SCORE_FLOOR, checker_score * 0.8);
    }
    let aspect_mean = used.values().sum::<f64>() / used.len() as f64;
    aspect_mean * 0.6 + checker_score * 0.4
}

/// Global penalty for the total number of rule-checker errors.
pub fn global_penalty(total_errors: usize) -> f64 {
    f64::min(GLOBAL_PENALTY_MAX, total_errors as f64 * GLOBAL_PENALTY_STEP)
}

pub fn overall_grammar(
    used: &AspectScores,
    structure: f64,
    accuracy: f64,
    total_errors: usize,
) -> f64 {
    let base = if used.is_empty() {
        structure * 0.7 + accuracy * 0.3
    } else {
        let aspect_mean = used.values().sum::<f64>() / used.len() as f64;
        aspect_mean * ASPECT_WEIGHT + structure * STRUCTURE_WEIGHT + accuracy * ACCURACY_WEIGHT
    };
    f64::max(SCORE_FLOOR, base - global_penalty(total_errors))
}

/// Grammar-only level: ≥90 C2, ≥80 C1, ≥70 B2, ≥60 B1, ≥50 A2, else A1.
pub fn estimate_grammar_cefr(overall: f64) -> CefrLevel {
    if overall >= 90.0 {
        CefrLevel::C2
    } else if overall >= 80.0 {
        CefrLevel::C1
    } else if overall >= 70.0 {
        CefrLevel::B2
    } else if overall >= 60.0 {
        CefrLevel::B1
    } else if overall >= 50.0 {
        CefrLevel::A2
    } else {
        CefrLevel::A1
    }
}

/// Fixed result for empty or whitespace-only text.
pub fn neutral_analysis(text: &str) -> GrammarAnalysis {
    GrammarAnalysis {
        used_aspects: AspectScores::new(),
        unused_aspects: GrammarAspect::TRACKED.iter().copied().collect(),
        sentence_structure: 60.0,
        sentence_complexity: 0.0,
        grammatical_accuracy: 100.0,
        overall_grammar: 60.0,
        rule_check: RuleCheckReport {
            available: false,
            corrected_text: text.to_string(),
            ..Default::default()
        },
    }
}

/// Score a document against an already obtained rule-check outcome.
pub fn score_document(doc: &AnnotatedDocument, outcome: &RuleCheckOutcome) -> GrammarAnalysis {
    let text = doc.text();
    if text.trim().is_empty() {
        return neutral_analysis(text);
    }

    let word_count = doc.alpha_tokens().count();
    let detected = detect_aspects(doc);
    let unused = unused_aspects(&detected);

    let checker_score = match outcome {
        RuleCheckOutcome::Checked { matches, .. } => rule_checker_score(matches.len(), word_count),
        RuleCheckOutcome::Unavailable { .. } => fallback_grammar_score(text, word_count),
    };

    let structure = sentence_structure(doc);
    let complexity = sentence_complexity(doc);

    let mut metrics = GrammarMetrics {
        word_count,
        subject_verb_agreement_issues: agreement_issues(doc),
        syntactic_depth_avg: syntactic_depth_avg(doc),
        coherence_score: coherence_score(doc),
        grammatical_density: grammatical_density(doc),
        sentence_types: sentence_type_distribution(doc),
        estimated_cefr: CefrLevel::A1,
    };
    let mut report = build_report(text, outcome, metrics.clone());

    let used = adjust_aspect_scores(&detected, &report.errors_by_aspect);
    let accuracy = grammatical_accuracy(&used, checker_score);
    let overall = overall_grammar(&used, structure, accuracy, report.total_errors);

    metrics.estimated_cefr = estimate_grammar_cefr(overall);
    report.metrics = metrics;

    debug!(
        aspects = used.len(),
        structure,
        accuracy,
        overall,
        checker_score,
        "grammar scored"
    );

    GrammarAnalysis {
        used_aspects: used,
        unused_aspects: unused,
        sentence_structure: structure,
        sentence_complexity: complexity,
        grammatical_accuracy: accuracy,
        overall_grammar: overall,
        rule_check: report,
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Grammar scorer with an optional rule checker behind a timeout.
#[derive(Clone)]
pub struct GrammarScorer {
    checker: Option<Arc<dyn RuleChecker>>,
    timeout: Duration,
}

impl GrammarScorer {
    pub fn new(checker: Option<Arc<dyn RuleChecker>>, timeout: Duration) -> Self {
        Self { checker, timeout }
    }

    /// Run the rule checker, degrading to [`RuleCheckOutcome::Unavailable`]
    /// on absence, error or timeout.
    pub async fn check(&self, text: &str) -> RuleCheckOutcome {
        let Some(checker) = &self.checker else {
            return RuleCheckOutcome::Unavailable {
                reason: "no rule checker configured".to_string(),
            };
        };

        let call = async {
            let matches = checker.check(text).await?;
            let corrected_text = match checker.correct(text, &matches).await {
                Ok(corrected) => corrected,
                Err(e) => {
                    warn!(checker = checker.name(), error = %e, "correction failed, applying replacements locally");
                    crate::traits::apply_replacements(text, &matches)
                }
            };
            Ok::<_, anyhow::Error>(RuleCheckOutcome::Checked {
                matches,
                corrected_text,
            })
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(checker = checker.name(), error = %e, "rule check failed, using heuristic fallback");
                RuleCheckOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
            Err(_) => {
                warn!(
                    checker = checker.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "rule check timed out, using heuristic fallback"
                );
                RuleCheckOutcome::Unavailable {
                    reason: format!("timed out after {}ms", self.timeout.as_millis()),
                }
            }
        }
    }

    /// Score a document. Empty text short-circuits to the neutral result
    /// without calling the rule checker.
    #[instrument(skip_all, fields(tokens = doc.len()))]
    pub async fn analyze(&self, doc: &AnnotatedDocument) -> GrammarAnalysis {
        if doc.text().trim().is_empty() {
            return neutral_analysis(doc.text());
        }
        let outcome = self.check(doc.text()).await;
        score_document(doc, &outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentBuilder, Number};
    use crate::test_support::present_simple_doc;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn rule(rule_id: &str, offset: usize) -> RuleMatch {
        RuleMatch {
            rule_id: rule_id.to_string(),
            message: format!("{rule_id} violated"),
            offset,
            length: 3,
            replacements: vec!["fix".into()],
            context: String::new(),
        }
    }

    fn checked(matches: Vec<RuleMatch>, text: &str) -> RuleCheckOutcome {
        RuleCheckOutcome::Checked {
            matches,
            corrected_text: text.to_string(),
        }
    }

    struct CountingChecker {
        calls: AtomicU32,
        delay: Option<Duration>,
        fail: bool,
    }

    impl CountingChecker {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
                delay: None,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl RuleChecker for CountingChecker {
        fn name(&self) -> &str {
            "counting"
        }

        async fn check(&self, _text: &str) -> anyhow::Result<Vec<RuleMatch>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                anyhow::bail!("service down");
            }
            Ok(Vec::new())
        }
    }

    #[test]
    fn rule_table_priority_and_case() {
        assert_eq!(
            map_rule_to_aspect("english_word_repeat_rule"),
            GrammarAspect::VocabularyUsage
        );
        assert_eq!(map_rule_to_aspect("EN_A_VS_AN_ARTICLE"), GrammarAspect::Articles);
        assert_eq!(map_rule_to_aspect("PAST_TENSE_X"), GrammarAspect::PresentSimple);
        // COMMA appears after AGREEMENT in the table.
        assert_eq!(
            map_rule_to_aspect("AGREEMENT_COMMA"),
            GrammarAspect::SentenceStructure
        );
        assert_eq!(map_rule_to_aspect(""), GrammarAspect::SentenceStructure);
        assert_eq!(map_rule_to_aspect("MORFOLOGIK"), GrammarAspect::SentenceStructure);
    }

    #[test]
    fn checker_score_buckets() {
        assert_eq!(rule_checker_score(0, 100), 100.0);
        assert_eq!(rule_checker_score(0, 0), 100.0);
        assert_eq!(rule_checker_score(1, 200), 90.0);
        assert_eq!(rule_checker_score(2, 100), 80.0);
        assert_eq!(rule_checker_score(4, 100), 70.0);
        assert_eq!(rule_checker_score(9, 100), 60.0);
        assert_eq!(rule_checker_score(10, 100), 50.0);
    }

    #[test]
    fn fallback_counts_capitalisation_and_doubled_punctuation() {
        assert_eq!(fallback_grammar_score("All good. Fine here.", 4), 95.0);
        assert_eq!(fallback_grammar_score("anything", 0), 100.0);
        // one lowercase start in 100 words
        let text = format!("{}. lower start", "Word ".repeat(98));
        assert_eq!(fallback_grammar_score(&text, 100), 85.0);
        // "!!" and "??" both count: 2 errors in 30 words
        assert_eq!(fallback_grammar_score("Wow!! Really??", 30), 65.0);
        // the same two errors in 10 words fall in the lowest band
        assert_eq!(fallback_grammar_score("Wow!! Really??", 10), 55.0);
    }

    #[test]
    fn syllables_and_readability() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("make"), 1);
        assert_eq!(count_syllables("beautiful"), 3);
        assert_eq!(count_syllables("the"), 1);
        let easy = flesch_reading_ease("The cat sat. The dog ran.");
        assert!(easy > 90.0);
        assert_eq!(flesch_reading_ease(""), 0.0);
    }

    #[test]
    fn present_simple_scenario() {
        let doc = present_simple_doc(19);
        assert_eq!(doc.text().split_whitespace().count(), 95);

        let analysis = score_document(&doc, &RuleCheckOutcome::clean(doc.text()));
        assert_eq!(analysis.used_aspects.len(), 1);
        assert_eq!(analysis.used_aspects[&GrammarAspect::PresentSimple], 85.0);
        assert_eq!(analysis.unused_aspects.len(), 14);

        assert_eq!(analysis.sentence_structure, 90.0);
        // aspect mean 85, checker score 100
        assert!((analysis.grammatical_accuracy - 91.0).abs() < 1e-9);
        let expected = 85.0 * 0.5 + 90.0 * 0.3 + 91.0 * 0.2;
        assert!((analysis.overall_grammar - expected).abs() < 1e-9);
        assert_eq!(analysis.rule_check.total_errors, 0);
        assert!(analysis.rule_check.available);
        assert_eq!(analysis.rule_check.metrics.word_count, 95);
    }

    #[test]
    fn used_and_unused_partition_the_universe() {
        let doc = present_simple_doc(3);
        let analysis = score_document(&doc, &RuleCheckOutcome::clean(doc.text()));
        let used: BTreeSet<_> = analysis.used_aspects.keys().copied().collect();
        assert!(used.is_disjoint(&analysis.unused_aspects));
        let union: BTreeSet<_> = used.union(&analysis.unused_aspects).copied().collect();
        assert_eq!(union, GrammarAspect::TRACKED.iter().copied().collect());
    }

    #[test]
    fn tense_table_and_first_occurrence() {
        let doc = DocumentBuilder::new()
            // "She was reading a book ."
            .push("She", "she", Pos::Pron, "PRP", "nsubj", 2)
            .push("was", "be", Pos::Aux, "VBD", "aux", 2)
            .push("reading", "read", Pos::Verb, "VBG", "ROOT", 2)
            .push("an", "a", Pos::Det, "DT", "det", 4)
            .push("book", "book", Pos::Noun, "NN", "dobj", 2)
            .push(".", ".", Pos::Punct, ".", "punct", 2)
            .end_sentence()
            // "They had left in the morning ."
            .push("They", "they", Pos::Pron, "PRP", "nsubj", 2)
            .push("had", "have", Pos::Aux, "VBD", "aux", 2)
            .push("left", "leave", Pos::Verb, "VBN", "ROOT", 2)
            .push("in", "in", Pos::Adp, "IN", "prep", 2)
            .push("the", "the", Pos::Det, "DT", "det", 5)
            .push("morning", "morning", Pos::Noun, "NN", "pobj", 3)
            .push(".", ".", Pos::Punct, ".", "punct", 2)
            .end_sentence()
            // "It will rain ."
            .push("It", "it", Pos::Pron, "PRP", "nsubj", 2)
            .push("will", "will", Pos::Aux, "MD", "aux", 2)
            .push("rain", "rain", Pos::Verb, "VB", "ROOT", 2)
            .push(".", ".", Pos::Punct, ".", "punct", 2)
            .build();

        let aspects = detect_aspects(&doc);
        assert_eq!(aspects[&GrammarAspect::PastContinuous], 70.0);
        assert_eq!(aspects[&GrammarAspect::PastPerfect], 68.0);
        assert_eq!(aspects[&GrammarAspect::FutureSimple], 78.0);
        assert_eq!(aspects[&GrammarAspect::ModalVerbs], 80.0);
        assert_eq!(aspects[&GrammarAspect::Prepositions], 75.0);
        // "an book" is the first article and decides the score.
        assert_eq!(aspects[&GrammarAspect::Articles], 40.0);
        assert!(!aspects.contains_key(&GrammarAspect::PresentSimple));
    }

    #[test]
    fn used_aspects_keep_detection_order() {
        // "Tom sat in an chair ."
        let doc = DocumentBuilder::new()
            .push("Tom", "Tom", Pos::Propn, "NNP", "nsubj", 1)
            .push("sat", "sit", Pos::Verb, "VBD", "ROOT", 1)
            .push("in", "in", Pos::Adp, "IN", "prep", 1)
            .push("an", "a", Pos::Det, "DT", "det", 4)
            .push("chair", "chair", Pos::Noun, "NN", "pobj", 2)
            .push(".", ".", Pos::Punct, ".", "punct", 1)
            .build();
        let matches = (0..4).map(|i| rule("WRONG_PREPOSITION", i)).collect();
        let analysis = score_document(&doc, &checked(matches, doc.text()));

        let order: Vec<GrammarAspect> = analysis.used_aspects.keys().copied().collect();
        assert_eq!(
            order,
            vec![
                GrammarAspect::PastSimple,
                GrammarAspect::Prepositions,
                GrammarAspect::Articles,
            ]
        );
        assert_eq!(analysis.used_aspects[&GrammarAspect::Prepositions], 55.0);
        assert_eq!(analysis.used_aspects[&GrammarAspect::Articles], 40.0);
    }

    #[test]
    fn future_continuous_and_perfect() {
        let doc = DocumentBuilder::new()
            // "I will be working ."
            .push("I", "I", Pos::Pron, "PRP", "nsubj", 3)
            .push("will", "will", Pos::Aux, "MD", "aux", 3)
            .push("be", "be", Pos::Aux, "VB", "aux", 3)
            .push("working", "work", Pos::Verb, "VBG", "ROOT", 3)
            .push(".", ".", Pos::Punct, ".", "punct", 3)
            .end_sentence()
            // "We will have finished ."
            .push("We", "we", Pos::Pron, "PRP", "nsubj", 3)
            .push("will", "will", Pos::Aux, "MD", "aux", 3)
            .push("have", "have", Pos::Aux, "VB", "aux", 3)
            .push("finished", "finish", Pos::Verb, "VBN", "ROOT", 3)
            .push(".", ".", Pos::Punct, ".", "punct", 3)
            .build();
        let aspects = detect_aspects(&doc);
        assert_eq!(aspects[&GrammarAspect::FutureContinuous], 70.0);
        assert_eq!(aspects[&GrammarAspect::FuturePerfect], 68.0);
        assert!(!aspects.contains_key(&GrammarAspect::FutureSimple));
    }

    #[test]
    fn passive_and_relative_clause() {
        let doc = DocumentBuilder::new()
            // "The book that I read was written ."
            .push("The", "the", Pos::Det, "DT", "det", 1)
            .push("book", "book", Pos::Noun, "NN", "nsubjpass", 6)
            .push("that", "that", Pos::Pron, "WDT", "dobj", 4)
            .push("I", "I", Pos::Pron, "PRP", "nsubj", 4)
            .push("read", "read", Pos::Verb, "VBD", "relcl", 1)
            .push("was", "be", Pos::Aux, "VBD", "auxpass", 6)
            .push("written", "write", Pos::Verb, "VBN", "ROOT", 6)
            .push(".", ".", Pos::Punct, ".", "punct", 6)
            .build();
        let aspects = detect_aspects(&doc);
        assert_eq!(aspects[&GrammarAspect::PassiveVoice], 85.0);
        assert_eq!(aspects[&GrammarAspect::RelativeClauses], 80.0);
        assert_eq!(aspects[&GrammarAspect::Articles], 85.0);
    }

    #[test]
    fn aspect_adjustment_is_monotone_and_floored() {
        let used: AspectScores = [(GrammarAspect::Articles, 85.0)].into_iter().collect();
        let mut previous = f64::MAX;
        for n in 0..8 {
            let text = "x".repeat(200);
            let matches = (0..n).map(|i| rule("EN_ARTICLE", i)).collect();
            let report = build_report(&text, &checked(matches, &text), GrammarMetrics::default());
            let adjusted = adjust_aspect_scores(&used, &report.errors_by_aspect);
            let score = adjusted[&GrammarAspect::Articles];
            assert!(score <= previous);
            assert!(score >= 30.0);
            previous = score;
        }
        assert_eq!(previous, 65.0);
    }

    #[test]
    fn global_penalty_caps_and_floor() {
        let used: AspectScores = [(GrammarAspect::PresentSimple, 85.0)].into_iter().collect();
        assert_eq!(global_penalty(0), 0.0);
        assert_eq!(global_penalty(4), 6.0);
        assert_eq!(global_penalty(40), 15.0);
        assert_eq!(overall_grammar(&AspectScores::new(), 40.0, 30.0, 40), 30.0);
        let clean = overall_grammar(&used, 90.0, 91.0, 0);
        assert!((clean - (42.5 + 27.0 + 18.2)).abs() < 1e-9);
    }

    #[test]
    fn report_groups_findings_and_tips() {
        let text = "this are a test sentence with some words in it for checking.";
        let matches = vec![
            rule("SUBJECT_VERB_AGREEMENT", 5),
            rule("NON_AGREEMENT_PLURAL", 9),
            rule("COMMA_PARENTHESIS", 12),
            rule("MORFOLOGIK_RULE_EN_US_SPELL", 20),
        ];
        let report = build_report(
            text,
            &checked(matches, "These are a test"),
            GrammarMetrics::default(),
        );
        assert_eq!(report.total_errors, 4);
        assert_eq!(
            report.errors_by_aspect[&GrammarAspect::SentenceStructure].len(),
            4
        );
        assert_eq!(report.errors_summary.agreement, 2);
        assert_eq!(report.errors_summary.punctuation, 1);
        assert_eq!(report.errors_summary.grammar, 1);
        assert_eq!(report.dominant_errors, vec!["agreement"]);
        assert_eq!(report.tips.len(), 1);
        assert_eq!(report.tips[0].aspect, "AGREEMENT");
        assert!(report.extras.correction_intensity > 0.0);
        assert!(report.extras.error_density > 0.0);
    }

    #[test]
    fn tips_fall_back_to_general() {
        let quiet = tips_for(&ErrorSummary::default());
        assert_eq!(quiet.len(), 1);
        assert_eq!(quiet[0].aspect, "GENERAL");

        let busy = ErrorSummary {
            grammar: 6,
            style: 3,
            ..ErrorSummary::default()
        };
        let busy_tips = tips_for(&busy);
        let aspects: Vec<&str> = busy_tips.iter().map(|t| t.aspect.as_str()).collect();
        assert_eq!(aspects, vec!["GRAMMAR", "STYLE"]);
    }

    #[test]
    fn unavailable_checker_uses_fallback() {
        let doc = present_simple_doc(19);
        let outcome = RuleCheckOutcome::Unavailable {
            reason: "offline".into(),
        };
        let analysis = score_document(&doc, &outcome);
        assert!(!analysis.rule_check.available);
        // fallback 95 for clean text: 85 * 0.6 + 95 * 0.4
        assert!((analysis.grammatical_accuracy - 89.0).abs() < 1e-9);
        assert_eq!(analysis.rule_check.corrected_text, doc.text());
    }

    #[test]
    fn agreement_and_depth_metrics() {
        let doc = DocumentBuilder::new()
            .push("Dogs", "dog", Pos::Noun, "NNS", "nsubj", 1)
            .number(Number::Plur)
            .push("barks", "bark", Pos::Verb, "VBZ", "ROOT", 1)
            .number(Number::Sing)
            .push("loudly", "loudly", Pos::Adv, "RB", "advmod", 1)
            .push(".", ".", Pos::Punct, ".", "punct", 1)
            .build();
        let issues = agreement_issues(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("Dogs"));
        assert_eq!(syntactic_depth_avg(&doc), 2.0);
        assert_eq!(grammatical_density(&doc), 100.0);
    }

    #[test]
    fn complexity_coherence_and_types() {
        let doc = DocumentBuilder::new()
            // "I stayed because it rained ."
            .push("I", "I", Pos::Pron, "PRP", "nsubj", 1)
            .push("stayed", "stay", Pos::Verb, "VBD", "ROOT", 1)
            .push("because", "because", Pos::Sconj, "IN", "mark", 4)
            .push("it", "it", Pos::Pron, "PRP", "nsubj", 4)
            .push("rained", "rain", Pos::Verb, "VBD", "advcl", 1)
            .push(".", ".", Pos::Punct, ".", "punct", 1)
            .end_sentence()
            // "I ran and she walked ."
            .push("I", "I", Pos::Pron, "PRP", "nsubj", 1)
            .push("ran", "run", Pos::Verb, "VBD", "ROOT", 1)
            .push("and", "and", Pos::Cconj, "CC", "cc", 1)
            .push("she", "she", Pos::Pron, "PRP", "nsubj", 4)
            .push("walked", "walk", Pos::Verb, "VBD", "conj", 1)
            .push(".", ".", Pos::Punct, ".", "punct", 1)
            .end_sentence()
            // "Cats sleep ."
            .push("Cats", "cat", Pos::Noun, "NNS", "nsubj", 1)
            .push("sleep", "sleep", Pos::Verb, "VBP", "ROOT", 1)
            .push(".", ".", Pos::Punct, ".", "punct", 1)
            .build();
        assert!((sentence_complexity(&doc) - 200.0 / 3.0).abs() < 1e-9);
        assert!((coherence_score(&doc) - 100.0 / 3.0).abs() < 1e-9);
        let types = sentence_type_distribution(&doc);
        assert_eq!(types.complex, 33.33);
        assert_eq!(types.compound, 33.33);
        assert_eq!(types.simple, 33.33);
    }

    #[test]
    fn grammar_cefr_thresholds() {
        assert_eq!(estimate_grammar_cefr(95.0), CefrLevel::C2);
        assert_eq!(estimate_grammar_cefr(80.0), CefrLevel::C1);
        assert_eq!(estimate_grammar_cefr(69.9), CefrLevel::B1);
        assert_eq!(estimate_grammar_cefr(49.9), CefrLevel::A1);
    }

    #[test]
    fn scoring_is_idempotent() {
        let doc = present_simple_doc(5);
        let outcome = checked(vec![rule("EN_ARTICLE", 0)], doc.text());
        assert_eq!(score_document(&doc, &outcome), score_document(&doc, &outcome));
    }

    #[tokio::test]
    async fn empty_text_is_neutral_without_checker_call() {
        let checker = Arc::new(CountingChecker::new());
        let scorer = GrammarScorer::new(Some(checker.clone()), Duration::from_secs(1));
        let analysis = scorer.analyze(&AnnotatedDocument::empty("   ")).await;
        assert_eq!(analysis.overall_grammar, 60.0);
        assert_eq!(analysis.sentence_structure, 60.0);
        assert_eq!(analysis.grammatical_accuracy, 100.0);
        assert_eq!(analysis.unused_aspects.len(), 15);
        assert_eq!(checker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_checker_times_out_to_fallback() {
        let checker = Arc::new(CountingChecker {
            delay: Some(Duration::from_secs(60)),
            ..CountingChecker::new()
        });
        let scorer = GrammarScorer::new(Some(checker.clone()), Duration::from_secs(2));
        let doc = present_simple_doc(19);
        let analysis = scorer.analyze(&doc).await;
        assert!(!analysis.rule_check.available);
        assert_eq!(checker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_checker_degrades() {
        let checker = Arc::new(CountingChecker {
            fail: true,
            ..CountingChecker::new()
        });
        let scorer = GrammarScorer::new(Some(checker), Duration::from_secs(1));
        let outcome = scorer.check("Some text.").await;
        assert!(matches!(outcome, RuleCheckOutcome::Unavailable { reason } if reason.contains("service down")));
    }

    #[tokio::test]
    async fn missing_checker_is_unavailable() {
        let scorer = GrammarScorer::new(None, Duration::from_secs(1));
        assert!(!scorer.check("Text.").await.is_available());
    }
}
