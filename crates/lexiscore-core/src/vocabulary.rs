//! Vocabulary scoring.
//!
//! Pure functions over an [`AnnotatedDocument`] plus the lexical database and
//! frequency corpus. [`VocabularyScorer::analyze`] bundles them into a
//! [`VocabularyAnalysis`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::diversity::{lexical_diversity, DiversityBreakdown};
use crate::document::{AnnotatedDocument, Pos};
use crate::model::CefrLevel;
use crate::results::{CollocationSuggestion, StyleMeta, VocabularyAnalysis, VocabularyProfile};
use crate::semantic::{analyze_richness, rare_word_ratio, word_suggestions};
use crate::statistics::{round2, round_to};
use crate::traits::{FrequencyCorpus, LexicalDatabase};

const DIVERSITY_WEIGHT: f64 = 0.22;
const SOPHISTICATION_WEIGHT: f64 = 0.28;
const APPROPRIATENESS_WEIGHT: f64 = 0.20;
const POS_BALANCE_WEIGHT: f64 = 0.10;
const SEMANTIC_WEIGHT: f64 = 0.15;
const STABILITY_WEIGHT: f64 = 0.05;

const LEXICAL_ERROR_PENALTY: f64 = 2.5;
const COLLOCATION_ERROR_PENALTY: f64 = 1.5;
const MAX_PENALTY: f64 = 25.0;
const SCORE_FLOOR: f64 = 30.0;

/// Trigger words per level. A lemma counts for the first level listing it.
pub const TRIGGER_WORDS: [(CefrLevel, &[&str]); 6] = [
    (
        CefrLevel::A1,
        &[
            "i", "you", "he", "she", "it", "we", "they", "is", "am", "are", "have", "has", "do",
            "does", "good", "bad", "big", "small",
        ],
    ),
    (
        CefrLevel::A2,
        &[
            "because", "but", "and", "or", "when", "where", "why", "how", "what", "which", "who",
            "nice", "beautiful", "interesting",
        ],
    ),
    (
        CefrLevel::B1,
        &[
            "although", "however", "therefore", "furthermore", "meanwhile", "significant",
            "important", "development", "education",
        ],
    ),
    (
        CefrLevel::B2,
        &[
            "nevertheless", "consequently", "accordingly", "similarly", "complicated",
            "sophisticated", "contemporary", "significant",
        ],
    ),
    (
        CefrLevel::C1,
        &[
            "notwithstanding", "paradigm", "ubiquitous", "comprehensive", "sophisticated",
            "proliferation", "fundamental",
        ],
    ),
    (
        CefrLevel::C2,
        &[
            "precipitate", "myriad", "engender", "imperative", "idiosyncratic", "magnanimous",
            "perspicacious",
        ],
    ),
];

const ACADEMIC_WORDS: &[&str] = &[
    "moreover", "furthermore", "nevertheless", "notwithstanding", "therefore", "consequently",
    "hence", "accordingly", "thus", "subsequently", "predominantly", "robust", "salient",
    "plausible", "empirical", "theoretical", "novel", "paradigm", "framework",
];

const INFORMAL_WORDS: &[&str] = &[
    "gonna", "wanna", "gotta", "yeah", "stuff", "things", "kinda", "sorta", "cool", "awesome",
    "buddy", "dude", "nah", "yep", "btw", "idk", "imo",
];

/// Wrong collocation and its correction, matched against the lowercased text.
pub const COLLOCATION_FIXES: &[(&str, &str)] = &[
    ("make a homework", "do homework"),
    ("make an exercise", "do exercise"),
    ("do a mistake", "make a mistake"),
    ("say the truth", "tell the truth"),
    ("win the world", "conquer the world"),
    ("strong rain", "heavy rain"),
    ("big problem", "serious problem"),
    ("do a decision", "make a decision"),
    ("do an effort", "make an effort"),
];

const MAKE_COMPLEMENTS: &[&str] = &[
    "mistake",
    "noise",
    "decision",
    "effort",
    "progress",
    "arrangement",
    "appointment",
];
const DO_COMPLEMENTS: &[&str] = &["homework", "exercise", "work", "research", "business", "housework"];

const COUNTABLE: &[&str] = &[
    "people", "students", "books", "cars", "houses", "tasks", "ideas", "facts", "words",
];
const UNCOUNTABLE: &[&str] = &[
    "information",
    "advice",
    "news",
    "money",
    "time",
    "equipment",
    "luggage",
    "furniture",
];

const WEAK_ADJECTIVES: &[&str] = &["big", "small", "nice", "good", "bad", "interesting"];
const GENERIC_VERBS: &[&str] = &["do", "make", "get", "have"];
const SUGGESTIONS_PER_PATTERN: usize = 3;

/// Overall-score bonus for the highest trigger level observed.
pub fn level_bonus(level: CefrLevel) -> f64 {
    match level {
        CefrLevel::A1 => 0.0,
        CefrLevel::A2 => 4.0,
        CefrLevel::B1 => 8.0,
        CefrLevel::B2 => 12.0,
        CefrLevel::C1 => 18.0,
        CefrLevel::C2 => 24.0,
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

pub fn level_distribution(lemmas: &[String]) -> BTreeMap<CefrLevel, usize> {
    let mut distribution = BTreeMap::new();
    for lemma in lemmas {
        let level = TRIGGER_WORDS
            .iter()
            .find(|(_, words)| words.contains(&lemma.as_str()))
            .map(|(level, _)| *level);
        if let Some(level) = level {
            *distribution.entry(level).or_insert(0) += 1;
        }
    }
    distribution
}

/// Level-weighted trigger score blended 75/25 with a rare-word bonus.
pub fn lexical_sophistication(distribution: &BTreeMap<CefrLevel, usize>, rare_ratio: f64) -> f64 {
    let total: usize = distribution.values().sum();
    let cefr_score = if total == 0 {
        30.0
    } else {
        let weighted: f64 = distribution
            .iter()
            .map(|(level, &count)| count as f64 * (level.rank() + 1) as f64)
            .sum();
        weighted / (total as f64 * 6.0) * 100.0
    };
    let rare_bonus = ((rare_ratio - 0.2) * 75.0).clamp(0.0, 30.0);
    round2(f64::min(100.0, cefr_score * 0.75 + rare_bonus * 0.25))
}

fn alpha_pos_counts(doc: &AnnotatedDocument) -> HashMap<Pos, usize> {
    doc.alpha_tokens().fold(HashMap::new(), |mut counts, t| {
        *counts.entry(t.pos).or_insert(0) += 1;
        counts
    })
}

/// Percentage of alphabetic tokens per coarse POS tag.
pub fn pos_profile(doc: &AnnotatedDocument) -> BTreeMap<String, f64> {
    let counts = alpha_pos_counts(doc);
    let total = counts.values().sum::<usize>().max(1) as f64;
    counts
        .into_iter()
        .map(|(pos, n)| (pos.as_str().to_string(), round2(n as f64 / total * 100.0)))
        .collect()
}

/// Content tokens over alphabetic tokens.
pub fn content_word_ratio(doc: &AnnotatedDocument) -> f64 {
    let total = doc.alpha_tokens().count();
    if total == 0 {
        return 0.0;
    }
    let content = doc.tokens().iter().filter(|t| t.pos.is_content()).count();
    content as f64 / total as f64
}

pub fn avg_word_len(lemmas: &[String]) -> f64 {
    if lemmas.is_empty() {
        return 0.0;
    }
    let total: usize = lemmas.iter().map(|l| l.chars().count()).sum();
    round2(total as f64 / lemmas.len() as f64)
}

/// Register score: a base from informal and academic word ratios blended
/// 70/30 with a formality proxy, clamped to `[35, 100]`.
pub fn word_appropriateness(doc: &AnnotatedDocument, lemmas: &[String]) -> (f64, StyleMeta) {
    let total = doc.alpha_tokens().count();
    if total == 0 {
        return (70.0, StyleMeta::default());
    }
    let informal = lemmas
        .iter()
        .filter(|l| INFORMAL_WORDS.contains(&l.as_str()))
        .count();
    let academic = lemmas
        .iter()
        .filter(|l| ACADEMIC_WORDS.contains(&l.as_str()))
        .count();

    let counts = alpha_pos_counts(doc);
    let pronouns = counts.get(&Pos::Pron).copied().unwrap_or(0);
    let interjections = counts.get(&Pos::Intj).copied().unwrap_or(0);
    let formality =
        f64::max(0.0, content_word_ratio(doc) * 100.0 - (pronouns + interjections) as f64 * 2.0);

    let informal_ratio = informal as f64 / total as f64;
    let academic_ratio = academic as f64 / total as f64;
    let base = if informal_ratio > 0.12 {
        55.0
    } else if academic_ratio > 0.08 {
        88.0
    } else if academic_ratio > 0.04 {
        80.0
    } else {
        70.0
    };

    let score = (0.7 * base + 0.3 * f64::min(95.0, formality)).clamp(35.0, 100.0);
    let meta = StyleMeta {
        informal_ratio: round_to(informal_ratio, 4),
        academic_ratio: round_to(academic_ratio, 4),
        formality: round2(formality),
    };
    (score, meta)
}

/// Quantifier and make/do mistakes over adjacent lemmas.
pub fn lexical_errors(lemmas: &[String]) -> Vec<String> {
    let mut errors = Vec::new();
    for pair in lemmas.windows(2) {
        let (w1, w2) = (pair[0].as_str(), pair[1].as_str());
        if w1 == "much" && COUNTABLE.contains(&w2) {
            errors.push(format!("Use 'many' with countable noun '{w2}'"));
        }
        if w1 == "many" && UNCOUNTABLE.contains(&w2) {
            errors.push(format!("Use 'much' with uncountable noun '{w2}'"));
        }
        if w1 == "make" && DO_COMPLEMENTS.contains(&w2) {
            errors.push(format!("Use 'do' instead of 'make' with '{w2}'"));
        }
        if w1 == "do" && MAKE_COMPLEMENTS.contains(&w2) {
            errors.push(format!("Use 'make' instead of 'do' with '{w2}'"));
        }
    }
    errors
}

/// Known wrong collocations present in the text.
pub fn collocation_errors(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    COLLOCATION_FIXES
        .iter()
        .filter(|(wrong, _)| lower.contains(wrong))
        .map(|(wrong, correct)| format!("Use '{correct}' instead of '{wrong}'"))
        .collect()
}

/// More specific alternatives for weak adjectives on nouns and for generic
/// verbs with a direct object.
pub fn collocation_suggestions(
    doc: &AnnotatedDocument,
    lexicon: &dyn LexicalDatabase,
) -> Vec<CollocationSuggestion> {
    let mut out = Vec::new();
    for (i, token) in doc.tokens().iter().enumerate() {
        if token.pos != Pos::Adj || doc.head(i).pos != Pos::Noun {
            continue;
        }
        let adjective = token.lemma_lower();
        if !WEAK_ADJECTIVES.contains(&adjective.as_str()) {
            continue;
        }
        let mut synonyms = word_suggestions(lexicon, &adjective, CefrLevel::B2);
        if synonyms.is_empty() {
            continue;
        }
        synonyms.truncate(SUGGESTIONS_PER_PATTERN);
        out.push(CollocationSuggestion {
            pattern: format!("{adjective} {}", doc.head(i).lemma_lower()),
            suggestions: synonyms,
            note: "Consider more specific adjective".to_string(),
        });
    }

    for (i, token) in doc.tokens().iter().enumerate() {
        let verb = token.lemma_lower();
        if token.pos != Pos::Verb || !GENERIC_VERBS.contains(&verb.as_str()) {
            continue;
        }
        let has_object = doc.children(i).any(|c| c.dep == "dobj" || c.dep == "obj");
        if !has_object {
            continue;
        }
        let mut synonyms = word_suggestions(lexicon, &verb, CefrLevel::B2);
        if synonyms.is_empty() {
            continue;
        }
        synonyms.truncate(SUGGESTIONS_PER_PATTERN);
        out.push(CollocationSuggestion {
            pattern: verb,
            suggestions: synonyms,
            note: "Consider a more specific verb".to_string(),
        });
    }
    out
}

/// Content-word share minus a pronoun/interjection penalty, in `[40, 95]`.
pub fn pos_balance(profile: &BTreeMap<String, f64>, content_ratio: f64) -> f64 {
    let pron = profile.get(Pos::Pron.as_str()).copied().unwrap_or(0.0);
    let intj = profile.get(Pos::Intj.as_str()).copied().unwrap_or(0.0);
    let penalty = f64::min(20.0, (pron + intj) * 0.8);
    (content_ratio * 100.0 - penalty).clamp(40.0, 95.0)
}

/// Agreement among diversity, sophistication and appropriateness, penalised
/// for extreme rare-word ratio or word length. In `[30, 95]`.
pub fn stability(
    diversity: f64,
    sophistication: f64,
    appropriateness: f64,
    rare_ratio: f64,
    avg_word_len: f64,
) -> f64 {
    let trio = [diversity, sophistication, appropriateness];
    let spread = trio.iter().copied().fold(f64::MIN, f64::max)
        - trio.iter().copied().fold(f64::MAX, f64::min);
    let consensus = f64::max(0.0, 100.0 - spread);
    let rare_penalty = f64::max(0.0, (rare_ratio - 0.35) * 60.0);
    let length_penalty = f64::max(0.0, (avg_word_len - 8.5) * 6.0);
    (consensus - rare_penalty - length_penalty).clamp(30.0, 95.0)
}

/// Weighted overall score from the analysis components, with the error
/// penalty and the trigger-level bonus applied.
pub fn overall_vocabulary(analysis: &VocabularyAnalysis) -> f64 {
    let profile = &analysis.profile;
    let base = DIVERSITY_WEIGHT * analysis.lexical_diversity
        + SOPHISTICATION_WEIGHT * analysis.lexical_sophistication
        + APPROPRIATENESS_WEIGHT * analysis.word_appropriateness
        + POS_BALANCE_WEIGHT * pos_balance(&profile.pos_profile, profile.content_word_ratio)
        + SEMANTIC_WEIGHT * analysis.semantic.component()
        + STABILITY_WEIGHT
            * stability(
                analysis.lexical_diversity,
                analysis.lexical_sophistication,
                analysis.word_appropriateness,
                profile.rare_word_ratio,
                profile.avg_word_len,
            );

    let penalty = f64::min(
        MAX_PENALTY,
        analysis.lexical_errors.len() as f64 * LEXICAL_ERROR_PENALTY
            + analysis.collocation_errors.len() as f64 * COLLOCATION_ERROR_PENALTY,
    );
    let mut score = f64::max(SCORE_FLOOR, base - penalty);
    if let Some(level) = analysis.highest_level() {
        score = f64::min(100.0, score + level_bonus(level));
    }
    round2(score)
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Vocabulary scorer over shared, read-only lexical resources.
#[derive(Clone)]
pub struct VocabularyScorer {
    lexicon: Arc<dyn LexicalDatabase>,
    corpus: Arc<dyn FrequencyCorpus>,
}

impl VocabularyScorer {
    pub fn new(lexicon: Arc<dyn LexicalDatabase>, corpus: Arc<dyn FrequencyCorpus>) -> Self {
        Self { lexicon, corpus }
    }

    #[instrument(skip_all, fields(tokens = doc.len()))]
    pub fn analyze(&self, doc: &AnnotatedDocument) -> VocabularyAnalysis {
        let lemmas: Vec<String> = doc.alpha_tokens().map(|t| t.lemma_lower()).collect();
        let content_words: Vec<String> = doc
            .alpha_tokens()
            .filter(|t| !t.is_stop())
            .map(|t| t.lower())
            .collect();

        let distribution = level_distribution(&lemmas);
        let rare_ratio = rare_word_ratio(self.corpus.as_ref(), &lemmas);
        let (appropriateness, style_meta) = word_appropriateness(doc, &lemmas);

        let mut analysis = VocabularyAnalysis {
            lexical_diversity: lexical_diversity(&content_words),
            lexical_sophistication: lexical_sophistication(&distribution, rare_ratio),
            word_appropriateness: appropriateness,
            level_distribution: distribution,
            lexical_errors: lexical_errors(&lemmas),
            collocation_errors: collocation_errors(doc.text()),
            overall_vocabulary: 0.0,
            semantic: analyze_richness(doc, self.lexicon.as_ref(), self.corpus.as_ref()),
            profile: VocabularyProfile {
                pos_profile: pos_profile(doc),
                content_word_ratio: content_word_ratio(doc),
                avg_word_len: avg_word_len(&lemmas),
                rare_word_ratio: rare_ratio,
                style_meta,
                collocation_suggestions: collocation_suggestions(doc, self.lexicon.as_ref()),
                diversity_breakdown: DiversityBreakdown::compute(&content_words),
            },
        };
        analysis.overall_vocabulary = overall_vocabulary(&analysis);

        debug!(
            diversity = analysis.lexical_diversity,
            sophistication = analysis.lexical_sophistication,
            appropriateness = analysis.word_appropriateness,
            overall = analysis.overall_vocabulary,
            "vocabulary scored"
        );
        analysis
    }
}
