//! Semantic richness from the lexical database.
//!
//! Every lookup goes through [`LexicalDatabase`]; a word the database does
//! not know contributes zero richness and is never an error. Word senses are
//! assigned with a Lesk-style gloss overlap, and similarities are computed
//! on the hypernym graph the database exposes.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::document::{AnnotatedDocument, Pos};
use crate::model::CefrLevel;
use crate::results::{LexnameCount, SemanticExtras, SemanticRichness, WordFrequency, ZipfStats};
use crate::statistics::{lower_quantile, mean, normalized_entropy, round2, round_to};
use crate::traits::{FrequencyCorpus, LexicalDatabase, Synset};

const MFS_BONUS: f64 = 0.2;
const MAX_NOUN_PHRASES: usize = 15;
const MAX_LEXNAMES: usize = 15;
const MAX_SUGGESTIONS: usize = 5;
const TAXONOMY_DEPTH_CEILING: f64 = 15.0;

const RARE_ZIPF: f64 = 3.5;
const RARE_WORD_LEN: usize = 10;

const NOUN_PHRASE_DEPS: &[&str] = &["det", "amod", "compound", "nummod", "poss"];

// ---------------------------------------------------------------------------
// Frequency helpers
// ---------------------------------------------------------------------------

/// Zipf estimate from word length, used when the corpus has no entry.
pub fn heuristic_zipf(lemma: &str) -> f64 {
    f64::max(1.5, 7.0 - lemma.chars().count() as f64 * 0.3)
}

/// Zipf frequency from the corpus, falling back to [`heuristic_zipf`].
pub fn zipf_or_heuristic(corpus: &dyn FrequencyCorpus, lemma: &str) -> f64 {
    corpus.zipf(lemma).unwrap_or_else(|| heuristic_zipf(lemma))
}

/// Rare means Zipf below 3.5, or ten letters or more when the corpus has no
/// entry for the lemma.
pub fn is_rare(corpus: &dyn FrequencyCorpus, lemma: &str) -> bool {
    match corpus.zipf(lemma) {
        Some(zipf) => zipf < RARE_ZIPF,
        None => lemma.chars().count() >= RARE_WORD_LEN,
    }
}

/// Share of rare lemmas.
pub fn rare_word_ratio(corpus: &dyn FrequencyCorpus, lemmas: &[String]) -> f64 {
    if lemmas.is_empty() {
        return 0.0;
    }
    let rare = lemmas.iter().filter(|l| is_rare(corpus, l)).count();
    rare as f64 / lemmas.len() as f64
}

pub fn word_frequency(corpus: &dyn FrequencyCorpus, lemmas: &[String]) -> WordFrequency {
    let mut out = WordFrequency::default();
    for lemma in lemmas {
        let bucket = match corpus.zipf(lemma) {
            Some(z) if z >= 4.0 => 0,
            Some(z) if z >= 3.0 => 1,
            Some(_) => 2,
            None => match lemma.chars().count() {
                0..=4 => 0,
                5..=7 => 1,
                _ => 2,
            },
        };
        match bucket {
            0 => out.common_short += 1,
            1 => out.common_long += 1,
            _ => out.uncommon += 1,
        }
    }
    out
}

pub fn zipf_stats(corpus: &dyn FrequencyCorpus, lemmas: &[String]) -> ZipfStats {
    if lemmas.is_empty() {
        return ZipfStats::default();
    }
    let values: Vec<f64> = lemmas
        .iter()
        .map(|l| zipf_or_heuristic(corpus, l))
        .collect();
    let mut sorted = values.clone();
    sorted.sort_by(f64::total_cmp);
    ZipfStats {
        mean: round_to(mean(&values), 3),
        p10: round_to(lower_quantile(&sorted, 0.1), 3),
        p90: round_to(lower_quantile(&sorted, 0.9), 3),
    }
}

// ---------------------------------------------------------------------------
// Sense index
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Ancestor {
    distance: u32,
    depth: u32,
}

/// Similarity of two senses via their lowest common hypernym.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    pub wu_palmer: f64,
    pub path: f64,
}

/// Senses of a fixed word list plus the hypernym closure of every sense,
/// looked up once per analysis.
pub struct SenseIndex {
    senses: HashMap<String, Vec<Synset>>,
    ancestors: HashMap<String, HashMap<String, Ancestor>>,
}

impl SenseIndex {
    pub fn build(lexicon: &dyn LexicalDatabase, words: &[String]) -> Self {
        let mut senses = HashMap::new();
        for word in words {
            senses
                .entry(word.clone())
                .or_insert_with(|| lexicon.synsets(word));
        }

        let mut lookups: HashMap<String, Option<Synset>> = HashMap::new();
        let mut ancestors = HashMap::new();
        for synset in senses.values().flatten() {
            if ancestors.contains_key(&synset.id) {
                continue;
            }
            let closure = hypernym_closure(lexicon, synset, &mut lookups);
            ancestors.insert(synset.id.clone(), closure);
        }

        Self { senses, ancestors }
    }

    pub fn senses(&self, word: &str) -> &[Synset] {
        self.senses.get(word).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Wu-Palmer and path similarity, `None` when the senses share no
    /// ancestor.
    pub fn similarity(&self, a: &Synset, b: &Synset) -> Option<Similarity> {
        let left = self.ancestors.get(&a.id)?;
        let right = self.ancestors.get(&b.id)?;

        let mut deepest: Option<(u32, u32, u32)> = None;
        let mut shortest = u32::MAX;
        for (id, l) in left {
            let Some(r) = right.get(id) else { continue };
            shortest = shortest.min(l.distance + r.distance);
            if deepest.map_or(true, |(depth, _, _)| l.depth > depth) {
                deepest = Some((l.depth, l.distance, r.distance));
            }
        }

        let (lcs_depth, dist_a, dist_b) = deepest?;
        let lcs = f64::from(lcs_depth) + 1.0;
        let wu_palmer = 2.0 * lcs / (f64::from(dist_a) + lcs + f64::from(dist_b) + lcs);
        Some(Similarity {
            wu_palmer,
            path: 1.0 / (f64::from(shortest) + 1.0),
        })
    }

    /// Related when any sense pair shares an ancestor or either word is a
    /// lemma of the other's senses.
    fn related(&self, w1: &str, w2: &str) -> bool {
        let s1 = self.senses(w1);
        let s2 = self.senses(w2);
        for a in s1 {
            for b in s2 {
                if self.similarity(a, b).is_some() {
                    return true;
                }
                if has_lemma(b, w1) || has_lemma(a, w2) {
                    return true;
                }
            }
        }
        false
    }
}

fn has_lemma(synset: &Synset, word: &str) -> bool {
    synset.lemmas.iter().any(|l| l.display_name() == word)
}

fn hypernym_closure(
    lexicon: &dyn LexicalDatabase,
    start: &Synset,
    lookups: &mut HashMap<String, Option<Synset>>,
) -> HashMap<String, Ancestor> {
    let mut closure = HashMap::new();
    closure.insert(
        start.id.clone(),
        Ancestor {
            distance: 0,
            depth: start.depth,
        },
    );
    let mut queue: VecDeque<(String, u32)> =
        start.hypernyms.iter().map(|h| (h.clone(), 1)).collect();

    while let Some((id, distance)) = queue.pop_front() {
        if closure.contains_key(&id) {
            continue;
        }
        let synset = lookups
            .entry(id.clone())
            .or_insert_with(|| lexicon.synset(&id))
            .clone();
        let Some(synset) = synset else { continue };
        closure.insert(
            id,
            Ancestor {
                distance,
                depth: synset.depth,
            },
        );
        queue.extend(synset.hypernyms.iter().map(|h| (h.clone(), distance + 1)));
    }
    closure
}

// ---------------------------------------------------------------------------
// Base metrics
// ---------------------------------------------------------------------------

fn synonyms(index: &SenseIndex, word: &str) -> HashSet<String> {
    let word_lower = word.to_lowercase();
    index
        .senses(word)
        .iter()
        .flat_map(|s| &s.lemmas)
        .map(|l| l.display_name())
        .filter(|name| name.to_lowercase() != word_lower)
        .collect()
}

/// Mean synonym-count bucket over the word types.
pub fn synonym_diversity(index: &SenseIndex, words: &[String]) -> f64 {
    let scores: Vec<f64> = words
        .iter()
        .map(|w| match synonyms(index, w).len() {
            n if n > 10 => 100.0,
            n if n > 5 => 80.0,
            n if n > 2 => 60.0,
            n if n > 0 => 40.0,
            _ => 20.0,
        })
        .collect();
    mean(&scores)
}

/// Mean sense-count bucket over the word types.
pub fn polysemy_score(index: &SenseIndex, words: &[String]) -> f64 {
    let scores: Vec<f64> = words
        .iter()
        .map(|w| match index.senses(w).len() {
            n if n > 5 => 100.0,
            n if n > 3 => 75.0,
            n if n > 1 => 50.0,
            _ => 25.0,
        })
        .collect();
    mean(&scores)
}

/// Percentage of word-type pairs that are semantically related.
pub fn semantic_density(index: &SenseIndex, words: &[String]) -> f64 {
    if words.len() < 2 {
        return 0.0;
    }
    let mut pairs = 0usize;
    let mut connected = 0usize;
    for (i, a) in words.iter().enumerate() {
        for b in &words[i + 1..] {
            pairs += 1;
            if index.related(a, b) {
                connected += 1;
            }
        }
    }
    (connected as f64 / pairs as f64 * 100.0).min(100.0)
}

// ---------------------------------------------------------------------------
// Sense assignment and derived metrics
// ---------------------------------------------------------------------------

fn gloss_tokens(synset: &Synset) -> HashSet<String> {
    std::iter::once(synset.definition.as_str())
        .chain(synset.examples.iter().map(String::as_str))
        .flat_map(str::split_whitespace)
        .filter(|t| t.chars().all(char::is_alphabetic))
        .map(str::to_lowercase)
        .collect()
}

/// Lesk-style sense choice: gloss overlap with the context, plus example
/// words found in the context, plus a small bonus for the first sense.
pub fn lesk<'a>(senses: &'a [Synset], context: &HashSet<String>) -> Option<&'a Synset> {
    let mut best = None;
    let mut best_score = 0.0;
    for (rank, synset) in senses.iter().enumerate() {
        let overlap = gloss_tokens(synset).intersection(context).count();
        let example_hits = synset
            .examples
            .iter()
            .flat_map(|e| e.split_whitespace())
            .filter(|t| context.contains(&t.to_lowercase()))
            .count();
        let bonus = if rank == 0 { MFS_BONUS } else { 0.0 };
        let score = (overlap + example_hits) as f64 + bonus;
        if score > best_score {
            best_score = score;
            best = Some(synset);
        }
    }
    best.or_else(|| senses.first())
}

/// Multiword noun phrases: a noun head plus its left determiners, modifiers
/// and compounds. Deduplicated, ASCII only, at most fifteen.
pub fn noun_phrases(doc: &AnnotatedDocument) -> Vec<String> {
    let mut phrases: Vec<String> = Vec::new();
    for (i, token) in doc.tokens().iter().enumerate() {
        if !matches!(token.pos, Pos::Noun | Pos::Propn) || token.dep == "compound" {
            continue;
        }
        let start = doc
            .child_indices(i)
            .iter()
            .copied()
            .filter(|&c| c < i && NOUN_PHRASE_DEPS.contains(&doc.token(c).dep.as_str()))
            .min();
        let Some(start) = start else { continue };
        let phrase = doc.tokens()[start..=i]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if phrase.split_whitespace().count() >= 2 && phrase.is_ascii() && !phrases.contains(&phrase)
        {
            phrases.push(phrase);
            if phrases.len() == MAX_NOUN_PHRASES {
                break;
            }
        }
    }
    phrases
}

fn semantic_coherence(index: &SenseIndex, assigned: &[(String, &Synset)]) -> f64 {
    if assigned.len() < 2 {
        return 0.0;
    }
    let scores: Vec<f64> = assigned
        .windows(2)
        .map(|pair| {
            let sim = index.similarity(pair[0].1, pair[1].1);
            let wup = sim.map_or(0.0, |s| s.wu_palmer);
            if wup == 0.0 {
                sim.map_or(0.0, |s| s.path)
            } else {
                wup
            }
        })
        .collect();
    (mean(&scores) * 100.0).clamp(0.0, 100.0)
}

fn lexname_distribution(assigned: &[(String, &Synset)]) -> (Vec<LexnameCount>, f64) {
    let mut counts: Vec<LexnameCount> = Vec::new();
    for (_, synset) in assigned {
        match counts.iter_mut().find(|c| c.lexname == synset.lexname) {
            Some(entry) => entry.count += 1,
            None => counts.push(LexnameCount {
                lexname: synset.lexname.clone(),
                count: 1,
            }),
        }
    }
    let raw: Vec<usize> = counts.iter().map(|c| c.count).collect();
    let diversity = (normalized_entropy(&raw) * 100.0).min(100.0);
    // stable sort keeps first-seen order among ties
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(MAX_LEXNAMES);
    (counts, diversity)
}

/// Unique content lemmas in order of first occurrence.
pub fn content_types(doc: &AnnotatedDocument) -> Vec<String> {
    let mut seen = HashSet::new();
    doc.alpha_tokens()
        .filter(|t| t.pos.is_content())
        .map(|t| t.lemma_lower())
        .filter(|l| seen.insert(l.clone()))
        .collect()
}

/// Full semantic-richness bundle for a document.
pub fn analyze_richness(
    doc: &AnnotatedDocument,
    lexicon: &dyn LexicalDatabase,
    corpus: &dyn FrequencyCorpus,
) -> SemanticRichness {
    let lemmas: Vec<String> = doc.alpha_tokens().map(|t| t.lemma_lower()).collect();
    let types = content_types(doc);
    let index = SenseIndex::build(lexicon, &types);

    let phrases = noun_phrases(doc);
    let mut context: HashSet<String> = types.iter().cloned().collect();
    for phrase in &phrases {
        context.extend(phrase.split_whitespace().map(str::to_lowercase));
    }

    let assigned: Vec<(String, &Synset)> = types
        .iter()
        .filter_map(|w| lesk(index.senses(w), &context).map(|s| (w.clone(), s)))
        .collect();

    let depths: Vec<f64> = assigned.iter().map(|(_, s)| f64::from(s.depth)).collect();
    let taxonomy_depth = if depths.is_empty() {
        0.0
    } else {
        (mean(&depths) / TAXONOMY_DEPTH_CEILING * 100.0).min(100.0)
    };
    let hypernyms: Vec<f64> = assigned.iter().map(|(_, s)| s.hypernyms.len() as f64).collect();
    let hyponyms: Vec<f64> = assigned.iter().map(|(_, s)| s.hyponyms.len() as f64).collect();

    let with_antonyms = types
        .iter()
        .filter(|w| {
            index
                .senses(w)
                .iter()
                .flat_map(|s| &s.lemmas)
                .any(|l| !l.antonyms.is_empty())
        })
        .count();
    let antonym_ratio = if types.is_empty() {
        0.0
    } else {
        with_antonyms as f64 / types.len() as f64
    };

    let derivations: HashSet<String> = types
        .iter()
        .flat_map(|w| index.senses(w))
        .flat_map(|s| &s.lemmas)
        .flat_map(|l| &l.derivations)
        .map(|d| d.replace('_', " "))
        .collect();

    let sense_counts: Vec<usize> = types.iter().map(|w| index.senses(w).len()).collect();
    let (lexnames, lexname_diversity) = lexname_distribution(&assigned);

    SemanticRichness {
        synonym_diversity: synonym_diversity(&index, &types),
        polysemy_score: polysemy_score(&index, &types),
        semantic_density: semantic_density(&index, &types),
        word_frequency: word_frequency(corpus, &lemmas),
        extras: SemanticExtras {
            noun_phrases: phrases,
            semantic_coherence: round2(semantic_coherence(&index, &assigned)),
            taxonomy_depth: round2(taxonomy_depth),
            avg_hypernyms: round2(mean(&hypernyms)),
            avg_hyponyms: round2(mean(&hyponyms)),
            antonym_contrast_ratio: round_to(antonym_ratio, 4),
            derivational_variety: derivations.len(),
            sense_entropy: round_to(normalized_entropy(&sense_counts), 4),
            lexname_distribution: lexnames,
            lexname_diversity: round2(lexname_diversity),
            unique_content_types: types.len(),
            zipf_stats: zipf_stats(corpus, &lemmas),
        },
    }
}

/// Synonyms of `word` short enough for `level`: at most six characters for
/// A1/A2, ten for B1/B2, any length for C1/C2. Up to five, the word itself
/// excluded.
pub fn word_suggestions(lexicon: &dyn LexicalDatabase, word: &str, level: CefrLevel) -> Vec<String> {
    let max_len = match level {
        CefrLevel::A1 | CefrLevel::A2 => Some(6),
        CefrLevel::B1 | CefrLevel::B2 => Some(10),
        CefrLevel::C1 | CefrLevel::C2 => None,
    };
    let base = word.to_lowercase().replace('_', " ");
    let mut out: Vec<String> = Vec::new();
    for synset in lexicon.synsets(word) {
        for lemma in &synset.lemmas {
            let name = lemma.display_name();
            let fits = max_len.map_or(true, |max| name.chars().count() <= max);
            if fits && name.to_lowercase() != base && !out.contains(&name) {
                out.push(name);
            }
        }
    }
    out.truncate(MAX_SUGGESTIONS);
    out
}
