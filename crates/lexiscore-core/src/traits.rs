//! Collaborator trait definitions.
//!
//! Annotation and rule checking are async services implemented by the
//! `lexiscore-providers` crate. Lexical lookups are synchronous and
//! read-only so scoring can stay a pure function of its inputs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::AnnotatedDocument;

// ---------------------------------------------------------------------------
// Annotator trait
// ---------------------------------------------------------------------------

/// Tokenizer, tagger and dependency parser behind one call.
#[async_trait]
pub trait Annotator: Send + Sync {
    /// Human-readable annotator name (e.g. "http").
    fn name(&self) -> &str;

    /// Annotate raw text into an immutable document.
    async fn annotate(&self, text: &str) -> anyhow::Result<AnnotatedDocument>;
}

// ---------------------------------------------------------------------------
// Rule checker trait
// ---------------------------------------------------------------------------

/// Grammar rule-checking service. Callers must tolerate it being unavailable.
#[async_trait]
pub trait RuleChecker: Send + Sync {
    /// Human-readable checker name (e.g. "languagetool").
    fn name(&self) -> &str;

    /// Check text and return every rule violation found.
    async fn check(&self, text: &str) -> anyhow::Result<Vec<RuleMatch>>;

    /// Produce corrected text from previously returned matches.
    ///
    /// The default applies the first replacement of each match, right to
    /// left, skipping matches that overlap one already applied.
    async fn correct(&self, text: &str, matches: &[RuleMatch]) -> anyhow::Result<String> {
        Ok(apply_replacements(text, matches))
    }
}

/// A single rule violation reported by a [`RuleChecker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    /// Checker-specific rule identifier (e.g. "EN_A_VS_AN").
    pub rule_id: String,
    /// Message explaining the violation.
    pub message: String,
    /// Character offset of the flagged span.
    pub offset: usize,
    /// Length of the flagged span in characters.
    pub length: usize,
    /// Suggested replacements, best first.
    #[serde(default)]
    pub replacements: Vec<String>,
    /// Surrounding text as reported by the checker.
    #[serde(default)]
    pub context: String,
}

/// Apply the first replacement of every match to `text`.
pub fn apply_replacements(text: &str, matches: &[RuleMatch]) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let mut ordered: Vec<&RuleMatch> = matches
        .iter()
        .filter(|m| !m.replacements.is_empty())
        .collect();
    ordered.sort_by(|a, b| b.offset.cmp(&a.offset));

    let mut boundary = chars.len();
    for m in ordered {
        let end = m.offset.saturating_add(m.length);
        if end > boundary || m.offset > chars.len() {
            continue;
        }
        chars.splice(m.offset..end, m.replacements[0].chars());
        boundary = m.offset;
    }
    chars.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Lexical database trait
// ---------------------------------------------------------------------------

/// WordNet-style thesaurus. Misses are empty results, never errors.
pub trait LexicalDatabase: Send + Sync {
    /// All senses of a lemma, most frequent first.
    fn synsets(&self, lemma: &str) -> Vec<Synset>;

    /// Look a sense up by identifier.
    fn synset(&self, id: &str) -> Option<Synset>;
}

/// One word sense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synset {
    /// Identifier such as "dog.n.01".
    pub id: String,
    /// Lexicographer file / semantic domain (e.g. "noun.animal").
    #[serde(default)]
    pub lexname: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub lemmas: Vec<SynsetLemma>,
    /// Identifiers of direct hypernyms.
    #[serde(default)]
    pub hypernyms: Vec<String>,
    /// Identifiers of direct hyponyms.
    #[serde(default)]
    pub hyponyms: Vec<String>,
    /// Minimum distance to a root of the taxonomy.
    #[serde(default)]
    pub depth: u32,
}

/// A lemma inside a synset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynsetLemma {
    /// Lemma name, multiword lemmas joined with `_`.
    pub name: String,
    #[serde(default)]
    pub antonyms: Vec<String>,
    /// Derivationally related forms.
    #[serde(default)]
    pub derivations: Vec<String>,
}

impl SynsetLemma {
    /// Name with underscores turned into spaces.
    pub fn display_name(&self) -> String {
        self.name.replace('_', " ")
    }
}

/// A lexical database that knows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLexicon;

impl LexicalDatabase for NoLexicon {
    fn synsets(&self, _lemma: &str) -> Vec<Synset> {
        Vec::new()
    }

    fn synset(&self, _id: &str) -> Option<Synset> {
        None
    }
}

// ---------------------------------------------------------------------------
// Frequency corpus trait
// ---------------------------------------------------------------------------

/// Word-frequency corpus on the Zipf scale (roughly 1 = rare, 7 = "the").
pub trait FrequencyCorpus: Send + Sync {
    /// Zipf frequency of a lemma, or `None` if the corpus has no entry.
    fn zipf(&self, lemma: &str) -> Option<f64>;
}

/// A frequency corpus with no entries; every lookup uses the length heuristic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFrequencies;

impl FrequencyCorpus for NoFrequencies {
    fn zipf(&self, _lemma: &str) -> Option<f64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(offset: usize, length: usize, replacement: &str) -> RuleMatch {
        RuleMatch {
            rule_id: "TEST".into(),
            message: "test".into(),
            offset,
            length,
            replacements: vec![replacement.into()],
            context: String::new(),
        }
    }

    #[test]
    fn replacements_apply_right_to_left() {
        let text = "He go to a school every days.";
        let matches = vec![rule(3, 2, "goes"), rule(24, 4, "day")];
        assert_eq!(
            apply_replacements(text, &matches),
            "He goes to a school every day."
        );
    }

    #[test]
    fn overlapping_and_empty_matches_are_skipped() {
        let text = "abcdef";
        let mut empty = rule(0, 1, "x");
        empty.replacements.clear();
        let matches = vec![rule(2, 3, "X"), rule(3, 2, "Y"), empty];
        assert_eq!(apply_replacements(text, &matches), "abcYf");
    }

    #[test]
    fn offsets_are_characters_not_bytes() {
        let text = "café bad";
        let matches = vec![rule(5, 3, "good")];
        assert_eq!(apply_replacements(text, &matches), "café good");
    }

    #[test]
    fn null_collaborators_return_nothing() {
        assert!(NoLexicon.synsets("dog").is_empty());
        assert!(NoLexicon.synset("dog.n.01").is_none());
        assert!(NoFrequencies.zipf("dog").is_none());
    }
}
