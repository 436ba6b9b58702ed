//! Annotated documents: the unit every scorer reads.
//!
//! An [`AnnotatedDocument`] is produced once by an
//! [`Annotator`](crate::traits::Annotator) and never mutated afterwards.
//! Head references are token indices inside the same document; a root token
//! points to itself.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Coarse universal part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pos {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    Space,
    #[serde(other)]
    X,
}

impl Pos {
    /// Nouns, verbs, adjectives and adverbs.
    pub fn is_content(self) -> bool {
        matches!(self, Pos::Noun | Pos::Verb | Pos::Adj | Pos::Adv)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Pos::Adj => "ADJ",
            Pos::Adp => "ADP",
            Pos::Adv => "ADV",
            Pos::Aux => "AUX",
            Pos::Cconj => "CCONJ",
            Pos::Det => "DET",
            Pos::Intj => "INTJ",
            Pos::Noun => "NOUN",
            Pos::Num => "NUM",
            Pos::Part => "PART",
            Pos::Pron => "PRON",
            Pos::Propn => "PROPN",
            Pos::Punct => "PUNCT",
            Pos::Sconj => "SCONJ",
            Pos::Sym => "SYM",
            Pos::Verb => "VERB",
            Pos::Space => "SPACE",
            Pos::X => "X",
        }
    }
}

/// Morphological number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Number {
    Sing,
    Plur,
}

/// One token with its linguistic annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    pub text: String,
    #[serde(default)]
    pub lemma: String,
    pub pos: Pos,
    /// Fine-grained Penn Treebank tag (`VBZ`, `MD`, ...).
    #[serde(default)]
    pub tag: String,
    /// Dependency label (`nsubj`, `auxpass`, `ROOT`, ...).
    #[serde(default)]
    pub dep: String,
    /// Index of the governing token in the same document.
    pub head: usize,
    #[serde(default)]
    pub number: Option<Number>,
}

impl AnnotatedToken {
    /// True when the token text is non-empty and purely alphabetic.
    pub fn is_alpha(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_alphabetic)
    }

    pub fn is_stop(&self) -> bool {
        is_stop_word(&self.lower())
    }

    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }

    /// Lowercased lemma, falling back to the surface form when the annotator
    /// left the lemma empty.
    pub fn lemma_lower(&self) -> String {
        if self.lemma.is_empty() {
            self.lower()
        } else {
            self.lemma.to_lowercase()
        }
    }
}

/// Token range of one sentence, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceSpan {
    pub start: usize,
    pub end: usize,
}

/// Serialized shape of a document; children are derived on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentParts {
    text: String,
    tokens: Vec<AnnotatedToken>,
    #[serde(default)]
    sentences: Vec<SentenceSpan>,
}

/// Ordered tokens plus sentence boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DocumentParts", into = "DocumentParts")]
pub struct AnnotatedDocument {
    text: String,
    tokens: Vec<AnnotatedToken>,
    sentences: Vec<SentenceSpan>,
    children: Vec<Vec<usize>>,
}

impl From<DocumentParts> for AnnotatedDocument {
    fn from(parts: DocumentParts) -> Self {
        AnnotatedDocument::new(parts.text, parts.tokens, parts.sentences)
    }
}

impl From<AnnotatedDocument> for DocumentParts {
    fn from(doc: AnnotatedDocument) -> Self {
        DocumentParts {
            text: doc.text,
            tokens: doc.tokens,
            sentences: doc.sentences,
        }
    }
}

impl AnnotatedDocument {
    /// Build a document, repairing out-of-range heads (they become roots)
    /// and invalid sentence spans. A document without sentence spans is
    /// treated as one sentence.
    pub fn new(text: String, mut tokens: Vec<AnnotatedToken>, sentences: Vec<SentenceSpan>) -> Self {
        let len = tokens.len();
        for (i, token) in tokens.iter_mut().enumerate() {
            if token.head >= len {
                token.head = i;
            }
        }

        let mut sentences: Vec<SentenceSpan> = sentences
            .into_iter()
            .map(|s| SentenceSpan {
                start: s.start.min(len),
                end: s.end.min(len),
            })
            .filter(|s| s.start < s.end)
            .collect();
        if sentences.is_empty() && len > 0 {
            sentences.push(SentenceSpan { start: 0, end: len });
        }

        let mut children = vec![Vec::new(); len];
        for (i, token) in tokens.iter().enumerate() {
            if token.head != i {
                children[token.head].push(i);
            }
        }

        Self {
            text,
            tokens,
            sentences,
            children,
        }
    }

    /// An empty document for the given text.
    pub fn empty(text: impl Into<String>) -> Self {
        Self::new(text.into(), Vec::new(), Vec::new())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[AnnotatedToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, i: usize) -> &AnnotatedToken {
        &self.tokens[i]
    }

    /// The governing token of token `i`.
    pub fn head(&self, i: usize) -> &AnnotatedToken {
        &self.tokens[self.tokens[i].head]
    }

    /// Indices of the tokens governed by token `i`, in document order.
    pub fn child_indices(&self, i: usize) -> &[usize] {
        &self.children[i]
    }

    pub fn children(&self, i: usize) -> impl Iterator<Item = &AnnotatedToken> + '_ {
        self.children[i].iter().map(move |&c| &self.tokens[c])
    }

    /// Token index ranges of every sentence.
    pub fn sentence_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.sentences.iter().map(|s| s.start..s.end)
    }

    pub fn sentences(&self) -> impl Iterator<Item = &[AnnotatedToken]> + '_ {
        self.sentence_ranges().map(move |r| &self.tokens[r])
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    pub fn alpha_tokens(&self) -> impl Iterator<Item = &AnnotatedToken> + '_ {
        self.tokens.iter().filter(|t| t.is_alpha())
    }
}

/// Incremental builder for documents assembled in code.
///
/// Heads passed to [`push`](Self::push) are relative to the start of the
/// current sentence.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    text: Option<String>,
    tokens: Vec<AnnotatedToken>,
    sentences: Vec<SentenceSpan>,
    sentence_start: usize,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this text instead of joining the token texts.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn push(mut self, text: &str, lemma: &str, pos: Pos, tag: &str, dep: &str, head: usize) -> Self {
        self.tokens.push(AnnotatedToken {
            text: text.to_string(),
            lemma: lemma.to_string(),
            pos,
            tag: tag.to_string(),
            dep: dep.to_string(),
            head: self.sentence_start + head,
            number: None,
        });
        self
    }

    /// Set the morphological number of the last pushed token.
    pub fn number(mut self, number: Number) -> Self {
        if let Some(last) = self.tokens.last_mut() {
            last.number = Some(number);
        }
        self
    }

    pub fn end_sentence(mut self) -> Self {
        let end = self.tokens.len();
        if end > self.sentence_start {
            self.sentences.push(SentenceSpan {
                start: self.sentence_start,
                end,
            });
        }
        self.sentence_start = end;
        self
    }

    pub fn build(self) -> AnnotatedDocument {
        let builder = self.end_sentence();
        let text = match builder.text {
            Some(text) => text,
            None => join_tokens(&builder.tokens),
        };
        AnnotatedDocument::new(text, builder.tokens, builder.sentences)
    }
}

fn join_tokens(tokens: &[AnnotatedToken]) -> String {
    let mut out = String::new();
    for token in tokens {
        if !out.is_empty() && token.pos != Pos::Punct {
            out.push(' ');
        }
        out.push_str(&token.text);
    }
    out
}

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "also", "am", "among",
    "an", "and", "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing", "done", "down",
    "during", "each", "either", "else", "enough", "even", "ever", "every", "few", "for", "from",
    "further", "get", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "however", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "least", "less", "made", "make", "many", "may", "me", "might", "more",
    "most", "much", "must", "my", "myself", "neither", "never", "no", "nor", "not", "now", "of",
    "off", "often", "on", "once", "one", "only", "or", "other", "our", "ours", "ourselves",
    "out", "over", "own", "per", "please", "quite", "rather", "really", "same", "say", "see",
    "seem", "she", "should", "since", "so", "some", "still", "such", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "there", "therefore", "these", "they",
    "this", "those", "though", "through", "thus", "to", "too", "under", "until", "up", "upon",
    "us", "used", "very", "via", "was", "we", "well", "were", "what", "whatever", "when",
    "where", "whether", "which", "while", "who", "whole", "whom", "whose", "why", "will",
    "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Whether a lowercased word is on the built-in English stop list.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnnotatedDocument {
        DocumentBuilder::new()
            .push("She", "she", Pos::Pron, "PRP", "nsubj", 1)
            .number(Number::Sing)
            .push("reads", "read", Pos::Verb, "VBZ", "ROOT", 1)
            .push("books", "book", Pos::Noun, "NNS", "dobj", 1)
            .push(".", ".", Pos::Punct, ".", "punct", 1)
            .end_sentence()
            .push("It", "it", Pos::Pron, "PRP", "nsubj", 1)
            .push("helps", "help", Pos::Verb, "VBZ", "ROOT", 1)
            .push(".", ".", Pos::Punct, ".", "punct", 1)
            .build()
    }

    #[test]
    fn builder_offsets_heads_per_sentence() {
        let doc = sample();
        assert_eq!(doc.text(), "She reads books. It helps.");
        assert_eq!(doc.sentence_count(), 2);
        assert_eq!(doc.token(4).head, 5);
        assert_eq!(doc.head(6).text, "helps");
        let kids: Vec<&str> = doc.children(1).map(|t| t.text.as_str()).collect();
        assert_eq!(kids, vec!["She", "books", "."]);
    }

    #[test]
    fn out_of_range_head_becomes_root() {
        let token = AnnotatedToken {
            text: "Hi".into(),
            lemma: "hi".into(),
            pos: Pos::Intj,
            tag: "UH".into(),
            dep: "ROOT".into(),
            head: 42,
            number: None,
        };
        let doc = AnnotatedDocument::new("Hi".into(), vec![token], Vec::new());
        assert_eq!(doc.token(0).head, 0);
        assert_eq!(doc.sentence_count(), 1);
        assert!(doc.child_indices(0).is_empty());
    }

    #[test]
    fn json_round_trip_rebuilds_children() {
        let doc = sample();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("children"));
        let back: AnnotatedDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.child_indices(5), &[4, 6]);
    }

    #[test]
    fn unknown_pos_deserializes_as_x() {
        let pos: Pos = serde_json::from_str("\"FOO\"").unwrap();
        assert_eq!(pos, Pos::X);
    }

    #[test]
    fn stop_list_is_sorted_and_flags_tokens() {
        assert!(STOP_WORDS.windows(2).all(|w| w[0] < w[1]));
        let doc = sample();
        assert!(doc.token(0).is_stop());
        assert!(!doc.token(2).is_stop());
        assert!(!doc.token(3).is_alpha());
    }
}
