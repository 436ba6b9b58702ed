//! In-memory lexical database and frequency table.
//!
//! Both are plain indexes built from already-parsed data; loading from disk
//! lives in `lexiscore-providers`.

use std::collections::HashMap;

use crate::traits::{FrequencyCorpus, LexicalDatabase, Synset};

/// Synsets indexed by lemma name and by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryLexicon {
    synsets: Vec<Synset>,
    by_id: HashMap<String, usize>,
    by_lemma: HashMap<String, Vec<usize>>,
}

impl MemoryLexicon {
    /// Index synsets in the given order; that order is the sense ranking.
    pub fn new(synsets: Vec<Synset>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_lemma: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, synset) in synsets.iter().enumerate() {
            by_id.entry(synset.id.clone()).or_insert(idx);
            for lemma in &synset.lemmas {
                let key = lemma.name.to_lowercase();
                let senses = by_lemma.entry(key).or_default();
                if !senses.contains(&idx) {
                    senses.push(idx);
                }
            }
        }
        Self {
            synsets,
            by_id,
            by_lemma,
        }
    }

    pub fn len(&self) -> usize {
        self.synsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.synsets.is_empty()
    }

    fn lookup(&self, word: &str) -> Option<&Vec<usize>> {
        let word = word.trim().to_lowercase().replace(' ', "_");
        base_forms(&word)
            .into_iter()
            .find_map(|form| self.by_lemma.get(&form))
    }
}

/// Candidate dictionary forms for an inflected word, the word itself first.
fn base_forms(word: &str) -> Vec<String> {
    let mut forms = vec![word.to_string()];
    let suffixes: [(&str, &str); 6] = [
        ("ies", "y"),
        ("es", ""),
        ("s", ""),
        ("ing", ""),
        ("ed", ""),
        ("ing", "e"),
    ];
    for (suffix, replacement) in suffixes {
        if let Some(stem) = word.strip_suffix(suffix) {
            if stem.len() >= 2 {
                forms.push(format!("{stem}{replacement}"));
            }
        }
    }
    forms
}

impl LexicalDatabase for MemoryLexicon {
    fn synsets(&self, lemma: &str) -> Vec<Synset> {
        self.lookup(lemma)
            .map(|ids| ids.iter().map(|&i| self.synsets[i].clone()).collect())
            .unwrap_or_default()
    }

    fn synset(&self, id: &str) -> Option<Synset> {
        self.by_id.get(id).map(|&i| self.synsets[i].clone())
    }
}

/// Lemma → Zipf frequency table.
#[derive(Debug, Clone, Default)]
pub struct MemoryFrequencies {
    table: HashMap<String, f64>,
}

impl MemoryFrequencies {
    pub fn new(entries: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            table: entries
                .into_iter()
                .map(|(word, zipf)| (word.to_lowercase(), zipf))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl FrequencyCorpus for MemoryFrequencies {
    fn zipf(&self, lemma: &str) -> Option<f64> {
        self.table.get(&lemma.to_lowercase()).copied()
    }
}
