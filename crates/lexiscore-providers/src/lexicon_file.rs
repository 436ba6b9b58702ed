//! File-backed lexical database and word-frequency table.
//!
//! Both are loaded lazily through a [`ModelCache`] on first lookup. A file
//! that cannot be loaded is logged once and treated as empty from then on,
//! so vocabulary scoring degrades to zero semantic richness instead of
//! failing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lexiscore_core::cache::ModelCache;
use lexiscore_core::lexicon::{MemoryFrequencies, MemoryLexicon};
use lexiscore_core::traits::{FrequencyCorpus, LexicalDatabase, Synset};

use crate::error::ProviderError;

/// Lexical database read from a JSON array of synsets.
pub struct FileLexicon {
    cache: ModelCache<MemoryLexicon>,
}

impl FileLexicon {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            cache: ModelCache::new(format!("lexicon:{}", path.display()), move || {
                load_lexicon(&path)
            }),
        }
    }

    /// The loaded lexicon, or `None` if it failed to load.
    fn lexicon(&self) -> Option<Arc<MemoryLexicon>> {
        self.cache.get().ok()
    }

    pub fn cache(&self) -> &ModelCache<MemoryLexicon> {
        &self.cache
    }
}

fn load_lexicon(path: &Path) -> anyhow::Result<MemoryLexicon> {
    let data_err = |message: String| ProviderError::DataFile {
        path: path.display().to_string(),
        message,
    };
    let content = std::fs::read_to_string(path).map_err(|e| data_err(e.to_string()))?;
    let synsets: Vec<Synset> =
        serde_json::from_str(&content).map_err(|e| data_err(e.to_string()))?;
    tracing::debug!(synsets = synsets.len(), "lexicon loaded");
    Ok(MemoryLexicon::new(synsets))
}

impl LexicalDatabase for FileLexicon {
    fn synsets(&self, lemma: &str) -> Vec<Synset> {
        self.lexicon()
            .map(|l| l.synsets(lemma))
            .unwrap_or_default()
    }

    fn synset(&self, id: &str) -> Option<Synset> {
        self.lexicon().and_then(|l| l.synset(id))
    }
}

/// Zipf frequency table read from a `word<TAB>zipf` file. Blank lines and
/// lines starting with `#` are ignored.
pub struct FileFrequencies {
    cache: ModelCache<MemoryFrequencies>,
}

impl FileFrequencies {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            cache: ModelCache::new(format!("frequencies:{}", path.display()), move || {
                load_frequencies(&path)
            }),
        }
    }

    pub fn cache(&self) -> &ModelCache<MemoryFrequencies> {
        &self.cache
    }
}

/// Parse `word<TAB>zipf` lines.
pub fn parse_frequencies(content: &str) -> Result<Vec<(String, f64)>, String> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|(n, line)| {
            let (word, zipf) = line
                .split_once('\t')
                .ok_or_else(|| format!("line {}: expected word<TAB>zipf", n + 1))?;
            let zipf: f64 = zipf
                .trim()
                .parse()
                .map_err(|_| format!("line {}: bad zipf value '{}'", n + 1, zipf.trim()))?;
            Ok((word.trim().to_string(), zipf))
        })
        .collect()
}

fn load_frequencies(path: &Path) -> anyhow::Result<MemoryFrequencies> {
    let data_err = |message: String| ProviderError::DataFile {
        path: path.display().to_string(),
        message,
    };
    let content = std::fs::read_to_string(path).map_err(|e| data_err(e.to_string()))?;
    let entries = parse_frequencies(&content).map_err(data_err)?;
    tracing::debug!(entries = entries.len(), "frequency table loaded");
    Ok(MemoryFrequencies::new(entries))
}

impl FrequencyCorpus for FileFrequencies {
    fn zipf(&self, lemma: &str) -> Option<f64> {
        self.cache.get().ok().and_then(|table| table.zipf(lemma))
    }
}
