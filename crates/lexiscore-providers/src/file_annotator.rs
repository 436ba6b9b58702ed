//! Pre-annotated documents read from disk.
//!
//! Each `*.json` file in the directory holds one serialized
//! [`AnnotatedDocument`]. Documents are looked up by their (trimmed) text, so
//! an essay can be analysed offline once it has been annotated elsewhere.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

use lexiscore_core::cache::ModelCache;
use lexiscore_core::document::AnnotatedDocument;
use lexiscore_core::traits::Annotator;

use crate::error::ProviderError;

pub struct FileAnnotator {
    dir: PathBuf,
    documents: ModelCache<HashMap<String, AnnotatedDocument>>,
}

impl FileAnnotator {
    /// Annotator over a directory of JSON documents, or a single JSON file.
    /// Nothing is read until the first lookup.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let dir = path.into();
        let source = dir.clone();
        Self {
            documents: ModelCache::new(format!("annotations:{}", dir.display()), move || {
                load_documents(&source)
            }),
            dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Number of documents available, loading them if needed.
    pub fn document_count(&self) -> anyhow::Result<usize> {
        Ok(self.documents.get()?.len())
    }
}

fn read_document(path: &Path) -> anyhow::Result<AnnotatedDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| ProviderError::DataFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let doc = serde_json::from_str(&content).map_err(|e| ProviderError::DataFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(doc)
}

fn load_documents(path: &Path) -> anyhow::Result<HashMap<String, AnnotatedDocument>> {
    let mut documents = HashMap::new();

    if path.is_file() {
        let doc = read_document(path)?;
        documents.insert(doc.text().trim().to_string(), doc);
        return Ok(documents);
    }

    let entries = std::fs::read_dir(path)
        .with_context(|| format!("failed to read annotation directory: {}", path.display()))?;
    for entry in entries {
        let file = entry?.path();
        if file.extension().is_some_and(|ext| ext == "json") {
            match read_document(&file) {
                Ok(doc) => {
                    documents.insert(doc.text().trim().to_string(), doc);
                }
                Err(e) => tracing::warn!("skipping {}: {:#}", file.display(), e),
            }
        }
    }
    tracing::debug!(count = documents.len(), dir = %path.display(), "annotations loaded");
    Ok(documents)
}

#[async_trait]
impl Annotator for FileAnnotator {
    fn name(&self) -> &str {
        "file"
    }

    async fn annotate(&self, text: &str) -> anyhow::Result<AnnotatedDocument> {
        let documents = self.documents.get()?;
        documents
            .get(text.trim())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no annotation for text in {}", self.dir.display()))
    }
}
