//! Mock collaborators for testing the analyzer without external services.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use lexiscore_core::document::AnnotatedDocument;
use lexiscore_core::traits::{Annotator, RuleChecker, RuleMatch};

/// A rule checker returning canned matches.
pub struct MockRuleChecker {
    matches: Vec<RuleMatch>,
    /// Simulated latency per call.
    delay: Option<Duration>,
    /// Fail every call with this message.
    failure: Option<String>,
    call_count: AtomicU32,
    last_text: Mutex<Option<String>>,
}

impl MockRuleChecker {
    /// A checker that always reports the given matches.
    pub fn new(matches: Vec<RuleMatch>) -> Self {
        Self {
            matches,
            delay: None,
            failure: None,
            call_count: AtomicU32::new(0),
            last_text: Mutex::new(None),
        }
    }

    /// A checker that finds nothing.
    pub fn clean() -> Self {
        Self::new(Vec::new())
    }

    /// A checker whose every call fails, like an unreachable service.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::clean()
        }
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_text(&self) -> Option<String> {
        self.last_text.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl RuleChecker for MockRuleChecker {
    fn name(&self) -> &str {
        "mock"
    }

    async fn check(&self, text: &str) -> anyhow::Result<Vec<RuleMatch>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_text.lock().unwrap_or_else(|p| p.into_inner()) = Some(text.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            anyhow::bail!("{message}");
        }
        Ok(self.matches.clone())
    }
}

/// An annotator returning prepared documents keyed by trimmed text.
pub struct MockAnnotator {
    documents: HashMap<String, AnnotatedDocument>,
    /// Returned when no text matches.
    fallback: Option<AnnotatedDocument>,
    call_count: AtomicU32,
}

impl MockAnnotator {
    pub fn new(documents: impl IntoIterator<Item = AnnotatedDocument>) -> Self {
        Self {
            documents: documents
                .into_iter()
                .map(|d| (d.text().trim().to_string(), d))
                .collect(),
            fallback: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// An annotator that answers every text with the same document.
    pub fn with_fixed_document(doc: AnnotatedDocument) -> Self {
        Self {
            documents: HashMap::new(),
            fallback: Some(doc),
            call_count: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Annotator for MockAnnotator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn annotate(&self, text: &str) -> anyhow::Result<AnnotatedDocument> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.documents
            .get(text.trim())
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("mock annotator has no document for this text"))
    }
}
