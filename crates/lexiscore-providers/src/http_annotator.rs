//! HTTP annotation client.
//!
//! Sends raw text to an annotation service (a spaCy-style tokenizer, tagger
//! and dependency parser behind HTTP) and expects an annotated document back:
//!
//! ```json
//! {"text": "...", "tokens": [{"text": "She", "lemma": "she", "pos": "PRON",
//!   "tag": "PRP", "dep": "nsubj", "head": 1}], "sentences": [{"start": 0, "end": 4}]}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use lexiscore_core::document::AnnotatedDocument;
use lexiscore_core::traits::Annotator;

use crate::error::ProviderError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8090";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct HttpAnnotator {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    text: &'a str,
}

impl HttpAnnotator {
    pub fn new(base_url: &str) -> Result<Self, ProviderError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            timeout_secs,
            client,
        })
    }
}

#[async_trait]
impl Annotator for HttpAnnotator {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, text), fields(base_url = %self.base_url, chars = text.len()))]
    async fn annotate(&self, text: &str) -> anyhow::Result<AnnotatedDocument> {
        let url = format!("{}/annotate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&AnnotateRequest { text })
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs, "annotator", &self.base_url))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let doc: AnnotatedDocument = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse annotation: {e}")))?;

        tracing::debug!(
            tokens = doc.len(),
            sentences = doc.sentence_count(),
            "annotation received"
        );
        Ok(doc)
    }
}
