//! LanguageTool rule checker.
//!
//! Talks to the `/v2/check` endpoint of a LanguageTool server (public or
//! self-hosted). LanguageTool reports offsets in UTF-16 code units; they are
//! converted to character offsets before leaving this module.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use lexiscore_core::traits::{RuleChecker, RuleMatch};

use crate::error::ProviderError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";
pub const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// LanguageTool HTTP client.
pub struct LanguageToolChecker {
    base_url: String,
    language: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl LanguageToolChecker {
    pub fn new(base_url: &str, language: &str) -> Result<Self, ProviderError> {
        Self::with_timeout(base_url, language, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(
        base_url: &str,
        language: &str,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };
        let language = if language.is_empty() {
            DEFAULT_LANGUAGE
        } else {
            language
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            language: language.to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<LtMatch>,
}

#[derive(Deserialize)]
struct LtMatch {
    #[serde(default)]
    message: String,
    offset: usize,
    length: usize,
    #[serde(default)]
    replacements: Vec<LtReplacement>,
    #[serde(default)]
    rule: Option<LtRule>,
    #[serde(default)]
    context: Option<LtContext>,
}

#[derive(Deserialize)]
struct LtReplacement {
    value: String,
}

#[derive(Deserialize)]
struct LtRule {
    #[serde(default)]
    id: String,
}

#[derive(Deserialize)]
struct LtContext {
    #[serde(default)]
    text: String,
}

/// Convert a UTF-16 code-unit offset into a character offset.
pub fn utf16_to_char_offset(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (chars, c) in text.chars().enumerate() {
        if units >= utf16_offset {
            return chars;
        }
        units += c.len_utf16();
    }
    text.chars().count()
}

/// Translate a `/v2/check` response into rule matches with char offsets.
fn into_matches(text: &str, response: CheckResponse) -> Vec<RuleMatch> {
    response
        .matches
        .into_iter()
        .map(|m| {
            let offset = utf16_to_char_offset(text, m.offset);
            let end = utf16_to_char_offset(text, m.offset + m.length);
            RuleMatch {
                rule_id: m.rule.map(|r| r.id).unwrap_or_default(),
                message: m.message,
                offset,
                length: end - offset,
                replacements: m.replacements.into_iter().map(|r| r.value).collect(),
                context: m.context.map(|c| c.text).unwrap_or_default(),
            }
        })
        .collect()
}

#[async_trait]
impl RuleChecker for LanguageToolChecker {
    fn name(&self) -> &str {
        "languagetool"
    }

    #[instrument(skip(self, text), fields(language = %self.language, chars = text.len()))]
    async fn check(&self, text: &str) -> anyhow::Result<Vec<RuleMatch>> {
        let url = format!("{}/v2/check", self.base_url);
        let form = reqwest::Url::parse_with_params(
            "http://form.invalid/",
            &[("text", text), ("language", self.language.as_str())],
        )?;
        let body = form.query().unwrap_or_default().to_string();

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs, "LanguageTool", &self.base_url))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let parsed: CheckResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse check response: {e}")))?;

        let matches = into_matches(text, parsed);
        tracing::debug!(matches = matches.len(), "LanguageTool check complete");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn check_body() -> serde_json::Value {
        serde_json::json!({
            "software": {"name": "LanguageTool"},
            "matches": [
                {
                    "message": "The verb 'go' does not agree with the subject.",
                    "offset": 4,
                    "length": 2,
                    "replacements": [{"value": "goes"}, {"value": "went"}],
                    "context": {"text": "She go to school.", "offset": 4, "length": 2},
                    "rule": {"id": "HE_VERB_AGR", "description": "Agreement"}
                },
                {
                    "message": "Possible typo",
                    "offset": 10,
                    "length": 6,
                    "replacements": [],
                    "rule": {"id": "MORFOLOGIK_RULE_EN_US"}
                }
            ]
        })
    }

    #[tokio::test]
    async fn successful_check() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/check"))
            .and(header("Content-Type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("language=en-GB"))
            .and(body_string_contains("text=She+go+to+school"))
            .respond_with(ResponseTemplate::new(200).set_body_json(check_body()))
            .expect(1)
            .mount(&server)
            .await;

        let checker = LanguageToolChecker::new(&server.uri(), "en-GB").unwrap();
        let matches = checker.check("She go to school.").await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].rule_id, "HE_VERB_AGR");
        assert_eq!(matches[0].offset, 4);
        assert_eq!(matches[0].length, 2);
        assert_eq!(matches[0].replacements, vec!["goes", "went"]);
        assert_eq!(matches[0].context, "She go to school.");
        assert!(matches[1].context.is_empty());

        let corrected = checker.correct("She go to school.", &matches[..1]).await.unwrap();
        assert_eq!(corrected, "She goes to school.");
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/check"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let checker = LanguageToolChecker::new(&server.uri(), "").unwrap();
        let err = checker.check("Some text.").await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/check"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let checker = LanguageToolChecker::new(&server.uri(), "en-US").unwrap();
        let err = checker.check("Some text.").await.unwrap_err();
        assert!(err.to_string().contains("invalid response"));
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let checker = LanguageToolChecker::with_timeout("http://127.0.0.1:9", "en-US", 2).unwrap();
        let err = checker.check("Some text.").await.unwrap_err();
        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert!(matches!(
            provider_err,
            ProviderError::NetworkError(_) | ProviderError::Timeout(_)
        ));
    }

    #[test]
    fn utf16_offsets_become_char_offsets() {
        let text = "I 😀 go home";
        // The emoji takes two UTF-16 units.
        assert_eq!(utf16_to_char_offset(text, 5), 4);
        assert_eq!(utf16_to_char_offset("plain", 3), 3);
        assert_eq!(utf16_to_char_offset("abc", 10), 3);
    }
}
