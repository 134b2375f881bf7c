//! Google Cloud Natural Language sentiment provider.
//!
//! Calls `POST {base}/v1/documents:analyzeSentiment?key=<key>` and reads the
//! document-level sentiment from the response.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SentimentError};
use crate::provider::{SentimentProvider, SentimentScore};

/// Default Natural Language API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://language.googleapis.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeSentimentRequest<'a> {
    document: Document<'a>,
    encoding_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Document<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeSentimentResponse {
    document_sentiment: Option<DocumentSentiment>,
}

#[derive(Debug, Deserialize)]
struct DocumentSentiment {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    magnitude: f32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Sentiment provider backed by the Natural Language API.
#[derive(Debug, Clone)]
pub struct GoogleLanguageProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleLanguageProvider {
    /// Create a provider against the public endpoint.
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL, api_key)
    }

    /// Create a provider against a custom endpoint (e.g. a local mock).
    pub fn with_base_url(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/documents:analyzeSentiment", self.base_url)
    }
}

fn build_request(text: &str) -> AnalyzeSentimentRequest<'_> {
    AnalyzeSentimentRequest {
        document: Document {
            kind: "PLAIN_TEXT",
            content: text,
        },
        encoding_type: "UTF8",
    }
}

fn parse_response(body: &str) -> Result<SentimentScore> {
    let response: AnalyzeSentimentResponse = serde_json::from_str(body)
        .map_err(|e| SentimentError::invalid_response(format!("malformed body: {e}")))?;

    let sentiment = response
        .document_sentiment
        .ok_or_else(|| SentimentError::invalid_response("missing documentSentiment"))?;

    Ok(SentimentScore::new(sentiment.score, sentiment.magnitude))
}

fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl SentimentProvider for GoogleLanguageProvider {
    fn name(&self) -> &str {
        "google-language"
    }

    async fn analyze(&self, text: &str) -> Result<SentimentScore> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&build_request(text))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = parse_error_message(&body);
            warn!(status = %status, "analyzeSentiment failed: {}", message);
            return Err(SentimentError::service(status.as_u16(), message));
        }

        let score = parse_response(&body)?;
        debug!(
            score = score.score,
            magnitude = score.magnitude,
            "analyzeSentiment succeeded"
        );
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(build_request("hello")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "document": { "type": "PLAIN_TEXT", "content": "hello" },
                "encodingType": "UTF8"
            })
        );
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "documentSentiment": { "magnitude": 0.8, "score": -0.4 },
            "language": "ja",
            "sentences": []
        }"#;
        let score = parse_response(body).unwrap();
        assert_eq!(score, SentimentScore::new(-0.4, 0.8));
    }

    #[test]
    fn test_parse_response_defaults_missing_fields() {
        // The API omits zero-valued fields.
        let score = parse_response(r#"{"documentSentiment": {}}"#).unwrap();
        assert_eq!(score, SentimentScore::NEUTRAL);
    }

    #[test]
    fn test_parse_response_missing_sentiment() {
        let err = parse_response(r#"{"language": "en"}"#).unwrap_err();
        assert!(matches!(err, SentimentError::InvalidResponse(_)));

        let err = parse_response("not json").unwrap_err();
        assert!(matches!(err, SentimentError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_error_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(parse_error_message(body), "API key not valid");
        assert_eq!(parse_error_message("bad gateway"), "bad gateway");
    }

    fn test_client() -> Client {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        Client::new()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider =
            GoogleLanguageProvider::with_base_url(test_client(), "http://localhost:9000/", "k");
        assert_eq!(
            provider.endpoint(),
            "http://localhost:9000/v1/documents:analyzeSentiment"
        );
        assert_eq!(provider.name(), "google-language");
    }
}
