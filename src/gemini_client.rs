use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, eyre};
use serde_json::{json, Value};
use tracing::{debug, error};
use url::Url;

use crate::guide::error::GenerationError;
use crate::guide::ports::TextGenerator;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiClient {
    endpoint: Url,
    client: reqwest::Client,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse_with_params(
            &format!("{}/{}:generateContent", API_BASE, model),
            &[("key", api_key)],
        )
        .map_err(|e| eyre!("Invalid Gemini endpoint for model {}: {}", model, e))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            endpoint,
            client,
            timeout,
        })
    }

    pub async fn generate_content(&self, prompt: &str) -> Result<String, GenerationError> {
        let request_body = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [
                        {
                            "text": prompt
                        }
                    ]
                }
            ],
            "generationConfig": {
                "temperature": 0.4,
                "topP": 0.8,
                "topK": 40,
                "maxOutputTokens": 512
            }
        });

        debug!("Sending request to Gemini API: {}", request_body);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.timeout)
                } else {
                    GenerationError::Unavailable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("API request failed with status {}: {}", status, error_text);
            return Err(GenerationError::Unavailable(format!("status {}", status)));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Unavailable(format!("malformed response: {}", e)))?;

        debug!("Received response from Gemini API: {}", response_json);

        extract_text(&response_json).ok_or(GenerationError::EmptyResponse)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.generate_content(prompt).await
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_candidate_text() {
        let response = json!({
            "candidates": [
                {
                    "content": {
                        "parts": [
                            { "text": "Is the person " },
                            { "text": "breathing normally?" }
                        ]
                    },
                    "finishReason": "STOP"
                }
            ]
        });
        assert_eq!(extract_text(&response).as_deref(), Some("Is the person breathing normally?"));
    }

    #[test]
    fn blocked_or_empty_responses_have_no_text() {
        assert!(extract_text(&json!({ "promptFeedback": { "blockReason": "SAFETY" } })).is_none());
        assert!(extract_text(&json!({
            "candidates": [ { "content": { "parts": [ { "text": "  " } ] } } ]
        }))
        .is_none());
    }

    #[test]
    fn endpoint_carries_model_and_key() {
        let client =
            GeminiClient::new("secret", "gemini-2.0-flash", Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint.path(), "/v1beta/models/gemini-2.0-flash:generateContent");
        assert_eq!(client.endpoint.query(), Some("key=secret"));
    }
}
