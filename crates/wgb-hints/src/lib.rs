//! Language-model definition adapter.
//!
//! Implements the core `DefinitionProvider` port over the OpenAI chat
//! completions endpoint. The request asks for a single-sentence dictionary
//! definition; everything about retries and fallback text lives in the core,
//! so this client only does one HTTP round trip per call.

use std::time::Duration;

use async_trait::async_trait;
use wgb_core::{errors::Error, hints::DefinitionProvider, Result};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Debug)]
pub struct HintClient {
    api_key: String,
    http: reqwest::Client,
}

impl HintClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            http,
        })
    }
}

#[async_trait]
impl DefinitionProvider for HintClient {
    async fn define(&self, word: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": MODEL,
            "max_tokens": 80,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a concise dictionary. Reply with a single-sentence \
                                definition of the given word, no preamble."
                },
                { "role": "user", "content": word }
            ]
        });

        let resp = self
            .http
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::External(format!("definition request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "definition request failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("definition json error: {e}")))?;

        let text = v
            .pointer("/choices/0/message/content")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(Error::External(
                "definition response was empty".to_string(),
            ));
        }

        Ok(text)
    }
}
