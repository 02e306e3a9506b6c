use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Narrow boundary in front of the generation backend: one prompt in, raw
/// text out. Transport and non-2xx failures come back as errors; everything
/// downstream (fence stripping, JSON parsing, shape validation) belongs to
/// the intent parser so the fallback trigger stays a single seam.
#[async_trait]
pub trait IntentGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, config: &AppConfig, api_key: String) -> Self {
        Self {
            http,
            base_url: config.gemini_api_url.clone(),
            model: config.gemini_model.clone(),
            api_key,
        }
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[async_trait]
impl IntentGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self.http.post(&url).json(&request_body).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("Gemini API error: {}", response.status());
        }

        let generate_response: GenerateContentResponse = response.json().await?;

        let text = generate_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| anyhow::anyhow!("Gemini response contained no candidates"))?;

        Ok(text)
    }
}
