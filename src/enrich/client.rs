//! Generative text service client
//!
//! Wire-level client for a Gemini-shaped generateContent API. Errors are
//! classified into the two categories the rotation logic cares about:
//! rate/quota/overload (worth a backoff and retry on the same key/model
//! pair) and everything else (advance immediately).

use crate::config::GenerativeConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Error classes from a single generative call
#[derive(Debug)]
pub enum GenError {
    /// 429/503 or a quota/rate/overload-flavored message; retry with backoff
    RateLimited(String),

    /// Any other failure; advance to the next model/key without retrying
    Other(String),
}

impl std::fmt::Display for GenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenError::RateLimited(msg) => write!(f, "rate limited: {}", msg),
            GenError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Blanket permissive safety settings; political news trips the default
/// civic-content filters otherwise
const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
];

/// Low-level client for the generative service
pub struct GenerativeClient {
    http: Client,
    base_url: String,
    system_instruction: String,
    temperature: f32,
    max_output_tokens: u32,
    max_input_chars: usize,
}

impl GenerativeClient {
    pub fn new(http: Client, config: &GenerativeConfig) -> Self {
        Self {
            http,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            system_instruction: config.system_instruction.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            max_input_chars: config.max_input_chars,
        }
    }

    /// Issues one generateContent call with a specific credential and model
    ///
    /// The prompt is truncated to the configured character budget before
    /// sending. Returns the concatenated text of the first candidate, which
    /// may be empty; emptiness is the caller's concern.
    pub async fn generate(
        &self,
        key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, GenError> {
        let truncated = truncate_chars(prompt, self.max_input_chars);

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: truncated.to_string(),
                }],
                role: Some("user".to_string()),
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: self.system_instruction.clone(),
                }],
                role: None,
            },
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: category.to_string(),
                    threshold: "BLOCK_ONLY_HIGH".to_string(),
                })
                .collect(),
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, key
        );

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenError::Other(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(body);

            return if is_quota_class(status.as_u16(), &message) {
                Err(GenError::RateLimited(format!("HTTP {}: {}", status, message)))
            } else {
                Err(GenError::Other(format!("HTTP {}: {}", status, message)))
            };
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenError::Other(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text.trim().to_string())
    }
}

/// Classifies the rate/quota/overload error family
///
/// Providers are inconsistent: sometimes the status carries the signal
/// (429/503), sometimes only the message text does.
pub fn is_quota_class(status: u16, message: &str) -> bool {
    if status == 429 || status == 503 {
        return true;
    }
    let lowered = message.to_lowercase();
    lowered.contains("quota")
        || lowered.contains("rate limit")
        || lowered.contains("rate-limit")
        || lowered.contains("overload")
        || lowered.contains("resource exhausted")
        || lowered.contains("resource_exhausted")
}

/// Truncates on a char boundary without allocating when already short enough
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
