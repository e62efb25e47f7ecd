//! Scheduling oracle client.
//!
//! The oracle is an external model that proposes a (lesson, week, day, slot)
//! assignment for a request. Its output is untrusted: this module only
//! fetches raw text and isolates the JSON in it. Parsing and validation
//! live in [`studyplan_core::assignment`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use studyplan_core::assignment::AssignmentRequest;

use crate::config::OracleConfig;

/// Errors from the oracle transport layer.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The oracle returned a non-2xx status code.
    #[error("Oracle API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The request could not be rendered into a prompt.
    #[error("Failed to encode assignment request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Proposes a schedule for an assignment request.
///
/// Implementations return the oracle's raw text; callers extract and
/// validate the JSON.
#[async_trait]
pub trait SchedulingOracle: Send + Sync {
    async fn propose(&self, request: &AssignmentRequest) -> Result<String, OracleError>;
}

// ---------------------------------------------------------------------------
// HTTP oracle (Ollama-compatible `/api/generate`)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    format: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Oracle backed by an Ollama-compatible text generation endpoint.
pub struct HttpSchedulingOracle {
    client: reqwest::Client,
    api_url: String,
    model: String,
}

impl HttpSchedulingOracle {
    pub fn new(config: &OracleConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create an oracle reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &OracleConfig) -> Self {
        Self {
            client,
            api_url: config.url.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl SchedulingOracle for HttpSchedulingOracle {
    async fn propose(&self, request: &AssignmentRequest) -> Result<String, OracleError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(request)?,
            stream: false,
            format: "json",
        };

        tracing::debug!(
            model = %self.model,
            lessons = request.lessons.len(),
            "Requesting schedule from oracle"
        );

        let response = self
            .client
            .post(format!("{}/api/generate", self.api_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OracleError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let generated: GenerateResponse = response.json().await?;
        Ok(generated.response)
    }
}

// ---------------------------------------------------------------------------
// Prompt and response helpers
// ---------------------------------------------------------------------------

/// Render the instruction prompt for `request`.
pub fn build_prompt(request: &AssignmentRequest) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_string_pretty(request)?;
    Ok(format!(
        "You are a study planner. Assign every lesson below to a study session.\n\
         \n\
         Rules:\n\
         - Use only the preferred days and time slots listed in the request.\n\
         - Week numbers run from 1 to {target_weeks}.\n\
         - Plan about {sessions} sessions of {minutes} minutes per week.\n\
         - Keep lessons in their listed order where possible.\n\
         - Refer to lessons by their \"index\" field.\n\
         \n\
         Request:\n\
         {payload}\n\
         \n\
         Respond with JSON only, in this shape:\n\
         {{\"schedule\": [{{\"lessonIndex\": 0, \"weekNumber\": 1, \"day\": \"monday\", \
         \"timeSlot\": \"morning\", \"estimatedDuration\": {minutes}, \
         \"learningObjectives\": [\"...\"], \"difficulty\": 3}}]}}",
        target_weeks = request.target_weeks,
        sessions = request.sessions_per_week,
        minutes = request.session_minutes,
    ))
}

/// Isolate the JSON document in raw model output.
///
/// Strips markdown code fences and any prose around the outermost object
/// or array, then drops trailing commas before closing brackets. Text
/// without a JSON opener is returned trimmed so the parser reports it.
pub fn extract_json(raw: &str) -> String {
    let cleaned = raw.replace("```json", "").replace("```", "");

    let Some(start) = cleaned.find(['{', '[']) else {
        return cleaned.trim().to_string();
    };
    let closer = if cleaned[start..].starts_with('{') { '}' } else { ']' };
    let end = cleaned
        .rfind(closer)
        .filter(|end| *end > start)
        .map(|end| end + 1)
        .unwrap_or(cleaned.len());

    remove_trailing_commas(&cleaned[start..end])
}

fn remove_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(ch);
                }
            }
            _ => out.push(ch),
        }
    }
    out
}
