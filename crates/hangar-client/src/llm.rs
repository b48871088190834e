use std::time::Duration;

use hangar_core::error::AppError;
use hangar_core::models::ClassifierVerdict;
use hangar_core::traits::TextClassifier;
use hangar_core::util::truncate_chars;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_INPUT_CHARS: usize = 4000;

const SYSTEM_PROMPT: &str = "You classify aviation job postings for a pilot job board. \
Decide whether the posting is a real, open position for a flight-deck pilot (captain, first \
officer, second officer, cadet or flight instructor). Cabin crew, engineers, dispatchers, \
ground staff, drone operators, managers and generic career pages are NOT valid. \
Respond ONLY with a JSON object with these keys: is_valid_job (bool), job_title (string), \
position_type (captain|first_officer|second_officer|cadet|instructor|other), location (string), \
min_total_hours (integer or null, the MINIMUM required, never a preferred value), \
min_pic_hours (integer or null), aircraft (array of type strings), type_rating_required (bool), \
type_rating_provided (bool), visa_sponsored (bool), contract_type \
(permanent|contract|seasonal|freelance), is_entry_level (bool). Use null when unknown.";

/// OpenAI-compatible chat-completions classifier.
///
/// Works with OpenAI itself and compatible gateways (Gemini's OpenAI layer,
/// local inference servers) by changing the base URL.
#[derive(Clone)]
pub struct OpenAiClassifier {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl OpenAiClassifier {
    pub fn new(api_key: &str, model: &str) -> Result<Self, AppError> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> Result<Self, AppError> {
        Self::build(api_key, model, base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        Self::build(&self.api_key, &self.model, &self.base_url, timeout)
    }

    fn build(
        api_key: &str,
        model: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    fn request(&self, text: &str, url: &str, context_label: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            temperature: 0.0,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: format!(
                        "Company: {context_label}\nURL: {url}\n\nPosting:\n{}",
                        truncate_chars(text, MAX_INPUT_CHARS)
                    ),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        }
    }
}

// ---- OpenAI API types ----

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<Message>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Strip a surrounding Markdown code fence (```json ... ```), if any.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_verdict(content: &str) -> Result<ClassifierVerdict, AppError> {
    serde_json::from_str(strip_fences(content)).map_err(|e| AppError::ClassifierError {
        message: format!("Classifier returned invalid JSON: {e}"),
        status_code: 200,
        retryable: false,
    })
}

impl TextClassifier for OpenAiClassifier {
    async fn classify(
        &self,
        text: &str,
        url: &str,
        context_label: &str,
    ) -> Result<ClassifierVerdict, AppError> {
        let endpoint = format!("{}/chat/completions", self.base_url);
        let request = self.request(text, url, context_label);

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {e}"))
                } else {
                    AppError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AppError::RateLimitExceeded);
        }
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status_code}: {body}"));
            return Err(AppError::ClassifierError {
                message,
                status_code,
                retryable: status_code >= 500,
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            AppError::HttpError(format!("Failed to parse classifier response: {e}"))
        })?;
        let content = chat
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| AppError::ClassifierError {
                message: "Empty response from classifier".into(),
                status_code: 200,
                retryable: false,
            })?;

        parse_verdict(content)
    }
}
