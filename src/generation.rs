use std::sync::OnceLock;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::ClioError;
use crate::prompt::GenerationRequest;
use crate::validate::excerpt;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Sends one built request to the generative service and returns its raw text.
pub trait GenerationClient: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ClioError>;
}

impl<T: GenerationClient + ?Sized> GenerationClient for &T {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ClioError> {
        (**self).generate(request)
    }
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            api_key: None,
        }
    }
}

struct GeminiHandle {
    client: Client,
    endpoint: String,
}

/// Gemini `generateContent` client. Construction never fails; the credential is
/// checked and the HTTP client built on the first call.
pub struct GeminiHttpClient {
    settings: GenerationSettings,
    handle: OnceLock<GeminiHandle>,
}

impl GeminiHttpClient {
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            settings,
            handle: OnceLock::new(),
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.get().is_some()
    }

    fn handle(&self) -> Result<&GeminiHandle, ClioError> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }
        let handle = self.build_handle()?;
        Ok(self.handle.get_or_init(|| handle))
    }

    fn build_handle(&self) -> Result<GeminiHandle, ClioError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ClioError::Configuration("missing API credential".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("clio-archive/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ClioError::Configuration(err.to_string()))?,
        );
        let mut key_value = HeaderValue::from_str(api_key).map_err(|_| {
            ClioError::Configuration("API credential is not a valid header value".to_string())
        })?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(self.settings.timeout)
            .build()
            .map_err(|err| ClioError::Configuration(err.to_string()))?;

        Ok(GeminiHandle {
            client,
            endpoint: endpoint_url(&self.settings.base_url, &self.settings.model),
        })
    }
}

impl GenerationClient for GeminiHttpClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ClioError> {
        let handle = self.handle()?;
        let body = request_body(request);

        debug!(
            task = %request.task,
            model = self.settings.model.as_str(),
            web_search = request.use_web_search,
            "sending generation request"
        );
        let start = std::time::Instant::now();
        let response = handle
            .client
            .post(&handle.endpoint)
            .json(&body)
            .send()
            .map_err(|err| ClioError::UpstreamHttp(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|err| ClioError::UpstreamHttp(err.to_string()))?;
        debug!(
            task = %request.task,
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "generation response received"
        );

        if !status.is_success() {
            return Err(ClioError::UpstreamStatus {
                status: status.as_u16(),
                message: excerpt(&text),
            });
        }

        let envelope: Value = serde_json::from_str(&text)
            .map_err(|err| ClioError::UpstreamResponse(format!("invalid envelope: {err}")))?;
        extract_text(&envelope)
    }
}

pub fn endpoint_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model
    )
}

pub fn request_body(request: &GenerationRequest) -> Value {
    let mut body = json!({
        "systemInstruction": {
            "parts": [{ "text": request.instruction }]
        },
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.content }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.schema
        }
    });
    if request.use_web_search {
        body["tools"] = json!([{ "googleSearch": {} }]);
    }
    body
}

/// Concatenates the text parts of the first candidate. A candidate without text parts
/// yields an empty string so the validator reports it against the task.
pub fn extract_text(envelope: &Value) -> Result<String, ClioError> {
    let candidate = envelope
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first());

    let Some(candidate) = candidate else {
        let reason = envelope
            .get("promptFeedback")
            .and_then(|feedback| feedback.get("blockReason"))
            .and_then(Value::as_str)
            .map(|reason| format!("prompt blocked: {reason}"))
            .unwrap_or_else(|| "no candidates in response".to_string());
        return Err(ClioError::UpstreamResponse(reason));
    };

    let text = candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.is_empty()
        && let Some(reason) = candidate.get("finishReason").and_then(Value::as_str)
    {
        debug!(finish_reason = reason, "candidate carried no text");
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trims_trailing_slash() {
        assert_eq!(
            endpoint_url("https://example.test/v1beta/", "gemini-x"),
            "https://example.test/v1beta/models/gemini-x:generateContent"
        );
    }

    #[test]
    fn blocked_prompt_is_upstream_error() {
        let envelope = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = extract_text(&envelope).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
