//! HTTP relay to the Home Assistant conversation API.
//!
//! One request per turn, one explicit timeout, no retries. Interpreting what
//! came back is kept in a pure function over the typed status code, the
//! declared content type and the body, so the branching is testable without
//! a network.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::Config;
use crate::error::RelayError;

const STATE_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

static HTML_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title>(.*?)</title>").expect("valid title pattern"));

#[derive(Debug, Serialize)]
struct ConversationRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<&'a str>,
}

/// Top-level body of a conversation response. Every field is optional; the
/// classifier decides what an absent `response` means.
#[derive(Debug, Default, Deserialize)]
pub struct ConversationEnvelope {
    pub conversation_id: Option<String>,
    pub response: Option<AssistResponse>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssistResponse {
    pub response_type: ResponseType,
    #[serde(default)]
    pub speech: Speech,
    pub data: Option<ResponseData>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    ActionDone,
    QueryAnswer,
    Error,
    #[serde(other)]
    Other,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::ActionDone => "action_done",
            ResponseType::QueryAnswer => "query_answer",
            ResponseType::Error => "error",
            ResponseType::Other => "other",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Speech {
    pub plain: Option<SpeechText>,
    pub ssml: Option<SpeechText>,
}

#[derive(Debug, Deserialize)]
pub struct SpeechText {
    pub speech: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseData {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntityState {
    state: Option<String>,
}

pub struct ConversationRelay {
    http: reqwest::Client,
    base_url: String,
    language: Option<String>,
    agent_id: Option<String>,
    assist_input_entity: String,
}

impl ConversationRelay {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.relay_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.home_assistant_url.clone(),
            language: config.language.clone(),
            agent_id: config.agent_id.clone(),
            assist_input_entity: config.assist_input_entity.clone(),
        })
    }

    /// Submits one utterance to `/api/conversation/process`. The
    /// conversation id is replayed opaquely, never inspected.
    pub async fn process(
        &self,
        text: &str,
        token: &str,
        conversation_id: Option<&str>,
    ) -> Result<ConversationEnvelope, RelayError> {
        if self.base_url.is_empty() {
            return Err(RelayError::Configuration("HOME_ASSISTANT_URL is not set"));
        }

        let url = format!("{}/api/conversation/process", self.base_url);
        let body = ConversationRequest {
            text,
            language: self.language.as_deref(),
            agent_id: self.agent_id.as_deref(),
            conversation_id,
        };
        debug!(url = %url, ?body, "relaying utterance");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await.map_err(map_transport_error)?;
        debug!(%status, %content_type, body = %body, "assistant answered");

        interpret_response(status, &content_type, &body)
    }

    /// Reads the configured `input_text` entity. A prompt pre-seeded there
    /// replaces the launch greeting; any failure just means no prompt.
    pub async fn fetch_preset_prompt(&self, token: &str) -> Option<String> {
        if self.base_url.is_empty() {
            return None;
        }

        let url = format!("{}/api/states/{}", self.base_url, self.assist_input_entity);
        let response = match self
            .http
            .get(&url)
            .bearer_auth(token)
            .timeout(STATE_FETCH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!("failed to read the assist input entity: {err}");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            error!(status = %response.status(), "assist input entity fetch failed");
            return None;
        }

        let entity: EntityState = match response.json().await {
            Ok(entity) => entity,
            Err(err) => {
                error!("malformed assist input entity state: {err}");
                return None;
            }
        };

        let state = entity.state.unwrap_or_default();
        let state = state.trim();
        if state.is_empty()
            || matches!(
                state.to_ascii_lowercase().as_str(),
                "none" | "unknown" | "unavailable"
            )
        {
            return None;
        }
        Some(state.to_string())
    }
}

fn map_transport_error(err: reqwest::Error) -> RelayError {
    if err.is_timeout() {
        RelayError::Timeout
    } else {
        RelayError::Transport(err.to_string())
    }
}

/// Maps a raw HTTP exchange to an envelope or a relay error. The status code
/// stays a typed integer throughout.
pub fn interpret_response(
    status: StatusCode,
    content_type: &str,
    body: &str,
) -> Result<ConversationEnvelope, RelayError> {
    if content_type.starts_with("application/json") {
        let envelope: ConversationEnvelope = serde_json::from_str(body)
            .map_err(|err| RelayError::Transport(format!("malformed assistant response: {err}")))?;
        if status.is_success() {
            return Ok(envelope);
        }
        error!(
            %status,
            message = envelope.message.as_deref().unwrap_or(""),
            "assistant rejected the conversation request"
        );
        // Only a body with a human-readable message counts as an upstream
        // verdict; anything else is indistinguishable from a broken proxy.
        return match envelope.message {
            Some(message) => Err(RelayError::Upstream {
                status: status.as_u16(),
                message: Some(message),
            }),
            None => Err(RelayError::Transport(format!(
                "error response with status {status} and no message"
            ))),
        };
    }

    if content_type.starts_with("text/html") && (status.is_client_error() || status.is_server_error())
    {
        match HTML_TITLE.captures(body).and_then(|caps| caps.get(1)) {
            Some(title) => error!(
                %status,
                title = title.as_str(),
                "unable to connect to the Home Assistant server"
            ),
            None => error!(%status, "unable to connect to the Home Assistant server"),
        }
        return Err(RelayError::Transport(format!(
            "error page with status {status}"
        )));
    }

    error!(%status, %content_type, body = %body, "unexpected assistant response");
    Err(RelayError::Transport(format!(
        "unexpected content type {content_type:?} with status {status}"
    )))
}
