// src/message.rs
use serde::{Deserialize, Serialize};

/// A spoken (or typed) request forwarded by the voice-platform dispatcher.
#[derive(Debug, Deserialize)]
pub struct UtteranceRequest {
    pub utterance: String,
    /// Stable user identifier from the host platform. A throwaway session is
    /// created when it is absent.
    pub user_id: Option<String>,
    /// Account-linking bearer token for the Home Assistant API.
    pub access_token: Option<String>,
    pub device_id: Option<String>,
    /// BCP-47 tag such as `de-DE`; defaults to `en-US`.
    pub locale: Option<String>,
}

/// Session-opening request without an utterance.
#[derive(Debug, Deserialize)]
pub struct LaunchRequest {
    pub user_id: Option<String>,
    pub access_token: Option<String>,
    pub locale: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UtteranceResponse {
    pub user_id: String,
    pub speech: String,
    pub continue_session: bool,
    /// Follow-up question the platform should re-prompt with while the
    /// session stays open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<String>,
    /// Dashboard URL for the host to open, set by keyword commands only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_url: Option<String>,
}
