use axum::{Json, extract::State};
use tracing::{debug, error, info};

use crate::{
    error::{AppError, RelayError},
    message::{LaunchRequest, UtteranceRequest, UtteranceResponse},
    services::{
        keywords::{self, KeywordAction},
        metrics_manager::MetricsData,
        normalize,
        phrases::{Phrase, PhraseBook},
    },
    state::SharedState,
};

pub async fn utterance_handler(
    State(state): State<SharedState>,
    Json(payload): Json<UtteranceRequest>,
) -> Result<Json<UtteranceResponse>, AppError> {
    let phrases = PhraseBook::for_locale(payload.locale.as_deref().unwrap_or("en-US"));

    let trimmed = payload.utterance.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Utterance cannot be empty".to_string()));
    }

    let user_id = resolve_session(&state, payload.user_id.as_deref()).await;
    info!(user_id = %user_id, "utterance received: {trimmed}");

    // Keyword commands answer locally, without a relay round trip.
    if let Some(action) = keywords::match_keyword(trimmed, &phrases) {
        let response = match action {
            KeywordAction::OpenDashboard => UtteranceResponse {
                user_id,
                speech: phrases.get(Phrase::OpenDashboard).to_string(),
                continue_session: false,
                reprompt: None,
                open_url: Some(state.config.dashboard_url()),
            },
            KeywordAction::CloseSession => UtteranceResponse {
                user_id,
                speech: phrases.exit_phrase().to_string(),
                continue_session: false,
                reprompt: None,
                open_url: None,
            },
        };
        return Ok(Json(response));
    }

    let Some(token) = resolve_token(&state, payload.access_token.as_deref()) else {
        error!("no account-linking token supplied and no fallback configured");
        state.metrics.increment_failure("configuration").await;
        return Ok(Json(UtteranceResponse {
            user_id,
            speech: phrases.get(Phrase::GenericError).to_string(),
            continue_session: false,
            reprompt: None,
            open_url: None,
        }));
    };

    let mut text = normalize::correct(trimmed);
    if state.config.room_recognition {
        if let Some(device_id) = payload.device_id.as_deref() {
            text.push_str(&format!(". device_id: {device_id}"));
        }
    }

    let speech = run_conversation(&state, &user_id, &text, &token, &phrases).await;
    let continue_session = state.config.ask_for_further_commands;
    let reprompt =
        continue_session.then(|| phrases.get(Phrase::FollowUpQuestion).to_string());

    Ok(Json(UtteranceResponse {
        user_id,
        speech,
        continue_session,
        reprompt,
        open_url: None,
    }))
}

pub async fn launch_handler(
    State(state): State<SharedState>,
    Json(payload): Json<LaunchRequest>,
) -> Json<UtteranceResponse> {
    let phrases = PhraseBook::for_locale(payload.locale.as_deref().unwrap_or("en-US"));
    let user_id = resolve_session(&state, payload.user_id.as_deref()).await;

    let Some(token) = resolve_token(&state, payload.access_token.as_deref()) else {
        error!("no account-linking token supplied and no fallback configured");
        state.metrics.increment_failure("configuration").await;
        return Json(UtteranceResponse {
            user_id,
            speech: phrases.get(Phrase::GenericError).to_string(),
            continue_session: false,
            reprompt: None,
            open_url: None,
        });
    };

    // A prompt pre-seeded in the input_text entity replaces the greeting.
    if let Some(prompt) = state.relay.fetch_preset_prompt(&token).await {
        info!("processing pre-seeded prompt: {prompt}");
        let text = normalize::correct(&prompt);
        let speech = run_conversation(&state, &user_id, &text, &token, &phrases).await;
        return Json(UtteranceResponse {
            user_id,
            speech,
            continue_session: true,
            reprompt: Some(phrases.get(Phrase::FollowUpQuestion).to_string()),
            open_url: None,
        });
    }

    if state.config.suppress_greeting {
        return Json(UtteranceResponse {
            user_id,
            speech: String::new(),
            continue_session: true,
            reprompt: None,
            open_url: None,
        });
    }

    // The full welcome only on the first interaction of the day.
    let phrase = if state.sessions.first_interaction_today(&user_id).await {
        Phrase::Welcome
    } else {
        Phrase::NextGreeting
    };
    let speech = phrases.get(phrase).to_string();
    Json(UtteranceResponse {
        user_id,
        speech: speech.clone(),
        continue_session: true,
        reprompt: Some(speech),
        open_url: None,
    })
}

pub async fn help_handler(
    State(state): State<SharedState>,
    Json(payload): Json<LaunchRequest>,
) -> Json<UtteranceResponse> {
    let phrases = PhraseBook::for_locale(payload.locale.as_deref().unwrap_or("en-US"));
    let user_id = resolve_session(&state, payload.user_id.as_deref()).await;
    let speech = phrases.get(Phrase::Help).to_string();
    Json(UtteranceResponse {
        user_id,
        speech: speech.clone(),
        continue_session: true,
        reprompt: Some(speech),
        open_url: None,
    })
}

pub async fn get_metrics_handler(State(state): State<SharedState>) -> Json<MetricsData> {
    Json(state.metrics.get_metrics().await)
}

/// One relay turn: replay the stored conversation id, submit, store the id
/// that came back, then normalize whatever the assistant said.
async fn run_conversation(
    state: &SharedState,
    user_id: &str,
    text: &str,
    token: &str,
    phrases: &PhraseBook,
) -> String {
    let conversation_id = state.sessions.conversation_id(user_id).await;
    match state
        .relay
        .process(text, token, conversation_id.as_deref())
        .await
    {
        Ok(envelope) => {
            state
                .sessions
                .record_conversation_id(user_id, envelope.conversation_id.clone())
                .await;
            if let Some(response) = &envelope.response {
                state
                    .metrics
                    .increment_response_type(response.response_type.as_str())
                    .await;
            }
            let classified = normalize::classify(&envelope, phrases);
            if classified.is_markup {
                debug!("returning SSML speech untouched");
                classified.text
            } else {
                normalize::sanitize(&classified.text, phrases.region())
            }
        }
        Err(err) => {
            error!("conversation relay failed: {err}");
            state.metrics.increment_failure(err.kind()).await;
            match &err {
                // The assistant's own message rides along with the apology.
                RelayError::Upstream {
                    message: Some(message),
                    ..
                } => {
                    let text = format!("{} {}", phrases.get(Phrase::GenericError), message);
                    normalize::sanitize(&text, phrases.region())
                }
                _ => speech_for_failure(&err, phrases).to_string(),
            }
        }
    }
}

/// Timeouts get their own apology; every other failure shares the generic
/// one. An upstream message, when present, is appended by the caller.
pub fn speech_for_failure(err: &RelayError, phrases: &PhraseBook) -> &'static str {
    match err {
        RelayError::Timeout => phrases.get(Phrase::TimeoutApology),
        _ => phrases.get(Phrase::GenericError),
    }
}

async fn resolve_session(state: &SharedState, user_id: Option<&str>) -> String {
    match user_id {
        Some(id) if !id.trim().is_empty() => state.sessions.ensure_session(id).await,
        _ => state.sessions.create_session().await,
    }
}

fn resolve_token(state: &SharedState, access_token: Option<&str>) -> Option<String> {
    match access_token.filter(|t| !t.trim().is_empty()) {
        Some(token) => Some(token.to_string()),
        // Fallback to a long-lived token only while debugging.
        None if state.config.debug => state.config.home_assistant_token.clone(),
        None => None,
    }
}
