use assist_bridge::config::Config;
use assist_bridge::message::UtteranceResponse;
use assist_bridge::routes::create_router;
use assist_bridge::services::phrases::{Phrase, PhraseBook};
use assist_bridge::state::{AppState, SharedState};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use std::sync::Arc;
use tower::util::ServiceExt;

fn test_config() -> Config {
    Config {
        // Points at a closed local port so relay attempts fail fast and
        // deterministically, without touching the network.
        home_assistant_url: "http://127.0.0.1:9".to_string(),
        admin_api_key: Some("secret123".to_string()),
        ..Config::default()
    }
}

fn test_app(config: Config) -> Router {
    let state: SharedState = Arc::new(AppState::new(config).expect("http client"));
    create_router(state)
}

fn post_json(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

async fn parse_body(response: Response) -> UtteranceResponse {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(test_config());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_empty_utterance_is_rejected() {
    let app = test_app(test_config());
    let response = app
        .oneshot(post_json(
            "/utterance",
            r#"{"utterance": "   ", "user_id": "u1", "access_token": "t"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_close_keyword_ends_the_session_locally() {
    let app = test_app(test_config());
    let response = app
        .oneshot(post_json(
            "/utterance",
            r#"{"utterance": "goodbye", "user_id": "u1", "access_token": "t", "locale": "en-US"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_body(response).await;
    assert!(!body.continue_session);
    assert!(["Goodbye!", "See you later!", "Bye!"].contains(&body.speech.as_str()));
}

#[tokio::test]
async fn test_dashboard_keyword_returns_the_kiosk_url() {
    let config = Config {
        kiosk_mode: true,
        ..test_config()
    };
    let app = test_app(config);
    let response = app
        .oneshot(post_json(
            "/utterance",
            r#"{"utterance": "open the dashboard", "user_id": "u1", "access_token": "t"}"#,
        ))
        .await
        .unwrap();

    let body = parse_body(response).await;
    assert_eq!(body.speech, "Opening your dashboard.");
    assert!(!body.continue_session);
    assert_eq!(
        body.open_url.as_deref(),
        Some("http://127.0.0.1:9/lovelace?kiosk")
    );
}

#[tokio::test]
async fn test_missing_token_speaks_the_generic_apology() {
    let app = test_app(test_config());
    let response = app
        .oneshot(post_json(
            "/utterance",
            r#"{"utterance": "turn on the lights", "user_id": "u1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_body(response).await;
    let phrases = PhraseBook::for_locale("en-US");
    assert_eq!(body.speech, phrases.get(Phrase::GenericError));
    assert!(!body.continue_session);
}

#[tokio::test]
async fn test_unreachable_assistant_speaks_the_generic_apology() {
    let app = test_app(test_config());
    let response = app
        .oneshot(post_json(
            "/utterance",
            r#"{"utterance": "turn on the lights", "user_id": "u1", "access_token": "t"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_body(response).await;
    let phrases = PhraseBook::for_locale("en-US");
    assert_eq!(body.speech, phrases.get(Phrase::GenericError));
}

#[tokio::test]
async fn test_localized_apology_for_german_users() {
    let app = test_app(test_config());
    let response = app
        .oneshot(post_json(
            "/utterance",
            r#"{"utterance": "mach das Licht an", "user_id": "u1", "access_token": "t", "locale": "de-DE"}"#,
        ))
        .await
        .unwrap();

    let body = parse_body(response).await;
    let phrases = PhraseBook::for_locale("de-DE");
    assert_eq!(body.speech, phrases.get(Phrase::GenericError));
}

#[tokio::test]
async fn test_admin_metrics_require_the_api_key() {
    let app = test_app(test_config());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/metrics")
                .header("x-admin-key", "secret123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_relay_failures_show_up_in_metrics() {
    let app = test_app(test_config());

    let response = app
        .clone()
        .oneshot(post_json(
            "/utterance",
            r#"{"utterance": "turn on the lights", "user_id": "u1", "access_token": "t"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/metrics")
                .header("x-admin-key", "secret123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(metrics["relay_failures"]["transport"], 1);
}

#[tokio::test]
async fn test_launch_greets_once_then_shortens() {
    let app = test_app(test_config());
    let phrases = PhraseBook::for_locale("en-US");

    let response = app
        .clone()
        .oneshot(post_json(
            "/launch",
            r#"{"user_id": "morning-user", "access_token": "t"}"#,
        ))
        .await
        .unwrap();
    let body = parse_body(response).await;
    assert_eq!(body.speech, phrases.get(Phrase::Welcome));
    assert!(body.continue_session);

    let response = app
        .oneshot(post_json(
            "/launch",
            r#"{"user_id": "morning-user", "access_token": "t"}"#,
        ))
        .await
        .unwrap();
    let body = parse_body(response).await;
    assert_eq!(body.speech, phrases.get(Phrase::NextGreeting));
}

#[tokio::test]
async fn test_launch_with_suppressed_greeting_stays_quiet() {
    let config = Config {
        suppress_greeting: true,
        ..test_config()
    };
    let app = test_app(config);
    let response = app
        .oneshot(post_json("/launch", r#"{"user_id": "u1", "access_token": "t"}"#))
        .await
        .unwrap();

    let body = parse_body(response).await;
    assert_eq!(body.speech, "");
    assert!(body.continue_session);
}

#[tokio::test]
async fn test_help_keeps_the_session_open() {
    let app = test_app(test_config());
    let response = app
        .oneshot(post_json("/help", r#"{"user_id": "u1", "locale": "pt-BR"}"#))
        .await
        .unwrap();

    let body = parse_body(response).await;
    let phrases = PhraseBook::for_locale("pt-BR");
    assert_eq!(body.speech, phrases.get(Phrase::Help));
    assert!(body.continue_session);
    assert_eq!(body.reprompt.as_deref(), Some(phrases.get(Phrase::Help)));
}
