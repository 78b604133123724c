// src/config.rs
use std::env;
use std::fmt;
use std::time::Duration;

/// Everything the bridge reads from the environment, collected once at
/// startup. The pipeline itself never touches `env::var`.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the Home Assistant instance, without a trailing slash.
    pub home_assistant_url: String,
    /// Fallback long-lived token, only honored in debug mode when the voice
    /// platform did not supply an account-linking token.
    pub home_assistant_token: Option<String>,
    pub agent_id: Option<String>,
    pub language: Option<String>,
    /// `input_text` entity polled on launch for a pre-seeded prompt.
    pub assist_input_entity: String,
    pub room_recognition: bool,
    pub kiosk_mode: bool,
    pub ask_for_further_commands: bool,
    pub suppress_greeting: bool,
    pub dashboard: String,
    pub relay_timeout: Duration,
    pub session_ttl: Duration,
    pub admin_api_key: Option<String>,
    pub bind_addr: String,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_assistant_url: String::new(),
            home_assistant_token: None,
            agent_id: None,
            language: None,
            assist_input_entity: "input_text.assistant_input".to_string(),
            room_recognition: false,
            kiosk_mode: false,
            ask_for_further_commands: false,
            suppress_greeting: false,
            dashboard: "lovelace".to_string(),
            relay_timeout: Duration::from_secs(10),
            session_ttl: Duration::from_secs(1800),
            admin_api_key: None,
            bind_addr: "0.0.0.0:3000".to_string(),
            debug: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            home_assistant_url: env::var("HOME_ASSISTANT_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.home_assistant_url),
            home_assistant_token: env_opt("HOME_ASSISTANT_TOKEN"),
            agent_id: env_opt("HOME_ASSISTANT_AGENT_ID"),
            language: env_opt("HOME_ASSISTANT_LANGUAGE"),
            assist_input_entity: env_opt("ASSIST_INPUT_ENTITY")
                .unwrap_or(defaults.assist_input_entity),
            room_recognition: env_flag("HOME_ASSISTANT_ROOM_RECOGNITION"),
            kiosk_mode: env_flag("HOME_ASSISTANT_KIOSKMODE"),
            ask_for_further_commands: env_flag("ASK_FOR_FURTHER_COMMANDS"),
            suppress_greeting: env_flag("SUPPRESS_GREETING"),
            dashboard: env_opt("HOME_ASSISTANT_DASHBOARD").unwrap_or(defaults.dashboard),
            relay_timeout: env_secs("RELAY_TIMEOUT_SECS").unwrap_or(defaults.relay_timeout),
            session_ttl: env_secs("SESSION_TTL_SECS").unwrap_or(defaults.session_ttl),
            admin_api_key: env_opt("ADMIN_API_KEY"),
            bind_addr: env_opt("BIND_ADDR").unwrap_or(defaults.bind_addr),
            debug: env_flag("DEBUG"),
        }
    }

    /// Dashboard URL handed back to the host platform when a dashboard
    /// keyword matches. Kiosk mode strips the Home Assistant chrome.
    pub fn dashboard_url(&self) -> String {
        let mut url = format!("{}/{}", self.home_assistant_url, self.dashboard);
        if self.kiosk_mode {
            url.push_str("?kiosk");
        }
        url
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("home_assistant_url", &self.home_assistant_url)
            .field(
                "home_assistant_token",
                &self.home_assistant_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("agent_id", &self.agent_id)
            .field("language", &self.language)
            .field("assist_input_entity", &self.assist_input_entity)
            .field("room_recognition", &self.room_recognition)
            .field("kiosk_mode", &self.kiosk_mode)
            .field("ask_for_further_commands", &self.ask_for_further_commands)
            .field("suppress_greeting", &self.suppress_greeting)
            .field("dashboard", &self.dashboard)
            .field("relay_timeout", &self.relay_timeout)
            .field("session_ttl", &self.session_ttl)
            .field(
                "admin_api_key",
                &self.admin_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("bind_addr", &self.bind_addr)
            .field("debug", &self.debug)
            .finish()
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
        .unwrap_or(false)
}

fn env_secs(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_secs)
}
