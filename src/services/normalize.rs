//! Turns assistant responses into speech-ready text.
//!
//! SSML responses pass through untouched; plain text gets line-break and
//! punctuation cleanup, a locale-aware decimal separator, and a final
//! allow-list strip so the synthesizer never sees unsupported symbols.

use std::sync::LazyLock;

use regex::Regex;
use tracing::error;

use crate::services::phrases::{Phrase, PhraseBook};
use crate::services::relay::{ConversationEnvelope, ResponseType, Speech};

/// Marker some agents append when a device id rides along with the query;
/// everything from here on is diagnostic, not speech.
const DEVICE_ID_MARKER: &str = "device_id:";

/// Known speech-to-text misrecognitions, replaced in order before relaying.
const CORRECTIONS: &[(&str, &str)] = &[("4.º", "quarto")];

static DECIMAL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)").expect("valid decimal pattern"));

/// Characters beyond ASCII alphanumerics and whitespace that the speech
/// synthesizer handles well.
const ACCENTED: &str = "çÇáàâãäéèêíïóôõöúüñÁÀÂÃÄÉÈÊÍÏÓÔÕÖÚÜÑß";

pub struct ClassifiedSpeech {
    pub text: String,
    pub is_markup: bool,
}

/// Applies the fixed correction table to an utterance.
pub fn correct(utterance: &str) -> String {
    let mut fixed = utterance.to_string();
    for (wrong, right) in CORRECTIONS {
        fixed = fixed.replace(wrong, right);
    }
    fixed
}

/// Picks the speech string out of a payload, preferring SSML over plain
/// text. SSML is returned verbatim and flagged so it skips sanitizing.
pub fn extract(speech: &Speech) -> (String, bool) {
    if let Some(ssml) = speech.ssml.as_ref().and_then(|s| s.speech.as_deref()) {
        if !ssml.is_empty() {
            return (ssml.to_string(), true);
        }
    }
    if let Some(plain) = speech.plain.as_ref().and_then(|s| s.speech.as_deref()) {
        if !plain.is_empty() {
            return (plain.to_string(), false);
        }
    }
    (String::new(), false)
}

/// Decides what to speak for an envelope. Upstream error responses still
/// speak their own apology; an empty payload falls back to the local error
/// phrase, with the envelope's diagnostic message appended when present.
pub fn classify(envelope: &ConversationEnvelope, phrases: &PhraseBook) -> ClassifiedSpeech {
    let (text, is_markup) = match &envelope.response {
        Some(response) => match response.response_type {
            ResponseType::ActionDone | ResponseType::QueryAnswer => {
                let (mut text, is_markup) = extract(&response.speech);
                if let Some(idx) = text.find(DEVICE_ID_MARKER) {
                    text.truncate(idx);
                    text.truncate(text.trim_end().len());
                }
                (text, is_markup)
            }
            ResponseType::Error => {
                let (text, is_markup) = extract(&response.speech);
                if let Some(code) = response.data.as_ref().and_then(|d| d.code.as_deref()) {
                    error!("assistant reported error code {code}");
                }
                (text, is_markup)
            }
            ResponseType::Other => (phrases.get(Phrase::GenericError).to_string(), false),
        },
        None => (String::new(), false),
    };

    if text.is_empty() {
        let text = match envelope.message.as_deref() {
            Some(message) => {
                error!("assistant returned no speech: {message}");
                format!("{} {}", phrases.get(Phrase::GenericError), message)
            }
            None => {
                error!("assistant returned no speech");
                phrases.get(Phrase::GenericError).to_string()
            }
        };
        return ClassifiedSpeech {
            text,
            is_markup: false,
        };
    }

    ClassifiedSpeech { text, is_markup }
}

/// Cleans plain text for the synthesizer. Idempotent. Never applied to SSML.
pub fn sanitize(text: &str, region: &str) -> String {
    let mut text = text
        .replace(":\n\n", "")
        .replace("\n\n", ". ")
        .replace('\n', ",")
        .replace('-', "")
        .replace('_', " ");

    if region == "DE" {
        text = germanize_decimals(&text);
    }

    text.chars().filter(|c| is_speakable(*c)).collect()
}

/// Rewrites decimal points to commas for German listeners. A trailing run of
/// one or two digits reads as a decimal; exactly three is German thousands
/// grouping and longer runs are not decimals, so both stay untouched.
fn germanize_decimals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in DECIMAL_NUMBER.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        match m.as_str().split_once('.') {
            Some((int_part, frac)) if frac.len() <= 2 => {
                out.push_str(int_part);
                out.push(',');
                out.push_str(frac);
            }
            _ => out.push_str(m.as_str()),
        }
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

fn is_speakable(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || matches!(c, '.' | ',' | '!' | '?' | '°')
        || ACCENTED.contains(c)
}
