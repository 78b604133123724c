//! Utterance keywords handled locally, without a relay round trip.

use regex::Regex;
use tracing::info;

use crate::services::phrases::PhraseBook;

#[derive(Debug, PartialEq, Eq)]
pub enum KeywordAction {
    OpenDashboard,
    CloseSession,
}

/// Checks an utterance against the locale's keyword lists. Dashboard
/// keywords match anywhere; closing keywords only count when the utterance
/// is short enough to be a command rather than a sentence that happens to
/// contain one.
pub fn match_keyword(utterance: &str, phrases: &PhraseBook) -> Option<KeywordAction> {
    let lowered = utterance.to_lowercase();

    if phrases
        .dashboard_keywords()
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        info!("dashboard keyword matched");
        return Some(KeywordAction::OpenDashboard);
    }

    if lowered.split_whitespace().count() <= 3 {
        for keyword in phrases.close_keywords() {
            // Whole word or phrase only, so "stop" does not fire on "stopwatch".
            let pattern = format!(r"\b{}\b", regex::escape(keyword));
            let matched = Regex::new(&pattern)
                .map(|re| re.is_match(&lowered))
                .unwrap_or(false);
            if matched {
                info!("close keyword matched");
                return Some(KeywordAction::CloseSession);
            }
        }
    }

    None
}
