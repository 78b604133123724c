//! Localized phrases spoken by the bridge itself.
//!
//! A closed set of phrase keys mapped to compiled-in per-language tables,
//! resolved once per request from the caller's locale and passed explicitly
//! through the pipeline. English is the fallback language.

use rand::seq::SliceRandom;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phrase {
    GenericError,
    TimeoutApology,
    Welcome,
    NextGreeting,
    FollowUpQuestion,
    Help,
    OpenDashboard,
}

pub struct PhraseBook {
    table: &'static PhraseTable,
    region: String,
}

struct PhraseTable {
    generic_error: &'static str,
    timeout_apology: &'static str,
    welcome: &'static str,
    next_greeting: &'static str,
    follow_up_question: &'static str,
    help: &'static str,
    open_dashboard: &'static str,
    exit_phrases: &'static [&'static str],
    dashboard_keywords: &'static [&'static str],
    close_keywords: &'static [&'static str],
}

static EN: PhraseTable = PhraseTable {
    generic_error: "Sorry, something went wrong while talking to your home.",
    timeout_apology: "Sorry, your home took too long to answer.",
    welcome: "Hi! Your home is listening. What can I do for you?",
    next_greeting: "What can I do for you?",
    follow_up_question: "Anything else?",
    help: "You can ask me to control your home or answer questions about it.",
    open_dashboard: "Opening your dashboard.",
    exit_phrases: &["Goodbye!", "See you later!", "Bye!"],
    dashboard_keywords: &[
        "open the dashboard",
        "show the dashboard",
        "open home assistant",
    ],
    close_keywords: &["stop", "cancel", "exit", "goodbye", "good bye", "quit"],
};

static DE: PhraseTable = PhraseTable {
    generic_error: "Entschuldigung, ich konnte dein Zuhause gerade nicht erreichen.",
    timeout_apology: "Entschuldigung, dein Zuhause hat zu lange für eine Antwort gebraucht.",
    welcome: "Hallo! Dein Zuhause hört zu. Was kann ich für dich tun?",
    next_greeting: "Was kann ich für dich tun?",
    follow_up_question: "Sonst noch etwas?",
    help: "Du kannst mich bitten, dein Zuhause zu steuern oder Fragen dazu zu beantworten.",
    open_dashboard: "Ich öffne dein Dashboard.",
    exit_phrases: &["Tschüss!", "Bis später!", "Bis bald!"],
    dashboard_keywords: &[
        "öffne das dashboard",
        "zeige das dashboard",
        "öffne home assistant",
    ],
    close_keywords: &["stopp", "stop", "abbrechen", "beenden", "tschüss"],
};

static PT: PhraseTable = PhraseTable {
    generic_error: "Desculpe, não consegui falar com a sua casa agora.",
    timeout_apology: "Desculpe, a sua casa demorou demais para responder.",
    welcome: "Olá! Sua casa está ouvindo. O que posso fazer por você?",
    next_greeting: "O que posso fazer por você?",
    follow_up_question: "Mais alguma coisa?",
    help: "Você pode me pedir para controlar a sua casa ou responder perguntas sobre ela.",
    open_dashboard: "Abrindo o seu painel.",
    exit_phrases: &["Tchau!", "Até logo!", "Até mais!"],
    dashboard_keywords: &["abrir o painel", "mostrar o painel", "abrir home assistant"],
    close_keywords: &["parar", "cancelar", "sair", "tchau", "encerrar"],
};

impl PhraseBook {
    /// Resolves a phrase table from a BCP-47 tag. The language part selects
    /// the table, the region part only drives number formatting later on.
    pub fn for_locale(tag: &str) -> Self {
        let mut parts = tag.split('-');
        let language = parts.next().unwrap_or("en").to_ascii_lowercase();
        let region = parts.next().unwrap_or("US").to_ascii_uppercase();

        let table = match language.as_str() {
            "de" => &DE,
            "pt" => &PT,
            _ => &EN,
        };
        Self { table, region }
    }

    pub fn get(&self, phrase: Phrase) -> &'static str {
        match phrase {
            Phrase::GenericError => self.table.generic_error,
            Phrase::TimeoutApology => self.table.timeout_apology,
            Phrase::Welcome => self.table.welcome,
            Phrase::NextGreeting => self.table.next_greeting,
            Phrase::FollowUpQuestion => self.table.follow_up_question,
            Phrase::Help => self.table.help,
            Phrase::OpenDashboard => self.table.open_dashboard,
        }
    }

    /// Two-letter region code, e.g. `DE` for `de-DE`.
    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn exit_phrase(&self) -> &'static str {
        self.table
            .exit_phrases
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(self.table.generic_error)
    }

    pub fn dashboard_keywords(&self) -> &'static [&'static str] {
        self.table.dashboard_keywords
    }

    pub fn close_keywords(&self) -> &'static [&'static str] {
        self.table.close_keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_selects_language_and_region() {
        let de = PhraseBook::for_locale("de-DE");
        assert_eq!(de.region(), "DE");
        assert!(de.get(Phrase::GenericError).starts_with("Entschuldigung"));

        let pt = PhraseBook::for_locale("pt-BR");
        assert_eq!(pt.region(), "BR");
        assert!(pt.get(Phrase::Welcome).starts_with("Olá"));
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let fr = PhraseBook::for_locale("fr-FR");
        assert_eq!(fr.get(Phrase::Help), EN.help);
        assert_eq!(fr.region(), "FR");
    }

    #[test]
    fn bare_language_tag_defaults_the_region() {
        let en = PhraseBook::for_locale("en");
        assert_eq!(en.region(), "US");
    }

    #[test]
    fn timeout_and_generic_apologies_differ() {
        for tag in ["en-US", "de-DE", "pt-BR"] {
            let book = PhraseBook::for_locale(tag);
            assert_ne!(
                book.get(Phrase::TimeoutApology),
                book.get(Phrase::GenericError)
            );
        }
    }

    #[test]
    fn exit_phrase_comes_from_the_table() {
        let book = PhraseBook::for_locale("en-US");
        let phrase = book.exit_phrase();
        assert!(EN.exit_phrases.contains(&phrase));
    }
}
