//! User-facing messages in English and German

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    De,
}

/// Message table for one locale
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Messages {
    pub load_error: &'static str,
    pub empty: &'static str,
    pub download: &'static str,
    pub loading: &'static str,
}

const EN: Messages = Messages {
    load_error: "Error loading shapes. Please try again later.",
    empty: "No shapes found.",
    download: "Download",
    loading: "Loading shapes...",
};

const DE: Messages = Messages {
    load_error: "Fehler beim Laden der Shapes. Bitte versuche es später erneut.",
    empty: "Keine Shapes gefunden.",
    download: "Herunterladen",
    loading: "Shapes werden geladen...",
};

impl Locale {
    /// Parse a language tag such as `de`, `de-DE` or `en_US`.
    ///
    /// Returns `None` for languages without a message table.
    pub fn parse(tag: &str) -> Option<Self> {
        let language = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match language.as_str() {
            "en" => Some(Locale::En),
            "de" => Some(Locale::De),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::De => "de",
        }
    }

    pub fn messages(&self) -> &'static Messages {
        match self {
            Locale::En => &EN,
            Locale::De => &DE,
        }
    }

    pub fn format_date(&self, date: &DateTime<Utc>) -> String {
        match self {
            Locale::En => date.format("%m/%d/%Y").to_string(),
            Locale::De => date.format("%d.%m.%Y").to_string(),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
