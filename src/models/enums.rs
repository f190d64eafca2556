//! Shared domain enums

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Terminal display languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Cs,
    En,
    Uk,
}

impl Language {
    /// Parse a language code posted by the terminal form
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "cs" => Some(Language::Cs),
            "en" => Some(Language::En),
            "uk" => Some(Language::Uk),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Cs => "cs",
            Language::En => "en",
            Language::Uk => "uk",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Language::Cs => "Čeština",
            Language::En => "English",
            Language::Uk => "Українська",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// VisitType
// ---------------------------------------------------------------------------

/// How a visit came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum VisitType {
    /// Scheduled in advance, enters with a pre-issued PIN
    Planned,
    /// Registered on the spot at the terminal
    Walkin,
}

impl VisitType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "planned" => Some(VisitType::Planned),
            "walkin" => Some(VisitType::Walkin),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// VisitStatus
// ---------------------------------------------------------------------------

/// Visit lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum VisitStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

// ---------------------------------------------------------------------------
// CheckoutOutcome
// ---------------------------------------------------------------------------

/// Terminal outcome of a full checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutOutcome {
    /// Selected visitors leave but the visit stays open
    Return,
    /// The visit is over; close it
    Complete,
}

impl CheckoutOutcome {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "return" => Some(CheckoutOutcome::Return),
            "complete" => Some(CheckoutOutcome::Complete),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes_round_trip() {
        for lang in [Language::Cs, Language::En, Language::Uk] {
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
        assert_eq!(Language::from_code("xx"), None);
        assert_eq!(Language::from_code(""), None);
    }

    #[test]
    fn test_visit_type_parse() {
        assert_eq!(VisitType::from_code("planned"), Some(VisitType::Planned));
        assert_eq!(VisitType::from_code("walkin"), Some(VisitType::Walkin));
        assert_eq!(VisitType::from_code("other"), None);
    }
}
