//! InteractionType enum for the channel of a client contact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Channel through which a client interaction happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionType {
    Meeting,
    Email,
    Wechat,
    Call,
}

impl InteractionType {
    pub const ALL: [InteractionType; 4] = [
        InteractionType::Meeting,
        InteractionType::Email,
        InteractionType::Wechat,
        InteractionType::Call,
    ];

    /// Returns the wire name (e.g. `WECHAT`).
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Meeting => "MEETING",
            InteractionType::Email => "EMAIL",
            InteractionType::Wechat => "WECHAT",
            InteractionType::Call => "CALL",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InteractionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        InteractionType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                ValidationError::invalid_format("type", format!("unknown interaction type '{}'", s))
            })
    }
}
