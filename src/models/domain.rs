use serde::{Deserialize, Serialize};

/// Identifier of a chat participant (a Telegram user/chat id)
pub type UserId = i64;

/// Sentinel preference that accepts any partner gender
pub const ANYONE: &str = "anyone";

/// Profile collected by the setup dialog
///
/// All fields are free-form text. Only `gender` and `preference` take part in
/// matching; `age` and `location` are stored but never compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub age: String,
    pub gender: String,
    pub preference: String,
    pub location: String,
}

impl Profile {
    pub fn new(
        age: impl Into<String>,
        gender: impl Into<String>,
        preference: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            age: age.into(),
            gender: gender.into(),
            preference: preference.into(),
            location: location.into(),
        }
    }

    /// Whether this profile's preference accepts a partner of `gender`
    pub fn accepts(&self, gender: &str) -> bool {
        let preference = self.preference.to_lowercase();
        preference == ANYONE || preference == gender.to_lowercase()
    }
}

/// A text message the service wants delivered to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbound {
    #[serde(rename = "userId")]
    pub to: UserId,
    pub text: String,
}

impl Outbound {
    pub fn new(to: UserId, text: impl Into<String>) -> Self {
        Self { to, text: text.into() }
    }
}

/// Point-in-time counters of the engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub profiles: usize,
    pub waiting: usize,
    #[serde(rename = "pairedUsers")]
    pub paired_users: usize,
    pub sessions: usize,
}
