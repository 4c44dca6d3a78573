use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{Profile, UserId};

/// Request to register a completed profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitProfileRequest {
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: UserId,
    #[validate(length(min = 1))]
    pub age: String,
    #[validate(length(min = 1))]
    pub gender: String,
    #[validate(length(min = 1))]
    pub preference: String,
    #[validate(length(min = 1))]
    pub location: String,
}

impl SubmitProfileRequest {
    pub fn into_profile(self) -> (UserId, Profile) {
        (
            self.user_id,
            Profile::new(self.age, self.gender, self.preference, self.location),
        )
    }
}

/// Inbound text from a user, delivered by a transport other than Telegram
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InboundMessageRequest {
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: UserId,
    #[validate(length(min = 1))]
    pub text: String,
}

/// Telegram `Update` object, reduced to the fields the bot reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

impl TelegramUpdate {
    /// Sender and text of a text message, if this update carries one
    pub fn text_message(&self) -> Option<(UserId, &str)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        let sender = message
            .from
            .as_ref()
            .filter(|user| !user.is_bot)
            .map(|user| user.id)?;
        Some((sender, text))
    }
}
