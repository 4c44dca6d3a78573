use std::time::Duration;

use moka::future::Cache;

use crate::core::notices;
use crate::models::{Profile, UserId};

/// Step the user is expected to answer next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    Age,
    Gender,
    Preference,
    Location,
}

#[derive(Debug, Clone)]
struct Draft {
    step: SetupStep,
    age: String,
    gender: String,
    preference: String,
}

impl Draft {
    fn new() -> Self {
        Self {
            step: SetupStep::Age,
            age: String::new(),
            gender: String::new(),
            preference: String::new(),
        }
    }
}

/// What the dialog wants to happen after an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogReply {
    /// Ask the next (or the same) question
    Prompt(&'static str),
    /// All four answers collected
    Completed(Profile),
}

/// Four-step profile setup dialog: age, gender, preference, location
///
/// Drafts live in a bounded in-memory cache and expire after a period of
/// inactivity, so abandoned dialogs need no cleanup.
#[derive(Clone)]
pub struct ProfileDialog {
    drafts: Cache<UserId, Draft>,
}

impl ProfileDialog {
    pub fn new(max_pending: u64, idle_timeout: Duration) -> Self {
        let drafts = Cache::builder()
            .max_capacity(max_pending)
            .time_to_idle(idle_timeout)
            .build();

        Self { drafts }
    }

    /// Start (or restart) the dialog and return the first prompt
    pub async fn begin(&self, user_id: UserId) -> &'static str {
        self.drafts.insert(user_id, Draft::new()).await;
        tracing::debug!(user_id, "Profile setup started");
        notices::WELCOME
    }

    pub async fn step(&self, user_id: UserId) -> Option<SetupStep> {
        self.drafts.get(&user_id).await.map(|d| d.step)
    }

    pub async fn cancel(&self, user_id: UserId) {
        self.drafts.invalidate(&user_id).await;
    }

    /// Feed the user's answer to the current step
    ///
    /// Returns `None` when the user has no dialog in progress.
    pub async fn answer(&self, user_id: UserId, text: &str) -> Option<DialogReply> {
        let mut draft = self.drafts.get(&user_id).await?;
        let answer = text.trim();

        if answer.is_empty() {
            return Some(DialogReply::Prompt(notices::EMPTY_ANSWER));
        }

        let reply = match draft.step {
            SetupStep::Age => {
                draft.age = answer.to_string();
                draft.step = SetupStep::Gender;
                DialogReply::Prompt(notices::ASK_GENDER)
            }
            SetupStep::Gender => {
                draft.gender = answer.to_string();
                draft.step = SetupStep::Preference;
                DialogReply::Prompt(notices::ASK_PREFERENCE)
            }
            SetupStep::Preference => {
                draft.preference = answer.to_string();
                draft.step = SetupStep::Location;
                DialogReply::Prompt(notices::ASK_LOCATION)
            }
            SetupStep::Location => {
                self.drafts.invalidate(&user_id).await;
                tracing::debug!(user_id, "Profile setup completed");
                return Some(DialogReply::Completed(Profile {
                    age: draft.age,
                    gender: draft.gender,
                    preference: draft.preference,
                    location: answer.to_string(),
                }));
            }
        };

        self.drafts.insert(user_id, draft).await;
        Some(reply)
    }
}
