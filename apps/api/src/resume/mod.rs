// Resume builder: form → markdown assembly, preview/edit session state,
// PDF export and persistence of the finished document.

pub mod export;
pub mod form;
pub mod handlers;
pub mod markdown;
pub mod service;
pub mod session;
pub mod store;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
}

/// A transient message for the client to show as a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }
}
