// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use thiserror::Error;

const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error("Could not reach the API at {host}: {message}")]
    Network { host: String, message: String },
    #[error("Request rejected with status {status}")]
    Auth { status: u16 },
    #[error("Resource not found: {path}")]
    NotFound { path: String },
    #[error("Server responded with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },
    #[error("Failed to decode response: {0}")]
    Decode(Arc<serde_json::Error>),
    #[error("A signed-in session is required")]
    Unauthenticated,
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::Decode(Arc::new(error))
    }
}

impl ClientError {
    /// Text suitable for an inline error state or a blocking alert.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network { host, .. } => format!(
                "Could not connect to {host}. Check your connection and try again."
            ),
            ClientError::Auth { .. } | ClientError::Unauthenticated => {
                "Please sign in again.".to_string()
            }
            ClientError::NotFound { .. } => "This item could not be found.".to_string(),
            ClientError::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ClientError::Server { .. } | ClientError::Decode(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            ClientError::Validation(e) => e.to_string(),
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::Auth { .. } | ClientError::Unauthenticated)
    }
}

/// Local field checks that run before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} must not contain '/', '?', '#' or whitespace")]
    InvalidIdentifier(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("Reminder hour must be between 0 and 23, got {0}")]
    ReminderHour(i32),
    #[error("Reminder minute must be between 0 and 59, got {0}")]
    ReminderMinute(i32),
    #[error("Challenge must end after it starts")]
    EndBeforeStart,
}
