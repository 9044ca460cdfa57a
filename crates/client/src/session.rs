// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;

use crate::error::ClientError;

/// The signed-in user as handed over by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    token: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, token: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn signed_in(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(user_id, Some(token.into()))
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The bearer credential, or `Unauthenticated` when there is none.
    pub fn bearer(&self) -> Result<&str, ClientError> {
        self.token().ok_or(ClientError::Unauthenticated)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
