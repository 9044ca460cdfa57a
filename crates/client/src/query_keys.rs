// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;

/// Address of a cached query result. Keys are hierarchical: invalidating a
/// key also invalidates every key it is a prefix of.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn root(token: impl Into<String>) -> Self {
        Self(vec![token.into()])
    }

    /// A narrower key nested under this one.
    pub fn child(&self, token: impl Into<String>) -> Self {
        let mut tokens = self.0.clone();
        tokens.push(token.into());
        Self(tokens)
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Whether invalidating `self` covers `other`. Every key covers itself.
    pub fn is_prefix_of(&self, other: &QueryKey) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Like [`Self::is_prefix_of`] but excluding equality.
    pub fn is_strict_prefix_of(&self, other: &QueryKey) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

pub mod challenges {
    use super::QueryKey;

    pub fn all() -> QueryKey {
        QueryKey::root("challenges")
    }

    pub fn active() -> QueryKey {
        all().child("active")
    }

    pub fn detail(id: &str) -> QueryKey {
        all().child(id)
    }

    pub fn program(id: &str) -> QueryKey {
        detail(id).child("program")
    }

    pub fn membership(id: &str) -> QueryKey {
        detail(id).child("membership")
    }

    pub fn check_ins(challenge_id: &str, user_id: &str) -> QueryKey {
        detail(challenge_id).child("checkIns").child(user_id)
    }
}
