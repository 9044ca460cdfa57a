// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod freshness;
pub mod links;
pub mod models;
pub mod prompt;
pub mod query;
pub mod query_keys;
pub mod schedule;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::ResourceClient;
pub use config::{ApiHost, CachePolicy, ClientConfig};
pub use error::{ClientError, ValidationError};
pub use prompt::{CheckInPromptController, PromptGuard, PromptPresenter, PromptState};
pub use query::QueryClient;
pub use session::Session;
