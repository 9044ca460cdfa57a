// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::time::Duration;

use thiserror::Error;

pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:3000";
pub const PRODUCTION_BASE_URL: &str = "https://api.trybe.app";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported API_HOST value: {0}")]
    UnknownHost(String),
}

/// Which backend the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiHost {
    Development,
    Production,
    Custom(String),
}

impl ApiHost {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "" | "dev" | "development" => Ok(ApiHost::Development),
            "prod" | "production" => Ok(ApiHost::Production),
            lower if lower.starts_with("http://") || lower.starts_with("https://") => {
                Ok(ApiHost::Custom(value.trim_end_matches('/').to_string()))
            }
            _ => Err(ConfigError::UnknownHost(value.to_string())),
        }
    }

    /// Reads `API_HOST`, defaulting to development when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var("API_HOST") {
            Ok(value) => Self::parse(&value),
            Err(_) => Ok(ApiHost::Development),
        }
    }

    pub fn base_url(&self) -> &str {
        match self {
            ApiHost::Development => DEVELOPMENT_BASE_URL,
            ApiHost::Production => PRODUCTION_BASE_URL,
            ApiHost::Custom(url) => url.as_str(),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, ApiHost::Production)
    }
}

/// How long cached reads stay fresh. Development never serves cached data so
/// backend changes show up immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub stale_time: Duration,
    pub max_capacity: u64,
}

impl CachePolicy {
    pub fn development() -> Self {
        Self {
            stale_time: Duration::ZERO,
            max_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    pub fn production() -> Self {
        Self {
            stale_time: Duration::from_secs(60),
            max_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    pub fn for_host(host: &ApiHost) -> Self {
        if host.is_production() {
            Self::production()
        } else {
            Self::development()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: ApiHost,
    pub timeout: Duration,
    pub cache: CachePolicy,
}

impl ClientConfig {
    pub fn new(host: ApiHost) -> Self {
        Self {
            cache: CachePolicy::for_host(&host),
            host,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(ApiHost::from_env()?))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
