// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! The issuance form talks to a single GraphQL endpoint on behalf of one
//! owning collective. Configuration is loaded from the environment.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CARDS_API_URL` | GraphQL endpoint | `http://localhost:3060/graphql` |
//! | `CARDS_API_KEY` | API key sent as `Api-Key` header | Optional |
//! | `CARDS_COLLECTIVE_ID` | Numeric id of the issuing collective | Required |
//! | `CARDS_COLLECTIVE_SLUG` | Slug of the issuing collective | Required |
//! | `CARDS_CURRENCY` | Currency shown next to the amount | `USD` |
//! | `CARDS_HTTP_TIMEOUT_SECS` | HTTP client timeout | `15` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::time::Duration;

use url::Url;

/// Environment variable name for the GraphQL endpoint.
pub const API_URL_ENV: &str = "CARDS_API_URL";
pub const API_KEY_ENV: &str = "CARDS_API_KEY";
pub const COLLECTIVE_ID_ENV: &str = "CARDS_COLLECTIVE_ID";
pub const COLLECTIVE_SLUG_ENV: &str = "CARDS_COLLECTIVE_SLUG";
pub const CURRENCY_ENV: &str = "CARDS_CURRENCY";
pub const HTTP_TIMEOUT_ENV: &str = "CARDS_HTTP_TIMEOUT_SECS";

/// Environment variable selecting the log output format.
///
/// `json` switches to newline-delimited JSON; anything else is pretty text.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_API_URL: &str = "http://localhost:3060/graphql";
pub const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Settings needed to reach the card API for one owning collective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerConfig {
    pub api_url: Url,
    pub api_key: Option<String>,
    pub collective_id: u64,
    pub collective_slug: String,
    pub currency: String,
    pub http_timeout: Duration,
}

impl IssuerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let raw_url = get(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
            name: API_URL_ENV,
            reason: e.to_string(),
        })?;

        let collective_id = get(COLLECTIVE_ID_ENV)
            .ok_or(ConfigError::Missing(COLLECTIVE_ID_ENV))?
            .parse::<u64>()
            .map_err(|e| ConfigError::Invalid {
                name: COLLECTIVE_ID_ENV,
                reason: e.to_string(),
            })?;

        let collective_slug =
            get(COLLECTIVE_SLUG_ENV).ok_or(ConfigError::Missing(COLLECTIVE_SLUG_ENV))?;

        let currency = get(CURRENCY_ENV)
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
            .to_ascii_uppercase();

        let timeout_secs = match get(HTTP_TIMEOUT_ENV) {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: HTTP_TIMEOUT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            api_key: get(API_KEY_ENV),
            collective_id,
            collective_slug,
            currency,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
