// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::config::ConfigError;

/// Longest response body excerpt kept in an HTTP error.
const HTTP_BODY_EXCERPT_CHARS: usize = 200;

/// Failure of a remote card API call.
///
/// The `Display` text is what the form shows in its error box.
#[derive(Debug, thiserror::Error)]
pub enum IssuerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("request failed: {0}")]
    Request(String),

    #[error("API returned {status}: {body}")]
    Http { status: u16, body: String },

    /// Error reported by the GraphQL layer itself (`errors[]` in the body).
    #[error("{0}")]
    GraphQl(String),

    #[error("API response was invalid: {0}")]
    InvalidResponse(String),
}

impl IssuerError {
    pub fn graphql(message: impl Into<String>) -> Self {
        Self::GraphQl(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Non-2xx response. Only a trimmed excerpt of the body is kept.
    pub fn http(status: u16, body: &str) -> Self {
        let body = body.trim();
        let mut excerpt: String = body.chars().take(HTTP_BODY_EXCERPT_CHARS).collect();
        if excerpt.len() < body.len() {
            excerpt.push('…');
        }
        Self::Http {
            status,
            body: excerpt,
        }
    }
}
