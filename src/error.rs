// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Unified error types for the nova-exporter library.
//!
//! Only the fetch layer produces errors. The diagnostic classifier and the
//! topology joiner are total and never fail; a malformed diagnostic entry is
//! dropped, not reported.

use thiserror::Error;

/// The main error type for nova-exporter operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is missing or inconsistent.
    ///
    /// Raised while merging command-line flags with the `OS_*` environment,
    /// before any request is made.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Keystone refused the credentials or returned an unusable token.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The service catalog has no endpoint for the requested service type.
    #[error("No {0} endpoint found in the service catalog")]
    EndpointNotFound(String),

    /// The API answered with a non-success status code.
    #[error("API request to {url} failed with HTTP {status}: {body}")]
    Api {
        status: u16,
        url: String,
        body: String,
    },

    /// Transport-level failure (connect, timeout, TLS, body read).
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// An endpoint or pagination link is not a valid URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A response body could not be decoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for nova-exporter operations.
pub type Result<T> = std::result::Result<T, Error>;
