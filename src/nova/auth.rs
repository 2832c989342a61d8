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

//! Keystone v3 password authentication and service catalog lookup.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::config::Credentials;
use crate::error::{Error, Result};

pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Tokens are refreshed this long before Keystone says they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEndpoint {
    #[serde(default)]
    pub interface: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_id: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenBody {
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: TokenBody,
}

/// An authenticated session: the token plus the endpoints resolved for it.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub compute_url: String,
    pub identity_url: String,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + Duration::seconds(EXPIRY_MARGIN_SECS) >= expires_at,
            None => false,
        }
    }
}

/// `https://keystone:5000`, `https://keystone:5000/` and
/// `https://keystone:5000/v3` all resolve to the v3 root.
pub fn identity_v3_root(auth_url: &str) -> String {
    let trimmed = auth_url.trim_end_matches('/');
    if trimmed.ends_with("/v3") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v3")
    }
}

/// Request body for a project-scoped password token.
pub fn password_auth_body(credentials: &Credentials) -> Value {
    json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": credentials.username,
                        "domain": {"name": credentials.user_domain_name},
                        "password": credentials.password,
                    }
                }
            },
            "scope": {
                "project": {
                    "name": credentials.project_name,
                    "domain": {"name": credentials.project_domain_name},
                }
            }
        }
    })
}

/// Pick the URL of `service_type` for the given interface and region.
/// Without a region the first endpoint with a matching interface wins.
pub fn find_endpoint(
    catalog: &[CatalogEntry],
    service_type: &str,
    interface: &str,
    region: Option<&str>,
) -> Option<String> {
    catalog
        .iter()
        .filter(|entry| entry.service_type == service_type)
        .flat_map(|entry| entry.endpoints.iter())
        .filter(|endpoint| endpoint.interface == interface)
        .find(|endpoint| match region {
            Some(region) => {
                endpoint.region.as_deref() == Some(region)
                    || endpoint.region_id.as_deref() == Some(region)
            }
            None => true,
        })
        .map(|endpoint| endpoint.url.trim_end_matches('/').to_string())
}

/// Turn a token response into a session, resolving the compute endpoint
/// (required) and the identity endpoint (falls back to the auth URL).
pub fn session_from_token(
    token: String,
    body: TokenBody,
    credentials: &Credentials,
) -> Result<Session> {
    if token.is_empty() {
        return Err(Error::Auth(format!("empty {SUBJECT_TOKEN_HEADER} header")));
    }

    let region = credentials.region_name.as_deref();
    let compute_url = find_endpoint(&body.catalog, "compute", &credentials.interface, region)
        .ok_or_else(|| Error::EndpointNotFound("compute".to_string()))?;
    let identity_url = find_endpoint(&body.catalog, "identity", &credentials.interface, region)
        .map(|url| identity_v3_root(&url))
        .unwrap_or_else(|| identity_v3_root(&credentials.auth_url));

    Ok(Session {
        token,
        expires_at: body.expires_at,
        compute_url,
        identity_url,
    })
}
