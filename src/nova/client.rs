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

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use super::auth::{
    identity_v3_root, password_auth_body, session_from_token, Session, TokenResponse,
    SUBJECT_TOKEN_HEADER,
};
use super::models::{
    AbsoluteLimits, Aggregate, AggregateList, AvailabilityZone, AvailabilityZoneList,
    ComputeService, ComputeServiceList, Flavor, FlavorList, Hypervisor, HypervisorList,
    next_link, LimitsResponse, Paginated, Project, ProjectList, SecurityGroup, SecurityGroupList,
    Server, ServerList,
};
use super::NovaApi;
use crate::common::config::{AppConfig, Credentials};
use crate::diagnostics::DiagnosticRecord;
use crate::error::{Error, Result};

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const NOVA_API_VERSION_HEADER: &str = "X-OpenStack-Nova-API-Version";

/// Upper bound on followed `next` links, in case an API keeps returning one.
const MAX_PAGES: usize = 1000;

/// Error bodies are cut to this many characters before they are logged.
const MAX_ERROR_BODY_CHARS: usize = 512;

fn truncate_body(body: String) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body,
    }
}

/// HTTP implementation of [`NovaApi`].
///
/// Authenticates lazily on first use and again whenever the token is about
/// to expire.
pub struct NovaClient {
    client: reqwest::Client,
    credentials: Credentials,
    session: RwLock<Option<Session>>,
}

impl NovaClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        credentials.validate()?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(AppConfig::CONNECTION_TIMEOUT_SECS))
            .timeout(Duration::from_secs(AppConfig::REQUEST_TIMEOUT_SECS))
            .pool_idle_timeout(Duration::from_secs(AppConfig::POOL_IDLE_TIMEOUT_SECS))
            .pool_max_idle_per_host(AppConfig::POOL_MAX_IDLE_PER_HOST)
            .tcp_keepalive(Duration::from_secs(AppConfig::TCP_KEEPALIVE_SECS))
            .user_agent(concat!("nova-exporter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            credentials,
            session: RwLock::new(None),
        })
    }

    async fn authenticate(&self) -> Result<Session> {
        let url = format!(
            "{}/auth/tokens",
            identity_v3_root(&self.credentials.auth_url)
        );
        debug!("Requesting token from {url}");

        let response = self
            .client
            .post(&url)
            .json(&password_auth_body(&self.credentials))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = truncate_body(response.text().await.unwrap_or_default());
            return Err(Error::Auth(format!("HTTP {status} from {url}: {body}")));
        }

        let token = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body: TokenResponse = response.json().await?;
        let session = session_from_token(token, body.token, &self.credentials)?;

        info!(
            "Authenticated as {} (project {}), compute endpoint {}",
            self.credentials.username, self.credentials.project_name, session.compute_url
        );
        Ok(session)
    }

    /// Current session, re-authenticating when there is none or it expired.
    async fn session(&self) -> Result<Session> {
        if let Some(session) = self.session.read().await.as_ref() {
            if !session.is_expired(Utc::now()) {
                return Ok(session.clone());
            }
        }

        let mut guard = self.session.write().await;
        // another task may have refreshed while we waited for the lock
        if let Some(session) = guard.as_ref() {
            if !session.is_expired(Utc::now()) {
                return Ok(session.clone());
            }
        }

        let session = self.authenticate().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    async fn get_json<T: DeserializeOwned>(&self, session: &Session, url: &str) -> Result<T> {
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .header(AUTH_TOKEN_HEADER, &session.token)
            .header(NOVA_API_VERSION_HEADER, &self.credentials.compute_api_version)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = truncate_body(response.text().await.unwrap_or_default());
            return Err(Error::Api {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        Ok(response.json::<T>().await?)
    }

    /// Fetch `url` and every page reachable through `next` links. Stops on
    /// an empty page or a link pointing back at the page just fetched.
    async fn collect_pages<P>(&self, session: &Session, mut url: Url) -> Result<Vec<P::Item>>
    where
        P: Paginated + DeserializeOwned,
    {
        let mut items = Vec::new();
        for _ in 0..MAX_PAGES {
            let page: P = self.get_json(session, url.as_str()).await?;
            let (page_items, links) = page.into_page();
            let fetched = page_items.len();
            items.extend(page_items);

            let next = next_link(&links).map(Url::parse).transpose()?;
            match next {
                Some(next) if fetched > 0 && next != url => url = next,
                _ => break,
            }
        }

        Ok(items)
    }

    async fn compute<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let session = self.session().await?;
        let url = format!("{}{path}", session.compute_url);
        self.get_json(&session, &url).await
    }
}

#[async_trait]
impl NovaApi for NovaClient {
    async fn list_servers(&self) -> Result<Vec<Server>> {
        let session = self.session().await?;
        let url = Url::parse_with_params(
            &format!("{}/servers/detail", session.compute_url),
            &[("all_tenants", "true")],
        )?;
        self.collect_pages::<ServerList>(&session, url).await
    }

    async fn server_diagnostics(&self, server_id: &str) -> Result<DiagnosticRecord> {
        self.compute(&format!("/servers/{server_id}/diagnostics"))
            .await
    }

    async fn list_hypervisors(&self) -> Result<Vec<Hypervisor>> {
        let session = self.session().await?;
        let url = Url::parse(&format!("{}/os-hypervisors/detail", session.compute_url))?;
        self.collect_pages::<HypervisorList>(&session, url).await
    }

    async fn list_aggregates(&self) -> Result<Vec<Aggregate>> {
        let list: AggregateList = self.compute("/os-aggregates").await?;
        Ok(list.aggregates)
    }

    async fn list_flavors(&self) -> Result<Vec<Flavor>> {
        let session = self.session().await?;
        let url = Url::parse(&format!("{}/flavors/detail", session.compute_url))?;
        self.collect_pages::<FlavorList>(&session, url).await
    }

    async fn list_availability_zones(&self) -> Result<Vec<AvailabilityZone>> {
        let list: AvailabilityZoneList = self.compute("/os-availability-zone").await?;
        Ok(list.availability_zone_info)
    }

    async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>> {
        let list: SecurityGroupList = self.compute("/os-security-groups").await?;
        Ok(list.security_groups)
    }

    async fn list_services(&self) -> Result<Vec<ComputeService>> {
        let list: ComputeServiceList = self.compute("/os-services").await?;
        Ok(list.services)
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let session = self.session().await?;
        let url = format!("{}/projects", session.identity_url);
        let list: ProjectList = self.get_json(&session, &url).await?;
        Ok(list.projects)
    }

    async fn project_limits(&self, project_id: &str) -> Result<AbsoluteLimits> {
        let session = self.session().await?;
        let url = Url::parse_with_params(
            &format!("{}/limits", session.compute_url),
            &[("tenant_id", project_id)],
        )?;
        let response: LimitsResponse = self.get_json(&session, url.as_str()).await?;
        Ok(response.limits.absolute)
    }
}
