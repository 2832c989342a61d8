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

//! Access to the compute (Nova) and identity (Keystone) APIs.

pub mod auth;
pub mod client;
pub mod models;

use async_trait::async_trait;

use crate::diagnostics::DiagnosticRecord;
use crate::error::Result;
use models::{
    AbsoluteLimits, Aggregate, AvailabilityZone, ComputeService, Flavor, Hypervisor, Project,
    SecurityGroup, Server,
};

pub use client::NovaClient;

/// Everything the collector needs from the cloud.
///
/// Implemented over HTTP by [`NovaClient`]; tests substitute an in-memory
/// implementation.
#[async_trait]
pub trait NovaApi: Send + Sync {
    /// All servers across all tenants, with extended attributes.
    async fn list_servers(&self) -> Result<Vec<Server>>;

    /// The diagnostic record of one server.
    async fn server_diagnostics(&self, server_id: &str) -> Result<DiagnosticRecord>;

    async fn list_hypervisors(&self) -> Result<Vec<Hypervisor>>;

    async fn list_aggregates(&self) -> Result<Vec<Aggregate>>;

    async fn list_flavors(&self) -> Result<Vec<Flavor>>;

    async fn list_availability_zones(&self) -> Result<Vec<AvailabilityZone>>;

    async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>>;

    async fn list_services(&self) -> Result<Vec<ComputeService>>;

    /// Projects known to the identity service.
    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// Absolute compute limits and usage of one project.
    async fn project_limits(&self, project_id: &str) -> Result<AbsoluteLimits>;
}
