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

//! One poll cycle: fetch everything the enabled metric families need,
//! classify and join it, and turn it into samples.
//!
//! Families are fetched independently. A failed list only drops the
//! families built from it, and a failed diagnostics request only drops that
//! instance's diagnostics.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::api::metrics::hypervisor::HypervisorMetricExporter;
use crate::api::metrics::inventory::InventoryMetricExporter;
use crate::api::metrics::limits::LimitsMetricExporter;
use crate::api::metrics::server::{InstanceDiagnostics, ServerMetricExporter};
use crate::api::metrics::service::ServiceMetricExporter;
use crate::api::metrics::status::StatusMetricExporter;
use crate::api::metrics::{MetricExporter, MetricFamily, MetricRegistry, SampleSet};
use crate::common::config::ExporterConfig;
use crate::diagnostics::classify;
use crate::error::Result;
use crate::nova::models::Server;
use crate::nova::NovaApi;
use crate::topology::Topology;

/// Result of one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub samples: SampleSet,
    pub up: bool,
    pub duration: Duration,
    pub skipped_instances: usize,
    /// Names of the sections that could not be fetched.
    pub failures: Vec<&'static str>,
}

impl Snapshot {
    pub fn render(&self, registry: &MetricRegistry) -> String {
        self.samples.render(registry)
    }

    /// Unwrap a section result, recording a failure when it errored.
    fn accept<T>(&mut self, name: &'static str, section: Option<Result<T>>) -> Option<T> {
        match section? {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Failed to collect {name}: {e}");
                self.failures.push(name);
                None
            }
        }
    }
}

struct ServerSection {
    samples: SampleSet,
    skipped_instances: usize,
}

pub struct Collector {
    api: Arc<dyn NovaApi>,
    registry: Arc<MetricRegistry>,
    collect_diagnostics: bool,
    semaphore: Semaphore,
}

impl Collector {
    pub fn new(
        api: Arc<dyn NovaApi>,
        registry: Arc<MetricRegistry>,
        config: &ExporterConfig,
    ) -> Self {
        Self {
            api,
            registry,
            collect_diagnostics: config.collect_diagnostics,
            semaphore: Semaphore::new(config.diagnostics_concurrency.max(1)),
        }
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    pub async fn collect(&self) -> Snapshot {
        let started = Instant::now();
        let mut snapshot = Snapshot::default();

        let (flavors, zones, groups, services, hypervisors, servers, limits) = tokio::join!(
            self.count(MetricFamily::Flavors, self.api.list_flavors()),
            self.count(MetricFamily::AvailabilityZones, self.api.list_availability_zones()),
            self.count(MetricFamily::SecurityGroups, self.api.list_security_groups()),
            self.when(
                self.registry.is_enabled(MetricFamily::AgentState),
                self.collect_services()
            ),
            self.when(
                self.registry.any_enabled(MetricFamily::HYPERVISOR),
                self.collect_hypervisors()
            ),
            self.when(self.needs_servers(), self.collect_servers()),
            self.when(
                self.registry.any_enabled(MetricFamily::LIMITS),
                self.collect_limits()
            ),
        );

        let inventory = InventoryMetricExporter {
            flavors: snapshot.accept("flavors", flavors),
            availability_zones: snapshot.accept("availability_zones", zones),
            security_groups: snapshot.accept("security_groups", groups),
            total_vms: None,
        };
        inventory.export_samples(&mut snapshot.samples);

        for (name, section) in [
            ("agent_state", services),
            ("hypervisors", hypervisors),
            ("limits", limits),
        ] {
            if let Some(samples) = snapshot.accept(name, section) {
                snapshot.samples.extend(samples);
            }
        }

        if let Some(section) = snapshot.accept("servers", servers) {
            snapshot.samples.extend(section.samples);
            snapshot.skipped_instances = section.skipped_instances;
        }

        snapshot.up = snapshot.failures.is_empty();
        snapshot.duration = started.elapsed();
        StatusMetricExporter {
            up: snapshot.up,
            duration: snapshot.duration,
            skipped_instances: snapshot.skipped_instances,
        }
        .export_samples(&mut snapshot.samples);

        info!(
            "Poll finished in {:.2}s: {} samples, {} failed sections, {} skipped instances",
            snapshot.duration.as_secs_f64(),
            snapshot.samples.len(),
            snapshot.failures.len(),
            snapshot.skipped_instances
        );
        snapshot
    }

    /// Run `fetch` only when `enabled`; `None` means the section was skipped.
    async fn when<T>(
        &self,
        enabled: bool,
        fetch: impl Future<Output = Result<T>>,
    ) -> Option<Result<T>> {
        if enabled {
            Some(fetch.await)
        } else {
            None
        }
    }

    async fn count<T>(
        &self,
        family: MetricFamily,
        fetch: impl Future<Output = Result<Vec<T>>>,
    ) -> Option<Result<usize>> {
        self.when(self.registry.is_enabled(family), async move {
            fetch.await.map(|items| items.len())
        })
        .await
    }

    fn needs_servers(&self) -> bool {
        self.registry
            .any_enabled([MetricFamily::TotalVms, MetricFamily::ServerStatus])
            || self.wants_diagnostics()
    }

    fn wants_diagnostics(&self) -> bool {
        self.collect_diagnostics && self.registry.any_enabled(MetricFamily::diagnostics())
    }

    async fn collect_services(&self) -> Result<SampleSet> {
        let services = self.api.list_services().await?;
        let mut samples = SampleSet::new();
        ServiceMetricExporter::new(&services).export_samples(&mut samples);
        Ok(samples)
    }

    async fn collect_hypervisors(&self) -> Result<SampleSet> {
        let (hypervisors, aggregates) =
            tokio::try_join!(self.api.list_hypervisors(), self.api.list_aggregates())?;
        let topology = Topology::build(&aggregates);
        debug!(
            "{} hypervisors, {} aggregates covering {} hosts",
            hypervisors.len(),
            aggregates.len(),
            topology.host_count()
        );

        let mut samples = SampleSet::new();
        HypervisorMetricExporter::new(&hypervisors, &topology).export_samples(&mut samples);
        Ok(samples)
    }

    async fn collect_servers(&self) -> Result<ServerSection> {
        let servers = self.api.list_servers().await?;

        let (diagnostics, skipped_instances) = if self.wants_diagnostics() {
            self.collect_diagnostics(&servers).await
        } else {
            (Vec::new(), 0)
        };

        let mut samples = SampleSet::new();
        InventoryMetricExporter {
            total_vms: Some(servers.len()),
            ..Default::default()
        }
        .export_samples(&mut samples);
        ServerMetricExporter::new(&servers, &diagnostics).export_samples(&mut samples);

        Ok(ServerSection {
            samples,
            skipped_instances,
        })
    }

    /// Fetch and classify the diagnostics of every server, at most
    /// `diagnostics_concurrency` requests at a time. Returns the classified
    /// instances sorted by id and the number of instances skipped.
    async fn collect_diagnostics(&self, servers: &[Server]) -> (Vec<InstanceDiagnostics>, usize) {
        let mut fetches = FuturesUnordered::new();
        for server in servers {
            fetches.push(async move {
                // the semaphore is never closed
                let _permit = self.semaphore.acquire().await.ok();
                (server, self.api.server_diagnostics(&server.id).await)
            });
        }

        let mut diagnostics = Vec::with_capacity(servers.len());
        let mut skipped = 0;
        while let Some((server, result)) = fetches.next().await {
            match result {
                Ok(record) => diagnostics.push(InstanceDiagnostics {
                    identity: server.into(),
                    observations: classify(&record),
                }),
                Err(e) => {
                    skipped += 1;
                    warn!(
                        "Skipping diagnostics of server {} ({}): {e}",
                        server.id, server.name
                    );
                }
            }
        }

        diagnostics.sort_by(|a, b| a.identity.id.cmp(&b.identity.id));
        (diagnostics, skipped)
    }

    async fn collect_limits(&self) -> Result<SampleSet> {
        let projects = self.api.list_projects().await?;
        let mut limits = Vec::with_capacity(projects.len());
        for project in projects {
            let absolute = self.api.project_limits(&project.id).await?;
            limits.push((project, absolute));
        }

        let mut samples = SampleSet::new();
        LimitsMetricExporter::new(&limits).export_samples(&mut samples);
        Ok(samples)
    }
}
