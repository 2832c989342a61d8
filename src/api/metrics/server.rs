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

use super::{MetricExporter, MetricFamily, SampleSet};
use crate::diagnostics::{ClassifiedObservation, InstanceIdentity};
use crate::nova::models::Server;

/// Nova server states. `server_status` exports a state's position in this
/// list, so the order is part of the metric's meaning.
pub const SERVER_STATUSES: [&str; 21] = [
    "ACTIVE",
    "BUILD",
    "BUILD(spawning)",
    "DELETED",
    "ERROR",
    "HARD_REBOOT",
    "PASSWORD",
    "REBOOT",
    "REBUILD",
    "RESCUE",
    "RESIZE",
    "SHUTOFF",
    "SUSPENDED",
    "UNKNOWN",
    "VERIFY_RESIZE",
    "MIGRATING",
    "PAUSED",
    "REVERT_RESIZE",
    "SHELVED",
    "SHELVED_OFFLOADED",
    "SOFT_DELETED",
];

/// Position of `status` in [`SERVER_STATUSES`], -1 when it is not listed.
pub fn server_status_index(status: &str) -> i64 {
    SERVER_STATUSES
        .iter()
        .position(|known| *known == status)
        .map_or(-1, |idx| idx as i64)
}

/// Classified diagnostics of one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDiagnostics {
    pub identity: InstanceIdentity,
    pub observations: Vec<ClassifiedObservation>,
}

pub struct ServerMetricExporter<'a> {
    pub servers: &'a [Server],
    pub diagnostics: &'a [InstanceDiagnostics],
}

impl<'a> ServerMetricExporter<'a> {
    pub fn new(servers: &'a [Server], diagnostics: &'a [InstanceDiagnostics]) -> Self {
        Self {
            servers,
            diagnostics,
        }
    }

    fn export_status(&self, samples: &mut SampleSet, server: &Server) {
        samples.push(
            MetricFamily::ServerStatus,
            [
                server.id.clone(),
                server.status.clone(),
                server.name.clone(),
                server.tenant_id.clone(),
                server.user_id.clone(),
                server.access_ipv4.clone(),
                server.access_ipv6.clone(),
                server.host_id.clone(),
                server.id.clone(),
                server.availability_zone.clone(),
                server.flavor_id(),
            ],
            server_status_index(&server.status) as f64,
        );
    }

    fn export_diagnostics(&self, samples: &mut SampleSet, instance: &InstanceDiagnostics) {
        let identity = instance.identity.label_values();

        for observation in &instance.observations {
            let mut labels: Vec<&str> = identity.to_vec();
            if observation.category.sub_resource_kind().is_some() {
                labels.push(observation.sub_resource.as_deref().unwrap_or_default());
            }
            samples.push(observation.category.into(), labels, observation.value);
        }
    }
}

impl<'a> MetricExporter for ServerMetricExporter<'a> {
    fn export_samples(&self, samples: &mut SampleSet) {
        for server in self.servers {
            self.export_status(samples, server);
        }
        for instance in self.diagnostics {
            self.export_diagnostics(samples, instance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCategory;
    use serde_json::json;

    #[test]
    fn test_server_status_index() {
        assert_eq!(server_status_index("ACTIVE"), 0);
        assert_eq!(server_status_index("SHUTOFF"), 11);
        assert_eq!(server_status_index("SOFT_DELETED"), 20);
        assert_eq!(server_status_index("active"), -1);
        assert_eq!(server_status_index(""), -1);
    }

    #[test]
    fn test_server_status_labels() {
        let server: Server = serde_json::from_value(json!({
            "id": "abc",
            "name": "web-1",
            "status": "ERROR",
            "tenant_id": "t1",
            "user_id": "u1",
            "OS-EXT-AZ:availability_zone": "az1",
            "flavor": {"id": "42"}
        }))
        .unwrap();
        let servers = [server];
        let mut samples = SampleSet::new();
        ServerMetricExporter::new(&servers, &[]).export_samples(&mut samples);

        let status = &samples.get(MetricFamily::ServerStatus)[0];
        assert_eq!(status.value, 4.0);
        assert_eq!(
            status.label_values,
            vec!["abc", "ERROR", "web-1", "t1", "u1", "", "", "", "abc", "az1", "42"]
        );
    }

    #[test]
    fn test_diagnostics_carry_identity_and_sub_resource() {
        let diagnostics = [InstanceDiagnostics {
            identity: InstanceIdentity {
                id: "abc".to_string(),
                status: "ACTIVE".to_string(),
                name: "web-1".to_string(),
                tenant_id: "t1".to_string(),
                hypervisor: "compute-01".to_string(),
            },
            observations: vec![
                ClassifiedObservation {
                    category: DiagnosticCategory::DiskReadRequests,
                    sub_resource: Some("vda".to_string()),
                    value: 10778.0,
                },
                ClassifiedObservation {
                    category: DiagnosticCategory::MemorySwapIn,
                    sub_resource: None,
                    value: 0.0,
                },
            ],
        }];
        let mut samples = SampleSet::new();
        ServerMetricExporter::new(&[], &diagnostics).export_samples(&mut samples);

        let disk = &samples.get(DiagnosticCategory::DiskReadRequests.into())[0];
        assert_eq!(
            disk.label_values,
            vec!["abc", "ACTIVE", "web-1", "t1", "compute-01", "vda"]
        );
        let swap = &samples.get(DiagnosticCategory::MemorySwapIn.into())[0];
        assert_eq!(swap.label_values.len(), 5);
        assert!(samples.get(MetricFamily::ServerStatus).is_empty());
    }
}
