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
use crate::nova::models::Hypervisor;
use crate::topology::Topology;
use crate::utils::units::{gigabytes_to_bytes, megabytes_to_bytes};

/// Capacity of every hypervisor, labeled with the zone and aggregates of
/// its compute service host.
pub struct HypervisorMetricExporter<'a> {
    pub hypervisors: &'a [Hypervisor],
    pub topology: &'a Topology,
}

impl<'a> HypervisorMetricExporter<'a> {
    pub fn new(hypervisors: &'a [Hypervisor], topology: &'a Topology) -> Self {
        Self {
            hypervisors,
            topology,
        }
    }

    fn export_hypervisor(&self, samples: &mut SampleSet, hypervisor: &Hypervisor) {
        // aggregates list service hosts, not hypervisor hostnames
        let host = hypervisor.service.host.as_str();
        let labels = [
            hypervisor.hypervisor_hostname.clone(),
            self.topology.zone_of(host).unwrap_or_default().to_string(),
            self.topology.aggregate_names_of(host),
        ];

        let values = [
            (MetricFamily::RunningVms, hypervisor.running_vms),
            (MetricFamily::CurrentWorkload, hypervisor.current_workload),
            (MetricFamily::VcpusAvailable, hypervisor.vcpus),
            (MetricFamily::VcpusUsed, hypervisor.vcpus_used),
            (
                MetricFamily::MemoryAvailableBytes,
                megabytes_to_bytes(hypervisor.memory_mb),
            ),
            (
                MetricFamily::MemoryUsedBytes,
                megabytes_to_bytes(hypervisor.memory_mb_used),
            ),
            (
                MetricFamily::LocalStorageAvailableBytes,
                gigabytes_to_bytes(hypervisor.local_gb),
            ),
            (
                MetricFamily::LocalStorageUsedBytes,
                gigabytes_to_bytes(hypervisor.local_gb_used),
            ),
        ];

        for (family, value) in values {
            samples.push(family, labels.iter().cloned(), value as f64);
        }
    }
}

impl<'a> MetricExporter for HypervisorMetricExporter<'a> {
    fn export_samples(&self, samples: &mut SampleSet) {
        for hypervisor in self.hypervisors {
            self.export_hypervisor(samples, hypervisor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nova::models::{Aggregate, HypervisorService};
    use std::collections::HashMap;

    fn hypervisor(hostname: &str, host: &str) -> Hypervisor {
        Hypervisor {
            id: "1".to_string(),
            hypervisor_hostname: hostname.to_string(),
            running_vms: 3,
            current_workload: 0,
            vcpus: 32,
            vcpus_used: 6,
            memory_mb: 1,
            memory_mb_used: 2,
            local_gb: 1,
            local_gb_used: 0,
            service: HypervisorService {
                host: host.to_string(),
            },
        }
    }

    #[test]
    fn test_labels_come_from_service_host() {
        let topology = Topology::build(&[
            Aggregate {
                name: "az-agg".to_string(),
                availability_zone: Some("az1".to_string()),
                metadata: HashMap::from([(
                    "availability_zone".to_string(),
                    "az1".to_string(),
                )]),
                hosts: vec!["compute-01".to_string()],
            },
            Aggregate {
                name: "gpu".to_string(),
                availability_zone: None,
                metadata: HashMap::from([("gpu".to_string(), "true".to_string())]),
                hosts: vec!["compute-01".to_string()],
            },
        ]);
        let hypervisors = [hypervisor("compute-01.example", "compute-01")];
        let mut samples = SampleSet::new();
        HypervisorMetricExporter::new(&hypervisors, &topology).export_samples(&mut samples);

        assert_eq!(samples.len(), 8);
        let running = &samples.get(MetricFamily::RunningVms)[0];
        assert_eq!(
            running.label_values,
            vec!["compute-01.example", "az1", "gpu"]
        );
        assert_eq!(running.value, 3.0);
    }

    #[test]
    fn test_capacity_is_converted_to_bytes() {
        let topology = Topology::default();
        let hypervisors = [hypervisor("h", "h")];
        let mut samples = SampleSet::new();
        HypervisorMetricExporter::new(&hypervisors, &topology).export_samples(&mut samples);

        assert_eq!(
            samples.get(MetricFamily::MemoryAvailableBytes)[0].value,
            1_048_576.0
        );
        assert_eq!(
            samples.get(MetricFamily::MemoryUsedBytes)[0].value,
            2_097_152.0
        );
        assert_eq!(
            samples.get(MetricFamily::LocalStorageAvailableBytes)[0].value,
            1_073_741_824.0
        );
        let unplaced = &samples.get(MetricFamily::VcpusUsed)[0];
        assert_eq!(unplaced.label_values, vec!["h", "", ""]);
    }
}
