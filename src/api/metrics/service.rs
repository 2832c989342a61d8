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
use crate::nova::models::ComputeService;

/// `agent_state`: 1 for a service reported up, 0 otherwise.
pub struct ServiceMetricExporter<'a> {
    pub services: &'a [ComputeService],
}

impl<'a> ServiceMetricExporter<'a> {
    pub fn new(services: &'a [ComputeService]) -> Self {
        Self { services }
    }
}

impl<'a> MetricExporter for ServiceMetricExporter<'a> {
    fn export_samples(&self, samples: &mut SampleSet) {
        for service in self.services {
            let state = if service.is_up() { 1.0 } else { 0.0 };
            samples.push(
                MetricFamily::AgentState,
                [
                    service.id.as_str(),
                    service.host.as_str(),
                    service.binary.as_str(),
                    service.status.as_str(),
                    service.zone.as_str(),
                    service.disabled_reason.as_str(),
                ],
                state,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_state() {
        let services = vec![
            ComputeService {
                id: "4".to_string(),
                binary: "nova-compute".to_string(),
                host: "compute-01".to_string(),
                zone: "nova".to_string(),
                status: "enabled".to_string(),
                state: "up".to_string(),
                disabled_reason: String::new(),
            },
            ComputeService {
                id: "5".to_string(),
                binary: "nova-compute".to_string(),
                host: "compute-02".to_string(),
                zone: "nova".to_string(),
                status: "disabled".to_string(),
                state: "down".to_string(),
                disabled_reason: "maintenance".to_string(),
            },
        ];
        let mut samples = SampleSet::new();
        ServiceMetricExporter::new(&services).export_samples(&mut samples);

        let states = samples.get(MetricFamily::AgentState);
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].value, 1.0);
        assert_eq!(states[1].value, 0.0);
        assert_eq!(
            states[1].label_values,
            vec![
                "5",
                "compute-02",
                "nova-compute",
                "disabled",
                "nova",
                "maintenance"
            ]
        );
    }
}
