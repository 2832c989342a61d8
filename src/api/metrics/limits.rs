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
use crate::nova::models::{AbsoluteLimits, Project};

pub struct LimitsMetricExporter<'a> {
    pub limits: &'a [(Project, AbsoluteLimits)],
}

impl<'a> LimitsMetricExporter<'a> {
    pub fn new(limits: &'a [(Project, AbsoluteLimits)]) -> Self {
        Self { limits }
    }
}

impl<'a> MetricExporter for LimitsMetricExporter<'a> {
    fn export_samples(&self, samples: &mut SampleSet) {
        for (project, limits) in self.limits {
            let labels = [project.name.as_str(), project.id.as_str()];

            // memory limits are reported in MB, unconverted
            samples.push(
                MetricFamily::LimitsVcpusMax,
                labels,
                limits.max_total_cores as f64,
            );
            samples.push(
                MetricFamily::LimitsVcpusUsed,
                labels,
                limits.total_cores_used as f64,
            );
            samples.push(
                MetricFamily::LimitsMemoryMax,
                labels,
                limits.max_total_ram_size as f64,
            );
            samples.push(
                MetricFamily::LimitsMemoryUsed,
                labels,
                limits.total_ram_used as f64,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_per_project() {
        let limits = vec![(
            Project {
                id: "p1".to_string(),
                name: "demo".to_string(),
            },
            AbsoluteLimits {
                max_total_cores: 20,
                total_cores_used: 4,
                max_total_ram_size: 51200,
                total_ram_used: 8192,
            },
        )];
        let mut samples = SampleSet::new();
        LimitsMetricExporter::new(&limits).export_samples(&mut samples);

        assert_eq!(samples.len(), 4);
        let memory = &samples.get(MetricFamily::LimitsMemoryMax)[0];
        assert_eq!(memory.label_values, vec!["demo", "p1"]);
        assert_eq!(memory.value, 51200.0);
    }
}
