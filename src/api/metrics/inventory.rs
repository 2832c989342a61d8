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

/// Unlabeled object counts. A count that could not be fetched is `None` and
/// produces no sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryMetricExporter {
    pub flavors: Option<usize>,
    pub availability_zones: Option<usize>,
    pub security_groups: Option<usize>,
    pub total_vms: Option<usize>,
}

impl MetricExporter for InventoryMetricExporter {
    fn export_samples(&self, samples: &mut SampleSet) {
        let counts = [
            (MetricFamily::Flavors, self.flavors),
            (MetricFamily::AvailabilityZones, self.availability_zones),
            (MetricFamily::SecurityGroups, self.security_groups),
            (MetricFamily::TotalVms, self.total_vms),
        ];

        for (family, count) in counts {
            if let Some(count) = count {
                samples.push(family, Vec::<String>::new(), count as f64);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_counts_are_skipped() {
        let exporter = InventoryMetricExporter {
            flavors: Some(7),
            total_vms: Some(0),
            ..Default::default()
        };
        let mut samples = SampleSet::new();
        exporter.export_samples(&mut samples);

        assert_eq!(samples.len(), 2);
        assert_eq!(samples.get(MetricFamily::Flavors)[0].value, 7.0);
        assert_eq!(samples.get(MetricFamily::TotalVms)[0].value, 0.0);
        assert!(samples.get(MetricFamily::SecurityGroups).is_empty());
    }
}
