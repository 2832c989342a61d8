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

//! Host to availability-zone and host to aggregate lookups.
//!
//! Built once per poll cycle from the full aggregate list and only read
//! afterwards, so a `Topology` can be shared between tasks behind an `Arc`.

use std::collections::HashMap;

use crate::nova::models::Aggregate;

const AVAILABILITY_ZONE_KEY: &str = "availability_zone";

/// True when the aggregate exists only to place its hosts in a zone: its
/// metadata holds exactly one entry, the availability zone key.
pub fn is_zone_only(aggregate: &Aggregate) -> bool {
    aggregate.metadata.len() == 1 && aggregate.metadata.contains_key(AVAILABILITY_ZONE_KEY)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    zones: HashMap<String, String>,
    aggregates: HashMap<String, Vec<String>>,
}

impl Topology {
    /// Join aggregates into per-host lookups.
    ///
    /// A later aggregate overrides the zone an earlier one assigned to the
    /// same host. Zone-only aggregates contribute a zone but no name.
    pub fn build(aggregates: &[Aggregate]) -> Self {
        let mut zones = HashMap::new();
        let mut names: HashMap<String, Vec<String>> = HashMap::new();

        for aggregate in aggregates {
            let zone_only = is_zone_only(aggregate);
            let zone = aggregate
                .availability_zone
                .as_deref()
                .filter(|zone| !zone.is_empty());

            for host in &aggregate.hosts {
                if let Some(zone) = zone {
                    zones.insert(host.clone(), zone.to_string());
                }
                if !zone_only {
                    names
                        .entry(host.clone())
                        .or_default()
                        .push(aggregate.name.clone());
                }
            }
        }

        for list in names.values_mut() {
            list.sort();
        }

        Self {
            zones,
            aggregates: names,
        }
    }

    /// Availability zone of a host, if any aggregate assigns one.
    pub fn zone_of(&self, host: &str) -> Option<&str> {
        self.zones.get(host).map(String::as_str)
    }

    /// Names of the aggregates a host belongs to, sorted and comma-joined.
    /// Empty for a host outside every named aggregate.
    pub fn aggregate_names_of(&self, host: &str) -> String {
        self.aggregates
            .get(host)
            .map(|names| names.join(","))
            .unwrap_or_default()
    }

    pub fn host_count(&self) -> usize {
        let mut hosts: Vec<&String> = self.zones.keys().chain(self.aggregates.keys()).collect();
        hosts.sort();
        hosts.dedup();
        hosts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(
        name: &str,
        zone: Option<&str>,
        metadata: &[(&str, &str)],
        hosts: &[&str],
    ) -> Aggregate {
        Aggregate {
            name: name.to_string(),
            availability_zone: zone.map(str::to_string),
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
        }
    }

    #[test]
    fn test_zone_only_detection() {
        assert!(is_zone_only(&aggregate(
            "az1",
            Some("az1"),
            &[("availability_zone", "az1")],
            &[]
        )));
        assert!(!is_zone_only(&aggregate(
            "pool",
            Some("az1"),
            &[("availability_zone", "az1"), ("ssd", "true")],
            &[]
        )));
        assert!(!is_zone_only(&aggregate("pool", None, &[], &[])));
        assert!(!is_zone_only(&aggregate("pool", None, &[("foo", "bar")], &[])));
    }

    #[test]
    fn test_zone_only_aggregate_sets_zone_without_name() {
        let topology = Topology::build(&[aggregate(
            "az1",
            Some("az1"),
            &[("availability_zone", "az1")],
            &["h1", "h2"],
        )]);
        assert_eq!(topology.zone_of("h1"), Some("az1"));
        assert_eq!(topology.zone_of("h2"), Some("az1"));
        assert_eq!(topology.aggregate_names_of("h1"), "");
    }

    #[test]
    fn test_names_are_sorted_and_joined() {
        let topology = Topology::build(&[
            aggregate("pool-b", None, &[("foo", "bar")], &["h1"]),
            aggregate("pool-a", None, &[("foo", "bar")], &["h1", "h2"]),
        ]);
        assert_eq!(topology.aggregate_names_of("h1"), "pool-a,pool-b");
        assert_eq!(topology.aggregate_names_of("h2"), "pool-a");
        assert_eq!(topology.aggregate_names_of("unknown"), "");
        assert_eq!(topology.zone_of("h1"), None);
    }

    #[test]
    fn test_last_zone_wins() {
        let topology = Topology::build(&[
            aggregate("a", Some("az1"), &[("availability_zone", "az1")], &["h1"]),
            aggregate("b", Some("az2"), &[("availability_zone", "az2")], &["h1"]),
        ]);
        assert_eq!(topology.zone_of("h1"), Some("az2"));
    }

    #[test]
    fn test_empty_zone_does_not_override() {
        let topology = Topology::build(&[
            aggregate("a", Some("az1"), &[("availability_zone", "az1")], &["h1"]),
            aggregate("b", Some(""), &[("gpu", "true")], &["h1"]),
        ]);
        assert_eq!(topology.zone_of("h1"), Some("az1"));
        assert_eq!(topology.aggregate_names_of("h1"), "b");
    }

    #[test]
    fn test_duplicate_host_entries_are_kept() {
        let topology = Topology::build(&[aggregate("pool", None, &[], &["h1", "h1"])]);
        assert_eq!(topology.aggregate_names_of("h1"), "pool,pool");
    }

    #[test]
    fn test_rebuild_is_identical() {
        let input = vec![
            aggregate("z", Some("az1"), &[("availability_zone", "az1")], &["h1", "h3"]),
            aggregate("pool-c", None, &[("x", "y")], &["h1"]),
            aggregate("pool-a", Some("az2"), &[("x", "y")], &["h1", "h2"]),
        ];
        let first = Topology::build(&input);
        let second = Topology::build(&input);
        assert_eq!(first, second);
        assert_eq!(first.aggregate_names_of("h1"), "pool-a,pool-c");
        assert_eq!(first.zone_of("h1"), Some("az2"));
        assert_eq!(first.host_count(), 3);
    }
}
