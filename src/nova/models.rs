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

//! Records returned by the compute and identity APIs.
//!
//! Only the fields the exporter reads are modeled. Newer microversions drop
//! some hypervisor statistics, so numeric fields default to zero.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts ids that are either JSON strings or integers (`os-services`
/// switched from integer ids to UUIDs in microversion 2.53).
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// `null` and absent both become the type's default.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub rel: String,
    #[serde(default)]
    pub href: String,
}

/// A list response that may be cut at the API's `max_limit` and point at
/// the rest through a `next` link.
pub trait Paginated {
    type Item;

    fn into_page(self) -> (Vec<Self::Item>, Vec<Link>);
}

/// The `href` of the `next` link, if any.
pub fn next_link(links: &[Link]) -> Option<&str> {
    links
        .iter()
        .find(|link| link.rel == "next")
        .map(|link| link.href.as_str())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Server {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_default")]
    pub tenant_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub user_id: String,
    #[serde(rename = "accessIPv4", default, deserialize_with = "null_default")]
    pub access_ipv4: String,
    #[serde(rename = "accessIPv6", default, deserialize_with = "null_default")]
    pub access_ipv6: String,
    #[serde(rename = "hostId", default, deserialize_with = "null_default")]
    pub host_id: String,
    #[serde(
        rename = "OS-EXT-AZ:availability_zone",
        default,
        deserialize_with = "null_default"
    )]
    pub availability_zone: String,
    #[serde(rename = "OS-EXT-SRV-ATTR:hypervisor_hostname", default)]
    pub hypervisor_hostname: Option<String>,
    #[serde(default)]
    pub flavor: Value,
}

impl Server {
    /// Flavor id as embedded in the server record. Microversion 2.47 and
    /// later embed the flavor body without an id, which yields "".
    pub fn flavor_id(&self) -> String {
        match self.flavor.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerList {
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub servers_links: Vec<Link>,
}

impl Paginated for ServerList {
    type Item = Server;

    fn into_page(self) -> (Vec<Server>, Vec<Link>) {
        (self.servers, self.servers_links)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HypervisorService {
    #[serde(default, deserialize_with = "null_default")]
    pub host: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hypervisor {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub hypervisor_hostname: String,
    #[serde(default, deserialize_with = "null_default")]
    pub running_vms: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub current_workload: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub vcpus: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub vcpus_used: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub memory_mb: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub memory_mb_used: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub local_gb: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub local_gb_used: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub service: HypervisorService,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HypervisorList {
    #[serde(default)]
    pub hypervisors: Vec<Hypervisor>,
    #[serde(default)]
    pub hypervisors_links: Vec<Link>,
}

impl Paginated for HypervisorList {
    type Item = Hypervisor;

    fn into_page(self) -> (Vec<Hypervisor>, Vec<Link>) {
        (self.hypervisors, self.hypervisors_links)
    }
}

/// A host aggregate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Aggregate {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default)]
    pub availability_zone: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub metadata: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_default")]
    pub hosts: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregateList {
    #[serde(default)]
    pub aggregates: Vec<Aggregate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Flavor {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlavorList {
    #[serde(default)]
    pub flavors: Vec<Flavor>,
    #[serde(default)]
    pub flavors_links: Vec<Link>,
}

impl Paginated for FlavorList {
    type Item = Flavor;

    fn into_page(self) -> (Vec<Flavor>, Vec<Link>) {
        (self.flavors, self.flavors_links)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityZone {
    #[serde(rename = "zoneName", default)]
    pub zone_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityZoneList {
    #[serde(rename = "availabilityZoneInfo", default)]
    pub availability_zone_info: Vec<AvailabilityZone>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityGroup {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityGroupList {
    #[serde(default)]
    pub security_groups: Vec<SecurityGroup>,
}

/// A compute service (nova-compute, nova-scheduler, ...) and its state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComputeService {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub binary: String,
    #[serde(default, deserialize_with = "null_default")]
    pub host: String,
    #[serde(default, deserialize_with = "null_default")]
    pub zone: String,
    /// Administrative state: `enabled` or `disabled`.
    #[serde(default, deserialize_with = "null_default")]
    pub status: String,
    /// Liveness: `up` or `down`.
    #[serde(default, deserialize_with = "null_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_default")]
    pub disabled_reason: String,
}

impl ComputeService {
    pub fn is_up(&self) -> bool {
        self.state == "up"
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComputeServiceList {
    #[serde(default)]
    pub services: Vec<ComputeService>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectList {
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsoluteLimits {
    #[serde(default)]
    pub max_total_cores: i64,
    #[serde(default)]
    pub total_cores_used: i64,
    #[serde(rename = "maxTotalRAMSize", default)]
    pub max_total_ram_size: i64,
    #[serde(rename = "totalRAMUsed", default)]
    pub total_ram_used: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Limits {
    #[serde(default)]
    pub absolute: AbsoluteLimits,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitsResponse {
    #[serde(default)]
    pub limits: Limits,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_extension_fields() {
        let server: Server = serde_json::from_value(json!({
            "id": "8ad0f3b2",
            "name": "web-1",
            "status": "ACTIVE",
            "tenant_id": "t1",
            "user_id": "u1",
            "accessIPv4": "",
            "accessIPv6": null,
            "hostId": "h-hash",
            "OS-EXT-AZ:availability_zone": "nova",
            "OS-EXT-SRV-ATTR:hypervisor_hostname": "compute-01.example",
            "flavor": {"id": "m1.small", "links": []}
        }))
        .unwrap();

        assert_eq!(server.availability_zone, "nova");
        assert_eq!(
            server.hypervisor_hostname.as_deref(),
            Some("compute-01.example")
        );
        assert_eq!(server.access_ipv6, "");
        assert_eq!(server.flavor_id(), "m1.small");
    }

    #[test]
    fn test_flavor_id_missing_in_newer_microversions() {
        let server: Server = serde_json::from_value(json!({
            "id": "x",
            "flavor": {"original_name": "m1.small", "vcpus": 1}
        }))
        .unwrap();
        assert_eq!(server.flavor_id(), "");
    }

    #[test]
    fn test_hypervisor_defaults_missing_statistics() {
        let hypervisor: Hypervisor = serde_json::from_value(json!({
            "id": "b1e43b5f-eec1-44e0-9f10-7b4945c0226d",
            "hypervisor_hostname": "compute-01",
            "service": {"host": "compute-01", "id": 7}
        }))
        .unwrap();
        assert_eq!(hypervisor.memory_mb, 0);
        assert_eq!(hypervisor.service.host, "compute-01");
    }

    #[test]
    fn test_aggregate_null_zone_and_metadata() {
        let aggregate: Aggregate = serde_json::from_value(json!({
            "name": "pool-a",
            "availability_zone": null,
            "metadata": null,
            "hosts": ["h1"]
        }))
        .unwrap();
        assert_eq!(aggregate.availability_zone, None);
        assert!(aggregate.metadata.is_empty());
    }

    #[test]
    fn test_service_integer_id() {
        let service: ComputeService = serde_json::from_value(json!({
            "id": 4,
            "binary": "nova-compute",
            "host": "compute-01",
            "zone": "nova",
            "status": "enabled",
            "state": "up",
            "disabled_reason": null
        }))
        .unwrap();
        assert_eq!(service.id, "4");
        assert!(service.is_up());
        assert_eq!(service.disabled_reason, "");
    }

    #[test]
    fn test_limits_response() {
        let limits: LimitsResponse = serde_json::from_value(json!({
            "limits": {"absolute": {
                "maxTotalCores": 20, "totalCoresUsed": 4,
                "maxTotalRAMSize": 51200, "totalRAMUsed": 8192
            }, "rate": []}
        }))
        .unwrap();
        assert_eq!(limits.limits.absolute.max_total_cores, 20);
        assert_eq!(limits.limits.absolute.total_ram_used, 8192);
    }

    #[test]
    fn test_hypervisor_and_flavor_pages_carry_links() {
        let hypervisors: HypervisorList = serde_json::from_value(json!({
            "hypervisors": [{"id": 1, "hypervisor_hostname": "h1"}],
            "hypervisors_links": [
                {"rel": "next", "href": "https://nova.example/os-hypervisors/detail?marker=1"}
            ]
        }))
        .unwrap();
        let (items, links) = hypervisors.into_page();
        assert_eq!(items.len(), 1);
        assert_eq!(
            next_link(&links),
            Some("https://nova.example/os-hypervisors/detail?marker=1")
        );

        let flavors: FlavorList =
            serde_json::from_value(json!({"flavors": [{"id": "1", "name": "m1.tiny"}]})).unwrap();
        let (items, links) = flavors.into_page();
        assert_eq!(items.len(), 1);
        assert_eq!(next_link(&links), None);
    }
}
