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

//! Metric registry
//!
//! Every exported family is declared here once: its name suffix, help text
//! and label names. The registry is built at startup from the configured
//! prefix and disabled list, then handed to whoever renders samples. There
//! is no global lookup by name.

use std::collections::{BTreeMap, HashSet};

use crate::diagnostics::{DiagnosticCategory, InstanceIdentity};

const HYPERVISOR_LABELS: &[&str] = &["hostname", "availability_zone", "aggregates"];
const LIMIT_LABELS: &[&str] = &["tenant", "tenant_id"];
const AGENT_LABELS: &[&str] = &[
    "id",
    "hostname",
    "service",
    "adminState",
    "zone",
    "disabledReason",
];
const SERVER_STATUS_LABELS: &[&str] = &[
    "id",
    "status",
    "name",
    "tenant_id",
    "user_id",
    "address_ipv4",
    "address_ipv6",
    "host_id",
    "uuid",
    "availability_zone",
    "flavor_id",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricFamily {
    Up,
    ScrapeDurationSeconds,
    SkippedInstances,
    Flavors,
    AvailabilityZones,
    SecurityGroups,
    TotalVms,
    AgentState,
    RunningVms,
    CurrentWorkload,
    VcpusAvailable,
    VcpusUsed,
    MemoryAvailableBytes,
    MemoryUsedBytes,
    LocalStorageAvailableBytes,
    LocalStorageUsedBytes,
    ServerStatus,
    Diagnostic(DiagnosticCategory),
    LimitsVcpusMax,
    LimitsVcpusUsed,
    LimitsMemoryMax,
    LimitsMemoryUsed,
}

impl From<DiagnosticCategory> for MetricFamily {
    fn from(category: DiagnosticCategory) -> Self {
        MetricFamily::Diagnostic(category)
    }
}

impl MetricFamily {
    pub const SELF: [MetricFamily; 3] = [
        MetricFamily::Up,
        MetricFamily::ScrapeDurationSeconds,
        MetricFamily::SkippedInstances,
    ];

    pub const HYPERVISOR: [MetricFamily; 8] = [
        MetricFamily::RunningVms,
        MetricFamily::CurrentWorkload,
        MetricFamily::VcpusAvailable,
        MetricFamily::VcpusUsed,
        MetricFamily::MemoryAvailableBytes,
        MetricFamily::MemoryUsedBytes,
        MetricFamily::LocalStorageAvailableBytes,
        MetricFamily::LocalStorageUsedBytes,
    ];

    pub const LIMITS: [MetricFamily; 4] = [
        MetricFamily::LimitsVcpusMax,
        MetricFamily::LimitsVcpusUsed,
        MetricFamily::LimitsMemoryMax,
        MetricFamily::LimitsMemoryUsed,
    ];

    /// Every family in rendering order.
    pub fn all() -> Vec<MetricFamily> {
        let mut families = Self::SELF.to_vec();
        families.extend([
            MetricFamily::Flavors,
            MetricFamily::AvailabilityZones,
            MetricFamily::SecurityGroups,
            MetricFamily::TotalVms,
            MetricFamily::AgentState,
        ]);
        families.extend(Self::HYPERVISOR);
        families.push(MetricFamily::ServerStatus);
        families.extend(Self::diagnostics());
        families.extend(Self::LIMITS);
        families
    }

    pub fn diagnostics() -> impl Iterator<Item = MetricFamily> {
        DiagnosticCategory::ALL.into_iter().map(MetricFamily::from)
    }

    /// Name without the configured prefix.
    pub fn suffix(&self) -> &'static str {
        use DiagnosticCategory as D;
        match self {
            MetricFamily::Up => "up",
            MetricFamily::ScrapeDurationSeconds => "scrape_duration_seconds",
            MetricFamily::SkippedInstances => "skipped_instances",
            MetricFamily::Flavors => "flavors",
            MetricFamily::AvailabilityZones => "availability_zones",
            MetricFamily::SecurityGroups => "security_groups",
            MetricFamily::TotalVms => "total_vms",
            MetricFamily::AgentState => "agent_state",
            MetricFamily::RunningVms => "running_vms",
            MetricFamily::CurrentWorkload => "current_workload",
            MetricFamily::VcpusAvailable => "vcpus_available",
            MetricFamily::VcpusUsed => "vcpus_used",
            MetricFamily::MemoryAvailableBytes => "memory_available_bytes",
            MetricFamily::MemoryUsedBytes => "memory_used_bytes",
            MetricFamily::LocalStorageAvailableBytes => "local_storage_available_bytes",
            MetricFamily::LocalStorageUsedBytes => "local_storage_used_bytes",
            MetricFamily::ServerStatus => "server_status",
            MetricFamily::Diagnostic(category) => match category {
                D::CpuTime => "server_diagnostics_cpu_details_time",
                D::MemoryActual => "server_diagnostics_memory_actual_kb",
                D::MemoryAvailable => "server_diagnostics_memory_available_kb",
                D::MemoryLastUpdate => "server_diagnostics_memory_last_update_time",
                D::MemoryMajorFault => "server_diagnostics_memory_major_fault",
                D::MemoryMinorFault => "server_diagnostics_memory_minor_fault",
                D::MemoryRss => "server_diagnostics_memory_rss",
                D::MemorySwapIn => "server_diagnostics_memory_swap_in",
                D::MemorySwapOut => "server_diagnostics_memory_swap_out",
                D::MemoryUnused => "server_diagnostics_memory_unused_kb",
                D::MemoryUsable => "server_diagnostics_memory_usable_kb",
                D::MemorySelected => "server_diagnostics_memory_selected_kb",
                D::DiskReadBytes => "server_diagnostics_disk_details_read_bytes",
                D::DiskWriteBytes => "server_diagnostics_disk_details_write_bytes",
                D::DiskErrors => "server_diagnostics_disk_details_errors_count",
                D::DiskReadRequests => "server_diagnostics_disk_details_read_requests",
                D::DiskWriteRequests => "server_diagnostics_disk_details_write_requests",
                D::NicRxPackets => "server_diagnostics_nic_details_rx_packets",
                D::NicRxDrop => "server_diagnostics_nic_details_rx_drop",
                D::NicRxErrors => "server_diagnostics_nic_details_rx_errors",
                D::NicRxRate => "server_diagnostics_nic_details_rx_rate",
                D::NicTxPackets => "server_diagnostics_nic_details_tx_packets",
                D::NicTxDrop => "server_diagnostics_nic_details_tx_drop",
                D::NicTxErrors => "server_diagnostics_nic_details_tx_errors",
                D::NicTxRate => "server_diagnostics_nic_details_tx_rate",
            },
            MetricFamily::LimitsVcpusMax => "limits_vcpus_max",
            MetricFamily::LimitsVcpusUsed => "limits_vcpus_used",
            MetricFamily::LimitsMemoryMax => "limits_memory_max",
            MetricFamily::LimitsMemoryUsed => "limits_memory_used",
        }
    }

    pub fn help(&self) -> &'static str {
        use DiagnosticCategory as D;
        match self {
            MetricFamily::Up => "Whether every enabled metric family was collected in the last poll",
            MetricFamily::ScrapeDurationSeconds => "Duration of the last poll cycle in seconds",
            MetricFamily::SkippedInstances => {
                "Instances whose diagnostics could not be fetched in the last poll"
            }
            MetricFamily::Flavors => "Number of flavors",
            MetricFamily::AvailabilityZones => "Number of availability zones",
            MetricFamily::SecurityGroups => "Number of security groups",
            MetricFamily::TotalVms => "Number of servers across all tenants",
            MetricFamily::AgentState => "Compute service liveness (1 = up)",
            MetricFamily::RunningVms => "Servers running on the hypervisor",
            MetricFamily::CurrentWorkload => "Pending build, resize and migration tasks on the hypervisor",
            MetricFamily::VcpusAvailable => "Total vCPUs of the hypervisor",
            MetricFamily::VcpusUsed => "vCPUs allocated on the hypervisor",
            MetricFamily::MemoryAvailableBytes => "Total memory of the hypervisor in bytes",
            MetricFamily::MemoryUsedBytes => "Memory allocated on the hypervisor in bytes",
            MetricFamily::LocalStorageAvailableBytes => {
                "Total local storage of the hypervisor in bytes"
            }
            MetricFamily::LocalStorageUsedBytes => {
                "Local storage allocated on the hypervisor in bytes"
            }
            MetricFamily::ServerStatus => "Server status as an index into the Nova status list",
            MetricFamily::Diagnostic(category) => match category {
                D::CpuTime => "CPU time of a vCPU in nanoseconds",
                D::MemoryActual => "Memory currently assigned by the balloon driver in KiB",
                D::MemoryAvailable => "Memory available to the guest in KiB",
                D::MemoryLastUpdate => "Timestamp of the last guest memory statistics update",
                D::MemoryMajorFault => "Guest major page faults",
                D::MemoryMinorFault => "Guest minor page faults",
                D::MemoryRss => "Resident set size of the instance process in KiB",
                D::MemorySwapIn => "Memory swapped in by the guest",
                D::MemorySwapOut => "Memory swapped out by the guest",
                D::MemoryUnused => "Memory unused by the guest in KiB",
                D::MemoryUsable => "Memory usable by the guest without swapping in KiB",
                D::MemorySelected => "Configured instance memory in KiB",
                D::DiskReadBytes => "Bytes read from a disk",
                D::DiskWriteBytes => "Bytes written to a disk",
                D::DiskErrors => "Disk errors (-1 if unsupported)",
                D::DiskReadRequests => "Read requests issued to a disk",
                D::DiskWriteRequests => "Write requests issued to a disk",
                D::NicRxPackets => "Packets received on an interface",
                D::NicRxDrop => "Received packets dropped on an interface",
                D::NicRxErrors => "Receive errors on an interface",
                D::NicRxRate => "Bytes received on an interface",
                D::NicTxPackets => "Packets transmitted on an interface",
                D::NicTxDrop => "Transmitted packets dropped on an interface",
                D::NicTxErrors => "Transmit errors on an interface",
                D::NicTxRate => "Bytes transmitted on an interface",
            },
            MetricFamily::LimitsVcpusMax => "vCPU quota of the project",
            MetricFamily::LimitsVcpusUsed => "vCPUs used by the project",
            MetricFamily::LimitsMemoryMax => "Memory quota of the project in MB",
            MetricFamily::LimitsMemoryUsed => "Memory used by the project in MB",
        }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        match self {
            MetricFamily::Up
            | MetricFamily::ScrapeDurationSeconds
            | MetricFamily::SkippedInstances
            | MetricFamily::Flavors
            | MetricFamily::AvailabilityZones
            | MetricFamily::SecurityGroups
            | MetricFamily::TotalVms => Vec::new(),
            MetricFamily::AgentState => AGENT_LABELS.to_vec(),
            MetricFamily::ServerStatus => SERVER_STATUS_LABELS.to_vec(),
            MetricFamily::Diagnostic(category) => {
                let mut labels = InstanceIdentity::LABELS.to_vec();
                labels.extend(category.sub_resource_kind().map(|kind| kind.label()));
                labels
            }
            MetricFamily::LimitsVcpusMax
            | MetricFamily::LimitsVcpusUsed
            | MetricFamily::LimitsMemoryMax
            | MetricFamily::LimitsMemoryUsed => LIMIT_LABELS.to_vec(),
            _ => HYPERVISOR_LABELS.to_vec(),
        }
    }
}

/// A registered family with its fully prefixed name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub family: MetricFamily,
    pub name: String,
    pub help: &'static str,
    pub metric_type: &'static str,
    pub labels: Vec<&'static str>,
}

/// Explicit family to descriptor mapping, built once at startup.
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    prefix: String,
    descriptors: BTreeMap<MetricFamily, MetricDescriptor>,
}

impl MetricRegistry {
    /// Register every family except those named in `disabled`. Entries in
    /// `disabled` may be given with or without the prefix.
    pub fn new(prefix: &str, disabled: &HashSet<String>) -> Self {
        let descriptors = MetricFamily::all()
            .into_iter()
            .filter_map(|family| {
                let name = format!("{prefix}_{}", family.suffix());
                let is_disabled = disabled.contains(family.suffix()) || disabled.contains(&name);
                (!is_disabled).then(|| {
                    (
                        family,
                        MetricDescriptor {
                            family,
                            name,
                            help: family.help(),
                            metric_type: "gauge",
                            labels: family.labels(),
                        },
                    )
                })
            })
            .collect();

        Self {
            prefix: prefix.to_string(),
            descriptors,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn get(&self, family: MetricFamily) -> Option<&MetricDescriptor> {
        self.descriptors.get(&family)
    }

    pub fn is_enabled(&self, family: MetricFamily) -> bool {
        self.descriptors.contains_key(&family)
    }

    pub fn any_enabled(&self, families: impl IntoIterator<Item = MetricFamily>) -> bool {
        families.into_iter().any(|family| self.is_enabled(family))
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.descriptors.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// One line per enabled family: name, label names and help text.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for descriptor in self.descriptors() {
            out.push_str(&format!(
                "{} {{{}}} {}\n",
                descriptor.name,
                descriptor.labels.join(","),
                descriptor.help
            ));
        }
        out
    }

    /// Names in `disabled` that match no family, so typos can be reported.
    pub fn unknown_names<'a>(&self, disabled: &'a HashSet<String>) -> Vec<&'a str> {
        let mut unknown: Vec<&str> = disabled
            .iter()
            .filter(|name| {
                !MetricFamily::all().iter().any(|family| {
                    family.suffix() == name.as_str()
                        || format!("{}_{}", self.prefix, family.suffix()) == name.as_str()
                })
            })
            .map(String::as_str)
            .collect();
        unknown.sort();
        unknown
    }
}
