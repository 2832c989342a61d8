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

use std::fmt;

/// The sub-resource kind a diagnostic category is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubResourceKind {
    Cpu,
    Disk,
    Nic,
}

impl SubResourceKind {
    /// Label name carried by samples of this kind.
    pub fn label(&self) -> &'static str {
        match self {
            SubResourceKind::Cpu => "cpu_id",
            SubResourceKind::Disk => "disk_id",
            SubResourceKind::Nic => "nic_id",
        }
    }
}

/// Every category a diagnostic key can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticCategory {
    CpuTime,
    MemoryActual,
    MemoryAvailable,
    MemoryLastUpdate,
    MemoryMajorFault,
    MemoryMinorFault,
    MemoryRss,
    MemorySwapIn,
    MemorySwapOut,
    MemoryUnused,
    MemoryUsable,
    MemorySelected,
    DiskReadBytes,
    DiskWriteBytes,
    DiskErrors,
    DiskReadRequests,
    DiskWriteRequests,
    NicRxPackets,
    NicRxDrop,
    NicRxErrors,
    NicRxRate,
    NicTxPackets,
    NicTxDrop,
    NicTxErrors,
    NicTxRate,
}

impl DiagnosticCategory {
    pub const ALL: [DiagnosticCategory; 25] = [
        DiagnosticCategory::CpuTime,
        DiagnosticCategory::MemoryActual,
        DiagnosticCategory::MemoryAvailable,
        DiagnosticCategory::MemoryLastUpdate,
        DiagnosticCategory::MemoryMajorFault,
        DiagnosticCategory::MemoryMinorFault,
        DiagnosticCategory::MemoryRss,
        DiagnosticCategory::MemorySwapIn,
        DiagnosticCategory::MemorySwapOut,
        DiagnosticCategory::MemoryUnused,
        DiagnosticCategory::MemoryUsable,
        DiagnosticCategory::MemorySelected,
        DiagnosticCategory::DiskReadBytes,
        DiagnosticCategory::DiskWriteBytes,
        DiagnosticCategory::DiskErrors,
        DiagnosticCategory::DiskReadRequests,
        DiagnosticCategory::DiskWriteRequests,
        DiagnosticCategory::NicRxPackets,
        DiagnosticCategory::NicRxDrop,
        DiagnosticCategory::NicRxErrors,
        DiagnosticCategory::NicRxRate,
        DiagnosticCategory::NicTxPackets,
        DiagnosticCategory::NicTxDrop,
        DiagnosticCategory::NicTxErrors,
        DiagnosticCategory::NicTxRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCategory::CpuTime => "cpu-time",
            DiagnosticCategory::MemoryActual => "memory-actual",
            DiagnosticCategory::MemoryAvailable => "memory-available",
            DiagnosticCategory::MemoryLastUpdate => "memory-last-update",
            DiagnosticCategory::MemoryMajorFault => "memory-major-fault",
            DiagnosticCategory::MemoryMinorFault => "memory-minor-fault",
            DiagnosticCategory::MemoryRss => "memory-rss",
            DiagnosticCategory::MemorySwapIn => "memory-swap-in",
            DiagnosticCategory::MemorySwapOut => "memory-swap-out",
            DiagnosticCategory::MemoryUnused => "memory-unused",
            DiagnosticCategory::MemoryUsable => "memory-usable",
            DiagnosticCategory::MemorySelected => "memory-selected",
            DiagnosticCategory::DiskReadBytes => "disk-read-bytes",
            DiagnosticCategory::DiskWriteBytes => "disk-write-bytes",
            DiagnosticCategory::DiskErrors => "disk-errors",
            DiagnosticCategory::DiskReadRequests => "disk-read-requests",
            DiagnosticCategory::DiskWriteRequests => "disk-write-requests",
            DiagnosticCategory::NicRxPackets => "nic-rx-packets",
            DiagnosticCategory::NicRxDrop => "nic-rx-drop",
            DiagnosticCategory::NicRxErrors => "nic-rx-errors",
            DiagnosticCategory::NicRxRate => "nic-rx-rate",
            DiagnosticCategory::NicTxPackets => "nic-tx-packets",
            DiagnosticCategory::NicTxDrop => "nic-tx-drop",
            DiagnosticCategory::NicTxErrors => "nic-tx-errors",
            DiagnosticCategory::NicTxRate => "nic-tx-rate",
        }
    }

    /// The sub-resource this category is broken down by, if any.
    /// Memory categories describe the whole instance and carry none.
    pub fn sub_resource_kind(&self) -> Option<SubResourceKind> {
        use DiagnosticCategory::*;
        match self {
            CpuTime => Some(SubResourceKind::Cpu),
            DiskReadBytes | DiskWriteBytes | DiskErrors | DiskReadRequests
            | DiskWriteRequests => Some(SubResourceKind::Disk),
            NicRxPackets | NicRxDrop | NicRxErrors | NicRxRate | NicTxPackets | NicTxDrop
            | NicTxErrors | NicTxRate => Some(SubResourceKind::Nic),
            _ => None,
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
