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

//! Classification of per-instance diagnostic records.
//!
//! Diagnostic keys are free text chosen by the hypervisor driver, e.g. for
//! libvirt:
//!
//! ```text
//! cpu0_time                  9.965e+10
//! memory-swap_in             0
//! tap3e417313-ff_tx_packets  15717
//! vda_read_req               10778
//! ```
//!
//! There is no schema, so keys are matched against an ordered list of
//! substring rules and the first rule whose predicate holds decides the
//! category. Keys no rule recognizes are dropped. This is a heuristic: a
//! network interface whose name contains `_tx` or `_rx` always wins over the
//! block-device prefixes, so an interface called `vd…` is read as a NIC.

use std::collections::HashMap;

use serde_json::Value;

use super::category::DiagnosticCategory;

/// One diagnostic record as returned by the compute API.
pub type DiagnosticRecord = HashMap<String, Value>;

/// A classified diagnostic value, ready to be labeled and emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedObservation {
    pub category: DiagnosticCategory,
    /// The cpu, disk or interface the value belongs to.
    pub sub_resource: Option<String>,
    pub value: f64,
}

struct Rule {
    applies: fn(&str) -> bool,
    category: fn(&str) -> Option<DiagnosticCategory>,
    sub_resource: fn(&str) -> Option<String>,
}

const MEMORY_KINDS: &[(&str, DiagnosticCategory)] = &[
    ("actual", DiagnosticCategory::MemoryActual),
    ("available", DiagnosticCategory::MemoryAvailable),
    ("last_update", DiagnosticCategory::MemoryLastUpdate),
    ("major_fault", DiagnosticCategory::MemoryMajorFault),
    ("minor_fault", DiagnosticCategory::MemoryMinorFault),
    ("rss", DiagnosticCategory::MemoryRss),
    ("swap_in", DiagnosticCategory::MemorySwapIn),
    ("swap_out", DiagnosticCategory::MemorySwapOut),
    ("unused", DiagnosticCategory::MemoryUnused),
    ("usable", DiagnosticCategory::MemoryUsable),
];

const TX_KINDS: &[(&str, DiagnosticCategory)] = &[
    ("drop", DiagnosticCategory::NicTxDrop),
    ("errors", DiagnosticCategory::NicTxErrors),
    ("packets", DiagnosticCategory::NicTxPackets),
];

const RX_KINDS: &[(&str, DiagnosticCategory)] = &[
    ("drop", DiagnosticCategory::NicRxDrop),
    ("errors", DiagnosticCategory::NicRxErrors),
    ("packets", DiagnosticCategory::NicRxPackets),
];

// read_req/write_req must be tested before read/write.
const DISK_KINDS: &[(&str, DiagnosticCategory)] = &[
    ("errors", DiagnosticCategory::DiskErrors),
    ("read_req", DiagnosticCategory::DiskReadRequests),
    ("write_req", DiagnosticCategory::DiskWriteRequests),
    ("read", DiagnosticCategory::DiskReadBytes),
    ("write", DiagnosticCategory::DiskWriteBytes),
];

const BLOCK_DEVICE_PREFIXES: &[&str] = &["hd", "vd", "sd"];

const RULES: &[Rule] = &[
    Rule {
        applies: |key| key.contains("cpu") && key.contains("time"),
        category: |_| Some(DiagnosticCategory::CpuTime),
        sub_resource: |key| Some(key.strip_suffix("_time").unwrap_or(key).to_string()),
    },
    Rule {
        applies: |key| key.contains("memory"),
        category: |key| {
            Some(first_kind(key, MEMORY_KINDS).unwrap_or(DiagnosticCategory::MemorySelected))
        },
        sub_resource: |_| None,
    },
    Rule {
        applies: |key| key.contains("_tx"),
        category: |key| Some(first_kind(key, TX_KINDS).unwrap_or(DiagnosticCategory::NicTxRate)),
        sub_resource: |key| interface_id(key, "_tx"),
    },
    Rule {
        applies: |key| key.contains("_rx"),
        category: |key| Some(first_kind(key, RX_KINDS).unwrap_or(DiagnosticCategory::NicRxRate)),
        sub_resource: |key| interface_id(key, "_rx"),
    },
    Rule {
        applies: |key| BLOCK_DEVICE_PREFIXES.iter().any(|p| key.starts_with(p)),
        category: |key| first_kind(key, DISK_KINDS),
        sub_resource: |key| key.split('_').next().map(str::to_string),
    },
];

fn first_kind(key: &str, kinds: &[(&str, DiagnosticCategory)]) -> Option<DiagnosticCategory> {
    kinds
        .iter()
        .find(|(needle, _)| key.contains(needle))
        .map(|(_, category)| *category)
}

/// Interface name is everything before the direction marker, so
/// `tap3e417313-ff_tx_packets` yields `tap3e417313-ff`.
fn interface_id(key: &str, marker: &str) -> Option<String> {
    key.find(marker).map(|idx| key[..idx].to_string())
}

/// Interpret a diagnostic value as a number.
///
/// JSON numbers are taken as is and numeric strings are parsed. Everything
/// else (descriptive strings, booleans, nested objects) yields `None`.
pub fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Classify a single key. Returns `None` when no rule recognizes the key,
/// when the matching rule cannot decide a category, or when the value is
/// not numeric.
pub fn classify_entry(key: &str, value: &Value) -> Option<ClassifiedObservation> {
    let rule = RULES.iter().find(|rule| (rule.applies)(key))?;
    let category = (rule.category)(key)?;
    let value = numeric_value(value)?;

    Some(ClassifiedObservation {
        category,
        sub_resource: (rule.sub_resource)(key),
        value,
    })
}

/// Classify every entry of a diagnostic record.
///
/// Never fails: unrecognized keys and non-numeric values are skipped.
/// Results are ordered by key so repeated calls over the same record yield
/// the same sequence.
pub fn classify(record: &DiagnosticRecord) -> Vec<ClassifiedObservation> {
    let mut keys: Vec<&String> = record.keys().collect();
    keys.sort();

    keys.into_iter()
        .filter_map(|key| classify_entry(key, &record[key]))
        .collect()
}
