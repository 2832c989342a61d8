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

//! Classification of a complete libvirt diagnostics record.

use nova_exporter::diagnostics::{classify, DiagnosticCategory, DiagnosticRecord};
use serde_json::{json, Value};

fn libvirt_record() -> DiagnosticRecord {
    let value = json!({
        "cpu0_time": 9.965e10,
        "cpu1_time": 7.153e10,
        "hda_errors": -1,
        "hda_read": 796976,
        "hda_read_req": 213,
        "hda_write": 0,
        "hda_write_req": 0,
        "memory": 1048576,
        "memory-actual": 1048576,
        "memory-available": 1008548,
        "memory-last_update": 1586337512,
        "memory-major_fault": 643,
        "memory-minor_fault": 3985196,
        "memory-rss": 810084,
        "memory-swap_in": 0,
        "memory-swap_out": 0,
        "memory-unused": 582860,
        "memory-usable": 593740,
        "tap3e417313-ff_rx": 3454137,
        "tap3e417313-ff_rx_drop": 0,
        "tap3e417313-ff_rx_errors": 0,
        "tap3e417313-ff_rx_packets": 8115,
        "tap3e417313-ff_tx": 3905463,
        "tap3e417313-ff_tx_drop": 0,
        "tap3e417313-ff_tx_errors": 0,
        "tap3e417313-ff_tx_packets": 15717,
        "vda_errors": -1,
        "vda_read": 189332992,
        "vda_read_req": 10778,
        "vda_write": 223245312,
        "vda_write_req": 1663
    });
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_every_libvirt_key_is_classified() {
    let record = libvirt_record();
    let observations = classify(&record);
    assert_eq!(observations.len(), record.len());
}

#[test]
fn test_every_category_is_reachable() {
    let observations = classify(&libvirt_record());
    for category in DiagnosticCategory::ALL {
        assert!(
            observations.iter().any(|o| o.category == category),
            "no observation for {category}"
        );
    }
}

#[test]
fn test_sub_resources() {
    let observations = classify(&libvirt_record());
    let find = |category: DiagnosticCategory, sub: &str| {
        observations
            .iter()
            .find(|o| o.category == category && o.sub_resource.as_deref() == Some(sub))
            .map(|o| o.value)
    };

    assert_eq!(find(DiagnosticCategory::CpuTime, "cpu1"), Some(7.153e10));
    assert_eq!(find(DiagnosticCategory::DiskReadRequests, "vda"), Some(10778.0));
    assert_eq!(find(DiagnosticCategory::DiskReadBytes, "hda"), Some(796976.0));
    assert_eq!(
        find(DiagnosticCategory::NicTxPackets, "tap3e417313-ff"),
        Some(15717.0)
    );
    assert_eq!(
        find(DiagnosticCategory::NicRxRate, "tap3e417313-ff"),
        Some(3454137.0)
    );
}

#[test]
fn test_memory_has_no_sub_resource() {
    let observations = classify(&libvirt_record());
    let memory: Vec<_> = observations
        .iter()
        .filter(|o| o.category.as_str().starts_with("memory-"))
        .collect();

    assert_eq!(memory.len(), 11);
    assert!(memory.iter().all(|o| o.sub_resource.is_none()));
}

#[test]
fn test_unusable_entries_are_dropped() {
    let mut record = libvirt_record();
    record.insert("unrelated_metric".to_string(), json!(1));
    record.insert("vda_read".to_string(), Value::Null);
    record.insert("cpu0_time".to_string(), json!("n/a"));
    record.insert("memory-rss".to_string(), json!({"value": 1}));

    let observations = classify(&record);
    assert_eq!(observations.len(), libvirt_record().len() - 3);
    assert!(observations.iter().all(|o| o.value.is_finite()));
}

#[test]
fn test_classification_is_deterministic() {
    let record = libvirt_record();
    assert_eq!(classify(&record), classify(&record));
}
