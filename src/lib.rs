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

//! Prometheus exporter for the OpenStack compute service.
//!
//! The pure core is [`diagnostics::classify`], which turns a free-form
//! server diagnostics record into typed observations, and
//! [`topology::Topology`], which joins host aggregates into per-host zone
//! and aggregate lookups. [`collector::Collector`] drives one poll cycle
//! against any [`nova::NovaApi`] implementation.

pub mod api;
pub mod app_state;
pub mod cli;
pub mod collector;
pub mod common;
pub mod diagnostics;
pub mod error;
pub mod nova;
pub mod topology;
pub mod utils;

pub use error::{Error, Result};
