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

use chrono::{DateTime, Utc};

use crate::collector::Snapshot;

/// Outcome of the most recent poll cycles.
#[derive(Clone, Debug, Default)]
pub struct PollStatus {
    pub last_successful_poll: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub last_failures: Vec<&'static str>,
    pub last_update: Option<DateTime<Utc>>,
}

impl PollStatus {
    pub fn mark_success(&mut self, now: DateTime<Utc>) {
        self.last_successful_poll = Some(now);
        self.consecutive_failures = 0;
        self.last_failures.clear();
        self.last_update = Some(now);
    }

    pub fn mark_failure(&mut self, failures: Vec<&'static str>, now: DateTime<Utc>) {
        self.consecutive_failures += 1;
        self.last_failures = failures;
        self.last_update = Some(now);
    }
}

/// State shared between the poll loop and the HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Exposition text served on `/metrics`, replaced after every poll.
    pub metrics: String,
    pub status: PollStatus,
    pub loading: bool,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            metrics: String::new(),
            status: PollStatus::default(),
            loading: true,
        }
    }

    /// Swap in the result of a finished poll cycle.
    pub fn update(&mut self, snapshot: &Snapshot, rendered: String, now: DateTime<Utc>) {
        self.metrics = rendered;
        if snapshot.up {
            self.status.mark_success(now);
        } else {
            self.status.mark_failure(snapshot.failures.clone(), now);
        }
        if self.loading {
            self.loading = false;
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
