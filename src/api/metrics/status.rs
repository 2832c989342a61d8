use std::time::Duration;

use super::{MetricExporter, MetricFamily, SampleSet};

/// Health of the exporter itself for the last poll cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusMetricExporter {
    pub up: bool,
    pub duration: Duration,
    pub skipped_instances: usize,
}

impl MetricExporter for StatusMetricExporter {
    fn export_samples(&self, samples: &mut SampleSet) {
        let none = Vec::<String>::new;
        samples.push(MetricFamily::Up, none(), if self.up { 1.0 } else { 0.0 });
        samples.push(
            MetricFamily::ScrapeDurationSeconds,
            none(),
            self.duration.as_secs_f64(),
        );
        samples.push(
            MetricFamily::SkippedInstances,
            none(),
            self.skipped_instances as f64,
        );
    }
}
