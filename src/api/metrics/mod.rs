pub mod hypervisor;
pub mod inventory;
pub mod limits;
pub mod registry;
pub mod server;
pub mod service;
pub mod status;

use std::collections::BTreeMap;

use tracing::warn;

pub use registry::{MetricDescriptor, MetricFamily, MetricRegistry};

/// Trait for turning fetched API records into samples
pub trait MetricExporter {
    /// Append this exporter's samples to `samples`
    fn export_samples(&self, samples: &mut SampleSet);
}

/// One labeled value of a metric family. Label values are positional and
/// follow the family's label names.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label_values: Vec<String>,
    pub value: f64,
}

/// Samples of one poll cycle, grouped by family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    samples: BTreeMap<MetricFamily, Vec<Sample>>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<V: Into<String>>(
        &mut self,
        family: MetricFamily,
        label_values: impl IntoIterator<Item = V>,
        value: f64,
    ) {
        self.samples.entry(family).or_default().push(Sample {
            label_values: label_values.into_iter().map(Into::into).collect(),
            value,
        });
    }

    pub fn get(&self, family: MetricFamily) -> &[Sample] {
        self.samples.get(&family).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn extend(&mut self, other: SampleSet) {
        for (family, samples) in other.samples {
            self.samples.entry(family).or_default().extend(samples);
        }
    }

    /// Render every enabled family in Prometheus text format. HELP and TYPE
    /// are written once per family; families without samples are omitted.
    pub fn render(&self, registry: &MetricRegistry) -> String {
        let mut builder = MetricBuilder::new();

        for (family, samples) in &self.samples {
            let Some(descriptor) = registry.get(*family) else {
                continue;
            };
            if samples.is_empty() {
                continue;
            }

            builder
                .help(&descriptor.name, descriptor.help)
                .type_(&descriptor.name, descriptor.metric_type);

            for sample in samples {
                if sample.label_values.len() != descriptor.labels.len() {
                    warn!(
                        "Dropping {} sample with {} label values, expected {}",
                        descriptor.name,
                        sample.label_values.len(),
                        descriptor.labels.len()
                    );
                    continue;
                }
                let labels: Vec<(&str, &str)> = descriptor
                    .labels
                    .iter()
                    .copied()
                    .zip(sample.label_values.iter().map(String::as_str))
                    .collect();
                builder.metric(&descriptor.name, &labels, sample.value);
            }
        }

        builder.build()
    }
}

/// Escape a label value for the text exposition format
fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Helper struct to build Prometheus metrics
pub struct MetricBuilder {
    metrics: String,
}

impl MetricBuilder {
    pub fn new() -> Self {
        Self {
            metrics: String::new(),
        }
    }

    /// Add a HELP line
    pub fn help(&mut self, name: &str, description: &str) -> &mut Self {
        self.metrics
            .push_str(&format!("# HELP {name} {description}\n"));
        self
    }

    /// Add a TYPE line
    pub fn type_(&mut self, name: &str, metric_type: &str) -> &mut Self {
        self.metrics
            .push_str(&format!("# TYPE {name} {metric_type}\n"));
        self
    }

    /// Add a metric line with labels
    pub fn metric(
        &mut self,
        name: &str,
        labels: &[(&str, &str)],
        value: impl ToString,
    ) -> &mut Self {
        self.metrics.push_str(name);

        if !labels.is_empty() {
            self.metrics.push('{');
            for (i, (key, value)) in labels.iter().enumerate() {
                if i > 0 {
                    self.metrics.push_str(", ");
                }
                let escaped_value = escape_label_value(value);
                self.metrics.push_str(&format!("{key}=\"{escaped_value}\""));
            }
            self.metrics.push('}');
        }

        self.metrics.push(' ');
        self.metrics.push_str(&value.to_string());
        self.metrics.push('\n');
        self
    }

    /// Build the final metric string
    pub fn build(self) -> String {
        self.metrics
    }
}

impl Default for MetricBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builder_formats_labels() {
        let mut builder = MetricBuilder::new();
        builder
            .help("nova_up", "Exporter health")
            .type_("nova_up", "gauge")
            .metric("nova_up", &[], 1)
            .metric("nova_x", &[("a", "1"), ("b", "say \"hi\"\\")], 2.5);

        assert_eq!(
            builder.build(),
            "# HELP nova_up Exporter health\n\
             # TYPE nova_up gauge\n\
             nova_up 1\n\
             nova_x{a=\"1\", b=\"say \\\"hi\\\"\\\\\"} 2.5\n"
        );
    }

    #[test]
    fn test_render_writes_help_once_per_family() {
        let registry = MetricRegistry::new("nova", &HashSet::new());
        let mut samples = SampleSet::new();
        samples.push(MetricFamily::RunningVms, ["h1", "az1", ""], 3.0);
        samples.push(MetricFamily::RunningVms, ["h2", "", "pool-a"], 0.0);

        let text = samples.render(&registry);
        assert_eq!(text.matches("# HELP nova_running_vms ").count(), 1);
        assert!(text.contains(
            "nova_running_vms{hostname=\"h1\", availability_zone=\"az1\", aggregates=\"\"} 3\n"
        ));
        assert!(text.contains("aggregates=\"pool-a\"} 0\n"));
    }

    #[test]
    fn test_render_skips_disabled_and_malformed() {
        let disabled: HashSet<String> = ["running_vms".to_string()].into_iter().collect();
        let registry = MetricRegistry::new("nova", &disabled);
        let mut samples = SampleSet::new();
        samples.push(MetricFamily::RunningVms, ["h1", "az1", ""], 3.0);
        samples.push(MetricFamily::VcpusUsed, ["h1"], 3.0);
        samples.push(MetricFamily::Flavors, Vec::<String>::new(), 7.0);

        let text = samples.render(&registry);
        assert!(!text.contains("running_vms"));
        assert!(!text.contains("nova_vcpus_used{"));
        assert!(text.contains("nova_flavors 7\n"));
        assert_eq!(samples.len(), 3);
    }
}
