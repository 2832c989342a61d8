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

use clap::{Args, Parser, Subcommand};

use crate::common::config::{AppConfig, Credentials, EnvConfig, ExporterConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the exporter, serving metrics in Prometheus format. (default)
    Serve(ServeArgs),
    /// Run a single poll cycle and print the metrics to stdout.
    Once(CollectArgs),
    /// List every metric the exporter can produce.
    ListMetrics(MetricArgs),
}

#[derive(Parser, Clone, Debug)]
pub struct ServeArgs {
    /// The port to listen on for the metrics endpoint.
    #[arg(short, long, default_value_t = AppConfig::DEFAULT_PORT)]
    pub port: u16,
    /// The interval in seconds between two polls of the OpenStack APIs.
    #[arg(short, long, default_value_t = AppConfig::DEFAULT_POLL_INTERVAL_SECS)]
    pub interval: u64,
    #[command(flatten)]
    pub collect: CollectArgs,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self::parse_from(["nova-exporter"])
    }
}

#[derive(Args, Clone, Debug)]
pub struct MetricArgs {
    /// Prefix of every metric name.
    #[arg(long, default_value = AppConfig::DEFAULT_METRIC_PREFIX)]
    pub prefix: String,
    /// Do not collect or expose this metric. Accepts the name with or
    /// without the prefix; may be repeated.
    #[arg(short = 'd', long = "disable-metric", value_name = "METRIC")]
    pub disabled_metrics: Vec<String>,
}

#[derive(Args, Clone, Debug)]
pub struct CollectArgs {
    #[command(flatten)]
    pub metrics: MetricArgs,
    /// Skip the per-server diagnostics requests.
    #[arg(long)]
    pub no_diagnostics: bool,
    /// How many diagnostics requests may be in flight at once.
    #[arg(long, default_value_t = AppConfig::DEFAULT_DIAGNOSTICS_CONCURRENCY)]
    pub diagnostics_concurrency: usize,
    #[command(flatten)]
    pub openstack: OpenStackArgs,
}

/// Overrides for the `OS_*` environment variables.
#[derive(Args, Clone, Debug, Default)]
pub struct OpenStackArgs {
    /// Keystone URL (overrides OS_AUTH_URL).
    #[arg(long)]
    pub os_auth_url: Option<String>,
    /// User name (overrides OS_USERNAME).
    #[arg(long)]
    pub os_username: Option<String>,
    /// Password (overrides OS_PASSWORD).
    #[arg(long)]
    pub os_password: Option<String>,
    /// Project to scope the token to (overrides OS_PROJECT_NAME).
    #[arg(long)]
    pub os_project_name: Option<String>,
    #[arg(long)]
    pub os_user_domain_name: Option<String>,
    #[arg(long)]
    pub os_project_domain_name: Option<String>,
    /// Region used to pick catalog endpoints (overrides OS_REGION_NAME).
    #[arg(long)]
    pub os_region_name: Option<String>,
    /// Endpoint interface: public, internal or admin (overrides OS_INTERFACE).
    #[arg(long)]
    pub os_interface: Option<String>,
    /// Nova microversion to request (overrides OS_COMPUTE_API_VERSION).
    #[arg(long)]
    pub os_compute_api_version: Option<String>,
}

impl OpenStackArgs {
    /// Apply the flags that were given on top of `credentials`.
    pub fn apply(&self, mut credentials: Credentials) -> Credentials {
        let overrides = [
            (&self.os_auth_url, &mut credentials.auth_url),
            (&self.os_username, &mut credentials.username),
            (&self.os_password, &mut credentials.password),
            (&self.os_project_name, &mut credentials.project_name),
            (&self.os_user_domain_name, &mut credentials.user_domain_name),
            (
                &self.os_project_domain_name,
                &mut credentials.project_domain_name,
            ),
            (&self.os_interface, &mut credentials.interface),
            (
                &self.os_compute_api_version,
                &mut credentials.compute_api_version,
            ),
        ];
        for (flag, field) in overrides {
            if let Some(value) = flag {
                *field = value.clone();
            }
        }
        if self.os_region_name.is_some() {
            credentials.region_name = self.os_region_name.clone();
        }
        credentials
    }
}

impl CollectArgs {
    /// Environment credentials with command-line overrides applied.
    pub fn credentials(&self) -> Credentials {
        self.openstack.apply(EnvConfig::credentials())
    }

    pub fn exporter_config(&self, poll_interval_secs: u64) -> ExporterConfig {
        ExporterConfig {
            prefix: self.metrics.prefix.clone(),
            disabled_metrics: self.metrics.disabled_metrics.iter().cloned().collect(),
            collect_diagnostics: !self.no_diagnostics,
            diagnostics_concurrency: EnvConfig::diagnostics_concurrency(
                self.diagnostics_concurrency,
            ),
            poll_interval_secs: EnvConfig::poll_interval(poll_interval_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_arguments() {
        let args = ServeArgs::default();
        assert_eq!(args.port, AppConfig::DEFAULT_PORT);
        assert_eq!(args.interval, AppConfig::DEFAULT_POLL_INTERVAL_SECS);
        assert_eq!(args.collect.metrics.prefix, AppConfig::DEFAULT_METRIC_PREFIX);
        assert!(!args.collect.no_diagnostics);
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::parse_from([
            "nova-exporter",
            "serve",
            "--port",
            "9200",
            "--interval",
            "1",
            "--prefix",
            "nova",
            "-d",
            "server_status",
            "--disable-metric",
            "nova_flavors",
            "--no-diagnostics",
            "--diagnostics-concurrency",
            "500",
        ]);
        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, 9200);

        let config = args.collect.exporter_config(args.interval);
        assert_eq!(config.prefix, "nova");
        assert_eq!(config.disabled_metrics.len(), 2);
        assert!(!config.collect_diagnostics);
        assert_eq!(
            config.diagnostics_concurrency,
            AppConfig::MAX_DIAGNOSTICS_CONCURRENCY
        );
        assert_eq!(config.poll_interval_secs, AppConfig::MIN_POLL_INTERVAL_SECS);
    }

    #[test]
    fn test_openstack_overrides() {
        let cli = Cli::parse_from([
            "nova-exporter",
            "once",
            "--os-auth-url",
            "https://keystone.example/v3",
            "--os-region-name",
            "RegionTwo",
        ]);
        let Some(Commands::Once(args)) = cli.command else {
            panic!("expected once");
        };

        let base = Credentials {
            auth_url: "http://from-env/v3".to_string(),
            username: "admin".to_string(),
            ..Default::default()
        };
        let merged = args.openstack.apply(base);
        assert_eq!(merged.auth_url, "https://keystone.example/v3");
        assert_eq!(merged.username, "admin");
        assert_eq!(merged.region_name.as_deref(), Some("RegionTwo"));
    }

    #[test]
    fn test_list_metrics_subcommand() {
        let cli = Cli::parse_from(["nova-exporter", "list-metrics", "--prefix", "x"]);
        assert!(matches!(
            cli.command,
            Some(Commands::ListMetrics(MetricArgs { ref prefix, .. })) if prefix == "x"
        ));
    }
}
