use std::collections::HashSet;

use crate::error::{Error, Result};

/// Application configuration constants
pub struct AppConfig;

impl AppConfig {
    // Network Configuration
    pub const CONNECTION_TIMEOUT_SECS: u64 = 10;
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const POOL_IDLE_TIMEOUT_SECS: u64 = 60;
    pub const POOL_MAX_IDLE_PER_HOST: usize = 16;
    pub const TCP_KEEPALIVE_SECS: u64 = 30;

    // Exporter
    pub const DEFAULT_PORT: u16 = 9180;
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
    pub const MIN_POLL_INTERVAL_SECS: u64 = 5;
    pub const DEFAULT_METRIC_PREFIX: &'static str = "openstack_nova";
    pub const DEFAULT_DIAGNOSTICS_CONCURRENCY: usize = 8;
    pub const MAX_DIAGNOSTICS_CONCURRENCY: usize = 64;

    // Compute API
    pub const DEFAULT_INTERFACE: &'static str = "public";
    /// 2.46 is the last microversion that embeds the flavor id in server
    /// records and keeps the flat diagnostics format.
    pub const DEFAULT_COMPUTE_API_VERSION: &'static str = "2.46";
    pub const DEFAULT_DOMAIN_NAME: &'static str = "Default";
}

/// Keystone v3 password credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub auth_url: String,
    pub username: String,
    pub password: String,
    pub project_name: String,
    pub user_domain_name: String,
    pub project_domain_name: String,
    pub region_name: Option<String>,
    pub interface: String,
    pub compute_api_version: String,
}

impl Credentials {
    /// Fail early on settings without which authentication cannot succeed.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("OS_AUTH_URL", &self.auth_url),
            ("OS_USERNAME", &self.username),
            ("OS_PASSWORD", &self.password),
            ("OS_PROJECT_NAME", &self.project_name),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing credentials: {}",
                missing.join(", ")
            )));
        }

        if !(self.auth_url.starts_with("http://") || self.auth_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "OS_AUTH_URL must be an http(s) URL, got {}",
                self.auth_url
            )));
        }

        Ok(())
    }
}

/// Environment-specific configuration
pub struct EnvConfig;

impl EnvConfig {
    /// Read the standard `OS_*` variables from the process environment.
    pub fn credentials() -> Credentials {
        Self::credentials_from(|name| std::env::var(name).ok())
    }

    /// Read `OS_*` variables through `lookup`. Empty values count as unset.
    pub fn credentials_from<F>(lookup: F) -> Credentials
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let domain = get("OS_DOMAIN_NAME");

        Credentials {
            auth_url: get("OS_AUTH_URL").unwrap_or_default(),
            username: get("OS_USERNAME").unwrap_or_default(),
            password: get("OS_PASSWORD").unwrap_or_default(),
            project_name: get("OS_PROJECT_NAME")
                .or_else(|| get("OS_TENANT_NAME"))
                .unwrap_or_default(),
            user_domain_name: get("OS_USER_DOMAIN_NAME")
                .or_else(|| domain.clone())
                .unwrap_or_else(|| AppConfig::DEFAULT_DOMAIN_NAME.to_string()),
            project_domain_name: get("OS_PROJECT_DOMAIN_NAME")
                .or(domain)
                .unwrap_or_else(|| AppConfig::DEFAULT_DOMAIN_NAME.to_string()),
            region_name: get("OS_REGION_NAME"),
            interface: get("OS_INTERFACE")
                .map(|i| i.trim_end_matches("URL").to_string())
                .unwrap_or_else(|| AppConfig::DEFAULT_INTERFACE.to_string()),
            compute_api_version: get("OS_COMPUTE_API_VERSION")
                .unwrap_or_else(|| AppConfig::DEFAULT_COMPUTE_API_VERSION.to_string()),
        }
    }

    pub fn poll_interval(requested: u64) -> u64 {
        requested.max(AppConfig::MIN_POLL_INTERVAL_SECS)
    }

    pub fn diagnostics_concurrency(requested: usize) -> usize {
        requested.clamp(1, AppConfig::MAX_DIAGNOSTICS_CONCURRENCY)
    }
}

/// Settings that shape what the exporter collects and how it is named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    pub prefix: String,
    pub disabled_metrics: HashSet<String>,
    pub collect_diagnostics: bool,
    pub diagnostics_concurrency: usize,
    pub poll_interval_secs: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            prefix: AppConfig::DEFAULT_METRIC_PREFIX.to_string(),
            disabled_metrics: HashSet::new(),
            collect_diagnostics: true,
            diagnostics_concurrency: AppConfig::DEFAULT_DIAGNOSTICS_CONCURRENCY,
            poll_interval_secs: AppConfig::DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl ExporterConfig {
    /// Metric prefixes become part of every sample name and must be valid
    /// Prometheus identifiers.
    pub fn validate(&self) -> Result<()> {
        let valid = !self.prefix.is_empty()
            && self
                .prefix
                .chars()
                .enumerate()
                .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
        if !valid {
            return Err(Error::Config(format!(
                "invalid metric prefix: {:?}",
                self.prefix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_credentials_from_environment() {
        let creds = EnvConfig::credentials_from(lookup(&[
            ("OS_AUTH_URL", "https://keystone.example:5000/v3"),
            ("OS_USERNAME", "admin"),
            ("OS_PASSWORD", "secret"),
            ("OS_PROJECT_NAME", "admin"),
            ("OS_REGION_NAME", "RegionOne"),
            ("OS_INTERFACE", "internalURL"),
        ]));

        assert_eq!(creds.auth_url, "https://keystone.example:5000/v3");
        assert_eq!(creds.user_domain_name, "Default");
        assert_eq!(creds.region_name.as_deref(), Some("RegionOne"));
        assert_eq!(creds.interface, "internal");
        assert_eq!(creds.compute_api_version, "2.46");
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn test_domain_fallbacks() {
        let creds = EnvConfig::credentials_from(lookup(&[
            ("OS_DOMAIN_NAME", "corp"),
            ("OS_PROJECT_DOMAIN_NAME", "projects"),
            ("OS_TENANT_NAME", "legacy"),
        ]));
        assert_eq!(creds.user_domain_name, "corp");
        assert_eq!(creds.project_domain_name, "projects");
        assert_eq!(creds.project_name, "legacy");
    }

    #[test]
    fn test_missing_credentials_are_reported() {
        let creds = EnvConfig::credentials_from(lookup(&[("OS_USERNAME", "")]));
        let err = creds.validate().unwrap_err().to_string();
        assert!(err.contains("OS_AUTH_URL"));
        assert!(err.contains("OS_USERNAME"));
        assert!(err.contains("OS_PASSWORD"));
    }

    #[test]
    fn test_auth_url_scheme() {
        let creds = Credentials {
            auth_url: "keystone:5000".to_string(),
            username: "u".to_string(),
            password: "p".to_string(),
            project_name: "p".to_string(),
            ..Default::default()
        };
        assert!(matches!(creds.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_prefix_validation() {
        let mut config = ExporterConfig::default();
        assert!(config.validate().is_ok());

        config.prefix = "9nova".to_string();
        assert!(config.validate().is_err());

        config.prefix = "nova-exporter".to_string();
        assert!(config.validate().is_err());

        config.prefix = "nova_2".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bounds() {
        assert_eq!(EnvConfig::poll_interval(1), AppConfig::MIN_POLL_INTERVAL_SECS);
        assert_eq!(EnvConfig::poll_interval(120), 120);
        assert_eq!(EnvConfig::diagnostics_concurrency(0), 1);
        assert_eq!(EnvConfig::diagnostics_concurrency(1000), 64);
    }
}
