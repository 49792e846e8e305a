//! Configuration settings for the fleet rebalancer.

use std::collections::HashMap;
use std::env;

use crate::error::BalancerError;

/// CPU overcommit ratio applied to schedulable capacity.
pub const CPU_ALLOCATION_RATIO: f64 = 8.0;
/// Memory overcommit ratio applied to schedulable capacity.
pub const RAM_ALLOCATION_RATIO: f64 = 1.5;
/// Target utilization is this fraction of the mean observed cluster utilization.
pub const TARGET_FRACTION: f64 = 0.9;
/// Default overutilization multiplier, used when `--threshold` is not given.
pub const DEFAULT_THRESHOLD: f64 = 1.2;

/// Required OpenStack environment variables; missing any of these is a `ConfigurationError`.
const REQUIRED_ENV_VARS: [&str; 4] = ["OS_AUTH_URL", "OS_PROJECT_NAME", "OS_USERNAME", "OS_PASSWORD"];

/// Optional auth variables from the host cloud ecosystem, passed through when present.
const OPTIONAL_ENV_VARS: [&str; 3] = ["OS_USER_DOMAIN_NAME", "OS_PROJECT_DOMAIN_NAME", "OS_REGION_NAME"];

/// Credentials and connection settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub auth_url: String,
    pub project_name: String,
    pub username: String,
    pub password: String,
    pub extra: HashMap<String, String>,
}

impl Config {
    /// Read all required and optional environment variables. Fails with `Configuration` if any
    /// required variable is missing.
    pub fn from_env() -> Result<Self, BalancerError> {
        let missing: Vec<&str> = REQUIRED_ENV_VARS
            .iter()
            .filter(|var| env::var(var).is_err())
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(BalancerError::Configuration(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let extra = OPTIONAL_ENV_VARS
            .iter()
            .filter_map(|var| env::var(var).ok().map(|v| (var.to_string(), v)))
            .collect();

        Ok(Self {
            auth_url: env::var("OS_AUTH_URL").unwrap(),
            project_name: env::var("OS_PROJECT_NAME").unwrap(),
            username: env::var("OS_USERNAME").unwrap(),
            password: env::var("OS_PASSWORD").unwrap(),
            extra,
        })
    }
}
