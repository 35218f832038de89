//! API environment — which backend to talk to and how long to wait.
//!
//! Profiles:
//! - `development`: `http://localhost:5001`
//! - `production`: `http://os.convertedbond.cn`
//!
//! Environment variables:
//! - `CBTEST_APP_ENV`: profile name (default `development`)
//! - `CBTEST_API_URL`: overrides the profile URL
//! - `CBTEST_TIMEOUT_SECS`: request timeout (default 5)

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::ConfigError;

pub const APP_ENV_VAR: &str = "CBTEST_APP_ENV";
pub const API_URL_VAR: &str = "CBTEST_API_URL";
pub const TIMEOUT_VAR: &str = "CBTEST_TIMEOUT_SECS";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl AppEnv {
    pub fn api_url(self) -> &'static str {
        match self {
            AppEnv::Development => "http://localhost:5001",
            AppEnv::Production => "http://os.convertedbond.cn",
        }
    }

    pub fn app_name(self) -> &'static str {
        match self {
            AppEnv::Development => "Convertible Bond Backtest (Dev)",
            AppEnv::Production => "Convertible Bond Backtest",
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppEnv::Development => f.write_str("development"),
            AppEnv::Production => f.write_str("production"),
        }
    }
}

impl FromStr for AppEnv {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "production" | "prod" => Ok(AppEnv::Production),
            other => Err(ConfigError::Env(format!(
                "unknown {APP_ENV_VAR} '{other}' (expected development or production)"
            ))),
        }
    }
}

/// Resolved backend settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub environment: AppEnv,
    pub api_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn for_env(environment: AppEnv) -> Self {
        Self {
            environment,
            api_url: environment.api_url().to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve using an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = match var(APP_ENV_VAR) {
            Some(name) => name.parse()?,
            None => AppEnv::default(),
        };
        let mut config = Self::for_env(environment);

        if let Some(url) = var(API_URL_VAR) {
            config.api_url = url;
        }
        if let Some(secs) = var(TIMEOUT_VAR) {
            let secs: u64 = secs.parse().map_err(|_| {
                ConfigError::Env(format!("{TIMEOUT_VAR} must be whole seconds, got '{secs}'"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Backtest endpoint under the base URL.
    pub fn backtest_endpoint(&self) -> String {
        format!("{}/api/backtest", self.api_url.trim_end_matches('/'))
    }
}
