//! Controller configuration loaded from environment variables

use route_api::GATEWAY_INGRESS_CLASS;
use route_core::SyncConfig;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

pub const ADMIN_ADDR_VAR: &str = "ROUTE_ADMIN_ADDR";
pub const INGRESS_CLASS_VAR: &str = "ROUTE_INGRESS_CLASS";
pub const WATCH_NAMESPACE_VAR: &str = "ROUTE_WATCH_NAMESPACE";
pub const LOG_FORMAT_VAR: &str = "ROUTE_LOG_FORMAT";
pub const REFRESH_CAPACITY_VAR: &str = "ROUTE_REFRESH_CAPACITY";

const DEFAULT_ADMIN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REFRESH_CAPACITY: usize = 64;
/// The broadcast channel preallocates one slot per unit of capacity
const MAX_REFRESH_CAPACITY: usize = 65_536;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {}, expected text or json", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    pub admin_addr: SocketAddr,
    pub ingress_class: String,
    /// Watch a single namespace instead of all of them
    pub watch_namespace: Option<String>,
    pub log_format: LogFormat,
    pub refresh_capacity: usize,
}

impl ControllerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from any variable lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let admin_addr = parse_var(
            ADMIN_ADDR_VAR,
            get(ADMIN_ADDR_VAR).unwrap_or_else(|| DEFAULT_ADMIN_ADDR.to_string()),
        )?;

        let log_format = match get(LOG_FORMAT_VAR) {
            Some(value) => parse_var(LOG_FORMAT_VAR, value)?,
            None => LogFormat::default(),
        };

        let refresh_capacity = match get(REFRESH_CAPACITY_VAR) {
            Some(value) => parse_var::<usize>(REFRESH_CAPACITY_VAR, value.clone())
                .and_then(|capacity| match capacity {
                    0 => Err(ConfigError::InvalidValue {
                        var: REFRESH_CAPACITY_VAR,
                        value,
                        reason: "must be greater than zero".to_string(),
                    }),
                    n if n > MAX_REFRESH_CAPACITY => Err(ConfigError::InvalidValue {
                        var: REFRESH_CAPACITY_VAR,
                        value,
                        reason: format!("must be at most {}", MAX_REFRESH_CAPACITY),
                    }),
                    n => Ok(n),
                })?,
            None => DEFAULT_REFRESH_CAPACITY,
        };

        Ok(Self {
            admin_addr,
            ingress_class: get(INGRESS_CLASS_VAR)
                .unwrap_or_else(|| GATEWAY_INGRESS_CLASS.to_string()),
            watch_namespace: get(WATCH_NAMESPACE_VAR),
            log_format,
            refresh_capacity,
        })
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::new(self.ingress_class.clone())
    }
}

fn parse_var<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        value: value.clone(),
        reason: e.to_string(),
    })
}
