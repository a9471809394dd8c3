use crate::config::options::{ConfigError, ControllerConfig, ControllerOptions};
use std::convert::TryFrom;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::time::Duration;

impl ControllerOptions {
    /// Reads every setting through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| lookup(key).filter(|value| !value.is_empty());

        Ok(ControllerOptions {
            pod_name: get("POD_NAME"),
            namespace: get("NS"),
            service_name: get("RS_SVC"),
            port: parse_number("MDB_PORT", get("MDB_PORT"))?,
            username: get("MDB_USER"),
            password: get("MDB_PASS"),
            cluster_domain: get("CLUSTER_DOMAIN"),
            replica_set_id: get("REPLICA_SET_ID"),
            config_server: parse_flag("CONFIG_SVR", get("CONFIG_SVR"))?,
            primary_label: get("PRIMARY_LABEL"),
            loop_interval: parse_seconds("LOOP_SLEEP_SECONDS", get("LOOP_SLEEP_SECONDS"))?,
            connect_timeout: parse_seconds("MDB_CONNECT_TIMEOUT_SECONDS", get("MDB_CONNECT_TIMEOUT_SECONDS"))?,
            liveness_timeout: parse_seconds("MDB_LIVENESS_TIMEOUT_SECONDS", get("MDB_LIVENESS_TIMEOUT_SECONDS"))?,
            command_timeout: parse_seconds("MDB_COMMAND_TIMEOUT_SECONDS", get("MDB_COMMAND_TIMEOUT_SECONDS"))?,
            log_directory: get("LOG_DIRECTORY").map(PathBuf::from),
        })
    }
}

impl ControllerConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        ControllerConfig::try_from(ControllerOptions::from_lookup(lookup)?)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

fn parse_number<T>(key: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value: raw,
        }),
        None => Ok(None),
    }
}

fn parse_seconds(key: &'static str, value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    Ok(parse_number::<u64>(key, value)?.map(Duration::from_secs))
}

fn parse_flag(key: &'static str, value: Option<String>) -> Result<Option<bool>, ConfigError> {
    match value {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" | "true" | "1" => Ok(Some(true)),
            "n" | "no" | "false" | "0" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid {
                key,
                reason: "expected one of y, yes, true, 1, n, no, false, 0".to_string(),
                value: raw,
            }),
        },
        None => Ok(None),
    }
}
