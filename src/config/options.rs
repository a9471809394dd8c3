use crate::database::{DatabaseCredentials, DatabaseTimeouts};
use crate::identity::{AddressScheme, IdentityError, ReplicaIdentity};
use crate::reconciler::ReconcilerConfig;
use std::convert::TryFrom;
use std::path::PathBuf;
use tokio::time::Duration;

const DEFAULT_PORT: u16 = 27017;
const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";
const DEFAULT_REPLICA_SET_ID: &str = "rs0";
const DEFAULT_LOOP_INTERVAL: Duration = Duration::from_secs(15);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required setting '{0}' is not set")]
    Missing(&'static str),

    #[error("setting '{key}' has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("illegal options: {0}")]
    IllegalOptions(&'static str),

    #[error("cannot resolve own identity: {0}")]
    Identity(#[from] IdentityError),
}

/// ControllerOptions is the raw, unvalidated configuration. Unset fields take their defaults when
/// converted into a [`ControllerConfig`].
#[derive(Clone, Debug, Default)]
pub struct ControllerOptions {
    pub pod_name: Option<String>,
    pub namespace: Option<String>,
    pub service_name: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub cluster_domain: Option<String>,
    pub replica_set_id: Option<String>,
    pub config_server: Option<bool>,
    pub primary_label: Option<String>,
    pub loop_interval: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub liveness_timeout: Option<Duration>,
    pub command_timeout: Option<Duration>,
    pub log_directory: Option<PathBuf>,
}

/// ControllerConfig is the validated configuration, fixed for the life of the process.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    pub identity: ReplicaIdentity,
    pub address_scheme: AddressScheme,
    pub credentials: Option<DatabaseCredentials>,
    pub replica_set_id: String,
    pub config_server: bool,
    pub primary_label: String,
    pub loop_interval: Duration,
    pub timeouts: DatabaseTimeouts,
    pub log_directory: Option<PathBuf>,
}

impl ControllerConfig {
    pub fn namespace(&self) -> &str {
        &self.address_scheme.namespace
    }

    pub fn service_name(&self) -> &str {
        &self.address_scheme.service_name
    }

    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            identity: self.identity.clone(),
            address_scheme: self.address_scheme.clone(),
            replica_set_id: self.replica_set_id.clone(),
            config_server: self.config_server,
            primary_label: self.primary_label.clone(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            self.loop_interval,
            self.timeouts.connect,
            self.timeouts.liveness,
            self.timeouts.command,
        ];
        if durations.iter().any(|d| d.as_nanos() == 0) {
            return Err(ConfigError::IllegalOptions("Intervals and timeouts must be greater than zero"));
        }
        if self.timeouts.liveness > self.timeouts.connect {
            return Err(ConfigError::IllegalOptions(
                "Liveness timeout must not exceed the connect timeout",
            ));
        }
        if self.replica_set_id.is_empty() {
            return Err(ConfigError::IllegalOptions("Replica set id must not be empty"));
        }
        if self.primary_label.is_empty() {
            return Err(ConfigError::IllegalOptions("Primary label must not be empty"));
        }

        Ok(())
    }
}

impl TryFrom<ControllerOptions> for ControllerConfig {
    type Error = ConfigError;

    fn try_from(options: ControllerOptions) -> Result<Self, Self::Error> {
        let pod_name = required(options.pod_name, "POD_NAME")?;
        let namespace = required(options.namespace, "NS")?;
        let service_name = required(options.service_name, "RS_SVC")?;

        let credentials = match (options.username, options.password) {
            (Some(username), Some(password)) => Some(DatabaseCredentials { username, password }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::IllegalOptions(
                    "Database username and password must be set together",
                ))
            }
        };

        let address_scheme = AddressScheme {
            service_name: service_name.clone(),
            namespace,
            cluster_domain: options
                .cluster_domain
                .unwrap_or_else(|| DEFAULT_CLUSTER_DOMAIN.to_string()),
            port: options.port.unwrap_or(DEFAULT_PORT),
        };
        let identity = address_scheme.resolve(&pod_name)?;

        let values = ControllerConfig {
            identity,
            address_scheme,
            credentials,
            replica_set_id: options
                .replica_set_id
                .unwrap_or_else(|| DEFAULT_REPLICA_SET_ID.to_string()),
            config_server: options.config_server.unwrap_or(false),
            primary_label: options
                .primary_label
                .unwrap_or_else(|| format!("{}-primary", service_name)),
            loop_interval: options.loop_interval.unwrap_or(DEFAULT_LOOP_INTERVAL),
            timeouts: DatabaseTimeouts {
                connect: options.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
                liveness: options.liveness_timeout.unwrap_or(DEFAULT_LIVENESS_TIMEOUT),
                command: options.command_timeout.unwrap_or(DEFAULT_COMMAND_TIMEOUT),
            },
            log_directory: options.log_directory,
        };

        values.validate()?;
        Ok(values)
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}
