use crate::database::documents::{ReplicationGroupConfig, StatusDocument};
use std::fmt;
use tokio::time::Duration;

/// DatabaseProcess is the command surface of the database that the controller needs. Replies are
/// decoded into typed documents at this boundary.
#[async_trait::async_trait]
pub trait DatabaseProcess: Send + Sync {
    /// `replSetGetStatus` against the local process or a remote replica.
    async fn replication_status(&self, target: &DatabaseTarget) -> Result<StatusDocument, DatabaseError>;

    /// `replSetGetConfig` against the local process.
    async fn replication_config(&self) -> Result<ReplicationGroupConfig, DatabaseError>;

    /// `replSetReconfig` against the local process. The config's member list fully replaces the
    /// persisted one.
    async fn reconfigure(&self, config: &ReplicationGroupConfig) -> Result<(), DatabaseError>;

    /// `replSetInitiate` against the local process.
    async fn initiate(&self, config: &ReplicationGroupConfig) -> Result<(), DatabaseError>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DatabaseTarget {
    /// The database process co-located with this controller.
    Local,
    /// Another replica, by its stable network address (without port).
    Remote(String),
}

impl fmt::Display for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseTarget::Local => write!(f, "local database"),
            DatabaseTarget::Remote(address) => write!(f, "{}", address),
        }
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DatabaseError {
    #[error("not running with replication (code 94): {0}")]
    NotReplicating(String),

    // Needs an operator; rewriting the config automatically can lose writes.
    #[error("invalid replication configuration (code 93): {0}")]
    InvalidReplicationConfig(String),

    #[error("command failed with code {code} ({code_name}): {message}")]
    CommandFailed {
        code: i32,
        code_name: String,
        message: String,
    },

    #[error("database at '{address}' is unreachable: {reason}")]
    Unreachable { address: String, reason: String },

    #[error("'{operation}' against '{address}' timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        address: String,
        timeout: Duration,
    },

    #[error("malformed {document} document: {reason}")]
    MalformedDocument { document: &'static str, reason: String },
}

impl DatabaseError {
    pub const INVALID_REPLICA_SET_CONFIG: i32 = 93;
    pub const NOT_YET_INITIALIZED: i32 = 94;

    /// Builds the error for a command the server answered with `ok: 0`.
    pub fn from_command_failure(code: i32, code_name: &str, message: &str) -> Self {
        match code {
            Self::NOT_YET_INITIALIZED => DatabaseError::NotReplicating(message.to_string()),
            Self::INVALID_REPLICA_SET_CONFIG => DatabaseError::InvalidReplicationConfig(message.to_string()),
            _ => DatabaseError::CommandFailed {
                code,
                code_name: code_name.to_string(),
                message: message.to_string(),
            },
        }
    }

    /// The server error code, if the server answered at all.
    pub fn code(&self) -> Option<i32> {
        match self {
            DatabaseError::NotReplicating(_) => Some(Self::NOT_YET_INITIALIZED),
            DatabaseError::InvalidReplicationConfig(_) => Some(Self::INVALID_REPLICA_SET_CONFIG),
            DatabaseError::CommandFailed { code, .. } => Some(*code),
            DatabaseError::Unreachable { .. }
            | DatabaseError::Timeout { .. }
            | DatabaseError::MalformedDocument { .. } => None,
        }
    }
}
