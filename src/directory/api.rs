use crate::identity::{IdentityError, ReplicaRecord};
use std::collections::BTreeMap;
use std::error::Error;

#[async_trait::async_trait]
pub trait ClusterDirectory: Send + Sync {
    /// List every replica selected by the replication group's service. Not paginated: the whole
    /// group is returned by one request, which bounds the supported group size.
    async fn list_replicas(&self) -> Result<Vec<ReplicaRecord>, DirectoryError>;

    /// Replace the full label map of `replica_name` and return the record as the directory now
    /// reports it.
    async fn replace_labels(
        &self,
        replica_name: &str,
        labels: BTreeMap<String, String>,
    ) -> Result<ReplicaRecord, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory request '{operation}' on '{target}' failed: {source}")]
    Request {
        operation: &'static str,
        target: String,
        source: Box<dyn Error + Send + Sync>,
    },

    // An empty selector would match every replica in the namespace.
    #[error("service '{0}' has no replica selector")]
    MissingSelector(String),

    #[error("directory returned a malformed record: {0}")]
    MalformedRecord(String),

    #[error("directory returned an unparseable replica: {0}")]
    InvalidRecord(#[from] IdentityError),
}
