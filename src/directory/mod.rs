//! The orchestrator's view of the replica group: which replicas exist and their labels.
mod api;
mod kube_directory;

pub use api::ClusterDirectory;
pub use api::DirectoryError;
pub use kube_directory::KubeDirectory;
