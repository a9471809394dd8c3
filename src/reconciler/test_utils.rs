use crate::database::{
    DatabaseError, DatabaseProcess, DatabaseTarget, GroupMember, MemberRole, ReplicationGroupConfig, StatusDocument,
    StatusMember,
};
use crate::directory::{ClusterDirectory, DirectoryError};
use crate::identity::{parse_ordinal, AddressScheme, ReplicaRecord};
use crate::reconciler::cycle::{Reconciler, ReconcilerConfig};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub fn test_logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

pub fn scheme() -> AddressScheme {
    AddressScheme {
        service_name: "mongo".into(),
        namespace: "prod".into(),
        cluster_domain: "cluster.local".into(),
        port: 27017,
    }
}

/// `host:port` of a replica inside the group.
pub fn address(name: &str) -> String {
    scheme().full_address_with_port(name)
}

pub fn member(name: &str) -> GroupMember {
    GroupMember::new(parse_ordinal(name).unwrap(), address(name))
}

pub fn live_replica(name: &str) -> ReplicaRecord {
    let ordinal = parse_ordinal(name).unwrap();
    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), "mongo".to_string());

    ReplicaRecord::new(name, true, format!("10.0.0.{}", ordinal.as_u32() + 10), labels).unwrap()
}

/// A `replSetGetStatus` reply of group "rs0" with the given `(replica, stateStr)` members.
pub fn status(members: &[(&str, &str)]) -> StatusDocument {
    let members = members
        .iter()
        .map(|(name, state)| StatusMember {
            address: address(name),
            role: match *state {
                "PRIMARY" => MemberRole::Primary,
                "SECONDARY" => MemberRole::Secondary,
                other => MemberRole::Other(other.to_string()),
            },
        })
        .collect();

    StatusDocument::new("rs0", members)
}

pub fn group_config(names: &[&str]) -> ReplicationGroupConfig {
    ReplicationGroupConfig::initial("rs0", names.iter().map(|name| member(name)).collect(), false)
}

pub fn reconciler_for(name: &str, directory: FakeDirectory, database: FakeDatabase) -> Reconciler<FakeDirectory, FakeDatabase> {
    let config = ReconcilerConfig {
        identity: scheme().resolve(name).unwrap(),
        address_scheme: scheme(),
        replica_set_id: "rs0".into(),
        config_server: false,
        primary_label: "mongo-primary".into(),
    };

    Reconciler::new(test_logger(), config, directory, database)
}

// ------- FakeDirectory --------

#[derive(Clone, Default)]
pub struct FakeDirectory {
    inner: Arc<Mutex<DirectoryState>>,
}

#[derive(Default)]
struct DirectoryState {
    replicas: Vec<ReplicaRecord>,
    fail_listing: bool,
    listings: usize,
    fail_patch_for: HashSet<String>,
    patches: Vec<(String, BTreeMap<String, String>)>,
}

impl FakeDirectory {
    pub fn with_replicas(replicas: Vec<ReplicaRecord>) -> Self {
        let directory = FakeDirectory::default();
        directory.inner.lock().unwrap().replicas = replicas;
        directory
    }

    pub fn fail_listing(&self) {
        self.inner.lock().unwrap().fail_listing = true;
    }

    pub fn fail_patch_for(&self, name: &str) {
        self.inner.lock().unwrap().fail_patch_for.insert(name.to_string());
    }

    pub fn listings(&self) -> usize {
        self.inner.lock().unwrap().listings
    }

    /// Successful label replacements, in order.
    pub fn patches(&self) -> Vec<(String, BTreeMap<String, String>)> {
        self.inner.lock().unwrap().patches.clone()
    }

    pub fn snapshot(&self) -> Vec<ReplicaRecord> {
        self.inner.lock().unwrap().replicas.clone()
    }

    pub fn replica(&self, name: &str) -> ReplicaRecord {
        self.snapshot()
            .into_iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("No replica named '{}'", name))
    }
}

#[async_trait::async_trait]
impl ClusterDirectory for FakeDirectory {
    async fn list_replicas(&self) -> Result<Vec<ReplicaRecord>, DirectoryError> {
        let mut state = self.inner.lock().unwrap();
        state.listings += 1;
        if state.fail_listing {
            return Err(DirectoryError::MalformedRecord("listing disabled by test".into()));
        }

        Ok(state.replicas.clone())
    }

    async fn replace_labels(
        &self,
        replica_name: &str,
        labels: BTreeMap<String, String>,
    ) -> Result<ReplicaRecord, DirectoryError> {
        let mut state = self.inner.lock().unwrap();
        if state.fail_patch_for.contains(replica_name) {
            return Err(DirectoryError::MalformedRecord(format!("patching '{}' disabled by test", replica_name)));
        }

        let replica = state
            .replicas
            .iter_mut()
            .find(|r| r.name == replica_name)
            .ok_or_else(|| DirectoryError::MalformedRecord(format!("no replica '{}'", replica_name)))?;
        replica.labels = labels.clone();
        let updated = replica.clone();

        state.patches.push((replica_name.to_string(), labels));
        Ok(updated)
    }
}

// ------- FakeDatabase --------

#[derive(Clone, Default)]
pub struct FakeDatabase {
    inner: Arc<Mutex<DatabaseState>>,
}

#[derive(Default)]
struct DatabaseState {
    local_status: Option<Result<StatusDocument, DatabaseError>>,
    // Keyed by full address without port.
    remote_statuses: HashMap<String, Result<StatusDocument, DatabaseError>>,
    config: Option<Result<ReplicationGroupConfig, DatabaseError>>,
    initiate_error: Option<DatabaseError>,
    reconfigure_error: Option<DatabaseError>,

    local_status_queries: usize,
    config_fetches: usize,
    queried_remotes: Vec<String>,
    initiations: Vec<ReplicationGroupConfig>,
    reconfigurations: Vec<ReplicationGroupConfig>,
}

fn not_replicating() -> DatabaseError {
    DatabaseError::NotReplicating("no replset config has been received".into())
}

impl FakeDatabase {
    /// Unset, the local process answers as not yet initialized.
    pub fn set_local_status(&self, status: Result<StatusDocument, DatabaseError>) {
        self.inner.lock().unwrap().local_status = Some(status);
    }

    /// Unset, a remote replica answers as not yet initialized.
    pub fn set_remote_status(&self, name: &str, status: Result<StatusDocument, DatabaseError>) {
        self.inner
            .lock()
            .unwrap()
            .remote_statuses
            .insert(scheme().full_address(name), status);
    }

    pub fn set_config(&self, config: Result<ReplicationGroupConfig, DatabaseError>) {
        self.inner.lock().unwrap().config = Some(config);
    }

    pub fn fail_initiate(&self, error: DatabaseError) {
        self.inner.lock().unwrap().initiate_error = Some(error);
    }

    pub fn fail_reconfigure(&self, error: DatabaseError) {
        self.inner.lock().unwrap().reconfigure_error = Some(error);
    }

    pub fn initiations(&self) -> Vec<ReplicationGroupConfig> {
        self.inner.lock().unwrap().initiations.clone()
    }

    pub fn reconfigurations(&self) -> Vec<ReplicationGroupConfig> {
        self.inner.lock().unwrap().reconfigurations.clone()
    }

    /// Remote addresses whose status was queried, in order.
    pub fn queried_remotes(&self) -> Vec<String> {
        self.inner.lock().unwrap().queried_remotes.clone()
    }

    pub fn config_fetches(&self) -> usize {
        self.inner.lock().unwrap().config_fetches
    }

    pub fn local_status_queries(&self) -> usize {
        self.inner.lock().unwrap().local_status_queries
    }
}

#[async_trait::async_trait]
impl DatabaseProcess for FakeDatabase {
    async fn replication_status(&self, target: &DatabaseTarget) -> Result<StatusDocument, DatabaseError> {
        let mut state = self.inner.lock().unwrap();

        match target {
            DatabaseTarget::Local => {
                state.local_status_queries += 1;
                state.local_status.clone().unwrap_or_else(|| Err(not_replicating()))
            }
            DatabaseTarget::Remote(address) => {
                state.queried_remotes.push(address.clone());
                state
                    .remote_statuses
                    .get(address)
                    .cloned()
                    .unwrap_or_else(|| Err(not_replicating()))
            }
        }
    }

    async fn replication_config(&self) -> Result<ReplicationGroupConfig, DatabaseError> {
        let mut state = self.inner.lock().unwrap();
        state.config_fetches += 1;
        state.config.clone().unwrap_or_else(|| Err(not_replicating()))
    }

    async fn reconfigure(&self, config: &ReplicationGroupConfig) -> Result<(), DatabaseError> {
        let mut state = self.inner.lock().unwrap();
        if let Some(e) = state.reconfigure_error.clone() {
            return Err(e);
        }

        state.reconfigurations.push(config.clone());
        state.config = Some(Ok(config.clone()));
        Ok(())
    }

    async fn initiate(&self, config: &ReplicationGroupConfig) -> Result<(), DatabaseError> {
        let mut state = self.inner.lock().unwrap();
        if let Some(e) = state.initiate_error.clone() {
            return Err(e);
        }

        state.initiations.push(config.clone());
        state.config = Some(Ok(config.clone()));
        Ok(())
    }
}
