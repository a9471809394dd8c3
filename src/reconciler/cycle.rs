use crate::database::{DatabaseError, DatabaseProcess, MemberRole};
use crate::directory::{ClusterDirectory, DirectoryError};
use crate::identity::{AddressScheme, Ordinal, ReplicaIdentity, ReplicaRecord};
use crate::reconciler::bootstrap::BootstrapOutcome;
use crate::reconciler::classifier::ReplicationGroupStatus;
use crate::reconciler::leader_marker::MarkerOutcome;
use crate::reconciler::membership::MembershipOutcome;

pub struct ReconcilerConfig {
    pub identity: ReplicaIdentity,
    pub address_scheme: AddressScheme,
    /// `_id` given to the group when this controller creates it.
    pub replica_set_id: String,
    pub config_server: bool,
    /// Label key carried by the primary's record.
    pub primary_label: String,
}

/// Reconciler runs the reconciliation algorithm for the replica it sits next to. It holds no state
/// between cycles: everything is re-read from the directory and the database each time.
pub struct Reconciler<D, B>
where
    D: ClusterDirectory,
    B: DatabaseProcess,
{
    pub(super) logger: slog::Logger,
    pub(super) identity: ReplicaIdentity,
    pub(super) address_scheme: AddressScheme,
    pub(super) replica_set_id: String,
    pub(super) config_server: bool,
    pub(super) primary_label: String,
    pub(super) directory: D,
    pub(super) database: B,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CycleOutcome {
    /// The directory reports no running, addressed replica. Nothing can be decided.
    NoRunningReplicas,
    Bootstrap(BootstrapOutcome),
    /// A group member that isn't primary has nothing to do.
    NotPrimary(MemberRole),
    Primary {
        membership: MembershipOutcome,
        marker: MarkerOutcome,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("listing replicas failed: {0}")]
    ListReplicas(#[source] DirectoryError),

    #[error("local replication status is unusable: {0}")]
    LocalStatus(#[source] DatabaseError),

    #[error("querying replica '{replica}' at '{address}' failed: {source}")]
    RemoteStatus {
        replica: String,
        address: String,
        #[source]
        source: DatabaseError,
    },

    #[error("initiating replication group failed: {0}")]
    Initiate(#[source] DatabaseError),

    #[error("fetching replication group config failed: {0}")]
    FetchConfig(#[source] DatabaseError),

    #[error("submitting reconfiguration failed: {0}")]
    Reconfigure(#[source] DatabaseError),

    #[error("updating primary marker on '{replica}' failed: {source}")]
    MarkReplica {
        replica: String,
        #[source]
        source: DirectoryError,
    },

    #[error("replicas '{first}' and '{second}' are both running with ordinal {ordinal}")]
    DuplicateOrdinal {
        ordinal: Ordinal,
        first: String,
        second: String,
    },
}

impl<D, B> Reconciler<D, B>
where
    D: ClusterDirectory,
    B: DatabaseProcess,
{
    pub fn new(logger: slog::Logger, config: ReconcilerConfig, directory: D, database: B) -> Self {
        let logger = logger.new(slog::o!("ordinal" => config.identity.ordinal.as_u32()));

        Reconciler {
            logger,
            identity: config.identity,
            address_scheme: config.address_scheme,
            replica_set_id: config.replica_set_id,
            config_server: config.config_server,
            primary_label: config.primary_label,
            directory,
            database,
        }
    }

    pub fn identity(&self) -> &ReplicaIdentity {
        &self.identity
    }

    /// Runs one cycle to completion or to its first error. Steps always run in the same order:
    /// list replicas, classify, then either bootstrap or (primary only) membership then marker.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let mut replicas = self.directory.list_replicas().await.map_err(CycleError::ListReplicas)?;

        let live: Vec<ReplicaRecord> = replicas.iter().filter(|r| r.is_live()).cloned().collect();
        if live.is_empty() {
            return Ok(CycleOutcome::NoRunningReplicas);
        }

        match self.classify_local().await {
            ReplicationGroupStatus::Uninitialized => self.bootstrap(&live).await.map(CycleOutcome::Bootstrap),
            ReplicationGroupStatus::Member { local_role, .. } => {
                if local_role != MemberRole::Primary {
                    return Ok(CycleOutcome::NotPrimary(local_role));
                }

                let membership = self.reconcile_membership(&live).await?;
                let marker = self.sync_leader_marker(&mut replicas).await?;

                Ok(CycleOutcome::Primary { membership, marker })
            }
            ReplicationGroupStatus::Fatal(e) => Err(CycleError::LocalStatus(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{DatabaseError, GroupMember};
    use crate::reconciler::test_utils::{
        group_config, live_replica, member, reconciler_for, status, FakeDatabase, FakeDirectory,
    };

    #[tokio::test]
    async fn secondary_does_nothing() {
        let directory = FakeDirectory::with_replicas(vec![live_replica("mongo-0"), live_replica("mongo-1")]);
        let database = FakeDatabase::default();
        database.set_local_status(Ok(status(&[("mongo-0", "PRIMARY"), ("mongo-1", "SECONDARY")])));
        let reconciler = reconciler_for("mongo-1", directory.clone(), database.clone());

        let outcome = reconciler.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::NotPrimary(MemberRole::Secondary));
        assert_eq!(database.config_fetches(), 0);
        assert!(directory.patches().is_empty());
    }

    #[tokio::test]
    async fn invalid_config_is_surfaced_without_remediation() {
        let directory = FakeDirectory::with_replicas(vec![live_replica("mongo-0")]);
        let database = FakeDatabase::default();
        database.set_local_status(Err(DatabaseError::InvalidReplicationConfig("bad config".into())));
        let reconciler = reconciler_for("mongo-0", directory.clone(), database.clone());

        let result = reconciler.run_cycle().await;

        assert!(matches!(
            result,
            Err(CycleError::LocalStatus(DatabaseError::InvalidReplicationConfig(_)))
        ));
        assert!(database.initiations().is_empty());
        assert!(database.reconfigurations().is_empty());
    }

    #[tokio::test]
    async fn listing_failure_ends_cycle() {
        let directory = FakeDirectory::default();
        directory.fail_listing();
        let database = FakeDatabase::default();
        let reconciler = reconciler_for("mongo-0", directory, database.clone());

        let result = reconciler.run_cycle().await;

        assert!(matches!(result, Err(CycleError::ListReplicas(_))));
        assert_eq!(database.local_status_queries(), 0);
    }

    #[tokio::test]
    async fn no_live_replicas() {
        let mut pending = live_replica("mongo-0");
        pending.running = false;
        let directory = FakeDirectory::with_replicas(vec![pending]);
        let database = FakeDatabase::default();
        let reconciler = reconciler_for("mongo-0", directory, database.clone());

        assert_eq!(reconciler.run_cycle().await.unwrap(), CycleOutcome::NoRunningReplicas);
        assert_eq!(database.local_status_queries(), 0);
    }

    #[tokio::test]
    async fn primary_adds_new_replica_and_marks_itself() {
        let directory = FakeDirectory::with_replicas(vec![
            live_replica("mongo-0"),
            live_replica("mongo-1"),
            live_replica("mongo-2"),
            live_replica("mongo-3"),
        ]);
        let database = FakeDatabase::default();
        database.set_local_status(Ok(status(&[
            ("mongo-0", "PRIMARY"),
            ("mongo-1", "SECONDARY"),
            ("mongo-2", "SECONDARY"),
        ])));
        database.set_config(Ok(group_config(&["mongo-0", "mongo-1", "mongo-2"])));
        let reconciler = reconciler_for("mongo-0", directory.clone(), database.clone());

        let outcome = reconciler.run_cycle().await.unwrap();

        let expected: Vec<GroupMember> = ["mongo-0", "mongo-1", "mongo-2", "mongo-3"]
            .iter()
            .map(|name| member(name))
            .collect();
        let reconfigurations = database.reconfigurations();
        assert_eq!(reconfigurations.len(), 1);
        assert_eq!(reconfigurations[0].members, expected);

        match outcome {
            CycleOutcome::Primary { membership, marker } => {
                assert_eq!(
                    membership,
                    MembershipOutcome::Reconfigured {
                        previous: expected[..3].to_vec(),
                        members: expected.clone(),
                    }
                );
                assert_eq!(marker.marked, vec!["mongo-0".to_string()]);
                assert!(marker.unmarked.is_empty());
            }
            other => panic!("Unexpected outcome {:?}", other),
        }
        assert!(directory.replica("mongo-0").has_label("mongo-primary", "true"));
    }
}
