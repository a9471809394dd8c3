use crate::database::{DatabaseError, DatabaseProcess, DatabaseTarget, GroupMember, ReplicationGroupConfig};
use crate::directory::ClusterDirectory;
use crate::identity::ReplicaRecord;
use crate::reconciler::cycle::{CycleError, Reconciler};
use crate::reconciler::membership::desired_membership;

#[derive(Clone, Debug, PartialEq)]
pub enum BootstrapOutcome {
    /// This replica created the group.
    Initialized { members: Vec<GroupMember> },
    /// A group already exists elsewhere; its primary will add this replica.
    WaitingToBeAdded { member_replica: String },
    /// No group exists and this replica isn't the one that creates it.
    WaitingForInitializer,
    /// This replica would create the group but isn't yet reported running with an address.
    WaitingForSelf,
}

impl<D, B> Reconciler<D, B>
where
    D: ClusterDirectory,
    B: DatabaseProcess,
{
    /// Every uninitialized replica runs this. Only the first-ordinal replica ever creates the group,
    /// and only after every other live replica has confirmed it isn't in one.
    pub(super) async fn bootstrap(&self, live: &[ReplicaRecord]) -> Result<BootstrapOutcome, CycleError> {
        for replica in live.iter().filter(|r| r.name != self.identity.name) {
            if self.remote_is_member(replica).await? {
                slog::info!(
                    self.logger,
                    "Existing replication group found on '{}', waiting to be added",
                    replica.name
                );
                return Ok(BootstrapOutcome::WaitingToBeAdded {
                    member_replica: replica.name.clone(),
                });
            }
        }

        if !self.identity.ordinal.is_first() {
            slog::info!(
                self.logger,
                "Replication group not created yet and this is not the first replica, waiting"
            );
            return Ok(BootstrapOutcome::WaitingForInitializer);
        }

        if !live.iter().any(|r| r.name == self.identity.name) {
            slog::info!(self.logger, "Not yet reported as running by the directory, waiting");
            return Ok(BootstrapOutcome::WaitingForSelf);
        }

        let members = desired_membership(live, &self.address_scheme)?;
        let config = ReplicationGroupConfig::initial(self.replica_set_id.as_str(), members.clone(), self.config_server);

        slog::info!(
            self.logger,
            "Initiating replication group '{}' with members {:?}",
            config.group_id,
            members;
            "config_server" => config.is_config_server()
        );
        self.database.initiate(&config).await.map_err(CycleError::Initiate)?;

        Ok(BootstrapOutcome::Initialized { members })
    }

    /// Asks the replica's own database directly. "Not running with replication" is a clean no;
    /// every other failure is an error because guessing could create a second group.
    async fn remote_is_member(&self, replica: &ReplicaRecord) -> Result<bool, CycleError> {
        let address = self.address_scheme.full_address(&replica.name);

        match self
            .database
            .replication_status(&DatabaseTarget::Remote(address.clone()))
            .await
        {
            Ok(_) => Ok(true),
            Err(DatabaseError::NotReplicating(_)) => Ok(false),
            Err(source) => Err(CycleError::RemoteStatus {
                replica: replica.name.clone(),
                address,
                source,
            }),
        }
    }
}
