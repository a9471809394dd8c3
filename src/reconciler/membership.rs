use crate::database::{DatabaseProcess, GroupMember};
use crate::directory::ClusterDirectory;
use crate::identity::{AddressScheme, ReplicaRecord};
use crate::reconciler::cycle::{CycleError, Reconciler};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub enum MembershipOutcome {
    InSync,
    Reconfigured {
        previous: Vec<GroupMember>,
        members: Vec<GroupMember>,
    },
}

/// The member list the group should have: one `{ordinal, host:port}` per live replica, ascending by
/// ordinal. Two live replicas claiming the same ordinal is an error.
pub fn desired_membership(live: &[ReplicaRecord], scheme: &AddressScheme) -> Result<Vec<GroupMember>, CycleError> {
    let mut by_ordinal = HashMap::with_capacity(live.len());
    let mut members = Vec::with_capacity(live.len());

    for replica in live.iter().filter(|r| r.is_live()) {
        if let Some(first) = by_ordinal.insert(replica.ordinal, replica.name.as_str()) {
            return Err(CycleError::DuplicateOrdinal {
                ordinal: replica.ordinal,
                first: first.to_string(),
                second: replica.name.clone(),
            });
        }

        members.push(GroupMember::new(replica.ordinal, scheme.full_address_with_port(&replica.name)));
    }

    members.sort_by_key(|m| m.id);
    Ok(members)
}

impl<D, B> Reconciler<D, B>
where
    D: ClusterDirectory,
    B: DatabaseProcess,
{
    /// Primary only. Replaces the group's member list wholesale when it differs from the live
    /// replicas; does nothing otherwise.
    pub(super) async fn reconcile_membership(&self, live: &[ReplicaRecord]) -> Result<MembershipOutcome, CycleError> {
        let config = self.database.replication_config().await.map_err(CycleError::FetchConfig)?;
        let desired = desired_membership(live, &self.address_scheme)?;

        let current = config.members_sorted_by_id();
        if current == desired {
            return Ok(MembershipOutcome::InSync);
        }

        slog::info!(
            self.logger,
            "Reconfiguring replication group members {:?} -> {:?}",
            current,
            desired
        );
        let reconfigured = config.with_members(desired.clone());
        self.database
            .reconfigure(&reconfigured)
            .await
            .map_err(CycleError::Reconfigure)?;

        Ok(MembershipOutcome::Reconfigured {
            previous: current,
            members: desired,
        })
    }
}
