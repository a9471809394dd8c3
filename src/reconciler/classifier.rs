use crate::database::{DatabaseError, DatabaseProcess, DatabaseTarget, MemberRole, StatusDocument, StatusMember};
use crate::directory::ClusterDirectory;
use crate::reconciler::cycle::Reconciler;

/// ReplicationGroupStatus is the local replica's relationship to the replication group. It decides
/// which branch the rest of the cycle takes.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplicationGroupStatus {
    /// The process isn't running with replication yet (code 94).
    Uninitialized,
    /// The process is in a group. `members` always contains the local replica, whose role is
    /// `local_role`.
    Member {
        members: Vec<StatusMember>,
        local_role: MemberRole,
    },
    /// Invalid replication config (code 93), any other command failure, an unreachable process or
    /// a reply that doesn't have the expected shape.
    Fatal(DatabaseError),
}

/// Classifies a status query of the local process. `local_address` is this replica's `host:port`
/// as it appears in the group.
pub fn classify_status(
    result: Result<StatusDocument, DatabaseError>,
    local_address: &str,
) -> ReplicationGroupStatus {
    let status = match result {
        Ok(status) => status,
        Err(e) => {
            return match e.code() {
                Some(DatabaseError::NOT_YET_INITIALIZED) => ReplicationGroupStatus::Uninitialized,
                _ => ReplicationGroupStatus::Fatal(e),
            }
        }
    };

    let local_role = match status.member(local_address) {
        Some(local_member) => local_member.role.clone(),
        None => {
            return ReplicationGroupStatus::Fatal(DatabaseError::MalformedDocument {
                document: "replSetGetStatus",
                reason: format!("member list does not contain local replica '{}'", local_address),
            })
        }
    };

    ReplicationGroupStatus::Member {
        members: status.members,
        local_role,
    }
}

impl<D, B> Reconciler<D, B>
where
    D: ClusterDirectory,
    B: DatabaseProcess,
{
    pub(super) async fn classify_local(&self) -> ReplicationGroupStatus {
        let result = self.database.replication_status(&DatabaseTarget::Local).await;
        let status = classify_status(result, &self.identity.full_address_with_port);

        match &status {
            ReplicationGroupStatus::Uninitialized => {
                slog::info!(self.logger, "Local database is not part of a replication group");
            }
            ReplicationGroupStatus::Member { local_role, members } => {
                slog::debug!(
                    self.logger,
                    "Local database is {:?} in a group of {} members",
                    local_role,
                    members.len()
                );
            }
            ReplicationGroupStatus::Fatal(_) => { /* Reported by the caller */ }
        }

        status
    }
}
