use crate::database::DatabaseProcess;
use crate::directory::ClusterDirectory;
use crate::identity::ReplicaRecord;
use crate::reconciler::cycle::{CycleError, Reconciler};

const MARKER_VALUE: &str = "true";

/// Replica names whose labels were patched this cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkerOutcome {
    pub marked: Vec<String>,
    pub unmarked: Vec<String>,
}

impl MarkerOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.marked.is_empty() && self.unmarked.is_empty()
    }
}

impl<D, B> Reconciler<D, B>
where
    D: ClusterDirectory,
    B: DatabaseProcess,
{
    /// Primary only. Makes this replica the only one carrying the primary label. Every listed
    /// replica is considered, running or not, so a stale marker on a stopped replica is removed
    /// too. Replicas already in the right state are never patched.
    ///
    /// Patched records are replaced in `replicas` with what the directory returned.
    pub(super) async fn sync_leader_marker(&self, replicas: &mut [ReplicaRecord]) -> Result<MarkerOutcome, CycleError> {
        let mut outcome = MarkerOutcome::default();

        for replica in replicas.iter_mut() {
            let is_self = replica.name == self.identity.name;

            let mut labels = replica.labels.clone();
            if is_self {
                if replica.has_label(&self.primary_label, MARKER_VALUE) {
                    continue;
                }
                labels.insert(self.primary_label.clone(), MARKER_VALUE.to_string());
            } else if labels.remove(&self.primary_label).is_none() {
                continue;
            }

            let updated = self
                .directory
                .replace_labels(&replica.name, labels)
                .await
                .map_err(|source| CycleError::MarkReplica {
                    replica: replica.name.clone(),
                    source,
                })?;

            if is_self {
                slog::info!(self.logger, "Marked '{}' as primary", replica.name);
                outcome.marked.push(replica.name.clone());
            } else {
                slog::info!(self.logger, "Removed primary marker from '{}'", replica.name);
                outcome.unmarked.push(replica.name.clone());
            }

            *replica = updated;
        }

        Ok(outcome)
    }
}
