//! One reconciliation cycle: classify the local replica, then bootstrap the group or, on the
//! primary, converge group membership and the primary marker.
mod bootstrap;
mod classifier;
mod cycle;
mod leader_marker;
mod membership;

#[cfg(test)]
mod test_utils;

pub use bootstrap::BootstrapOutcome;
pub use classifier::classify_status;
pub use classifier::ReplicationGroupStatus;
pub use cycle::CycleError;
pub use cycle::CycleOutcome;
pub use cycle::Reconciler;
pub use cycle::ReconcilerConfig;
pub use leader_marker::MarkerOutcome;
pub use membership::desired_membership;
pub use membership::MembershipOutcome;

#[cfg(test)]
pub(crate) use test_utils::{live_replica, reconciler_for, test_logger, FakeDatabase, FakeDirectory};
