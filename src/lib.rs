mod config;
mod control_loop;
mod database;
mod directory;
mod identity;
mod logger;
mod reconciler;

pub use config::ConfigError;
pub use config::ControllerConfig;
pub use config::ControllerOptions;
pub use control_loop::shutdown_signal;
pub use control_loop::Clock;
pub use control_loop::ControlLoop;
pub use control_loop::RealClock;
pub use control_loop::ShutdownHandle;
pub use control_loop::ShutdownSignal;
pub use database::DatabaseCredentials;
pub use database::DatabaseError;
pub use database::DatabaseProcess;
pub use database::DatabaseTarget;
pub use database::DatabaseTimeouts;
pub use database::GroupMember;
pub use database::MemberRole;
pub use database::MongoDatabase;
pub use database::ReplicationGroupConfig;
pub use database::StatusDocument;
pub use database::StatusMember;
pub use directory::ClusterDirectory;
pub use directory::DirectoryError;
pub use directory::KubeDirectory;
pub use identity::parse_ordinal;
pub use identity::AddressScheme;
pub use identity::IdentityError;
pub use identity::Ordinal;
pub use identity::ReplicaIdentity;
pub use identity::ReplicaRecord;
pub use logger::create_root_logger_for_file;
pub use logger::create_root_logger_for_stdout;
pub use reconciler::classify_status;
pub use reconciler::desired_membership;
pub use reconciler::BootstrapOutcome;
pub use reconciler::CycleError;
pub use reconciler::CycleOutcome;
pub use reconciler::MarkerOutcome;
pub use reconciler::MembershipOutcome;
pub use reconciler::Reconciler;
pub use reconciler::ReconcilerConfig;
pub use reconciler::ReplicationGroupStatus;
