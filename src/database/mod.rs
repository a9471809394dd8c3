//! Everything the controller asks of a database process, local or remote.
mod api;
mod documents;
mod mongo;

pub use api::DatabaseError;
pub use api::DatabaseProcess;
pub use api::DatabaseTarget;
pub use documents::GroupMember;
pub use documents::MemberRole;
pub use documents::ReplicationGroupConfig;
pub use documents::StatusDocument;
pub use documents::StatusMember;
pub use mongo::DatabaseCredentials;
pub use mongo::DatabaseTimeouts;
pub use mongo::MongoDatabase;
