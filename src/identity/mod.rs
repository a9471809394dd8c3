mod address;
mod ordinal;
mod record;

pub use address::AddressScheme;
pub use address::ReplicaIdentity;
pub use ordinal::parse_ordinal;
pub use ordinal::IdentityError;
pub use ordinal::Ordinal;
pub use record::ReplicaRecord;
