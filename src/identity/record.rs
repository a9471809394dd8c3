use crate::identity::ordinal::{parse_ordinal, IdentityError, Ordinal};
use std::collections::BTreeMap;

/// ReplicaRecord is one replica as the cluster directory reports it. Records are read fresh every
/// cycle; the only in-place change is copying back the result of a label patch.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplicaRecord {
    pub name: String,
    pub ordinal: Ordinal,
    pub running: bool,
    // Empty until the replica has been scheduled and given an address.
    pub address: String,
    pub labels: BTreeMap<String, String>,
}

impl ReplicaRecord {
    /// A name without a numeric suffix is an error, never a record to skip.
    pub fn new(
        name: impl Into<String>,
        running: bool,
        address: impl Into<String>,
        labels: BTreeMap<String, String>,
    ) -> Result<Self, IdentityError> {
        let name = name.into();
        let ordinal = parse_ordinal(&name)?;

        Ok(ReplicaRecord {
            name,
            ordinal,
            running,
            address: address.into(),
            labels,
        })
    }

    /// Running and addressable; the only records that count towards group membership.
    pub fn is_live(&self) -> bool {
        self.running && !self.address.is_empty()
    }

    pub fn has_label(&self, key: &str, value: &str) -> bool {
        self.labels.get(key).map(String::as_str) == Some(value)
    }

    pub fn has_label_key(&self, key: &str) -> bool {
        self.labels.contains_key(key)
    }
}
