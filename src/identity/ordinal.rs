use std::fmt;

/// Ordinal is the stable numeric suffix the orchestrator gives each replica. It doubles as the
/// replica's member `_id` inside the replication group.
#[derive(Copy, Clone, Hash, PartialOrd, Ord, PartialEq, Eq)]
pub struct Ordinal(u32);

impl Ordinal {
    /// The replica allowed to create the replication group when none exists.
    pub const FIRST: Ordinal = Ordinal(0);

    pub fn new(ordinal: u32) -> Self {
        Ordinal(ordinal)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn is_first(&self) -> bool {
        *self == Self::FIRST
    }
}

impl fmt::Debug for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IdentityError {
    #[error("replica name '{0}' has no '-<ordinal>' suffix")]
    MissingOrdinalSeparator(String),
    #[error("replica name '{name}' has non-numeric ordinal suffix '{suffix}'")]
    InvalidOrdinal { name: String, suffix: String },
}

/// Parses the ordinal from the text after the *last* `-` of a replica name. Prefixes may contain
/// their own hyphens (`my-db-rs-3` is ordinal 3).
pub fn parse_ordinal(name: &str) -> Result<Ordinal, IdentityError> {
    let (_, suffix) = name
        .rsplit_once('-')
        .ok_or_else(|| IdentityError::MissingOrdinalSeparator(name.to_string()))?;

    // `u32::from_str` accepts a leading '+', which is never part of an orchestrator ordinal.
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdentityError::InvalidOrdinal {
            name: name.to_string(),
            suffix: suffix.to_string(),
        });
    }

    suffix.parse::<u32>().map(Ordinal::new).map_err(|_| IdentityError::InvalidOrdinal {
        name: name.to_string(),
        suffix: suffix.to_string(),
    })
}
