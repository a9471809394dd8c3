use crate::database::api::DatabaseError;
use crate::identity::Ordinal;
use mongodb::bson::{self, doc, Bson, Document};
use serde::Deserialize;
use std::convert::TryFrom;
use std::fmt::Display;

// ------- replSetGetStatus --------

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MemberRole {
    Primary,
    Secondary,
    /// STARTUP, RECOVERING, ARBITER, DOWN, ... Kept verbatim for logging.
    Other(String),
}

impl MemberRole {
    fn from_state_str(state_str: &str) -> Self {
        match state_str {
            "PRIMARY" => MemberRole::Primary,
            "SECONDARY" => MemberRole::Secondary,
            other => MemberRole::Other(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusMember {
    /// `host:port` as the member is known inside the group.
    pub address: String,
    pub role: MemberRole,
}

/// StatusDocument is the typed reply of `replSetGetStatus`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusDocument {
    pub group_id: String,
    pub members: Vec<StatusMember>,
}

#[derive(Deserialize)]
struct StatusReply {
    #[serde(default)]
    set: String,
    members: Vec<StatusReplyMember>,
}

#[derive(Deserialize)]
struct StatusReplyMember {
    name: String,
    #[serde(rename = "stateStr")]
    state_str: String,
}

impl StatusDocument {
    pub fn new(group_id: impl Into<String>, members: Vec<StatusMember>) -> Self {
        StatusDocument {
            group_id: group_id.into(),
            members,
        }
    }

    pub fn from_document(document: Document) -> Result<Self, DatabaseError> {
        let reply: StatusReply = bson::from_document(document).map_err(|e| malformed("replSetGetStatus", e))?;

        let members = reply
            .members
            .into_iter()
            .map(|m| StatusMember {
                role: MemberRole::from_state_str(&m.state_str),
                address: m.name,
            })
            .collect();

        Ok(StatusDocument::new(reply.set, members))
    }

    pub fn member(&self, address: &str) -> Option<&StatusMember> {
        self.members.iter().find(|m| m.address == address)
    }
}

// ------- replSetGetConfig / replSetReconfig / replSetInitiate --------

/// GroupMember is one `{_id, host}` entry of the persisted member list. `_id` is the replica's
/// ordinal.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct GroupMember {
    pub id: Ordinal,
    pub host: String,
}

impl GroupMember {
    pub fn new(id: Ordinal, host: impl Into<String>) -> Self {
        GroupMember { id, host: host.into() }
    }
}

/// ReplicationGroupConfig is the persisted membership document. Fields the controller doesn't
/// model (settings, protocolVersion, per-member options of untouched documents, ...) are carried
/// along so that a reconfiguration only changes the member list and version.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplicationGroupConfig {
    pub group_id: String,
    pub version: i32,
    pub members: Vec<GroupMember>,
    other_fields: Document,
}

#[derive(Deserialize)]
struct ConfigFields {
    #[serde(rename = "_id")]
    group_id: String,
    #[serde(default)]
    version: i64,
    members: Vec<ConfigMemberFields>,
}

#[derive(Deserialize)]
struct ConfigMemberFields {
    #[serde(rename = "_id")]
    id: i64,
    host: String,
}

impl ReplicationGroupConfig {
    /// The document for creating a brand-new group.
    pub fn initial(group_id: impl Into<String>, members: Vec<GroupMember>, config_server: bool) -> Self {
        let mut other_fields = Document::new();
        if config_server {
            other_fields.insert("configsvr", true);
        }

        ReplicationGroupConfig {
            group_id: group_id.into(),
            version: 1,
            members,
            other_fields,
        }
    }

    /// Decodes the reply of `replSetGetConfig`, which nests the config under `config`.
    pub fn from_get_config_reply(reply: Document) -> Result<Self, DatabaseError> {
        let config = reply
            .get_document("config")
            .map_err(|e| malformed("replSetGetConfig", e))?
            .clone();

        Self::from_document(config)
    }

    pub fn from_document(document: Document) -> Result<Self, DatabaseError> {
        let fields: ConfigFields = bson::from_document(document.clone()).map_err(|e| malformed("replica set config", e))?;

        let version = i32::try_from(fields.version)
            .map_err(|_| malformed("replica set config", format!("version {} out of range", fields.version)))?;

        let mut members = Vec::with_capacity(fields.members.len());
        for member in fields.members {
            let id = u32::try_from(member.id)
                .map_err(|_| malformed("replica set config", format!("member _id {} is not an ordinal", member.id)))?;
            members.push(GroupMember::new(Ordinal::new(id), member.host));
        }

        let mut other_fields = document;
        for key in &["_id", "version", "members"] {
            other_fields.remove(key);
        }

        Ok(ReplicationGroupConfig {
            group_id: fields.group_id,
            version,
            members,
            other_fields,
        })
    }

    pub fn to_document(&self) -> Result<Document, DatabaseError> {
        let mut members = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let id = i32::try_from(member.id.as_u32())
                .map_err(|_| malformed("replica set config", format!("ordinal {} exceeds member _id range", member.id)))?;
            members.push(Bson::Document(doc! { "_id": id, "host": member.host.clone() }));
        }

        let mut document = doc! {
            "_id": self.group_id.clone(),
            "version": self.version,
            "members": members,
        };
        for (key, value) in self.other_fields.iter() {
            document.insert(key.clone(), value.clone());
        }

        Ok(document)
    }

    /// A copy with `members` replacing the member list, ready for `replSetReconfig`: the version is
    /// bumped and the election term, which only the primary may set, is dropped.
    pub fn with_members(&self, members: Vec<GroupMember>) -> Self {
        let mut other_fields = self.other_fields.clone();
        other_fields.remove("term");

        ReplicationGroupConfig {
            group_id: self.group_id.clone(),
            version: self.version + 1,
            members,
            other_fields,
        }
    }

    pub fn members_sorted_by_id(&self) -> Vec<GroupMember> {
        let mut members = self.members.clone();
        members.sort_by_key(|m| m.id);
        members
    }

    pub fn is_config_server(&self) -> bool {
        self.other_fields.get_bool("configsvr").unwrap_or(false)
    }
}

fn malformed(document: &'static str, reason: impl Display) -> DatabaseError {
    DatabaseError::MalformedDocument {
        document,
        reason: reason.to_string(),
    }
}
