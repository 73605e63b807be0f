use serde::Serialize;
use crate::types::google_drive::RemoteEntry;

/// Node type used when the options do not name one.
pub const DEFAULT_NODE_TYPE: &str = "gDriveContent";

/// A content node handed to the host's node registry.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ContentNode {
    pub id: String,
    pub description: String,
    pub name: String,
    pub internal: NodeInternal,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeInternal {
    pub content_digest: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

impl ContentNode {
    pub fn from_entry(entry: &RemoteEntry, node_type: &str) -> Self {
        Self {
            id: entry.id().to_string(),
            description: entry.description().unwrap_or_default().to_string(),
            name: entry.name().to_string(),
            internal: NodeInternal {
                content_digest: content_digest(entry),
                node_type: node_type.to_string(),
            },
        }
    }
}

/// `<id>_<modifiedTime>`. Changes exactly when the modification time changes.
pub fn content_digest(entry: &RemoteEntry) -> String {
    format!("{}_{}", entry.id(), entry.modified_time().unwrap_or_default())
}
