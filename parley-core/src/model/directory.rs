use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// A record returned by the external user directory search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryEntry {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
}
