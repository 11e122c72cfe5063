//! The `users` table, as seen by the rest of the workspace.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A persisted user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier assigned by the store on insert.
    pub id: i32,
    pub name: String,
    pub email: String,
    pub address: String,
}

/// A user record that has not been persisted yet.
///
/// This is also the shape the completion endpoint is asked to produce, so
/// unknown keys in the generated JSON are ignored. Fields that arrive as
/// something other than a string (models like to nest `address`) are kept as
/// their JSON text; `null` becomes an empty string, as a `NULL` column reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    #[serde(deserialize_with = "text_or_json")]
    pub name: String,
    #[serde(deserialize_with = "text_or_json")]
    pub email: String,
    #[serde(deserialize_with = "text_or_json")]
    pub address: String,
}

fn text_or_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Enumeration view of a user (`SELECT id, name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
}

impl User {
    /// Build the persisted row from an inserted record and its new id.
    pub fn from_new(id: i32, new_user: NewUser) -> Self {
        Self {
            id,
            name: new_user.name,
            email: new_user.email,
            address: new_user.address,
        }
    }

    /// The summary view of this row.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}
