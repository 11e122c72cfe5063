//! Read-only resources backed by the user store.
//!
//! | URI | Name | Contents |
//! |-----|------|----------|
//! | `user://list` | `user-list` | every user, as a JSON array |
//! | `user://{userId}/profile` | `user-details` | one user, as a JSON object |

use crate::error::ResourceError;
use crate::protocol::{ResourceContents, ResourceDefinition, ResourceTemplateDefinition};
use serde::Serialize;
use std::sync::Arc;
use userdesk_core::UserStore;

pub const USER_LIST_URI: &str = "user://list";
pub const USER_PROFILE_TEMPLATE: &str = "user://{userId}/profile";
pub const JSON_MIME_TYPE: &str = "application/json";

const USER_SCHEME: &str = "user://";
const PROFILE_SUFFIX: &str = "/profile";

/// A parsed resource URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceUri {
    UserList,
    UserProfile(i32),
}

impl ResourceUri {
    pub fn parse(uri: &str) -> Result<Self, ResourceError> {
        if uri == USER_LIST_URI {
            return Ok(ResourceUri::UserList);
        }

        let id = uri
            .strip_prefix(USER_SCHEME)
            .and_then(|rest| rest.strip_suffix(PROFILE_SUFFIX))
            .ok_or_else(|| ResourceError::UnknownResource(uri.to_string()))?;

        id.parse::<i32>()
            .map(ResourceUri::UserProfile)
            .map_err(|_| ResourceError::InvalidUserId(id.to_string()))
    }
}

/// URI of a user's profile resource.
pub fn profile_uri(id: i32) -> String {
    format!("{}{}{}", USER_SCHEME, id, PROFILE_SUFFIX)
}

/// Serves the `user-list` and `user-details` resources.
#[derive(Clone)]
pub struct ResourceProvider {
    store: Arc<dyn UserStore>,
}

impl ResourceProvider {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// The static `user-list` resource followed by one profile per user.
    pub async fn list(&self) -> Result<Vec<ResourceDefinition>, ResourceError> {
        let summaries = self.store.list_user_summaries().await?;

        let mut resources = Vec::with_capacity(summaries.len() + 1);
        resources.push(ResourceDefinition {
            uri: USER_LIST_URI.to_string(),
            name: "user-list".to_string(),
            description: Some("All users, ordered by id".to_string()),
            mime_type: Some(JSON_MIME_TYPE.to_string()),
        });
        resources.extend(summaries.into_iter().map(|s| ResourceDefinition {
            uri: profile_uri(s.id),
            name: format!("User {} - {}", s.id, s.name),
            description: None,
            mime_type: Some(JSON_MIME_TYPE.to_string()),
        }));
        Ok(resources)
    }

    pub fn templates(&self) -> Vec<ResourceTemplateDefinition> {
        vec![ResourceTemplateDefinition {
            uri_template: USER_PROFILE_TEMPLATE.to_string(),
            name: "user-details".to_string(),
            description: Some("Full record of a single user".to_string()),
            mime_type: Some(JSON_MIME_TYPE.to_string()),
        }]
    }

    /// Read a resource by URI.
    pub async fn read(&self, uri: &str) -> Result<Vec<ResourceContents>, ResourceError> {
        let text = match ResourceUri::parse(uri)? {
            ResourceUri::UserList => {
                let users = self.store.list_users().await?;
                tracing::debug!(count = users.len(), "Read user list");
                to_pretty_json(&users)?
            }
            ResourceUri::UserProfile(id) => to_pretty_json(&self.store.get_user(id).await?)?,
        };

        Ok(vec![ResourceContents {
            uri: uri.to_string(),
            mime_type: JSON_MIME_TYPE.to_string(),
            text,
        }])
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, ResourceError> {
    Ok(serde_json::to_string_pretty(value)?)
}
