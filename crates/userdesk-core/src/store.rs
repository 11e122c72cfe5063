//! Storage seam for user records.
//!
//! The MCP layer only sees [`UserStore`]; the Postgres implementation lives in
//! `userdesk-adapter-pg`.

use crate::user::{NewUser, User, UserSummary};
use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a [`UserStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matches the requested id.
    #[error("User {id} not found")]
    NotFound { id: i32 },

    /// The store rejected or failed to run the statement.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl StoreError {
    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "not_found",
            StoreError::Persistence(_) => "persistence",
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users, ascending by id.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// `(id, name)` of every user, ascending by id.
    async fn list_user_summaries(&self) -> Result<Vec<UserSummary>, StoreError> {
        Ok(self.list_users().await?.iter().map(User::summary).collect())
    }

    /// The user with the given id, or [`StoreError::NotFound`].
    async fn get_user(&self, id: i32) -> Result<User, StoreError>;

    /// Insert one row and return the generated id. No retry.
    async fn insert_user(&self, user: &NewUser) -> Result<i32, StoreError>;
}
