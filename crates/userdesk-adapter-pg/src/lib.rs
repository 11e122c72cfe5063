//! Postgres implementation of [`UserStore`].
//!
//! Every statement binds its inputs; nothing is interpolated into SQL text.

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use userdesk_core::{DatabaseConfig, NewUser, StoreError, User, UserStore, UserSummary};

const LIST_USERS_SQL: &str = "SELECT id, name, email, address FROM users ORDER BY id";
const LIST_SUMMARIES_SQL: &str = "SELECT id, name FROM users ORDER BY id";
const GET_USER_SQL: &str = "SELECT id, name, email, address FROM users WHERE id = $1";
const INSERT_USER_SQL: &str =
    "INSERT INTO users (name, email, address) VALUES ($1, $2, $3) RETURNING id";

#[derive(Debug, Clone, Copy)]
pub struct PostgresUserStoreOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PostgresUserStoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&DatabaseConfig> for PostgresUserStoreOptions {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            acquire_timeout: Duration::from_secs(config.acquire_timeout_secs),
        }
    }
}

/// User store backed by a `users` table in Postgres.
///
/// Owns its connection pool; call [`PostgresUserStore::close`] on shutdown.
#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Open a pool against `database_url`.
    pub async fn connect(
        database_url: &str,
        options: PostgresUserStoreOptions,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(database_url)
            .await?;
        tracing::info!(
            max_connections = options.max_connections,
            "Connected to Postgres"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Postgres pool closed");
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(LIST_USERS_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence)?;
        tracing::debug!(count = rows.len(), "Listed users");
        rows.iter().map(row_to_user).collect()
    }

    async fn list_user_summaries(&self) -> Result<Vec<UserSummary>, StoreError> {
        let rows = sqlx::query(LIST_SUMMARIES_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence)?;
        rows.iter()
            .map(|row| {
                Ok(UserSummary {
                    id: row.try_get("id").map_err(persistence)?,
                    name: text_column(row, "name")?,
                })
            })
            .collect()
    }

    async fn get_user(&self, id: i32) -> Result<User, StoreError> {
        let row = sqlx::query(GET_USER_SQL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence)?;
        match row {
            Some(row) => row_to_user(&row),
            None => Err(StoreError::NotFound { id }),
        }
    }

    async fn insert_user(&self, user: &NewUser) -> Result<i32, StoreError> {
        let row = sqlx::query(INSERT_USER_SQL)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.address)
            .fetch_one(&self.pool)
            .await
            .map_err(persistence)?;
        let id: i32 = row.try_get("id").map_err(persistence)?;
        tracing::info!(id, "Inserted user");
        Ok(id)
    }
}

fn persistence(e: sqlx::Error) -> StoreError {
    StoreError::Persistence(e.to_string())
}

// Columns are nullable in hand-made schemas; NULL reads as an empty string.
fn text_column(row: &PgRow, name: &str) -> Result<String, StoreError> {
    let value: Option<String> = row.try_get(name).map_err(persistence)?;
    Ok(value.unwrap_or_default())
}

fn row_to_user(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: row.try_get("id").map_err(persistence)?,
        name: text_column(row, "name")?,
        email: text_column(row, "email")?,
        address: text_column(row, "address")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_bind_parameters() {
        assert!(GET_USER_SQL.ends_with("WHERE id = $1"));
        assert!(INSERT_USER_SQL.contains("VALUES ($1, $2, $3)"));
        assert!(INSERT_USER_SQL.ends_with("RETURNING id"));
    }

    #[test]
    fn test_list_statements_are_ordered_by_id() {
        assert!(LIST_USERS_SQL.ends_with("ORDER BY id"));
        assert!(LIST_SUMMARIES_SQL.ends_with("ORDER BY id"));
    }

    #[test]
    fn test_options_from_config() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 3,
            acquire_timeout_secs: 7,
        };
        let options = PostgresUserStoreOptions::from(&config);
        assert_eq!(options.max_connections, 3);
        assert_eq!(options.acquire_timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_persistence_error_keeps_message() {
        let err = persistence(sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), "persistence");
        assert!(err.to_string().contains("pool timed out"));
    }
}
