//! In-memory fakes for the store and completion seams.

use async_trait::async_trait;
use std::sync::Mutex;
use userdesk_core::{NewUser, StoreError, User, UserStore};
use userdesk_llm::{CompletionClient, CompletionError};

/// `UserStore` over a vector, assigning ids like a `SERIAL` column.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    fail_writes: bool,
    fail_reads: bool,
}

impl MemoryUserStore {
    /// Store seeded with `(name, email, address)` rows, ids starting at 1.
    pub fn with_users(rows: &[(&str, &str, &str)]) -> Self {
        let users = rows
            .iter()
            .enumerate()
            .map(|(i, (name, email, address))| User {
                id: i as i32 + 1,
                name: name.to_string(),
                email: email.to_string(),
                address: address.to_string(),
            })
            .collect();
        Self {
            users: Mutex::new(users),
            fail_writes: false,
            fail_reads: false,
        }
    }

    /// Every insert fails with a persistence error.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Every read fails with a persistence error.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Persistence("connection reset".to_string()));
        }
        Ok(self.users.lock().unwrap().clone())
    }

    async fn get_user(&self, id: i32) -> Result<User, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Persistence("connection reset".to_string()));
        }
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    async fn insert_user(&self, user: &NewUser) -> Result<i32, StoreError> {
        if self.fail_writes {
            return Err(StoreError::Persistence("connection reset".to_string()));
        }
        let mut users = self.users.lock().unwrap();
        let id = users.last().map(|u| u.id + 1).unwrap_or(1);
        users.push(User::from_new(id, user.clone()));
        Ok(id)
    }
}

/// Completion client that replays a fixed reply and records the models asked for.
pub struct ScriptedCompletion {
    reply: Result<String, u16>,
    models: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            models: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as if the endpoint returned `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            models: Mutex::new(Vec::new()),
        }
    }

    pub fn models(&self) -> Vec<String> {
        self.models.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, model: &str, _prompt: &str) -> Result<String, CompletionError> {
        self.models.lock().unwrap().push(model.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(CompletionError::Upstream {
                status: *status,
                body: "error".to_string(),
            }),
        }
    }
}
