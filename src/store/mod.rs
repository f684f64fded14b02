//! SQLite-backed persistence for projects, branches, actions, secrets and the change log.
//!
//! Every write is a single statement or one short transaction. Concurrent
//! writers (ticks and the management API) rely on SQLite's own atomicity.

mod actions;
mod logs;
mod projects;
mod secrets;

use crate::db::{create_in_memory_pool, init_db};
use crate::error::PersistenceError;
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fresh, migrated in-memory store.
    pub async fn in_memory() -> Result<Self, PersistenceError> {
        let pool = create_in_memory_pool().await?;
        init_db(&pool).await?;
        Ok(Self::new(pool))
    }
}
