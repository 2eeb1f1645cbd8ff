//! Multi-user hierarchical to-do lists
//!
//! - tree: in-memory forest with validation, level and cascade logic
//! - service / accounts: transactional operations over SQLite
//! - handler / route / middleware: thin axum request layer

pub mod accounts;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod route;
pub mod schema;
pub mod service;
pub mod store;
pub mod tree;

use accounts::Accounts;
use config::Config;
use service::TreeManager;
use sqlx::SqlitePool;

// Struct representing the application state
pub struct AppState {
    pub db: SqlitePool,
    pub tree: TreeManager,
    pub accounts: Accounts,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &Config) -> Self {
        let writes = crate::db::write_lock();
        Self {
            tree: TreeManager::new(db.clone(), config.move_policy, writes.clone()),
            accounts: Accounts::new(
                db.clone(),
                config.jwt_secret.clone(),
                config.token_ttl_secs,
                writes,
            ),
            db,
        }
    }
}
