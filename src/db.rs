//! Database connection, schema creation and startup repair.

use std::{str::FromStr, sync::Arc, time::Duration};

use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Sqlite, SqlitePool,
};
use tokio::sync::Mutex;

use crate::{store, tree::ItemForest};

const SCHEMA: [&str; 5] = [
    r#"CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );"#,
    r#"CREATE TABLE IF NOT EXISTS lists (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at INTEGER NOT NULL
    );"#,
    r#"CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content TEXT NOT NULL,
        completed BOOLEAN NOT NULL DEFAULT 0,
        collapsed BOOLEAN NOT NULL DEFAULT 0,
        list_id INTEGER NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
        parent_id INTEGER REFERENCES items(id) ON DELETE CASCADE,
        level INTEGER NOT NULL DEFAULT 1,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );"#,
    "CREATE INDEX IF NOT EXISTS idx_items_parent ON items(parent_id);",
    "CREATE INDEX IF NOT EXISTS idx_items_list ON items(list_id);",
];

/// Held for the whole of every writing transaction.
///
/// `pool.begin()` opens a deferred transaction that reads before it writes; two of
/// them upgrading to a write lock at once would fail with `SQLITE_BUSY`.
pub type WriteLock = Arc<Mutex<()>>;

pub fn write_lock() -> WriteLock {
    Arc::new(Mutex::new(()))
}

/// Creates the database file if needed and opens a pool with foreign keys on.
pub async fn connect(database_url: &str) -> sqlx::Result<SqlitePool> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        tracing::info!(url = database_url, "creating database");
        Sqlite::create_database(database_url).await?;
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;
    tracing::info!(url = database_url, "connected to database");
    Ok(pool)
}

/// Single-connection pool over a private in-memory database.
pub async fn connect_in_memory() -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

pub async fn create_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!("schema ready");
    Ok(())
}

/// Recomputes `level` and `list_id` for every stored item from its parent chain.
///
/// Runs once at startup so rows imported without levels, or subtrees left behind
/// in an old list, match the tree again. Returns the number of rows rewritten.
pub async fn repair_tree(pool: &SqlitePool) -> sqlx::Result<usize> {
    let mut tx = pool.begin().await?;
    let forest = ItemForest::new(store::all_items(&mut tx).await?);
    if forest.is_empty() {
        tracing::debug!("no items to repair");
        return Ok(0);
    }
    let (repairs, cyclic) = forest.repairs();

    if !cyclic.is_empty() {
        tracing::warn!(?cyclic, "items on a parent cycle were left untouched");
    }
    for repair in &repairs {
        tracing::warn!(
            item_id = repair.id,
            level = repair.level,
            list_id = repair.list_id,
            "repairing item placement"
        );
        store::set_placement(&mut tx, repair.id, repair.list_id, repair.level).await?;
    }

    tx.commit().await?;
    tracing::info!(items = forest.len(), repaired = repairs.len(), "tree repair finished");
    Ok(repairs.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repair_tree_fixes_levels_and_lists() {
        let pool = connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let user = store::insert_user(&mut conn, "ada", "x").await.unwrap();
        let home = store::insert_list(&mut conn, user.id, "Home").await.unwrap();
        let work = store::insert_list(&mut conn, user.id, "Work").await.unwrap();
        let a = store::insert_item(&mut conn, home.id, None, "A", 1).await.unwrap();
        // Imported without levels and left behind in the wrong list.
        let b = store::insert_item(&mut conn, work.id, Some(a.id), "B", 1).await.unwrap();
        let c = store::insert_item(&mut conn, work.id, Some(b.id), "C", 1).await.unwrap();
        drop(conn);

        assert_eq!(repair_tree(&pool).await.unwrap(), 2);

        let mut conn = pool.acquire().await.unwrap();
        let b = store::find_item(&mut conn, b.id).await.unwrap().unwrap();
        let c = store::find_item(&mut conn, c.id).await.unwrap().unwrap();
        assert_eq!((b.level, b.list_id), (2, home.id));
        assert_eq!((c.level, c.list_id), (3, home.id));
        drop(conn);

        assert_eq!(repair_tree(&pool).await.unwrap(), 0);
    }
}
