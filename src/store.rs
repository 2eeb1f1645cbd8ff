//! SQL statements for users, lists and items.
//!
//! Every function takes the caller's connection, normally a transaction, so a
//! whole operation commits or rolls back as one unit.

use sqlx::{query, query_as, SqliteConnection};

use crate::model::{Item, ItemId, ListId, TodoList, User, UserId};

const ITEM_COLUMNS: &str =
    "id, content, completed, collapsed, list_id, parent_id, level, created_at, updated_at";

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// Users

pub async fn insert_user(
    conn: &mut SqliteConnection,
    username: &str,
    password_hash: &str,
) -> sqlx::Result<User> {
    query_as::<_, User>(
        "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?) \
         RETURNING id, username, password_hash, created_at",
    )
    .bind(username)
    .bind(password_hash)
    .bind(now_millis())
    .fetch_one(&mut *conn)
    .await
}

pub async fn find_user(conn: &mut SqliteConnection, id: UserId) -> sqlx::Result<Option<User>> {
    query_as::<_, User>("SELECT id, username, password_hash, created_at FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_user_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> sqlx::Result<Option<User>> {
    query_as::<_, User>(
        "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn delete_user(conn: &mut SqliteConnection, id: UserId) -> sqlx::Result<u64> {
    Ok(query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected())
}

// Lists

pub async fn insert_list(
    conn: &mut SqliteConnection,
    user_id: UserId,
    title: &str,
) -> sqlx::Result<TodoList> {
    query_as::<_, TodoList>(
        "INSERT INTO lists (title, user_id, created_at) VALUES (?, ?, ?) \
         RETURNING id, title, user_id, created_at",
    )
    .bind(title)
    .bind(user_id)
    .bind(now_millis())
    .fetch_one(&mut *conn)
    .await
}

pub async fn find_list(conn: &mut SqliteConnection, id: ListId) -> sqlx::Result<Option<TodoList>> {
    query_as::<_, TodoList>("SELECT id, title, user_id, created_at FROM lists WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn lists_for_user(
    conn: &mut SqliteConnection,
    user_id: UserId,
) -> sqlx::Result<Vec<TodoList>> {
    query_as::<_, TodoList>(
        "SELECT id, title, user_id, created_at FROM lists WHERE user_id = ? ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn rename_list(
    conn: &mut SqliteConnection,
    id: ListId,
    title: &str,
) -> sqlx::Result<TodoList> {
    query_as::<_, TodoList>(
        "UPDATE lists SET title = ? WHERE id = ? RETURNING id, title, user_id, created_at",
    )
    .bind(title)
    .bind(id)
    .fetch_one(&mut *conn)
    .await
}

pub async fn delete_list(conn: &mut SqliteConnection, id: ListId) -> sqlx::Result<u64> {
    Ok(query("DELETE FROM lists WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected())
}

// Items

pub async fn insert_item(
    conn: &mut SqliteConnection,
    list_id: ListId,
    parent_id: Option<ItemId>,
    content: &str,
    level: i64,
) -> sqlx::Result<Item> {
    let now = now_millis();
    query_as::<_, Item>(&format!(
        "INSERT INTO items (content, completed, collapsed, list_id, parent_id, level, created_at, updated_at) \
         VALUES (?, 0, 0, ?, ?, ?, ?, ?) RETURNING {}",
        ITEM_COLUMNS
    ))
    .bind(content)
    .bind(list_id)
    .bind(parent_id)
    .bind(level)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
}

pub async fn find_item(conn: &mut SqliteConnection, id: ItemId) -> sqlx::Result<Option<Item>> {
    query_as::<_, Item>(&format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn items_in_list(conn: &mut SqliteConnection, list_id: ListId) -> sqlx::Result<Vec<Item>> {
    query_as::<_, Item>(&format!(
        "SELECT {} FROM items WHERE list_id = ? ORDER BY id",
        ITEM_COLUMNS
    ))
    .bind(list_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn items_for_user(
    conn: &mut SqliteConnection,
    user_id: UserId,
) -> sqlx::Result<Vec<Item>> {
    query_as::<_, Item>(
        "SELECT i.id, i.content, i.completed, i.collapsed, i.list_id, i.parent_id, i.level, \
         i.created_at, i.updated_at FROM items i JOIN lists l ON l.id = i.list_id \
         WHERE l.user_id = ? ORDER BY i.id",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn all_items(conn: &mut SqliteConnection) -> sqlx::Result<Vec<Item>> {
    query_as::<_, Item>(&format!("SELECT {} FROM items ORDER BY id", ITEM_COLUMNS))
        .fetch_all(&mut *conn)
        .await
}

pub async fn update_content(
    conn: &mut SqliteConnection,
    id: ItemId,
    content: &str,
) -> sqlx::Result<()> {
    query("UPDATE items SET content = ?, updated_at = ? WHERE id = ?")
        .bind(content)
        .bind(now_millis())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn set_completed(
    conn: &mut SqliteConnection,
    ids: &[ItemId],
    completed: bool,
) -> sqlx::Result<()> {
    let now = now_millis();
    for &id in ids {
        query("UPDATE items SET completed = ?, updated_at = ? WHERE id = ?")
            .bind(completed)
            .bind(now)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn set_collapsed(
    conn: &mut SqliteConnection,
    id: ItemId,
    collapsed: bool,
) -> sqlx::Result<()> {
    query("UPDATE items SET collapsed = ?, updated_at = ? WHERE id = ?")
        .bind(collapsed)
        .bind(now_millis())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn set_parent(
    conn: &mut SqliteConnection,
    id: ItemId,
    parent_id: Option<ItemId>,
) -> sqlx::Result<()> {
    query("UPDATE items SET parent_id = ?, updated_at = ? WHERE id = ?")
        .bind(parent_id)
        .bind(now_millis())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Writes the owning list and depth of one row.
pub async fn set_placement(
    conn: &mut SqliteConnection,
    id: ItemId,
    list_id: ListId,
    level: i64,
) -> sqlx::Result<()> {
    query("UPDATE items SET list_id = ?, level = ?, updated_at = ? WHERE id = ?")
        .bind(list_id)
        .bind(level)
        .bind(now_millis())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Deletes rows in the given order; callers pass descendants before ancestors.
pub async fn delete_items(conn: &mut SqliteConnection, ids: &[ItemId]) -> sqlx::Result<u64> {
    let mut removed = 0;
    for &id in ids {
        removed += query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }
    Ok(removed)
}

pub async fn delete_items_in_list(conn: &mut SqliteConnection, list_id: ListId) -> sqlx::Result<u64> {
    Ok(query("DELETE FROM items WHERE list_id = ?")
        .bind(list_id)
        .execute(&mut *conn)
        .await?
        .rows_affected())
}
