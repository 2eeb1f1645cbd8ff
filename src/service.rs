//! Item tree operations
//!
//! Each public method runs in a single transaction: ownership and structural
//! validation happen first, writes follow, and the commit is the last step.
//! An error anywhere drops the transaction, so no partial cascade is visible.
//!
//! Writing methods hold the shared `WriteLock` from before `begin` until commit.
//!
//! Cross-user access is reported as `NotFound`, the same as a missing row.

use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    config::MovePolicy,
    db::WriteLock,
    error::{require_text, AppError, AppResult},
    model::{
        Item, ItemDetail, ItemId, ItemNode, ListId, MoveTarget, MoveTargets, TodoList, UserId,
    },
    store,
    tree::{self, ItemForest, MAX_LEVEL},
};

#[derive(Debug, Clone)]
pub struct TreeManager {
    pool: SqlitePool,
    move_policy: MovePolicy,
    writes: WriteLock,
}

impl TreeManager {
    pub fn new(pool: SqlitePool, move_policy: MovePolicy, writes: WriteLock) -> Self {
        Self {
            pool,
            move_policy,
            writes,
        }
    }

    // Lists

    pub async fn create_list(&self, actor: UserId, title: &str) -> AppResult<TodoList> {
        let title = require_text(title, "List title")?;
        let _write = self.writes.lock().await;
        let mut tx = self.pool.begin().await?;
        if store::find_user(&mut tx, actor).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", actor)));
        }
        let list = store::insert_list(&mut tx, actor, title).await?;
        tx.commit().await?;
        tracing::info!(user_id = actor, list_id = list.id, "list created");
        Ok(list)
    }

    pub async fn lists_for(&self, actor: UserId) -> AppResult<Vec<TodoList>> {
        let mut conn = self.pool.acquire().await?;
        Ok(store::lists_for_user(&mut conn, actor).await?)
    }

    pub async fn rename_list(&self, actor: UserId, list_id: ListId, title: &str) -> AppResult<TodoList> {
        let title = require_text(title, "List title")?;
        let _write = self.writes.lock().await;
        let mut tx = self.pool.begin().await?;
        owned_list(&mut tx, actor, list_id).await?;
        let list = store::rename_list(&mut tx, list_id, title).await?;
        tx.commit().await?;
        tracing::info!(user_id = actor, list_id, "list renamed");
        Ok(list)
    }

    /// Deletes the list and every item in it.
    pub async fn delete_list(&self, actor: UserId, list_id: ListId) -> AppResult<()> {
        let _write = self.writes.lock().await;
        let mut tx = self.pool.begin().await?;
        owned_list(&mut tx, actor, list_id).await?;
        let removed = store::delete_items_in_list(&mut tx, list_id).await?;
        store::delete_list(&mut tx, list_id).await?;
        tx.commit().await?;
        tracing::info!(user_id = actor, list_id, items = removed, "list deleted");
        Ok(())
    }

    /// Root items of the list, each with its children populated recursively.
    pub async fn get_tree(&self, actor: UserId, list_id: ListId) -> AppResult<Vec<ItemNode>> {
        let mut tx = self.pool.begin().await?;
        owned_list(&mut tx, actor, list_id).await?;
        let forest = ItemForest::new(store::items_in_list(&mut tx, list_id).await?);
        tx.commit().await?;
        if forest.depth() > MAX_LEVEL {
            return Err(AppError::InvalidOperation(format!(
                "List {} nests deeper than {} levels",
                list_id, MAX_LEVEL
            )));
        }
        tracing::debug!(list_id, items = forest.len(), "tree loaded");
        Ok(forest.into_nodes())
    }

    // Items

    /// Creates an item under `parent_id`, or at the top of `list_id`.
    ///
    /// With only a parent the list is the parent's list; with both they must agree.
    pub async fn create_item(
        &self,
        actor: UserId,
        list_id: Option<ListId>,
        parent_id: Option<ItemId>,
        content: &str,
    ) -> AppResult<Item> {
        let content = require_text(content, "Item content")?;
        let _write = self.writes.lock().await;
        let mut tx = self.pool.begin().await?;

        let (list_id, level) = match (list_id, parent_id) {
            (_, Some(parent_id)) => {
                let (parent, _) = owned_item(&mut tx, actor, parent_id).await?;
                if list_id.is_some_and(|list_id| list_id != parent.list_id) {
                    return Err(AppError::NotFound(format!(
                        "Parent item {} not found",
                        parent_id
                    )));
                }
                let forest = ItemForest::new(store::items_in_list(&mut tx, parent.list_id).await?);
                (parent.list_id, forest.compute_level(parent.id)? + 1)
            }
            (Some(list_id), None) => {
                owned_list(&mut tx, actor, list_id).await?;
                (list_id, 1)
            }
            (None, None) => {
                return Err(AppError::InvalidInput(
                    "A list or parent item is required".to_string(),
                ))
            }
        };

        if level > MAX_LEVEL {
            return Err(too_deep());
        }

        let item = store::insert_item(&mut tx, list_id, parent_id, content, level).await?;
        tx.commit().await?;
        tracing::info!(user_id = actor, item_id = item.id, list_id, level, "item created");
        Ok(item)
    }

    pub async fn get_item(&self, actor: UserId, item_id: ItemId) -> AppResult<ItemDetail> {
        let mut tx = self.pool.begin().await?;
        let (item, _) = owned_item(&mut tx, actor, item_id).await?;
        let forest = ItemForest::new(store::items_in_list(&mut tx, item.list_id).await?);
        tx.commit().await?;
        if forest.height(item.id) > MAX_LEVEL {
            return Err(AppError::InvalidOperation(format!(
                "Item {} nests deeper than {} levels",
                item_id, MAX_LEVEL
            )));
        }

        let node = forest
            .subtree_node(item.id)
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", item_id)))?;
        Ok(ItemDetail {
            item: node,
            ancestors: forest.ancestors(item.id),
        })
    }

    /// Replaces the text only; structure is untouched.
    pub async fn edit_item(&self, actor: UserId, item_id: ItemId, content: &str) -> AppResult<Item> {
        self.update_item(actor, item_id, Some(content), None).await
    }

    /// Forces `completed` onto the item and its whole subtree.
    pub async fn set_completed(&self, actor: UserId, item_id: ItemId, completed: bool) -> AppResult<Item> {
        self.update_item(actor, item_id, None, Some(completed)).await
    }

    /// Applies a content edit and/or a completion cascade in one transaction.
    pub async fn update_item(
        &self,
        actor: UserId,
        item_id: ItemId,
        content: Option<&str>,
        completed: Option<bool>,
    ) -> AppResult<Item> {
        let content = content
            .map(|content| require_text(content, "Item content"))
            .transpose()?;
        let _write = self.writes.lock().await;
        let mut tx = self.pool.begin().await?;
        let (item, _) = owned_item(&mut tx, actor, item_id).await?;

        if let Some(content) = content {
            store::update_content(&mut tx, item_id, content).await?;
        }
        let item = match completed {
            Some(completed) => cascade_completed(&mut tx, &item, completed).await?,
            None => reload(&mut tx, item_id).await?,
        };
        tx.commit().await?;
        tracing::info!(
            user_id = actor,
            item_id,
            edited = content.is_some(),
            completed = ?completed,
            "item updated"
        );
        Ok(item)
    }

    /// Flips the item's own state once, then cascades that value downwards.
    pub async fn toggle_completed(&self, actor: UserId, item_id: ItemId) -> AppResult<Item> {
        let _write = self.writes.lock().await;
        let mut tx = self.pool.begin().await?;
        let (item, _) = owned_item(&mut tx, actor, item_id).await?;
        let completed = !item.completed;
        let item = cascade_completed(&mut tx, &item, completed).await?;
        tx.commit().await?;
        tracing::info!(user_id = actor, item_id, completed, "completion toggled");
        Ok(item)
    }

    /// UI-only flag; no cascade.
    pub async fn toggle_collapsed(&self, actor: UserId, item_id: ItemId) -> AppResult<Item> {
        let _write = self.writes.lock().await;
        let mut tx = self.pool.begin().await?;
        let (item, _) = owned_item(&mut tx, actor, item_id).await?;
        store::set_collapsed(&mut tx, item_id, !item.collapsed).await?;
        let item = reload(&mut tx, item_id).await?;
        tx.commit().await?;
        tracing::info!(user_id = actor, item_id, collapsed = item.collapsed, "collapse toggled");
        Ok(item)
    }

    /// Re-parents the item (and its subtree) under a list or another item.
    ///
    /// The subtree follows the item into the target's list and every level in it
    /// is re-derived from the new parent chain.
    pub async fn move_item(&self, actor: UserId, item_id: ItemId, target: MoveTarget) -> AppResult<Item> {
        let _write = self.writes.lock().await;
        let mut tx = self.pool.begin().await?;
        let (item, _) = owned_item(&mut tx, actor, item_id).await?;
        let mut forest = ItemForest::new(store::items_in_list(&mut tx, item.list_id).await?);

        let (new_parent, target_list_id, new_level) = match target {
            MoveTarget::List(list_id) => {
                owned_list(&mut tx, actor, list_id).await?;
                (None, list_id, 1)
            }
            MoveTarget::Item(target_id) => {
                let (target_item, _) = owned_item(&mut tx, actor, target_id).await?;
                tree::check_move_into(&forest, item.id, target_item.id)?;
                let target_level = if target_item.list_id == item.list_id {
                    forest.compute_level(target_item.id)?
                } else {
                    ItemForest::new(store::items_in_list(&mut tx, target_item.list_id).await?)
                        .compute_level(target_item.id)?
                };
                (Some(target_item.id), target_item.list_id, target_level + 1)
            }
        };

        if target_list_id != item.list_id
            && !item.is_root()
            && self.move_policy == MovePolicy::TopLevelOnly
        {
            return Err(AppError::InvalidOperation(
                "Only top-level items can be moved between lists".to_string(),
            ));
        }

        if new_level + forest.height(item.id) - 1 > MAX_LEVEL {
            return Err(too_deep());
        }

        let placements = forest.relevel(item.id, new_level);
        store::set_parent(&mut tx, item.id, new_parent).await?;
        for (id, level) in &placements {
            store::set_placement(&mut tx, *id, target_list_id, *level).await?;
        }
        let moved = reload(&mut tx, item.id).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = actor,
            item_id,
            from_list = item.list_id,
            to_list = target_list_id,
            parent_id = ?new_parent,
            subtree = placements.len(),
            "item moved"
        );
        Ok(moved)
    }

    /// Deletes the item and its whole subtree as one unit.
    pub async fn delete_item(&self, actor: UserId, item_id: ItemId) -> AppResult<()> {
        let _write = self.writes.lock().await;
        let mut tx = self.pool.begin().await?;
        let (item, _) = owned_item(&mut tx, actor, item_id).await?;
        let forest = ItemForest::new(store::items_in_list(&mut tx, item.list_id).await?);
        let order = forest.deletion_order(item.id);
        let removed = store::delete_items(&mut tx, &order).await?;
        tx.commit().await?;
        tracing::info!(user_id = actor, item_id, removed, "item deleted");
        Ok(())
    }

    /// Every list and item the actor may move something into.
    pub async fn move_targets(&self, actor: UserId) -> AppResult<MoveTargets> {
        let mut tx = self.pool.begin().await?;
        let lists = store::lists_for_user(&mut tx, actor).await?;
        let items = store::items_for_user(&mut tx, actor).await?;
        tx.commit().await?;
        Ok(MoveTargets { lists, items })
    }
}

/// Loads a list and requires `actor` to own it.
async fn owned_list(conn: &mut SqliteConnection, actor: UserId, list_id: ListId) -> AppResult<TodoList> {
    match store::find_list(conn, list_id).await? {
        Some(list) if list.user_id == actor => Ok(list),
        _ => Err(AppError::NotFound(format!("List {} not found", list_id))),
    }
}

/// Loads an item with its list and requires `actor` to own that list.
async fn owned_item(
    conn: &mut SqliteConnection,
    actor: UserId,
    item_id: ItemId,
) -> AppResult<(Item, TodoList)> {
    let not_found = || AppError::NotFound(format!("Item {} not found", item_id));
    let item = store::find_item(conn, item_id).await?.ok_or_else(not_found)?;
    let list = store::find_list(conn, item.list_id).await?.ok_or_else(not_found)?;
    if !tree::ownership_check(actor, &item, &list) {
        return Err(not_found());
    }
    Ok((item, list))
}

fn too_deep() -> AppError {
    AppError::InvalidOperation(format!("Items cannot nest deeper than {} levels", MAX_LEVEL))
}

async fn reload(conn: &mut SqliteConnection, item_id: ItemId) -> AppResult<Item> {
    store::find_item(conn, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {} not found", item_id)))
}

async fn cascade_completed(conn: &mut SqliteConnection, item: &Item, completed: bool) -> AppResult<Item> {
    let mut forest = ItemForest::new(store::items_in_list(conn, item.list_id).await?);
    let ids = forest.set_completed(item.id, completed);
    store::set_completed(conn, &ids, completed).await?;
    tracing::debug!(item_id = item.id, cascaded = ids.len(), "completion cascade");
    reload(conn, item.id).await
}
