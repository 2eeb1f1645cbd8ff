pub type UserId = i64;
pub type ListId = i64;
pub type ItemId = i64;

// Account record; the credential is an opaque PBKDF2 string and never serialized
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct User {
    pub(crate) id: UserId,
    pub(crate) username: String,
    #[serde(skip_serializing)]
    pub(crate) password_hash: String,
    pub(crate) created_at: i64,
}

// Data model representing a named list of top-level items
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize, serde::Deserialize)]
pub struct TodoList {
    pub(crate) id: ListId,
    pub(crate) title: String,
    pub(crate) user_id: UserId,
    pub(crate) created_at: i64,
}

// Data model representing one node of a list's item forest
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, serde::Serialize, serde::Deserialize)]
pub struct Item {
    pub(crate) id: ItemId,
    pub(crate) content: String,
    pub(crate) completed: bool,
    pub(crate) collapsed: bool,
    pub(crate) list_id: ListId,
    pub(crate) parent_id: Option<ItemId>,
    pub(crate) level: i64,
    pub(crate) created_at: i64,
    pub(crate) updated_at: i64,
}

impl Item {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// An item with its children populated recursively, as returned by tree reads.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ItemNode {
    #[serde(flatten)]
    pub(crate) item: Item,
    pub(crate) children: Vec<ItemNode>,
}

// Unwinds the children with a work list; the derived drop would recurse once per level.
impl Drop for ItemNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// A single item's subtree together with its breadcrumb chain (root first).
#[derive(Debug, Clone, serde::Serialize)]
pub struct ItemDetail {
    pub(crate) item: ItemNode,
    pub(crate) ancestors: Vec<Item>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MoveTargets {
    pub(crate) lists: Vec<TodoList>,
    pub(crate) items: Vec<Item>,
}

/// Where `move_item` attaches the moved subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    /// Attach as a top-level item of the list.
    List(ListId),
    /// Attach as a child of the item.
    Item(ItemId),
}

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub(crate) user_id: UserId,
    pub(crate) username: String,
}
