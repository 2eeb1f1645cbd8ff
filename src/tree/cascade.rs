//! Cascades from a node onto its whole subtree.

use super::ItemForest;
use crate::model::ItemId;

impl ItemForest {
    /// Forces `completed` onto `root` and every descendant.
    ///
    /// The value is fixed at the root; descendants are overwritten regardless of
    /// their prior state. Returns the affected ids in pre-order.
    pub fn set_completed(&mut self, root: ItemId, completed: bool) -> Vec<ItemId> {
        let ids = self.subtree(root);
        for id in &ids {
            if let Some(item) = self.items.get_mut(id) {
                item.completed = completed;
            }
        }
        ids
    }

    /// Ids to delete for removing `root` as one unit, descendants before ancestors.
    pub fn deletion_order(&self, root: ItemId) -> Vec<ItemId> {
        let mut ids = self.subtree(root);
        ids.reverse();
        ids
    }
}
