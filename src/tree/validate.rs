//! Structural and ownership checks run before any write.

use super::ItemForest;
use crate::error::{AppError, AppResult};
use crate::model::{Item, ItemId, TodoList, UserId};

impl ItemForest {
    /// True iff `node` lies strictly below `ancestor`.
    ///
    /// Walks the parent chain of `node`; the walk is bounded by the arena size so
    /// corrupt cyclic data terminates.
    pub fn is_descendant(&self, ancestor: ItemId, node: ItemId) -> bool {
        let mut current = self.get(node).and_then(|item| item.parent_id);
        let mut hops = 0;
        while let Some(parent_id) = current {
            if parent_id == ancestor {
                return true;
            }
            hops += 1;
            if hops > self.len() {
                return false;
            }
            current = self.get(parent_id).and_then(|item| item.parent_id);
        }
        false
    }
}

/// True iff `item` sits in `list` and `list` is owned by `actor`.
pub fn ownership_check(actor: UserId, item: &Item, list: &TodoList) -> bool {
    item.list_id == list.id && list.user_id == actor
}

/// Rejects attaching `item` under `target` when that would close a cycle.
///
/// `forest` must contain `item`'s list; a target from another list can never be
/// one of its descendants.
pub fn check_move_into(forest: &ItemForest, item: ItemId, target: ItemId) -> AppResult<()> {
    if target == item || forest.is_descendant(item, target) {
        return Err(AppError::InvalidOperation(
            "Cannot move an item into itself or its descendant".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::{item, sample_forest};

    #[test]
    fn detects_descendants_at_any_depth() {
        let forest = sample_forest();
        assert!(forest.is_descendant(1, 2));
        assert!(forest.is_descendant(1, 3));
        assert!(forest.is_descendant(2, 3));
        assert!(!forest.is_descendant(3, 1));
        assert!(!forest.is_descendant(2, 4));
        assert!(!forest.is_descendant(1, 1));
        assert!(!forest.is_descendant(1, 5));
    }

    #[test]
    fn cyclic_data_terminates() {
        let forest = ItemForest::new(vec![item(1, Some(2), 1), item(2, Some(1), 2)]);
        assert!(forest.is_descendant(1, 2));
        assert!(!forest.is_descendant(9, 2));
    }

    #[test]
    fn rejects_self_and_descendant_targets() {
        let forest = sample_forest();
        for target in [1, 2, 3, 4] {
            let err = check_move_into(&forest, 1, target).unwrap_err();
            assert!(matches!(err, AppError::InvalidOperation(_)));
        }
        assert!(check_move_into(&forest, 1, 5).is_ok());
        assert!(check_move_into(&forest, 3, 1).is_ok());
        assert!(check_move_into(&forest, 2, 4).is_ok());
    }

    #[test]
    fn ownership_requires_matching_list_and_owner() {
        let list = TodoList {
            id: 1,
            title: "Groceries".to_string(),
            user_id: 10,
            created_at: 0,
        };
        let owned = item(1, None, 1);
        assert!(ownership_check(10, &owned, &list));
        assert!(!ownership_check(11, &owned, &list));

        let mut elsewhere = item(2, None, 1);
        elsewhere.list_id = 2;
        assert!(!ownership_check(10, &elsewhere, &list));
    }
}
