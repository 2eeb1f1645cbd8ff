//! Depth (level) computation. Root items are level 1.

use std::collections::HashSet;

use super::ItemForest;
use crate::error::{AppError, AppResult};
use crate::model::{ItemId, ListId};

/// Deepest level an item may sit at.
///
/// Every level nests two JSON values in a tree response, and the whole response
/// must stay under the 128-level nesting limit of common JSON parsers.
pub const MAX_LEVEL: i64 = 50;

/// A row whose stored placement disagrees with its parent chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repair {
    pub id: ItemId,
    pub level: i64,
    pub list_id: ListId,
}

impl ItemForest {
    /// Walks parent links up to the root, returning `(level, root id)`.
    fn walk_to_root(&self, id: ItemId) -> AppResult<(i64, ItemId)> {
        let mut item = self
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))?;
        let mut level = 1;
        while let Some(parent) = item.parent_id.and_then(|parent_id| self.get(parent_id)) {
            level += 1;
            if level as usize > self.len() {
                return Err(AppError::Internal(format!(
                    "Item {} sits on a parent cycle",
                    id
                )));
            }
            item = parent;
        }
        Ok((level, item.id))
    }

    /// Depth of `id` derived from its parent chain, ignoring the stored `level`.
    pub fn compute_level(&self, id: ItemId) -> AppResult<i64> {
        self.walk_to_root(id).map(|(level, _)| level)
    }

    /// Re-derives levels for the subtree at `root`, given the root's new level.
    ///
    /// Updates the arena and returns every `(id, level)` in pre-order.
    pub fn relevel(&mut self, root: ItemId, root_level: i64) -> Vec<(ItemId, i64)> {
        let mut assigned = Vec::new();
        let mut stack = vec![(root, root_level)];
        while let Some((id, level)) = stack.pop() {
            if assigned.len() >= self.items.len() {
                break;
            }
            let Some(item) = self.items.get_mut(&id) else {
                continue;
            };
            item.level = level;
            assigned.push((id, level));
            stack.extend(self.children_of(id).iter().rev().map(|child| (*child, level + 1)));
        }
        assigned
    }

    /// Number of levels in the subtree at `root`: 1 for a leaf, 0 if `root` is unknown.
    pub fn height(&self, root: ItemId) -> i64 {
        let mut height = 0;
        let mut seen = HashSet::new();
        let mut stack = vec![(root, 1)];
        while let Some((id, level)) = stack.pop() {
            if !self.items.contains_key(&id) || !seen.insert(id) {
                continue;
            }
            height = height.max(level);
            stack.extend(self.children_of(id).iter().map(|child| (*child, level + 1)));
        }
        height
    }

    /// Number of levels in the deepest tree of the forest.
    pub fn depth(&self) -> i64 {
        self.roots().iter().map(|root| self.height(*root)).max().unwrap_or(0)
    }

    /// Batch check over every loaded item: each item's level must follow from
    /// its parent chain and its list must be its root's list.
    ///
    /// Returns the rows that need rewriting plus the ids skipped because they
    /// sit on a parent cycle.
    pub fn repairs(&self) -> (Vec<Repair>, Vec<ItemId>) {
        let mut ids: Vec<ItemId> = self.items.keys().copied().collect();
        ids.sort_unstable();

        let mut repairs = Vec::new();
        let mut cyclic = Vec::new();
        for id in ids {
            let Ok((level, root)) = self.walk_to_root(id) else {
                cyclic.push(id);
                continue;
            };
            let (Some(item), Some(root_item)) = (self.get(id), self.get(root)) else {
                continue;
            };
            if item.level != level || item.list_id != root_item.list_id {
                repairs.push(Repair {
                    id,
                    level,
                    list_id: root_item.list_id,
                });
            }
        }
        (repairs, cyclic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::{item, sample_forest};

    #[test]
    fn computes_level_from_parent_chain() {
        let forest = sample_forest();
        assert_eq!(forest.compute_level(1).unwrap(), 1);
        assert_eq!(forest.compute_level(2).unwrap(), 2);
        assert_eq!(forest.compute_level(3).unwrap(), 3);
        assert!(matches!(forest.compute_level(42), Err(AppError::NotFound(_))));
    }

    #[test]
    fn ignores_stale_stored_levels() {
        let forest = ItemForest::new(vec![item(1, None, 7), item(2, Some(1), 1)]);
        assert_eq!(forest.compute_level(2).unwrap(), 2);
    }

    #[test]
    fn cycle_is_an_error() {
        let forest = ItemForest::new(vec![item(1, Some(2), 1), item(2, Some(1), 2)]);
        assert!(matches!(forest.compute_level(1), Err(AppError::Internal(_))));
    }

    #[test]
    fn relevel_propagates_to_descendants() {
        let mut forest = sample_forest();
        let assigned = forest.relevel(2, 1);
        assert_eq!(assigned, vec![(2, 1), (3, 2)]);
        assert_eq!(forest.get(3).unwrap().level, 2);
        assert_eq!(forest.get(4).unwrap().level, 2);
    }

    #[test]
    fn height_counts_levels_below_a_root() {
        let forest = sample_forest();
        assert_eq!(forest.height(1), 3);
        assert_eq!(forest.height(2), 2);
        assert_eq!(forest.height(5), 1);
        assert_eq!(forest.height(42), 0);
        assert_eq!(forest.depth(), 3);
        assert_eq!(ItemForest::default().depth(), 0);
    }

    #[test]
    fn height_terminates_on_cycles() {
        let forest = ItemForest::new(vec![item(1, Some(2), 1), item(2, Some(1), 2)]);
        assert_eq!(forest.height(1), 2);
        assert_eq!(forest.depth(), 0);
    }

    #[test]
    fn repairs_levels_and_list_ownership() {
        let mut stray = item(3, Some(2), 9);
        stray.list_id = 8;
        let forest = ItemForest::new(vec![item(1, None, 1), item(2, Some(1), 1), stray]);
        let (repairs, cyclic) = forest.repairs();
        assert!(cyclic.is_empty());
        assert_eq!(
            repairs,
            vec![
                Repair { id: 2, level: 2, list_id: 1 },
                Repair { id: 3, level: 3, list_id: 1 },
            ]
        );
    }

    #[test]
    fn repairs_skip_cycles() {
        let forest = ItemForest::new(vec![
            item(1, Some(2), 1),
            item(2, Some(1), 2),
            item(3, None, 1),
        ]);
        let (repairs, cyclic) = forest.repairs();
        assert!(repairs.is_empty());
        assert_eq!(cyclic, vec![1, 2]);
    }
}
