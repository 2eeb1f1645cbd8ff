//! In-memory item forest
//!
//! Items of one or more lists are loaded into a flat arena keyed by id; parent
//! and child links are ids, never references. Structural checks and cascades
//! walk this arena with explicit work lists so arbitrarily deep trees are safe.
//!
//! - validate: ancestry and ownership checks
//! - level: depth computation and repair
//! - cascade: completion and deletion cascades

mod cascade;
mod level;
mod validate;

use std::collections::{HashMap, HashSet};

use crate::model::{Item, ItemId, ItemNode};

pub use level::{Repair, MAX_LEVEL};
pub use validate::{check_move_into, ownership_check};

/// Arena of items plus a child index in insertion (id) order.
#[derive(Debug, Default)]
pub struct ItemForest {
    items: HashMap<ItemId, Item>,
    children: HashMap<ItemId, Vec<ItemId>>,
    roots: Vec<ItemId>,
}

impl ItemForest {
    pub fn new(mut items: Vec<Item>) -> Self {
        items.sort_by_key(|item| item.id);
        let known: HashSet<ItemId> = items.iter().map(|item| item.id).collect();

        let mut children: HashMap<ItemId, Vec<ItemId>> = HashMap::new();
        let mut roots = Vec::new();
        for item in &items {
            match item.parent_id {
                Some(parent_id) if known.contains(&parent_id) => {
                    children.entry(parent_id).or_default().push(item.id)
                }
                // A parent outside the arena is treated as a root here.
                _ => roots.push(item.id),
            }
        }

        Self {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
            children,
            roots,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn children_of(&self, id: ItemId) -> &[ItemId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roots(&self) -> &[ItemId] {
        &self.roots
    }

    /// Pre-order walk of `root` and everything under it. Empty if `root` is unknown.
    pub fn subtree(&self, root: ItemId) -> Vec<ItemId> {
        if !self.items.contains_key(&root) {
            return Vec::new();
        }
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            // Reverse so the first child is visited first.
            stack.extend(self.children_of(id).iter().rev());
        }
        order
    }

    /// Parent chain of `id`, root first, excluding `id` itself.
    pub fn ancestors(&self, id: ItemId) -> Vec<Item> {
        let mut chain = Vec::new();
        let mut current = self.items.get(&id).and_then(|item| item.parent_id);
        while let Some(parent_id) = current {
            let Some(parent) = self.items.get(&parent_id) else {
                break;
            };
            if chain.len() >= self.items.len() {
                break;
            }
            chain.push(parent.clone());
            current = parent.parent_id;
        }
        chain.reverse();
        chain
    }

    /// Detaches the subtree rooted at `id` as nested nodes.
    pub fn subtree_node(&self, id: ItemId) -> Option<ItemNode> {
        let order = self.subtree(id);
        self.assemble(&order).remove(&id)
    }

    /// Consumes the forest into its root nodes, each with children populated.
    pub fn into_nodes(self) -> Vec<ItemNode> {
        let order: Vec<ItemId> = self.roots.iter().flat_map(|root| self.subtree(*root)).collect();
        let mut built = self.assemble(&order);
        self.roots.iter().filter_map(|root| built.remove(root)).collect()
    }

    // Builds nodes bottom-up: in reversed pre-order every descendant precedes its ancestor.
    fn assemble(&self, order: &[ItemId]) -> HashMap<ItemId, ItemNode> {
        let mut built: HashMap<ItemId, ItemNode> = HashMap::new();
        for id in order.iter().rev() {
            let Some(item) = self.items.get(id) else {
                continue;
            };
            let children = self
                .children_of(*id)
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(
                *id,
                ItemNode {
                    item: item.clone(),
                    children,
                },
            );
        }
        built
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn item(id: ItemId, parent_id: Option<ItemId>, level: i64) -> Item {
        Item {
            id,
            content: format!("item {}", id),
            completed: false,
            collapsed: false,
            list_id: 1,
            parent_id,
            level,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// A(1) -> B(2) -> C(3), plus A -> D(4) and a second root E(5).
    pub(crate) fn sample_forest() -> ItemForest {
        ItemForest::new(vec![
            item(3, Some(2), 3),
            item(1, None, 1),
            item(2, Some(1), 2),
            item(4, Some(1), 2),
            item(5, None, 1),
        ])
    }

    #[test]
    fn indexes_roots_and_children_in_id_order() {
        let forest = sample_forest();
        assert_eq!(forest.len(), 5);
        assert_eq!(forest.roots(), &[1, 5]);
        assert_eq!(forest.children_of(1), &[2, 4]);
        assert!(forest.children_of(3).is_empty());
    }

    #[test]
    fn subtree_is_pre_order() {
        let forest = sample_forest();
        assert_eq!(forest.subtree(1), vec![1, 2, 3, 4]);
        assert_eq!(forest.subtree(3), vec![3]);
        assert!(forest.subtree(99).is_empty());
    }

    #[test]
    fn ancestors_are_root_first() {
        let forest = sample_forest();
        let chain: Vec<ItemId> = forest.ancestors(3).iter().map(|i| i.id).collect();
        assert_eq!(chain, vec![1, 2]);
        assert!(forest.ancestors(1).is_empty());
    }

    pub(crate) fn node_size(node: &ItemNode) -> usize {
        let mut count = 0;
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    #[test]
    fn into_nodes_nests_children() {
        let nodes = sample_forest().into_nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].item.id, 1);
        assert_eq!(node_size(&nodes[0]), 4);
        let child_ids: Vec<ItemId> = nodes[0].children.iter().map(|n| n.item.id).collect();
        assert_eq!(child_ids, vec![2, 4]);
        assert_eq!(nodes[0].children[0].children[0].item.id, 3);
        assert_eq!(node_size(&nodes[1]), 1);
    }

    #[test]
    fn dangling_parent_becomes_root() {
        let forest = ItemForest::new(vec![item(7, Some(42), 2)]);
        assert_eq!(forest.roots(), &[7]);
    }

    #[test]
    fn deep_chain_builds_and_drops_without_recursion() {
        let depth = 20_000;
        let items: Vec<Item> = (1..=depth)
            .map(|id| item(id, if id == 1 { None } else { Some(id - 1) }, id))
            .collect();
        let forest = ItemForest::new(items);
        assert_eq!(forest.subtree(1).len() as i64, depth);
        assert_eq!(forest.depth(), depth);
        let nodes = forest.into_nodes();
        assert_eq!(node_size(&nodes[0]) as i64, depth);
        drop(nodes);
    }
}
