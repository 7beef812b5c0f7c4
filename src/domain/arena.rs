//! Arena-backed roll-up tree, one per region, for the nested Global view.

use std::fmt;

use generational_arena::{Arena, Index};
use serde::Serialize;
use tracing::instrument;

use crate::domain::stats::{Level, NodeStats};

/// Payload of a roll-up tree node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollupNode {
    pub level: Level,
    pub id: String,
    pub label: String,
    /// Present on every level except deliveries
    pub stats: Option<NodeStats>,
    /// Loaded tonnage, deliveries only
    pub tonnage: Option<f64>,
}

/// Noun for the immediate children counted in `NodeStats::count`.
fn count_noun(level: Level, count: usize) -> &'static str {
    level.child().map_or("items", |child| child.noun(count))
}

impl fmt::Display for RollupNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.stats, self.tonnage) {
            (Some(s), _) => write!(
                f,
                "{} [{} {}, {:.1}/{:.1} T, {:.1}%]",
                self.label,
                s.count,
                count_noun(self.level, s.count),
                s.total_delivered,
                s.total_target,
                s.completion_rate()
            ),
            (None, Some(t)) => write!(f, "{} ({:.1} T)", self.label, t),
            (None, None) => write!(f, "{}", self.label),
        }
    }
}

#[derive(Debug)]
pub struct TreeNode {
    pub data: RollupNode,
    pub parent: Option<Index>,
    pub children: Vec<Index>,
}

/// Tree of roll-up nodes stored in a generational arena.
#[derive(Debug)]
pub struct RollupTree {
    arena: Arena<TreeNode>,
    root: Option<Index>,
}

impl Default for RollupTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RollupTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Insert `data` under `parent`; without a parent it becomes the root.
    pub fn insert_node(&mut self, data: RollupNode, parent: Option<Index>) -> Index {
        let node_idx = self.arena.insert(TreeNode {
            data,
            parent,
            children: Vec::new(),
        });

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn root_node(&self) -> Option<&TreeNode> {
        self.root.and_then(|idx| self.get_node(idx))
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order, children left to right.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn depth(&self) -> usize {
        self.root.map_or(0, |root| self.calculate_depth(root))
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        self.get_node(node_idx).map_or(0, |node| {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        })
    }

    /// First node in pre-order matching `level` and `id`.
    pub fn find(&self, level: Level, id: &str) -> Option<Index> {
        self.iter()
            .find(|(_, node)| node.data.level == level && node.data.id == id)
            .map(|(idx, _)| idx)
    }

    /// Ancestors of `idx`, root first, excluding `idx` itself.
    pub fn ancestors(&self, idx: Index) -> Vec<Index> {
        let mut chain = Vec::new();
        let mut current = self.get_node(idx).and_then(|n| n.parent);
        while let Some(parent_idx) = current {
            chain.push(parent_idx);
            current = self.get_node(parent_idx).and_then(|n| n.parent);
        }
        chain.reverse();
        chain
    }
}

pub struct TreeIterator<'a> {
    tree: &'a RollupTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a RollupTree) -> Self {
        Self {
            tree,
            stack: tree.root().into_iter().collect(),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // reversed so the leftmost child pops first
                self.stack.extend(node.children.iter().rev());
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(level: Level, id: &str) -> RollupNode {
        RollupNode {
            level,
            id: id.to_string(),
            label: id.to_uppercase(),
            stats: Some(NodeStats::default()),
            tonnage: None,
        }
    }

    //      r1
    //     /  \
    //    d1   d2
    //    |
    //    c1
    #[test]
    fn given_small_tree_when_iterating_then_visits_in_preorder() {
        let mut tree = RollupTree::new();
        let r1 = tree.insert_node(node(Level::Region, "r1"), None);
        let d1 = tree.insert_node(node(Level::Department, "d1"), Some(r1));
        tree.insert_node(node(Level::Department, "d2"), Some(r1));
        let c1 = tree.insert_node(node(Level::Commune, "c1"), Some(d1));

        let ids: Vec<_> = tree.iter().map(|(_, n)| n.data.id.as_str()).collect();

        assert_eq!(ids, vec!["r1", "d1", "c1", "d2"]);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.find(Level::Commune, "c1"), Some(c1));
        assert_eq!(tree.ancestors(c1), vec![r1, d1]);
    }

    #[test]
    fn given_empty_tree_when_querying_then_returns_nothing() {
        let tree = RollupTree::new();
        assert_eq!(tree.depth(), 0);
        assert!(tree.iter().next().is_none());
        assert!(tree.root_node().is_none());
    }

    #[test]
    fn given_stats_when_displaying_then_shows_count_and_tonnage() {
        let data = RollupNode {
            level: Level::Region,
            id: "r1".into(),
            label: "Thiès".into(),
            stats: Some(NodeStats {
                count: 1,
                total_target: 500.0,
                total_delivered: 40.0,
            }),
            tonnage: None,
        };

        assert_eq!(data.to_string(), "Thiès [1 department, 40.0/500.0 T, 8.0%]");
    }
}
