//! Rendering of roll-up trees as `termtree` trees.

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::RollupTree;

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for RollupTree {
    #[instrument(level = "trace", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        let Some(root) = self.root_node() else {
            return Tree::new("Empty tree".to_string());
        };
        let mut tree = Tree::new(root.data.to_string());

        fn build_tree(arena: &RollupTree, node_idx: Index, parent_tree: &mut Tree<String>) {
            if let Some(node) = arena.get_node(node_idx) {
                for &child_idx in &node.children {
                    if let Some(child) = arena.get_node(child_idx) {
                        let mut child_tree = Tree::new(child.data.to_string());
                        build_tree(arena, child_idx, &mut child_tree);
                        parent_tree.push(child_tree);
                    }
                }
            }
        }

        if let Some(root_idx) = self.root() {
            build_tree(self, root_idx, &mut tree);
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Level, NodeStats, RollupNode};

    #[test]
    fn given_region_with_department_when_rendering_then_nests_lines() {
        let mut arena = RollupTree::new();
        let stats = NodeStats {
            count: 1,
            total_target: 100.0,
            total_delivered: 25.0,
        };
        let root = arena.insert_node(
            RollupNode {
                level: Level::Region,
                id: "r1".into(),
                label: "Kaolack".into(),
                stats: Some(stats),
                tonnage: None,
            },
            None,
        );
        arena.insert_node(
            RollupNode {
                level: Level::Department,
                id: "d1".into(),
                label: "Nioro".into(),
                stats: Some(NodeStats { count: 0, ..stats }),
                tonnage: None,
            },
            Some(root),
        );

        let rendered = arena.to_tree_string().to_string();
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Kaolack [1 department"));
        assert!(lines[1].contains("Nioro [0 communes, 25.0/100.0 T, 25.0%]"));
    }

    #[test]
    fn given_empty_arena_when_rendering_then_says_empty() {
        assert_eq!(
            RollupTree::new().to_tree_string().to_string().trim(),
            "Empty tree"
        );
    }
}
