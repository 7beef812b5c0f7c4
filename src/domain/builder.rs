//! Builds roll-up trees from the nested hierarchy.

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::arena::{RollupNode, RollupTree};
use crate::domain::collate::name_cmp;
use crate::domain::entities::{Delivery, Hierarchy, Region};
use crate::domain::stats::{Level, NodeRef};

/// Constructs one `RollupTree` per region.
///
/// Siblings are ordered by label (allocations by key, deliveries by date) so
/// the output is stable regardless of payload order.
#[derive(Debug, Default)]
pub struct RollupBuilder {
    include_deliveries: bool,
}

impl RollupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also emit delivery leaves under each allocation.
    pub fn with_deliveries(mut self, include: bool) -> Self {
        self.include_deliveries = include;
        self
    }

    #[instrument(level = "debug", skip(self, hierarchy))]
    pub fn build(&self, hierarchy: &Hierarchy) -> Vec<RollupTree> {
        let trees: Vec<_> = hierarchy
            .regions
            .iter()
            .sorted_by(|a, b| name_cmp(&a.name, &b.name))
            .map(|region| self.build_region(region))
            .collect();
        debug!("built {} roll-up trees", trees.len());
        trees
    }

    pub fn build_region(&self, region: &Region) -> RollupTree {
        let mut tree = RollupTree::new();
        let mut stack: Vec<(NodeRef<'_>, Option<Index>)> = vec![(NodeRef::Region(region), None)];

        while let Some((node, parent_idx)) = stack.pop() {
            let data = RollupNode {
                level: node.level(),
                id: node.id().to_string(),
                label: node.label().to_string(),
                stats: Some(node.stats()),
                tonnage: None,
            };
            let current_idx = tree.insert_node(data, parent_idx);

            if let NodeRef::Allocation(allocation) = node {
                if self.include_deliveries {
                    for delivery in allocation
                        .deliveries
                        .iter()
                        .sorted_by_key(|d| d.delivered_at)
                    {
                        tree.insert_node(delivery_node(delivery), Some(current_idx));
                    }
                }
                continue;
            }

            // pushed in reverse so the smallest label is inserted first
            let children = node
                .children()
                .into_iter()
                .sorted_by(|a, b| name_cmp(a.label(), b.label()))
                .rev();
            for child in children {
                stack.push((child, Some(current_idx)));
            }
        }

        tree
    }
}

fn delivery_node(delivery: &Delivery) -> RollupNode {
    let label = match (&delivery.driver_name, delivery.delivered_at) {
        (Some(name), Some(at)) => format!("{} {} {}", delivery.id, at.format("%Y-%m-%d"), name),
        (Some(name), None) => format!("{} {}", delivery.id, name),
        (None, Some(at)) => format!("{} {}", delivery.id, at.format("%Y-%m-%d")),
        (None, None) => delivery.id.clone(),
    };
    RollupNode {
        level: Level::Delivery,
        id: delivery.id.clone(),
        label,
        stats: None,
        tonnage: Some(delivery.tonnage_loaded),
    }
}
