//! Drill-down selection over the hierarchy
//!
//! Selecting a node clears every deeper level. The first data load auto-selects
//! the first region by name, once; an explicit `reset` leaves the selection
//! fully empty and the auto-select does not fire again.

use serde::Serialize;
use tracing::debug;

use crate::domain::collate::name_cmp;
use crate::domain::entities::{Delivery, Hierarchy};
use crate::domain::error::DomainError;
use crate::domain::stats::{Level, NodeRef};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub region: Option<String>,
    pub department: Option<String>,
    pub commune: Option<String>,
    pub operator: Option<String>,
    pub allocation: Option<String>,
    /// Delivery highlighted in the allocation's delivery list
    pub delivery: Option<String>,
    #[serde(skip)]
    auto_selected: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, level: Level) -> &mut Option<String> {
        match level {
            Level::Region => &mut self.region,
            Level::Department => &mut self.department,
            Level::Commune => &mut self.commune,
            Level::Operator => &mut self.operator,
            Level::Allocation => &mut self.allocation,
            Level::Delivery => &mut self.delivery,
        }
    }

    pub fn get(&self, level: Level) -> Option<&str> {
        match level {
            Level::Region => self.region.as_deref(),
            Level::Department => self.department.as_deref(),
            Level::Commune => self.commune.as_deref(),
            Level::Operator => self.operator.as_deref(),
            Level::Allocation => self.allocation.as_deref(),
            Level::Delivery => self.delivery.as_deref(),
        }
    }

    /// Select `id` at `level` and forget everything below it.
    pub fn select(&mut self, level: Level, id: impl Into<String>) {
        let id = id.into();
        debug!("select {}={}", level, id);
        *self.slot(level) = Some(id);
        if let Some(child) = level.child() {
            self.clear(child);
        }
    }

    /// Clear `level` and every level below it.
    pub fn clear(&mut self, level: Level) {
        for l in Level::ALL.into_iter().filter(|l| *l >= level) {
            *self.slot(l) = None;
        }
    }

    /// Clear all levels. Does not re-arm the first-load auto-select.
    pub fn reset(&mut self) {
        self.clear(Level::Region);
    }

    pub fn is_empty(&self) -> bool {
        Level::ALL.iter().all(|l| self.get(*l).is_none())
    }

    /// Selected `(level, id)` pairs, top down.
    pub fn path(&self) -> Vec<(Level, &str)> {
        Level::ALL
            .iter()
            .filter_map(|l| self.get(*l).map(|id| (*l, id)))
            .collect()
    }

    /// Deepest selected level, if any.
    pub fn deepest(&self) -> Option<Level> {
        self.path().last().map(|(l, _)| *l)
    }

    /// Auto-select the first region by name after a data load.
    ///
    /// Fires at most once per `Selection`; an empty hierarchy leaves it armed.
    /// Returns whether a region was selected.
    pub fn on_data_loaded(&mut self, hierarchy: &Hierarchy) -> bool {
        if self.auto_selected {
            return false;
        }
        let Some(first) = hierarchy.regions.iter().min_by(|a, b| name_cmp(&a.name, &b.name)) else {
            return false;
        };
        self.auto_selected = true;
        if self.region.is_none() {
            self.select(Level::Region, first.id.clone());
            return true;
        }
        false
    }

    /// Validated `select`: `id` must be a child of the currently selected parent.
    pub fn select_in(
        &mut self,
        hierarchy: &Hierarchy,
        level: Level,
        id: &str,
    ) -> Result<(), DomainError> {
        let found = match level.parent() {
            None => hierarchy.regions.iter().any(|r| r.id == id),
            Some(parent) => {
                let chain = self.resolve(hierarchy);
                let parent_node = chain
                    .get(parent.depth())
                    .filter(|n| n.level() == parent)
                    .ok_or(DomainError::MissingParent { level, parent })?;
                match parent_node {
                    NodeRef::Allocation(a) => a.deliveries.iter().any(|d| d.id == id),
                    node => node.children().iter().any(|c| c.id() == id),
                }
            }
        };
        if !found {
            return Err(DomainError::UnknownNode {
                level,
                id: id.to_string(),
            });
        }
        self.select(level, id);
        Ok(())
    }

    /// Resolve the selected ids to nodes, top down, stopping at the first gap.
    pub fn resolve<'a>(&self, hierarchy: &'a Hierarchy) -> Vec<NodeRef<'a>> {
        let mut chain = Vec::new();
        let Some(region) = self
            .region
            .as_deref()
            .and_then(|id| hierarchy.regions.iter().find(|r| r.id == id))
        else {
            return chain;
        };
        chain.push(NodeRef::Region(region));

        for level in [
            Level::Department,
            Level::Commune,
            Level::Operator,
            Level::Allocation,
        ] {
            let Some(id) = self.get(level) else { break };
            let Some(parent) = chain.last() else { break };
            match parent.children().into_iter().find(|c| c.id() == id) {
                Some(node) => chain.push(node),
                None => break,
            }
        }
        chain
    }

    /// The highlighted delivery, if the full chain down to it resolves.
    pub fn selected_delivery<'a>(&self, hierarchy: &'a Hierarchy) -> Option<&'a Delivery> {
        let id = self.delivery.as_deref()?;
        match self.resolve(hierarchy).last()? {
            NodeRef::Allocation(a) => a.deliveries.iter().find(|d| d.id == id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_full_chain_when_selecting_region_then_clears_all_descendants() {
        let mut selection = Selection::new();
        selection.select(Level::Region, "r1");
        selection.select(Level::Department, "d1");
        selection.select(Level::Commune, "c1");
        selection.select(Level::Operator, "o1");
        selection.select(Level::Allocation, "a1");
        selection.select(Level::Delivery, "l1");

        selection.select(Level::Region, "r2");

        assert_eq!(selection.path(), vec![(Level::Region, "r2")]);
    }

    #[test]
    fn given_selection_when_clearing_middle_level_then_keeps_ancestors() {
        let mut selection = Selection::new();
        selection.select(Level::Region, "r1");
        selection.select(Level::Department, "d1");
        selection.select(Level::Commune, "c1");

        selection.clear(Level::Department);

        assert_eq!(selection.deepest(), Some(Level::Region));
        assert!(selection.commune.is_none());
    }

    #[test]
    fn given_empty_selection_when_checking_then_reports_empty() {
        let mut selection = Selection::new();
        assert!(selection.is_empty());
        selection.select(Level::Operator, "o1");
        assert!(!selection.is_empty());
        selection.reset();
        assert!(selection.is_empty());
    }
}
