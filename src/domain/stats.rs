//! Hierarchy roll-up: tonnage totals and completion rates per node
//!
//! Totals at a node cover every allocation leaf beneath it, while `count` is the
//! size of the node's immediate child collection. The two are displayed side by
//! side ("12 departments, 4,500/10,000 T"), so the asymmetry is kept as is.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::entities::{coalesce, Allocation, Commune, Department, Operator, Region};
use crate::domain::error::DomainError;

/// Fixed levels of the campaign hierarchy, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Region,
    #[serde(rename = "dept")]
    Department,
    Commune,
    Operator,
    Allocation,
    Delivery,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Region,
        Level::Department,
        Level::Commune,
        Level::Operator,
        Level::Allocation,
        Level::Delivery,
    ];

    /// The level directly below this one, `None` for deliveries.
    pub fn child(self) -> Option<Level> {
        match self {
            Level::Region => Some(Level::Department),
            Level::Department => Some(Level::Commune),
            Level::Commune => Some(Level::Operator),
            Level::Operator => Some(Level::Allocation),
            Level::Allocation => Some(Level::Delivery),
            Level::Delivery => None,
        }
    }

    /// The level directly above this one, `None` for regions.
    pub fn parent(self) -> Option<Level> {
        match self {
            Level::Region => None,
            Level::Department => Some(Level::Region),
            Level::Commune => Some(Level::Department),
            Level::Operator => Some(Level::Commune),
            Level::Allocation => Some(Level::Operator),
            Level::Delivery => Some(Level::Allocation),
        }
    }

    /// Depth in the chain, region = 0.
    pub fn depth(self) -> usize {
        self as usize
    }

    /// Human noun for `count` nodes of this level.
    pub fn noun(self, count: usize) -> &'static str {
        let one = count == 1;
        match self {
            Level::Region if one => "region",
            Level::Region => "regions",
            Level::Department if one => "department",
            Level::Department => "departments",
            Level::Commune if one => "commune",
            Level::Commune => "communes",
            Level::Operator if one => "operator",
            Level::Operator => "operators",
            Level::Allocation if one => "allocation",
            Level::Allocation => "allocations",
            Level::Delivery if one => "delivery",
            Level::Delivery => "deliveries",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Region => "region",
            Level::Department => "dept",
            Level::Commune => "commune",
            Level::Operator => "operator",
            Level::Allocation => "allocation",
            Level::Delivery => "delivery",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "region" => Ok(Level::Region),
            "dept" | "department" => Ok(Level::Department),
            "commune" => Ok(Level::Commune),
            "operator" => Ok(Level::Operator),
            "allocation" => Ok(Level::Allocation),
            "delivery" => Ok(Level::Delivery),
            other => Err(DomainError::UnknownLevel(other.to_string())),
        }
    }
}

/// Aggregate attached to every non-delivery node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    /// Length of the immediate child collection
    pub count: usize,
    /// Sum of `target` over all allocation leaves beneath the node
    pub total_target: f64,
    /// Sum of `delivered` over all allocation leaves beneath the node
    pub total_delivered: f64,
}

impl NodeStats {
    pub fn completion_rate(&self) -> f64 {
        completion_rate(self.total_delivered, self.total_target)
    }

    /// Totals of `self`, immediate count replaced by `count`.
    fn with_count(self, count: usize) -> Self {
        Self { count, ..self }
    }
}

/// Sums tonnage; the resulting `count` is meaningless until `with_count`.
impl Add for NodeStats {
    type Output = NodeStats;

    fn add(self, rhs: NodeStats) -> NodeStats {
        NodeStats {
            count: 0,
            total_target: self.total_target + rhs.total_target,
            total_delivered: self.total_delivered + rhs.total_delivered,
        }
    }
}

/// Percentage delivered, `0.0` when nothing was targeted.
pub fn completion_rate(delivered: f64, target: f64) -> f64 {
    if target > 0.0 && target.is_finite() && delivered.is_finite() {
        delivered / target * 100.0
    } else {
        0.0
    }
}

/// Borrowed hierarchy node, tagged by level.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Region(&'a Region),
    Department(&'a Department),
    Commune(&'a Commune),
    Operator(&'a Operator),
    Allocation(&'a Allocation),
}

impl<'a> NodeRef<'a> {
    pub fn level(&self) -> Level {
        match self {
            NodeRef::Region(_) => Level::Region,
            NodeRef::Department(_) => Level::Department,
            NodeRef::Commune(_) => Level::Commune,
            NodeRef::Operator(_) => Level::Operator,
            NodeRef::Allocation(_) => Level::Allocation,
        }
    }

    pub fn id(&self) -> &'a str {
        match self {
            NodeRef::Region(n) => &n.id,
            NodeRef::Department(n) => &n.id,
            NodeRef::Commune(n) => &n.id,
            NodeRef::Operator(n) => &n.id,
            NodeRef::Allocation(n) => &n.id,
        }
    }

    /// Display label; allocations are labelled by their key.
    pub fn label(&self) -> &'a str {
        match self {
            NodeRef::Region(n) => &n.name,
            NodeRef::Department(n) => &n.name,
            NodeRef::Commune(n) => &n.name,
            NodeRef::Operator(n) => &n.name,
            NodeRef::Allocation(n) => &n.key,
        }
    }

    /// Immediate children that are themselves hierarchy nodes.
    ///
    /// Deliveries are not `NodeRef`s, so an allocation yields nothing here.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        match *self {
            NodeRef::Region(n) => n.departments.iter().map(NodeRef::Department).collect(),
            NodeRef::Department(n) => n.communes.iter().map(NodeRef::Commune).collect(),
            NodeRef::Commune(n) => n.operators.iter().map(NodeRef::Operator).collect(),
            NodeRef::Operator(n) => n.allocations.iter().map(NodeRef::Allocation).collect(),
            NodeRef::Allocation(_) => Vec::new(),
        }
    }

    pub fn stats(&self) -> NodeStats {
        node_stats(*self)
    }
}

/// Roll-up for any hierarchy node, dispatched on its level.
pub fn node_stats(node: NodeRef<'_>) -> NodeStats {
    match node {
        NodeRef::Region(n) => region_stats(n),
        NodeRef::Department(n) => department_stats(n),
        NodeRef::Commune(n) => commune_stats(n),
        NodeRef::Operator(n) => operator_stats(n),
        NodeRef::Allocation(n) => allocation_stats(n),
    }
}

pub fn region_stats(region: &Region) -> NodeStats {
    sum(region.departments.iter().map(department_stats)).with_count(region.departments.len())
}

pub fn department_stats(department: &Department) -> NodeStats {
    sum(department.communes.iter().map(commune_stats)).with_count(department.communes.len())
}

pub fn commune_stats(commune: &Commune) -> NodeStats {
    sum(commune.operators.iter().map(operator_stats)).with_count(commune.operators.len())
}

pub fn operator_stats(operator: &Operator) -> NodeStats {
    sum(operator.allocations.iter().map(allocation_stats)).with_count(operator.allocations.len())
}

/// Leaf of the tonnage roll-up; `count` is the number of deliveries.
pub fn allocation_stats(allocation: &Allocation) -> NodeStats {
    NodeStats {
        count: allocation.deliveries.len(),
        total_target: coalesce(Some(allocation.target)),
        total_delivered: coalesce(Some(allocation.delivered)),
    }
}

fn sum(children: impl Iterator<Item = NodeStats>) -> NodeStats {
    children.fold(NodeStats::default(), Add::add)
}

/// Stats for every region, in input order.
///
/// Regions are independent subtrees and are reduced in parallel.
#[instrument(level = "debug", skip(regions), fields(regions = regions.len()))]
pub fn stats_for_regions(regions: &[Region]) -> Vec<(String, NodeStats)> {
    regions
        .par_iter()
        .map(|r| (r.id.clone(), region_stats(r)))
        .collect()
}
