//! Network graph projection for force-directed rendering
//!
//! Node area, not radius, tracks allocated tonnage: the size scales with the
//! square root of the node's share of its siblings' average target, clamped so
//! outliers neither dominate nor vanish. Regions are siblings of each other,
//! departments are compared only within their own region.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::entities::Hierarchy;
use crate::domain::stats::{department_stats, region_stats, Level, NodeStats};

/// Size mapping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeScale {
    pub base: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for SizeScale {
    fn default() -> Self {
        Self {
            base: 90.0,
            min: 50.0,
            max: 160.0,
        }
    }
}

/// `clamp(min, max, base * sqrt(target / average))`; `min` when the average is not positive.
pub fn node_size(target: f64, average: f64, scale: &SizeScale) -> f64 {
    let (lo, hi) = if scale.min <= scale.max {
        (scale.min, scale.max)
    } else {
        (scale.max, scale.min)
    };
    if average.is_nan() || average <= 0.0 || !target.is_finite() {
        return lo;
    }
    let raw = scale.base * (target.max(0.0) / average).sqrt();
    raw.clamp(lo, hi)
}

/// Fill colour per level.
pub fn level_color(level: Level) -> &'static str {
    match level {
        Level::Region => "#1f6f43",
        Level::Department => "#3c9d5d",
        Level::Commune => "#7cc08a",
        Level::Operator => "#c7a23a",
        Level::Allocation => "#d9822b",
        Level::Delivery => "#8a8a8a",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    /// Level-prefixed id, e.g. `region:r1`
    pub id: String,
    pub label: String,
    pub level: Level,
    pub target: f64,
    pub delivered: f64,
    /// Completion ring, independent of size
    pub completion: f64,
    pub size: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl NetworkGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn nodes_at(&self, level: Level) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.level == level)
    }
}

pub fn graph_id(level: Level, id: &str) -> String {
    format!("{}:{}", level, id)
}

struct Pending {
    id: String,
    label: String,
    level: Level,
    stats: NodeStats,
}

/// Project regions and departments into nodes, with department → region edges.
#[instrument(level = "debug", skip(hierarchy))]
pub fn build_graph(hierarchy: &Hierarchy, scale: &SizeScale) -> NetworkGraph {
    let mut regions = Vec::new();
    let mut siblings = Vec::new();
    let mut edges = Vec::new();

    for region in &hierarchy.regions {
        let region_id = graph_id(Level::Region, &region.id);
        regions.push(Pending {
            id: region_id.clone(),
            label: region.name.clone(),
            level: Level::Region,
            stats: region_stats(region),
        });
        let mut departments = Vec::new();
        for department in &region.departments {
            let dept_id = graph_id(Level::Department, &department.id);
            edges.push(GraphEdge {
                source: dept_id.clone(),
                target: region_id.clone(),
            });
            departments.push(Pending {
                id: dept_id,
                label: department.name.clone(),
                level: Level::Department,
                stats: department_stats(department),
            });
        }
        siblings.push(departments);
    }

    let mut nodes = sized(regions, scale);
    for departments in siblings {
        nodes.extend(sized(departments, scale));
    }
    NetworkGraph { nodes, edges }
}

fn sized(pending: Vec<Pending>, scale: &SizeScale) -> Vec<GraphNode> {
    let average = if pending.is_empty() {
        0.0
    } else {
        pending.iter().map(|p| p.stats.total_target).sum::<f64>() / pending.len() as f64
    };
    pending
        .into_iter()
        .map(|p| GraphNode {
            size: node_size(p.stats.total_target, average, scale),
            completion: p.stats.completion_rate(),
            color: level_color(p.level).to_string(),
            target: p.stats.total_target,
            delivered: p.stats.total_delivered,
            id: p.id,
            label: p.label,
            level: p.level,
        })
        .collect()
}
