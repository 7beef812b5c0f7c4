//! Roll-up service
//!
//! Loads a campaign snapshot and runs the pure aggregations over it with the
//! configured size scale and labels.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    build_graph, driver_rollup, stats_for_regions, DeliveryRecord, DomainError, DriverStat,
    Hierarchy, Level, NetworkGraph, NodeRef, NodeStats, RollupBuilder, RollupTree, Selection,
    Snapshot,
};
use crate::infrastructure::traits::FileSystem;

/// One aggregated node in a flat listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelRow {
    pub level: Level,
    pub id: String,
    pub label: String,
    /// Label of the parent node, `None` for regions
    pub parent: Option<String>,
    pub stats: NodeStats,
    pub completion: f64,
}

impl LevelRow {
    fn from_node(node: NodeRef<'_>, parent: Option<&str>) -> Self {
        let stats = node.stats();
        Self {
            level: node.level(),
            id: node.id().to_string(),
            label: node.label().to_string(),
            parent: parent.map(str::to_string),
            completion: stats.completion_rate(),
            stats,
        }
    }
}

/// Result of following a selection path down the hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct DrillDown {
    pub selection: Selection,
    /// Resolved chain, region first
    pub path: Vec<LevelRow>,
    /// Immediate children of the deepest selected node
    pub children: Vec<LevelRow>,
    /// Delivery list, when the deepest node is an allocation
    pub deliveries: Vec<DeliveryRecord>,
}

impl DrillDown {
    pub fn focus(&self) -> Option<&LevelRow> {
        self.path.last()
    }
}

/// Service running roll-ups over a loaded snapshot.
pub struct RollupService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl RollupService {
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Read and parse a JSON snapshot.
    ///
    /// The flat delivery list is taken from the snapshot when present, otherwise
    /// derived from the hierarchy.
    #[instrument(level = "debug", skip(self))]
    pub fn load_snapshot(&self, path: &Path) -> ApplicationResult<(Hierarchy, Vec<DeliveryRecord>)> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::SnapshotNotFound(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read snapshot", path)?;
        let snapshot: Snapshot =
            serde_json::from_str(&content).map_err(|e| ApplicationError::InvalidSnapshot {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let (hierarchy, deliveries) = snapshot.into_parts();
        debug!(
            "load_snapshot: {} regions, {} deliveries",
            hierarchy.regions.len(),
            deliveries.len()
        );
        Ok((hierarchy, deliveries))
    }

    /// Stats for every region, in payload order.
    pub fn region_stats(&self, hierarchy: &Hierarchy) -> Vec<LevelRow> {
        hierarchy
            .regions
            .iter()
            .zip(stats_for_regions(&hierarchy.regions))
            .map(|(region, (id, stats))| LevelRow {
                level: Level::Region,
                id,
                label: region.name.clone(),
                parent: None,
                completion: stats.completion_rate(),
                stats,
            })
            .collect()
    }

    /// Stats for every node at `level`, each tagged with its parent's label.
    #[instrument(level = "debug", skip(self, hierarchy))]
    pub fn level_stats(&self, hierarchy: &Hierarchy, level: Level) -> ApplicationResult<Vec<LevelRow>> {
        if level == Level::Delivery {
            return Err(DomainError::NotAggregated(level).into());
        }
        if level == Level::Region {
            return Ok(self.region_stats(hierarchy));
        }
        let mut frontier: Vec<(NodeRef<'_>, Option<&str>)> = hierarchy
            .regions
            .iter()
            .map(|r| (NodeRef::Region(r), None))
            .collect();
        for _ in 0..level.depth() {
            frontier = frontier
                .into_iter()
                .flat_map(|(node, _)| {
                    let label = node.label();
                    node.children().into_iter().map(move |c| (c, Some(label)))
                })
                .collect();
        }
        Ok(frontier
            .into_iter()
            .map(|(node, parent)| LevelRow::from_node(node, parent))
            .collect())
    }

    pub fn tree(&self, hierarchy: &Hierarchy, with_deliveries: bool) -> Vec<RollupTree> {
        RollupBuilder::new()
            .with_deliveries(with_deliveries)
            .build(hierarchy)
    }

    pub fn drivers(&self, deliveries: &[DeliveryRecord]) -> Vec<DriverStat> {
        driver_rollup(deliveries, &self.settings.drivers.unknown_label)
    }

    pub fn graph(&self, hierarchy: &Hierarchy) -> NetworkGraph {
        build_graph(hierarchy, &self.settings.graph.scale())
    }

    /// Follow `path` through the hierarchy.
    ///
    /// An empty path is the initial state after loading: the first region by
    /// name is selected.
    #[instrument(level = "debug", skip(self, hierarchy))]
    pub fn drill(&self, hierarchy: &Hierarchy, path: &[(Level, String)]) -> ApplicationResult<DrillDown> {
        let mut selection = Selection::new();
        if path.is_empty() {
            selection.on_data_loaded(hierarchy);
        }
        for (level, id) in path {
            selection.select_in(hierarchy, *level, id)?;
        }

        let chain = selection.resolve(hierarchy);
        let mut rows = Vec::with_capacity(chain.len());
        let mut parent: Option<&str> = None;
        for node in &chain {
            rows.push(LevelRow::from_node(*node, parent));
            parent = Some(node.label());
        }

        let (children, deliveries) = match chain.last() {
            Some(NodeRef::Allocation(a)) => (
                Vec::new(),
                a.deliveries
                    .iter()
                    .map(|d| DeliveryRecord::from_delivery(d, Some(a.key.clone())))
                    .collect(),
            ),
            Some(node) => (
                node.children()
                    .into_iter()
                    .map(|c| LevelRow::from_node(c, Some(node.label())))
                    .collect(),
                Vec::new(),
            ),
            None => (self.region_stats(hierarchy), Vec::new()),
        };

        Ok(DrillDown {
            selection,
            path: rows,
            children,
            deliveries,
        })
    }
}
