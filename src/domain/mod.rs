//! Domain layer: hierarchy entities and the pure roll-up computations
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod collate;
pub mod drivers;
pub mod entities;
pub mod error;
pub mod graph;
pub mod selection;
pub mod stats;

pub use arena::{RollupNode, RollupTree, TreeNode};
pub use builder::RollupBuilder;
pub use collate::name_cmp;
pub use drivers::{driver_rollup, DriverStat, UNKNOWN_DRIVER_ID, UNKNOWN_DRIVER_LABEL};
pub use entities::*;
pub use error::DomainError;
pub use graph::{build_graph, node_size, GraphEdge, GraphNode, NetworkGraph, SizeScale};
pub use selection::Selection;
pub use stats::{
    completion_rate, node_stats, stats_for_regions, Level, NodeRef, NodeStats,
};
