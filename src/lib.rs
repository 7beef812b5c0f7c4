//! tonnage: roll-up of a fertilizer distribution campaign
//!
//! A campaign snapshot is a strict hierarchy
//! region → department → commune → operator → allocation → delivery.
//! This crate aggregates target and delivered tonnage at every level, ranks
//! drivers by loaded tonnage, derives a sized network graph and tracks a
//! cascading drill-down selection.
//!
//! Layers, inner to outer:
//! - [`domain`]: pure types and aggregations
//! - [`application`]: services over a loaded snapshot
//! - [`infrastructure`]: filesystem seam and dependency wiring
//! - [`cli`]: argument parsing, dispatch and terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
