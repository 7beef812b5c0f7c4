//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::Level;

/// Fertilizer campaign roll-up: tonnage per region, department, commune, operator and driver
#[derive(Parser, Debug)]
#[command(name = "tonnage")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Project directory holding a local .tonnage.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tonnage and completion for every node at one level
    Stats {
        /// Snapshot file (default: `snapshot` from config)
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: Option<PathBuf>,
        /// Level: region, dept, commune, operator, allocation
        #[arg(short, long, default_value = "region", value_parser = parse_level)]
        level: Level,
    },

    /// Show the roll-up as a tree, one per region
    Tree {
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: Option<PathBuf>,
        /// Include delivery leaves under allocations
        #[arg(short, long)]
        deliveries: bool,
        /// Only the region with this id
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Rank drivers by loaded tonnage
    Drivers {
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: Option<PathBuf>,
        /// Show only the first N drivers
        #[arg(short = 'n', long)]
        top: Option<usize>,
    },

    /// Network graph nodes and edges (regions and departments)
    Graph {
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: Option<PathBuf>,
    },

    /// Follow a selection path down the hierarchy
    Drill {
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: Option<PathBuf>,
        #[command(flatten)]
        path: DrillPath,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Selection ids, applied top down; each must belong to the one above it.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct DrillPath {
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long = "dept")]
    pub department: Option<String>,
    #[arg(long)]
    pub commune: Option<String>,
    #[arg(long)]
    pub operator: Option<String>,
    #[arg(long)]
    pub allocation: Option<String>,
    #[arg(long)]
    pub delivery: Option<String>,
}

impl DrillPath {
    pub fn steps(&self) -> Vec<(Level, String)> {
        [
            (Level::Region, &self.region),
            (Level::Department, &self.department),
            (Level::Commune, &self.commune),
            (Level::Operator, &self.operator),
            (Level::Allocation, &self.allocation),
            (Level::Delivery, &self.delivery),
        ]
        .into_iter()
        .filter_map(|(level, id)| id.clone().map(|id| (level, id)))
        .collect()
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file locations
    Path,
    /// Print a template config file
    Template,
}

fn parse_level(s: &str) -> Result<Level, String> {
    s.parse::<Level>().map_err(|e| e.to_string())
}
