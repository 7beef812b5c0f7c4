//! Command dispatch

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use generational_arena::Index;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::services::{LevelRow, RollupService};
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands, DrillPath};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{DomainError, Level, NodeStats, RollupNode, RollupTree};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Stats { snapshot, level }) => {
            let container = load_container(cli)?;
            cmd_stats(&container, cli.json, snapshot.as_deref(), *level)
        }
        Some(Commands::Tree {
            snapshot,
            deliveries,
            region,
        }) => {
            let container = load_container(cli)?;
            cmd_tree(
                &container,
                cli.json,
                snapshot.as_deref(),
                *deliveries,
                region.as_deref(),
            )
        }
        Some(Commands::Drivers { snapshot, top }) => {
            let container = load_container(cli)?;
            cmd_drivers(&container, cli.json, snapshot.as_deref(), *top)
        }
        Some(Commands::Graph { snapshot }) => {
            let container = load_container(cli)?;
            cmd_graph(&container, cli.json, snapshot.as_deref())
        }
        Some(Commands::Drill { snapshot, path }) => {
            let container = load_container(cli)?;
            cmd_drill(&container, cli.json, snapshot.as_deref(), path)
        }
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => env::current_dir()
            .map_err(|e| CliError::Infra(InfraError::io("resolve current directory", e))),
    }
}

fn load_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let dir = project_dir(cli)?;
    let settings = Settings::load(Some(&dir))?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

fn snapshot_path(container: &ServiceContainer, arg: Option<&Path>) -> CliResult<PathBuf> {
    arg.map(Path::to_path_buf)
        .or_else(|| container.settings.snapshot.clone())
        .ok_or_else(|| {
            CliError::Usage(
                "no snapshot given and no `snapshot` configured (see `tonnage config template`)"
                    .to_string(),
            )
        })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(InfraError::from)?;
    output::info(&json);
    Ok(())
}

fn format_stats(label: &str, level: Level, stats: &NodeStats) -> String {
    let noun = level.child().map_or("", |c| c.noun(stats.count));
    format!(
        "{:<28} {:>4} {:<12} {:>10.1} / {:>10.1} T {}",
        label,
        stats.count,
        noun,
        stats.total_delivered,
        stats.total_target,
        output::percent(stats.completion_rate())
    )
}

fn format_row(row: &LevelRow) -> String {
    let label = match &row.parent {
        Some(parent) => format!("{} ({})", row.label, parent),
        None => row.label.clone(),
    };
    format_stats(&label, row.level, &row.stats)
}

#[instrument(skip(container))]
fn cmd_stats(
    container: &ServiceContainer,
    json: bool,
    snapshot: Option<&Path>,
    level: Level,
) -> CliResult<()> {
    let service = container.rollup_service();
    let (hierarchy, _) = service.load_snapshot(&snapshot_path(container, snapshot)?)?;
    let rows = service.level_stats(&hierarchy, level)?;

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        output::warning(&format!("no {} in snapshot", level.noun(0)));
        return Ok(());
    }

    output::header(&format!("{} {}", rows.len(), level.noun(rows.len())));
    for row in &rows {
        output::info(&format_row(row));
    }
    let total = rows
        .iter()
        .map(|r| r.stats)
        .fold(NodeStats::default(), |acc, s| acc + s);
    output::info(&format!(
        "{:<28} {:>4} {:<12} {:>10.1} / {:>10.1} T {}",
        "Total",
        "",
        "",
        total.total_delivered,
        total.total_target,
        output::percent(total.completion_rate())
    ));
    Ok(())
}

/// Nested JSON view of a roll-up tree.
#[derive(Serialize)]
struct TreeJson<'a> {
    #[serde(flatten)]
    node: &'a RollupNode,
    children: Vec<TreeJson<'a>>,
}

fn tree_json(tree: &RollupTree, idx: Index) -> Option<TreeJson<'_>> {
    let node = tree.get_node(idx)?;
    Some(TreeJson {
        node: &node.data,
        children: node
            .children
            .iter()
            .filter_map(|&child| tree_json(tree, child))
            .collect(),
    })
}

#[instrument(skip(container))]
fn cmd_tree(
    container: &ServiceContainer,
    json: bool,
    snapshot: Option<&Path>,
    deliveries: bool,
    region: Option<&str>,
) -> CliResult<()> {
    let service = container.rollup_service();
    let (hierarchy, _) = service.load_snapshot(&snapshot_path(container, snapshot)?)?;
    let mut trees = service.tree(&hierarchy, deliveries);

    if let Some(id) = region {
        trees.retain(|t| t.root_node().is_some_and(|n| n.data.id == id));
        if trees.is_empty() {
            return Err(ApplicationError::from(DomainError::UnknownNode {
                level: Level::Region,
                id: id.to_string(),
            })
            .into());
        }
    }

    if json {
        let nested: Vec<_> = trees
            .iter()
            .filter_map(|t| t.root().and_then(|root| tree_json(t, root)))
            .collect();
        return print_json(&nested);
    }
    for tree in &trees {
        output::info(&tree.to_tree_string());
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_drivers(
    container: &ServiceContainer,
    json: bool,
    snapshot: Option<&Path>,
    top: Option<usize>,
) -> CliResult<()> {
    let service = container.rollup_service();
    let (_, deliveries) = service.load_snapshot(&snapshot_path(container, snapshot)?)?;
    let mut stats = service.drivers(&deliveries);
    let total = stats.len();
    if let Some(n) = top {
        stats.truncate(n);
    }

    if json {
        return print_json(&stats);
    }
    if total == 0 {
        output::warning("no deliveries in snapshot");
        return Ok(());
    }
    output::header(&format!("{total} drivers"));
    for (rank, stat) in stats.iter().enumerate() {
        output::info(&format!(
            "{:>3}. {:<24} {:<12} {:>4} trips {:>10.1} T",
            rank + 1,
            stat.driver_name,
            stat.latest_truck_plate.as_deref().unwrap_or("-"),
            stat.trip_count,
            stat.total_tonnage
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_graph(container: &ServiceContainer, json: bool, snapshot: Option<&Path>) -> CliResult<()> {
    let service = container.rollup_service();
    let (hierarchy, _) = service.load_snapshot(&snapshot_path(container, snapshot)?)?;
    let graph = service.graph(&hierarchy);

    if json {
        return print_json(&graph);
    }
    output::header(&format!("{} nodes", graph.nodes.len()));
    for node in &graph.nodes {
        output::info(&format!(
            "{:<24} {:<28} size {:>6.1} {}",
            node.id,
            node.label,
            node.size,
            output::percent(node.completion)
        ));
    }
    output::header(&format!("{} edges", graph.edges.len()));
    for edge in &graph.edges {
        output::detail(&format!("{} -> {}", edge.source, edge.target));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_drill(
    container: &ServiceContainer,
    json: bool,
    snapshot: Option<&Path>,
    path: &DrillPath,
) -> CliResult<()> {
    let service: RollupService = container.rollup_service();
    let (hierarchy, _) = service.load_snapshot(&snapshot_path(container, snapshot)?)?;
    let drill = service.drill(&hierarchy, &path.steps())?;

    if json {
        return print_json(&drill);
    }

    if drill.path.is_empty() {
        output::header("No selection");
    } else {
        let crumbs: Vec<_> = drill.path.iter().map(|r| r.label.as_str()).collect();
        output::header(&crumbs.join(" > "));
    }
    if let Some(focus) = drill.focus() {
        output::info(&format_stats(&focus.label, focus.level, &focus.stats));
    }
    for child in &drill.children {
        output::detail(&format_row(child));
    }
    for delivery in &drill.deliveries {
        let line = format!(
            "{:<12} {:<12} {:<20} {:>8.1} T loaded {:>8.1} T delivered",
            delivery.id,
            delivery
                .delivered_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
            delivery.driver_name.as_deref().unwrap_or("-"),
            delivery.tonnage_loaded,
            delivery.tonnage_delivered
        );
        if drill.selection.delivery.as_deref() == Some(delivery.id.as_str()) {
            output::selected(&line);
        } else {
            output::detail(&line);
        }
    }
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    let dir = project_dir(cli)?;
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(&dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let marker = |p: &Path| if p.exists() { "" } else { " (missing)" };
            match global_config_path() {
                Some(global) => {
                    output::info(&format!("global: {}{}", global.display(), marker(&global)))
                }
                None => output::warning("no config directory for this platform"),
            }
            let local = local_config_path(&dir);
            output::info(&format!("local:  {}{}", local.display(), marker(&local)));
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}
