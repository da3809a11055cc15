// SPDX-License-Identifier: MIT OR Apache-2.0
//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nodeflow_canvas::serializer::ImportReport;
use nodeflow_canvas::{topology, vec2, CanvasConfig, CanvasEditor, GraphDocument, NodeCatalog};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "nodeflow")]
#[command(version, about = "Check and order nodeflow graph documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a graph for execution and print its order
    Check(GraphArgs),

    /// Print the graph with a freshly computed execution order
    Order(GraphArgs),
}

/// Inputs shared by every command
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Graph document (JSON)
    pub graph: PathBuf,

    /// Node catalog (RON list of definitions)
    #[arg(short, long)]
    pub catalog: PathBuf,

    /// Canvas config (RON)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn load_editor(args: &GraphArgs) -> Result<(CanvasEditor, ImportReport)> {
    let config = match &args.config {
        Some(path) => CanvasConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CanvasConfig::default(),
    };
    let catalog = NodeCatalog::load(&args.catalog)
        .with_context(|| format!("Failed to load catalog {}", args.catalog.display()))?;
    let document = read_document(&args.graph)?;

    let mut editor = CanvasEditor::new(config, catalog, vec2(1280.0, 720.0));
    let report = editor.import(&document);
    Ok((editor, report))
}

fn read_document(path: &Path) -> Result<GraphDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    GraphDocument::from_json(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_skipped(report: &ImportReport) {
    for id in &report.skipped_nodes {
        println!("  skipped node {id}");
    }
    for id in &report.skipped_connections {
        println!("  skipped connection {id}");
    }
}

/// Validate the graph. Fails the process when execution would be rejected.
pub fn check(args: &GraphArgs) -> Result<ExitCode> {
    let (editor, import) = load_editor(args)?;
    print_skipped(&import);

    let report = topology::validate(editor.store());
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    if !report.is_ok() {
        for error in &report.errors {
            println!("error: {error}");
        }
        println!("{report}");
        return Ok(ExitCode::FAILURE);
    }

    println!("OK: {} nodes", report.order.len());
    for (step, id) in report.order.iter().enumerate() {
        let type_tag = editor
            .store()
            .node(*id)
            .map_or("?", |node| node.type_tag.as_str());
        println!("{:>4}. {id} {type_tag}", step + 1);
    }
    Ok(ExitCode::SUCCESS)
}

/// Print the re-exported document
pub fn order(args: &GraphArgs) -> Result<ExitCode> {
    let (editor, import) = load_editor(args)?;
    if !import.skipped_nodes.is_empty() || !import.skipped_connections.is_empty() {
        tracing::warn!(
            "{} nodes and {} connections could not be imported",
            import.skipped_nodes.len(),
            import.skipped_connections.len()
        );
    }
    if import.execution_order.cycle_detected {
        tracing::warn!("Graph contains a cycle; execution order is partial");
    }

    let document = editor.export();
    println!("{}", document.to_json_pretty()?);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from([
            "nodeflow",
            "check",
            "graph.json",
            "--catalog",
            "nodes.ron",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.graph, PathBuf::from("graph.json"));
        assert_eq!(args.catalog, PathBuf::from("nodes.ron"));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_catalog_is_required() {
        assert!(Cli::try_parse_from(["nodeflow", "order", "graph.json"]).is_err());
    }

    #[test]
    fn test_check_files() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("nodes.ron");
        let graph = dir.path().join("graph.json");
        std::fs::write(
            &catalog,
            r#"[
                (type_tag: "constant", display_name: "Constant", outputs: [(name: "out", port_type: "number")]),
                (type_tag: "print", display_name: "Print", inputs: [(name: "in", port_type: "any")]),
            ]"#,
        )
        .unwrap();
        std::fs::write(
            &graph,
            r#"{
                "nodes": [
                    {"id": 1, "typeTag": "constant", "position": {"x": 0.0, "y": 0.0}},
                    {"id": 2, "typeTag": "print", "position": {"x": 300.0, "y": 0.0}}
                ],
                "connections": [
                    {"id": 1, "source": {"nodeId": 1, "portName": "out"}, "target": {"nodeId": 2, "portName": "in"}}
                ]
            }"#,
        )
        .unwrap();

        let args = GraphArgs {
            graph: graph.clone(),
            catalog,
            config: None,
        };
        let (editor, report) = load_editor(&args).unwrap();
        assert!(report.skipped_nodes.is_empty());
        assert_eq!(editor.store().connection_count(), 1);
        assert_eq!(check(&args).unwrap(), ExitCode::SUCCESS);

        let missing = GraphArgs {
            graph: dir.path().join("missing.json"),
            ..args
        };
        assert!(check(&missing).is_err());
    }
}
