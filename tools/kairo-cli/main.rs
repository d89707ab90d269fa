use clap::Parser;
use kairo::prelude::*;
use std::fs;
use std::process::ExitCode;

/// Inspect and validate a saved workflow graph snapshot.
#[derive(Parser)]
#[command(name = "kairo-cli", version, about)]
struct Cli {
    /// Path to a workflow graph JSON file (the snapshot format, not the
    /// save payload)
    graph: String,

    /// Path to an object metadata JSON file: { "Account": [{name, type, required}] }
    #[arg(short, long)]
    metadata: Option<String>,

    /// Print the recomputed execution plan (order + labels)
    #[arg(short, long)]
    plan: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let graph = match load_graph(&cli.graph) {
        Ok(graph) => graph,
        Err(message) => {
            eprintln!("error: {}", message);
            return ExitCode::FAILURE;
        }
    };

    let metadata = match cli.metadata.as_deref().map(load_metadata) {
        Some(Ok(cache)) => cache,
        Some(Err(message)) => {
            eprintln!("error: {}", message);
            return ExitCode::FAILURE;
        }
        None => MetadataCache::new(),
    };

    if cli.plan {
        print_plan(&graph);
    }

    match validate_graph(&graph, &metadata) {
        Ok(()) => {
            println!(
                "OK: {} nodes, {} edges, all configurations valid",
                graph.node_count(),
                graph.edge_count()
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("invalid: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn load_graph(path: &str) -> Result<WorkflowGraph, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("could not read '{}': {}", path, e))?;
    let graph: WorkflowGraph =
        serde_json::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path, e))?;
    // Persisted snapshots may carry stale derived fields.
    Ok(graph.refreshed())
}

fn load_metadata(path: &str) -> Result<MetadataCache, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("could not read '{}': {}", path, e))?;
    let objects: std::collections::HashMap<String, Vec<FieldDescriptor>> =
        serde_json::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path, e))?;
    let mut cache = MetadataCache::new();
    for (object, fields) in objects {
        cache.insert(object, fields);
    }
    Ok(cache)
}

fn print_plan(graph: &WorkflowGraph) {
    let mut nodes: Vec<_> = graph.nodes().collect();
    nodes.sort_by_key(|n| n.order.unwrap_or(u32::MAX));
    println!("Execution plan:");
    for node in nodes {
        let order = node
            .order
            .map(|o| o.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:>3}  {:<28} {}", order, node.label, node.display_label);
    }
}
