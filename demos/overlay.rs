//! Builds an in-process overlay, then resolves a node and a value across it.
//!
//! Run: `cargo run --example overlay -- --nodes 50 --verbose`

use clap::Parser;
use tracing::{info, Level};
use xorkad::{Config, Node};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of nodes in the overlay
    #[arg(short, long, default_value_t = 20)]
    nodes: usize,
    /// K, the bucket size
    #[arg(short, long, default_value_t = xorkad::DEFAULT_K)]
    k: usize,
    /// Log every lookup hop
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), xorkad::Error> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            Level::TRACE
        } else {
            Level::INFO
        })
        .init();

    let config = Config {
        k: cli.k,
        ..Default::default()
    };

    let nodes = (0..cli.nodes)
        .map(|i| Node::with_config(&format!("node-{i}"), config.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    // Every node joins through the first one, then pings its successor.
    for (i, node) in nodes.iter().enumerate().skip(1) {
        node.ping(&nodes[0]);
        if let Some(next) = nodes.get(i + 1) {
            node.ping(next);
        }
    }

    for node in &nodes {
        info!(id = %node.id(), contacts = node.contacts().len(), "Routing table");
    }

    let (Some(first), Some(last)) = (nodes.first(), nodes.last()) else {
        return Ok(());
    };

    match first.find_node(last.id()) {
        Some(found) => info!(lookup = %last.id(), closest = found.len(), "find_node succeeded"),
        None => info!(lookup = %last.id(), "find_node failed"),
    }

    first.store("greeting", "hello", last);

    match first.find_value("greeting") {
        Some(value) => info!(value = %value, "find_value succeeded"),
        None => info!("find_value failed"),
    }

    Ok(())
}
