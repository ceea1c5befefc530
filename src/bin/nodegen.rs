use clap::Parser;

use transit_graph::config::Config;
use transit_graph::graph::error::Error;
use transit_graph::graph::{events, node_table};
use transit_graph::routes::catalog::Catalog;
use transit_graph::routes::raw;

/// Expand raw route timetables into the time-expanded node table
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the raw routes JSON dump
    input: String,

    /// Output path for the node table CSV
    #[arg(default_value = "node_table.csv")]
    output: String,

    /// JSON file overriding the default build parameters
    #[arg(long)]
    config: Option<String>,

    /// Cap on the number of routes ingested
    #[arg(long)]
    route_limit: Option<usize>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let mut config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    if let Some(limit) = args.route_limit {
        config.route_limit = Some(limit);
    }
    config.validate()?;

    log::info!("reading routes from {}", args.input);
    let network = raw::read_network(&args.input)?;
    let catalog = Catalog::from_raw(&network, config.route_limit);
    catalog.print_stats();

    let (nodes, stats) = events::expand(&catalog, &config);
    log::info!(
        "expanded {} variants ({} skipped), {} trips ({} skipped) into {} events",
        stats.variants_expanded,
        stats.variants_skipped,
        stats.trips_expanded,
        stats.trips_skipped,
        nodes.len()
    );

    node_table::write_nodes_to_path(&nodes, &args.output)?;
    log::info!("wrote node table to {}", args.output);
    Ok(())
}
