use clap::Parser;

use transit_graph::config::Config;
use transit_graph::graph::error::Error;
use transit_graph::graph::link_table::LinkWriter;
use transit_graph::graph::{links, node_table};
use transit_graph::routes::catalog::Catalog;
use transit_graph::routes::raw;

/// Join the node table into ride, wait, transfer and walk links
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the node table CSV produced by nodegen
    nodes: String,

    /// Path to the raw routes JSON dump (for stop locations and route sets)
    routes: String,

    /// Output path for the link table CSV
    output: String,

    /// JSON file overriding the default build parameters
    #[arg(long)]
    config: Option<String>,
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
    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    config.validate()?;

    log::info!("reading node table from {}", args.nodes);
    let nodes = node_table::read_nodes_from_path(&args.nodes)?;
    log::info!("loaded {} nodes", nodes.len());

    log::info!("reading stops from {}", args.routes);
    let network = raw::read_network(&args.routes)?;
    let catalog = Catalog::from_raw(&network, None);
    log::info!("loaded {} stops", catalog.stops.len());

    let file = std::fs::File::create(&args.output)?;
    let mut writer = LinkWriter::new(std::io::BufWriter::new(file))?;
    let stats = links::build_links(&nodes, &catalog.stops, &config, &mut writer)?;
    let mut inner = writer.finish()?;
    std::io::Write::flush(&mut inner)?;

    stats.print_stats();
    log::info!("wrote {} links to {}", stats.total(), args.output);
    Ok(())
}
