//! CLI entry point for the relmap demo.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use relmap_core::config::load_section;
use relmap_core::StoreConfig;
use relmap_store::Store;

use relmap_demo::config::DemoConfig;
use relmap_demo::routes::{Backing, Route};

#[derive(Parser)]
#[command(name = "relmap")]
#[command(about = "Replay the relationship and todo demos against a relmap store")]
struct Cli {
    #[command(subcommand)]
    route: Route,

    /// Snapshot for the relationship example (overrides config).
    #[arg(long)]
    relations_file: Option<PathBuf>,

    /// Snapshot for the todo app (overrides config).
    #[arg(long)]
    todo_file: Option<PathBuf>,

    /// Config file prefix (default: relmap).
    #[arg(short, long, default_value = "relmap")]
    config: String,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let demo_section: Option<DemoConfig> = load_section(&cli.config, "demo")?;
    let store_section: Option<StoreConfig> = load_section(&cli.config, "store")?;
    let absent: Vec<&str> = [
        ("demo", demo_section.is_none()),
        ("store", store_section.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, missing)| missing.then_some(name))
    .collect();

    let mut demo_config = demo_section.unwrap_or_default();
    let store_config = store_section.unwrap_or_default();
    if let Some(path) = cli.relations_file {
        demo_config.relations_file = path;
    }
    if let Some(path) = cli.todo_file {
        demo_config.todo_file = path;
    }

    init_tracing(demo_config.log_json);
    for section in absent {
        tracing::debug!(section, config = %cli.config, "Config section absent, using defaults");
    }

    let store = match cli.route.backing() {
        Some(Backing::Relations) => Store::open(&demo_config.relations_store(&store_config))?,
        Some(Backing::Todos) => Store::open(&demo_config.todo_store(&store_config))?,
        None => Store::in_memory(),
    };

    let response = cli.route.handle(&store);
    tracing::info!(route = ?cli.route, status = response.status, "Handled");
    println!("{}", response.render());

    if cli.route.is_write() {
        store.close()?;
    }

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Logs go to stderr so stdout carries only the response body.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
