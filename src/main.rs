//! CLI entry point for the lab logger.
//!
//! Loads settings, wires up the logging façade (including the custom DATA
//! level), emits one smoke line per severity, and hands off to the
//! recorder loop.

use anyhow::Result;
use clap::Parser;
use lab_recorder::config::Settings;
use lab_recorder::logging::Logging;
use lab_recorder::recorder;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "lab_recorder")]
#[command(about = "Laboratory data-acquisition logger", long_about = None)]
struct Cli {
    /// Name of the configuration under config/ (without extension)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("Setting up logger");
    let settings = Settings::new(cli.config.as_deref())?;
    let logging = Logging::from_settings(&settings)?;
    logging.install()?;

    // One line per severity so a fresh deployment shows the whole ladder.
    let root = logging.root();
    root.critical("CRITICAL");
    root.error("ERROR");
    root.warning("WARN");
    root.info("INFO");
    root.debug("DEBUG");
    root.data("DATA");

    recorder::record(&settings).await?;
    Ok(())
}
