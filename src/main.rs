use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use storefront_admin::{app::App, config::Config, logging};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "storefront-admin")]
#[command(about = "A terminal back-office for a storefront API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/storefront-admin/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Rows per page for every list view
  #[arg(long)]
  page_size: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _guard = logging::init()?;

  let args = Args::parse();

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;

  // Override page size if specified on command line
  if let Some(page_size) = args.page_size {
    if page_size == 0 {
      return Err(eyre!("--page-size must be at least 1"));
    }
    config.sync.page_size = page_size;
  }

  info!(api = %config.api.url, page_size = config.sync.page_size, "starting");

  // Initialize and run the app
  let mut app = App::new(config)?;
  app.run().await?;

  Ok(())
}
