//! Palaver TUI entry point.

use std::path::PathBuf;

use clap::Parser;
use palaver_client::ProfileStore;
use palaver_tui::runtime::Runtime;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Palaver terminal chat client
#[derive(Parser, Debug)]
#[command(name = "palaver-tui")]
#[command(about = "Terminal UI for the palaver chat server")]
#[command(version)]
struct Args {
    /// Chat server host to connect to
    #[arg(short, long, default_value = "192.168.4.1")]
    server: String,

    /// Profile file path (defaults to the platform config directory)
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Log to a file next to the profile. Writing to stderr would corrupt the
/// alternate screen.
fn init_logging(args: &Args) -> std::io::Result<()> {
    let log_path = ProfileStore::default_path().with_file_name("palaver-tui.log");
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::File::create(log_path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(log_file).with_ansi(false))
        .with(filter)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let profile_path = args.profile.clone().unwrap_or_else(ProfileStore::default_path);
    let runtime = Runtime::new(args.server, profile_path)?;
    Ok(runtime.run().await?)
}
