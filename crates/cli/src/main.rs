use clap::Parser;

mod commands;

use commands::{CacheOptions, Commands};

#[derive(Parser)]
#[command(name = "filecache")]
#[command(about = "Memoize command output in a persistent cache", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    cache: CacheOptions,

    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    filecache_utils::tracing::init(cli.verbose)?;

    cli.command.execute(&cli.cache).await
}
