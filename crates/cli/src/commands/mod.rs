use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use filecache::{default_cache_dir, ActionId, Cache, CacheConfig};
use filecache_utils::parse_duration;
use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub mod entry;
pub mod exec;
pub mod info;
pub mod serve;
pub mod trim;

use self::exec::ExecArgs;

/// Where the cache lives and how it is trimmed
#[derive(Args, Debug, Clone, Default)]
pub struct CacheOptions {
    /// Cache directory [default: <user cache dir>/filecache]
    #[arg(long, global = true, env = "FILECACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Minimum time between two trims, e.g. 5m
    #[arg(long, global = true, value_parser = parse_duration)]
    pub trim_interval: Option<Duration>,

    /// Maximum age of an entry, e.g. 24h
    #[arg(long, global = true, value_parser = parse_duration)]
    pub trim_limit: Option<Duration>,

    /// Files larger than this many bytes expire after the trim interval
    #[arg(long, global = true)]
    pub trim_size: Option<u64>,

    /// Ceiling on total cached bytes
    #[arg(long, global = true)]
    pub max_size: Option<u64>,
}

impl CacheOptions {
    /// Environment configuration overlaid with the command-line flags
    pub fn config(&self) -> Result<CacheConfig> {
        let mut config = CacheConfig::from_env()?;
        if let Some(interval) = self.trim_interval {
            config.trim_interval = interval;
        }
        if let Some(limit) = self.trim_limit {
            config.trim_limit = limit;
        }
        if let Some(size) = self.trim_size {
            config.trim_size = size;
        }
        if let Some(size) = self.max_size {
            config.max_size = size;
        }
        Ok(config)
    }

    pub fn dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(default_cache_dir()?),
        }
    }

    pub fn open(&self) -> Result<Cache> {
        let dir = self.dir()?;
        Cache::open(&dir, self.config()?)
            .with_context(|| format!("failed to open cache at {}", dir.display()))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a command, replaying its output from the cache when possible
    Exec(ExecArgs),

    /// Serve the cache over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8372")]
        listen: SocketAddr,
    },

    /// Trim the cache now, regardless of the trim interval
    Trim,

    /// Print the cached output of an action
    Get {
        /// Action id, base64url or hex
        id: String,
    },

    /// Store a file (or stdin) as the output of an action
    Put {
        /// Action id, base64url or hex
        id: String,
        /// File to store; stdin when omitted
        file: Option<PathBuf>,
    },

    /// Print the action id `exec` would use for a command
    Id {
        /// Include the digest of stdin, like `exec --stdin`
        #[arg(long)]
        stdin: bool,

        #[arg(
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "COMMAND"
        )]
        command: Vec<OsString>,
    },

    /// Show the cache location, settings and last trim time as JSON
    Info,
}

impl Commands {
    pub async fn execute(self, options: &CacheOptions) -> Result<()> {
        match self {
            Commands::Exec(args) => exec::execute(options, args).await,
            Commands::Serve { listen } => serve::execute(options, listen).await,
            Commands::Trim => trim::execute(options),
            Commands::Get { id } => entry::get(options, &id),
            Commands::Put { id, file } => entry::put(options, &id, file.as_deref()),
            Commands::Id { stdin, command } => entry::id(stdin, &command),
            Commands::Info => info::execute(options),
        }
    }
}

/// Accept an action id in either of the encodings the tool prints
pub fn parse_action(id: &str) -> Result<ActionId> {
    if let Ok(action) = ActionId::from_base64url(id) {
        return Ok(action);
    }
    ActionId::from_hex(id).with_context(|| format!("'{id}' is not an action id"))
}
