use crate::errors::{Result, UtilsError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, trace, warn, Level};

/// Initialize the tracing system
///
/// `RUST_LOG` wins when set. Otherwise the verbosity picks the level:
/// 0 is `info`, 1 is `debug`, anything higher is `trace`. Output always goes
/// to stderr so stdout stays reserved for replayed command output.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbosity)))
        .map_err(|e| UtilsError::Tracing {
            message: e.to_string(),
        })?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(verbosity > 1)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| UtilsError::Tracing {
            message: e.to_string(),
        })
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}
