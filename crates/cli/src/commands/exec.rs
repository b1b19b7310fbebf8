//! `filecache exec`: memoized command execution

use anyhow::{bail, Context, Result};
use clap::Args;
use filecache::{ActionId, Cache, HashingWriter, OutputId, RemoteClient};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::CacheOptions;

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Pass stdin to the command and make its content part of the key
    #[arg(long)]
    pub stdin: bool,

    /// Trim the cache before running
    #[arg(long)]
    pub trim: bool,

    /// Also consult and populate the cache served at this URL
    #[arg(long, env = "FILECACHE_REMOTE")]
    pub remote: Option<String>,

    /// Command and its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<OsString>,
}

pub async fn execute(options: &CacheOptions, args: ExecArgs) -> Result<()> {
    let cache = options.open()?;
    if args.trim {
        let report = cache.trim()?;
        debug!(removed = report.removed_files, bytes = report.removed_bytes, "trimmed before run");
    }
    let remote = args.remote.as_deref().map(RemoteClient::new).transpose()?;

    let stdin = if args.stdin {
        Some(spool_stdin()?)
    } else {
        None
    };
    let digest = stdin.as_ref().map(|(_, digest)| *digest.as_bytes());
    let action = ActionId::from_command(&args.command, digest.as_ref());
    debug!(action = %action, command = ?args.command, "computed action");

    if replay_local(&cache, &action)? {
        return Ok(());
    }
    if let Some(remote) = &remote {
        if replay_remote(&cache, remote, &action).await? {
            return Ok(());
        }
    }

    let (status, mut output) = run_and_tee(&args.command, stdin.map(|(file, _)| file)).await?;
    if !status.success() {
        warn!(command = ?args.command, %status, "command failed, output not cached");
        std::process::exit(status.code().unwrap_or(1));
    }

    let size = output
        .metadata()
        .context("failed to inspect captured output")?
        .len();
    if size == 0 {
        debug!(action = %action, "empty output, not caching");
        return Ok(());
    }

    output.seek(SeekFrom::Start(0))?;
    let (stored, _) = cache.put(&action, &mut output)?;
    debug!(action = %action, output = %stored, bytes = size, "cached command output");

    if let Some(remote) = &remote {
        output.seek(SeekFrom::Start(0))?;
        let mut body = Vec::new();
        output.read_to_end(&mut body)?;
        if let Err(e) = remote.put(&action, body).await {
            warn!(remote = remote.base_url(), error = %e, "failed to upload to remote cache");
        }
    }

    Ok(())
}

/// Copy stdin into an anonymous temporary file, hashing it on the way
fn spool_stdin() -> Result<(File, OutputId)> {
    let spool = tempfile::tempfile().context("failed to create stdin spool")?;
    let mut writer = HashingWriter::new(spool);
    io::copy(&mut io::stdin().lock(), &mut writer).context("failed to read stdin")?;

    let (mut spool, digest, size): (File, OutputId, u64) = writer.finish();
    spool.seek(SeekFrom::Start(0))?;
    debug!(digest = %digest, bytes = size, "spooled stdin");
    Ok((spool, digest))
}

fn replay_local(cache: &Cache, action: &ActionId) -> Result<bool> {
    let (path, entry) = match cache.get_file(action) {
        Ok(found) => found,
        Err(e) if e.is_not_found() => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    // The file can vanish under a concurrent trim; that is still a miss.
    let mut file = match File::open(&path) {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cached output disappeared");
            return Ok(false);
        }
    };

    let mut stdout = io::stdout().lock();
    io::copy(&mut file, &mut stdout).context("failed to replay cached output")?;
    stdout.flush()?;
    debug!(action = %action, bytes = entry.size, "replayed from cache");
    Ok(true)
}

async fn replay_remote(cache: &Cache, remote: &RemoteClient, action: &ActionId) -> Result<bool> {
    let body = match remote.get(action).await {
        Ok(Some(body)) if !body.is_empty() => body,
        Ok(_) => return Ok(false),
        Err(e) => {
            warn!(remote = remote.base_url(), error = %e, "remote cache unavailable");
            return Ok(false);
        }
    };

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&body).await?;
    stdout.flush().await?;

    cache.put(action, &body[..])?;
    info!(action = %action, bytes = body.len(), "replayed from remote cache");
    Ok(true)
}

/// Run `command`, copying its stdout both to our stdout and to a temporary
/// file that is returned with the exit status.
async fn run_and_tee(command: &[OsString], stdin: Option<File>) -> Result<(ExitStatus, File)> {
    let Some((program, args)) = command.split_first() else {
        bail!("no command given");
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(stdin.map_or_else(Stdio::null, Stdio::from))
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("failed to start '{}'", program.to_string_lossy()))?;
    let mut child_stdout = child
        .stdout
        .take()
        .context("command stdout was not captured")?;

    let capture = tempfile::tempfile().context("failed to create output spool")?;
    let mut capture = tokio::fs::File::from_std(capture);
    let mut stdout = tokio::io::stdout();
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = child_stdout.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        stdout.write_all(&buf[..n]).await?;
        capture.write_all(&buf[..n]).await?;
    }
    stdout.flush().await?;
    capture.flush().await?;

    let status = child.wait().await?;
    Ok((status, capture.into_std().await))
}
