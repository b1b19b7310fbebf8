//! Manual access to single cache entries

use anyhow::{Context, Result};
use filecache::{ActionId, HashingWriter, OutputId};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use super::{parse_action, CacheOptions};

/// Copy the cached output of `id` to stdout
pub fn get(options: &CacheOptions, id: &str) -> Result<()> {
    let action = parse_action(id)?;
    let cache = options.open()?;

    let (path, _) = cache
        .get_file(&action)
        .with_context(|| format!("no cached output for {id}"))?;
    let mut file =
        File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;

    let mut stdout = io::stdout().lock();
    io::copy(&mut file, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Store `file`, or stdin when absent, as the output of `id`
pub fn put(options: &CacheOptions, id: &str, file: Option<&Path>) -> Result<()> {
    let action = parse_action(id)?;
    let cache = options.open()?;

    let (output, size) = match file {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            cache.put(&action, file)?
        }
        None => cache.put(&action, io::stdin().lock())?,
    };

    println!("{output} {size}");
    Ok(())
}

/// Print the action id of `command`, as `exec` computes it
pub fn id(stdin: bool, command: &[OsString]) -> Result<()> {
    let digest = if stdin {
        let mut writer = HashingWriter::new(io::sink());
        io::copy(&mut io::stdin().lock(), &mut writer).context("failed to read stdin")?;
        let (_, digest, _): (_, OutputId, u64) = writer.finish();
        Some(*digest.as_bytes())
    } else {
        None
    };

    let action = ActionId::from_command(command, digest.as_ref());
    println!("{}", action.to_base64url());
    Ok(())
}
