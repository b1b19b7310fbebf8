use anyhow::Result;
use tracing::info;

use super::CacheOptions;

pub fn execute(options: &CacheOptions) -> Result<()> {
    let cache = options.open()?;
    let report = cache.trim()?;

    info!(dir = %cache.dir().display(), "trim finished");
    println!(
        "scanned {} files, removed {} ({} bytes), {} bytes retained",
        report.scanned, report.removed_files, report.removed_bytes, report.retained_bytes
    );
    Ok(())
}
