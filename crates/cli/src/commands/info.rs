use anyhow::Result;
use serde_json::json;
use std::time::UNIX_EPOCH;

use super::CacheOptions;

pub fn execute(options: &CacheOptions) -> Result<()> {
    let cache = options.open()?;
    let last_trim = cache
        .last_trim()?
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|since| since.as_secs());

    let info = json!({
        "dir": cache.dir(),
        "config": cache.config(),
        "last_trim": last_trim,
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
