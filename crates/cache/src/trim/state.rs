//! Encoding of the persisted last-trim timestamp
//!
//! `trim.txt` holds the unix time in whole seconds, in decimal, of the last
//! completed trim. Surrounding whitespace is ignored when reading. Anything
//! else, including bytes that are not UTF-8, does not parse.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Parse the contents of `trim.txt`
pub fn parse_timestamp(contents: &[u8]) -> Option<SystemTime> {
    let secs: u64 = std::str::from_utf8(contents).ok()?.trim().parse().ok()?;
    UNIX_EPOCH.checked_add(Duration::from_secs(secs))
}

/// Render `time` for `trim.txt`. Times before the epoch render as zero.
pub fn format_timestamp(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    secs.to_string()
}

/// Whether a trim that completed at `last` is recent enough to skip another
/// one at `now`. A `last` in the future never counts as recent.
pub fn is_recent(last: SystemTime, now: SystemTime, interval: Duration) -> bool {
    match now.duration_since(last) {
        Ok(elapsed) => elapsed < interval,
        Err(_) => false,
    }
}
