//! Index entries and their on-disk encoding
//!
//! An index file is one ASCII line:
//!
//! ```text
//! v1 <action-hex> <output-hex> <size> <unix-nanos>
//! ```
//!
//! Size and time are right-aligned in 20 columns so every index file has
//! the same length.

use crate::hashing::{ActionId, OutputId};
use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const INDEX_VERSION: &str = "v1";

/// The record stored for one action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Content address of the output
    #[serde(serialize_with = "serialize_output")]
    pub output: OutputId,
    /// Output size in bytes
    pub size: u64,
    /// When the entry was written
    pub time: SystemTime,
}

impl Entry {
    /// Render the index line for `action`
    pub fn encode(&self, action: &ActionId) -> String {
        let nanos = self
            .time
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        format!(
            "{INDEX_VERSION} {} {} {:>20} {:>20}\n",
            action.to_hex(),
            self.output.to_hex(),
            self.size,
            nanos
        )
    }

    /// Parse an index line, checking it belongs to `action`.
    ///
    /// Any deviation from the format yields `None`; callers treat that as a miss.
    pub fn decode(action: &ActionId, line: &str) -> Option<Self> {
        let mut fields = line.split_ascii_whitespace();
        if fields.next()? != INDEX_VERSION {
            return None;
        }
        if ActionId::from_hex(fields.next()?).ok()? != *action {
            return None;
        }
        let output = OutputId::from_hex(fields.next()?).ok()?;
        let size = fields.next()?.parse::<u64>().ok()?;
        let nanos = fields.next()?.parse::<u64>().ok()?;
        if fields.next().is_some() {
            return None;
        }

        Some(Self {
            output,
            size,
            time: UNIX_EPOCH + Duration::from_nanos(nanos),
        })
    }
}

fn serialize_output<S: serde::Serializer>(
    output: &OutputId,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&output.to_hex())
}
