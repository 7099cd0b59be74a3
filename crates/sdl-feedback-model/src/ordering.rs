// SPDX-License-Identifier: Apache-2.0

use crate::entry::Entry;
use chrono::{DateTime, Utc};

#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Sorts ascending by `created_at`. Entries with unparsable timestamps go last;
/// the sort is stable so ties keep insertion order.
pub fn display_order(entries: &mut [Entry]) {
    entries.sort_by_cached_key(|entry| {
        let ts = entry.created_at_utc();
        (ts.is_none(), ts)
    });
}
