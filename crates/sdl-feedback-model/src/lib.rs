// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Feedback entry model.
//!
//! Entries are immutable once composed; the only collection-level operations
//! live in [`display_order`] and [`merge`], both pure.

mod entry;
mod merge;
mod ordering;
mod page;
mod serde_helpers;

pub use entry::{
    normalize_message, normalize_name, truncate_chars, Entry, EntryId, ValidationError,
    ANONYMOUS_NAME, MESSAGE_MAX_CHARS, NAME_MAX_CHARS, SOURCE_AGENT_MAX_CHARS,
};
pub use merge::{dedupe_by_id, merge};
pub use ordering::{display_order, parse_timestamp};
pub use page::{PageKey, DEFAULT_PAGE, PAGE_MAX_LEN};

pub const CRATE_NAME: &str = "sdl-feedback-model";
