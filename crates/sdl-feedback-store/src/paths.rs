// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

/// JSON array of entries.
pub const ENTRIES_SLOT: &str = "sdl_feedback";
/// Plain display name.
pub const IDENTITY_SLOT: &str = "sdl_username";

#[must_use]
pub fn slot_path(root: &Path, key: &str) -> PathBuf {
    root.join(key)
}

#[must_use]
pub(crate) fn slot_tmp_path(root: &Path, key: &str) -> PathBuf {
    root.join(format!(".{key}.tmp"))
}
