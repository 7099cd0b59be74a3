// SPDX-License-Identifier: Apache-2.0

use crate::backend::{SlotStorage, StoreError, StoreErrorCode};
use crate::paths::IDENTITY_SLOT;
use sdl_feedback_model::{truncate_chars, NAME_MAX_CHARS};
use std::sync::Arc;
use tracing::warn;

/// Remembers the last display name typed by the submitter.
pub struct IdentityStore {
    slots: Arc<dyn SlotStorage>,
}

impl IdentityStore {
    #[must_use]
    pub fn new(slots: Arc<dyn SlotStorage>) -> Self {
        Self { slots }
    }

    /// Last saved name, or an empty string.
    #[must_use]
    pub fn get(&self) -> String {
        match self.slots.read(IDENTITY_SLOT) {
            Ok(Some(raw)) => raw.trim().to_string(),
            Ok(None) => String::new(),
            Err(err) => {
                warn!(error = %err, "display name unreadable; treating as empty");
                String::new()
            }
        }
    }

    pub fn set(&self, name: &str) -> Result<(), StoreError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                "display name must not be empty",
            ));
        }
        self.slots
            .write(IDENTITY_SLOT, &truncate_chars(trimmed, NAME_MAX_CHARS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemorySlots;

    #[test]
    fn get_is_empty_before_first_save() {
        let identity = IdentityStore::new(Arc::new(MemorySlots::new()));
        assert_eq!(identity.get(), "");
    }

    #[test]
    fn set_overwrites_previous_name() {
        let identity = IdentityStore::new(Arc::new(MemorySlots::new()));
        identity.set("Al").expect("save");
        identity.set("  Bo ").expect("save");
        assert_eq!(identity.get(), "Bo");
    }

    #[test]
    fn empty_name_is_rejected_without_touching_storage() {
        let slots = Arc::new(MemorySlots::new());
        let identity = IdentityStore::new(slots.clone());
        identity.set("Al").expect("save");
        let err = identity.set("   ").expect_err("empty rejected");
        assert_eq!(err.code, StoreErrorCode::Validation);
        assert_eq!(identity.get(), "Al");
    }
}
