// SPDX-License-Identifier: Apache-2.0

use crate::entry_store::EntryStore;
use crate::remote::RemoteGateway;
use sdl_feedback_model::{merge, PageKey};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Remote unreachable or unconfigured; local entries untouched.
    Unavailable,
    Merged {
        added: usize,
        /// Remote rows tagged with a different page.
        skipped: usize,
    },
}

impl SyncOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Merged { .. } => "merged",
        }
    }

    #[must_use]
    pub const fn added(self) -> usize {
        match self {
            Self::Unavailable => 0,
            Self::Merged { added, .. } => added,
        }
    }
}

/// One-directional remote → local merge. Local entries are never removed.
pub struct Reconciler {
    gateway: Arc<dyn RemoteGateway>,
}

impl Reconciler {
    #[must_use]
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self { gateway }
    }

    pub async fn sync(&self, store: &mut EntryStore, page: &PageKey) -> SyncOutcome {
        let Some(remote) = self.gateway.pull(page).await else {
            debug!(page = %page, backend = self.gateway.backend_tag(), "sync skipped: remote unavailable");
            return SyncOutcome::Unavailable;
        };
        let (matching, foreign): (Vec<_>, Vec<_>) =
            remote.into_iter().partition(|entry| &entry.page == page);
        if !foreign.is_empty() {
            warn!(page = %page, count = foreign.len(), "ignoring remote entries for other pages");
        }

        let local = store.load_all();
        let before = local.len();
        let merged = merge(local, matching);
        let added = merged.len().saturating_sub(before);
        if added > 0 {
            if let Err(err) = store.replace_all(merged) {
                warn!(page = %page, error = %err, "merged entries kept in memory only");
            }
            info!(page = %page, added, "merged remote entries");
        }
        SyncOutcome::Merged {
            added,
            skipped: foreign.len(),
        }
    }
}
