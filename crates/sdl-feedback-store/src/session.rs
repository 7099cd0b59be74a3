// SPDX-License-Identifier: Apache-2.0

use crate::backend::{LocalFsSlots, SlotStorage, StoreError};
use crate::config::FeedbackConfig;
use crate::entry_store::EntryStore;
use crate::identity::IdentityStore;
use crate::reconcile::{Reconciler, SyncOutcome};
use crate::remote::{gateway_from_config, RemoteGateway};
use chrono::{DateTime, Utc};
use sdl_feedback_model::{Entry, PageKey, ValidationError};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Detached remote push. Awaiting it is optional.
pub type PushHandle = JoinHandle<Result<(), StoreError>>;

#[derive(Debug)]
pub struct InitReport {
    pub page: PageKey,
    pub sync: SyncOutcome,
    pub entries: Vec<Entry>,
}

#[derive(Debug)]
pub struct SubmitReceipt {
    pub entry: Entry,
    /// Non-fatal storage failures hit while recording the submission.
    pub warnings: Vec<StoreError>,
    /// `None` when the remote is unconfigured or no async runtime is running.
    pub push: Option<PushHandle>,
}

/// Everything a page needs: local entries, the saved display name and the
/// optional remote. Built once per session and passed by reference.
pub struct FeedbackSession {
    entries: EntryStore,
    identity: IdentityStore,
    reconciler: Reconciler,
    gateway: Arc<dyn RemoteGateway>,
    source_agent: String,
}

impl FeedbackSession {
    #[must_use]
    pub fn open(config: &FeedbackConfig) -> Self {
        let slots: Arc<dyn SlotStorage> = Arc::new(LocalFsSlots::new(config.data_dir.clone()));
        Self::with_parts(
            slots,
            gateway_from_config(&config.remote),
            config.source_agent.clone(),
        )
    }

    #[must_use]
    pub fn with_parts(
        slots: Arc<dyn SlotStorage>,
        gateway: Arc<dyn RemoteGateway>,
        source_agent: impl Into<String>,
    ) -> Self {
        Self {
            entries: EntryStore::new(Arc::clone(&slots)),
            identity: IdentityStore::new(slots),
            reconciler: Reconciler::new(Arc::clone(&gateway)),
            gateway,
            source_agent: source_agent.into(),
        }
    }

    #[must_use]
    pub fn remote_enabled(&self) -> bool {
        self.gateway.is_configured()
    }

    #[must_use]
    pub fn remote_backend(&self) -> &'static str {
        self.gateway.backend_tag()
    }

    /// Runs one reconciliation pass and returns what the page should render.
    pub async fn init(&mut self, page: &PageKey) -> InitReport {
        let sync = self.sync(page).await;
        InitReport {
            page: page.clone(),
            sync,
            entries: self.list(page),
        }
    }

    pub async fn sync(&mut self, page: &PageKey) -> SyncOutcome {
        self.reconciler.sync(&mut self.entries, page).await
    }

    pub fn submit(
        &mut self,
        page: &PageKey,
        name: &str,
        message: &str,
    ) -> Result<SubmitReceipt, ValidationError> {
        self.submit_at(page, name, message, Utc::now())
    }

    /// Validates before touching storage or the network: an empty message
    /// leaves everything untouched.
    pub fn submit_at(
        &mut self,
        page: &PageKey,
        name: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmitReceipt, ValidationError> {
        let entry = Entry::compose(page.clone(), name, message, &self.source_agent, now)?;
        let mut warnings = Vec::new();

        if !name.trim().is_empty() {
            if let Err(err) = self.identity.set(name) {
                warn!(error = %err, "display name not saved");
                warnings.push(err);
            }
        }
        if let Err(err) = self.entries.append(entry.clone()) {
            warnings.push(err);
        }
        info!(id = %entry.id, page = %page, "feedback recorded");

        Ok(SubmitReceipt {
            push: self.spawn_push(&entry),
            entry,
            warnings,
        })
    }

    #[must_use]
    pub fn list(&self, page: &PageKey) -> Vec<Entry> {
        self.entries.query(page)
    }

    #[must_use]
    pub fn count(&self, page: &PageKey) -> usize {
        self.entries.count(page)
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        self.identity.get()
    }

    /// Returns whether the name reached storage.
    pub fn remember_name(&self, name: &str) -> bool {
        match self.identity.set(name) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "display name not saved");
                false
            }
        }
    }

    fn spawn_push(&self, entry: &Entry) -> Option<PushHandle> {
        if !self.gateway.is_configured() {
            return None;
        }
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!(id = %entry.id, "no async runtime; remote push skipped");
                return None;
            }
        };
        let gateway = Arc::clone(&self.gateway);
        let entry = entry.clone();
        Some(runtime.spawn(async move { gateway.push(&entry).await }))
    }
}
