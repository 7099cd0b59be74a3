// SPDX-License-Identifier: Apache-2.0

use crate::backend::{StoreError, StoreErrorCode};
use crate::config::RemoteConfig;
use crate::remote_rest::RestGateway;
use async_trait::async_trait;
use sdl_feedback_model::{Entry, PageKey};
use std::sync::Arc;
use tracing::debug;

/// Best-effort bridge to the shared remote table.
///
/// Implementations never fail the caller: `push` reports its outcome for
/// logging only, and `pull` collapses every failure into `None` so callers can
/// tell "remote unreachable" apart from "remote has no entries".
#[async_trait]
pub trait RemoteGateway: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str;

    fn is_configured(&self) -> bool;

    async fn push(&self, entry: &Entry) -> Result<(), StoreError>;

    async fn pull(&self, page: &PageKey) -> Option<Vec<Entry>>;
}

/// Gateway used when no endpoint or credential is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGateway;

#[async_trait]
impl RemoteGateway for DisabledGateway {
    fn backend_tag(&self) -> &'static str {
        "disabled"
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn push(&self, entry: &Entry) -> Result<(), StoreError> {
        debug!(id = %entry.id, "remote not configured; push skipped");
        Err(StoreError::new(
            StoreErrorCode::Unavailable,
            "remote gateway is not configured",
        ))
    }

    async fn pull(&self, page: &PageKey) -> Option<Vec<Entry>> {
        debug!(page = %page, "remote not configured; pull skipped");
        None
    }
}

#[must_use]
pub fn gateway_from_config(cfg: &RemoteConfig) -> Arc<dyn RemoteGateway> {
    match (&cfg.base_url, &cfg.api_key) {
        (Some(base_url), Some(api_key)) if cfg.is_complete() => Arc::new(RestGateway::new(
            base_url.trim().to_string(),
            api_key.trim().to_string(),
            cfg.table.clone(),
            cfg.timeout,
            cfg.allow_private_hosts,
        )),
        _ => Arc::new(DisabledGateway),
    }
}
