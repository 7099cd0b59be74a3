// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod backend;
mod config;
mod entry_store;
mod identity;
mod paths;
mod reconcile;
mod remote;
mod remote_rest;
mod session;

pub use backend::{LocalFsSlots, MemorySlots, SlotStorage, StoreError, StoreErrorCode};
pub use config::{FeedbackConfig, FileConfig, FileRemoteConfig, RemoteConfig};
pub use entry_store::{decode_entries, AppendOutcome, EntryStore};
pub use identity::IdentityStore;
pub use paths::{slot_path, ENTRIES_SLOT, IDENTITY_SLOT};
pub use reconcile::{Reconciler, SyncOutcome};
pub use remote::{gateway_from_config, DisabledGateway, RemoteGateway};
pub use remote_rest::RestGateway;
pub use session::{FeedbackSession, InitReport, PushHandle, SubmitReceipt};

pub const CRATE_NAME: &str = "sdl-feedback-store";
