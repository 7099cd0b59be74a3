// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use sdl_feedback_model::{Entry, PageKey};
use sdl_feedback_store::{
    DisabledGateway, FeedbackSession, MemorySlots, RemoteGateway, SlotStorage, StoreError,
    StoreErrorCode, SyncOutcome,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingGateway {
    pushed: Mutex<Vec<Entry>>,
    calls: AtomicUsize,
    remote_rows: Vec<Entry>,
}

#[async_trait]
impl RemoteGateway for RecordingGateway {
    fn backend_tag(&self) -> &'static str {
        "recording"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn push(&self, entry: &Entry) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut pushed) = self.pushed.lock() {
            pushed.push(entry.clone());
        }
        Ok(())
    }

    async fn pull(&self, _page: &PageKey) -> Option<Vec<Entry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(self.remote_rows.clone())
    }
}

/// Storage that reads as empty and refuses every write.
struct FullDiskSlots;

impl SlotStorage for FullDiskSlots {
    fn read(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn write(&self, key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::persistence(format!("no space left for {key}")))
    }
}

/// Remote that rejects pushes and serves fixed rows on pull.
struct FlakyGateway {
    remote_rows: Vec<Entry>,
}

#[async_trait]
impl RemoteGateway for FlakyGateway {
    fn backend_tag(&self) -> &'static str {
        "flaky"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn push(&self, _entry: &Entry) -> Result<(), StoreError> {
        Err(StoreError::network("connection reset"))
    }

    async fn pull(&self, _page: &PageKey) -> Option<Vec<Entry>> {
        Some(self.remote_rows.clone())
    }
}

fn page(raw: &str) -> PageKey {
    PageKey::parse(raw).expect("page")
}

fn offline_session() -> FeedbackSession {
    FeedbackSession::with_parts(
        Arc::new(MemorySlots::new()),
        Arc::new(DisabledGateway),
        "sdl-feedback/test",
    )
}

#[test]
fn offline_submit_records_locally_and_remembers_name() {
    let mut session = offline_session();
    let day3 = page("day3");
    let receipt = session.submit(&day3, "Al", "nice work").expect("submit");

    assert!(!session.remote_enabled());
    assert!(receipt.push.is_none());
    assert!(receipt.warnings.is_empty());
    let listed = session.list(&day3);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Al");
    assert_eq!(listed[0].message, "nice work");
    assert_eq!(session.count(&day3), 1);
    assert_eq!(session.display_name(), "Al");
}

#[test]
fn blank_name_submits_as_anonymous_and_keeps_saved_name() {
    let mut session = offline_session();
    assert!(session.remember_name("Bo"));
    let day1 = page("day1");
    let receipt = session.submit(&day1, "   ", "hello").expect("submit");
    assert_eq!(receipt.entry.name, "anonymous");
    assert_eq!(session.display_name(), "Bo");
}

#[tokio::test]
async fn empty_message_creates_nothing_and_skips_the_network() {
    let gateway = Arc::new(RecordingGateway::default());
    let mut session = FeedbackSession::with_parts(
        Arc::new(MemorySlots::new()),
        gateway.clone(),
        "sdl-feedback/test",
    );
    let day1 = page("day1");

    let err = session.submit(&day1, "Al", "   \n").expect_err("empty");
    assert!(err.to_string().contains("message"));
    assert_eq!(session.count(&day1), 0);
    assert_eq!(session.display_name(), "");
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn configured_submit_pushes_the_stored_entry() {
    let gateway = Arc::new(RecordingGateway::default());
    let mut session = FeedbackSession::with_parts(
        Arc::new(MemorySlots::new()),
        gateway.clone(),
        "sdl-feedback/test",
    );
    let receipt = session
        .submit(&page("day2"), "Al", "pushed")
        .expect("submit");
    let push = receipt.push.expect("push spawned");
    push.await.expect("join").expect("push ok");

    let pushed = gateway.pushed.lock().expect("lock").clone();
    assert_eq!(pushed, vec![receipt.entry]);
}

#[tokio::test]
async fn init_merges_remote_rows_before_listing() {
    let remote_entry = Entry::compose(
        page("day4"),
        "Cy",
        "from elsewhere",
        "other-client",
        chrono::Utc::now(),
    )
    .expect("entry");
    let gateway = Arc::new(RecordingGateway {
        remote_rows: vec![remote_entry.clone()],
        ..RecordingGateway::default()
    });
    let mut session =
        FeedbackSession::with_parts(Arc::new(MemorySlots::new()), gateway, "sdl-feedback/test");

    let report = session.init(&page("day4")).await;
    assert_eq!(report.sync, SyncOutcome::Merged { added: 1, skipped: 0 });
    assert_eq!(report.entries, vec![remote_entry]);
}

#[tokio::test]
async fn offline_init_lists_local_entries() {
    let mut session = offline_session();
    let day5 = page("day5");
    session.submit(&day5, "", "local only").expect("submit");
    let report = session.init(&day5).await;
    assert_eq!(report.sync, SyncOutcome::Unavailable);
    assert_eq!(report.entries.len(), 1);
}

#[tokio::test]
async fn storage_and_push_failures_surface_as_warnings_only() {
    let mut session = FeedbackSession::with_parts(
        Arc::new(FullDiskSlots),
        Arc::new(FlakyGateway {
            remote_rows: Vec::new(),
        }),
        "sdl-feedback/test",
    );
    assert!(session.remote_enabled());
    let day6 = page("day6");

    let receipt = session
        .submit(&day6, "Al", "still recorded")
        .expect("submit succeeds despite failures");
    let codes: Vec<StoreErrorCode> = receipt.warnings.iter().map(|w| w.code).collect();
    assert_eq!(
        codes,
        vec![StoreErrorCode::Persistence, StoreErrorCode::Persistence]
    );

    let push_err = receipt
        .push
        .expect("push spawned")
        .await
        .expect("join")
        .expect_err("push rejected");
    assert_eq!(push_err.code, StoreErrorCode::Network);

    let listed = session.list(&day6);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, receipt.entry.id);
}

#[tokio::test]
async fn sync_over_failing_storage_keeps_merged_entries_visible() {
    let day6 = page("day6");
    let remote_entry = Entry::compose(
        day6.clone(),
        "Cy",
        "from elsewhere",
        "other-client",
        chrono::Utc::now(),
    )
    .expect("entry");
    let mut session = FeedbackSession::with_parts(
        Arc::new(FullDiskSlots),
        Arc::new(FlakyGateway {
            remote_rows: vec![remote_entry.clone()],
        }),
        "sdl-feedback/test",
    );
    let local = session
        .submit(&day6, "Al", "local first")
        .expect("submit")
        .entry;

    let outcome = session.sync(&day6).await;
    assert_eq!(outcome, SyncOutcome::Merged { added: 1, skipped: 0 });
    let ids: Vec<_> = session.list(&day6).into_iter().map(|e| e.id).collect();
    assert_eq!(session.count(&day6), 2);
    assert!(ids.contains(&local.id));
    assert!(ids.contains(&remote_entry.id));
}
