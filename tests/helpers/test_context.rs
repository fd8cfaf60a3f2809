//! Test context for unified test setup
//!
//! Wires the full service stack over a `MemoryStore`, a clock pinned to a
//! known day and a temporary media directory.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tempfile::TempDir;

use eventdesk::config::Settings;
use eventdesk::database::{MemoryStore, Store};
use eventdesk::models::*;
use eventdesk::services::{LocalMediaStore, ServiceFactory};
use eventdesk::utils::FixedClock;

use super::test_data::{event_request, new_account};

/// Unified test context that manages all test components
pub struct TestContext {
    pub store: MemoryStore,
    pub services: ServiceFactory,
    pub settings: Settings,
    pub today: NaiveDate,
    pub media_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(mut settings: Settings) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let media_dir = tempfile::tempdir().expect("Failed to create media dir");
        settings.media.upload_dir = media_dir.path().to_string_lossy().into_owned();

        let today = NaiveDate::from_ymd_opt(2030, 6, 1).expect("valid date");
        let store = MemoryStore::new();
        let services = ServiceFactory::new(
            Arc::new(store.clone()),
            Arc::new(FixedClock::on(today)),
            Arc::new(LocalMediaStore::new(&settings.media)),
            settings.clone(),
        );

        Self { store, services, settings, today, media_dir }
    }

    pub fn in_days(&self, days: i64) -> NaiveDate {
        self.today + Duration::days(days)
    }

    pub async fn account(&self, username: &str, role: Option<Role>) -> Account {
        let mut uow = self.store.begin().await.expect("begin");
        let account = uow
            .insert_account(new_account(username, role), Utc::now())
            .await
            .expect("Failed to insert account");
        uow.commit().await.expect("commit");
        account
    }

    pub async fn attendee(&self, username: &str) -> Account {
        self.account(username, Some(Role::Attendee)).await
    }

    pub async fn organizer(&self, username: &str) -> Account {
        self.account(username, Some(Role::Organizer)).await
    }

    pub async fn admin(&self, username: &str) -> Account {
        self.account(username, Some(Role::Admin)).await
    }

    pub async fn superuser(&self, username: &str) -> Account {
        let mut uow = self.store.begin().await.expect("begin");
        let account = uow
            .insert_account(NewAccount { is_superuser: true, ..new_account(username, None) }, Utc::now())
            .await
            .expect("Failed to insert superuser");
        uow.commit().await.expect("commit");
        account
    }

    /// Submitted by `organizer`, still pending
    pub async fn pending_event(&self, organizer: &Account, title: &str, date: Option<NaiveDate>, max: i32) -> Event {
        self.services
            .event_service
            .create(organizer, event_request(title, date, max))
            .await
            .expect("Failed to create event")
    }

    /// Submitted by `organizer` and approved by a fresh admin
    pub async fn approved_event(&self, organizer: &Account, title: &str, date: Option<NaiveDate>, max: i32) -> Event {
        let event = self.pending_event(organizer, title, date, max).await;
        let admin = self.admin(&format!("reviewer{}", event.id)).await;
        self.services
            .event_service
            .approve(&admin, event.id)
            .await
            .expect("Failed to approve event")
    }

    /// Event written straight to storage without a capacity record
    pub async fn legacy_event(&self, organizer: &Account, status: EventStatus) -> Event {
        let mut uow = self.store.begin().await.expect("begin");
        let event = uow
            .insert_event(
                NewEvent {
                    organizer_id: organizer.id,
                    title: "Legacy social".to_string(),
                    date: None,
                    location: String::new(),
                    short_description: String::new(),
                    image: None,
                    status,
                },
                Utc::now(),
            )
            .await
            .expect("Failed to insert event");
        uow.commit().await.expect("commit");
        event
    }

    pub async fn event(&self, event_id: i64) -> Option<Event> {
        let mut uow = self.store.begin().await.expect("begin");
        uow.find_event(event_id).await.expect("find event")
    }

    pub async fn capacity(&self, event_id: i64) -> Option<EventCapacity> {
        let mut uow = self.store.begin().await.expect("begin");
        uow.find_capacity(event_id).await.expect("find capacity")
    }

    pub async fn participant_count(&self, event_id: i64) -> i64 {
        let mut uow = self.store.begin().await.expect("begin");
        uow.count_participants(event_id).await.expect("count participants")
    }

    /// Overwrite the cached count, simulating drift
    pub async fn corrupt_capacity(&self, event_id: i64, current_participants: i32) {
        let mut uow = self.store.begin().await.expect("begin");
        let mut capacity = uow
            .find_capacity(event_id)
            .await
            .expect("find capacity")
            .expect("capacity exists");
        capacity.current_participants = current_participants;
        uow.save_capacity(&capacity).await.expect("save capacity");
        uow.commit().await.expect("commit");
    }
}
