//! In-memory storage
//!
//! A single mutex guards the whole state. A unit of work owns the guard for
//! its lifetime and mutates a staged copy, so concurrent units of work are
//! fully serialized and an uncommitted unit of work leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::database::store::{Store, UnitOfWork};
use crate::models::*;
use crate::utils::errors::{EventDeskError, Result};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_id: i64,
    accounts: BTreeMap<i64, Account>,
    events: BTreeMap<i64, Event>,
    capacities: BTreeMap<i64, EventCapacity>,
    participations: BTreeMap<i64, Participation>,
    feedback: BTreeMap<i64, Feedback>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn remove_event_cascade(&mut self, event_id: i64) -> bool {
        let removed = self.events.remove(&event_id).is_some();
        self.capacities.remove(&event_id);
        self.participations.retain(|_, p| p.event_id != event_id);
        self.feedback.retain(|_, f| f.event_id != event_id);
        removed
    }
}

/// Process-local store, used by tests and single-node tooling
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, staged }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn insert_account(&mut self, account: NewAccount, now: DateTime<Utc>) -> Result<Account> {
        if self.staged.accounts.values().any(|a| a.username == account.username) {
            return Err(EventDeskError::Duplicate(format!("Username {}", account.username)));
        }
        let id = self.staged.allocate_id();
        let stored = Account {
            id,
            username: account.username,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            is_superuser: account.is_superuser,
            is_active: true,
            date_joined: now,
            profile: account.role.map(|role| Profile::with_role(id, role)),
        };
        self.staged.accounts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_account(&mut self, user_id: i64) -> Result<Option<Account>> {
        Ok(self.staged.accounts.get(&user_id).cloned())
    }

    async fn save_account(&mut self, account: &Account) -> Result<()> {
        if self
            .staged
            .accounts
            .values()
            .any(|a| a.id != account.id && a.username == account.username)
        {
            return Err(EventDeskError::Duplicate(format!("Username {}", account.username)));
        }
        match self.staged.accounts.get_mut(&account.id) {
            Some(stored) => {
                *stored = account.clone();
                Ok(())
            }
            None => Err(EventDeskError::AccountNotFound { user_id: account.id }),
        }
    }

    async fn delete_account(&mut self, user_id: i64) -> Result<bool> {
        if self.staged.accounts.remove(&user_id).is_none() {
            return Ok(false);
        }
        let organized: Vec<i64> = self
            .staged
            .events
            .values()
            .filter(|e| e.organizer_id == user_id)
            .map(|e| e.id)
            .collect();
        for event_id in organized {
            self.staged.remove_event_cascade(event_id);
        }
        self.staged.participations.retain(|_, p| p.user_id != user_id);
        self.staged.feedback.retain(|_, f| f.user_id != user_id);
        Ok(true)
    }

    async fn list_accounts(&mut self) -> Result<Vec<Account>> {
        let mut accounts: Vec<Account> = self.staged.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(accounts)
    }

    async fn insert_event(&mut self, event: NewEvent, now: DateTime<Utc>) -> Result<Event> {
        let id = self.staged.allocate_id();
        let stored = Event {
            id,
            organizer_id: event.organizer_id,
            title: event.title,
            date: event.date,
            location: event.location,
            short_description: event.short_description,
            image: event.image,
            status: event.status,
            created_at: now,
            updated_at: now,
        };
        self.staged.events.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_event(&mut self, event_id: i64) -> Result<Option<Event>> {
        Ok(self.staged.events.get(&event_id).cloned())
    }

    async fn lock_event(&mut self, event_id: i64) -> Result<Option<Event>> {
        // the unit of work already holds the global lock
        self.find_event(event_id).await
    }

    async fn save_event(&mut self, event: &Event) -> Result<()> {
        match self.staged.events.get_mut(&event.id) {
            Some(stored) => {
                *stored = event.clone();
                Ok(())
            }
            None => Err(EventDeskError::EventNotFound { event_id: event.id }),
        }
    }

    async fn delete_event(&mut self, event_id: i64) -> Result<bool> {
        Ok(self.staged.remove_event_cascade(event_id))
    }

    async fn list_events(&mut self, query: &EventQuery) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .staged
            .events
            .values()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        // dated events first, by date, then by id
        events.sort_by_key(|e| (e.date.is_none(), e.date, e.id));
        Ok(events)
    }

    async fn find_capacity(&mut self, event_id: i64) -> Result<Option<EventCapacity>> {
        Ok(self.staged.capacities.get(&event_id).copied())
    }

    async fn lock_capacity(&mut self, event_id: i64) -> Result<Option<EventCapacity>> {
        self.find_capacity(event_id).await
    }

    async fn insert_capacity_if_absent(&mut self, capacity: EventCapacity) -> Result<EventCapacity> {
        if !self.staged.events.contains_key(&capacity.event_id) {
            return Err(EventDeskError::EventNotFound { event_id: capacity.event_id });
        }
        Ok(*self.staged.capacities.entry(capacity.event_id).or_insert(capacity))
    }

    async fn save_capacity(&mut self, capacity: &EventCapacity) -> Result<()> {
        match self.staged.capacities.get_mut(&capacity.event_id) {
            Some(stored) => {
                *stored = *capacity;
                Ok(())
            }
            None => Err(EventDeskError::EventNotFound { event_id: capacity.event_id }),
        }
    }

    async fn list_capacities(&mut self) -> Result<Vec<EventCapacity>> {
        Ok(self.staged.capacities.values().copied().collect())
    }

    async fn count_participants(&mut self, event_id: i64) -> Result<i64> {
        Ok(self
            .staged
            .participations
            .values()
            .filter(|p| p.event_id == event_id)
            .count() as i64)
    }

    async fn find_participation(&mut self, user_id: i64, event_id: i64) -> Result<Option<Participation>> {
        Ok(self
            .staged
            .participations
            .values()
            .find(|p| p.user_id == user_id && p.event_id == event_id)
            .cloned())
    }

    async fn insert_participation(
        &mut self,
        user_id: i64,
        event_id: i64,
        joined_at: DateTime<Utc>,
    ) -> Result<Option<Participation>> {
        if self.find_participation(user_id, event_id).await?.is_some() {
            return Ok(None);
        }
        if !self.staged.accounts.contains_key(&user_id) {
            return Err(EventDeskError::AccountNotFound { user_id });
        }
        if !self.staged.events.contains_key(&event_id) {
            return Err(EventDeskError::EventNotFound { event_id });
        }
        let id = self.staged.allocate_id();
        let participation = Participation { id, user_id, event_id, joined_at };
        self.staged.participations.insert(id, participation.clone());
        Ok(Some(participation))
    }

    async fn delete_participation(&mut self, user_id: i64, event_id: i64) -> Result<bool> {
        let before = self.staged.participations.len();
        self.staged
            .participations
            .retain(|_, p| !(p.user_id == user_id && p.event_id == event_id));
        Ok(self.staged.participations.len() < before)
    }

    async fn list_participants(&mut self, event_id: i64) -> Result<Vec<ParticipantEntry>> {
        let mut entries: Vec<ParticipantEntry> = self
            .staged
            .participations
            .values()
            .filter(|p| p.event_id == event_id)
            .filter_map(|p| {
                self.staged.accounts.get(&p.user_id).map(|a| ParticipantEntry {
                    user_id: a.id,
                    username: a.username.clone(),
                    first_name: a.first_name.clone(),
                    last_name: a.last_name.clone(),
                    joined_at: p.joined_at,
                })
            })
            .collect();
        entries.sort_by_key(|e| e.joined_at);
        Ok(entries)
    }

    async fn list_user_participations(&mut self, user_id: i64) -> Result<Vec<Participation>> {
        Ok(self
            .staged
            .participations
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_feedback(&mut self, feedback: NewFeedback, now: DateTime<Utc>) -> Result<(Feedback, bool)> {
        if let Some(existing) = self
            .staged
            .feedback
            .values_mut()
            .find(|f| f.event_id == feedback.event_id && f.user_id == feedback.user_id)
        {
            existing.rating = feedback.rating;
            existing.comment = feedback.comment;
            existing.updated_at = now;
            return Ok((existing.clone(), false));
        }
        let id = self.staged.allocate_id();
        let stored = Feedback {
            id,
            event_id: feedback.event_id,
            user_id: feedback.user_id,
            rating: feedback.rating,
            comment: feedback.comment,
            created_at: now,
            updated_at: now,
        };
        self.staged.feedback.insert(id, stored.clone());
        Ok((stored, true))
    }

    async fn list_feedback(&mut self, event_id: i64) -> Result<Vec<Feedback>> {
        let mut feedback: Vec<Feedback> = self
            .staged
            .feedback
            .values()
            .filter(|f| f.event_id == event_id)
            .cloned()
            .collect();
        feedback.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(feedback)
    }

    async fn rating_totals(&mut self, event_id: i64) -> Result<(i64, i64)> {
        Ok(self
            .staged
            .feedback
            .values()
            .filter(|f| f.event_id == event_id)
            .fold((0, 0), |(count, sum), f| (count + 1, sum + f.rating as i64)))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(username: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: format!("{}@example.com", username),
            is_superuser: false,
            role: Some(Role::Attendee),
        }
    }

    fn new_event(organizer_id: i64) -> NewEvent {
        NewEvent {
            organizer_id,
            title: "Lindy night".to_string(),
            date: None,
            location: String::new(),
            short_description: String::new(),
            image: None,
            status: EventStatus::Approved,
        }
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_discards_writes() {
        let store = MemoryStore::new();
        {
            let mut uow = store.begin().await.unwrap();
            uow.insert_account(new_account("ghost"), Utc::now()).await.unwrap();
        }
        let mut uow = store.begin().await.unwrap();
        assert!(uow.list_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_participation_is_unique_per_pair() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let user = uow.insert_account(new_account("ada"), Utc::now()).await.unwrap();
        let event = uow.insert_event(new_event(user.id), Utc::now()).await.unwrap();

        assert!(uow.insert_participation(user.id, event.id, Utc::now()).await.unwrap().is_some());
        assert!(uow.insert_participation(user.id, event.id, Utc::now()).await.unwrap().is_none());
        assert_eq!(uow.count_participants(event.id).await.unwrap(), 1);
        uow.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_event_delete_cascades() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let user = uow.insert_account(new_account("ada"), Utc::now()).await.unwrap();
        let event = uow.insert_event(new_event(user.id), Utc::now()).await.unwrap();
        uow.insert_capacity_if_absent(EventCapacity { event_id: event.id, max_participants: 3, current_participants: 0 })
            .await
            .unwrap();
        uow.insert_participation(user.id, event.id, Utc::now()).await.unwrap();
        uow.upsert_feedback(NewFeedback { event_id: event.id, user_id: user.id, rating: 4, comment: String::new() }, Utc::now())
            .await
            .unwrap();

        assert!(uow.delete_event(event.id).await.unwrap());
        assert!(uow.find_capacity(event.id).await.unwrap().is_none());
        assert_eq!(uow.count_participants(event.id).await.unwrap(), 0);
        assert_eq!(uow.rating_totals(event.id).await.unwrap(), (0, 0));
    }
}
