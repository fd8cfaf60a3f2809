//! Event and capacity model

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use crate::utils::errors::EventDeskError;

/// Approval and fullness status of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Approved,
    Declined,
    Full,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Approved => "approved",
            EventStatus::Declined => "declined",
            EventStatus::Full => "full",
        }
    }

    /// Approved at some point and still visible to attendees
    pub fn is_published(&self) -> bool {
        matches!(self, EventStatus::Approved | EventStatus::Full)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = EventDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EventStatus::Pending),
            "approved" => Ok(EventStatus::Approved),
            "declined" => Ok(EventStatus::Declined),
            "full" => Ok(EventStatus::Full),
            other => Err(EventDeskError::InvalidInput(format!("Unknown event status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub organizer_id: i64,
    pub title: String,
    pub date: Option<NaiveDate>,
    pub location: String,
    pub short_description: String,
    pub image: Option<String>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Capacity record; `current_participants` caches the live participation count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCapacity {
    pub event_id: i64,
    pub max_participants: i32,
    pub current_participants: i32,
}

impl EventCapacity {
    pub fn remaining(&self) -> i32 {
        (self.max_participants - self.current_participants).max(0)
    }
}

/// Row to insert into storage
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub organizer_id: i64,
    pub title: String,
    pub date: Option<NaiveDate>,
    pub location: String,
    pub short_description: String,
    pub image: Option<String>,
    pub status: EventStatus,
}

/// Uploaded image as received from the request layer
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct CreateEventRequest {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub location: String,
    pub short_description: String,
    pub max_participants: i32,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub location: Option<String>,
    pub short_description: Option<String>,
    pub max_participants: Option<i32>,
    pub image: Option<ImageUpload>,
}

/// Filter for event listings; every field narrows the result
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub status: Option<EventStatus>,
    pub organizer_id: Option<i64>,
    pub title_contains: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl EventQuery {
    pub fn with_status(status: EventStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn by_organizer(organizer_id: i64) -> Self {
        Self { organizer_id: Some(organizer_id), ..Default::default() }
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(status) = self.status {
            if event.status != status {
                return false;
            }
        }
        if let Some(organizer_id) = self.organizer_id {
            if event.organizer_id != organizer_id {
                return false;
            }
        }
        if let Some(ref needle) = self.title_contains {
            if !crate::utils::helpers::contains_ignore_case(&event.title, needle) {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if !event.date.is_some_and(|d| d >= from) {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if !event.date.is_some_and(|d| d <= to) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("full".parse::<EventStatus>().unwrap(), EventStatus::Full);
        assert!("cancelled".parse::<EventStatus>().is_err());
        assert!(EventStatus::Full.is_published());
        assert!(!EventStatus::Pending.is_published());
    }

    #[test]
    fn test_remaining_never_negative() {
        let capacity = EventCapacity { event_id: 1, max_participants: 2, current_participants: 3 };
        assert_eq!(capacity.remaining(), 0);
    }
}
