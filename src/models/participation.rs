//! Participation model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One account registered for one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Participation {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub joined_at: DateTime<Utc>,
}

/// Participant row for the event detail page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ParticipantEntry {
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub joined_at: DateTime<Utc>,
}
