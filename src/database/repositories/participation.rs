//! Participation repository implementation

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use crate::models::participation::{ParticipantEntry, Participation};
use crate::utils::errors::EventDeskError;

pub struct ParticipationRepository;

impl ParticipationRepository {
    /// Register participant; `None` when the pair is already registered
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: i64,
        event_id: i64,
        joined_at: DateTime<Utc>,
    ) -> Result<Option<Participation>, EventDeskError> {
        let participation = sqlx::query_as::<_, Participation>(
            r#"
            INSERT INTO participations (user_id, event_id, joined_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, event_id) DO NOTHING
            RETURNING id, user_id, event_id, joined_at
            "#
        )
        .bind(user_id)
        .bind(event_id)
        .bind(joined_at)
        .fetch_optional(conn)
        .await?;

        Ok(participation)
    }

    /// Unregister participant from event
    pub async fn delete(conn: &mut PgConnection, user_id: i64, event_id: i64) -> Result<bool, EventDeskError> {
        let result = sqlx::query("DELETE FROM participations WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find(conn: &mut PgConnection, user_id: i64, event_id: i64) -> Result<Option<Participation>, EventDeskError> {
        let participation = sqlx::query_as::<_, Participation>(
            "SELECT id, user_id, event_id, joined_at FROM participations WHERE user_id = $1 AND event_id = $2"
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(conn)
        .await?;

        Ok(participation)
    }

    /// Get participant count for event
    pub async fn count(conn: &mut PgConnection, event_id: i64) -> Result<i64, EventDeskError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM participations WHERE event_id = $1"
        )
        .bind(event_id)
        .fetch_one(conn)
        .await?;

        Ok(count.0)
    }

    /// Get event participants in join order
    pub async fn list_for_event(conn: &mut PgConnection, event_id: i64) -> Result<Vec<ParticipantEntry>, EventDeskError> {
        let entries = sqlx::query_as::<_, ParticipantEntry>(
            r#"
            SELECT a.id AS user_id, a.username, a.first_name, a.last_name, p.joined_at
            FROM participations p
            INNER JOIN accounts a ON a.id = p.user_id
            WHERE p.event_id = $1
            ORDER BY p.joined_at ASC, p.id ASC
            "#
        )
        .bind(event_id)
        .fetch_all(conn)
        .await?;

        Ok(entries)
    }

    pub async fn list_for_user(conn: &mut PgConnection, user_id: i64) -> Result<Vec<Participation>, EventDeskError> {
        let participations = sqlx::query_as::<_, Participation>(
            "SELECT id, user_id, event_id, joined_at FROM participations WHERE user_id = $1 ORDER BY joined_at ASC"
        )
        .bind(user_id)
        .fetch_all(conn)
        .await?;

        Ok(participations)
    }
}
