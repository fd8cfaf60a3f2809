//! Feedback repository implementation

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use crate::models::feedback::{Feedback, NewFeedback};
use crate::utils::errors::EventDeskError;

#[derive(Debug, FromRow)]
struct UpsertedFeedback {
    #[sqlx(flatten)]
    feedback: Feedback,
    inserted: bool,
}

pub struct FeedbackRepository;

impl FeedbackRepository {
    /// Insert or update the single feedback of a user for an event
    pub async fn upsert(conn: &mut PgConnection, request: NewFeedback, now: DateTime<Utc>) -> Result<(Feedback, bool), EventDeskError> {
        // xmax is 0 only for a freshly inserted row version
        let row = sqlx::query_as::<_, UpsertedFeedback>(
            r#"
            INSERT INTO feedback (event_id, user_id, rating, comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (event_id, user_id) DO UPDATE
            SET rating = EXCLUDED.rating,
                comment = EXCLUDED.comment,
                updated_at = EXCLUDED.updated_at
            RETURNING id, event_id, user_id, rating, comment, created_at, updated_at, (xmax = 0) AS inserted
            "#
        )
        .bind(request.event_id)
        .bind(request.user_id)
        .bind(request.rating)
        .bind(request.comment)
        .bind(now)
        .fetch_one(conn)
        .await?;

        Ok((row.feedback, row.inserted))
    }

    /// Feedback for an event, newest first
    pub async fn list_for_event(conn: &mut PgConnection, event_id: i64) -> Result<Vec<Feedback>, EventDeskError> {
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            SELECT id, event_id, user_id, rating, comment, created_at, updated_at
            FROM feedback
            WHERE event_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        )
        .bind(event_id)
        .fetch_all(conn)
        .await?;

        Ok(feedback)
    }

    /// `(count, sum)` of ratings for an event
    pub async fn totals(conn: &mut PgConnection, event_id: i64) -> Result<(i64, i64), EventDeskError> {
        let totals: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(rating), 0)::BIGINT FROM feedback WHERE event_id = $1"
        )
        .bind(event_id)
        .fetch_one(conn)
        .await?;

        Ok(totals)
    }
}
