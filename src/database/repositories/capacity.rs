//! Capacity repository implementation

use sqlx::{FromRow, PgConnection};
use crate::models::event::EventCapacity;
use crate::utils::errors::EventDeskError;

#[derive(Debug, FromRow)]
struct CapacityRow {
    event_id: i64,
    max_participants: i32,
    current_participants: i32,
}

impl From<CapacityRow> for EventCapacity {
    fn from(row: CapacityRow) -> Self {
        EventCapacity {
            event_id: row.event_id,
            max_participants: row.max_participants,
            current_participants: row.current_participants,
        }
    }
}

pub struct CapacityRepository;

impl CapacityRepository {
    pub async fn find(conn: &mut PgConnection, event_id: i64) -> Result<Option<EventCapacity>, EventDeskError> {
        let row = sqlx::query_as::<_, CapacityRow>(
            "SELECT event_id, max_participants, current_participants FROM event_capacities WHERE event_id = $1"
        )
        .bind(event_id)
        .fetch_optional(conn)
        .await?;

        Ok(row.map(EventCapacity::from))
    }

    /// Read the capacity row and hold a row lock on it
    pub async fn find_for_update(conn: &mut PgConnection, event_id: i64) -> Result<Option<EventCapacity>, EventDeskError> {
        let row = sqlx::query_as::<_, CapacityRow>(
            "SELECT event_id, max_participants, current_participants FROM event_capacities WHERE event_id = $1 FOR UPDATE"
        )
        .bind(event_id)
        .fetch_optional(conn)
        .await?;

        Ok(row.map(EventCapacity::from))
    }

    /// Insert the record unless one exists, then return whatever is stored
    pub async fn insert_if_absent(conn: &mut PgConnection, capacity: EventCapacity) -> Result<EventCapacity, EventDeskError> {
        sqlx::query(
            r#"
            INSERT INTO event_capacities (event_id, max_participants, current_participants)
            VALUES ($1, $2, $3)
            ON CONFLICT (event_id) DO NOTHING
            "#
        )
        .bind(capacity.event_id)
        .bind(capacity.max_participants)
        .bind(capacity.current_participants)
        .execute(&mut *conn)
        .await?;

        Self::find(conn, capacity.event_id)
            .await?
            .ok_or(EventDeskError::EventNotFound { event_id: capacity.event_id })
    }

    pub async fn update(conn: &mut PgConnection, capacity: &EventCapacity) -> Result<(), EventDeskError> {
        let result = sqlx::query(
            r#"
            UPDATE event_capacities
            SET max_participants = $2,
                current_participants = $3
            WHERE event_id = $1
            "#
        )
        .bind(capacity.event_id)
        .bind(capacity.max_participants)
        .bind(capacity.current_participants)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(EventDeskError::EventNotFound { event_id: capacity.event_id });
        }

        Ok(())
    }

    pub async fn list(conn: &mut PgConnection) -> Result<Vec<EventCapacity>, EventDeskError> {
        let rows = sqlx::query_as::<_, CapacityRow>(
            "SELECT event_id, max_participants, current_participants FROM event_capacities ORDER BY event_id ASC"
        )
        .fetch_all(conn)
        .await?;

        Ok(rows.into_iter().map(EventCapacity::from).collect())
    }
}
