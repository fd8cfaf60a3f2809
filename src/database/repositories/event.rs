//! Event repository implementation

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection};
use crate::models::event::{Event, EventQuery, EventStatus, NewEvent};
use crate::utils::errors::EventDeskError;

const EVENT_COLUMNS: &str =
    "id, organizer_id, title, date, location, short_description, image, status, created_at, updated_at";

#[derive(Debug, FromRow)]
struct EventRow {
    id: i64,
    organizer_id: i64,
    title: String,
    date: Option<NaiveDate>,
    location: String,
    short_description: String,
    image: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = EventDeskError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Event {
            id: row.id,
            organizer_id: row.organizer_id,
            title: row.title,
            date: row.date,
            location: row.location,
            short_description: row.short_description,
            image: row.image,
            status: row.status.parse::<EventStatus>()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct EventRepository;

impl EventRepository {
    /// Create a new event
    pub async fn create(conn: &mut PgConnection, request: NewEvent, now: DateTime<Utc>) -> Result<Event, EventDeskError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            INSERT INTO events (organizer_id, title, date, location, short_description, image, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(request.organizer_id)
        .bind(request.title)
        .bind(request.date)
        .bind(request.location)
        .bind(request.short_description)
        .bind(request.image)
        .bind(request.status.as_str())
        .bind(now)
        .fetch_one(conn)
        .await?;

        Event::try_from(row)
    }

    /// Find event by ID
    pub async fn find_by_id(conn: &mut PgConnection, id: i64) -> Result<Option<Event>, EventDeskError> {
        let row = sqlx::query_as::<_, EventRow>(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(conn)
            .await?;

        row.map(Event::try_from).transpose()
    }

    /// Find event by ID and lock its row until the transaction ends
    pub async fn find_for_update(conn: &mut PgConnection, id: i64) -> Result<Option<Event>, EventDeskError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = $1 FOR UPDATE",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        row.map(Event::try_from).transpose()
    }

    /// Write back every mutable column
    pub async fn update(conn: &mut PgConnection, event: &Event) -> Result<(), EventDeskError> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = $2,
                date = $3,
                location = $4,
                short_description = $5,
                image = $6,
                status = $7,
                updated_at = $8
            WHERE id = $1
            "#
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(event.date)
        .bind(&event.location)
        .bind(&event.short_description)
        .bind(&event.image)
        .bind(event.status.as_str())
        .bind(event.updated_at)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(EventDeskError::EventNotFound { event_id: event.id });
        }

        Ok(())
    }

    /// Delete event; capacity, participations and feedback cascade
    pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<bool, EventDeskError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List events matching the query, dated events first
    pub async fn list(conn: &mut PgConnection, query: &EventQuery) -> Result<Vec<Event>, EventDeskError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {}
            FROM events
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::bigint IS NULL OR organizer_id = $2)
              AND ($3::text IS NULL OR strpos(lower(title), lower($3)) > 0)
              AND ($4::date IS NULL OR date >= $4)
              AND ($5::date IS NULL OR date <= $5)
            ORDER BY date ASC NULLS LAST, id ASC
            "#,
            EVENT_COLUMNS
        ))
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.organizer_id)
        .bind(query.title_contains.as_deref())
        .bind(query.date_from)
        .bind(query.date_to)
        .fetch_all(conn)
        .await?;

        rows.into_iter().map(Event::try_from).collect()
    }
}
