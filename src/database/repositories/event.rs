//! Event repository implementation

use sqlx::{FromRow, PgConnection, PgPool};
use chrono::{DateTime, Utc};
use crate::models::event::{
    AdminEventFilter, CreateEventRecord, Event, EventSort, EventState, Location, PublicEventFilter,
};
use crate::utils::errors::RendezvousError;

const EVENT_COLUMNS: &str = "id, title, annotation, description, category_id, initiator_id, lat, lon, paid, \
    participant_limit, request_moderation, created_on, published_on, event_date, confirmed_requests, views, state";

#[derive(Debug, FromRow)]
struct EventRow {
    id: i64,
    title: String,
    annotation: String,
    description: String,
    category_id: i64,
    initiator_id: i64,
    lat: f64,
    lon: f64,
    paid: bool,
    participant_limit: i32,
    request_moderation: bool,
    created_on: DateTime<Utc>,
    published_on: Option<DateTime<Utc>>,
    event_date: DateTime<Utc>,
    confirmed_requests: i32,
    views: i64,
    state: String,
}

impl TryFrom<EventRow> for Event {
    type Error = RendezvousError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let state = row
            .state
            .parse::<EventState>()
            .map_err(|e| RendezvousError::Database(sqlx::Error::Decode(e.into())))?;

        Ok(Event {
            id: row.id,
            title: row.title,
            annotation: row.annotation,
            description: row.description,
            category_id: row.category_id,
            initiator_id: row.initiator_id,
            location: Location { lat: row.lat, lon: row.lon },
            paid: row.paid,
            participant_limit: row.participant_limit,
            request_moderation: row.request_moderation,
            created_on: row.created_on,
            published_on: row.published_on,
            event_date: row.event_date,
            confirmed_requests: row.confirmed_requests,
            views: row.views,
            state,
        })
    }
}

fn into_events(rows: Vec<EventRow>) -> Result<Vec<Event>, RendezvousError> {
    rows.into_iter().map(Event::try_from).collect()
}

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, record: CreateEventRecord) -> Result<Event, RendezvousError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            INSERT INTO events (title, annotation, description, category_id, initiator_id, lat, lon, paid,
                                participant_limit, request_moderation, created_on, event_date, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(record.title)
        .bind(record.annotation)
        .bind(record.description)
        .bind(record.category_id)
        .bind(record.initiator_id)
        .bind(record.location.lat)
        .bind(record.location.lon)
        .bind(record.paid)
        .bind(record.participant_limit)
        .bind(record.request_moderation)
        .bind(record.created_on)
        .bind(record.event_date)
        .bind(EventState::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        Event::try_from(row)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, RendezvousError> {
        let row = sqlx::query_as::<_, EventRow>(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Event::try_from).transpose()
    }

    /// Find event by ID, only if it belongs to `initiator_id`
    pub async fn find_by_owner(&self, id: i64, initiator_id: i64) -> Result<Option<Event>, RendezvousError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = $1 AND initiator_id = $2",
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(initiator_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Event::try_from).transpose()
    }

    /// Update editable fields and state. Counters are left alone.
    pub async fn update(&self, event: &Event) -> Result<Event, RendezvousError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET title = $2,
                annotation = $3,
                description = $4,
                category_id = $5,
                lat = $6,
                lon = $7,
                paid = $8,
                participant_limit = $9,
                request_moderation = $10,
                published_on = $11,
                event_date = $12,
                state = $13
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.annotation)
        .bind(&event.description)
        .bind(event.category_id)
        .bind(event.location.lat)
        .bind(event.location.lon)
        .bind(event.paid)
        .bind(event.participant_limit)
        .bind(event.request_moderation)
        .bind(event.published_on)
        .bind(event.event_date)
        .bind(event.state.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RendezvousError::event_not_found(event.id))?;

        Event::try_from(row)
    }

    /// Atomically bump the view counter
    pub async fn increment_views(&self, id: i64) -> Result<(), RendezvousError> {
        sqlx::query("UPDATE events SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Move the confirmed counter inside an open transaction
    pub async fn adjust_confirmed_requests(conn: &mut PgConnection, id: i64, delta: i32) -> Result<(), RendezvousError> {
        if delta == 0 {
            return Ok(());
        }

        let result = sqlx::query(
            "UPDATE events SET confirmed_requests = GREATEST(confirmed_requests + $2, 0) WHERE id = $1"
        )
        .bind(id)
        .bind(delta)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RendezvousError::event_not_found(id));
        }

        Ok(())
    }

    /// Get events created by user, newest first
    pub async fn get_user_events(&self, initiator_id: i64, offset: i64, limit: i64) -> Result<Vec<Event>, RendezvousError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE initiator_id = $1 ORDER BY id DESC LIMIT $2 OFFSET $3",
            EVENT_COLUMNS
        ))
        .bind(initiator_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        into_events(rows)
    }

    /// Administrator search
    pub async fn search(&self, filter: &AdminEventFilter) -> Result<Vec<Event>, RendezvousError> {
        let states: Option<Vec<String>> = filter
            .states
            .as_ref()
            .map(|states| states.iter().map(|s| s.as_str().to_string()).collect());

        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {} FROM events
            WHERE ($1::BIGINT[] IS NULL OR initiator_id = ANY($1))
              AND ($2::TEXT[] IS NULL OR state = ANY($2))
              AND ($3::BIGINT[] IS NULL OR category_id = ANY($3))
              AND ($4::TIMESTAMPTZ IS NULL OR event_date >= $4)
              AND ($5::TIMESTAMPTZ IS NULL OR event_date <= $5)
            ORDER BY event_date DESC
            LIMIT $6 OFFSET $7
            "#,
            EVENT_COLUMNS
        ))
        .bind(filter.users.clone())
        .bind(states)
        .bind(filter.categories.clone())
        .bind(filter.range_start)
        .bind(filter.range_end)
        .bind(filter.size)
        .bind(filter.from)
        .fetch_all(&self.pool)
        .await?;

        into_events(rows)
    }

    /// Public search over published events
    pub async fn search_published(&self, filter: &PublicEventFilter) -> Result<Vec<Event>, RendezvousError> {
        let order_by = match filter.sort {
            Some(EventSort::EventDate) => "event_date DESC",
            Some(EventSort::Views) => "views DESC",
            None => "id ASC",
        };

        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {} FROM events
            WHERE state = 'PUBLISHED'
              AND ($1::TEXT IS NULL
                   OR strpos(lower(annotation), lower($1)) > 0
                   OR strpos(lower(description), lower($1)) > 0)
              AND ($2::BIGINT[] IS NULL OR category_id = ANY($2))
              AND ($3::BOOLEAN IS NULL OR paid = $3)
              AND ($4::TIMESTAMPTZ IS NULL OR event_date >= $4)
              AND ($5::TIMESTAMPTZ IS NULL OR event_date <= $5)
              AND (NOT $6 OR participant_limit = 0 OR confirmed_requests < participant_limit)
            ORDER BY {}
            LIMIT $7 OFFSET $8
            "#,
            EVENT_COLUMNS, order_by
        ))
        .bind(filter.text.clone().filter(|t| !t.is_empty()))
        .bind(filter.categories.clone().filter(|c| !c.is_empty()))
        .bind(filter.paid)
        .bind(filter.range_start)
        .bind(filter.range_end)
        .bind(filter.only_available)
        .bind(filter.size)
        .bind(filter.from)
        .fetch_all(&self.pool)
        .await?;

        into_events(rows)
    }
}
