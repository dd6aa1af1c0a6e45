//! Participation request repository implementation

use sqlx::{FromRow, PgConnection, PgPool};
use chrono::{DateTime, Utc};
use crate::models::request::{CreateRequestRecord, ParticipationRequest, RequestStatus};
use crate::utils::errors::RendezvousError;

const REQUEST_COLUMNS: &str = "id, event_id, requester_id, created, status";

#[derive(Debug, FromRow)]
struct RequestRow {
    id: i64,
    event_id: i64,
    requester_id: i64,
    created: DateTime<Utc>,
    status: String,
}

impl TryFrom<RequestRow> for ParticipationRequest {
    type Error = RendezvousError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<RequestStatus>()
            .map_err(|e| RendezvousError::Database(sqlx::Error::Decode(e.into())))?;

        Ok(ParticipationRequest {
            id: row.id,
            event_id: row.event_id,
            requester_id: row.requester_id,
            created: row.created,
            status,
        })
    }
}

fn into_requests(rows: Vec<RequestRow>) -> Result<Vec<ParticipationRequest>, RendezvousError> {
    rows.into_iter().map(ParticipationRequest::try_from).collect()
}

#[derive(Debug, Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new request inside an open transaction
    pub async fn create(conn: &mut PgConnection, record: CreateRequestRecord) -> Result<ParticipationRequest, RendezvousError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            INSERT INTO participation_requests (event_id, requester_id, created, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(record.event_id)
        .bind(record.requester_id)
        .bind(record.created)
        .bind(record.status.as_str())
        .fetch_one(conn)
        .await?;

        ParticipationRequest::try_from(row)
    }

    /// Update request status inside an open transaction
    pub async fn update_status(conn: &mut PgConnection, id: i64, status: RequestStatus) -> Result<(), RendezvousError> {
        let result = sqlx::query("UPDATE participation_requests SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RendezvousError::request_not_found(id));
        }

        Ok(())
    }

    /// Get all requests for an event
    pub async fn get_by_event(&self, event_id: i64) -> Result<Vec<ParticipationRequest>, RendezvousError> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {} FROM participation_requests WHERE event_id = $1 ORDER BY created ASC, id ASC",
            REQUEST_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        into_requests(rows)
    }

    pub async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<ParticipationRequest>, RendezvousError> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {} FROM participation_requests WHERE id = ANY($1)",
            REQUEST_COLUMNS
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        into_requests(rows)
    }

    pub async fn get_by_requester(&self, requester_id: i64) -> Result<Vec<ParticipationRequest>, RendezvousError> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {} FROM participation_requests WHERE requester_id = $1 ORDER BY created ASC, id ASC",
            REQUEST_COLUMNS
        ))
        .bind(requester_id)
        .fetch_all(&self.pool)
        .await?;

        into_requests(rows)
    }

    pub async fn find_for_requester(&self, id: i64, requester_id: i64) -> Result<Option<ParticipationRequest>, RendezvousError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {} FROM participation_requests WHERE id = $1 AND requester_id = $2",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .bind(requester_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ParticipationRequest::try_from).transpose()
    }

    /// Count confirmed requests for an event
    pub async fn count_confirmed(&self, event_id: i64) -> Result<i64, RendezvousError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM participation_requests WHERE event_id = $1 AND status = 'CONFIRMED'"
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Check whether the user holds a non-canceled request for the event
    pub async fn exists_active(&self, requester_id: i64, event_id: i64) -> Result<bool, RendezvousError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM participation_requests WHERE requester_id = $1 AND event_id = $2 AND status <> 'CANCELED'"
        )
        .bind(requester_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }
}
