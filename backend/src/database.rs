// PostgreSQL-backed incident store
// Reports are stored with plain lat/lng columns; bounds queries use the
// composite location index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use crate::{
    geometry::BoundingBox,
    incidents::{IncidentStore, IncidentStoreError},
    models::{IncidentCategory, IncidentReport, Severity},
};

const MAX_CONNECTIONS: u32 = 5;

/// Row shape of the bounds query; category and severity stay textual until
/// mapped so unknown values never fail the whole query.
#[derive(Debug, FromRow)]
struct IncidentRow {
    id: String,
    location_lat: f64,
    location_lng: f64,
    category: String,
    severity: String,
    title: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    rating_avg: f64,
    rating_count: i64,
    verified: bool,
    flagged: bool,
}

impl From<IncidentRow> for IncidentReport {
    fn from(row: IncidentRow) -> Self {
        IncidentReport {
            id: row.id,
            location_lat: row.location_lat,
            location_lng: row.location_lng,
            category: IncidentCategory::parse(&row.category),
            severity: Severity::parse(&row.severity),
            title: row.title,
            description: row.description,
            created_at: row.created_at,
            verified: row.verified,
            flagged: row.flagged,
            rating_avg: row.rating_avg,
            rating_count: row.rating_count,
        }
    }
}

/// Incident store over a PostgreSQL connection pool
pub struct PgIncidentStore {
    pool: PgPool,
}

impl PgIncidentStore {
    /// Create a connection pool for `database_url`
    ///
    /// # Errors
    /// Returns IncidentStoreError::Database if the connection fails
    pub async fn connect(database_url: &str) -> Result<Self, IncidentStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool created");

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<(), IncidentStoreError> {
        // raw_sql accepts the multi-statement migration file as-is
        let mut conn = self.pool.acquire().await?;
        let migration_sql = include_str!("../migrations/20250301_create_safety_reports.sql");

        sqlx::raw_sql(migration_sql).execute(&mut *conn).await?;

        tracing::info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl IncidentStore for PgIncidentStore {
    async fn query_in_bounds(
        &self,
        bounds: &BoundingBox,
    ) -> Result<Vec<IncidentReport>, IncidentStoreError> {
        let rows = sqlx::query_as::<_, IncidentRow>(
            r#"
            SELECT
                r.id::text AS id,
                r.location_lat,
                r.location_lng,
                r.category,
                r.severity,
                r.title,
                r.description,
                r.created_at,
                COALESCE(AVG(rr.rating)::float8, 0) AS rating_avg,
                COUNT(rr.rating) AS rating_count,
                r.verified,
                r.flagged
            FROM safety_reports r
            LEFT JOIN report_ratings rr ON rr.report_id = r.id
            WHERE r.location_lat BETWEEN $1 AND $3
              AND r.location_lng BETWEEN $2 AND $4
            GROUP BY r.id
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(bounds.south)
        .bind(bounds.west)
        .bind(bounds.north)
        .bind(bounds.east)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!("Retrieved {} incident(s) in {:?}", rows.len(), bounds);
        Ok(rows.into_iter().map(IncidentReport::from).collect())
    }
}
