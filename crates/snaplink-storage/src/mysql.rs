use async_trait::async_trait;
use jiff::Timestamp;
use snaplink_core::repository::{ReadRepository, Repository, Result};
use snaplink_core::{Access, LinkMetrics, NewShortLink, ShortCode, ShortLink, StorageError};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::debug;

const SELECT_COLUMNS: &str = r#"
    SELECT id, short_code, original_url, clicks, avg_response_time,
           last_accessed_at, created_at, updated_at
    FROM short_links
"#;

/// MySQL implementation of the repository contract.
///
/// The `short_links` table carries a unique key on `short_code` (binary
/// collation, so codes are case-sensitive), which is what ultimately
/// rejects a duplicate code when two writers race past the existence check.
/// Metric updates run in a transaction that locks the row with
/// `SELECT ... FOR UPDATE`, serializing concurrent updates of one code.
/// Timestamps are stored as microseconds since the Unix epoch.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;
        debug!("short_links schema is up to date");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn parse_timestamp(column: &str, micros: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{micros}': {e}"))
    })
}

fn row_to_link(row: &MySqlRow) -> Result<ShortLink> {
    let id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let clicks: u64 = row.try_get("clicks").map_err(map_sqlx_error)?;
    let avg_response_time_secs: f64 = row.try_get("avg_response_time").map_err(map_sqlx_error)?;
    let last_accessed_at: Option<i64> = row.try_get("last_accessed_at").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let updated_at: i64 = row.try_get("updated_at").map_err(map_sqlx_error)?;

    Ok(ShortLink {
        id,
        original_url,
        short_code: ShortCode::new_unchecked(short_code),
        metrics: LinkMetrics {
            clicks,
            avg_response_time_secs,
            last_accessed_at: last_accessed_at
                .map(|micros| parse_timestamp("last_accessed_at", micros))
                .transpose()?,
        },
        created_at: parse_timestamp("created_at", created_at)?,
        updated_at: parse_timestamp("updated_at", updated_at)?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<ShortLink>> {
        let query = format!("{SELECT_COLUMNS} WHERE short_code = ? LIMIT 1");

        let row = sqlx::query(&query)
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_link).transpose()
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM short_links
            WHERE short_code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert(&self, code: &ShortCode, link: NewShortLink) -> Result<ShortLink> {
        let created_at = link.created_at.as_microsecond();

        let result = sqlx::query(
            r#"
            INSERT INTO short_links
                (short_code, original_url, clicks, avg_response_time,
                 last_accessed_at, created_at, updated_at)
            VALUES (?, ?, 0, 0, NULL, ?, ?)
            "#,
        )
        .bind(code.as_str())
        .bind(link.original_url.as_str())
        .bind(created_at)
        .bind(created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(link.into_link(done.last_insert_id(), code.clone())),
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(code.to_string())),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn record_access(&self, code: &ShortCode, access: Access) -> Result<Option<ShortLink>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let query = format!("{SELECT_COLUMNS} WHERE short_code = ? LIMIT 1 FOR UPDATE");
        let row = sqlx::query(&query)
            .bind(code.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(None);
        };

        let mut link = row_to_link(&row)?;
        link.record_access(&access);

        sqlx::query(
            r#"
            UPDATE short_links
            SET clicks = ?,
                avg_response_time = ?,
                last_accessed_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(link.metrics.clicks)
        .bind(link.metrics.avg_response_time_secs)
        .bind(link.metrics.last_accessed_at.map(|ts| ts.as_microsecond()))
        .bind(link.updated_at.as_microsecond())
        .bind(link.id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(Some(link))
    }
}
