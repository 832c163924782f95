mod models;
#[cfg(test)]
pub mod memory;

pub use models::*;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

pub type DbPool = Arc<PgPool>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("NOC number {0} already exists")]
    Duplicate(String),
    #[error("NOC {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Durable storage for certificate records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a new record. Fails with [`DbError::Duplicate`] if the number is taken.
    async fn create(&self, noc: NewNoc) -> Result<NocRecord, DbError>;

    async fn update(&self, noc_number: &str, changes: NocUpdate) -> Result<NocRecord, DbError>;

    async fn find_by_number(&self, noc_number: &str) -> Result<Option<NocRecord>, DbError>;

    /// One page of records, newest first, plus the total record count.
    /// `page` is 1-based.
    async fn list(&self, page: u32, page_size: u32) -> Result<(Vec<NocRecord>, i64), DbError>;
}

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub struct PgRecordStore {
    pool: DbPool,
}

impl PgRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn create(&self, noc: NewNoc) -> Result<NocRecord, DbError> {
        let applicant = &noc.applicant;
        sqlx::query_as::<_, NocRecord>(
            r#"
            INSERT INTO nocs (
                noc_number, full_name, email, phone, company, designation, purpose,
                valid_from, valid_to, id_proof_type, id_proof_number, address,
                photo_url, qr_code_url, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(&noc.noc_number)
        .bind(&applicant.full_name)
        .bind(&applicant.email)
        .bind(&applicant.phone)
        .bind(&applicant.company)
        .bind(&applicant.designation)
        .bind(&applicant.purpose)
        .bind(applicant.valid_from)
        .bind(applicant.valid_to)
        .bind(&applicant.id_proof_type)
        .bind(&applicant.id_proof_number)
        .bind(&applicant.address)
        .bind(&noc.photo_url)
        .bind(&noc.qr_code_url)
        .bind(NocStatus::Pending.as_str())
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                DbError::Duplicate(noc.noc_number.clone())
            }
            other => DbError::Sqlx(other),
        })
    }

    async fn update(&self, noc_number: &str, changes: NocUpdate) -> Result<NocRecord, DbError> {
        sqlx::query_as::<_, NocRecord>(
            r#"
            UPDATE nocs
            SET pdf_url = COALESCE($2, pdf_url),
                status = COALESCE($3, status),
                updated_at = NOW()
            WHERE noc_number = $1
            RETURNING *
            "#,
        )
        .bind(noc_number)
        .bind(changes.pdf_url)
        .bind(changes.status.map(NocStatus::as_str))
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or_else(|| DbError::NotFound(noc_number.to_string()))
    }

    async fn find_by_number(&self, noc_number: &str) -> Result<Option<NocRecord>, DbError> {
        let record = sqlx::query_as::<_, NocRecord>("SELECT * FROM nocs WHERE noc_number = $1")
            .bind(noc_number)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(record)
    }

    async fn list(&self, page: u32, page_size: u32) -> Result<(Vec<NocRecord>, i64), DbError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);

        let records = sqlx::query_as::<_, NocRecord>(
            "SELECT * FROM nocs ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nocs")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok((records, total))
    }
}
