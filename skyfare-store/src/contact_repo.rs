use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use skyfare_core::models::ContactSubmission;
use skyfare_core::repository::{ContactStore, StoreError, StoreResult};

use crate::map_db_err;

pub struct PgContactStore {
    pub pool: PgPool,
}

impl PgContactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    name: String,
    email: String,
    subject: String,
    message: String,
    submitted_at: DateTime<Utc>,
    is_resolved: bool,
}

impl From<SubmissionRow> for ContactSubmission {
    fn from(row: SubmissionRow) -> Self {
        ContactSubmission {
            id: row.id,
            name: row.name,
            email: row.email,
            subject: row.subject,
            message: row.message,
            submitted_at: row.submitted_at,
            is_resolved: row.is_resolved,
        }
    }
}

#[async_trait]
impl ContactStore for PgContactStore {
    async fn insert_submission(
        &self,
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
        submitted_at: DateTime<Utc>,
    ) -> StoreResult<ContactSubmission> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO contact_submissions (id, name, email, subject, message, submitted_at, is_resolved)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE)
            RETURNING id, name, email, subject, message, submitted_at, is_resolved
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(subject)
        .bind(message)
        .bind(submitted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(ContactSubmission::from(row))
    }

    async fn list_submissions(&self, resolved: Option<bool>) -> StoreResult<Vec<ContactSubmission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, name, email, subject, message, submitted_at, is_resolved
            FROM contact_submissions
            WHERE ($1::bool IS NULL OR is_resolved = $1)
            ORDER BY submitted_at DESC
            "#,
        )
        .bind(resolved)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(rows.into_iter().map(ContactSubmission::from).collect())
    }

    async fn set_resolved(&self, id: Uuid, resolved: bool) -> StoreResult<ContactSubmission> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            UPDATE contact_submissions SET is_resolved = $2
            WHERE id = $1
            RETURNING id, name, email, subject, message, submitted_at, is_resolved
            "#,
        )
        .bind(id)
        .bind(resolved)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        row.map(ContactSubmission::from).ok_or(StoreError::NotFound)
    }
}
