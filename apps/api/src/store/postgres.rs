use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::store::{ResumeStore, StoredResume};

#[derive(Debug, FromRow)]
struct ResumeRow {
    id: Uuid,
    user_id: Uuid,
    content: Json<ResumeDocument>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ResumeRow> for StoredResume {
    fn from(row: ResumeRow) -> Self {
        StoredResume {
            id: row.id,
            user_id: row.user_id,
            content: row.content.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Postgres-backed store. Content is kept as JSONB.
#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(
        &self,
        table: &str,
        user_id: Uuid,
        content: &ResumeDocument,
    ) -> Result<StoredResume, AppError> {
        let row: ResumeRow = sqlx::query_as(&format!(
            "INSERT INTO {table} (id, user_id, content) VALUES ($1, $2, $3) RETURNING *"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(Json(content))
        .fetch_one(&self.pool)
        .await?;
        info!("Saved {table} row {} for user {user_id}", row.id);
        Ok(row.into())
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn save_resume(
        &self,
        user_id: Uuid,
        content: &ResumeDocument,
    ) -> Result<StoredResume, AppError> {
        self.insert("resumes", user_id, content).await
    }

    async fn latest_resume(&self, user_id: Uuid) -> Result<Option<StoredResume>, AppError> {
        let row: Option<ResumeRow> = sqlx::query_as(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn save_curated(
        &self,
        user_id: Uuid,
        content: &ResumeDocument,
    ) -> Result<StoredResume, AppError> {
        self.insert("curated_resumes", user_id, content).await
    }

    async fn curated_resume(&self, user_id: Uuid) -> Result<Option<StoredResume>, AppError> {
        let row: Option<ResumeRow> = sqlx::query_as(
            "SELECT * FROM curated_resumes WHERE user_id = $1 ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn update_curated(
        &self,
        id: Uuid,
        content: &ResumeDocument,
    ) -> Result<StoredResume, AppError> {
        let row: Option<ResumeRow> = sqlx::query_as(
            "UPDATE curated_resumes SET content = $1, updated_at = now() WHERE id = $2 RETURNING *",
        )
        .bind(Json(content))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("Curated resume {id} not found")))
    }
}
