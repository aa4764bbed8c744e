//! Résumé persistence: canonical résumés and curated copies, keyed by user.
//!
//! `AppState` holds an `Arc<dyn ResumeStore>`: Postgres when `DATABASE_URL`
//! is configured, the in-memory store otherwise.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;

pub use memory::MemoryResumeStore;
pub use postgres::PgResumeStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: ResumeDocument,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Saves a new version of the user's résumé.
    async fn save_resume(
        &self,
        user_id: Uuid,
        content: &ResumeDocument,
    ) -> Result<StoredResume, AppError>;

    /// Most recently saved résumé for the user.
    async fn latest_resume(&self, user_id: Uuid) -> Result<Option<StoredResume>, AppError>;

    /// Saves a curated copy for the user.
    async fn save_curated(
        &self,
        user_id: Uuid,
        content: &ResumeDocument,
    ) -> Result<StoredResume, AppError>;

    /// Most recently updated curated copy for the user.
    async fn curated_resume(&self, user_id: Uuid) -> Result<Option<StoredResume>, AppError>;

    /// Overwrites a stored curated copy. Fails with `NotFound` for an unknown id.
    async fn update_curated(
        &self,
        id: Uuid,
        content: &ResumeDocument,
    ) -> Result<StoredResume, AppError>;
}
