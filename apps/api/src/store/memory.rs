use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::store::{ResumeStore, StoredResume};

/// Process-local store. Used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryResumeStore {
    resumes: RwLock<Vec<StoredResume>>,
    curated: RwLock<HashMap<Uuid, StoredResume>>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_record(user_id: Uuid, content: &ResumeDocument) -> StoredResume {
    let now = Utc::now();
    StoredResume {
        id: Uuid::new_v4(),
        user_id,
        content: content.clone(),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn save_resume(
        &self,
        user_id: Uuid,
        content: &ResumeDocument,
    ) -> Result<StoredResume, AppError> {
        let record = new_record(user_id, content);
        self.resumes.write().await.push(record.clone());
        Ok(record)
    }

    async fn latest_resume(&self, user_id: Uuid) -> Result<Option<StoredResume>, AppError> {
        Ok(self
            .resumes
            .read()
            .await
            .iter()
            .rev()
            .find(|r| r.user_id == user_id)
            .cloned())
    }

    async fn save_curated(
        &self,
        user_id: Uuid,
        content: &ResumeDocument,
    ) -> Result<StoredResume, AppError> {
        let record = new_record(user_id, content);
        self.curated.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn curated_resume(&self, user_id: Uuid) -> Result<Option<StoredResume>, AppError> {
        Ok(self
            .curated
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id)
            .max_by_key(|r| r.updated_at)
            .cloned())
    }

    async fn update_curated(
        &self,
        id: Uuid,
        content: &ResumeDocument,
    ) -> Result<StoredResume, AppError> {
        let mut curated = self.curated.write().await;
        let record = curated
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Curated resume {id} not found")))?;
        record.content = content.clone();
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::Skill;

    fn doc(skill: &str) -> ResumeDocument {
        ResumeDocument {
            skills: vec![Skill::named(skill)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_latest_resume_is_most_recent_for_user() {
        let store = MemoryResumeStore::new();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        store.save_resume(user, &doc("Rust")).await.unwrap();
        store.save_resume(user, &doc("Go")).await.unwrap();
        store.save_resume(other, &doc("Java")).await.unwrap();

        let latest = store.latest_resume(user).await.unwrap().unwrap();
        assert_eq!(latest.content, doc("Go"));
        assert!(store.latest_resume(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_curated() {
        let store = MemoryResumeStore::new();
        let user = Uuid::new_v4();
        let saved = store.save_curated(user, &doc("Rust")).await.unwrap();

        let updated = store.update_curated(saved.id, &doc("Zig")).await.unwrap();
        assert_eq!(updated.id, saved.id);

        let fetched = store.curated_resume(user).await.unwrap().unwrap();
        assert_eq!(fetched.content, doc("Zig"));
    }

    #[tokio::test]
    async fn test_update_unknown_curated_is_not_found() {
        let store = MemoryResumeStore::new();
        let err = store
            .update_curated(Uuid::new_v4(), &doc("Rust"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
