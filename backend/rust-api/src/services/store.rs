//! Document-store boundary for progress records.
//!
//! The ledger describes intended mutations as [`ProgressPatch`] values;
//! stores apply them with field-level semantics: `$inc` for counters,
//! `$set`/`$addToSet` for whole-value fields. Last-write-wins at the field
//! level; cross-device conflict resolution is explicitly not provided.

use crate::models::{ProgressPatch, StreakChange, UserProgress};
use crate::utils::retry::{retry_async_with_config, RetryConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::{doc, to_bson, Document};
use mongodb::{Collection, Database};
use std::collections::HashMap;
use std::sync::RwLock;

const PROGRESS_COLLECTION: &str = "user_progress";

#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Dependency liveness probe for the health endpoint.
    async fn ping(&self) -> Result<()>;

    async fn read(&self, user_id: &str, language_id: &str) -> Result<Option<UserProgress>>;

    async fn insert(&self, progress: &UserProgress) -> Result<()>;

    async fn apply(&self, user_id: &str, language_id: &str, patch: &ProgressPatch) -> Result<()>;
}

pub struct MongoProgressStore {
    mongo: Database,
}

impl MongoProgressStore {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> Collection<UserProgress> {
        self.mongo.collection(PROGRESS_COLLECTION)
    }

    fn build_update(patch: &ProgressPatch) -> Result<Document> {
        let mut inc = Document::new();
        let mut set = Document::new();
        let mut add_to_set = Document::new();

        if patch.xp_delta > 0 {
            inc.insert("xp", patch.xp_delta as i64);
        }
        if let Some(level) = patch.set_level {
            set.insert("level", level as i64);
        }
        if let Some((lesson_id, completion)) = &patch.set_lesson {
            set.insert(
                format!("completed_lessons.{}", lesson_id),
                to_bson(completion).context("Failed to serialize lesson completion")?,
            );
        }
        if let Some(chapter) = patch.add_completed_chapter {
            add_to_set.insert("completed_chapters", chapter as i64);
        }
        if let Some(chapter) = patch.add_unlocked_chapter {
            add_to_set.insert("unlocked_chapters", chapter as i64);
        }
        if let Some(chapter) = patch.set_current_chapter {
            set.insert("current_chapter", chapter as i64);
        }
        match patch.streak {
            Some(StreakChange::Increment) => {
                inc.insert("streak_days", 1i64);
            }
            Some(StreakChange::Set(days)) => {
                set.insert("streak_days", days as i64);
            }
            None => {}
        }
        if let Some(date) = patch.set_last_activity {
            set.insert(
                "last_activity_date",
                to_bson(&date).context("Failed to serialize activity date")?,
            );
        }
        set.insert(
            "updated_at",
            to_bson(&Utc::now()).context("Failed to serialize timestamp")?,
        );

        let mut update = Document::new();
        if !inc.is_empty() {
            update.insert("$inc", inc);
        }
        update.insert("$set", set);
        if !add_to_set.is_empty() {
            update.insert("$addToSet", add_to_set);
        }
        Ok(update)
    }
}

#[async_trait]
impl ProgressStore for MongoProgressStore {
    async fn ping(&self) -> Result<()> {
        self.mongo
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }

    async fn read(&self, user_id: &str, language_id: &str) -> Result<Option<UserProgress>> {
        let id = UserProgress::document_id(user_id, language_id);
        let collection = self.collection();
        retry_async_with_config(RetryConfig::default(), || async {
            collection
                .find_one(doc! { "_id": &id })
                .await
                .context("Failed to read progress document")
        })
        .await
    }

    async fn insert(&self, progress: &UserProgress) -> Result<()> {
        let collection = self.collection();
        retry_async_with_config(RetryConfig::default(), || async {
            collection
                .insert_one(progress)
                .await
                .map(|_| ())
                .context("Failed to insert progress document")
        })
        .await
    }

    async fn apply(&self, user_id: &str, language_id: &str, patch: &ProgressPatch) -> Result<()> {
        let id = UserProgress::document_id(user_id, language_id);
        let update = Self::build_update(patch)?;
        let collection = self.collection();

        let result = retry_async_with_config(RetryConfig::default(), || async {
            collection
                .update_one(doc! { "_id": &id }, update.clone())
                .await
                .context("Failed to update progress document")
        })
        .await?;

        if result.matched_count == 0 {
            anyhow::bail!("Progress document {} vanished during update", id);
        }
        Ok(())
    }
}

/// In-memory store with the same field-level semantics, used by the tests
/// and for running the service without a database.
#[derive(Default)]
pub struct MemoryProgressStore {
    documents: RwLock<HashMap<String, UserProgress>>,
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn read(&self, user_id: &str, language_id: &str) -> Result<Option<UserProgress>> {
        let id = UserProgress::document_id(user_id, language_id);
        let documents = self
            .documents
            .read()
            .map_err(|_| anyhow::anyhow!("Progress store lock poisoned"))?;
        Ok(documents.get(&id).cloned())
    }

    async fn insert(&self, progress: &UserProgress) -> Result<()> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| anyhow::anyhow!("Progress store lock poisoned"))?;
        documents.insert(progress.id.clone(), progress.clone());
        Ok(())
    }

    async fn apply(&self, user_id: &str, language_id: &str, patch: &ProgressPatch) -> Result<()> {
        let id = UserProgress::document_id(user_id, language_id);
        let mut documents = self
            .documents
            .write()
            .map_err(|_| anyhow::anyhow!("Progress store lock poisoned"))?;
        let progress = documents
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("Progress document {} vanished during update", id))?;
        progress.apply(patch, Utc::now());
        Ok(())
    }
}
