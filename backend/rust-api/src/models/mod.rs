use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

pub mod curriculum;
pub mod quiz;

/// Per-user, per-language learning state. One document per pair, keyed by
/// `"{user_id}:{language_id}"` in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgress {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub language_id: String,
    pub xp: u32,
    /// Derived from `xp` via the threshold table — never set independently.
    pub level: u32,
    pub completed_lessons: HashMap<String, LessonCompletion>,
    pub completed_chapters: Vec<u32>,
    /// Superset of `completed_chapters` plus each successor; monotonic.
    pub unlocked_chapters: Vec<u32>,
    pub current_chapter: u32,
    pub streak_days: u32,
    pub last_activity_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProgress {
    pub fn document_id(user_id: &str, language_id: &str) -> String {
        format!("{}:{}", user_id, language_id)
    }

    /// Fresh progress document: level 1, nothing completed, only the first
    /// chapter unlocked.
    pub fn new(user_id: &str, language_id: &str, today: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Self::document_id(user_id, language_id),
            user_id: user_id.to_string(),
            language_id: language_id.to_string(),
            xp: 0,
            level: 1,
            completed_lessons: HashMap::new(),
            completed_chapters: Vec::new(),
            unlocked_chapters: vec![1],
            current_chapter: 1,
            streak_days: 0,
            last_activity_date: today,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_chapter_unlocked(&self, chapter_id: u32) -> bool {
        self.unlocked_chapters.contains(&chapter_id)
    }

    pub fn is_chapter_completed(&self, chapter_id: u32) -> bool {
        self.completed_chapters.contains(&chapter_id)
    }

    /// Apply a patch in memory, mirroring the store's field-level update
    /// semantics (`$inc` for counters, `$set`/`$addToSet` for the rest).
    pub fn apply(&mut self, patch: &ProgressPatch, now: DateTime<Utc>) {
        self.xp = self.xp.saturating_add(patch.xp_delta);
        if let Some(level) = patch.set_level {
            self.level = level;
        }
        if let Some((lesson_id, completion)) = &patch.set_lesson {
            self.completed_lessons
                .insert(lesson_id.clone(), completion.clone());
        }
        if let Some(chapter) = patch.add_completed_chapter {
            if !self.completed_chapters.contains(&chapter) {
                self.completed_chapters.push(chapter);
            }
        }
        if let Some(chapter) = patch.add_unlocked_chapter {
            if !self.unlocked_chapters.contains(&chapter) {
                self.unlocked_chapters.push(chapter);
            }
        }
        if let Some(chapter) = patch.set_current_chapter {
            self.current_chapter = chapter;
        }
        match patch.streak {
            Some(StreakChange::Increment) => self.streak_days += 1,
            Some(StreakChange::Set(days)) => self.streak_days = days,
            None => {}
        }
        if let Some(date) = patch.set_last_activity {
            self.last_activity_date = date;
        }
        self.updated_at = now;
    }
}

/// Per-lesson completion record. Once present it is only replaced under the
/// best-attempt-wins re-attempt policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonCompletion {
    pub score: u8,
    pub xp_earned: u32,
    pub completed_at: DateTime<Utc>,
}

/// Description of an intended mutation against a progress document.
///
/// Counters (`xp`, `streak_days` increments) map to `$inc`; everything else
/// is a whole-value set, matching the document store's field-level
/// last-write-wins contract.
#[derive(Debug, Clone, Default)]
pub struct ProgressPatch {
    pub xp_delta: u32,
    pub set_level: Option<u32>,
    pub set_lesson: Option<(String, LessonCompletion)>,
    pub add_completed_chapter: Option<u32>,
    pub add_unlocked_chapter: Option<u32>,
    pub set_current_chapter: Option<u32>,
    pub streak: Option<StreakChange>,
    pub set_last_activity: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy)]
pub enum StreakChange {
    Increment,
    Set(u32),
}

// ---- Request/response shapes ----

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteLessonRequest {
    #[validate(range(min = 0, max = 100))]
    pub score: u8,
    /// Overrides the lesson's base XP award; defaults to the curriculum
    /// value when omitted.
    #[validate(range(max = 10_000))]
    pub base_xp: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CompleteLessonResponse {
    pub lesson_id: String,
    pub score: u8,
    pub xp_awarded: u32,
    pub bonus_xp: u32,
    pub total_xp: u32,
    pub level: u32,
    pub level_up: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChapterTestResultRequest {
    pub points_earned: u32,
    #[validate(range(min = 1))]
    pub points_possible: u32,
}

#[derive(Debug, Serialize)]
pub struct ChapterTestOutcome {
    pub chapter_id: u32,
    pub passed: bool,
    pub percentage: f64,
    pub xp_earned: u32,
    pub new_level: Option<u32>,
    pub next_chapter_unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StreakOutcome {
    pub streak_days: u32,
    pub xp_bonus: u32,
    pub extended: bool,
}

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub xp: u32,
    pub level: u32,
    pub lessons_completed: usize,
    pub chapters_completed: usize,
    pub streak_days: u32,
    pub current_level_xp: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_level_xp: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_remaining: Option<u32>,
    pub progress_percentage: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TranslateRequest {
    #[validate(length(min = 1, max = 500))]
    pub text: String,
    #[validate(length(min = 2, max = 10))]
    pub target_lang: String,
    pub source_lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translation: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Deserialize)]
pub struct TtsQuery {
    pub text: String,
    pub lang: String,
}

#[derive(Debug, Serialize)]
pub struct TtsResponse {
    pub audio_url: String,
    pub lang: String,
}
