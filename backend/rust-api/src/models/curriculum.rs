use serde::{Deserialize, Serialize};

/// Static curriculum content for one target language. Supplied by the
/// content collaborator; immutable at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curriculum {
    pub language_id: String,
    pub language_name: String,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub level: u32,
    pub lessons: Vec<Lesson>,
}

impl Chapter {
    /// All word pairs from the chapter's vocabulary lessons, in lesson order.
    pub fn vocabulary_words(&self) -> Vec<WordPair> {
        self.lessons
            .iter()
            .filter(|l| l.kind == LessonKind::Vocabulary)
            .flat_map(|l| l.words.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: LessonKind,
    pub duration_minutes: u32,
    /// Base XP awarded on completion, before score-tier bonuses.
    pub xp: u32,
    #[serde(default)]
    pub words: Vec<WordPair>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    Vocabulary,
    ChapterTest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordPair {
    pub word: String,
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
}

// ---- Materialized (progress-annotated) view ----

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChapterView {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub level: u32,
    pub completed: bool,
    pub locked: bool,
    pub progress_percentage: f64,
    pub lessons: Vec<LessonView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LessonView {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: LessonKind,
    pub duration_minutes: u32,
    pub xp: u32,
    pub word_count: usize,
    pub completed: bool,
    pub score: u8,
    pub earned_xp: u32,
}

#[derive(Debug, Serialize)]
pub struct LanguageSummary {
    pub language_id: String,
    pub language_name: String,
    pub chapter_count: usize,
    pub lesson_count: usize,
}
