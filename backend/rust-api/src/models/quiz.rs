use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const TRANSLATE_POINTS: u32 = 10;
pub const MULTIPLE_CHOICE_POINTS: u32 = 15;
pub const LISTENING_POINTS: u32 = 20;
pub const PRONUNCIATION_POINTS: u32 = 25;

/// One quiz question. Created fresh per attempt, scored once, never
/// persisted. The correct answer lives only server-side; clients see a
/// [`QuestionView`].
#[derive(Debug, Clone)]
pub struct QuizQuestion {
    pub id: String,
    pub points: u32,
    pub kind: QuestionKind,
}

/// Tagged variant over the four question types, matched exhaustively at
/// scoring time.
#[derive(Debug, Clone)]
pub enum QuestionKind {
    Translate {
        prompt: String,
        answer: String,
        audio_text: Option<String>,
        audio_lang: Option<String>,
    },
    MultipleChoice {
        prompt: String,
        options: Vec<String>,
        answer: String,
    },
    Listening {
        prompt: String,
        audio_text: String,
        audio_lang: String,
        answer: String,
    },
    Pronunciation {
        prompt: String,
        word: String,
        audio_lang: String,
    },
}

impl QuizQuestion {
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            QuestionKind::Translate { .. } => "translate",
            QuestionKind::MultipleChoice { .. } => "multiple_choice",
            QuestionKind::Listening { .. } => "listening",
            QuestionKind::Pronunciation { .. } => "pronunciation",
        }
    }

    /// Client-facing projection; omits the correct answer.
    pub fn view(&self) -> QuestionView {
        match &self.kind {
            QuestionKind::Translate {
                prompt,
                audio_text,
                audio_lang,
                ..
            } => QuestionView {
                id: self.id.clone(),
                question_type: "translate",
                prompt: prompt.clone(),
                points: self.points,
                options: None,
                audio_text: audio_text.clone(),
                audio_lang: audio_lang.clone(),
                word: None,
            },
            QuestionKind::MultipleChoice {
                prompt, options, ..
            } => QuestionView {
                id: self.id.clone(),
                question_type: "multiple_choice",
                prompt: prompt.clone(),
                points: self.points,
                options: Some(options.clone()),
                audio_text: None,
                audio_lang: None,
                word: None,
            },
            QuestionKind::Listening {
                prompt,
                audio_text,
                audio_lang,
                ..
            } => QuestionView {
                id: self.id.clone(),
                question_type: "listening",
                prompt: prompt.clone(),
                points: self.points,
                options: None,
                audio_text: Some(audio_text.clone()),
                audio_lang: Some(audio_lang.clone()),
                word: None,
            },
            QuestionKind::Pronunciation {
                prompt,
                word,
                audio_lang,
            } => QuestionView {
                id: self.id.clone(),
                question_type: "pronunciation",
                prompt: prompt.clone(),
                points: self.points,
                options: None,
                audio_text: None,
                audio_lang: Some(audio_lang.clone()),
                word: Some(word.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub question_type: &'static str,
    pub prompt: String,
    pub points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizKind {
    ChapterTest,
    LessonPractice,
}

/// Ephemeral quiz session. Owned exclusively by the quiz engine for the
/// duration of one attempt; discarded (never merged) if abandoned.
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub id: String,
    pub user_id: String,
    pub language_id: String,
    pub chapter_id: u32,
    pub lesson_id: Option<String>,
    pub kind: QuizKind,
    pub questions: Vec<QuizQuestion>,
    pub results: Vec<Option<AnswerRecord>>,
    pub current_index: usize,
    pub score: u32,
    pub total_points: u32,
    pub status: QuizStatus,
    /// Base XP for lesson-practice quizzes, from the curriculum lesson.
    pub base_xp: u32,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl QuizSession {
    pub fn answered_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of scoring one question. Immutable once recorded.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub question_type: &'static str,
    pub given: String,
    pub correct: bool,
    /// Normalized 0–100 answer score (similarity for fuzzy matches,
    /// confidence for pronunciation).
    pub score: u8,
    pub points_earned: u32,
    pub expected: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub language_id: String,
    pub chapter_id: u32,
    /// When set to a vocabulary lesson, a practice quiz over that lesson's
    /// words; when omitted or a chapter test, the chapter test quiz.
    pub lesson_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitQuizAnswerRequest {
    pub question_index: usize,
    pub payload: AnswerPayload,
}

/// Client answer, tagged by question type. Pronunciation carries the 0–100
/// confidence from the external assessment collaborator.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerPayload {
    Text { answer: String },
    Choice { selected: String },
    Pronunciation { confidence: u8 },
}

#[derive(Debug, Serialize)]
pub struct QuizSessionView {
    pub id: String,
    pub kind: QuizKind,
    pub status: QuizStatus,
    pub chapter_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<String>,
    pub questions: Vec<QuestionView>,
    pub current_index: usize,
    pub answered: usize,
    pub score: u32,
    pub total_points: u32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SubmitQuizAnswerResponse {
    /// Absent when the time budget ran out before the answer was scored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<AnswerRecord>,
    pub quiz_score: u32,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<QuizSummary>,
}

/// Final reduction of a quiz attempt, after the ledger update.
#[derive(Debug, Serialize)]
pub struct QuizSummary {
    pub quiz_id: String,
    pub kind: QuizKind,
    pub score: u32,
    pub total_points: u32,
    pub percentage: f64,
    pub answered: usize,
    pub question_count: usize,
    pub time_expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    pub xp_earned: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_level: Option<u32>,
    pub next_chapter_unlocked: bool,
    pub streak_days: u32,
}
