//! Quiz Engine: question generation, forward-only answer scoring, and the
//! final reduction into the Progress Ledger.
//!
//! Sessions are ephemeral and live only in this process; an abandoned
//! attempt is discarded wholesale, never merged.

use crate::error::ApiError;
use crate::metrics::{QUIZZES_GENERATED_TOTAL, QUIZ_ANSWERS_TOTAL};
use crate::models::curriculum::{LessonKind, WordPair};
use crate::models::quiz::{
    AnswerPayload, AnswerRecord, CreateQuizRequest, QuestionKind, QuizKind, QuizQuestion,
    QuizSession, QuizSessionView, QuizStatus, QuizSummary, SubmitQuizAnswerRequest,
    SubmitQuizAnswerResponse, LISTENING_POINTS, MULTIPLE_CHOICE_POINTS, PRONUNCIATION_POINTS,
    TRANSLATE_POINTS,
};
use crate::services::curriculum_service::{ensure_test_available, CurriculumService};
use crate::services::progress_service::ProgressService;
use crate::utils::text::{normalize, similarity};
use chrono::{Duration, Utc};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

const FORWARD_TRANSLATE_COUNT: usize = 3;
const REVERSE_TRANSLATE_COUNT: usize = 3;
const MULTIPLE_CHOICE_COUNT: usize = 4;
const LISTENING_COUNT: usize = 2;
const MAX_QUESTIONS: usize = 10;
/// Chapter tests draw from at most this many vocabulary words.
const CHAPTER_POOL_CAP: usize = 15;
const MAX_CHOICE_DISTRACTORS: usize = 3;

/// Similarity above which a free-text translation counts as correct.
const FUZZY_MATCH_THRESHOLD: f64 = 0.8;
/// Pronunciation confidence at or above which the attempt counts as correct.
const PRONUNCIATION_PASS_CONFIDENCE: u8 = 70;

fn kind_label(kind: QuizKind) -> &'static str {
    match kind {
        QuizKind::ChapterTest => "chapter_test",
        QuizKind::LessonPractice => "lesson_practice",
    }
}

/// Generate a shuffled question set over a word pool. At most
/// [`MAX_QUESTIONS`] mixed questions, plus one pronunciation question
/// appended at the end.
pub fn generate_questions<R: Rng + ?Sized>(
    words: &[WordPair],
    audio_lang: &str,
    rng: &mut R,
) -> Result<Vec<QuizQuestion>, ApiError> {
    if words.is_empty() {
        return Err(ApiError::NoContent(
            "No vocabulary words available for this quiz".to_string(),
        ));
    }

    let mut questions = Vec::new();

    for pair in words.choose_multiple(rng, FORWARD_TRANSLATE_COUNT) {
        questions.push(QuizQuestion {
            id: Uuid::new_v4().to_string(),
            points: TRANSLATE_POINTS,
            kind: QuestionKind::Translate {
                prompt: format!("Traduisez : {}", pair.word),
                answer: pair.translation.clone(),
                audio_text: Some(pair.word.clone()),
                audio_lang: Some(audio_lang.to_string()),
            },
        });
    }

    for pair in words.choose_multiple(rng, REVERSE_TRANSLATE_COUNT) {
        questions.push(QuizQuestion {
            id: Uuid::new_v4().to_string(),
            points: TRANSLATE_POINTS,
            kind: QuestionKind::Translate {
                prompt: format!("Comment dit-on \u{ab} {} \u{bb} ?", pair.translation),
                answer: pair.word.clone(),
                audio_text: None,
                audio_lang: None,
            },
        });
    }

    for pair in words.choose_multiple(rng, MULTIPLE_CHOICE_COUNT) {
        let mut options: Vec<String> = words
            .iter()
            .filter(|w| w.translation != pair.translation)
            .map(|w| w.translation.clone())
            .collect::<Vec<_>>()
            .choose_multiple(rng, MAX_CHOICE_DISTRACTORS)
            .cloned()
            .collect();
        options.push(pair.translation.clone());
        options.shuffle(rng);

        questions.push(QuizQuestion {
            id: Uuid::new_v4().to_string(),
            points: MULTIPLE_CHOICE_POINTS,
            kind: QuestionKind::MultipleChoice {
                prompt: format!("Que signifie \u{ab} {} \u{bb} ?", pair.word),
                options,
                answer: pair.translation.clone(),
            },
        });
    }

    for pair in words.choose_multiple(rng, LISTENING_COUNT) {
        questions.push(QuizQuestion {
            id: Uuid::new_v4().to_string(),
            points: LISTENING_POINTS,
            kind: QuestionKind::Listening {
                prompt: "\u{c9}crivez ce que vous entendez".to_string(),
                audio_text: pair.word.clone(),
                audio_lang: audio_lang.to_string(),
                answer: pair.word.clone(),
            },
        });
    }

    questions.shuffle(rng);
    questions.truncate(MAX_QUESTIONS);

    // The pronunciation question always comes last, after the cut.
    if let Some(pair) = words.choose(rng) {
        questions.push(QuizQuestion {
            id: Uuid::new_v4().to_string(),
            points: PRONUNCIATION_POINTS,
            kind: QuestionKind::Pronunciation {
                prompt: format!("Prononcez : {}", pair.word),
                word: pair.word.clone(),
                audio_lang: audio_lang.to_string(),
            },
        });
    }

    Ok(questions)
}

/// Score one answer against one question. Pure; rejects payloads whose type
/// does not match the question.
pub fn score_answer(
    question: &QuizQuestion,
    payload: &AnswerPayload,
) -> Result<AnswerRecord, ApiError> {
    let record = match (&question.kind, payload) {
        (QuestionKind::Translate { answer, .. }, AnswerPayload::Text { answer: given }) => {
            let expected = normalize(answer);
            let given_norm = normalize(given);
            let sim = similarity(&given_norm, &expected);
            let correct = given_norm == expected || sim > FUZZY_MATCH_THRESHOLD;
            AnswerRecord {
                question_id: question.id.clone(),
                question_type: question.type_name(),
                given: given.clone(),
                correct,
                score: if correct { (sim * 100.0).floor() as u8 } else { 0 },
                points_earned: if correct { question.points } else { 0 },
                expected: Some(answer.clone()),
            }
        }
        (QuestionKind::Listening { answer, .. }, AnswerPayload::Text { answer: given }) => {
            let correct = normalize(given) == normalize(answer);
            AnswerRecord {
                question_id: question.id.clone(),
                question_type: question.type_name(),
                given: given.clone(),
                correct,
                score: if correct { 100 } else { 0 },
                points_earned: if correct { question.points } else { 0 },
                expected: Some(answer.clone()),
            }
        }
        (QuestionKind::MultipleChoice { answer, .. }, AnswerPayload::Choice { selected }) => {
            let correct = selected == answer;
            AnswerRecord {
                question_id: question.id.clone(),
                question_type: question.type_name(),
                given: selected.clone(),
                correct,
                score: if correct { 100 } else { 0 },
                points_earned: if correct { question.points } else { 0 },
                expected: Some(answer.clone()),
            }
        }
        (QuestionKind::Pronunciation { word, .. }, AnswerPayload::Pronunciation { confidence }) => {
            if *confidence > 100 {
                return Err(ApiError::invalid_input(format!(
                    "confidence must be within 0-100, got {}",
                    confidence
                )));
            }
            AnswerRecord {
                question_id: question.id.clone(),
                question_type: question.type_name(),
                given: word.clone(),
                correct: *confidence >= PRONUNCIATION_PASS_CONFIDENCE,
                score: *confidence,
                points_earned: *confidence as u32 * question.points / 100,
                expected: None,
            }
        }
        _ => {
            return Err(ApiError::invalid_input(format!(
                "Answer payload does not match question type {}",
                question.type_name()
            )));
        }
    };

    Ok(record)
}

pub struct QuizService {
    sessions: RwLock<HashMap<String, QuizSession>>,
    time_limit: Duration,
}

impl QuizService {
    pub fn new(time_limit_seconds: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            time_limit: Duration::seconds(time_limit_seconds),
        }
    }

    pub async fn create_quiz(
        &self,
        req: CreateQuizRequest,
        curriculum: &CurriculumService,
        ledger: &ProgressService,
    ) -> Result<QuizSessionView, ApiError> {
        let chapter = curriculum.chapter(&req.language_id, req.chapter_id)?;

        // A vocabulary lesson_id selects a practice quiz over that lesson's
        // words; anything else is the chapter test.
        let practice_lesson = match &req.lesson_id {
            Some(lesson_id) => {
                let lesson = chapter
                    .lessons
                    .iter()
                    .find(|l| &l.id == lesson_id)
                    .ok_or_else(|| {
                        ApiError::not_found(format!(
                            "Unknown lesson {} in chapter {}",
                            lesson_id, req.chapter_id
                        ))
                    })?;
                (lesson.kind == LessonKind::Vocabulary).then_some(lesson)
            }
            None => None,
        };

        let (kind, words, base_xp, lesson_id) = match practice_lesson {
            Some(lesson) => (
                QuizKind::LessonPractice,
                lesson.words.clone(),
                lesson.xp,
                Some(lesson.id.clone()),
            ),
            None => {
                let progress = ledger.get_or_init(&req.user_id, &req.language_id).await?;
                ensure_test_available(chapter, &progress)?;
                let mut pool = chapter.vocabulary_words();
                pool.truncate(CHAPTER_POOL_CAP);
                (QuizKind::ChapterTest, pool, 0, None)
            }
        };

        let questions = generate_questions(&words, &req.language_id, &mut rand::rng())?;
        let total_points = questions.iter().map(|q| q.points).sum();
        let now = Utc::now();

        let session = QuizSession {
            id: Uuid::new_v4().to_string(),
            user_id: req.user_id,
            language_id: req.language_id,
            chapter_id: req.chapter_id,
            lesson_id,
            kind,
            results: vec![None; questions.len()],
            questions,
            current_index: 0,
            score: 0,
            total_points,
            status: QuizStatus::InProgress,
            base_xp,
            started_at: now,
            expires_at: now + self.time_limit,
        };

        QUIZZES_GENERATED_TOTAL
            .with_label_values(&[kind_label(kind)])
            .inc();
        tracing::info!(
            quiz_id = %session.id,
            user_id = %session.user_id,
            language_id = %session.language_id,
            chapter_id = session.chapter_id,
            kind = kind_label(kind),
            questions = session.questions.len(),
            "Quiz created"
        );

        let view = view_of(&session);
        let mut sessions = self.sessions.write().await;
        // Lazy sweep: drop sessions long past their time budget.
        sessions.retain(|_, s| now < s.expires_at + Duration::hours(1));
        sessions.insert(session.id.clone(), session);
        Ok(view)
    }

    /// Read a session, finalizing it first when its time budget has run
    /// out, so clients never see a live view of a dead quiz.
    pub async fn get_quiz(
        &self,
        quiz_id: &str,
        ledger: &ProgressService,
    ) -> Result<QuizSessionView, ApiError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(quiz_id)
            .ok_or_else(|| ApiError::not_found(format!("Unknown quiz: {}", quiz_id)))?;

        if session.status == QuizStatus::InProgress && session.is_expired(Utc::now()) {
            tracing::warn!(quiz_id = %quiz_id, "Quiz expired before read; forcing completion");
            finalize(session, ledger, true).await?;
        }
        Ok(view_of(session))
    }

    /// Score the answer at `question_index`. Answers are forward-only: each
    /// question is scored exactly once, in order.
    pub async fn submit_answer(
        &self,
        quiz_id: &str,
        req: SubmitQuizAnswerRequest,
        ledger: &ProgressService,
    ) -> Result<SubmitQuizAnswerResponse, ApiError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(quiz_id)
            .ok_or_else(|| ApiError::not_found(format!("Unknown quiz: {}", quiz_id)))?;

        if session.status == QuizStatus::Completed {
            return Err(ApiError::invalid_input("Quiz is already completed"));
        }
        if session.is_expired(Utc::now()) {
            let summary = finalize(session, ledger, true).await?;
            tracing::warn!(quiz_id = %quiz_id, "Quiz expired before answer; forcing completion");
            return Ok(SubmitQuizAnswerResponse {
                record: None,
                quiz_score: session.score,
                completed: true,
                summary: Some(summary),
            });
        }
        if req.question_index >= session.questions.len() {
            return Err(ApiError::invalid_input(format!(
                "question_index {} out of range",
                req.question_index
            )));
        }
        if req.question_index < session.current_index {
            return Err(ApiError::invalid_input("Question already answered"));
        }
        if req.question_index > session.current_index {
            return Err(ApiError::invalid_input("Answer questions in order"));
        }

        let record = score_answer(&session.questions[req.question_index], &req.payload)?;
        QUIZ_ANSWERS_TOTAL
            .with_label_values(&[if record.correct { "true" } else { "false" }])
            .inc();

        session.score += record.points_earned;
        session.results[req.question_index] = Some(record.clone());
        session.current_index += 1;

        let completed = session.current_index == session.questions.len();
        let summary = if completed {
            Some(finalize(session, ledger, false).await?)
        } else {
            None
        };

        Ok(SubmitQuizAnswerResponse {
            record: Some(record),
            quiz_score: session.score,
            completed,
            summary,
        })
    }

    /// Force completion, scoring unanswered questions as zero.
    pub async fn complete_quiz(
        &self,
        quiz_id: &str,
        ledger: &ProgressService,
    ) -> Result<QuizSummary, ApiError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(quiz_id)
            .ok_or_else(|| ApiError::not_found(format!("Unknown quiz: {}", quiz_id)))?;

        if session.status == QuizStatus::Completed {
            return Err(ApiError::invalid_input("Quiz is already completed"));
        }

        let expired = session.is_expired(Utc::now());
        finalize(session, ledger, expired).await
    }
}

fn view_of(session: &QuizSession) -> QuizSessionView {
    QuizSessionView {
        id: session.id.clone(),
        kind: session.kind,
        status: session.status,
        chapter_id: session.chapter_id,
        lesson_id: session.lesson_id.clone(),
        questions: session.questions.iter().map(|q| q.view()).collect(),
        current_index: session.current_index,
        answered: session.answered_count(),
        score: session.score,
        total_points: session.total_points,
        expires_at: session.expires_at,
    }
}

/// Reduce a finished attempt into the ledger and build the summary. The
/// single write point for quiz results.
async fn finalize(
    session: &mut QuizSession,
    ledger: &ProgressService,
    time_expired: bool,
) -> Result<QuizSummary, ApiError> {
    session.status = QuizStatus::Completed;

    let percentage = if session.total_points == 0 {
        0.0
    } else {
        session.score as f64 / session.total_points as f64 * 100.0
    };

    let (passed, xp_earned, new_level, next_chapter_unlocked) = match session.kind {
        QuizKind::ChapterTest => {
            let outcome = ledger
                .record_chapter_test_result(
                    &session.user_id,
                    &session.language_id,
                    session.chapter_id,
                    session.score,
                    session.total_points,
                )
                .await?;
            (
                Some(outcome.passed),
                outcome.xp_earned,
                outcome.new_level,
                outcome.next_chapter_unlocked,
            )
        }
        QuizKind::LessonPractice => {
            // Creation guarantees a lesson id for practice quizzes.
            let lesson_id = session.lesson_id.clone().ok_or_else(|| {
                ApiError::ExternalService(anyhow::anyhow!("Practice quiz lost its lesson id"))
            })?;
            let score = percentage.round().min(100.0) as u8;
            let response = ledger
                .record_lesson_completion(
                    &session.user_id,
                    &session.language_id,
                    &lesson_id,
                    score,
                    session.base_xp,
                )
                .await?;
            (
                None,
                response.xp_awarded,
                response.level_up.then_some(response.level),
                false,
            )
        }
    };

    let streak = ledger
        .update_streak(&session.user_id, &session.language_id)
        .await?;

    tracing::info!(
        quiz_id = %session.id,
        user_id = %session.user_id,
        kind = kind_label(session.kind),
        score = session.score,
        total_points = session.total_points,
        time_expired,
        "Quiz completed"
    );

    Ok(QuizSummary {
        quiz_id: session.id.clone(),
        kind: session.kind,
        score: session.score,
        total_points: session.total_points,
        percentage,
        answered: session.answered_count(),
        question_count: session.questions.len(),
        time_expired,
        passed,
        xp_earned,
        new_level,
        next_chapter_unlocked,
        streak_days: streak.streak_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::MemoryProgressStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn words(n: usize) -> Vec<WordPair> {
        (0..n)
            .map(|i| WordPair {
                word: format!("word{}", i),
                translation: format!("mot{}", i),
                phonetic: None,
            })
            .collect()
    }

    fn translate_question(answer: &str) -> QuizQuestion {
        QuizQuestion {
            id: "q1".to_string(),
            points: TRANSLATE_POINTS,
            kind: QuestionKind::Translate {
                prompt: "Traduisez : hello".to_string(),
                answer: answer.to_string(),
                audio_text: None,
                audio_lang: None,
            },
        }
    }

    #[test]
    fn generation_caps_at_ten_plus_pronunciation() {
        let mut rng = StdRng::seed_from_u64(7);
        let questions = generate_questions(&words(12), "en", &mut rng).unwrap();
        assert_eq!(questions.len(), MAX_QUESTIONS + 1);
        assert!(matches!(
            questions.last().unwrap().kind,
            QuestionKind::Pronunciation { .. }
        ));
        let total: u32 = questions.iter().map(|q| q.points).sum();
        assert!(total > PRONUNCIATION_POINTS);
    }

    #[test]
    fn generation_with_tiny_pool_still_produces_questions() {
        let mut rng = StdRng::seed_from_u64(7);
        let questions = generate_questions(&words(1), "en", &mut rng).unwrap();
        // One word: one of each category, plus pronunciation.
        assert_eq!(questions.len(), 5);
    }

    #[test]
    fn generation_over_empty_pool_is_refused() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = generate_questions(&[], "en", &mut rng).unwrap_err();
        assert!(matches!(err, ApiError::NoContent(_)));
    }

    #[test]
    fn multiple_choice_options_contain_the_answer() {
        let mut rng = StdRng::seed_from_u64(42);
        let questions = generate_questions(&words(8), "en", &mut rng).unwrap();
        for question in &questions {
            if let QuestionKind::MultipleChoice { options, answer, .. } = &question.kind {
                assert!(options.contains(answer));
                assert!(options.len() <= MAX_CHOICE_DISTRACTORS + 1);
            }
        }
    }

    #[test]
    fn exact_translation_scores_full_points() {
        let question = translate_question("Bonjour");
        let record = score_answer(
            &question,
            &AnswerPayload::Text {
                answer: "  bonjour. ".to_string(),
            },
        )
        .unwrap();
        assert!(record.correct);
        assert_eq!(record.score, 100);
        assert_eq!(record.points_earned, TRANSLATE_POINTS);
    }

    #[test]
    fn close_translation_passes_fuzzy_match() {
        let question = translate_question("bonjour");
        let record = score_answer(
            &question,
            &AnswerPayload::Text {
                answer: "bonjourr".to_string(),
            },
        )
        .unwrap();
        // 1 edit over 8 chars: similarity 0.875.
        assert!(record.correct);
        assert_eq!(record.score, 87);
        assert_eq!(record.points_earned, TRANSLATE_POINTS);
    }

    #[test]
    fn wrong_translation_earns_nothing() {
        let question = translate_question("bonjour");
        let record = score_answer(
            &question,
            &AnswerPayload::Text {
                answer: "fromage".to_string(),
            },
        )
        .unwrap();
        assert!(!record.correct);
        assert_eq!(record.points_earned, 0);
        assert_eq!(record.expected.as_deref(), Some("bonjour"));
    }

    #[test]
    fn pronunciation_scales_points_by_confidence() {
        let question = QuizQuestion {
            id: "q1".to_string(),
            points: PRONUNCIATION_POINTS,
            kind: QuestionKind::Pronunciation {
                prompt: "Prononcez : hello".to_string(),
                word: "hello".to_string(),
                audio_lang: "en".to_string(),
            },
        };

        let record = score_answer(&question, &AnswerPayload::Pronunciation { confidence: 85 })
            .unwrap();
        assert!(record.correct);
        assert_eq!(record.points_earned, 21);

        let record = score_answer(&question, &AnswerPayload::Pronunciation { confidence: 60 })
            .unwrap();
        assert!(!record.correct);
        assert_eq!(record.points_earned, 15);

        let err = score_answer(&question, &AnswerPayload::Pronunciation { confidence: 101 })
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn mismatched_payload_is_rejected() {
        let question = translate_question("bonjour");
        let err = score_answer(&question, &AnswerPayload::Pronunciation { confidence: 90 })
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    fn test_session(questions: Vec<QuizQuestion>) -> QuizSession {
        let now = Utc::now();
        let total_points = questions.iter().map(|q| q.points).sum();
        QuizSession {
            id: "quiz-1".to_string(),
            user_id: "user-1".to_string(),
            language_id: "en".to_string(),
            chapter_id: 1,
            lesson_id: Some("lesson_1_1".to_string()),
            kind: QuizKind::LessonPractice,
            results: vec![None; questions.len()],
            questions,
            current_index: 0,
            score: 0,
            total_points,
            status: QuizStatus::InProgress,
            base_xp: 50,
            started_at: now,
            expires_at: now + Duration::seconds(600),
        }
    }

    #[tokio::test]
    async fn answers_are_forward_only() {
        let service = QuizService::new(600);
        let ledger = ProgressService::new(Arc::new(MemoryProgressStore::default()));
        let session = test_session(vec![
            translate_question("bonjour"),
            translate_question("merci"),
        ]);
        service
            .sessions
            .write()
            .await
            .insert(session.id.clone(), session);

        // Skipping ahead is refused.
        let err = service
            .submit_answer(
                "quiz-1",
                SubmitQuizAnswerRequest {
                    question_index: 1,
                    payload: AnswerPayload::Text {
                        answer: "merci".to_string(),
                    },
                },
                &ledger,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let response = service
            .submit_answer(
                "quiz-1",
                SubmitQuizAnswerRequest {
                    question_index: 0,
                    payload: AnswerPayload::Text {
                        answer: "bonjour".to_string(),
                    },
                },
                &ledger,
            )
            .await
            .unwrap();
        assert!(response.record.unwrap().correct);
        assert!(!response.completed);

        // Re-answering is refused.
        let err = service
            .submit_answer(
                "quiz-1",
                SubmitQuizAnswerRequest {
                    question_index: 0,
                    payload: AnswerPayload::Text {
                        answer: "bonjour".to_string(),
                    },
                },
                &ledger,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn final_answer_reduces_into_ledger() {
        let service = QuizService::new(600);
        let store = Arc::new(MemoryProgressStore::default());
        let ledger = ProgressService::new(store);
        let session = test_session(vec![translate_question("bonjour")]);
        service
            .sessions
            .write()
            .await
            .insert(session.id.clone(), session);

        let response = service
            .submit_answer(
                "quiz-1",
                SubmitQuizAnswerRequest {
                    question_index: 0,
                    payload: AnswerPayload::Text {
                        answer: "bonjour".to_string(),
                    },
                },
                &ledger,
            )
            .await
            .unwrap();

        assert!(response.completed);
        let summary = response.summary.unwrap();
        // Perfect practice quiz: base 50 + tier bonus 30.
        assert_eq!(summary.percentage, 100.0);
        assert_eq!(summary.xp_earned, 80);
        assert_eq!(summary.streak_days, 1);

        let stats = ledger.get_stats("user-1", "en").await.unwrap();
        assert_eq!(stats.xp, 80);
        assert_eq!(stats.lessons_completed, 1);
    }

    #[tokio::test]
    async fn expired_session_finalizes_with_partial_score() {
        let service = QuizService::new(600);
        let store = Arc::new(MemoryProgressStore::default());
        let ledger = ProgressService::new(store);
        let session = test_session(vec![
            translate_question("bonjour"),
            translate_question("merci"),
        ]);
        service
            .sessions
            .write()
            .await
            .insert(session.id.clone(), session);

        let response = service
            .submit_answer(
                "quiz-1",
                SubmitQuizAnswerRequest {
                    question_index: 0,
                    payload: AnswerPayload::Text {
                        answer: "bonjour".to_string(),
                    },
                },
                &ledger,
            )
            .await
            .unwrap();
        assert!(!response.completed);

        // Time budget runs out before the second answer.
        service
            .sessions
            .write()
            .await
            .get_mut("quiz-1")
            .unwrap()
            .expires_at = Utc::now() - Duration::seconds(1);

        let response = service
            .submit_answer(
                "quiz-1",
                SubmitQuizAnswerRequest {
                    question_index: 1,
                    payload: AnswerPayload::Text {
                        answer: "merci".to_string(),
                    },
                },
                &ledger,
            )
            .await
            .unwrap();

        // The late answer is not scored; the accumulated score stands.
        assert!(response.completed);
        assert!(response.record.is_none());
        let summary = response.summary.unwrap();
        assert!(summary.time_expired);
        assert_eq!(summary.score, TRANSLATE_POINTS);
        assert_eq!(summary.answered, 1);

        // Half the points: practice score 50 -> base 50 + tier bonus 10.
        let stats = ledger.get_stats("user-1", "en").await.unwrap();
        assert_eq!(stats.xp, 60);
        assert_eq!(stats.lessons_completed, 1);
    }

    #[tokio::test]
    async fn reading_an_expired_quiz_finalizes_it() {
        let service = QuizService::new(600);
        let ledger = ProgressService::new(Arc::new(MemoryProgressStore::default()));
        let mut session = test_session(vec![translate_question("bonjour")]);
        session.expires_at = Utc::now() - Duration::seconds(1);
        service
            .sessions
            .write()
            .await
            .insert(session.id.clone(), session);

        let view = service.get_quiz("quiz-1", &ledger).await.unwrap();
        assert_eq!(view.status, QuizStatus::Completed);
        assert_eq!(view.answered, 0);
        assert_eq!(view.score, 0);

        // The zero-score run still reduced into the ledger.
        let stats = ledger.get_stats("user-1", "en").await.unwrap();
        assert_eq!(stats.lessons_completed, 1);
        assert_eq!(stats.xp, 50);
    }

    #[tokio::test]
    async fn forced_completion_scores_unanswered_as_zero() {
        let service = QuizService::new(600);
        let ledger = ProgressService::new(Arc::new(MemoryProgressStore::default()));
        let session = test_session(vec![
            translate_question("bonjour"),
            translate_question("merci"),
        ]);
        service
            .sessions
            .write()
            .await
            .insert(session.id.clone(), session);

        let summary = service.complete_quiz("quiz-1", &ledger).await.unwrap();
        assert_eq!(summary.score, 0);
        assert_eq!(summary.answered, 0);
        assert_eq!(summary.question_count, 2);

        // Completing twice is refused.
        let err = service.complete_quiz("quiz-1", &ledger).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}
