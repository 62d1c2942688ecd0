//! Progress Ledger: the authoritative mutation point for a user's
//! per-language learning state.
//!
//! Every operation is a pure decision function over a progress snapshot
//! that produces a [`ProgressPatch`]; the store applies it with field-level
//! increment semantics. Nothing here retries — that belongs to the
//! transport layer.

use crate::error::ApiError;
use crate::metrics::{CHAPTER_TESTS_TOTAL, LESSONS_COMPLETED_TOTAL, STREAK_EXTENSIONS_TOTAL};
use crate::models::{
    ChapterTestOutcome, CompleteLessonResponse, LessonCompletion, ProgressPatch, StreakChange,
    StreakOutcome, UserProgress, UserStats,
};
use crate::services::leveling::{level_for, xp_to_next_level};
use crate::services::store::ProgressStore;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// XP bonus for passing a chapter test with 90% or more.
pub const XP_PERFECT_SCORE: u32 = 100;
/// XP bonus for passing a chapter test below 90%.
pub const XP_CHAPTER_TEST_PASSED: u32 = 50;
/// XP awarded for extending a daily streak.
pub const XP_STREAK_BONUS: u32 = 10;
/// Minimum chapter-test percentage to pass (strict `>=`).
pub const PASS_THRESHOLD_PERCENT: f64 = 70.0;
const PERFECT_THRESHOLD_PERCENT: f64 = 90.0;

/// Score-tier bonus on top of a lesson's base XP.
pub fn score_bonus_xp(score: u8) -> u32 {
    match score {
        90..=100 => 30,
        70..=89 => 20,
        50..=69 => 10,
        _ => 0,
    }
}

/// Decide a lesson completion against a snapshot.
///
/// Re-attempt policy: best attempt wins. A re-attempt only credits the XP
/// delta above what the lesson already earned, and the stored score never
/// decreases.
pub fn decide_lesson_completion(
    progress: &UserProgress,
    lesson_id: &str,
    score: u8,
    base_xp: u32,
    now: DateTime<Utc>,
) -> Result<(ProgressPatch, CompleteLessonResponse), ApiError> {
    if score > 100 {
        return Err(ApiError::invalid_input(format!(
            "score must be within 0-100, got {}",
            score
        )));
    }

    let bonus = score_bonus_xp(score);
    let award = base_xp
        .checked_add(bonus)
        .ok_or_else(|| ApiError::invalid_input("base_xp is out of range"))?;

    let previous = progress.completed_lessons.get(lesson_id);
    let xp_delta = award.saturating_sub(previous.map(|p| p.xp_earned).unwrap_or(0));
    let completion = LessonCompletion {
        score: previous.map(|p| p.score).unwrap_or(0).max(score),
        xp_earned: previous.map(|p| p.xp_earned).unwrap_or(0).max(award),
        completed_at: now,
    };

    let new_xp = progress
        .xp
        .checked_add(xp_delta)
        .ok_or_else(|| ApiError::invalid_input("XP total would overflow the ledger"))?;
    let new_level = level_for(new_xp);

    let patch = ProgressPatch {
        xp_delta,
        set_level: Some(new_level),
        set_lesson: Some((lesson_id.to_string(), completion)),
        ..Default::default()
    };

    let response = CompleteLessonResponse {
        lesson_id: lesson_id.to_string(),
        score,
        xp_awarded: xp_delta,
        bonus_xp: bonus,
        total_xp: new_xp,
        level: new_level,
        level_up: new_level > progress.level,
    };

    Ok((patch, response))
}

/// Decide a chapter-test result. Returns `None` for the patch when nothing
/// may be mutated (failed test, or chapter already completed).
pub fn decide_chapter_test(
    progress: &UserProgress,
    chapter_id: u32,
    points_earned: u32,
    points_possible: u32,
    today: NaiveDate,
) -> Result<(Option<ProgressPatch>, ChapterTestOutcome), ApiError> {
    if points_possible == 0 {
        return Err(ApiError::invalid_input(
            "points_possible must be greater than zero",
        ));
    }
    if points_earned > points_possible {
        return Err(ApiError::invalid_input(format!(
            "points_earned {} exceeds points_possible {}",
            points_earned, points_possible
        )));
    }

    let percentage = points_earned as f64 / points_possible as f64 * 100.0;
    let passed = percentage >= PASS_THRESHOLD_PERCENT;

    if !passed {
        return Ok((
            None,
            ChapterTestOutcome {
                chapter_id,
                passed: false,
                percentage,
                xp_earned: 0,
                new_level: None,
                next_chapter_unlocked: false,
                message: Some(format!(
                    "You need at least {:.0}% to unlock the next chapter",
                    PASS_THRESHOLD_PERCENT
                )),
            },
        ));
    }

    if progress.is_chapter_completed(chapter_id) {
        return Ok((
            None,
            ChapterTestOutcome {
                chapter_id,
                passed: false,
                percentage,
                xp_earned: 0,
                new_level: None,
                next_chapter_unlocked: false,
                message: Some("Chapter test already passed".to_string()),
            },
        ));
    }

    let bonus = if percentage >= PERFECT_THRESHOLD_PERCENT {
        XP_PERFECT_SCORE
    } else {
        XP_CHAPTER_TEST_PASSED
    };
    let new_level = level_for(progress.xp.saturating_add(bonus));

    let patch = ProgressPatch {
        xp_delta: bonus,
        set_level: Some(new_level),
        add_completed_chapter: Some(chapter_id),
        // Unlocking is additive only; previously unlocked chapters are
        // never removed.
        add_unlocked_chapter: Some(chapter_id + 1),
        set_current_chapter: Some(chapter_id + 1),
        set_last_activity: Some(today),
        ..Default::default()
    };

    Ok((
        Some(patch),
        ChapterTestOutcome {
            chapter_id,
            passed: true,
            percentage,
            xp_earned: bonus,
            new_level: Some(new_level),
            next_chapter_unlocked: true,
            message: None,
        },
    ))
}

/// Decide a streak update at calendar-day granularity.
pub fn decide_streak(
    progress: &UserProgress,
    today: NaiveDate,
) -> (Option<ProgressPatch>, StreakOutcome) {
    // First-ever qualifying activity.
    if progress.streak_days == 0 {
        let patch = ProgressPatch {
            streak: Some(StreakChange::Set(1)),
            set_last_activity: Some(today),
            ..Default::default()
        };
        return (
            Some(patch),
            StreakOutcome {
                streak_days: 1,
                xp_bonus: 0,
                extended: true,
            },
        );
    }

    let gap = (today - progress.last_activity_date).num_days();
    match gap {
        // Same day (or a clock that ran backwards): nothing to do.
        d if d <= 0 => (
            None,
            StreakOutcome {
                streak_days: progress.streak_days,
                xp_bonus: 0,
                extended: false,
            },
        ),
        1 => {
            let patch = ProgressPatch {
                xp_delta: XP_STREAK_BONUS,
                set_level: Some(level_for(progress.xp.saturating_add(XP_STREAK_BONUS))),
                streak: Some(StreakChange::Increment),
                set_last_activity: Some(today),
                ..Default::default()
            };
            (
                Some(patch),
                StreakOutcome {
                    streak_days: progress.streak_days + 1,
                    xp_bonus: XP_STREAK_BONUS,
                    extended: true,
                },
            )
        }
        _ => {
            let patch = ProgressPatch {
                streak: Some(StreakChange::Set(1)),
                set_last_activity: Some(today),
                ..Default::default()
            };
            (
                Some(patch),
                StreakOutcome {
                    streak_days: 1,
                    xp_bonus: 0,
                    extended: false,
                },
            )
        }
    }
}

pub struct ProgressService {
    store: Arc<dyn ProgressStore>,
}

impl ProgressService {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Read the progress document, lazily initializing it on first access.
    pub async fn get_or_init(
        &self,
        user_id: &str,
        language_id: &str,
    ) -> Result<UserProgress, ApiError> {
        if let Some(progress) = self.store.read(user_id, language_id).await? {
            return Ok(progress);
        }

        let now = Utc::now();
        let progress = UserProgress::new(user_id, language_id, now.date_naive(), now);
        self.store.insert(&progress).await?;
        tracing::info!(
            user_id = %user_id,
            language_id = %language_id,
            "Initialized progress document"
        );
        Ok(progress)
    }

    pub async fn record_lesson_completion(
        &self,
        user_id: &str,
        language_id: &str,
        lesson_id: &str,
        score: u8,
        base_xp: u32,
    ) -> Result<CompleteLessonResponse, ApiError> {
        let progress = self.get_or_init(user_id, language_id).await?;
        let (patch, response) =
            decide_lesson_completion(&progress, lesson_id, score, base_xp, Utc::now())?;

        self.store.apply(user_id, language_id, &patch).await?;
        LESSONS_COMPLETED_TOTAL.inc();
        tracing::info!(
            user_id = %user_id,
            language_id = %language_id,
            lesson_id = %lesson_id,
            score,
            xp_awarded = response.xp_awarded,
            level = response.level,
            "Lesson completion recorded"
        );
        Ok(response)
    }

    pub async fn record_chapter_test_result(
        &self,
        user_id: &str,
        language_id: &str,
        chapter_id: u32,
        points_earned: u32,
        points_possible: u32,
    ) -> Result<ChapterTestOutcome, ApiError> {
        let progress = self.get_or_init(user_id, language_id).await?;
        let (patch, outcome) = decide_chapter_test(
            &progress,
            chapter_id,
            points_earned,
            points_possible,
            Utc::now().date_naive(),
        )?;

        if let Some(patch) = patch {
            self.store.apply(user_id, language_id, &patch).await?;
        }
        CHAPTER_TESTS_TOTAL
            .with_label_values(&[if outcome.passed { "passed" } else { "failed" }])
            .inc();
        tracing::info!(
            user_id = %user_id,
            language_id = %language_id,
            chapter_id,
            passed = outcome.passed,
            percentage = outcome.percentage,
            "Chapter test recorded"
        );
        Ok(outcome)
    }

    pub async fn update_streak(
        &self,
        user_id: &str,
        language_id: &str,
    ) -> Result<StreakOutcome, ApiError> {
        let progress = self.get_or_init(user_id, language_id).await?;
        let (patch, outcome) = decide_streak(&progress, Utc::now().date_naive());

        if let Some(patch) = patch {
            self.store.apply(user_id, language_id, &patch).await?;
        }
        if outcome.extended {
            STREAK_EXTENSIONS_TOTAL.inc();
        }
        Ok(outcome)
    }

    pub async fn get_stats(
        &self,
        user_id: &str,
        language_id: &str,
    ) -> Result<UserStats, ApiError> {
        let progress = self.get_or_init(user_id, language_id).await?;
        let xp_progress = xp_to_next_level(progress.xp);

        Ok(UserStats {
            xp: progress.xp,
            level: progress.level,
            lessons_completed: progress.completed_lessons.len(),
            chapters_completed: progress.completed_chapters.len(),
            streak_days: progress.streak_days,
            current_level_xp: xp_progress.current_level_xp,
            next_level_xp: xp_progress.next_level_xp,
            xp_remaining: xp_progress.remaining,
            progress_percentage: xp_progress.progress_percentage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn progress_with_xp(xp: u32) -> UserProgress {
        let now = Utc::now();
        let mut progress = UserProgress::new("user-1", "en", now.date_naive(), now);
        progress.xp = xp;
        progress.level = level_for(xp);
        progress
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bonus_tiers_match_policy() {
        assert_eq!(score_bonus_xp(100), 30);
        assert_eq!(score_bonus_xp(90), 30);
        assert_eq!(score_bonus_xp(89), 20);
        assert_eq!(score_bonus_xp(70), 20);
        assert_eq!(score_bonus_xp(69), 10);
        assert_eq!(score_bonus_xp(50), 10);
        assert_eq!(score_bonus_xp(49), 0);
        assert_eq!(score_bonus_xp(0), 0);
    }

    #[test]
    fn lesson_completion_awards_base_plus_bonus() {
        let progress = progress_with_xp(0);
        let (patch, response) =
            decide_lesson_completion(&progress, "lesson_1_1", 75, 50, Utc::now()).unwrap();
        assert_eq!(patch.xp_delta, 70);
        assert_eq!(response.bonus_xp, 20);
        assert_eq!(response.total_xp, 70);
        assert_eq!(response.level, 1);
    }

    #[test]
    fn lesson_completion_crossing_level_threshold() {
        // xp=980, score 95% with base 50 -> bonus 30, new xp 1060, level 2.
        let progress = progress_with_xp(980);
        let (patch, response) =
            decide_lesson_completion(&progress, "lesson_2_1", 95, 50, Utc::now()).unwrap();
        assert_eq!(patch.xp_delta, 80);
        assert_eq!(response.total_xp, 1060);
        assert_eq!(response.level, 2);
        assert!(response.level_up);
    }

    #[test]
    fn lesson_reattempt_only_credits_improvement() {
        let mut progress = progress_with_xp(70);
        progress.completed_lessons.insert(
            "lesson_1_1".to_string(),
            LessonCompletion {
                score: 75,
                xp_earned: 70,
                completed_at: Utc::now(),
            },
        );

        // Better attempt: 95% -> award 80, previously earned 70, delta 10.
        let (patch, response) =
            decide_lesson_completion(&progress, "lesson_1_1", 95, 50, Utc::now()).unwrap();
        assert_eq!(patch.xp_delta, 10);
        assert_eq!(response.total_xp, 80);
        let (_, completion) = patch.set_lesson.unwrap();
        assert_eq!(completion.score, 95);
        assert_eq!(completion.xp_earned, 80);

        // Worse attempt: no XP, stored score keeps the best.
        let (patch, _) =
            decide_lesson_completion(&progress, "lesson_1_1", 40, 50, Utc::now()).unwrap();
        assert_eq!(patch.xp_delta, 0);
        let (_, completion) = patch.set_lesson.unwrap();
        assert_eq!(completion.score, 75);
        assert_eq!(completion.xp_earned, 70);
    }

    #[test]
    fn oversized_xp_awards_are_rejected_not_wrapped() {
        // Base XP that cannot hold the tier bonus.
        let progress = progress_with_xp(0);
        let err = decide_lesson_completion(&progress, "lesson_1_1", 95, u32::MAX, Utc::now())
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        // A ledger already near the top refuses further awards.
        let progress = progress_with_xp(u32::MAX - 10);
        let err = decide_lesson_completion(&progress, "lesson_1_1", 95, 50, Utc::now())
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn invalid_score_is_rejected() {
        let progress = progress_with_xp(0);
        let err = decide_lesson_completion(&progress, "lesson_1_1", 101, 50, Utc::now())
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn chapter_test_pass_boundary_is_inclusive() {
        let progress = progress_with_xp(0);
        let today = Utc::now().date_naive();

        // Exactly 70% passes.
        let (patch, outcome) = decide_chapter_test(&progress, 1, 70, 100, today).unwrap();
        assert!(outcome.passed);
        assert!(patch.is_some());

        // 69.9% fails, without mutating anything.
        let (patch, outcome) = decide_chapter_test(&progress, 1, 699, 1000, today).unwrap();
        assert!(!outcome.passed);
        assert!(patch.is_none());
        assert!(outcome.message.is_some());
    }

    #[test]
    fn chapter_test_pass_unlocks_next_chapter() {
        let progress = progress_with_xp(0);
        let (patch, outcome) =
            decide_chapter_test(&progress, 1, 85, 100, Utc::now().date_naive()).unwrap();
        let patch = patch.unwrap();
        assert_eq!(patch.add_completed_chapter, Some(1));
        assert_eq!(patch.add_unlocked_chapter, Some(2));
        assert_eq!(patch.set_current_chapter, Some(2));
        assert_eq!(outcome.xp_earned, XP_CHAPTER_TEST_PASSED);
        assert!(outcome.next_chapter_unlocked);
    }

    #[test]
    fn perfect_chapter_test_earns_perfect_bonus() {
        let progress = progress_with_xp(0);
        let (_, outcome) =
            decide_chapter_test(&progress, 1, 90, 100, Utc::now().date_naive()).unwrap();
        assert_eq!(outcome.xp_earned, XP_PERFECT_SCORE);
    }

    #[test]
    fn repeated_chapter_test_does_not_mutate() {
        let mut progress = progress_with_xp(100);
        progress.completed_chapters.push(1);
        progress.unlocked_chapters.push(2);

        let (patch, outcome) =
            decide_chapter_test(&progress, 1, 100, 100, Utc::now().date_naive()).unwrap();
        assert!(patch.is_none());
        assert!(!outcome.passed);
        assert_eq!(outcome.message.as_deref(), Some("Chapter test already passed"));
    }

    #[test]
    fn zero_divisor_percentage_is_rejected() {
        let progress = progress_with_xp(0);
        let err =
            decide_chapter_test(&progress, 1, 0, 0, Utc::now().date_naive()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn unlocked_chapters_are_monotonic() {
        let mut progress = progress_with_xp(0);
        let today = Utc::now().date_naive();

        let (patch, _) = decide_chapter_test(&progress, 1, 100, 100, today).unwrap();
        progress.apply(&patch.unwrap(), Utc::now());
        assert!(progress.is_chapter_unlocked(1));
        assert!(progress.is_chapter_unlocked(2));

        // Subsequent operations never remove an unlocked chapter.
        let (patch, _) =
            decide_lesson_completion(&progress, "lesson_2_1", 40, 50, Utc::now()).unwrap();
        progress.apply(&patch, Utc::now());
        let (patch, _) = decide_streak(&progress, today + chrono::Duration::days(5));
        if let Some(patch) = patch {
            progress.apply(&patch, Utc::now());
        }
        assert!(progress.is_chapter_unlocked(1));
        assert!(progress.is_chapter_unlocked(2));
    }

    #[test]
    fn first_activity_initializes_streak() {
        let progress = progress_with_xp(0);
        let (patch, outcome) = decide_streak(&progress, Utc::now().date_naive());
        assert!(patch.is_some());
        assert_eq!(outcome.streak_days, 1);
        assert_eq!(outcome.xp_bonus, 0);
    }

    #[test]
    fn consecutive_day_extends_streak_with_bonus() {
        let mut progress = progress_with_xp(100);
        progress.streak_days = 3;
        progress.last_activity_date = day(2026, 8, 29);

        let (patch, outcome) = decide_streak(&progress, day(2026, 8, 30));
        let patch = patch.unwrap();
        assert!(matches!(patch.streak, Some(StreakChange::Increment)));
        assert_eq!(patch.xp_delta, XP_STREAK_BONUS);
        assert_eq!(outcome.streak_days, 4);
        assert_eq!(outcome.xp_bonus, XP_STREAK_BONUS);
    }

    #[test]
    fn same_day_streak_is_noop() {
        let mut progress = progress_with_xp(100);
        progress.streak_days = 3;
        progress.last_activity_date = day(2026, 8, 30);

        let (patch, outcome) = decide_streak(&progress, day(2026, 8, 30));
        assert!(patch.is_none());
        assert_eq!(outcome.streak_days, 3);
    }

    #[test]
    fn missed_day_resets_streak() {
        let mut progress = progress_with_xp(100);
        progress.streak_days = 7;
        progress.last_activity_date = day(2026, 8, 27);

        let (patch, outcome) = decide_streak(&progress, day(2026, 8, 30));
        let patch = patch.unwrap();
        assert!(matches!(patch.streak, Some(StreakChange::Set(1))));
        assert_eq!(patch.xp_delta, 0);
        assert_eq!(outcome.streak_days, 1);
        assert!(!outcome.extended);
    }
}
