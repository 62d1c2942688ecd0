//! Curriculum Gate: static course content plus the read-only projection of
//! it against a progress snapshot, and the prerequisite check for chapter
//! tests.

use crate::error::ApiError;
use crate::models::curriculum::{
    Chapter, ChapterView, Curriculum, LanguageSummary, Lesson, LessonKind, LessonView, WordPair,
};
use crate::models::UserProgress;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::Path;

pub struct CurriculumService {
    catalog: BTreeMap<String, Curriculum>,
}

impl CurriculumService {
    /// Load the catalog from a JSON file (an array of curricula), falling
    /// back to the built-in catalog when no path is configured.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let curricula = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(Path::new(path))
                    .with_context(|| format!("Failed to read curriculum file {}", path))?;
                serde_json::from_str::<Vec<Curriculum>>(&raw)
                    .with_context(|| format!("Failed to parse curriculum file {}", path))?
            }
            None => builtin_catalog(),
        };

        let mut catalog = BTreeMap::new();
        for curriculum in curricula {
            anyhow::ensure!(
                !curriculum.chapters.is_empty(),
                "Curriculum {} has no chapters",
                curriculum.language_id
            );
            catalog.insert(curriculum.language_id.clone(), curriculum);
        }
        anyhow::ensure!(!catalog.is_empty(), "Curriculum catalog is empty");

        tracing::info!(languages = catalog.len(), "Curriculum catalog loaded");
        Ok(Self { catalog })
    }

    pub fn list_languages(&self) -> Vec<LanguageSummary> {
        self.catalog
            .values()
            .map(|c| LanguageSummary {
                language_id: c.language_id.clone(),
                language_name: c.language_name.clone(),
                chapter_count: c.chapters.len(),
                lesson_count: c.chapters.iter().map(|ch| ch.lessons.len()).sum(),
            })
            .collect()
    }

    pub fn get(&self, language_id: &str) -> Result<&Curriculum, ApiError> {
        self.catalog
            .get(language_id)
            .ok_or_else(|| ApiError::not_found(format!("Unknown language: {}", language_id)))
    }

    pub fn chapter(&self, language_id: &str, chapter_id: u32) -> Result<&Chapter, ApiError> {
        self.get(language_id)?
            .chapters
            .iter()
            .find(|c| c.id == chapter_id)
            .ok_or_else(|| {
                ApiError::not_found(format!(
                    "Unknown chapter {} for language {}",
                    chapter_id, language_id
                ))
            })
    }

    pub fn lesson(
        &self,
        language_id: &str,
        lesson_id: &str,
    ) -> Result<(&Chapter, &Lesson), ApiError> {
        self.get(language_id)?
            .chapters
            .iter()
            .find_map(|c| {
                c.lessons
                    .iter()
                    .find(|l| l.id == lesson_id)
                    .map(|l| (c, l))
            })
            .ok_or_else(|| {
                ApiError::not_found(format!(
                    "Unknown lesson {} for language {}",
                    lesson_id, language_id
                ))
            })
    }
}

/// Project a curriculum against a progress snapshot. Pure and read-only:
/// calling it never changes what it would return next time.
pub fn materialize(curriculum: &Curriculum, progress: &UserProgress) -> Vec<ChapterView> {
    let first_chapter = curriculum.chapters.first().map(|c| c.id);

    curriculum
        .chapters
        .iter()
        .map(|chapter| {
            let lessons: Vec<LessonView> = chapter
                .lessons
                .iter()
                .map(|lesson| lesson_view(lesson, chapter, progress))
                .collect();

            let completed_count = lessons.iter().filter(|l| l.completed).count();
            let progress_percentage = if lessons.is_empty() {
                0.0
            } else {
                completed_count as f64 / lessons.len() as f64 * 100.0
            };

            // The first chapter is always open, whatever the unlock list says.
            let locked = Some(chapter.id) != first_chapter
                && !progress.is_chapter_unlocked(chapter.id);

            ChapterView {
                id: chapter.id,
                title: chapter.title.clone(),
                description: chapter.description.clone(),
                level: chapter.level,
                completed: progress.is_chapter_completed(chapter.id),
                locked,
                progress_percentage,
                lessons,
            }
        })
        .collect()
}

fn lesson_view(lesson: &Lesson, chapter: &Chapter, progress: &UserProgress) -> LessonView {
    // A chapter-test lesson renders completed exactly when its chapter is
    // completed; it has no entry in completed_lessons.
    let (completed, score, earned_xp) = match lesson.kind {
        LessonKind::ChapterTest => (progress.is_chapter_completed(chapter.id), 0, 0),
        LessonKind::Vocabulary => match progress.completed_lessons.get(&lesson.id) {
            Some(c) => (true, c.score, c.xp_earned),
            None => (false, 0, 0),
        },
    };

    LessonView {
        id: lesson.id.clone(),
        title: lesson.title.clone(),
        kind: lesson.kind,
        duration_minutes: lesson.duration_minutes,
        xp: lesson.xp,
        word_count: lesson.words.len(),
        completed,
        score,
        earned_xp,
    }
}

/// Vocabulary lessons in the chapter the user has not completed yet, in
/// curriculum order.
pub fn missing_prerequisites(chapter: &Chapter, progress: &UserProgress) -> Vec<String> {
    chapter
        .lessons
        .iter()
        .filter(|l| l.kind == LessonKind::Vocabulary)
        .filter(|l| !progress.completed_lessons.contains_key(&l.id))
        .map(|l| l.id.clone())
        .collect()
}

/// Gate for starting a chapter test: every vocabulary lesson in the chapter
/// must be completed first.
pub fn ensure_test_available(chapter: &Chapter, progress: &UserProgress) -> Result<(), ApiError> {
    let missing = missing_prerequisites(chapter, progress);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::PrerequisiteNotMet {
            missing_lessons: missing,
        })
    }
}

fn word(word: &str, translation: &str, phonetic: Option<&str>) -> WordPair {
    WordPair {
        word: word.to_string(),
        translation: translation.to_string(),
        phonetic: phonetic.map(str::to_string),
    }
}

fn vocabulary_lesson(id: &str, title: &str, xp: u32, words: Vec<WordPair>) -> Lesson {
    Lesson {
        id: id.to_string(),
        title: title.to_string(),
        kind: LessonKind::Vocabulary,
        duration_minutes: 5,
        xp,
        words,
    }
}

fn test_lesson(id: &str, title: &str) -> Lesson {
    Lesson {
        id: id.to_string(),
        title: title.to_string(),
        kind: LessonKind::ChapterTest,
        duration_minutes: 10,
        // Test XP is awarded by the ledger on passing, not per lesson.
        xp: 0,
        words: Vec::new(),
    }
}

/// Built-in catalog for deployments without an external curriculum file.
/// Prompts and translations are for French-speaking learners.
fn builtin_catalog() -> Vec<Curriculum> {
    vec![
        Curriculum {
            language_id: "en".to_string(),
            language_name: "Anglais".to_string(),
            chapters: vec![
                Chapter {
                    id: 1,
                    title: "Les bases".to_string(),
                    description: "Salutations et premiers mots".to_string(),
                    level: 1,
                    lessons: vec![
                        vocabulary_lesson(
                            "lesson_1_1",
                            "Salutations",
                            50,
                            vec![
                                word("Hello", "Bonjour", Some("heh-LOH")),
                                word("Goodbye", "Au revoir", Some("good-BYE")),
                                word("Please", "S'il vous plaît", Some("pleez")),
                                word("Thank you", "Merci", Some("thank-YOO")),
                                word("Yes", "Oui", None),
                                word("No", "Non", None),
                            ],
                        ),
                        vocabulary_lesson(
                            "lesson_1_2",
                            "Les nombres",
                            50,
                            vec![
                                word("One", "Un", Some("wun")),
                                word("Two", "Deux", Some("too")),
                                word("Three", "Trois", Some("three")),
                                word("Four", "Quatre", Some("for")),
                                word("Five", "Cinq", Some("fyve")),
                            ],
                        ),
                        test_lesson("lesson_1_test", "Test du chapitre 1"),
                    ],
                },
                Chapter {
                    id: 2,
                    title: "La nourriture".to_string(),
                    description: "Manger et boire".to_string(),
                    level: 1,
                    lessons: vec![
                        vocabulary_lesson(
                            "lesson_2_1",
                            "Au restaurant",
                            60,
                            vec![
                                word("Bread", "Pain", Some("bred")),
                                word("Water", "Eau", Some("WAH-ter")),
                                word("Coffee", "Café", Some("KAW-fee")),
                                word("Milk", "Lait", Some("milk")),
                                word("Apple", "Pomme", Some("AP-pl")),
                            ],
                        ),
                        vocabulary_lesson(
                            "lesson_2_2",
                            "Les repas",
                            60,
                            vec![
                                word("Breakfast", "Petit déjeuner", Some("BREK-fust")),
                                word("Lunch", "Déjeuner", Some("lunch")),
                                word("Dinner", "Dîner", Some("DIN-ner")),
                                word("Meal", "Repas", Some("meel")),
                            ],
                        ),
                        test_lesson("lesson_2_test", "Test du chapitre 2"),
                    ],
                },
            ],
        },
        Curriculum {
            language_id: "es".to_string(),
            language_name: "Espagnol".to_string(),
            chapters: vec![Chapter {
                id: 1,
                title: "Los saludos".to_string(),
                description: "Salutations en espagnol".to_string(),
                level: 1,
                lessons: vec![
                    vocabulary_lesson(
                        "lesson_1_1",
                        "Salutations",
                        50,
                        vec![
                            word("Hola", "Bonjour", Some("OH-lah")),
                            word("Adiós", "Au revoir", Some("ah-DYOHS")),
                            word("Gracias", "Merci", Some("GRAH-syahs")),
                            word("Por favor", "S'il vous plaît", Some("por fah-BOR")),
                        ],
                    ),
                    test_lesson("lesson_1_test", "Test du chapitre 1"),
                ],
            }],
        },
    ]
}
