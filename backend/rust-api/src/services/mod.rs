use crate::config::Config;
use crate::services::curriculum_service::CurriculumService;
use crate::services::quiz_service::QuizService;
use crate::services::store::ProgressStore;
use crate::services::translation_service::TranslationService;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ProgressStore>,
    pub curriculum: CurriculumService,
    pub quizzes: QuizService,
    pub translator: TranslationService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ProgressStore>) -> anyhow::Result<Self> {
        let curriculum = CurriculumService::load(config.curriculum_path.as_deref())?;
        let quizzes = QuizService::new(config.quiz_time_limit_seconds);
        let translator = TranslationService::new(&config)?;

        Ok(Self {
            config,
            store,
            curriculum,
            quizzes,
            translator,
        })
    }
}

pub mod curriculum_service;
pub mod leveling;
pub mod progress_service;
pub mod quiz_service;
pub mod store;
pub mod translation_service;
