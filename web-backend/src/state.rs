use std::sync::Arc;
use std::time::Duration;

use snipaudit_core::{Augmenter, HeuristicScanner, LlmAugmenter, SessionStore};
use tokio::sync::Mutex;

use crate::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<HeuristicScanner>,
    pub augmenter: Arc<dyn Augmenter>,
    pub store: Arc<Mutex<SessionStore>>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let scanner = Arc::new(HeuristicScanner::new());

        let augmenter: Arc<dyn Augmenter> = Arc::new(LlmAugmenter::with_timeout(
            settings.llm_endpoint.clone(),
            settings.llm_model.clone(),
            Duration::from_secs(settings.llm_timeout_secs),
        ));

        let store = Arc::new(Mutex::new(SessionStore::new(
            settings.entries_path.clone(),
            settings.logs_path.clone(),
        )));

        Self {
            scanner,
            augmenter,
            store,
            settings,
        }
    }
}
