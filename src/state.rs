use std::sync::Arc;

use crate::{config::Config, store::LearnifyStore};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LearnifyStore>,
    pub config: Config,
}

impl FromRef<AppState> for Arc<dyn LearnifyStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
