use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, store::SchoolStore};

pub type DynStore = Arc<dyn SchoolStore>;

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub config: Config,
}

impl FromRef<AppState> for DynStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
