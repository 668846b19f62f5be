// src/state.rs

use axum::extract::FromRef;

use crate::{config::Config, repository::SharedRepository};

#[derive(Clone)]
pub struct AppState {
    pub repo: SharedRepository,
    pub config: Config,
}

impl FromRef<AppState> for SharedRepository {
    fn from_ref(state: &AppState) -> Self {
        state.repo.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
