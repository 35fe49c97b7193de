use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod edit_scope;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
