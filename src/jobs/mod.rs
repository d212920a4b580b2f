use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub fn public_router() -> Router<AppState> {
    handlers::public_routes()
}

pub fn dashboard_router() -> Router<AppState> {
    handlers::dashboard_routes()
}
