//! Authentication API: login, logout, current session

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::rate_limit::login_rate_limit;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().nest("/api/auth", routes(state))
}

fn routes(state: &AppState) -> Router<AppState> {
    let login = Router::new()
        .route("/login", post(handler::login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    let session = Router::new()
        .route("/logout", post(handler::logout))
        .route("/me", get(handler::me));

    login.merge(session)
}
