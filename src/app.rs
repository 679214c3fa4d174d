use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/sweep", post(handlers::sweep))
        .route("/api/leaderboard", get(handlers::leaderboard))
        .route("/api/users/:user_id/goals", get(handlers::get_today_goals))
        .route("/api/users/:user_id/toggle", post(handlers::toggle))
        .route("/api/users/:user_id/books", put(handlers::replace_books))
        .route(
            "/api/users/:user_id/books/:book_id/complete",
            post(handlers::complete_book),
        )
        .route("/api/users/:user_id/track-time", post(handlers::track_time))
        .route("/api/users/:user_id/statistics", get(handlers::statistics))
        .route("/api/users/:user_id/rank", get(handlers::user_rank))
        .with_state(state)
}
