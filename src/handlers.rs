use crate::errors::AppError;
use crate::leaderboard::{Leaderboard, UserRank};
use crate::models::{
    Book, BookId, BooksResponse, LeaderboardQuery, RankQuery, ReplaceBooksRequest,
    TodayGoalsResponse, ToggleRequest, ToggleResponse, TrackTimeRequest, TrackTimeResponse,
    UserId,
};
use crate::state::AppState;
use crate::stats::ReadingStatistics;
use crate::tracker::SweepReport;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "date": state.tracker.clock().today(),
    }))
}

pub async fn get_today_goals(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<TodayGoalsResponse>, AppError> {
    let today = state.tracker.today_goals(user_id).await?;
    Ok(Json(today))
}

pub async fn toggle(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, AppError> {
    let response = state.tracker.toggle(user_id, payload.index).await?;
    Ok(Json(response))
}

pub async fn sweep(State(state): State<AppState>) -> Json<SweepReport> {
    Json(state.tracker.sweep().await)
}

pub async fn replace_books(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(payload): Json<ReplaceBooksRequest>,
) -> Result<Json<BooksResponse>, AppError> {
    let books = state.tracker.replace_books(user_id, payload.books).await?;
    Ok(Json(BooksResponse { books }))
}

pub async fn complete_book(
    State(state): State<AppState>,
    Path((user_id, book_id)): Path<(UserId, BookId)>,
) -> Result<Json<Book>, AppError> {
    let book = state.tracker.complete_book(user_id, book_id).await?;
    Ok(Json(book))
}

pub async fn track_time(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(payload): Json<TrackTimeRequest>,
) -> Result<Json<TrackTimeResponse>, AppError> {
    let stats = state.tracker.track_time(user_id, payload.minutes).await?;
    Ok(Json(TrackTimeResponse {
        success: true,
        stats,
    }))
}

pub async fn statistics(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<ReadingStatistics>, AppError> {
    let stats = state.tracker.statistics(user_id).await?;
    Ok(Json(stats))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<Leaderboard> {
    Json(
        state
            .tracker
            .leaderboard(query.period, query.limit, query.user_id)
            .await,
    )
}

pub async fn user_rank(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<RankQuery>,
) -> Result<Json<UserRank>, AppError> {
    let rank = state.tracker.user_rank(user_id, query.period).await?;
    Ok(Json(rank))
}
