use crate::goals::DailyGoal;
use crate::leaderboard::LeaderboardPeriod;
use crate::progress::DailyProgress;
use crate::timekeeping::{TimeLedger, TimeStats};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type UserId = u64;
pub type BookId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    #[default]
    OnShelf,
    Active,
    Completed,
}

/// A book as handed over by the shelf store. Only the fields the goal
/// calculator and statistics need are kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: BookStatus,
}

impl Book {
    pub fn is_active(&self) -> bool {
        self.status == BookStatus::Active
    }

    pub fn is_finished(&self) -> bool {
        match (self.total_pages, self.current_page) {
            (Some(total), Some(current)) => total > 0 && current >= total,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UserData {
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub progress: Option<DailyProgress>,
    #[serde(default)]
    pub time: TimeLedger,
}

impl UserData {
    pub fn active_books(&self) -> impl Iterator<Item = &Book> {
        self.books.iter().filter(|book| book.is_active())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub users: BTreeMap<UserId, UserData>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub index: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub completed: bool,
    pub completed_count: usize,
    pub goal_count: usize,
    pub completion_percentage: u8,
    pub current_strike: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodayGoalsResponse {
    pub date: NaiveDate,
    pub goals: Vec<DailyGoal>,
    pub progress: DailyProgress,
    pub completion_percentage: u8,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceBooksRequest {
    pub books: Vec<Book>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BooksResponse {
    pub books: Vec<Book>,
}

#[derive(Debug, Deserialize)]
pub struct TrackTimeRequest {
    pub minutes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackTimeResponse {
    pub success: bool,
    pub stats: TimeStats,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub period: LeaderboardPeriod,
    pub limit: Option<usize>,
    pub user_id: Option<UserId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RankQuery {
    #[serde(default)]
    pub period: LeaderboardPeriod,
}
