use crate::models::Book;
use crate::progress::DailyProgress;
use crate::timekeeping::TimeStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingStatistics {
    pub total_books: usize,
    pub completed_books: usize,
    pub active_books: usize,
    pub unread_books: usize,
    pub incomplete_books: usize,
    pub total_pages_read: u64,
    pub total_pages_in_books: u64,
    pub average_pages_per_book: u64,
    pub completion_rate: f64,
    pub completed_percentage: f64,
    pub active_percentage: f64,
    pub unread_percentage: f64,
    pub incomplete_percentage: f64,
    pub current_streak: u32,
    pub highest_streak: u32,
    pub total_goals_attempted: u64,
    pub total_goals_completed: u64,
    pub average_daily_reading_minutes: u64,
    pub time: TimeStats,
}

pub fn build_reading_stats(
    books: &[Book],
    progress: Option<&DailyProgress>,
    time: TimeStats,
) -> ReadingStatistics {
    let total_books = books.len();
    let completed_books = books.iter().filter(|book| book.is_finished()).count();
    let active_books = books.iter().filter(|book| book.is_active()).count();
    let unread_books = books
        .iter()
        .filter(|book| book.current_page.unwrap_or(0) == 0)
        .count();
    // neither finished nor being read
    let incomplete_books = books
        .iter()
        .filter(|book| !book.is_finished() && !book.is_active())
        .count();

    let total_pages_read = books
        .iter()
        .map(|book| u64::from(book.current_page.unwrap_or(0)))
        .sum();
    let total_pages_in_books: u64 = books
        .iter()
        .map(|book| u64::from(book.total_pages.unwrap_or(0)))
        .sum();
    let sized_books = books
        .iter()
        .filter(|book| book.total_pages.unwrap_or(0) > 0)
        .count() as u64;
    let average_pages_per_book = if sized_books == 0 {
        0
    } else {
        total_pages_in_books / sized_books
    };

    let completion_rate = percentage(completed_books, total_books);

    ReadingStatistics {
        total_books,
        completed_books,
        active_books,
        unread_books,
        incomplete_books,
        total_pages_read,
        total_pages_in_books,
        average_pages_per_book,
        completion_rate,
        completed_percentage: completion_rate,
        active_percentage: percentage(active_books, total_books),
        unread_percentage: percentage(unread_books, total_books),
        incomplete_percentage: percentage(incomplete_books, total_books),
        current_streak: progress.map_or(0, |p| p.current_strike),
        highest_streak: progress.map_or(0, |p| p.highest_strike),
        total_goals_attempted: progress.map_or(0, |p| p.total_goals_attempted),
        total_goals_completed: progress.map_or(0, |p| p.total_goals_completed),
        average_daily_reading_minutes: time.daily_hours * 60 + time.daily_minutes,
        time,
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let raw = part as f64 / whole as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
