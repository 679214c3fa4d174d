use crate::models::{Book, BookId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyGoal {
    pub id: BookId,
    pub title: String,
    pub start_page: u32,
    pub end_page: u32,
    pub pages_to_read: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalPolicy {
    /// Days granted to a book that has no target date.
    pub undated_window_days: u32,
}

impl Default for GoalPolicy {
    fn default() -> Self {
        Self {
            undated_window_days: 1,
        }
    }
}

pub fn compute_goals<'a>(books: impl IntoIterator<Item = &'a Book>, today: NaiveDate) -> Vec<DailyGoal> {
    compute_goals_with(books, today, &GoalPolicy::default())
}

pub fn compute_goals_with<'a>(
    books: impl IntoIterator<Item = &'a Book>,
    today: NaiveDate,
    policy: &GoalPolicy,
) -> Vec<DailyGoal> {
    books
        .into_iter()
        .filter(|book| book.is_active())
        .filter_map(|book| goal_for(book, today, policy))
        .collect()
}

fn goal_for(book: &Book, today: NaiveDate, policy: &GoalPolicy) -> Option<DailyGoal> {
    let current = book.current_page.unwrap_or(0);
    let total = book.total_pages.unwrap_or(0);
    let unread = total.saturating_sub(current);
    if unread == 0 {
        return None;
    }

    let days_remaining = match book.target_date {
        Some(target) => (target - today).num_days(),
        None => i64::from(policy.undated_window_days),
    };
    let pages = daily_goal_pages(unread, days_remaining);
    let end_page = current.saturating_add(pages).min(total);

    Some(DailyGoal {
        id: book.id,
        title: book.title.clone(),
        start_page: current,
        end_page,
        pages_to_read: end_page - current,
    })
}

/// `floor(unread / days)` clamped to `1..=unread`; overdue or same-day
/// deadlines count as a single day.
pub fn daily_goal_pages(unread: u32, days_remaining: i64) -> u32 {
    if unread == 0 {
        return 0;
    }
    let days = u64::try_from(days_remaining.max(1)).unwrap_or(1);
    let pages = u64::from(unread) / days;
    u32::try_from(pages).unwrap_or(unread).clamp(1, unread)
}
