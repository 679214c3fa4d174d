use crate::clock::Clock;
use crate::errors::TrackerError;
use crate::goals::{compute_goals_with, DailyGoal, GoalPolicy};
use crate::leaderboard::{build_leaderboard, rank_of, Leaderboard, LeaderboardPeriod, UserRank};
use crate::models::{Book, BookId, BookStatus, TodayGoalsResponse, ToggleResponse, UserData, UserId};
use crate::progress::{ensure_today, ChecklistMatching, GoalSet, Reconciliation};
use crate::stats::{build_reading_stats, ReadingStatistics};
use crate::storage::Store;
use crate::streak::{self, Evaluation};
use crate::timekeeping::TimeStats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct TrackerSettings {
    pub checklist_matching: ChecklistMatching,
    pub goal_policy: GoalPolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SweepReport {
    pub date: NaiveDate,
    pub examined: usize,
    pub evaluated: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct Tracker {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    settings: TrackerSettings,
}

impl Tracker {
    pub fn new(store: Arc<Store>, clock: Arc<dyn Clock>, settings: TrackerSettings) -> Self {
        Self {
            store,
            clock,
            settings,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub async fn today_goals(&self, user_id: UserId) -> Result<TodayGoalsResponse, TrackerError> {
        let today = self.clock.today();
        let settings = self.settings;
        self.store
            .update_user(user_id, |user| {
                let goals = reconcile_user(user, user_id, today, &settings);
                let Some(progress) = user.progress.clone() else {
                    return Err(TrackerError::RecordNotFound(user_id));
                };
                Ok(TodayGoalsResponse {
                    date: today,
                    completion_percentage: progress.completion_percentage(),
                    goals,
                    progress,
                })
            })
            .await
    }

    /// Flips one checklist entry. A record left over from an earlier day is
    /// rolled over first, so ticks always land on today's goals.
    pub async fn toggle(&self, user_id: UserId, index: i64) -> Result<ToggleResponse, TrackerError> {
        let today = self.clock.today();
        let settings = self.settings;
        self.store
            .update_user(user_id, |user| {
                if user.progress.as_ref().is_some_and(|p| p.is_stale(today)) {
                    reconcile_user(user, user_id, today, &settings);
                }
                let record = user
                    .progress
                    .as_mut()
                    .ok_or(TrackerError::RecordNotFound(user_id))?;
                let completed = record.toggle(index)?;
                debug!(
                    user_id,
                    index,
                    completed,
                    completed_count = record.today_completed_count,
                    "toggled task"
                );
                Ok(ToggleResponse {
                    success: true,
                    completed,
                    completed_count: record.today_completed_count,
                    goal_count: record.today_goal_count,
                    completion_percentage: record.completion_percentage(),
                    current_strike: record.current_strike,
                })
            })
            .await
    }

    pub async fn sweep(&self) -> SweepReport {
        let today = self.clock.today();
        info!(%today, "starting daily sweep");

        let mut report = SweepReport {
            date: today,
            examined: 0,
            evaluated: 0,
            failed: 0,
        };
        for user_id in self.store.user_ids().await {
            report.examined += 1;
            let result = self
                .store
                .update_user(user_id, |user| {
                    Ok(match user.progress.as_mut() {
                        Some(record) if record.is_stale(today) => Some(streak::evaluate(record, today)),
                        _ => None,
                    })
                })
                .await;

            match result {
                Ok(Some(Evaluation::AlreadyEvaluated | Evaluation::NotDue)) | Ok(None) => {}
                Ok(Some(evaluation)) => {
                    report.evaluated += 1;
                    debug!(user_id, ?evaluation, "evaluated stale record");
                }
                Err(err) => {
                    report.failed += 1;
                    error!(user_id, error = %err, "sweep failed for user");
                }
            }
        }

        info!(
            %today,
            examined = report.examined,
            evaluated = report.evaluated,
            failed = report.failed,
            "daily sweep finished"
        );
        report
    }

    pub async fn replace_books(&self, user_id: UserId, books: Vec<Book>) -> Result<Vec<Book>, TrackerError> {
        let mut seen = HashSet::new();
        for book in &books {
            if !seen.insert(book.id) {
                return Err(TrackerError::Invalid(format!("duplicate book id {}", book.id)));
            }
            if book.title.trim().is_empty() {
                return Err(TrackerError::Invalid(format!("book {} has no title", book.id)));
            }
        }
        self.store
            .update_user(user_id, |user| {
                user.books = books;
                Ok(user.books.clone())
            })
            .await
    }

    pub async fn complete_book(&self, user_id: UserId, book_id: BookId) -> Result<Book, TrackerError> {
        self.store
            .update_user(user_id, |user| {
                if *user == UserData::default() {
                    return Err(TrackerError::UserNotFound(user_id));
                }
                let book = user
                    .books
                    .iter_mut()
                    .find(|book| book.id == book_id)
                    .ok_or(TrackerError::BookNotFound(book_id))?;
                book.status = BookStatus::Completed;
                book.current_page = book.total_pages;
                info!(user_id, book_id, "book marked completed");
                Ok(book.clone())
            })
            .await
    }

    pub async fn track_time(&self, user_id: UserId, minutes: i64) -> Result<TimeStats, TrackerError> {
        let minutes = u64::try_from(minutes)
            .map_err(|_| TrackerError::Invalid("minutes must not be negative".to_string()))?;
        let today = self.clock.today();
        self.store
            .update_user(user_id, |user| {
                user.time.add_session_minutes(minutes, today);
                Ok(user.time.snapshot(today))
            })
            .await
    }

    pub async fn statistics(&self, user_id: UserId) -> Result<ReadingStatistics, TrackerError> {
        let today = self.clock.today();
        if self.store.read_user(user_id, |_| ()).await.is_none() {
            let mut empty = UserData::default();
            return Ok(build_reading_stats(&[], None, empty.time.snapshot(today)));
        }
        self.store
            .update_user(user_id, |user| {
                let time = user.time.snapshot(today);
                Ok(build_reading_stats(&user.books, user.progress.as_ref(), time))
            })
            .await
    }

    pub async fn leaderboard(
        &self,
        period: LeaderboardPeriod,
        size: Option<usize>,
        current_user: Option<UserId>,
    ) -> Leaderboard {
        let minutes = self.minutes_by_user(period).await;
        build_leaderboard(period, minutes, size.unwrap_or(period.default_size()), current_user)
    }

    pub async fn user_rank(&self, user_id: UserId, period: LeaderboardPeriod) -> Result<UserRank, TrackerError> {
        let minutes = self.minutes_by_user(period).await;
        let total_minutes = minutes
            .iter()
            .find(|(id, _)| *id == user_id)
            .map(|(_, total)| *total)
            .ok_or(TrackerError::UserNotFound(user_id))?;
        Ok(UserRank {
            user_id,
            period,
            rank: rank_of(&minutes, user_id),
            total_minutes,
        })
    }

    async fn minutes_by_user(&self, period: LeaderboardPeriod) -> Vec<(UserId, u64)> {
        let today = self.clock.today();
        self.store
            .read_all(|data| {
                data.users
                    .iter()
                    .map(|(user_id, user)| (*user_id, user.time.minutes_as_of(today, period)))
                    .collect()
            })
            .await
    }
}

fn reconcile_user(
    user: &mut UserData,
    user_id: UserId,
    today: NaiveDate,
    settings: &TrackerSettings,
) -> Vec<DailyGoal> {
    let goals = compute_goals_with(user.active_books(), today, &settings.goal_policy);
    let set = GoalSet::from_goals(&goals);
    let (record, outcome) = ensure_today(&mut user.progress, today, &set, settings.checklist_matching);

    match outcome {
        Reconciliation::Created => {
            info!(user_id, %today, goal_count = set.len(), "created daily progress record")
        }
        Reconciliation::Rolled(evaluation) => info!(
            user_id,
            %today,
            ?evaluation,
            current_strike = record.current_strike,
            goal_count = set.len(),
            "rolled daily progress to a new day"
        ),
        Reconciliation::Resized => debug!(
            user_id,
            goal_count = set.len(),
            completed_count = record.today_completed_count,
            "goal set changed during the day"
        ),
        Reconciliation::Unchanged => {}
    }
    goals
}
