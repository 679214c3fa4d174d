use crate::models::UserId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DAILY_LEADERBOARD_SIZE: usize = 6;
pub const YEARLY_LEADERBOARD_SIZE: usize = 10;
const MAX_LEADERBOARD_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardPeriod {
    #[default]
    Daily,
    Yearly,
}

impl LeaderboardPeriod {
    pub fn default_size(self) -> usize {
        match self {
            Self::Daily => DAILY_LEADERBOARD_SIZE,
            Self::Yearly => YEARLY_LEADERBOARD_SIZE,
        }
    }
}

impl FromStr for LeaderboardPeriod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "yearly" | "year" => Ok(Self::Yearly),
            other => Err(format!("expected 'daily' or 'yearly', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: UserId,
    pub hours: u64,
    pub minutes: u64,
    pub total_minutes: u64,
    pub is_current_user: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Leaderboard {
    pub period: LeaderboardPeriod,
    pub entries: Vec<LeaderboardEntry>,
    pub user_rank: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRank {
    pub user_id: UserId,
    pub period: LeaderboardPeriod,
    pub rank: Option<usize>,
    pub total_minutes: u64,
}

/// Top `size` users by minutes, most first; ties go to the lower user id.
pub fn build_leaderboard(
    period: LeaderboardPeriod,
    mut minutes: Vec<(UserId, u64)>,
    size: usize,
    current_user: Option<UserId>,
) -> Leaderboard {
    minutes.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let user_rank = current_user.and_then(|user_id| rank_of(&minutes, user_id));
    let entries = minutes
        .iter()
        .take(size.clamp(1, MAX_LEADERBOARD_SIZE))
        .enumerate()
        .map(|(index, &(user_id, total))| LeaderboardEntry {
            rank: index + 1,
            user_id,
            hours: total / 60,
            minutes: total % 60,
            total_minutes: total,
            is_current_user: current_user == Some(user_id),
        })
        .collect();

    Leaderboard {
        period,
        entries,
        user_rank,
    }
}

/// One plus the number of users with strictly more minutes.
pub fn rank_of(minutes: &[(UserId, u64)], user_id: UserId) -> Option<usize> {
    let (_, own) = minutes.iter().find(|(id, _)| *id == user_id)?;
    Some(minutes.iter().filter(|(_, other)| other > own).count() + 1)
}
