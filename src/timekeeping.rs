use crate::leaderboard::LeaderboardPeriod;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const YEARLY_RESET_MONTH: u32 = 12;
const YEARLY_RESET_DAY: u32 = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeLedger {
    pub total_minutes: u64,
    pub yearly_minutes: u64,
    pub daily_minutes: u64,
    pub last_daily_reset: Option<NaiveDate>,
    pub last_yearly_reset: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeStats {
    pub total_hours: u64,
    pub total_minutes: u64,
    pub yearly_hours: u64,
    pub yearly_minutes: u64,
    pub daily_hours: u64,
    pub daily_minutes: u64,
}

impl TimeLedger {
    pub fn add_session_minutes(&mut self, minutes: u64, today: NaiveDate) -> bool {
        if minutes == 0 {
            return false;
        }
        self.roll_over(today);
        self.daily_minutes = self.daily_minutes.saturating_add(minutes);
        true
    }

    pub fn snapshot(&mut self, today: NaiveDate) -> TimeStats {
        self.roll_over(today);
        TimeStats {
            total_hours: self.total_minutes / 60,
            total_minutes: self.total_minutes % 60,
            yearly_hours: self.yearly_minutes / 60,
            yearly_minutes: self.yearly_minutes % 60,
            daily_hours: self.daily_minutes / 60,
            daily_minutes: self.daily_minutes % 60,
        }
    }

    /// What the ledger would report for `period` once rolled over to `today`.
    pub fn minutes_as_of(&self, today: NaiveDate, period: LeaderboardPeriod) -> u64 {
        let mut ledger = self.clone();
        ledger.roll_over(today);
        match period {
            LeaderboardPeriod::Daily => ledger.daily_minutes,
            LeaderboardPeriod::Yearly => ledger.yearly_minutes,
        }
    }

    pub fn roll_over(&mut self, today: NaiveDate) {
        self.roll_daily(today);
        self.roll_yearly(today);
    }

    fn roll_daily(&mut self, today: NaiveDate) {
        match self.last_daily_reset {
            Some(last) if last == today => {}
            Some(_) => {
                self.yearly_minutes = self.yearly_minutes.saturating_add(self.daily_minutes);
                self.total_minutes = self.total_minutes.saturating_add(self.daily_minutes);
                self.daily_minutes = 0;
                self.last_daily_reset = Some(today);
            }
            None => self.last_daily_reset = Some(today),
        }
    }

    fn roll_yearly(&mut self, today: NaiveDate) {
        let Some(reset_day) = NaiveDate::from_ymd_opt(today.year(), YEARLY_RESET_MONTH, YEARLY_RESET_DAY)
        else {
            return;
        };
        match self.last_yearly_reset {
            Some(last) if today >= reset_day && last < reset_day => {
                self.yearly_minutes = 0;
                self.last_yearly_reset = Some(today);
            }
            Some(_) => {}
            None => self.last_yearly_reset = Some(today),
        }
    }
}
