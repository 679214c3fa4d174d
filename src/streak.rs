use crate::progress::DailyProgress;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    AlreadyEvaluated,
    NotDue,
    Extended { current_strike: u32 },
    Broken,
    NoGoals,
    /// A whole calendar day passed without the goals being refreshed while
    /// a streak was running.
    Lapsed,
    Unchanged,
}

/// Folds the record's day into the streak and lifetime totals at most once,
/// then stamps `last_evaluated_date = today`.
pub fn evaluate(record: &mut DailyProgress, today: NaiveDate) -> Evaluation {
    if record.last_evaluated_date == Some(today) {
        return Evaluation::AlreadyEvaluated;
    }
    if record.today_date >= today {
        return Evaluation::NotDue;
    }

    let mut outcome = if day_folded(record) {
        Evaluation::Unchanged
    } else {
        fold_day(record)
    };

    let skipped_days = (today - record.today_date).num_days() - 1;
    if skipped_days > 0 && record.today_goal_count > 0 && record.current_strike > 0 {
        record.current_strike = 0;
        outcome = Evaluation::Lapsed;
    }

    record.last_evaluated_date = Some(today);
    outcome
}

fn day_folded(record: &DailyProgress) -> bool {
    record
        .last_evaluated_date
        .is_some_and(|evaluated| evaluated > record.today_date)
}

fn fold_day(record: &mut DailyProgress) -> Evaluation {
    if record.today_goal_count == 0 {
        return Evaluation::NoGoals;
    }

    record.total_goals_attempted += record.today_goal_count as u64;
    record.total_goals_completed += record.today_completed_count as u64;

    if record.today_completed_count == record.today_goal_count {
        record.current_strike += 1;
        record.highest_strike = record.highest_strike.max(record.current_strike);
        Evaluation::Extended {
            current_strike: record.current_strike,
        }
    } else {
        record.current_strike = 0;
        Evaluation::Broken
    }
}
