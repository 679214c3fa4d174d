use crate::errors::TrackerError;
use crate::goals::DailyGoal;
use crate::models::BookId;
use crate::streak::{self, Evaluation};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistMatching {
    #[default]
    BookId,
    // a removed middle goal shifts completion onto the next book
    Position,
}

impl FromStr for ChecklistMatching {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "book_id" | "book" | "id" => Ok(Self::BookId),
            "position" | "index" => Ok(Self::Position),
            other => Err(format!("expected 'book_id' or 'position', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalSet {
    pub ids: Vec<BookId>,
    pub names: Vec<String>,
}

impl GoalSet {
    pub fn from_goals(goals: &[DailyGoal]) -> Self {
        Self {
            ids: goals.iter().map(|goal| goal.id).collect(),
            names: goals.iter().map(|goal| goal.title.clone()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyProgress {
    pub today_date: NaiveDate,
    pub today_goal_count: usize,
    pub today_completed_count: usize,
    pub today_tasks: Vec<bool>,
    pub today_goal_names: Vec<String>,
    #[serde(default)]
    pub today_goal_ids: Vec<BookId>,
    pub last_evaluated_date: Option<NaiveDate>,
    pub current_strike: u32,
    pub highest_strike: u32,
    pub total_goals_completed: u64,
    pub total_goals_attempted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Created,
    Rolled(Evaluation),
    Resized,
    Unchanged,
}

pub fn ensure_today<'a>(
    slot: &'a mut Option<DailyProgress>,
    today: NaiveDate,
    goals: &GoalSet,
    matching: ChecklistMatching,
) -> (&'a mut DailyProgress, Reconciliation) {
    let outcome = match slot {
        Some(record) => record.reconcile(today, goals, matching),
        None => Reconciliation::Created,
    };
    let record = slot.get_or_insert_with(|| DailyProgress::new(today, goals));
    (record, outcome)
}

impl DailyProgress {
    pub fn new(today: NaiveDate, goals: &GoalSet) -> Self {
        Self {
            today_date: today,
            today_goal_count: goals.len(),
            today_completed_count: 0,
            today_tasks: vec![false; goals.len()],
            today_goal_names: goals.names.clone(),
            today_goal_ids: goals.ids.clone(),
            last_evaluated_date: None,
            current_strike: 0,
            highest_strike: 0,
            total_goals_completed: 0,
            total_goals_attempted: 0,
        }
    }

    pub fn reconcile(
        &mut self,
        today: NaiveDate,
        goals: &GoalSet,
        matching: ChecklistMatching,
    ) -> Reconciliation {
        match self.today_date.cmp(&today) {
            Ordering::Less => {
                let evaluation = streak::evaluate(self, today);
                self.start_day(today, goals);
                return Reconciliation::Rolled(evaluation);
            }
            // clock moved backwards; keep the checklist and pull the date in
            Ordering::Greater => self.today_date = today,
            Ordering::Equal => {}
        }

        if self.matches(goals, matching) {
            Reconciliation::Unchanged
        } else {
            self.resize(goals, matching);
            Reconciliation::Resized
        }
    }

    pub fn toggle(&mut self, index: i64) -> Result<bool, TrackerError> {
        let len = self.today_tasks.len();
        let slot = usize::try_from(index)
            .ok()
            .filter(|i| *i < len)
            .ok_or(TrackerError::InvalidIndex { index, len })?;
        let completed = !self.today_tasks[slot];
        self.today_tasks[slot] = completed;
        self.recount();
        Ok(completed)
    }

    pub fn completion_percentage(&self) -> u8 {
        if self.today_goal_count == 0 {
            return 0;
        }
        let percent = self.today_completed_count.min(self.today_goal_count) * 100 / self.today_goal_count;
        u8::try_from(percent).unwrap_or(100)
    }

    pub fn is_stale(&self, today: NaiveDate) -> bool {
        self.today_date < today
    }

    fn matches(&self, goals: &GoalSet, matching: ChecklistMatching) -> bool {
        match matching {
            ChecklistMatching::Position => self.today_goal_count == goals.len(),
            ChecklistMatching::BookId => {
                self.today_goal_count == goals.len() && self.today_goal_ids == goals.ids
            }
        }
    }

    fn start_day(&mut self, today: NaiveDate, goals: &GoalSet) {
        self.today_date = today;
        self.today_goal_count = goals.len();
        self.today_completed_count = 0;
        self.today_tasks = vec![false; goals.len()];
        self.today_goal_names = goals.names.clone();
        self.today_goal_ids = goals.ids.clone();
    }

    fn resize(&mut self, goals: &GoalSet, matching: ChecklistMatching) {
        // records written before ids were tracked can only be matched by slot
        let keyed = matching == ChecklistMatching::BookId
            && self.today_goal_ids.len() == self.today_tasks.len();

        self.today_tasks = if keyed {
            goals
                .ids
                .iter()
                .map(|id| {
                    self.today_goal_ids
                        .iter()
                        .zip(&self.today_tasks)
                        .find(|(old, _)| *old == id)
                        .is_some_and(|(_, done)| *done)
                })
                .collect()
        } else {
            (0..goals.len())
                .map(|i| self.today_tasks.get(i).copied().unwrap_or(false))
                .collect()
        };
        self.today_goal_count = goals.len();
        self.today_goal_names = goals.names.clone();
        self.today_goal_ids = goals.ids.clone();
        self.recount();
    }

    fn recount(&mut self) {
        self.today_completed_count = self.today_tasks.iter().filter(|done| **done).count();
    }
}
