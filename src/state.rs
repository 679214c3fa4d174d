use crate::tracker::Tracker;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Tracker,
}

impl AppState {
    pub fn new(tracker: Tracker) -> Self {
        Self { tracker }
    }
}
