use crate::tracker::Tracker;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

pub struct SweepScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SweepScheduler {
    pub fn start(tracker: Tracker, at: NaiveTime) -> Self {
        let (shutdown, mut stop) = watch::channel(false);
        let handle = tokio::spawn(async move {
            info!(%at, "sweep scheduler started");
            loop {
                let now = tracker.clock().now();
                let next = next_run_after(now, at);
                let wait = (next - now).to_std().unwrap_or(std::time::Duration::ZERO);
                debug!(%next, "next sweep scheduled");

                tokio::select! {
                    _ = time::sleep(wait) => {
                        // waits are measured on the naive local clock, so a DST
                        // change can end one an hour early; plan again instead
                        if tracker.clock().now() < next {
                            debug!(%next, "woke before the sweep time");
                            continue;
                        }
                        tracker.sweep().await;
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("sweep scheduler stopped");
        });

        Self { shutdown, handle }
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.handle.await {
            warn!(error = %err, "sweep scheduler task ended abnormally");
        }
    }
}

/// The first occurrence of `at` strictly after `now`.
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today_run = now.date().and_time(at);
    if today_run > now {
        today_run
    } else {
        (now.date() + Duration::days(1)).and_time(at)
    }
}
