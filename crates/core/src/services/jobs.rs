//! Background event completion sweep.
//!
//! Active events whose last occurrence has ended are flipped to `completed`
//! and their open registrations settled, all in one transaction per run.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use volunteer_common::AppResult;
use volunteer_db::repositories::{EventRepository, RegistrationRepository};

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub events_completed: u64,
    pub registrations_attended: u64,
    pub registrations_no_show: u64,
}

/// Completes ended events.
#[derive(Clone)]
pub struct EventSweeper {
    db: Arc<DatabaseConnection>,
    event_repo: EventRepository,
}

impl EventSweeper {
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            event_repo: EventRepository::new(Arc::clone(&db)),
            db,
        }
    }

    /// Run one sweep against `now`.
    pub async fn run_once(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let ended = self.event_repo.find_ended_active(now).await?;
        if ended.is_empty() {
            return Ok(SweepReport::default());
        }
        let ids: Vec<String> = ended.into_iter().map(|e| e.id).collect();

        let txn = volunteer_db::begin(&self.db).await?;
        let events_completed = EventRepository::complete_in(&txn, &ids).await?;
        let (registrations_attended, registrations_no_show) =
            RegistrationRepository::settle_for_events_in(&txn, &ids).await?;
        volunteer_db::commit(txn).await?;

        Ok(SweepReport {
            events_completed,
            registrations_attended,
            registrations_no_show,
        })
    }
}

/// Spawn the periodic sweep. The first run happens immediately.
pub fn spawn_scheduler(sweeper: EventSweeper, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match sweeper.run_once(Utc::now()).await {
                Ok(report) if report.events_completed > 0 => {
                    info!(
                        events = report.events_completed,
                        attended = report.registrations_attended,
                        no_show = report.registrations_no_show,
                        "Completed ended events"
                    );
                }
                Ok(_) => debug!("No ended events to complete"),
                Err(e) => warn!(error = %e, "Event completion sweep failed"),
            }
        }
    })
}
