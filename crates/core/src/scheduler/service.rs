//! Timer service that fires job callbacks on their weekly schedules

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::schedule::Schedule;

/// Callback invoked with the job id when a schedule fires
pub type JobCallback = Arc<dyn Fn(i64) + Send + Sync>;

/// Scheduler errors
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The tokio runtime could not be built
    #[error("Unable to start scheduler runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// The job already has a schedule
    #[error("{0} is already scheduled")]
    AlreadyScheduled(ScheduleKey),

    /// Waiting for the shutdown signal failed
    #[error("Unable to listen for shutdown signal: {0}")]
    Signal(String),
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Identifier of a scheduled job, displayed as `job_{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduleKey(i64);

impl ScheduleKey {
    pub fn for_job(job_id: i64) -> Self {
        ScheduleKey(job_id)
    }

    pub fn job_id(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ScheduleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job_{}", self.0)
    }
}

struct Entry {
    schedule: Schedule,
    callback: JobCallback,
    task: Option<JoinHandle<()>>,
}

/// Fires registered callbacks at their scheduled times
///
/// The scheduler owns its runtime: nothing fires until [`start`](Self::start)
/// and [`stop`](Self::stop) cancels every pending timer. Schedules can be
/// registered in either state.
#[derive(Default)]
pub struct JobScheduler {
    runtime: Option<Runtime>,
    entries: HashMap<ScheduleKey, Entry>,
}

impl JobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the timers; returns false if already running
    pub fn start(&mut self) -> SchedulerResult<bool> {
        if self.runtime.is_some() {
            return Ok(false);
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("dataloom-scheduler")
            .enable_all()
            .build()?;

        for (key, entry) in self.entries.iter_mut() {
            entry.task = arm(&runtime, *key, entry.schedule, entry.callback.clone());
        }
        self.runtime = Some(runtime);
        info!(jobs = self.entries.len(), "Scheduler started");
        Ok(true)
    }

    /// Cancel all timers; returns false if not running
    ///
    /// Callbacks already executing are left to finish on their own.
    pub fn stop(&mut self) -> bool {
        let Some(runtime) = self.runtime.take() else {
            return false;
        };
        for entry in self.entries.values_mut() {
            if let Some(task) = entry.task.take() {
                task.abort();
            }
        }
        runtime.shutdown_background();
        info!("Scheduler stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.runtime.is_some()
    }

    /// Register a schedule for a job that has none yet
    pub fn schedule(
        &mut self,
        job_id: i64,
        schedule: &Schedule,
        callback: JobCallback,
    ) -> SchedulerResult<ScheduleKey> {
        let key = ScheduleKey::for_job(job_id);
        if self.entries.contains_key(&key) {
            return Err(SchedulerError::AlreadyScheduled(key));
        }
        self.insert(key, *schedule, callback);
        Ok(key)
    }

    /// Register or replace the schedule of a job
    pub fn reschedule(&mut self, job_id: i64, schedule: &Schedule, callback: JobCallback) -> ScheduleKey {
        let key = ScheduleKey::for_job(job_id);
        self.unschedule(job_id);
        self.insert(key, *schedule, callback);
        key
    }

    /// Remove the schedule of a job; returns whether one existed
    pub fn unschedule(&mut self, job_id: i64) -> bool {
        let key = ScheduleKey::for_job(job_id);
        match self.entries.remove(&key) {
            Some(entry) => {
                if let Some(task) = entry.task {
                    task.abort();
                }
                debug!(key = %key, "Unscheduled job");
                true
            }
            None => false,
        }
    }

    /// Registered schedules, ordered by key
    pub fn scheduled_jobs(&self) -> Vec<(ScheduleKey, Schedule)> {
        let mut jobs: Vec<_> = self
            .entries
            .iter()
            .map(|(key, entry)| (*key, entry.schedule))
            .collect();
        jobs.sort_by_key(|(key, _)| *key);
        jobs
    }

    /// Block until Ctrl-C is received
    pub fn wait_for_shutdown_signal(&self) -> SchedulerResult<()> {
        let wait = async {
            tokio::signal::ctrl_c()
                .await
                .map_err(|e| SchedulerError::Signal(e.to_string()))
        };
        match &self.runtime {
            Some(runtime) => runtime.block_on(wait),
            None => tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
                .block_on(wait),
        }
    }

    fn insert(&mut self, key: ScheduleKey, schedule: Schedule, callback: JobCallback) {
        let task = self
            .runtime
            .as_ref()
            .and_then(|runtime| arm(runtime, key, schedule, callback.clone()));
        debug!(key = %key, time = %schedule.time, days = %schedule.days, "Scheduled job");
        self.entries.insert(
            key,
            Entry {
                schedule,
                callback,
                task,
            },
        );
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn arm(
    runtime: &Runtime,
    key: ScheduleKey,
    schedule: Schedule,
    callback: JobCallback,
) -> Option<JoinHandle<()>> {
    if !schedule.is_active() {
        warn!(key = %key, "Schedule has no days selected; it will never fire");
        return None;
    }
    Some(runtime.spawn(run_timer(key, schedule, callback)))
}

async fn run_timer(key: ScheduleKey, schedule: Schedule, callback: JobCallback) {
    loop {
        let now = Local::now().naive_local();
        let Some(next) = schedule.next_fire_after(now) else {
            return;
        };
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        debug!(key = %key, next = %next, "Waiting for next firing");
        tokio::time::sleep(wait).await;

        info!(key = %key, "Schedule fired");
        let callback = callback.clone();
        let job_id = key.job_id();
        // Not awaited: a long job must not delay the next firing
        drop(tokio::task::spawn_blocking(move || callback(job_id)));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use chrono::{NaiveTime, Timelike};

    fn noop() -> JobCallback {
        Arc::new(|_| {})
    }

    fn daily(hour: u32) -> Schedule {
        Schedule::new(
            NaiveTime::from_hms_opt(hour, 0, 0).expect("time"),
            super::super::DaySet::all(),
        )
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let mut scheduler = JobScheduler::new();
        assert!(!scheduler.is_running());
        assert!(scheduler.start().expect("start"));
        assert!(!scheduler.start().expect("second start"));
        assert!(scheduler.is_running());
        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_schedule_bookkeeping() {
        let mut scheduler = JobScheduler::new();
        let key = scheduler.schedule(7, &daily(6), noop()).expect("schedule");
        assert_eq!(key.to_string(), "job_7");
        assert!(matches!(
            scheduler.schedule(7, &daily(6), noop()),
            Err(SchedulerError::AlreadyScheduled(_))
        ));

        scheduler.reschedule(7, &daily(8), noop());
        scheduler.schedule(3, &daily(1), noop()).expect("schedule");
        let jobs = scheduler.scheduled_jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].0.job_id(), 3);
        assert_eq!(jobs[1].1.time.hour(), 8);

        assert!(scheduler.unschedule(7));
        assert!(!scheduler.unschedule(7));
        assert_eq!(scheduler.scheduled_jobs().len(), 1);
    }

    #[test]
    fn test_schedules_survive_restart() {
        let mut scheduler = JobScheduler::new();
        scheduler.schedule(1, &daily(6), noop()).expect("schedule");
        scheduler.start().expect("start");
        scheduler.schedule(2, &daily(7), noop()).expect("schedule while running");
        scheduler.stop();
        scheduler.start().expect("restart");
        assert_eq!(scheduler.scheduled_jobs().len(), 2);
        scheduler.stop();
    }

    #[test]
    fn test_callback_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let callback: JobCallback = Arc::new(move |job_id| {
            assert_eq!(job_id, 5);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // Fire at the start of the next whole second, every day
        let next = Local::now().naive_local() + chrono::Duration::seconds(2);
        let time = next.time().with_nanosecond(0).expect("time");
        let schedule = Schedule::new(time, super::super::DaySet::all());

        let mut scheduler = JobScheduler::new();
        scheduler.schedule(5, &schedule, callback).expect("schedule");
        scheduler.start().expect("start");
        std::thread::sleep(Duration::from_secs(4));
        scheduler.stop();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
