//! Recurring job schedules
//!
//! A [`Schedule`] is a time of day on a set of weekdays. [`JobScheduler`] is
//! an explicit service object with a start/stop lifecycle that invokes a
//! callback with the job id whenever a schedule fires. It knows nothing about
//! jobs beyond their id; the caller supplies what a firing does.

mod schedule;
mod service;

pub use schedule::{DaySet, Schedule};
pub use service::{JobCallback, JobScheduler, ScheduleKey, SchedulerError, SchedulerResult};
