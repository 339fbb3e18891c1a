// ABOUTME: Staged deployment: tier scheduling, per-service state, and the deployer.
// ABOUTME: Exports the outcome types consumed by the reporter and the status board.

mod deployer;
mod outcome;
mod scheduler;
mod state;

pub use deployer::Deployer;
pub use outcome::{ServiceOutcome, ServiceStatus};
pub use scheduler::{ABORTED, ABORTED_BEFORE_START, ScheduleResult, StageScheduler};
pub use state::{Pending, Probing, ServiceTracker};
