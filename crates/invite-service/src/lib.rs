//! Invite Service - scheduled TestFlight tester provisioning.
//!
//! Each scheduled round allocates disposable addresses, registers them as
//! beta testers (reusing any tester that already exists for the address),
//! enrolls new testers into the configured group and records their invite
//! links. A small HTTP surface starts and stops the schedule and exposes
//! the recorded outcomes.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod scheduler;

pub use config::Config;
pub use error::ServiceError;
pub use pipeline::{InvitePipeline, Pipeline, PipelineError};
pub use scheduler::{BatchScheduler, ScheduleControl, ScheduleSettings, SchedulerState};
