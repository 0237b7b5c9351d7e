//! `cadence-scheduler`: in-process engine for fixed-interval background jobs.
//!
//! # Overview
//!
//! Job definitions are collected in a [`registry::JobRegistry`] at startup and
//! frozen behind an `Arc`. The [`engine::SchedulerEngine`] builds one scheduled
//! instance per definition and, once started, runs a single tokio task that
//! sleeps until the earliest deadline and fires every due job on its own task.
//!
//! | Guarantee       | Behaviour                                                   |
//! |-----------------|-------------------------------------------------------------|
//! | Fixed rate      | `next_run = scheduled_fire + interval`, missed boundaries coalesce |
//! | Single flight   | a fire is skipped, not queued, while the previous one runs  |
//! | Isolation       | errors and panics in scheduled fires are logged, not raised |
//! | Manual runs     | [`invoke::invoke`] bypasses the schedule and engine state   |
//!
//! Actions have no timeout; `stop()` lets in-flight actions finish.

pub mod engine;
pub mod error;
pub mod invoke;
pub mod registry;
pub mod schedule;
pub mod types;

pub use engine::SchedulerEngine;
pub use error::{Result, SchedulerError};
pub use invoke::{invoke, JobInvoker};
pub use registry::JobRegistry;
pub use types::{FnAction, InvocationReport, JobAction, JobDefinition, JobInfo, SchedulerStatus};
