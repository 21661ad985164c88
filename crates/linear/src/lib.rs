//! Linear-side label hygiene: label synchronization, project provisioning and
//! verification.
//!
//! All remote access goes through the [`Tracker`] trait. [`LinearClient`] is
//! the GraphQL implementation; tests use mocks or in-memory fakes.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod provision;
pub mod sync;
pub mod tracker;
pub mod verify;

pub use cache::{LabelMap, LookupCache};
pub use client::{LinearClient, LINEAR_API_URL};
pub use config::Config;
pub use error::{TrackerError, TrackerResult};
pub use provision::{
    CreateResult, IssueConfig, ProjectConfig, ProjectProvisioner, Step, StepOutcome,
};
pub use sync::{ApplyResult, EnsureOptions, EnsureResult, LabelPolicy, LabelSynchronizer};
pub use tracker::Tracker;
pub use verify::{ExpectedLabels, InitiativeVerification, ProjectVerification, Verifier};
