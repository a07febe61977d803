//! # JobHands Control
//!
//! Bridges persisted job records and the live scheduler engine.
//!
//! - [`JobRegistry`] maps job class references to handlers and declared defaults
//! - [`JobInfoProvider`] builds runtime [`JobInfo`] and converts it to engine types
//! - [`JobControlService`] schedules, pauses, resumes and reports on stored jobs

pub mod error;
pub mod info;
pub mod provider;
pub mod registry;
pub mod service;
pub mod status;
pub mod view;

pub use error::{ControlError, ControlResult};
pub use info::{JobInfo, TriggerInfo};
pub use provider::{JobInfoProvider, StoreJobInfoProvider};
pub use registry::{JobRegistration, JobRegistry};
pub use service::JobControlService;
pub use status::ScheduleStatus;
pub use view::{JobView, TriggerView};
