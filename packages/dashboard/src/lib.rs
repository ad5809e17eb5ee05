#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The tick monitor dashboard core.
//!
//! [`RefreshOrchestrator`] fetches each view through a
//! [`tick_monitor_client::DashboardApi`], shapes the payload in
//! [`transform`], and hands the result to a [`Presenter`]. All mutable
//! dashboard state lives in one [`ViewState`].

pub mod config;
pub mod orchestrator;
pub mod preferences;
pub mod presenter;
pub mod state;
pub mod transform;

pub use config::{ConfigError, DashboardConfig, GeoPoint};
pub use orchestrator::{RefreshOrchestrator, RefreshReport, UpdateOutcome, ViewOutcome};
pub use preferences::{PreferenceError, PreferenceStore};
pub use presenter::{ChartHandle, ChartMount, MapHandle, NullPresenter, Presenter};
pub use state::{ViewState, ViewStatus};
