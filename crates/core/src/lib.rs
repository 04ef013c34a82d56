//! Core orchestration engine for clipdeck.
//!
//! Owns the job registry, the progress event bus, the bounded worker pool,
//! the download controller façade, the bounded history ring, and the
//! extraction-engine boundary. The HTTP layer in `clipdeck-server` is a thin
//! shell over the `DownloadController` exported here.

pub mod bus;
pub mod controller;
pub mod engine;
pub mod error;
pub mod format;
pub mod history;
pub mod pool;
pub mod registry;
pub mod sanitize;

pub use bus::{EventBus, RecvOutcome, Subscription};
pub use controller::{ControllerConfig, DownloadController};
pub use error::{RegistryError, SubmitError};
pub use history::HistoryLog;
pub use registry::JobRegistry;
