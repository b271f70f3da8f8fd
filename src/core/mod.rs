pub mod config;
pub mod error;
pub mod logging;
pub mod season;

pub use config::{Config, EmailConfig, FetchBackend, FetchConfig, ListingConfig, ThresholdConfig, UnitPolicy};
pub use error::{ConfigError, FetchAttemptError, FetchError, NotificationError, PipelineError};
