pub mod core;
pub mod fetch;
pub mod notify;
pub mod pipeline;
pub mod scanner;

pub use crate::core::{Config, ConfigError, FetchError, NotificationError, PipelineError};
pub use fetch::{Fetcher, RetryPolicy};
pub use notify::Notifier;
pub use pipeline::{DealPipeline, RunOutcome, RunResult};
pub use scanner::ProductEntry;
