pub mod email;
pub mod reporter;

pub use email::EmailNotifier;
pub use reporter::DealReporter;

use async_trait::async_trait;

use crate::core::NotificationError;
use crate::scanner::ProductEntry;

/// Delivers the matched deals somewhere a human will see them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, deals: &[ProductEntry], threshold: f64) -> Result<(), NotificationError>;
}
