//! Marathon notification client.
//!
//! Reads the GLOBAL and EVENT notification channels of the association's
//! REST API, classifies read state, and keeps a keyed page cache that
//! read/delete mutations invalidate:
//! - `pagination`: bare-array or envelope responses into one page shape
//! - `read_state`: `read` / `isRead` collapsed into a single flag
//! - `cache`: `(channel, page, size)` pages with a staleness window
//! - `aggregator` / `mutations`: reads and writes over the cache
//! - `panel`: tab state and per-call-site failure handling

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod mutations;
pub mod pagination;
pub mod panel;
pub mod read_state;

#[cfg(test)]
mod test_support;

pub use aggregator::{DisplayItem, NotificationAggregator, NotificationOverview, approximate_unread_count};
pub use api::{HttpNotificationApi, NotificationApi};
pub use cache::{CacheKey, NotificationPage, QueryCache};
pub use config::ClientConfig;
pub use error::{NotifyError, NotifyResult};
pub use mutations::MutationCoordinator;
pub use pagination::PageRequest;
pub use panel::{AlertSink, FailurePolicy, LogAlertSink, MutationSite, NotificationPanel, PanelView};
