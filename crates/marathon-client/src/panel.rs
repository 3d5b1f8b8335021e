//! Notification panel state and the one place mutation failures are surfaced.
//!
//! The coordinator always returns a `Result`. Whether a failure is shown,
//! swallowed or handed back to the caller is decided here, per call site.

use std::sync::Arc;

use tracing::{debug, error};

use marathon_types::{Channel, MutationAck, NotificationKind};

use crate::aggregator::{DisplayItem, NotificationAggregator, NotificationOverview};
use crate::api::NotificationApi;
use crate::cache::QueryCache;
use crate::error::NotifyResult;
use crate::mutations::MutationCoordinator;
use crate::pagination::PageRequest;

/// What to do with a failed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Return the error to the caller.
    Propagate,
    /// Log it and carry on.
    Ignore,
    /// Show it through the [`AlertSink`] and carry on.
    Alert,
}

/// Where a mutation was triggered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationSite {
    /// Opening an item in the compact dropdown. The item may already be read.
    DropdownMarkRead,
    /// Opening an item from the full list.
    ListMarkRead,
    MarkAllRead,
    Delete,
}

impl MutationSite {
    pub fn policy(self) -> FailurePolicy {
        match self {
            Self::DropdownMarkRead => FailurePolicy::Ignore,
            Self::ListMarkRead | Self::MarkAllRead => FailurePolicy::Propagate,
            Self::Delete => FailurePolicy::Alert,
        }
    }
}

/// Receives user-facing failure messages.
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

/// Sink that only writes to the log.
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn alert(&self, message: &str) {
        error!(message, "notification alert");
    }
}

/// Apply `policy` to a mutation result. `Ok(None)` means the failure was
/// handled here.
pub fn apply_policy<T>(
    result: NotifyResult<T>,
    policy: FailurePolicy,
    sink: &dyn AlertSink,
) -> NotifyResult<Option<T>> {
    match (result, policy) {
        (Ok(value), _) => Ok(Some(value)),
        (Err(e), FailurePolicy::Propagate) => Err(e),
        (Err(e), FailurePolicy::Ignore) => {
            debug!(error = %e, "ignoring notification mutation failure");
            Ok(None)
        }
        (Err(e), FailurePolicy::Alert) => {
            sink.alert(&e.user_message());
            Ok(None)
        }
    }
}

/// What the panel shows for the current tab and page.
#[derive(Debug, Clone)]
pub struct PanelView {
    pub overview: NotificationOverview,
    pub items: Vec<DisplayItem>,
}

impl PanelView {
    pub fn total_pages(&self) -> u32 {
        self.overview.active_page().total_pages
    }
}

/// Tab and page state over a shared aggregator and coordinator.
pub struct NotificationPanel<A> {
    aggregator: NotificationAggregator<A>,
    mutations: MutationCoordinator<A>,
    alerts: Arc<dyn AlertSink>,
    active: Channel,
    page: u32,
    page_size: u32,
}

impl<A: NotificationApi> NotificationPanel<A> {
    pub fn new(api: Arc<A>, cache: Arc<QueryCache>, alerts: Arc<dyn AlertSink>, page_size: u32) -> Self {
        Self {
            aggregator: NotificationAggregator::new(api.clone(), cache.clone()),
            mutations: MutationCoordinator::new(api, cache),
            alerts,
            active: Channel::Global,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn active_channel(&self) -> Channel {
        self.active
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Switching tabs starts over at page 1.
    pub fn select_channel(&mut self, channel: Channel) {
        if channel != self.active {
            self.active = channel;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: i64) {
        self.page = self.request_for(page).page();
    }

    fn request_for(&self, page: i64) -> PageRequest {
        PageRequest::new(page, i64::from(self.page_size))
    }

    pub async fn load(&self) -> NotifyResult<PanelView> {
        let overview = self
            .aggregator
            .fetch_overview(self.active, self.request_for(i64::from(self.page)))
            .await?;
        Ok(PanelView {
            items: overview.display_items(),
            overview,
        })
    }

    pub async fn mark_read(
        &self,
        id: &str,
        kind: NotificationKind,
        site: MutationSite,
    ) -> NotifyResult<Option<MutationAck>> {
        let result = self.mutations.mark_as_read(id, kind).await;
        apply_policy(result, site.policy(), self.alerts.as_ref())
    }

    pub async fn mark_all_read(&self) -> NotifyResult<Option<MutationAck>> {
        let result = self.mutations.mark_all_as_read().await;
        apply_policy(result, MutationSite::MarkAllRead.policy(), self.alerts.as_ref())
    }

    /// Failures are shown through the alert sink and never returned.
    pub async fn delete(&self, id: &str) -> Option<MutationAck> {
        let result = self.mutations.delete_notification(id).await;
        apply_policy(result, MutationSite::Delete.policy(), self.alerts.as_ref())
            .ok()
            .flatten()
    }
}
