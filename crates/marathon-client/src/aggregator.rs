use std::sync::Arc;

use tracing::warn;

use marathon_types::{Channel, Notification};

use crate::api::NotificationApi;
use crate::cache::{CacheKey, NotificationPage, QueryCache};
use crate::error::NotifyResult;
use crate::pagination::{PageRequest, display_number, empty_page, normalize};
use crate::read_state::classify;

/// Reads the GLOBAL and EVENT channels through the shared page cache.
pub struct NotificationAggregator<A> {
    api: Arc<A>,
    cache: Arc<QueryCache>,
}

impl<A: NotificationApi> NotificationAggregator<A> {
    pub fn new(api: Arc<A>, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    /// Page `page` of `channel`. Out-of-range page and size values are clamped to 1.
    pub async fn fetch_channel(&self, channel: Channel, page: i64, size: i64) -> NotifyResult<Arc<NotificationPage>> {
        self.fetch(channel, PageRequest::new(page, size)).await
    }

    pub async fn fetch(&self, channel: Channel, request: PageRequest) -> NotifyResult<Arc<NotificationPage>> {
        self.cache
            .get_or_fetch(CacheKey::new(channel, request), || self.load(channel, request))
            .await
    }

    /// One network attempt, no retry. Anonymous callers get an empty page
    /// instead of an error.
    async fn load(&self, channel: Channel, request: PageRequest) -> NotifyResult<NotificationPage> {
        match self.api.list(channel, request).await {
            Ok(raw) => Ok(normalize(raw, request).map(classify)),
            Err(e) if !self.api.is_authenticated() => {
                warn!(%channel, error = %e, "notification list unavailable for anonymous user");
                Ok(empty_page(request))
            }
            Err(e) => Err(e),
        }
    }

    /// Both channels at once: `active` at the requested page, the other tab at
    /// page 1 so its badge stays meaningful.
    pub async fn fetch_overview(&self, active: Channel, request: PageRequest) -> NotifyResult<NotificationOverview> {
        let badge_request = PageRequest::new(1, i64::from(request.size()));
        let (active_page, other_page) =
            tokio::try_join!(self.fetch(active, request), self.fetch(active.other(), badge_request))?;

        let (global, event) = match active {
            Channel::Global => (active_page, other_page),
            Channel::Event => (other_page, active_page),
        };
        Ok(NotificationOverview {
            active,
            request,
            global,
            event,
        })
    }
}

/// Unread items on this page only. The backend offers no total-unread
/// endpoint, so badges built from this undercount when unread items sit on
/// pages that were not loaded.
pub fn approximate_unread_count(page: &NotificationPage) -> usize {
    page.content.iter().filter(|n| n.unread).count()
}

/// The two fetched channels, ready for display.
#[derive(Debug, Clone)]
pub struct NotificationOverview {
    pub active: Channel,
    pub request: PageRequest,
    pub global: Arc<NotificationPage>,
    pub event: Arc<NotificationPage>,
}

impl NotificationOverview {
    /// The already-fetched page behind the tab for `channel`.
    pub fn select(&self, channel: Channel) -> &Arc<NotificationPage> {
        match channel {
            Channel::Global => &self.global,
            Channel::Event => &self.event,
        }
    }

    pub fn active_page(&self) -> &Arc<NotificationPage> {
        self.select(self.active)
    }

    pub fn unread_count(&self, channel: Channel) -> usize {
        approximate_unread_count(self.select(channel))
    }

    pub fn total_unread(&self) -> usize {
        Channel::ALL.iter().map(|c| self.unread_count(*c)).sum()
    }

    /// Items of the active tab with their "#N" labels.
    pub fn display_items(&self) -> Vec<DisplayItem> {
        numbered(self.active_page(), self.request)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub number: i64,
    pub notification: Notification,
}

/// Pair each item with its descending display number, keeping server order.
pub fn numbered(page: &NotificationPage, request: PageRequest) -> Vec<DisplayItem> {
    page.content
        .iter()
        .enumerate()
        .map(|(index, n)| DisplayItem {
            number: display_number(page.total_elements, request.page(), request.size(), index),
            notification: n.clone(),
        })
        .collect()
}
