use std::sync::Arc;

use tracing::{info, warn};

use marathon_types::{Channel, MutationAck, NotificationKind};

use crate::api::NotificationApi;
use crate::cache::QueryCache;
use crate::error::{NotifyError, NotifyResult};

/// Issues read/delete calls and invalidates cached pages afterwards.
///
/// The coordinator does not know for certain which channel an id belongs to,
/// so every successful call invalidates both. Nothing is applied to the cache
/// optimistically; callers see fresh state once the next read re-fetches.
pub struct MutationCoordinator<A> {
    api: Arc<A>,
    cache: Arc<QueryCache>,
}

impl<A: NotificationApi> MutationCoordinator<A> {
    pub fn new(api: Arc<A>, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    /// Always hits the network, even if the notification is already read.
    pub async fn mark_as_read(&self, id: &str, kind: NotificationKind) -> NotifyResult<MutationAck> {
        let result = self.api.mark_read(id, kind).await;
        self.settle("mark_as_read", Some(id), result).await
    }

    pub async fn mark_all_as_read(&self) -> NotifyResult<MutationAck> {
        let result = self.api.mark_all_read().await;
        self.settle("mark_all_as_read", None, result).await
    }

    pub async fn delete_notification(&self, id: &str) -> NotifyResult<MutationAck> {
        let result = self.api.delete(id).await;
        self.settle("delete_notification", Some(id), result).await
    }

    /// Any answer from the server may have changed its state, so both channel
    /// families are invalidated before a `success: false` ack is turned into
    /// [`NotifyError::Rejected`].
    async fn settle(
        &self,
        op: &'static str,
        id: Option<&str>,
        result: NotifyResult<MutationAck>,
    ) -> NotifyResult<MutationAck> {
        let ack = match result {
            Ok(ack) => ack,
            Err(e) => {
                warn!(op, id, error = %e, "notification mutation failed");
                return Err(e);
            }
        };

        for channel in Channel::ALL {
            self.cache.invalidate_channel(channel).await;
        }

        if ack.success {
            info!(op, id, "notification mutation applied");
            Ok(ack)
        } else {
            warn!(op, id, message = ack.message.as_deref(), "notification mutation rejected");
            Err(NotifyError::Rejected { message: ack.message })
        }
    }
}
