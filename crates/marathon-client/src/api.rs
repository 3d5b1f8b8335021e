use std::future::Future;

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use tracing::debug;

use marathon_types::{Channel, MutationAck, NotificationKind, NotificationRecord};

use crate::config::ClientConfig;
use crate::error::{NotifyError, NotifyResult};
use crate::pagination::{PageRequest, RawPage};

/// Backend operations the aggregator and coordinator depend on.
pub trait NotificationApi: Send + Sync {
    /// Whether requests carry a bearer token.
    fn is_authenticated(&self) -> bool;

    /// `GET /api/v1/notification/{channel}?page=&size=` (1-based page).
    fn list(
        &self,
        channel: Channel,
        request: PageRequest,
    ) -> impl Future<Output = NotifyResult<RawPage<NotificationRecord>>> + Send;

    /// `PATCH /api/v1/notification/{id}/read?type=`
    fn mark_read(&self, id: &str, kind: NotificationKind) -> impl Future<Output = NotifyResult<MutationAck>> + Send;

    /// `PATCH /api/v1/notification/read-all`
    fn mark_all_read(&self) -> impl Future<Output = NotifyResult<MutationAck>> + Send;

    /// `DELETE /api/v1/notification/{id}`
    fn delete(&self, id: &str) -> impl Future<Output = NotifyResult<MutationAck>> + Send;
}

/// [`NotificationApi`] over HTTP.
#[derive(Clone)]
pub struct HttpNotificationApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpNotificationApi {
    pub fn new(config: &ClientConfig) -> NotifyResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| NotifyError::Config(format!("bad base URL '{}': {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(NotifyError::Config(format!("bad base URL '{}'", config.base_url)));
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
            token: config.token.clone(),
        })
    }

    /// `{base}/api/v1/notification/{segments..}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> NotifyResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| NotifyError::Config(format!("bad base URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "v1", "notification"])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> NotifyResult<RequestBuilder> {
        let req = self.client.request(method, self.endpoint(segments)?);
        Ok(match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    async fn send_mutation(&self, req: RequestBuilder) -> NotifyResult<MutationAck> {
        let resp = check_status(req.send().await?).await?;
        let bytes = resp.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(MutationAck::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl NotificationApi for HttpNotificationApi {
    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    async fn list(&self, channel: Channel, request: PageRequest) -> NotifyResult<RawPage<NotificationRecord>> {
        debug!(%channel, page = request.page(), size = request.size(), "GET notifications");
        let resp = self
            .request(Method::GET, &[channel.path_segment()])?
            .query(&[("page", request.page()), ("size", request.size())])
            .send()
            .await?;
        let bytes = check_status(resp).await?.bytes().await?;
        Ok(RawPage::from_slice(&bytes)?)
    }

    async fn mark_read(&self, id: &str, kind: NotificationKind) -> NotifyResult<MutationAck> {
        let req = self
            .request(Method::PATCH, &[record_segment(id)?, "read"])?
            .query(&[("type", kind.as_str())]);
        self.send_mutation(req).await
    }

    async fn mark_all_read(&self) -> NotifyResult<MutationAck> {
        self.send_mutation(self.request(Method::PATCH, &["read-all"])?).await
    }

    async fn delete(&self, id: &str) -> NotifyResult<MutationAck> {
        self.send_mutation(self.request(Method::DELETE, &[record_segment(id)?])?).await
    }
}

async fn check_status(resp: Response) -> NotifyResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(NotifyError::Status {
        status: status.as_u16(),
        body,
    })
}

// Dot segments would be dropped from the path and the request would land on
// the collection instead of the record.
fn record_segment(id: &str) -> NotifyResult<&str> {
    match id {
        "" | "." | ".." => Err(NotifyError::InvalidId(id.to_string())),
        _ => Ok(id),
    }
}
