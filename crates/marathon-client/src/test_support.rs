//! In-memory [`NotificationApi`] used by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use marathon_types::{Channel, MutationAck, NotificationKind, NotificationRecord, PageEnvelope, Pageable};

use crate::api::NotificationApi;
use crate::error::{NotifyError, NotifyResult};
use crate::pagination::{PageRequest, RawPage};

pub(crate) fn record(id: &str, read: Option<bool>, is_read: Option<bool>) -> NotificationRecord {
    NotificationRecord {
        id: id.into(),
        title: format!("Notice {}", id),
        body: String::new(),
        created_at: "2024-05-01T09:30:00".into(),
        sent_at: None,
        read: read.map(Some),
        is_read: is_read.map(Some),
        kind: None,
        event_id: None,
    }
}

#[derive(Default)]
pub(crate) struct FakeApi {
    pub authenticated: bool,
    /// Serve lists as bare arrays instead of envelopes.
    pub bare: bool,
    pub records: Mutex<HashMap<Channel, Vec<NotificationRecord>>>,
    pub fail_lists: AtomicBool,
    pub fail_mutations: AtomicBool,
    pub reject_mutations: AtomicBool,
    pub list_calls: AtomicUsize,
    pub mutations: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn signed_in() -> Self {
        Self {
            authenticated: true,
            ..Self::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with(self, channel: Channel, records: Vec<NotificationRecord>) -> Self {
        self.records.lock().unwrap().insert(channel, records);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> Vec<String> {
        self.mutations.lock().unwrap().clone()
    }

    fn mutate<F>(&self, label: String, apply: F) -> NotifyResult<MutationAck>
    where
        F: FnOnce(&mut HashMap<Channel, Vec<NotificationRecord>>),
    {
        self.mutations.lock().unwrap().push(label);
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(NotifyError::Status { status: 500, body: "boom".into() });
        }
        if self.reject_mutations.load(Ordering::SeqCst) {
            return Ok(MutationAck {
                success: false,
                message: Some("not allowed".into()),
            });
        }
        apply(&mut self.records.lock().unwrap());
        Ok(MutationAck::default())
    }
}

impl NotificationApi for FakeApi {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn list(&self, channel: Channel, request: PageRequest) -> NotifyResult<RawPage<NotificationRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(NotifyError::Status { status: 401, body: String::new() });
        }

        let all = self.records.lock().unwrap().get(&channel).cloned().unwrap_or_default();
        if self.bare {
            return Ok(RawPage::Bare(all));
        }

        let size = request.size() as usize;
        let content: Vec<_> = all.iter().skip(request.offset() as usize).take(size).cloned().collect();
        let total_pages = all.len().div_ceil(size) as u32;
        Ok(RawPage::Envelope(PageEnvelope {
            empty: content.is_empty(),
            content,
            total_elements: all.len() as u64,
            total_pages,
            pageable: Pageable {
                page_number: request.page_index(),
                page_size: request.size(),
                offset: request.offset(),
            },
            first: request.page() == 1,
            last: request.page() >= total_pages,
        }))
    }

    async fn mark_read(&self, id: &str, kind: NotificationKind) -> NotifyResult<MutationAck> {
        self.mutate(format!("read {} {}", id, kind), |records| {
            for r in records.values_mut().flatten().filter(|r| r.id == id) {
                r.is_read = Some(Some(true));
            }
        })
    }

    async fn mark_all_read(&self) -> NotifyResult<MutationAck> {
        self.mutate("read-all".into(), |records| {
            for r in records.values_mut().flatten() {
                r.is_read = Some(Some(true));
            }
        })
    }

    async fn delete(&self, id: &str) -> NotifyResult<MutationAck> {
        self.mutate(format!("delete {}", id), |records| {
            for list in records.values_mut() {
                list.retain(|r| r.id != id);
            }
        })
    }
}
