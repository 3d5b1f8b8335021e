//! Coerces list responses into [`PageEnvelope`]s.
//!
//! The notification endpoints answer either with a full page envelope or,
//! on older deployments, with a bare JSON array. Callers always get an
//! envelope back.

use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;

use marathon_types::{PageEnvelope, Pageable};

/// A 1-based page request with both values clamped to at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Out-of-range input (zero, negative) is clamped to 1.
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: clamp(page),
            size: clamp(size),
        }
    }

    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// 0-based page index, the convention used inside envelopes.
    pub fn page_index(&self) -> u32 {
        self.page - 1
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page_index()) * u64::from(self.size)
    }
}

fn clamp(value: i64) -> u32 {
    value.clamp(1, i64::from(u32::MAX)) as u32
}

/// A list response before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPage<T> {
    Envelope(PageEnvelope<T>),
    Bare(Vec<T>),
}

impl<T: DeserializeOwned> RawPage<T> {
    /// Arrays are bare pages; objects must carry `content` to count as an envelope.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let enveloped = matches!(&value, Value::Object(map) if map.contains_key("content"));
        if value.is_array() {
            Ok(Self::Bare(serde_json::from_value(value)?))
        } else if enveloped {
            Ok(Self::Envelope(serde_json::from_value(value)?))
        } else {
            Err(serde_json::Error::custom(format!(
                "expected a page envelope or an array, got {}",
                json_kind(&value)
            )))
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        Self::from_value(serde_json::from_slice(bytes)?)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object without `content`",
    }
}

/// Produce an envelope for `raw`. Server envelopes pass through untouched;
/// bare arrays get metadata synthesised from the request.
pub fn normalize<T>(raw: RawPage<T>, request: PageRequest) -> PageEnvelope<T> {
    match raw {
        RawPage::Envelope(envelope) => envelope,
        RawPage::Bare(content) => synthesize(content, request),
    }
}

impl<T> From<Vec<T>> for RawPage<T> {
    fn from(content: Vec<T>) -> Self {
        Self::Bare(content)
    }
}

impl<T> From<PageEnvelope<T>> for RawPage<T> {
    fn from(envelope: PageEnvelope<T>) -> Self {
        Self::Envelope(envelope)
    }
}

/// The envelope shown to callers who have nothing to see.
pub fn empty_page<T>(request: PageRequest) -> PageEnvelope<T> {
    synthesize(Vec::new(), request)
}

fn synthesize<T>(content: Vec<T>, request: PageRequest) -> PageEnvelope<T> {
    let total_elements = content.len() as u64;
    let total_pages = total_elements.div_ceil(u64::from(request.size())) as u32;
    PageEnvelope {
        empty: content.is_empty(),
        content,
        total_elements,
        total_pages,
        pageable: Pageable {
            page_number: request.page_index(),
            page_size: request.size(),
            offset: request.offset(),
        },
        first: request.page() == 1,
        last: true,
    }
}

/// Descending "#N" label for the item at `index` on `page` (1-based).
///
/// Assumes the server lists newest first; nothing here checks timestamps, so
/// the numbers are wrong if the server's sort order changes.
pub fn display_number(total_elements: u64, page: u32, page_size: u32, index: usize) -> i64 {
    total_elements as i64 - i64::from(page.saturating_sub(1)) * i64::from(page_size) - index as i64
}
