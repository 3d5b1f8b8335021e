use serde::{Deserialize, Serialize};

// -- Pagination --

/// Page wrapper in the shape the backend uses for paginated lists.
///
/// Metadata fields default when missing so that partial envelopes still
/// decode; whatever the server sent is trusted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub pageable: Pageable,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    /// 0-based.
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub offset: u64,
}

impl<T> PageEnvelope<T> {
    /// Convert every item while keeping the pagination metadata.
    pub fn map<U, F>(self, f: F) -> PageEnvelope<U>
    where
        F: FnMut(T) -> U,
    {
        PageEnvelope {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            pageable: self.pageable,
            first: self.first,
            last: self.last,
            empty: self.empty,
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

// -- Mutations --

/// Body returned by the read/delete endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationAck {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl Default for MutationAck {
    fn default() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}
