use serde::{Deserialize, Serialize};

/// One page of a server-side paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total: u64,
    pub total_pages: u32,
    pub page: u32,
    pub limit: u32,
    pub has_next: bool,
    pub has_prev: bool,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.data
    }
}
