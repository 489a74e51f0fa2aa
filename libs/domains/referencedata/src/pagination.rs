//! Offset paging over resolved identities.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{IdentityList, VersionedIdentity};

/// Zero-based page index and page size.
///
/// A missing or zero `size` requests every result in one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: Option<u64>,
}

impl PageRequest {
    pub fn of(page: u64, size: u64) -> Self {
        Self {
            page,
            size: Some(size),
        }
    }

    pub fn unpaged() -> Self {
        Self::default()
    }

    /// The page size, or `None` when unpaged.
    pub fn limit(&self) -> Option<u64> {
        self.size.filter(|size| *size > 0)
    }

    pub fn is_paged(&self) -> bool {
        self.limit().is_some()
    }

    pub fn offset(&self) -> u64 {
        self.limit()
            .map_or(0, |size| self.page.saturating_mul(size))
    }
}

/// The identities on one page plus the total across all pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityWindow {
    pub identities: Vec<VersionedIdentity>,
    pub total: u64,
}

/// Slice `[offset, offset + limit)` out of `identities`, clamped to the list.
pub fn paginate(identities: &IdentityList, request: &PageRequest) -> IdentityWindow {
    let all = identities.as_slice();
    let total = all.len() as u64;

    let window = match request.limit() {
        None => all,
        Some(limit) => {
            let start = usize::try_from(request.offset())
                .unwrap_or(usize::MAX)
                .min(all.len());
            let len = usize::try_from(limit).unwrap_or(usize::MAX);
            let end = start.saturating_add(len).min(all.len());
            &all[start..end]
        }
    };

    IdentityWindow {
        identities: window.to_vec(),
        total,
    }
}

/// A page of results in the shape paging clients expect.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    /// Zero-based page index
    pub number: u64,
    pub size: u64,
    pub number_of_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let number_of_elements = content.len() as u64;

        let (number, size, total_pages) = match request.limit() {
            Some(size) => (request.page, size, total_elements.div_ceil(size)),
            None => (0, number_of_elements, 1),
        };

        Self {
            content,
            total_elements,
            total_pages,
            number,
            size,
            number_of_elements,
        }
    }

    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }
}
