//! Operation options

use serde::{Deserialize, Serialize};

/// MIME type used for uploads when the caller gives none
pub const DEFAULT_MIME_TYPE: &str = "text/plain";

/// Children fetched in a single listing page unless overridden
pub const DEFAULT_PAGE_SIZE: u32 = 50_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOptions {
    pub page_size: Option<u32>,
}

impl ListOptions {
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteOptions {
    pub mime_type: Option<String>,
}

impl WriteOptions {
    pub fn with_mime_type(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: Some(mime_type.into()),
        }
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOptions {
    /// Report any failure, not-found included, as `false` instead of an error
    pub ignore_errors: bool,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self::best_effort()
    }
}

impl DeleteOptions {
    pub fn best_effort() -> Self {
        Self { ignore_errors: true }
    }

    pub fn strict() -> Self {
        Self {
            ignore_errors: false,
        }
    }
}
