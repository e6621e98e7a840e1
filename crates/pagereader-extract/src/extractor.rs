use async_trait::async_trait;
use pagereader_foundation::TabId;

use crate::error::ExtractResult;

/// Raw result of extracting a page.
///
/// `error` carries a partial-failure note; fallback content is still returned
/// so the session always has something to read.
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub title: String,
    pub content: String,
    pub error: Option<String>,
}

impl ExtractedPage {
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Supplies the readable text of a page. Heading markers in the returned
/// content use the `[Heading: …]` convention consumed by the sectionizer.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, tab: TabId) -> ExtractResult<ExtractedPage>;
}
