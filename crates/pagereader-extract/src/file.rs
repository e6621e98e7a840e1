use async_trait::async_trait;
use std::path::PathBuf;

use pagereader_foundation::TabId;
use tracing::debug;

use crate::error::{ExtractError, ExtractResult};
use crate::extractor::{ContentExtractor, ExtractedPage};

/// Extractor over a local text or markdown file.
///
/// Stands in for the in-page DOM extractor: markdown headings (`#`-prefixed
/// lines) are rewritten to the `[Heading: …]` marker convention and paragraph
/// whitespace is normalized before sectionizing.
pub struct FileExtractor {
    path: PathBuf,
}

impl FileExtractor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ContentExtractor for FileExtractor {
    async fn extract(&self, tab: TabId) -> ExtractResult<ExtractedPage> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let title = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string());

        let content = normalize(&raw);
        debug!(
            %tab,
            path = %self.path.display(),
            chars = content.chars().count(),
            "extracted file content"
        );

        if content.trim().is_empty() {
            return Err(ExtractError::NoContent);
        }

        Ok(ExtractedPage {
            title,
            content,
            error: None,
        })
    }
}

/// Collapse intra-paragraph whitespace and rewrite `#` headings to markers,
/// keeping blank lines as paragraph separators.
fn normalize(raw: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            flush(&mut paragraphs, &mut current);
            continue;
        }
        if let Some(heading) = strip_heading(line) {
            flush(&mut paragraphs, &mut current);
            paragraphs.push(format!("[Heading: {}]", heading));
            continue;
        }
        current.push(line);
    }
    flush(&mut paragraphs, &mut current);

    paragraphs.join("\n\n")
}

fn strip_heading(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches('#');
    if rest.len() == line.len() {
        return None;
    }
    let rest = rest.trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

fn flush(paragraphs: &mut Vec<String>, current: &mut Vec<&str>) {
    if current.is_empty() {
        return;
    }
    let joined = current.join(" ");
    current.clear();
    let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        paragraphs.push(collapsed);
    }
}
