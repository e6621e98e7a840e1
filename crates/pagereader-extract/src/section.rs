use serde::{Deserialize, Serialize};

/// One contiguous unit of page content scheduled for individual synthesis
/// and playback. Order is significant: it determines playback order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub index: usize,
    pub kind: SectionKind,
    /// Nearest heading above this section (or the page title).
    pub title: String,
    /// Text sent to synthesis; empty for heading sections.
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionKind {
    /// Carries no audio; the session pulses the UI and moves on.
    Heading,
    Content,
}

impl Section {
    pub fn is_heading(&self) -> bool {
        self.kind == SectionKind::Heading
    }
}

/// Upper bound on one content section, kept under the synthesis input limit
/// so a section never spans multiple TTS calls.
const GROUP_CHAR_LIMIT: usize = 3600;

/// Split extracted page text into the ordered section queue.
///
/// Paragraphs are separated by blank lines. A paragraph of the form
/// `[Heading: …]` (the extractor's marker convention) becomes a `Heading`
/// section; runs of paragraphs between headings are grouped into `Content`
/// sections titled by the nearest preceding heading.
pub fn sectionize(page_title: &str, content: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut group: Vec<String> = Vec::new();
    let mut group_chars = 0usize;
    let mut current_title = page_title.trim().to_string();

    for paragraph in content.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if let Some(heading) = parse_heading_marker(paragraph) {
            flush_group(&mut sections, &current_title, &mut group);
            group_chars = 0;
            current_title = heading.to_string();
            let index = sections.len();
            sections.push(Section {
                index,
                kind: SectionKind::Heading,
                title: heading.to_string(),
                content: String::new(),
            });
            continue;
        }

        let chars = paragraph.chars().count();
        if group_chars > 0 && group_chars + chars > GROUP_CHAR_LIMIT {
            flush_group(&mut sections, &current_title, &mut group);
            group_chars = 0;
        }
        group.push(paragraph.to_string());
        group_chars += chars;
    }

    flush_group(&mut sections, &current_title, &mut group);
    sections
}

fn parse_heading_marker(paragraph: &str) -> Option<&str> {
    let inner = paragraph.strip_prefix("[Heading:")?.strip_suffix(']')?.trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner)
    }
}

fn flush_group(sections: &mut Vec<Section>, title: &str, group: &mut Vec<String>) {
    if group.is_empty() {
        return;
    }
    let content = group.join("\n\n");
    group.clear();
    if content.trim().is_empty() {
        return;
    }
    let index = sections.len();
    sections.push(Section {
        index,
        kind: SectionKind::Content,
        title: title.to_string(),
        content,
    });
}
