//! Content extraction layer for PageReader.
//!
//! Defines the section model the session orchestrator plays through, the
//! `ContentExtractor` seam to whatever supplies page text, and the
//! sectionizer that turns extracted text into the ordered section queue.

pub mod error;
pub mod extractor;
pub mod file;
pub mod section;

pub use error::{ExtractError, ExtractResult};
pub use extractor::{ContentExtractor, ExtractedPage};
pub use file::FileExtractor;
pub use section::{sectionize, Section, SectionKind};
