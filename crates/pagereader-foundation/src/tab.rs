use std::fmt;

/// Identity of the page that owns a playback session.
///
/// The process-wide "now playing" slot is keyed by this: starting a read on
/// any tab supersedes whatever tab held the previous session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab {}", self.0)
    }
}
