use async_trait::async_trait;

use pagereader_foundation::TabId;

use crate::session::{SessionSnapshot, SessionStatus};

/// Renders current session state to the user and owns nothing else.
///
/// The orchestrator drives this on every state change; render failures are
/// the presenter's problem (log and move on), never the session's.
#[async_trait]
pub trait UiPresenter: Send + Sync {
    async fn render(
        &self,
        tab: TabId,
        status: SessionStatus,
        message: Option<String>,
        snapshot: SessionSnapshot,
    );
}

/// Presenter that drops every render; for wiring where no UI exists.
pub struct NullPresenter;

#[async_trait]
impl UiPresenter for NullPresenter {
    async fn render(
        &self,
        _tab: TabId,
        _status: SessionStatus,
        _message: Option<String>,
        _snapshot: SessionSnapshot,
    ) {
    }
}
