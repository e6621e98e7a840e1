use async_trait::async_trait;

use pagereader_foundation::TabId;
use pagereader_session::{SessionSnapshot, SessionStatus, UiPresenter};

/// Console stand-in for the on-page status panel: one line per state change,
/// with section progress while a session is live.
pub struct ConsolePresenter;

#[async_trait]
impl UiPresenter for ConsolePresenter {
    async fn render(
        &self,
        tab: TabId,
        status: SessionStatus,
        message: Option<String>,
        snapshot: SessionSnapshot,
    ) {
        let line = format_status_line(tab, status, message.as_deref(), &snapshot);
        println!("{line}");
    }
}

fn format_status_line(
    tab: TabId,
    status: SessionStatus,
    message: Option<&str>,
    snapshot: &SessionSnapshot,
) -> String {
    let mut line = format!("[{tab}] {status}");
    if snapshot.total_sections > 0 {
        line.push_str(&format!(
            " ({}/{})",
            snapshot.current_section, snapshot.total_sections
        ));
    }
    if snapshot.is_paused {
        line.push_str(" [paused]");
    }
    if let Some(message) = message {
        line.push_str(": ");
        line.push_str(message);
    }
    line
}
