use pagereader_foundation::TabId;

/// User-facing control commands, dispatched by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Read { tab: TabId },
    Pause,
    Resume,
    Stop { tab: TabId },
    Settings,
    Status,
    Quit,
}

const DEFAULT_TAB: TabId = TabId(1);

/// Parse one console line into a command.
///
/// Unrecognized input yields `None` and is ignored by the caller; `read` and
/// `stop` accept an optional numeric tab argument.
pub fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let name = words.next()?;
    let tab = words
        .next()
        .and_then(|w| w.parse::<u32>().ok())
        .map(TabId)
        .unwrap_or(DEFAULT_TAB);

    match name {
        "read" | "r" => Some(Command::Read { tab }),
        "pause" | "p" => Some(Command::Pause),
        "resume" => Some(Command::Resume),
        "stop" | "s" => Some(Command::Stop { tab }),
        "settings" => Some(Command::Settings),
        "status" => Some(Command::Status),
        "quit" | "q" | "exit" => Some(Command::Quit),
        _ => None,
    }
}
