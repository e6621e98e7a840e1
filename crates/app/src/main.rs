use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;

use pagereader_app::dispatch::{parse_command, Command};
use pagereader_app::runtime::{start, AppRuntimeOptions};
use pagereader_foundation::ShutdownHandler;
use pagereader_telemetry::SessionMetrics;

#[derive(Parser, Debug)]
#[command(name = "pagereader", about = "Read a page aloud with OpenAI text-to-speech")]
struct Cli {
    /// Text or markdown file to read aloud.
    input: PathBuf,

    /// TTS settings file (API key, voice, model, tone, speed).
    #[arg(long, default_value = "pagereader.toml", env = "PAGEREADER_SETTINGS")]
    settings: PathBuf,

    /// Play through the simulated audio output instead of the sound card.
    #[arg(long)]
    simulated: bool,

    /// Start reading immediately instead of waiting for a command.
    #[arg(long)]
    read: bool,
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "pagereader.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr.and(non_blocking_file))
        .with_env_filter(log_level)
        .init();
    std::mem::forget(guard);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging()?;
    tracing::info!("Starting PageReader");

    let shutdown = ShutdownHandler::new().install().await;

    let mut opts = AppRuntimeOptions::new(&cli.input);
    opts.settings_path = cli.settings.clone();
    opts.simulated = cli.simulated;
    let app = start(opts)?;

    if cli.read {
        if let Err(e) = app.read(pagereader_foundation::TabId(1)).await {
            eprintln!("{e}");
        }
    } else {
        println!("Commands: read [tab], pause, resume, stop [tab], settings, status, quit");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = shutdown.wait() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(command) = parse_command(&line) else { continue };
                if !handle_command(&app, command).await {
                    break;
                }
            }
        }
    }

    app.shutdown().await;
    Ok(())
}

/// Run one command; returns false when the loop should exit.
async fn handle_command(app: &pagereader_app::runtime::AppHandle, command: Command) -> bool {
    let result = match command {
        Command::Read { tab } => app.read(tab).await,
        Command::Pause => app.pause().await,
        Command::Resume => app.resume().await,
        Command::Stop { tab } => app.stop(tab).await,
        Command::Settings => {
            match app.current_settings().await {
                Ok(s) => {
                    println!(
                        "settings ({}): voice={} model={} tone={} speed={} key={}",
                        app.settings_path().display(),
                        s.voice,
                        s.model,
                        s.tone,
                        s.speed,
                        if s.has_api_key() { "set" } else { "missing" }
                    );
                }
                Err(e) => eprintln!("{e}"),
            }
            return true;
        }
        Command::Status => {
            let snapshot = app.snapshot();
            let m = app.metrics();
            println!(
                "{} ({}/{}) played={} skipped={} failed={}",
                snapshot.status,
                snapshot.current_section,
                snapshot.total_sections,
                SessionMetrics::get(&m.sections_played),
                SessionMetrics::get(&m.sections_skipped_heading),
                SessionMetrics::get(&m.sections_failed),
            );
            return true;
        }
        Command::Quit => return false,
    };
    if let Err(e) = result {
        eprintln!("{e}");
    }
    true
}
