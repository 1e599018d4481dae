//! Console front end
//!
//! Reads line commands from stdin, forwards them to the session coordinator
//! and prints whatever it reports back.

use crate::player::QualityTier;
use crate::session::{SessionActor, SessionCommand, SessionEvent};
use crate::utils::config::AppSettings;
use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

const HELP: &str = "\
commands:
  open <url>         extract and play
  search <query>     search videos
  quality <tier>     switch quality (e.g. 720p60)
  separate           play video and audio as two players
  detach             toggle embedding in the host window
  fullscreen         toggle fullscreen on the player
  channel            list the current channel's uploads
  thumb <url>        fetch a thumbnail
  stop               stop playback
  quit               exit";

/// A parsed console line
#[derive(Debug, PartialEq)]
pub enum ConsoleInput {
    Command(SessionCommand),
    Help,
    Quit,
    Invalid(String),
}

/// Parse one line of console input
pub fn parse_line(line: &str) -> Option<ConsoleInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match word.to_ascii_lowercase().as_str() {
        "open" | "play" if !rest.is_empty() => ConsoleInput::Command(SessionCommand::Open {
            reference: rest.to_string(),
        }),
        "search" => ConsoleInput::Command(SessionCommand::Search {
            query: rest.to_string(),
        }),
        "quality" => match rest.parse::<QualityTier>() {
            Ok(tier) => ConsoleInput::Command(SessionCommand::ChangeQuality(tier)),
            Err(e) => ConsoleInput::Invalid(e),
        },
        "separate" => ConsoleInput::Command(SessionCommand::WatchSeparate),
        "detach" => ConsoleInput::Command(SessionCommand::ToggleDetach),
        "fullscreen" | "fs" => ConsoleInput::Command(SessionCommand::ToggleFullscreen),
        "channel" => ConsoleInput::Command(SessionCommand::OpenChannel),
        "thumb" if !rest.is_empty() => ConsoleInput::Command(SessionCommand::FetchThumbnail {
            url: rest.to_string(),
        }),
        "stop" => ConsoleInput::Command(SessionCommand::Stop),
        "quit" | "exit" => ConsoleInput::Quit,
        "help" | "?" => ConsoleInput::Help,
        _ => ConsoleInput::Invalid(format!("unrecognized input: {}", line)),
    };
    Some(input)
}

/// Render an event as console text
pub fn render_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::ExtractionStarted { reference } => format!("Extracting {}...", reference),
        SessionEvent::Loaded {
            title,
            uploader,
            uploader_url,
            description,
            tiers,
            tier,
            ..
        } => {
            let labels: Vec<&str> = tiers.iter().map(|t| t.label()).collect();
            format!(
                "{}\n  by {} ({})\n  {}\n  qualities: {}\n  playing at {}",
                title,
                uploader,
                uploader_url,
                description.lines().next().unwrap_or_default(),
                labels.join(", "),
                tier
            )
        }
        SessionEvent::Avatar { url } => match url {
            Some(url) => format!("Channel avatar: {}", url),
            None => "Channel avatar unavailable.".to_string(),
        },
        SessionEvent::SearchResults(entries) | SessionEvent::ChannelVideos(entries) => entries
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{:>3}. {}  [{}]", i + 1, e.title, e.video_id))
            .collect::<Vec<_>>()
            .join("\n"),
        SessionEvent::Thumbnail { url, bytes } => {
            format!("Thumbnail {} ({} bytes)", url, bytes.len())
        }
        SessionEvent::QualityChanged { tier, offset } => {
            format!("Quality {} from {:.1}s", tier, offset)
        }
        SessionEvent::DetachChanged { detached } => {
            if *detached {
                "Detached: player opens in its own window.".to_string()
            } else {
                "Attached: player embeds in the host window.".to_string()
            }
        }
        SessionEvent::SeparateStarted => "Separate video and audio players started.".to_string(),
        SessionEvent::SeparateFallback => "Playing merged instead.".to_string(),
        SessionEvent::Stopped => "Stopped.".to_string(),
        SessionEvent::Notice(text) => text.clone(),
        SessionEvent::Error(text) => format!("error: {}", text),
    }
}

/// Run the console front end until `quit` or end of input
pub async fn run(
    settings: AppSettings,
    reference: Option<String>,
    search: Option<String>,
    embed_window: Option<String>,
    detached: bool,
) -> Result<()> {
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    let (evt_tx, mut evt_rx) = mpsc::channel(100);

    let actor = SessionActor::from_settings(&settings, embed_window, detached, cmd_rx, evt_tx)?;
    let actor_handle = tokio::spawn(actor.run());

    let printer = tokio::spawn(async move {
        while let Some(event) = evt_rx.recv().await {
            match event {
                SessionEvent::Error(_) => eprintln!("{}", render_event(&event)),
                _ => println!("{}", render_event(&event)),
            }
        }
    });

    if let Some(reference) = reference {
        cmd_tx.send(SessionCommand::Open { reference }).await?;
    }
    if let Some(query) = search {
        cmd_tx.send(SessionCommand::Search { query }).await?;
    }

    info!("Console ready");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            None => {}
            Some(ConsoleInput::Command(cmd)) => {
                if cmd_tx.send(cmd).await.is_err() {
                    warn!("Session coordinator is gone");
                    break;
                }
            }
            Some(ConsoleInput::Help) => println!("{}", HELP),
            Some(ConsoleInput::Invalid(message)) => eprintln!("{}\n{}", message, HELP),
            Some(ConsoleInput::Quit) => break,
        }
    }

    let _ = cmd_tx.send(SessionCommand::Shutdown).await;
    drop(cmd_tx);
    actor_handle.await?;
    printer.await?;
    Ok(())
}
