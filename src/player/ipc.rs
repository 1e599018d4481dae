//! Player control channel
//!
//! One local stream socket per player process. Requests are single JSON lines
//! (`{"command": ["get_property", "time-pos"]}`); the reply is one JSON line
//! whose `data` field carries the value. Plain-text commands such as
//! `cycle fullscreen` get no reply.

use crate::utils::error::{BorgorError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Playback position as reported by the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackOffset {
    Known(f64),
    /// Channel unreachable, timed out or the reply had no usable `data`
    Unknown,
}

impl PlaybackOffset {
    /// Seconds into playback; unknown collapses to 0.0
    pub fn seconds(self) -> f64 {
        match self {
            PlaybackOffset::Known(secs) => secs,
            PlaybackOffset::Unknown => 0.0,
        }
    }
}

#[async_trait]
pub trait ControlChannel: Send + Sync {
    /// Ask the player at `path` for its position. Never fails.
    async fn probe_offset(&self, path: &Path) -> PlaybackOffset;

    /// Send a one-line text command without waiting for a reply
    async fn send_command(&self, path: &Path, command: &str) -> Result<()>;
}

/// Current playback offset in seconds, 0.0 on any failure
pub async fn query_offset(channel: &dyn ControlChannel, path: &Path) -> f64 {
    channel.probe_offset(path).await.seconds()
}

/// Extract the numeric `data` field from a reply line
pub fn parse_offset_response(line: &str) -> Option<f64> {
    let reply: Value = serde_json::from_str(line.trim()).ok()?;
    reply.get("data")?.as_f64()
}

pub fn offset_request() -> String {
    json!({ "command": ["get_property", "time-pos"] }).to_string()
}

/// Unix-socket control channel (mpv `--input-ipc-server`)
pub struct IpcChannel {
    timeout: Duration,
}

impl IpcChannel {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    #[cfg(unix)]
    async fn request_line(&self, path: &Path, request: String) -> Result<String> {
        use futures::{SinkExt, StreamExt};
        use tokio::net::UnixStream;
        use tokio_util::codec::{Framed, LinesCodec};

        let exchange = async {
            let stream = UnixStream::connect(path).await?;
            let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(64 * 1024));
            framed
                .send(request)
                .await
                .map_err(|e| BorgorError::ControlChannel(e.to_string()))?;
            let line = match framed.next().await {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Err(BorgorError::ControlChannel(e.to_string())),
                None => return Err(BorgorError::ControlChannel("closed without reply".into())),
            };
            Ok::<_, BorgorError>(line)
        };

        timeout(self.timeout, exchange)
            .await
            .map_err(|_| BorgorError::Timeout("control channel query"))?
    }

    #[cfg(not(unix))]
    async fn request_line(&self, path: &Path, _request: String) -> Result<String> {
        Err(BorgorError::ControlChannel(format!(
            "unsupported control channel {}",
            path.display()
        )))
    }
}

#[async_trait]
impl ControlChannel for IpcChannel {
    async fn probe_offset(&self, path: &Path) -> PlaybackOffset {
        match self.request_line(path, offset_request()).await {
            Ok(line) => match parse_offset_response(&line) {
                Some(secs) => PlaybackOffset::Known(secs),
                None => {
                    debug!("No offset in control reply: {}", line);
                    PlaybackOffset::Unknown
                }
            },
            Err(e) => {
                debug!("Offset query on {} failed: {}", path.display(), e);
                PlaybackOffset::Unknown
            }
        }
    }

    #[cfg(unix)]
    async fn send_command(&self, path: &Path, command: &str) -> Result<()> {
        use tokio::io::AsyncWriteExt;
        use tokio::net::UnixStream;

        let write = async {
            let mut stream = UnixStream::connect(path).await?;
            stream.write_all(format!("{}\n", command).as_bytes()).await?;
            stream.shutdown().await?;
            Ok::<_, std::io::Error>(())
        };

        timeout(self.timeout, write)
            .await
            .map_err(|_| BorgorError::Timeout("control channel command"))?
            .map_err(|e| BorgorError::ControlChannel(e.to_string()))
    }

    #[cfg(not(unix))]
    async fn send_command(&self, path: &Path, _command: &str) -> Result<()> {
        Err(BorgorError::ControlChannel(format!(
            "unsupported control channel {}",
            path.display()
        )))
    }
}
