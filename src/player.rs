use anyhow::{Context, Result, anyhow};
use std::process::Stdio;
use tokio::process::{Child as TokioChild, Command};
use tracing::info;

use crate::youtube::watch_url;

/// Why playback was started. Previews are stopped by the app after a fixed
/// window; a watch runs until the viewer closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackKind {
  Watch,
  Preview,
}

#[derive(Debug, Clone)]
pub struct NowPlaying {
  pub title: String,
  pub video_id: String,
  pub kind: PlaybackKind,
}

/// External playback via mpv. The catalog only hands over a watch URL;
/// resolving and rendering the stream is mpv's problem.
pub struct VideoPlayer {
  current_process: Option<TokioChild>,
  pub now_playing: Option<NowPlaying>,
}

impl VideoPlayer {
  pub fn new() -> Self {
    Self { current_process: None, now_playing: None }
  }

  pub fn is_playing(&self) -> bool {
    self.current_process.is_some()
  }

  pub async fn play(&mut self, video_id: &str, title: &str, kind: PlaybackKind) -> Result<()> {
    self.stop().await.context("Failed to stop previous playback")?;

    let url = watch_url(video_id);
    let mut cmd = Command::new("mpv");
    cmd.args(["--really-quiet", "--force-window=immediate", &url]);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());

    let child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    info!(video_id, ?kind, "player: started mpv");
    self.current_process = Some(child);
    self.now_playing = Some(NowPlaying { title: title.to_string(), video_id: video_id.to_string(), kind });
    Ok(())
  }

  pub async fn stop(&mut self) -> Result<()> {
    if let Some(mut child) = self.current_process.take() {
      child.kill().await.context("Failed to kill mpv process")?;
      let _ = child.wait().await;
    }
    self.now_playing = None;
    Ok(())
  }

  /// Clear playback state once the viewer closes the mpv window on their
  /// own. Called from the app loop.
  pub fn poll_exit(&mut self) {
    if let Some(child) = &mut self.current_process
      && let Ok(Some(_status)) = child.try_wait()
    {
      self.current_process = None;
      self.now_playing = None;
    }
  }
}
