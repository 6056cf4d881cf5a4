//! Cross-instance change notification for the shared catalog.
//!
//! Every save bumps the `catalog.updated_at` file; a background task polls
//! it and reports new stamps over a channel. The app debounces the report
//! (~200 ms) and then re-projects from a freshly loaded catalog. This is
//! eventual consistency — a view may show a stale catalog for the debounce
//! window, which the single-operator usage pattern tolerates.

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::constants::constants;

pub struct CatalogWatcher {
  /// New timestamp values, oldest first. Polled from the app loop.
  pub rx: mpsc::Receiver<u64>,
  handle: JoinHandle<()>,
}

impl CatalogWatcher {
  /// Spawn the polling task. The stamp present at spawn time is the
  /// baseline — only later writes are reported.
  pub fn spawn(dir: PathBuf) -> Self {
    let (tx, rx) = mpsc::channel(8);
    let handle = tokio::spawn(async move {
      let stamp_path = dir.join(&constants().stamp_file);
      let read = |path: &PathBuf| -> Option<u64> {
        std::fs::read_to_string(path).ok().and_then(|s| s.trim().parse().ok())
      };
      let mut last_seen = read(&stamp_path);

      loop {
        tokio::time::sleep(Duration::from_millis(constants().sync_poll_ms)).await;
        if let Some(stamp) = read(&stamp_path)
          && last_seen != Some(stamp)
        {
          last_seen = Some(stamp);
          debug!(stamp, "sync: catalog stamp changed");
          if tx.send(stamp).await.is_err() {
            break;
          }
        }
      }
    });
    Self { rx, handle }
  }
}

impl Drop for CatalogWatcher {
  fn drop(&mut self) {
    self.handle.abort();
  }
}
