//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available —
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Remote collaborators
  pub api_base: String,
  pub profile_sync_timeout_ms: u64,

  // Catalog storage
  pub catalog_file: String,
  pub stamp_file: String,
  pub prefs_file: String,
  /// Ships inside the binary, so the blob is only opaque to a casual reader
  /// of the data directory — never treat it as a real secret.
  pub catalog_passphrase: String,
  pub pbkdf2_iterations: u32,

  // Cross-instance sync
  pub sync_poll_ms: u64,
  pub sync_debounce_ms: u64,

  // UI timers
  pub preview_secs: u64,
  pub notice_ms: u64,
  pub flash_ms: u64,
  pub error_dismiss_secs: u64,

  // Dashboard sections, in display order
  pub categories: Vec<String>,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
