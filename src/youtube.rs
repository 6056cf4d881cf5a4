//! Video-id normalization for catalog entries.
//!
//! The admin form accepts whatever the operator pastes — a bare 11-char
//! video id, a full watch URL, a youtu.be short link, an embed URL — and
//! normalizes it to the id alone. Nothing here talks to the network; a
//! shape-valid id is not a promise that the video exists remotely.

/// True when `id` has exactly the 11-char `[A-Za-z0-9_-]` shape of a
/// YouTube video id. Pure shape check.
pub fn is_valid_id(id: &str) -> bool {
  id.len() == 11 && id.bytes().all(is_token_byte)
}

fn is_token_byte(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Read an 11-char token starting at `start`, or `None` if the window is
/// short or contains a non-token byte.
fn token_at(bytes: &[u8], start: usize) -> Option<&str> {
  let end = start.checked_add(11)?;
  let window = bytes.get(start..end)?;
  if window.iter().copied().all(is_token_byte) {
    // Token bytes are pure ASCII, so the slice is valid UTF-8.
    std::str::from_utf8(window).ok()
  } else {
    None
  }
}

/// Extract a video id from arbitrary user input.
///
/// A bare valid id is returned verbatim. Otherwise the input is scanned for
/// an 11-char token introduced by a `v=` query parameter or a `/` path
/// separator — which covers watch, short-link and embed URLs alike. Returns
/// an empty string when nothing matches; the record is then stored as
/// unavailable rather than rejected.
pub fn extract_video_id(input: &str) -> String {
  let trimmed = input.trim();
  if is_valid_id(trimmed) {
    return trimmed.to_string();
  }

  let bytes = trimmed.as_bytes();
  for (i, &b) in bytes.iter().enumerate() {
    let candidate = match b {
      b'/' => token_at(bytes, i + 1),
      b'=' if i > 0 && bytes[i - 1] == b'v' => token_at(bytes, i + 1),
      _ => None,
    };
    if let Some(id) = candidate {
      return id.to_string();
    }
  }
  String::new()
}

/// Deterministic thumbnail URL for a video id. Empty in, empty out — no
/// request is ever made here.
pub fn thumbnail_from_id(id: &str) -> String {
  if id.is_empty() { String::new() } else { format!("https://i.ytimg.com/vi/{}/maxresdefault.jpg", id) }
}

/// Watch-page URL handed to the player.
pub fn watch_url(id: &str) -> String {
  format!("https://www.youtube.com/watch?v={}", id)
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- is_valid_id ---

  #[test]
  fn valid_id_shapes() {
    assert!(is_valid_id("dQw4w9WgXcQ"));
    assert!(is_valid_id("abc_DEF-123"));
    assert!(!is_valid_id("short"));
    assert!(!is_valid_id("twelve-chars"));
    assert!(!is_valid_id("has space 1"));
    assert!(!is_valid_id(""));
  }

  // --- extract_video_id ---

  #[test]
  fn bare_id_passes_through() {
    assert_eq!(extract_video_id("dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    assert_eq!(extract_video_id("  dQw4w9WgXcQ  "), "dQw4w9WgXcQ");
  }

  #[test]
  fn watch_url_query_param() {
    assert_eq!(extract_video_id("https://youtube.com/watch?v=dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"), "dQw4w9WgXcQ");
  }

  #[test]
  fn short_and_embed_urls() {
    assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    assert_eq!(extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
  }

  #[test]
  fn no_match_yields_empty() {
    assert_eq!(extract_video_id("not a url"), "");
    assert_eq!(extract_video_id(""), "");
    assert_eq!(extract_video_id("https://example.com/too-short/abc"), "");
  }

  #[test]
  fn first_plausible_token_wins() {
    // Path segments shorter than 11 token chars are skipped until one fits.
    assert_eq!(extract_video_id("https://youtube.com/v/dQw4w9WgXcQ/extra"), "dQw4w9WgXcQ");
  }

  // --- thumbnail_from_id ---

  #[test]
  fn thumbnail_template() {
    assert_eq!(thumbnail_from_id("dQw4w9WgXcQ"), "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg");
    assert_eq!(thumbnail_from_id(""), "");
  }
}
