//! The persisted video catalog and its on-disk store.
//!
//! The whole catalog is one encrypted blob (`catalog.enc`) plus a companion
//! millisecond-timestamp file (`catalog.updated_at`) that other running
//! instances watch for changes. Every mutation rewrites the full blob —
//! near-simultaneous writers race and the later one wins. That is accepted:
//! the admin surface assumes a single operator at a time.

use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::codec;
use crate::constants::constants;
use crate::youtube::{extract_video_id, is_valid_id, thumbnail_from_id};

// --- Records ---

/// One video's metadata entry. Serialized with camelCase keys and every
/// field defaulted, so sparse blobs from older writers still parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoRecord {
  pub id: String,
  pub title: String,
  pub description: String,
  pub thumbnail: String,
  pub video_id: String,
  pub duration: String,
  pub level: String,
  pub category: String,
}

impl Default for VideoRecord {
  fn default() -> Self {
    Self {
      id: String::new(),
      title: String::new(),
      description: String::new(),
      thumbnail: String::new(),
      video_id: String::new(),
      duration: String::new(),
      level: String::new(),
      category: "featured".to_string(),
    }
  }
}

impl VideoRecord {
  /// Fill in what a sparse or hand-edited record left out: a generated id,
  /// a video id recovered from the thumbnail URL, a derived thumbnail.
  pub fn hydrated(mut self) -> Self {
    if !is_valid_id(&self.video_id) {
      let source = if self.thumbnail.is_empty() { self.video_id.clone() } else { self.thumbnail.clone() };
      self.video_id = extract_video_id(&source);
    }
    if self.id.is_empty() {
      self.id = generate_id();
    }
    if self.thumbnail.is_empty() {
      self.thumbnail = thumbnail_from_id(&self.video_id);
    }
    self
  }

  /// A record without a shape-valid video id renders unavailable and its
  /// play actions short-circuit.
  pub fn available(&self) -> bool {
    is_valid_id(&self.video_id)
  }
}

/// Client-generated record id: `c_` plus 10 random base36 chars.
pub fn generate_id() -> String {
  const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
  let mut rng = rand::thread_rng();
  let tail: String = (0..10).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect();
  format!("c_{}", tail)
}

// --- Store ---

/// On-disk catalog store. Load never fails outward; mutations report
/// precisely enough for user feedback and cross-instance sync.
pub struct CatalogStore {
  dir: PathBuf,
}

impl CatalogStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn catalog_path(&self) -> PathBuf {
    self.dir.join(&constants().catalog_file)
  }

  fn stamp_path(&self) -> PathBuf {
    self.dir.join(&constants().stamp_file)
  }

  /// Load the full catalog. Missing file, undecryptable blob, or a blob
  /// that isn't a record array all come back as an empty catalog — the
  /// caller shows defaults and the operator retries.
  pub fn load(&self) -> Vec<VideoRecord> {
    let raw = match std::fs::read_to_string(self.catalog_path()) {
      Ok(raw) => raw,
      Err(_) => return Vec::new(),
    };
    match codec::decrypt::<Vec<VideoRecord>>(&raw) {
      Some(records) => records.into_iter().map(VideoRecord::hydrated).collect(),
      None => {
        warn!("catalog: blob present but unreadable, treating as empty");
        Vec::new()
      }
    }
  }

  /// Encrypt and write the full catalog, then bump the timestamp file.
  /// Returns the stamp written so the caller can recognize its own write
  /// when the watcher reports it.
  pub fn save(&self, records: &[VideoRecord]) -> Result<u64> {
    std::fs::create_dir_all(&self.dir)
      .with_context(|| format!("Failed to create data dir {}", self.dir.display()))?;
    let sealed = codec::encrypt(&records).context("Failed to encrypt catalog")?;
    std::fs::write(self.catalog_path(), sealed).context("Failed to write catalog blob")?;

    // Blob first, stamp second — a watcher that sees the new stamp must
    // find the new blob behind it.
    let stamp = chrono::Utc::now().timestamp_millis() as u64;
    std::fs::write(self.stamp_path(), stamp.to_string()).context("Failed to write catalog stamp")?;
    debug!(stamp, count = records.len(), "catalog: saved");
    Ok(stamp)
  }

  /// Insert `record`, or replace the entry with the same id in place —
  /// position and catalog order are preserved. The caller validates the
  /// title before getting here.
  pub fn add_or_update(&self, record: VideoRecord) -> Result<u64> {
    let mut records = self.load();
    match records.iter_mut().find(|r| r.id == record.id) {
      Some(slot) => *slot = record,
      None => records.push(record),
    }
    self.save(&records)
  }

  /// Remove the record with `id`. Returns the new stamp, or `None` when no
  /// record matched — the catalog is left untouched in that case.
  pub fn remove(&self, id: &str) -> Result<Option<u64>> {
    let mut records = self.load();
    let before = records.len();
    records.retain(|r| r.id != id);
    if records.len() == before {
      return Ok(None);
    }
    self.save(&records).map(Some)
  }

  /// Current value of the timestamp file, if readable.
  pub fn read_stamp(&self) -> Option<u64> {
    let raw = std::fs::read_to_string(self.stamp_path()).ok()?;
    raw.trim().parse().ok()
  }
}

// --- Category partition ---

/// One dashboard section: a category name and its records in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
  pub category: String,
  pub records: Vec<VideoRecord>,
}

/// Partition the catalog by category. Known categories appear in their
/// fixed display order (empty ones included, like the dashboard's fixed
/// grids); categories the catalog invented trail behind in first-seen
/// order. Computed on every read — there is no secondary index to drift.
pub fn partition(records: &[VideoRecord]) -> Vec<Section> {
  let known = &constants().categories;
  let mut sections: Vec<Section> =
    known.iter().map(|c| Section { category: c.clone(), records: Vec::new() }).collect();

  for record in records {
    match sections.iter_mut().find(|s| s.category == record.category) {
      Some(section) => section.records.push(record.clone()),
      None => sections.push(Section { category: record.category.clone(), records: vec![record.clone()] }),
    }
  }
  sections
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn temp_store() -> CatalogStore {
    static SEQ: AtomicU32 = AtomicU32::new(0);
    let dir = std::env::temp_dir().join(format!(
      "coursedeck-test-{}-{}",
      std::process::id(),
      SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    CatalogStore::new(dir)
  }

  fn record(id: &str, title: &str) -> VideoRecord {
    VideoRecord {
      id: id.to_string(),
      title: title.to_string(),
      video_id: "dQw4w9WgXcQ".to_string(),
      ..VideoRecord::default()
    }
  }

  // --- load / save ---

  #[test]
  fn load_missing_is_empty() {
    assert!(temp_store().load().is_empty());
  }

  #[test]
  fn save_load_round_trip_preserves_order() {
    let store = temp_store();
    let records = vec![record("c_a", "One"), record("c_b", "Two"), record("c_c", "Three")];
    store.save(&records).expect("save");
    let loaded = store.load();
    let titles: Vec<&str> = loaded.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["One", "Two", "Three"]);
  }

  #[test]
  fn corrupt_blob_loads_empty() {
    let store = temp_store();
    store.save(&[record("c_a", "One")]).expect("save");
    std::fs::write(store.dir().join(&constants().catalog_file), "definitely not an envelope").unwrap();
    assert!(store.load().is_empty());
  }

  #[test]
  fn sparse_foreign_blob_gets_defaults() {
    // A blob written by an older client: camelCase keys, fields missing.
    let store = temp_store();
    let foreign = serde_json::json!([
      {"title": "Old entry", "videoId": "dQw4w9WgXcQ"},
      {"id": "c_keep000000", "title": "Derives id from thumbnail",
       "thumbnail": "https://i.ytimg.com/vi/abc_DEF-123/maxresdefault.jpg"},
    ]);
    std::fs::create_dir_all(store.dir()).unwrap();
    std::fs::write(store.dir().join(&constants().catalog_file), crate::codec::encrypt(&foreign).unwrap()).unwrap();

    let loaded = store.load();
    assert_eq!(loaded.len(), 2);
    assert!(loaded[0].id.starts_with("c_"), "missing id is generated");
    assert_eq!(loaded[0].category, "featured", "missing category defaults");
    assert_eq!(loaded[0].thumbnail, "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg");
    assert_eq!(loaded[1].video_id, "abc_DEF-123", "video id recovered from thumbnail URL");
  }

  // --- add_or_update ---

  #[test]
  fn add_appends_update_replaces_in_place() {
    let store = temp_store();
    store.save(&[record("c_a", "One"), record("c_b", "Two")]).expect("save");

    store.add_or_update(record("c_c", "Three")).expect("add");
    assert_eq!(store.load().len(), 3);

    let mut edited = record("c_a", "One, revised");
    edited.category = "programming".to_string();
    store.add_or_update(edited).expect("update");

    let loaded = store.load();
    assert_eq!(loaded.len(), 3, "replace must not grow the catalog");
    assert_eq!(loaded[0].id, "c_a", "position preserved");
    assert_eq!(loaded[0].title, "One, revised");
    assert_eq!(loaded[0].category, "programming");
  }

  // --- remove ---

  #[test]
  fn remove_absent_reports_not_found_and_leaves_catalog() {
    let store = temp_store();
    store.save(&[record("c_a", "One"), record("c_b", "Two")]).expect("save");
    let stamp_before = store.read_stamp();

    assert!(store.remove("c_missing").expect("remove").is_none());
    let loaded = store.load();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].id, "c_a");
    assert_eq!(store.read_stamp(), stamp_before, "no write on not-found");
  }

  #[test]
  fn remove_present_filters_by_id() {
    let store = temp_store();
    store.save(&[record("c_a", "One"), record("c_b", "Two")]).expect("save");
    assert!(store.remove("c_a").expect("remove").is_some());
    let loaded = store.load();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, "c_b");
  }

  // --- partition ---

  #[test]
  fn partition_keeps_known_order_and_trails_unknown() {
    let mut a = record("c_a", "A");
    a.category = "programming".to_string();
    let mut b = record("c_b", "B");
    b.category = "homebrew".to_string();
    let c = record("c_c", "C"); // featured by default
    let mut d = record("c_d", "D");
    d.category = "programming".to_string();

    let sections = partition(&[a, b, c, d]);
    let names: Vec<&str> = sections.iter().map(|s| s.category.as_str()).collect();
    assert_eq!(names, ["featured", "cybersecurity", "programming", "ai", "networking", "webdev", "datascience", "homebrew"]);

    let programming = sections.iter().find(|s| s.category == "programming").unwrap();
    let titles: Vec<&str> = programming.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["A", "D"], "catalog order within a section");
  }

  // --- ids ---

  #[test]
  fn generated_ids_have_shape_and_vary() {
    let a = generate_id();
    let b = generate_id();
    assert_eq!(a.len(), 12);
    assert!(a.starts_with("c_"));
    assert!(a[2..].bytes().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    assert_ne!(a, b);
  }
}
