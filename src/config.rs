use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::constants;

/// Local preferences and session state, stored next to the catalog so every
/// instance sharing the data dir sees the same operator. Load and save fail
/// silently — prefs are never worth interrupting the user over.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Prefs {
  pub theme_name: Option<String>,

  // Session — filled from the login response, cleared on logout. The admin
  // capability comes exclusively from the auth collaborator.
  pub username: Option<String>,
  #[serde(default)]
  pub is_admin: bool,

  // Profile fields, locally authoritative; server sync is best-effort.
  pub display_name: Option<String>,
  pub avatar_url: Option<String>,
  pub bio: Option<String>,
}

impl Prefs {
  pub fn load(dir: &Path) -> Self {
    let prefs_file = dir.join(&constants().prefs_file);
    if let Ok(content) = std::fs::read_to_string(prefs_file)
      && let Ok(prefs) = toml::from_str(&content)
    {
      return prefs;
    }
    Self::default()
  }

  pub fn save(&self, dir: &Path) {
    if std::fs::create_dir_all(dir).is_ok() {
      let prefs_file = dir.join(&constants().prefs_file);
      if let Ok(content) = toml::to_string(self) {
        let _ = std::fs::write(prefs_file, content);
      }
    }
  }
}
