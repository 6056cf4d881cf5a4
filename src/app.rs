use anyhow::Result;
use ratatui::widgets::ListState;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, AuthSession, Profile};
use crate::catalog::{self, CatalogStore, Section, VideoRecord};
use crate::config::Prefs;
use crate::constants::constants;
use crate::input::TextField;
use crate::player::{PlaybackKind, VideoPlayer};
use crate::sync::CatalogWatcher;
use crate::theme::{THEMES, Theme};
use crate::youtube::{extract_video_id, thumbnail_from_id};

// --- Screens & focus ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Login,
  Dashboard,
  Admin,
  Profile,
}

/// Which form the login screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
  Login,
  Register,
}

/// Focus within the admin screen: the catalog rows or the edit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminPane {
  List,
  Form,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
  None,
  ConfirmDelete { id: String, title: String },
}

// --- Forms ---

#[derive(Default)]
pub struct LoginForm {
  pub username: TextField,
  pub password: TextField,
  pub focus: usize,
}

impl LoginForm {
  pub const FIELDS: usize = 2;
}

#[derive(Default)]
pub struct RegisterForm {
  pub username: TextField,
  pub email: TextField,
  pub password: TextField,
  pub focus: usize,
}

impl RegisterForm {
  pub const FIELDS: usize = 3;
}

/// The admin edit form. `editing_id` is the identity key: set while editing
/// an existing record, `None` while composing a new one.
#[derive(Default)]
pub struct AdminForm {
  pub editing_id: Option<String>,
  pub title: TextField,
  pub description: TextField,
  pub thumbnail: TextField,
  pub video: TextField,
  pub duration: TextField,
  pub level: TextField,
  pub category_idx: usize,
  pub focus: usize,
}

impl AdminForm {
  /// Six text fields plus the category selector.
  pub const FIELDS: usize = 7;
  pub const CATEGORY_FIELD: usize = 6;

  pub fn clear(&mut self) {
    *self = Self::default();
  }

  pub fn category(&self) -> &str {
    constants().categories.get(self.category_idx).map(String::as_str).unwrap_or("featured")
  }

  pub fn field_mut(&mut self, idx: usize) -> Option<&mut TextField> {
    match idx {
      0 => Some(&mut self.title),
      1 => Some(&mut self.description),
      2 => Some(&mut self.thumbnail),
      3 => Some(&mut self.video),
      4 => Some(&mut self.duration),
      5 => Some(&mut self.level),
      _ => None,
    }
  }
}

#[derive(Default)]
pub struct ProfileForm {
  pub display_name: TextField,
  pub avatar_url: TextField,
  pub bio: TextField,
  pub focus: usize,
}

impl ProfileForm {
  pub const FIELDS: usize = 3;
}

// --- Transient messages ---

/// Inline feedback for form actions, auto-dismissed after a few seconds.
pub struct Flash {
  pub text: String,
  pub ok: bool,
  at: Instant,
}

/// In-flight async task receivers, polled from the app loop.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) login_rx: Option<oneshot::Receiver<Result<AuthSession>>>,
  pub(crate) register_rx: Option<oneshot::Receiver<Result<()>>>,
  pub(crate) profile_get_rx: Option<oneshot::Receiver<Result<Profile>>>,
  pub(crate) profile_put_rx: Option<oneshot::Receiver<Result<()>>>,
}

// --- App ---

pub struct App {
  pub screen: Screen,
  pub auth_mode: AuthMode,
  pub theme_index: usize,

  // Data — the catalog snapshot is refreshed from the store before every
  // projection-relevant change; the store on disk is the only truth.
  pub store: CatalogStore,
  pub catalog: Vec<VideoRecord>,
  pub sections: Vec<Section>,
  pub prefs: Prefs,
  data_dir: PathBuf,

  // Dashboard selection
  pub section_index: usize,
  pub card_state: ListState,

  // Admin screen
  pub admin_pane: AdminPane,
  pub admin_list_state: ListState,
  pub admin_form: AdminForm,

  // Auth / profile forms
  pub login_form: LoginForm,
  pub register_form: RegisterForm,
  pub profile_form: ProfileForm,

  // Transient messages
  pub status_message: Option<String>,
  pub last_error: Option<String>,
  error_time: Option<Instant>,
  pub flash: Option<Flash>,
  pub notice: Option<String>,
  notice_time: Option<Instant>,

  pub modal: Modal,

  // Playback
  pub player: VideoPlayer,
  preview_deadline: Option<Instant>,

  // Cross-instance sync
  watcher: CatalogWatcher,
  last_write_stamp: u64,
  reload_due: Option<Instant>,

  api: std::sync::Arc<ApiClient>,
  pub(crate) tasks: AsyncTasks,

  pub should_quit: bool,
}

impl App {
  pub fn new(data_dir: PathBuf, api_base: String, requested: Option<Screen>) -> Self {
    let prefs = Prefs::load(&data_dir);
    let theme_index =
      if let Some(ref name) = prefs.theme_name { THEMES.iter().position(|t| t.name == name).unwrap_or(0) } else { 0 };

    let store = CatalogStore::new(data_dir.clone());
    let watcher = CatalogWatcher::spawn(data_dir.clone());
    let last_write_stamp = store.read_stamp().unwrap_or(0);

    let signed_in = prefs.username.is_some();
    let screen = match requested {
      Some(s) if signed_in => s,
      _ if signed_in => Screen::Dashboard,
      _ => Screen::Login,
    };

    let mut app = Self {
      screen: Screen::Login,
      auth_mode: AuthMode::Login,
      theme_index,
      store,
      catalog: Vec::new(),
      sections: Vec::new(),
      prefs,
      data_dir,
      section_index: 0,
      card_state: ListState::default(),
      admin_pane: AdminPane::List,
      admin_list_state: ListState::default(),
      admin_form: AdminForm::default(),
      login_form: LoginForm::default(),
      register_form: RegisterForm::default(),
      profile_form: ProfileForm::default(),
      status_message: None,
      last_error: None,
      error_time: None,
      flash: None,
      notice: None,
      notice_time: None,
      modal: Modal::None,
      player: VideoPlayer::new(),
      preview_deadline: None,
      watcher,
      last_write_stamp,
      reload_due: None,
      api: std::sync::Arc::new(ApiClient::new(api_base)),
      tasks: AsyncTasks::default(),
      should_quit: false,
    };
    app.reload_catalog();
    match screen {
      Screen::Admin => app.enter_admin(),
      Screen::Profile => app.enter_profile(),
      Screen::Dashboard => app.enter_dashboard(),
      Screen::Login => {}
    }
    app
  }

  pub fn theme(&self) -> &'static Theme {
    // Safety: theme_index is always bounded by modular arithmetic in next_theme()
    // and clamped on initialization.
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.prefs.theme_name = Some(self.theme().name.to_string());
    self.prefs.save(&self.data_dir);
  }

  // --- Transient messages ---

  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  pub fn set_flash(&mut self, text: impl Into<String>, ok: bool) {
    self.flash = Some(Flash { text: text.into(), ok, at: Instant::now() });
  }

  pub fn set_notice(&mut self, text: impl Into<String>) {
    self.notice = Some(text.into());
    self.notice_time = Some(Instant::now());
  }

  fn expire_messages(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
    if let Some(ref flash) = self.flash
      && flash.at.elapsed() >= Duration::from_millis(constants().flash_ms)
    {
      self.flash = None;
    }
    if let Some(t) = self.notice_time
      && t.elapsed() >= Duration::from_millis(constants().notice_ms)
    {
      self.notice = None;
      self.notice_time = None;
    }
  }

  // --- Catalog snapshot ---

  /// Re-read the store and recompute the category partition. Selections
  /// are clamped so a shrunken catalog can't leave them dangling.
  pub fn reload_catalog(&mut self) {
    self.catalog = self.store.load();
    self.sections = catalog::partition(&self.catalog);

    if self.section_index >= self.sections.len() {
      self.section_index = self.sections.len().saturating_sub(1);
    }
    let cards = self.current_section().map_or(0, |s| s.records.len());
    match self.card_state.selected() {
      Some(_) if cards == 0 => self.card_state.select(None),
      Some(i) if i >= cards => self.card_state.select(Some(cards - 1)),
      None if cards > 0 => self.card_state.select(Some(0)),
      _ => {}
    }

    let rows = self.catalog.len();
    match self.admin_list_state.selected() {
      Some(_) if rows == 0 => self.admin_list_state.select(None),
      Some(i) if i >= rows => self.admin_list_state.select(Some(rows - 1)),
      None if rows > 0 => self.admin_list_state.select(Some(0)),
      _ => {}
    }
  }

  pub fn current_section(&self) -> Option<&Section> {
    self.sections.get(self.section_index)
  }

  pub fn selected_card(&self) -> Option<&VideoRecord> {
    let section = self.current_section()?;
    section.records.get(self.card_state.selected()?)
  }

  pub fn selected_admin_record(&self) -> Option<&VideoRecord> {
    self.catalog.get(self.admin_list_state.selected()?)
  }

  pub fn select_section(&mut self, idx: usize) {
    if idx < self.sections.len() {
      self.section_index = idx;
      let cards = self.current_section().map_or(0, |s| s.records.len());
      self.card_state.select(if cards > 0 { Some(0) } else { None });
    }
  }

  // --- Screen transitions ---

  pub fn enter_dashboard(&mut self) {
    self.reload_catalog();
    self.screen = Screen::Dashboard;
    if self.card_state.selected().is_none() {
      let cards = self.current_section().map_or(0, |s| s.records.len());
      self.card_state.select(if cards > 0 { Some(0) } else { None });
    }
  }

  /// Admin is gated on the capability granted at login — a regular session
  /// is bounced with a message, never silently.
  pub fn enter_admin(&mut self) {
    if !self.prefs.is_admin {
      warn!(username = ?self.prefs.username, "admin: access denied");
      self.set_error("This section is for admins only.".to_string());
      self.screen = Screen::Dashboard;
      return;
    }
    self.reload_catalog();
    self.screen = Screen::Admin;
    self.admin_pane = AdminPane::List;
    if self.admin_list_state.selected().is_none() && !self.catalog.is_empty() {
      self.admin_list_state.select(Some(0));
    }
  }

  pub fn enter_profile(&mut self) {
    self.screen = Screen::Profile;
    let username = self.prefs.username.clone().unwrap_or_default();
    self.profile_form.display_name.set(self.prefs.display_name.clone().unwrap_or_else(|| username.clone()));
    self.profile_form.avatar_url.set(self.prefs.avatar_url.clone().unwrap_or_default());
    self.profile_form.bio.set(self.prefs.bio.clone().unwrap_or_default());
    self.profile_form.focus = 0;
    self.trigger_profile_fetch();
  }

  pub fn logout(&mut self) {
    info!(username = ?self.prefs.username, "session: logout");
    self.prefs.username = None;
    self.prefs.is_admin = false;
    self.prefs.save(&self.data_dir);
    self.login_form = LoginForm::default();
    self.register_form = RegisterForm::default();
    self.auth_mode = AuthMode::Login;
    self.screen = Screen::Login;
  }

  // --- Auth ---

  pub fn trigger_login(&mut self) {
    let username = self.login_form.username.value.trim().to_string();
    let password = self.login_form.password.value.clone();
    if username.is_empty() || password.is_empty() {
      self.set_error("Please enter username and password".to_string());
      return;
    }
    self.clear_error();
    self.status_message = Some(format!("Signing in '{}'…", username));

    let api = self.api.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(api.login(&username, &password).await);
    });
    self.tasks.login_rx = Some(rx);
  }

  pub fn trigger_register(&mut self) {
    let username = self.register_form.username.value.trim().to_string();
    let email = self.register_form.email.value.trim().to_string();
    let password = self.register_form.password.value.clone();
    if username.is_empty() || email.is_empty() || password.is_empty() {
      self.set_error("Please fill in all fields".to_string());
      return;
    }
    if password.chars().count() < 6 {
      self.set_error("Password must be at least 6 characters".to_string());
      return;
    }
    self.clear_error();
    self.status_message = Some("Creating account…".to_string());

    let api = self.api.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(api.register(&username, &email, &password).await);
    });
    self.tasks.register_rx = Some(rx);
  }

  // --- Profile ---

  fn trigger_profile_fetch(&mut self) {
    let Some(username) = self.prefs.username.clone() else { return };
    let api = self.api.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(api.fetch_profile(&username).await);
    });
    self.tasks.profile_get_rx = Some(rx);
  }

  /// Save the profile locally first — local state is authoritative — then
  /// try the server under its short deadline.
  pub fn save_profile(&mut self) {
    let username = self.prefs.username.clone().unwrap_or_default();
    let display_name = {
      let trimmed = self.profile_form.display_name.value.trim();
      if trimmed.is_empty() { username.clone() } else { trimmed.to_string() }
    };
    let avatar_url = self.profile_form.avatar_url.value.trim().to_string();
    let bio = self.profile_form.bio.value.trim().to_string();

    self.prefs.display_name = Some(display_name.clone());
    self.prefs.avatar_url = Some(avatar_url.clone());
    self.prefs.bio = Some(bio.clone());
    self.prefs.save(&self.data_dir);

    let profile = Profile { username, display_name, avatar_url, bio };
    let api = self.api.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(api.push_profile(&profile).await);
    });
    self.tasks.profile_put_rx = Some(rx);
  }

  pub fn clear_profile(&mut self) {
    self.prefs.display_name = None;
    self.prefs.avatar_url = None;
    self.prefs.bio = None;
    self.prefs.save(&self.data_dir);
    let username = self.prefs.username.clone().unwrap_or_default();
    self.profile_form.display_name.set(username);
    self.profile_form.avatar_url.clear();
    self.profile_form.bio.clear();
    self.set_notice("Profile reset");
  }

  // --- Admin CRUD ---

  /// Load the selected record's fields into the form, keyed by id.
  pub fn start_edit(&mut self) {
    let Some(record) = self.selected_admin_record().cloned() else {
      self.set_flash("Could not find that entry", false);
      return;
    };
    self.admin_form.editing_id = Some(record.id.clone());
    self.admin_form.title.set(record.title);
    self.admin_form.description.set(record.description);
    self.admin_form.thumbnail.set(record.thumbnail);
    self.admin_form.video.set(record.video_id);
    self.admin_form.duration.set(record.duration);
    self.admin_form.level.set(record.level);
    self.admin_form.category_idx =
      constants().categories.iter().position(|c| *c == record.category).unwrap_or(0);
    self.admin_form.focus = 0;
    self.admin_pane = AdminPane::Form;
    self.set_flash("Loaded entry for editing", true);
  }

  pub fn start_new(&mut self) {
    self.admin_form.clear();
    self.admin_pane = AdminPane::Form;
  }

  /// Validate and persist the form. An empty id means append-with-new-id;
  /// a present id means replace in place.
  pub fn save_course(&mut self) {
    let title = self.admin_form.title.value.trim().to_string();
    if title.is_empty() {
      self.set_flash("Enter a video title", false);
      return;
    }

    let video_id = extract_video_id(&self.admin_form.video.value);
    let thumbnail = {
      let trimmed = self.admin_form.thumbnail.value.trim();
      if trimmed.is_empty() { thumbnail_from_id(&video_id) } else { trimmed.to_string() }
    };
    let editing = self.admin_form.editing_id.is_some();
    let record = VideoRecord {
      id: self.admin_form.editing_id.clone().unwrap_or_else(catalog::generate_id),
      title,
      description: self.admin_form.description.value.trim().to_string(),
      thumbnail,
      video_id,
      duration: self.admin_form.duration.value.trim().to_string(),
      level: self.admin_form.level.value.trim().to_string(),
      category: self.admin_form.category().to_string(),
    };

    match self.store.add_or_update(record) {
      Ok(stamp) => {
        self.last_write_stamp = stamp;
        self.reload_catalog();
        self.admin_form.clear();
        self.admin_pane = AdminPane::List;
        self.set_flash(if editing { "Entry updated" } else { "Entry added" }, true);
      }
      Err(e) => {
        warn!(err = %e, "admin: save failed");
        self.set_flash(format!("Save failed: {:#}", e), false);
      }
    }
  }

  /// Delete goes through a confirmation modal first.
  pub fn request_delete(&mut self) {
    let Some(record) = self.selected_admin_record() else { return };
    self.modal = Modal::ConfirmDelete { id: record.id.clone(), title: record.title.clone() };
  }

  pub fn delete_course(&mut self, id: &str) {
    match self.store.remove(id) {
      Ok(Some(stamp)) => {
        self.last_write_stamp = stamp;
        self.reload_catalog();
        self.set_flash("Entry deleted", true);
      }
      Ok(None) => self.set_flash("Could not find that entry", false),
      Err(e) => {
        warn!(err = %e, "admin: delete failed");
        self.set_flash(format!("Delete failed: {:#}", e), false);
      }
    }
  }

  pub fn clear_form(&mut self) {
    self.admin_form.clear();
    self.set_flash("Form cleared", true);
  }

  // --- Playback ---

  /// Watch or preview the selected dashboard card. Records without a valid
  /// video id short-circuit to a notice — no player is launched for them.
  pub async fn play_selected(&mut self, kind: PlaybackKind) {
    let Some(record) = self.selected_card().cloned() else { return };
    if !record.available() {
      self.set_notice(format!("Video unavailable for \"{}\"", record.title));
      return;
    }
    match self.player.play(&record.video_id, &record.title, kind).await {
      Ok(()) => {
        self.preview_deadline = match kind {
          PlaybackKind::Preview => Some(Instant::now() + Duration::from_secs(constants().preview_secs)),
          PlaybackKind::Watch => None,
        };
      }
      Err(e) => self.set_error(format!("Playback error: {:#}", e)),
    }
  }

  pub async fn stop_playback(&mut self) {
    self.preview_deadline = None;
    if let Err(e) = self.player.stop().await {
      self.set_error(format!("Failed to stop playback: {:#}", e));
    }
  }

  /// Seconds left in the preview window, when one is running.
  pub fn preview_remaining(&self) -> Option<u64> {
    let deadline = self.preview_deadline?;
    if !self.player.is_playing() {
      return None;
    }
    Some(deadline.saturating_duration_since(Instant::now()).as_secs())
  }

  // --- Per-frame bookkeeping ---

  /// Advance timers, absorb watcher events and finished async tasks.
  /// Called once per loop iteration before drawing.
  pub async fn tick(&mut self) {
    self.expire_messages();
    self.player.poll_exit();

    if let Some(deadline) = self.preview_deadline
      && Instant::now() >= deadline
    {
      debug!("player: preview window elapsed");
      self.stop_playback().await;
    }

    // Cross-instance sync: debounce bursts of stamp changes, skip our own
    // writes, then re-project from a fresh load.
    while let Ok(stamp) = self.watcher.rx.try_recv() {
      if stamp > self.last_write_stamp {
        self.reload_due = Some(Instant::now() + Duration::from_millis(constants().sync_debounce_ms));
      }
    }
    if let Some(due) = self.reload_due
      && Instant::now() >= due
    {
      info!("sync: reloading catalog after remote change");
      self.reload_due = None;
      if let Some(stamp) = self.store.read_stamp() {
        self.last_write_stamp = stamp;
      }
      self.reload_catalog();
    }

    self.check_pending();
  }

  fn check_pending(&mut self) {
    if let Some(mut rx) = self.tasks.login_rx.take() {
      match rx.try_recv() {
        Ok(result) => {
          self.status_message = None;
          match result {
            Ok(session) => {
              info!(username = %session.username, "session: signed in");
              self.prefs.username = Some(session.username);
              self.prefs.is_admin = session.is_admin;
              self.prefs.save(&self.data_dir);
              self.login_form = LoginForm::default();
              self.set_notice("Welcome! Loading your dashboard…");
              self.enter_dashboard();
            }
            Err(e) => self.set_error(format!("{:#}", e)),
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => self.tasks.login_rx = Some(rx),
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Sign-in task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.register_rx.take() {
      match rx.try_recv() {
        Ok(result) => {
          self.status_message = None;
          match result {
            Ok(()) => {
              self.register_form = RegisterForm::default();
              self.auth_mode = AuthMode::Login;
              self.set_notice("Account created! Sign in to continue.");
            }
            Err(e) => self.set_error(format!("{:#}", e)),
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => self.tasks.register_rx = Some(rx),
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Registration task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.profile_get_rx.take() {
      match rx.try_recv() {
        Ok(result) => {
          // Silent overlay: local values are already on screen; a server
          // copy refines them, a failure changes nothing.
          if let Ok(profile) = result
            && self.screen == Screen::Profile
          {
            if !profile.display_name.is_empty() {
              self.profile_form.display_name.set(profile.display_name);
            }
            if !profile.avatar_url.is_empty() {
              self.profile_form.avatar_url.set(profile.avatar_url);
            }
            if !profile.bio.is_empty() {
              self.profile_form.bio.set(profile.bio);
            }
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => self.tasks.profile_get_rx = Some(rx),
        Err(oneshot::error::TryRecvError::Closed) => {}
      }
    }

    if let Some(mut rx) = self.tasks.profile_put_rx.take() {
      match rx.try_recv() {
        Ok(result) => match result {
          Ok(()) => self.set_notice("Saved (local & server)"),
          Err(_) => self.set_notice("Saved locally"),
        },
        Err(oneshot::error::TryRecvError::Empty) => self.tasks.profile_put_rx = Some(rx),
        Err(oneshot::error::TryRecvError::Closed) => self.set_notice("Saved locally"),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn admin_form_round_trips_category() {
    let mut form = AdminForm::default();
    assert_eq!(form.category(), "featured");
    form.category_idx = constants().categories.iter().position(|c| c == "programming").unwrap();
    assert_eq!(form.category(), "programming");
    form.category_idx = 9999;
    assert_eq!(form.category(), "featured", "out-of-range index falls back");
  }

  #[test]
  fn admin_form_field_indices_cover_text_fields() {
    let mut form = AdminForm::default();
    for idx in 0..AdminForm::CATEGORY_FIELD {
      assert!(form.field_mut(idx).is_some(), "field {idx} must exist");
    }
    assert!(form.field_mut(AdminForm::CATEGORY_FIELD).is_none(), "category is not a text field");
  }
}
