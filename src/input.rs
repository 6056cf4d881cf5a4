use anyhow::Result;
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{AdminForm, AdminPane, App, AuthMode, LoginForm, Modal, ProfileForm, RegisterForm, Screen};
use crate::player::PlaybackKind;

// --- Text fields ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// A single-line editable field: value, char-indexed cursor, and the
/// horizontal scroll offset the renderer maintains.
#[derive(Debug, Default, Clone)]
pub struct TextField {
  pub value: String,
  pub cursor: usize,
  pub scroll: usize,
}

impl TextField {
  pub fn set(&mut self, value: impl Into<String>) {
    self.value = value.into();
    self.cursor = self.value.chars().count();
    self.scroll = 0;
  }

  pub fn clear(&mut self) {
    self.value.clear();
    self.cursor = 0;
    self.scroll = 0;
  }

  /// Apply an editing key. Returns false for keys that aren't edits so the
  /// caller can route them (focus moves, submits).
  pub fn handle_key(&mut self, code: KeyCode) -> bool {
    match code {
      KeyCode::Char(c) => {
        let byte_idx = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_idx, c);
        self.cursor += 1;
        true
      }
      KeyCode::Backspace => {
        if self.cursor > 0 {
          self.cursor -= 1;
          let byte_idx = char_to_byte_index(&self.value, self.cursor);
          self.value.remove(byte_idx);
        }
        true
      }
      KeyCode::Delete => {
        if self.cursor < self.value.chars().count() {
          let byte_idx = char_to_byte_index(&self.value, self.cursor);
          self.value.remove(byte_idx);
        }
        true
      }
      KeyCode::Left => {
        self.cursor = self.cursor.saturating_sub(1);
        true
      }
      KeyCode::Right => {
        if self.cursor < self.value.chars().count() {
          self.cursor += 1;
        }
        true
      }
      KeyCode::Home => {
        self.cursor = 0;
        true
      }
      KeyCode::End => {
        self.cursor = self.value.chars().count();
        true
      }
      _ => false,
    }
  }
}

// --- Event handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return Ok(());
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
    if app.player.is_playing() {
      app.stop_playback().await;
    }
    return Ok(());
  }

  // The confirmation modal captures everything while it is up — deletion
  // never happens on a stray keypress.
  if let Modal::ConfirmDelete { id, .. } = app.modal.clone() {
    match key.code {
      KeyCode::Char('y') | KeyCode::Enter => {
        app.modal = Modal::None;
        app.delete_course(&id);
      }
      KeyCode::Char('n') | KeyCode::Esc => app.modal = Modal::None,
      _ => {}
    }
    return Ok(());
  }

  match app.screen {
    Screen::Login => handle_login_key(app, key),
    Screen::Dashboard => handle_dashboard_key(app, key).await?,
    Screen::Admin => handle_admin_key(app, key),
    Screen::Profile => handle_profile_key(app, key),
  }
  Ok(())
}

// --- Login screen ---

fn handle_login_key(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    if key.code == KeyCode::Char('r') {
      app.auth_mode = match app.auth_mode {
        AuthMode::Login => AuthMode::Register,
        AuthMode::Register => AuthMode::Login,
      };
      app.clear_error();
    }
    return;
  }

  let fields = match app.auth_mode {
    AuthMode::Login => LoginForm::FIELDS,
    AuthMode::Register => RegisterForm::FIELDS,
  };

  match key.code {
    KeyCode::Enter => match app.auth_mode {
      AuthMode::Login => app.trigger_login(),
      AuthMode::Register => app.trigger_register(),
    },
    KeyCode::Tab | KeyCode::Down => {
      let focus = auth_focus_mut(app);
      *focus = (*focus + 1) % fields;
    }
    KeyCode::BackTab | KeyCode::Up => {
      let focus = auth_focus_mut(app);
      *focus = if *focus == 0 { fields - 1 } else { *focus - 1 };
    }
    KeyCode::Esc => {
      let field = auth_field_mut(app);
      if field.value.is_empty() {
        app.should_quit = true;
      } else {
        field.clear();
      }
    }
    code => {
      app.clear_error();
      auth_field_mut(app).handle_key(code);
    }
  }
}

fn auth_focus_mut(app: &mut App) -> &mut usize {
  match app.auth_mode {
    AuthMode::Login => &mut app.login_form.focus,
    AuthMode::Register => &mut app.register_form.focus,
  }
}

fn auth_field_mut(app: &mut App) -> &mut TextField {
  match app.auth_mode {
    AuthMode::Login => match app.login_form.focus {
      0 => &mut app.login_form.username,
      _ => &mut app.login_form.password,
    },
    AuthMode::Register => match app.register_form.focus {
      0 => &mut app.register_form.username,
      1 => &mut app.register_form.email,
      _ => &mut app.register_form.password,
    },
  }
}

// --- Dashboard screen ---

async fn handle_dashboard_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  match key.code {
    KeyCode::Enter => app.play_selected(PlaybackKind::Watch).await,
    KeyCode::Char('p') => app.play_selected(PlaybackKind::Preview).await,
    KeyCode::Left | KeyCode::Char('h') => {
      let count = app.sections.len();
      if count > 0 {
        let idx = if app.section_index == 0 { count - 1 } else { app.section_index - 1 };
        app.select_section(idx);
      }
    }
    KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
      let count = app.sections.len();
      if count > 0 {
        app.select_section((app.section_index + 1) % count);
      }
    }
    KeyCode::Down | KeyCode::Char('j') => {
      let count = app.current_section().map_or(0, |s| s.records.len());
      if count > 0 {
        let i = app.card_state.selected().map_or(0, |i| (i + 1) % count);
        app.card_state.select(Some(i));
      }
    }
    KeyCode::Up | KeyCode::Char('k') => {
      let count = app.current_section().map_or(0, |s| s.records.len());
      if count > 0 {
        let i = app.card_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
        app.card_state.select(Some(i));
      }
    }
    KeyCode::Char('a') => app.enter_admin(),
    KeyCode::Char('u') => app.enter_profile(),
    KeyCode::Char('x') => app.logout(),
    KeyCode::Char('q') => app.should_quit = true,
    KeyCode::Esc => {
      if app.player.is_playing() {
        app.stop_playback().await;
      } else {
        app.should_quit = true;
      }
    }
    _ => {}
  }
  Ok(())
}

// --- Admin screen ---

fn handle_admin_key(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    if key.code == KeyCode::Char('l') {
      app.clear_form();
    }
    return;
  }

  match app.admin_pane {
    AdminPane::List => handle_admin_list_key(app, key),
    AdminPane::Form => handle_admin_form_key(app, key),
  }
}

fn handle_admin_list_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter | KeyCode::Char('e') => app.start_edit(),
    KeyCode::Char('d') => app.request_delete(),
    KeyCode::Char('n') => app.start_new(),
    KeyCode::Tab => app.admin_pane = AdminPane::Form,
    KeyCode::Down | KeyCode::Char('j') => {
      let count = app.catalog.len();
      if count > 0 {
        let i = app.admin_list_state.selected().map_or(0, |i| (i + 1) % count);
        app.admin_list_state.select(Some(i));
      }
    }
    KeyCode::Up | KeyCode::Char('k') => {
      let count = app.catalog.len();
      if count > 0 {
        let i = app.admin_list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
        app.admin_list_state.select(Some(i));
      }
    }
    KeyCode::Esc => app.enter_dashboard(),
    _ => {}
  }
}

fn handle_admin_form_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.save_course(),
    KeyCode::Tab | KeyCode::Down => {
      app.admin_form.focus = (app.admin_form.focus + 1) % AdminForm::FIELDS;
    }
    KeyCode::BackTab | KeyCode::Up => {
      app.admin_form.focus =
        if app.admin_form.focus == 0 { AdminForm::FIELDS - 1 } else { app.admin_form.focus - 1 };
    }
    KeyCode::Esc => app.admin_pane = AdminPane::List,
    code => {
      if app.admin_form.focus == AdminForm::CATEGORY_FIELD {
        let count = crate::constants::constants().categories.len();
        match code {
          KeyCode::Left => {
            app.admin_form.category_idx =
              if app.admin_form.category_idx == 0 { count - 1 } else { app.admin_form.category_idx - 1 };
          }
          KeyCode::Right => app.admin_form.category_idx = (app.admin_form.category_idx + 1) % count,
          _ => {}
        }
      } else if let Some(field) = app.admin_form.field_mut(app.admin_form.focus) {
        field.handle_key(code);
      }
    }
  }
}

// --- Profile screen ---

fn handle_profile_key(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    if key.code == KeyCode::Char('r') {
      app.clear_profile();
    }
    return;
  }

  match key.code {
    KeyCode::Enter => app.save_profile(),
    KeyCode::Tab | KeyCode::Down => {
      app.profile_form.focus = (app.profile_form.focus + 1) % ProfileForm::FIELDS;
    }
    KeyCode::BackTab | KeyCode::Up => {
      app.profile_form.focus =
        if app.profile_form.focus == 0 { ProfileForm::FIELDS - 1 } else { app.profile_form.focus - 1 };
    }
    KeyCode::Esc => app.enter_dashboard(),
    code => {
      let field = match app.profile_form.focus {
        0 => &mut app.profile_form.display_name,
        1 => &mut app.profile_form.avatar_url,
        _ => &mut app.profile_form.bio,
      };
      field.handle_key(code);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0); // 'a'
    assert_eq!(char_to_byte_index(s, 1), 1); // 'é' starts at byte 1
    assert_eq!(char_to_byte_index(s, 2), 3); // '日' starts at byte 3
    assert_eq!(char_to_byte_index(s, 3), 6); // past end
  }

  // --- TextField ---

  #[test]
  fn field_insert_and_delete_at_cursor() {
    let mut field = TextField::default();
    for c in "title".chars() {
      field.handle_key(KeyCode::Char(c));
    }
    assert_eq!(field.value, "title");
    assert_eq!(field.cursor, 5);

    field.handle_key(KeyCode::Home);
    field.handle_key(KeyCode::Delete);
    assert_eq!(field.value, "itle");

    field.handle_key(KeyCode::End);
    field.handle_key(KeyCode::Backspace);
    assert_eq!(field.value, "itl");
    assert_eq!(field.cursor, 3);
  }

  #[test]
  fn field_edits_multibyte_values() {
    let mut field = TextField::default();
    field.set("مقدمة");
    assert_eq!(field.cursor, 5);
    field.handle_key(KeyCode::Backspace);
    assert_eq!(field.value.chars().count(), 4);
    field.handle_key(KeyCode::Home);
    field.handle_key(KeyCode::Char('x'));
    assert!(field.value.starts_with('x'));
  }

  #[test]
  fn field_ignores_non_edit_keys() {
    let mut field = TextField::default();
    field.set("abc");
    assert!(!field.handle_key(KeyCode::Enter));
    assert!(!field.handle_key(KeyCode::Tab));
    assert_eq!(field.value, "abc");
  }
}
