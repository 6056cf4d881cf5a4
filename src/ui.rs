use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span, Text},
  widgets::{Block, Clear, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{AdminForm, AdminPane, App, AuthMode, Modal, Screen};
use crate::input::TextField;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// A centered rect of at most `width` x `height` inside `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
  let w = width.min(area.width);
  let h = height.min(area.height);
  Rect { x: area.x + (area.width - w) / 2, y: area.y + (area.height - h) / 2, width: w, height: h }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());

  render_header(frame, app, header_area);
  match app.screen {
    Screen::Login => render_login(frame, app, main_area),
    Screen::Dashboard => render_dashboard(frame, app, main_area),
    Screen::Admin => render_admin(frame, app, main_area),
    Screen::Profile => render_profile(frame, app, main_area),
  }
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);

  render_notice(frame, app, main_area);
  render_modal(frame, app, frame.area());
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let left = Line::from(Span::styled(" ⊳ coursedeck ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let session = match (&app.prefs.username, app.prefs.is_admin) {
    (Some(name), true) => format!("{} (admin) · ", name),
    (Some(name), false) => format!("{} · ", name),
    (None, _) => String::new(),
  };
  let right = format!("{}v{} ", session, env!("CARGO_PKG_VERSION"));
  let right_w = (right.chars().count() as u16).min(area.width);
  let right_area = Rect { x: area.x + area.width.saturating_sub(right_w), width: right_w, ..area };
  frame.render_widget(Line::from(Span::styled(&right, Style::default().fg(theme.muted))), right_area);
}

// --- Text fields ---

/// Render one labelled field. Keeps the field's horizontal scroll in step
/// with the cursor and places the terminal cursor when focused.
fn render_field(frame: &mut Frame, theme: &Theme, area: Rect, label: &str, field: &mut TextField, focused: bool, masked: bool) {
  let border_color = if focused { theme.accent } else { theme.border };
  let block = Block::bordered()
    .title(format!(" {} ", label))
    .title_style(Style::default().fg(border_color))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let shown: String =
    if masked { std::iter::repeat('•').take(field.value.chars().count()).collect() } else { field.value.clone() };

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&shown, field.cursor);

  if cursor_col < field.scroll {
    field.scroll = cursor_col;
  } else if cursor_col >= field.scroll + inner_w {
    field.scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = shown
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= field.scroll)
    .take_while(|(start, _, _)| *start < field.scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(block);
  frame.render_widget(paragraph, area);

  if focused {
    let cursor_x = area.x + 2 + (cursor_col - field.scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

// --- Login screen ---

fn render_login(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let is_register = app.auth_mode == AuthMode::Register;
  let fields = if is_register { 3 } else { 2 };
  let box_h = 6 + fields as u16 * 3;
  let outer = centered_rect(56, box_h, area);

  let title = if is_register { " Create your account " } else { " Sign in to continue " };
  let block = Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(2));
  let inner = block.inner(outer);
  frame.render_widget(block, outer);

  let mut constraints = vec![Constraint::Length(1)];
  constraints.extend(std::iter::repeat(Constraint::Length(3)).take(fields));
  constraints.push(Constraint::Length(1));
  constraints.push(Constraint::Min(0));
  let rows = Layout::vertical(constraints).split(inner);

  let tagline = if is_register { "Join the library of courses." } else { "Your courses are waiting." };
  frame.render_widget(Paragraph::new(tagline).style(Style::default().fg(theme.muted)), rows[0]);

  if is_register {
    let focus = app.register_form.focus;
    render_field(frame, theme, rows[1], "Username", &mut app.register_form.username, focus == 0, false);
    render_field(frame, theme, rows[2], "Email", &mut app.register_form.email, focus == 1, false);
    render_field(frame, theme, rows[3], "Password", &mut app.register_form.password, focus == 2, true);
  } else {
    let focus = app.login_form.focus;
    render_field(frame, theme, rows[1], "Username", &mut app.login_form.username, focus == 0, false);
    render_field(frame, theme, rows[2], "Password", &mut app.login_form.password, focus == 1, true);
  }

  let toggle = if is_register { "Already registered? Ctrl+R to sign in." } else { "No account? Ctrl+R to register." };
  frame.render_widget(
    Paragraph::new(toggle).style(Style::default().fg(theme.muted)),
    rows[rows.len() - 2],
  );
}

// --- Dashboard screen ---

fn render_dashboard(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [sections_area, right_area] =
    Layout::horizontal([Constraint::Length(26), Constraint::Min(30)]).areas(area);
  let [cards_area, detail_area] = Layout::vertical([Constraint::Min(5), Constraint::Length(7)]).areas(right_area);

  // Section rail
  let section_items: Vec<ListItem> = app
    .sections
    .iter()
    .enumerate()
    .map(|(i, section)| {
      let selected = i == app.section_index;
      let fg = if selected { theme.highlight_fg } else { theme.fg };
      let bg = if selected { theme.highlight_bg } else { theme.bg };
      let label = format!(" {:<16} {:>3} ", truncate_str(&section.category, 16), section.records.len());
      ListItem::new(Line::from(Span::styled(label, Style::default().fg(fg)))).bg(bg)
    })
    .collect();
  let sections_list = List::new(section_items).block(
    Block::bordered()
      .title(" Sections ")
      .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
      .border_type(ratatui::widgets::BorderType::Rounded)
      .border_style(Style::default().fg(theme.border)),
  );
  frame.render_widget(sections_list, sections_area);

  // Cards for the selected section
  let inner_w = cards_area.width.saturating_sub(4) as usize;
  let (section_name, card_items): (String, Vec<ListItem>) = match app.current_section() {
    Some(section) if !section.records.is_empty() => {
      let items = section
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| {
          let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
          let mut title_spans =
            vec![Span::styled(truncate_str(&record.title, inner_w.saturating_sub(14)), Style::default().fg(theme.fg))];
          if !record.available() {
            title_spans.push(Span::styled("  Unavailable", Style::default().fg(theme.warn)));
          }
          let meta = [record.duration.as_str(), record.level.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" · ");
          let meta_line = if meta.is_empty() { "VIDEO".to_string() } else { format!("VIDEO · {}", meta) };
          let lines = vec![
            Line::from(title_spans),
            Line::from(Span::styled(truncate_str(&meta_line, inner_w), Style::default().fg(theme.muted))),
          ];
          ListItem::new(Text::from(lines)).bg(bg)
        })
        .collect();
      (section.category.clone(), items)
    }
    Some(section) => (section.category.clone(), Vec::new()),
    None => (String::new(), Vec::new()),
  };

  let cards_block = Block::bordered()
    .title(format!(" {} ", section_name))
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(theme.border));

  if card_items.is_empty() {
    let empty = Paragraph::new(vec![
      Line::from(""),
      Line::from(Span::styled("No videos in this section yet.", Style::default().fg(theme.muted))),
    ])
    .alignment(Alignment::Center)
    .block(cards_block);
    frame.render_widget(empty, cards_area);
  } else {
    let list = List::new(card_items)
      .block(cards_block)
      .highlight_symbol("▶ ")
      .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(list, cards_area, &mut app.card_state);
  }

  render_card_detail(frame, app, detail_area);
}

fn render_card_detail(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let block = Block::bordered()
    .title(" Details ")
    .title_style(Style::default().fg(theme.accent))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1));

  let Some(record) = app.selected_card() else {
    frame.render_widget(block, area);
    return;
  };

  let inner_w = area.width.saturating_sub(4) as usize;
  let mut lines = vec![Line::from(Span::styled(
    truncate_str(&record.title, inner_w),
    Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
  ))];
  if !record.description.is_empty() {
    lines.push(Line::from(Span::styled(truncate_str(&record.description, inner_w), Style::default().fg(theme.fg))));
  }
  lines.push(Line::from(Span::styled(
    format!(
      "Section {} · Duration {} · Level {}",
      record.category,
      if record.duration.is_empty() { "-" } else { record.duration.as_str() },
      if record.level.is_empty() { "-" } else { record.level.as_str() }
    ),
    Style::default().fg(theme.muted),
  )));
  if record.available() {
    lines.push(Line::from(Span::styled(
      truncate_str(&record.thumbnail, inner_w),
      Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
    )));
  } else {
    lines.push(Line::from(Span::styled(
      "Unavailable — no valid video id; playback is disabled.",
      Style::default().fg(theme.warn),
    )));
  }

  frame.render_widget(Paragraph::new(lines).block(block), area);
}

// --- Admin screen ---

fn render_admin(frame: &mut Frame, app: &mut App, area: Rect) {
  let [list_area, form_area] =
    Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(area);

  render_admin_list(frame, app, list_area);
  render_admin_form(frame, app, form_area);
}

fn render_admin_list(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.admin_pane == AdminPane::List;
  let border_color = if focused { theme.accent } else { theme.border };
  let inner_w = area.width.saturating_sub(4) as usize;

  let block = Block::bordered()
    .title(format!(" Catalog — {} entries ", app.catalog.len()))
    .title_style(Style::default().fg(border_color).add_modifier(Modifier::BOLD))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(border_color));

  if app.catalog.is_empty() {
    let empty = Paragraph::new(vec![
      Line::from(""),
      Line::from(Span::styled("No videos yet.", Style::default().fg(theme.muted))),
      Line::from(Span::styled("Press n to add the first entry.", Style::default().fg(theme.muted))),
    ])
    .alignment(Alignment::Center)
    .block(block);
    frame.render_widget(empty, area);
    return;
  }

  let items: Vec<ListItem> = app
    .catalog
    .iter()
    .enumerate()
    .map(|(i, record)| {
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      let mut title_spans =
        vec![Span::styled(truncate_str(&record.title, inner_w.saturating_sub(14)), Style::default().fg(theme.fg))];
      if !record.available() {
        title_spans.push(Span::styled("  Unavailable", Style::default().fg(theme.warn)));
      }
      let meta = format!(
        "{} · {} · {}",
        record.category,
        if record.duration.is_empty() { "-" } else { record.duration.as_str() },
        if record.level.is_empty() { "-" } else { record.level.as_str() }
      );
      let lines = vec![
        Line::from(title_spans),
        Line::from(Span::styled(truncate_str(&meta, inner_w), Style::default().fg(theme.muted))),
      ];
      ListItem::new(Text::from(lines)).bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, area, &mut app.admin_list_state);
}

fn render_admin_form(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let pane_focused = app.admin_pane == AdminPane::Form;
  let border_color = if pane_focused { theme.accent } else { theme.border };

  let title = match app.admin_form.editing_id {
    Some(ref id) => format!(" Edit entry — {} ", id),
    None => " New entry ".to_string(),
  };
  let block = Block::bordered()
    .title(title)
    .title_style(Style::default().fg(border_color).add_modifier(Modifier::BOLD))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(border_color));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let rows = Layout::vertical([
    Constraint::Length(3),
    Constraint::Length(3),
    Constraint::Length(3),
    Constraint::Length(3),
    Constraint::Length(3),
    Constraint::Length(3),
    Constraint::Length(1),
    Constraint::Min(0),
  ])
  .split(inner);

  let focus = app.admin_form.focus;
  let labels = ["Title", "Description", "Thumbnail URL", "Video id or URL", "Duration", "Level"];
  for (idx, label) in labels.iter().enumerate() {
    let focused = pane_focused && focus == idx;
    if let Some(field) = app.admin_form.field_mut(idx) {
      render_field(frame, theme, rows[idx], label, field, focused, false);
    }
  }

  let category_focused = pane_focused && focus == AdminForm::CATEGORY_FIELD;
  let category_style =
    if category_focused { Style::default().fg(theme.accent).add_modifier(Modifier::BOLD) } else { Style::default().fg(theme.fg) };
  let category = Line::from(vec![
    Span::styled(" Section  ", Style::default().fg(theme.muted)),
    Span::styled(format!("‹ {} ›", app.admin_form.category()), category_style),
  ]);
  frame.render_widget(Paragraph::new(category), rows[6]);
}

// --- Profile screen ---

fn render_profile(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let outer = centered_rect(64, 16, area);
  let username = app.prefs.username.clone().unwrap_or_default();

  let block = Block::bordered()
    .title(" Your profile ")
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(2));
  let inner = block.inner(outer);
  frame.render_widget(block, outer);

  let rows = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(3),
    Constraint::Length(3),
    Constraint::Min(0),
  ])
  .split(inner);

  let heading = match app.prefs.display_name {
    Some(ref name) if !name.is_empty() => name.clone(),
    _ => username.clone(),
  };
  frame.render_widget(
    Paragraph::new(Span::styled(heading, Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    rows[0],
  );
  frame.render_widget(
    Paragraph::new(Span::styled(format!("@{}", username), Style::default().fg(theme.muted))),
    rows[1],
  );

  let focus = app.profile_form.focus;
  render_field(frame, theme, rows[2], "Display name", &mut app.profile_form.display_name, focus == 0, false);
  render_field(frame, theme, rows[3], "Avatar URL", &mut app.profile_form.avatar_url, focus == 1, false);
  render_field(frame, theme, rows[4], "Bio", &mut app.profile_form.bio, focus == 2, false);
}

// --- Status, footer, overlays ---

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(flash) = &app.flash {
    let color = if flash.ok { theme.ok } else { theme.error };
    (format!(" {} {}", if flash.ok { "✓" } else { "⚠" }, flash.text), Style::default().fg(color))
  } else if let Some(now) = &app.player.now_playing {
    let label = match app.preview_remaining() {
      Some(secs) => format!(" ▶ {} (preview, {}s left)", now.title, secs),
      None => format!(" ▶ {}", now.title),
    };
    (label, Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let playing = app.player.is_playing();
  let keys: Vec<(&str, &str)> = match app.screen {
    Screen::Login => {
      let submit = if app.auth_mode == AuthMode::Register { "Create" } else { "Sign in" };
      let toggle = if app.auth_mode == AuthMode::Register { "Sign-in form" } else { "Register" };
      vec![("Enter", submit), ("Tab", "Next"), ("^r", toggle), ("^t", "Theme"), ("Esc", "Quit")]
    }
    Screen::Dashboard => {
      let mut k = vec![("Enter", "Watch"), ("p", "Preview"), ("←/→", "Section"), ("j/k", "Cards")];
      if app.prefs.is_admin {
        k.push(("a", "Admin"));
      }
      k.push(("u", "Profile"));
      if playing {
        k.push(("^s", "Stop"));
      }
      k.push(("x", "Logout"));
      k.push(("q", "Quit"));
      k
    }
    Screen::Admin => match app.admin_pane {
      AdminPane::List => {
        vec![("e", "Edit"), ("d", "Delete"), ("n", "New"), ("j/k", "Rows"), ("Tab", "Form"), ("Esc", "Back")]
      }
      AdminPane::Form => {
        vec![("Enter", "Save"), ("Tab", "Next field"), ("←/→", "Section"), ("^l", "Clear"), ("Esc", "List")]
      }
    },
    Screen::Profile => vec![("Enter", "Save"), ("Tab", "Next"), ("^r", "Reset"), ("Esc", "Back")],
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw(" "));
      }
      s
    })
    .collect();
  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted))), right_area);
}

fn render_notice(frame: &mut Frame, app: &App, area: Rect) {
  let Some(ref notice) = app.notice else { return };
  let theme = app.theme();
  let width = (notice.chars().count() as u16 + 6).min(area.width);
  let rect = centered_rect(width, 3, area);
  frame.render_widget(Clear, rect);
  let block = Block::bordered()
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(theme.accent))
    .style(Style::default().bg(theme.bg));
  frame.render_widget(
    Paragraph::new(notice.as_str()).alignment(Alignment::Center).style(Style::default().fg(theme.fg)).block(block),
    rect,
  );
}

fn render_modal(frame: &mut Frame, app: &App, area: Rect) {
  let Modal::ConfirmDelete { ref title, .. } = app.modal else { return };
  let theme = app.theme();
  let rect = centered_rect(56, 7, area);
  frame.render_widget(Clear, rect);

  let block = Block::bordered()
    .title(" Delete entry ")
    .title_style(Style::default().fg(theme.error).add_modifier(Modifier::BOLD))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(theme.error))
    .style(Style::default().bg(theme.bg))
    .padding(Padding::horizontal(1));

  let lines = vec![
    Line::from(Span::styled(
      format!("Delete \"{}\"?", truncate_str(title, 40)),
      Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
    )),
    Line::from(Span::styled("This permanently removes the entry.", Style::default().fg(theme.muted))),
    Line::from(""),
    Line::from(vec![
      Span::styled(" y ", Style::default().fg(theme.key_fg).bg(theme.key_bg)),
      Span::styled(" Delete   ", Style::default().fg(theme.muted)),
      Span::styled(" n ", Style::default().fg(theme.key_fg).bg(theme.key_bg)),
      Span::styled(" Cancel", Style::default().fg(theme.muted)),
    ]),
  ];
  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), rect);
}
