use ratatui::style::Color;

/// One color palette. Cycled at runtime with Ctrl+T and persisted by name.
#[derive(Debug)]
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub muted: Color,
  pub accent: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  pub ok: Color,
  pub warn: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "dusk",
    bg: Color::Rgb(18, 18, 24),
    fg: Color::Rgb(220, 220, 228),
    muted: Color::Rgb(130, 130, 145),
    accent: Color::Rgb(125, 196, 228),
    border: Color::Rgb(60, 60, 75),
    status: Color::Rgb(158, 206, 168),
    error: Color::Rgb(240, 120, 120),
    ok: Color::Rgb(139, 212, 139),
    warn: Color::Rgb(245, 158, 11),
    highlight_fg: Color::Rgb(18, 18, 24),
    highlight_bg: Color::Rgb(125, 196, 228),
    stripe_bg: Color::Rgb(24, 24, 32),
    key_fg: Color::Rgb(18, 18, 24),
    key_bg: Color::Rgb(130, 130, 145),
  },
  Theme {
    name: "paper",
    bg: Color::Rgb(247, 245, 240),
    fg: Color::Rgb(40, 40, 46),
    muted: Color::Rgb(120, 118, 110),
    accent: Color::Rgb(34, 108, 160),
    border: Color::Rgb(200, 196, 186),
    status: Color::Rgb(52, 120, 72),
    error: Color::Rgb(186, 48, 48),
    ok: Color::Rgb(52, 140, 72),
    warn: Color::Rgb(180, 110, 10),
    highlight_fg: Color::Rgb(247, 245, 240),
    highlight_bg: Color::Rgb(34, 108, 160),
    stripe_bg: Color::Rgb(238, 235, 228),
    key_fg: Color::Rgb(247, 245, 240),
    key_bg: Color::Rgb(120, 118, 110),
  },
  Theme {
    name: "terminal",
    bg: Color::Reset,
    fg: Color::Gray,
    muted: Color::DarkGray,
    accent: Color::Cyan,
    border: Color::DarkGray,
    status: Color::Green,
    error: Color::Red,
    ok: Color::Green,
    warn: Color::Yellow,
    highlight_fg: Color::Black,
    highlight_bg: Color::Cyan,
    stripe_bg: Color::Reset,
    key_fg: Color::Black,
    key_bg: Color::DarkGray,
  },
];
