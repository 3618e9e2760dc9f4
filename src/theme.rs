use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub focus: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEME: Theme = Theme {
  name: "shelf",
  bg: Color::Rgb(22, 22, 30),
  fg: Color::Rgb(220, 220, 230),
  accent: Color::Rgb(255, 92, 92),
  muted: Color::Rgb(120, 120, 140),
  border: Color::Rgb(60, 60, 78),
  highlight_fg: Color::Rgb(255, 255, 255),
  highlight_bg: Color::Rgb(70, 40, 48),
  stripe_bg: Color::Rgb(28, 28, 38),
  focus: Color::Rgb(255, 200, 90),
  status: Color::Rgb(130, 200, 255),
  error: Color::Rgb(255, 110, 110),
  key_fg: Color::Rgb(22, 22, 30),
  key_bg: Color::Rgb(160, 160, 180),
};
