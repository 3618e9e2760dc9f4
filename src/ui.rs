use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, List, ListItem, ListState, Padding, Paragraph},
};
use std::sync::Arc;

use crate::app::{App, AppMode};
use crate::config::SearchScope;
use crate::selection::{Placement, Position};
use crate::theme::Theme;
use crate::video::{ResultSet, Video};

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` columns, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  use unicode_width::UnicodeWidthStr;
  if s.width() <= max_width {
    return s.to_string();
  }
  let budget = max_width.saturating_sub(1);
  let mut used = 0;
  let mut out = String::new();
  for c in s.chars() {
    let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
    if used + w > budget {
      break;
    }
    used += w;
    out.push(c);
  }
  format!("{}…", out)
}

fn format_position(p: Position) -> String {
  format!("x{:>5} y{:>5} z{:>6} ⟲{:>4}° ↻{:>4}°", p.x, p.y, p.z, p.tilt, p.turn)
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ▶ ytshelf ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  let Some(results) = app.results().filter(|r| !r.is_empty()).map(Arc::clone) else {
    render_welcome(frame, app, area);
    return;
  };

  let [list_area, stage_area] = Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);
  let title = match app.search.last_query() {
    Some(q) => format!(" Results: {} ", q),
    None => " Results ".to_string(),
  };
  let focused_id = app.selection.selected_id().map(str::to_string);
  let active = app.mode == AppMode::Results;
  let theme = app.theme();
  render_result_list(frame, theme, &results, focused_id.as_deref(), &title, active, &mut app.list_state, list_area);

  match app.selection.selected() {
    Some(video) => render_focused(frame, app, video, stage_area),
    None => render_shelf(frame, app, stage_area),
  }
}

fn render_welcome(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let scope = match &app.search.config().scope {
    SearchScope::FreeText => "Search all of YouTube.".to_string(),
    SearchScope::Channel(id) => format!("Searching within channel {}.", id),
  };
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("▶  Welcome to ytshelf", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled(scope, Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled("Type a query below and press Enter.", Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
    Block::bordered()
      .border_type(ratatui::widgets::BorderType::Rounded)
      .border_style(Style::default().fg(theme.border)),
  );
  frame.render_widget(paragraph, area);
}

/// Striped list of videos with duration and date on the right. Shared by every
/// view that lists a result set.
#[allow(clippy::too_many_arguments)]
fn render_result_list(
  frame: &mut Frame,
  theme: &Theme,
  results: &ResultSet,
  focused_id: Option<&str>,
  title: &str,
  active: bool,
  state: &mut ListState,
  area: Rect,
) {
  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;

  let items: Vec<ListItem> = results
    .iter()
    .enumerate()
    .map(|(i, video)| {
      let is_focused = focused_id == Some(video.id.as_str());
      let fg = if is_focused { theme.focus } else { theme.fg };
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };

      let right = format!("{}  {}", video.duration_label(), video.published_at.format("%Y-%m-%d"));
      let right_w = right.chars().count();
      let title_max = inner_w.saturating_sub(right_w + 2);
      let title = truncate_str(&video.title, title_max);
      let title_w = unicode_width::UnicodeWidthStr::width(title.as_str());
      let gap = inner_w.saturating_sub(title_w + right_w);

      let mut title_style = Style::default().fg(fg);
      if is_focused {
        title_style = title_style.add_modifier(Modifier::BOLD);
      }
      let line = Line::from(vec![
        Span::styled(title, title_style),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(theme.muted)),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let border = if active { theme.accent } else { theme.border };
  let list = List::new(items)
    .block(
      Block::bordered()
        .title(title.to_string())
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(border)),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, state);
}

fn render_focused(frame: &mut Frame, app: &App, video: &Video, area: Rect) {
  let theme = app.theme();
  let block = Block::bordered()
    .title(Span::styled(" Focused ", Style::default().fg(theme.focus).add_modifier(Modifier::BOLD)))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1));
  let inner_w = area.width.saturating_sub(4) as usize;

  let field = |label: &'static str, value: String| {
    let value_w = inner_w.saturating_sub(label.len());
    Line::from(vec![
      Span::styled(label, Style::default().fg(theme.muted)),
      Span::styled(truncate_str(&value, value_w), Style::default().fg(theme.fg)),
    ])
  };

  let mut lines = vec![
    Line::from(""),
    Line::from(Span::styled(truncate_str(&video.title, inner_w), Style::default().fg(theme.fg).bold())),
    Line::from(""),
    field("Duration  ", video.duration_label()),
    field("Published ", video.published_at.format("%Y-%m-%d %H:%M").to_string()),
    field("Updated   ", video.updated_at.format("%Y-%m-%d %H:%M").to_string()),
  ];
  if let Some(p) = app.selection.focused_position() {
    lines.push(field("Stage     ", format_position(p)));
  }
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    truncate_str(&video.watch_url(), inner_w),
    Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
  )));
  if !video.description.is_empty() {
    lines.push(Line::from(""));
    lines.extend(
      video
        .description
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| Line::from(Span::styled(truncate_str(l, inner_w), Style::default().fg(theme.muted)))),
    );
  }

  frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_shelf(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let outgoing = app.selection.outgoing().len();
  let mut title = vec![Span::styled(" Shelf ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))];
  if outgoing > 0 {
    title.push(Span::styled(format!("[{} leaving] ", outgoing), Style::default().fg(theme.muted)));
  }
  let block = Block::bordered()
    .title(Line::from(title))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1));
  let inner_w = area.width.saturating_sub(4) as usize;

  let lines: Vec<Line> = app
    .selection
    .placements()
    .iter()
    .filter(|p: &&Placement| !p.hidden)
    .map(|p| {
      let label = format!("{:>3} ", p.rank + 1);
      let pos = format_position(p.position);
      let title_w = inner_w.saturating_sub(label.len() + pos.chars().count() + 1);
      Line::from(vec![
        Span::styled(label, Style::default().fg(theme.muted)),
        Span::styled(format!("{:<w$} ", truncate_str(&p.video.title, title_w), w = title_w), Style::default().fg(theme.fg)),
        Span::styled(pos, Style::default().fg(theme.muted)),
      ])
    })
    .collect();

  frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ℹ  {}", info), Style::default().fg(theme.muted))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Input { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(app.scope_label())
    .title_style(Style::default().fg(border_color))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  if inner_w == 0 {
    // No room for text or a cursor.
    frame.render_widget(input_block, area);
    return;
  }
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if app.mode == AppMode::Input {
    let cursor_x = area.x + 2 + cursor_col.saturating_sub(app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Input => {
      let mut k = vec![("Enter", "Search")];
      if app.has_results() {
        k.push(("↓", "Results"));
        k.push(("Esc", "Results"));
      } else {
        k.push(("Esc", "Quit"));
      }
      k
    }
    AppMode::Results => {
      let mut k = vec![("Enter", "Focus"), ("j/k", "Navigate")];
      if app.selection.selected().is_some() {
        k.push(("d", "Unfocus"));
      }
      k.push(("^o", "Open"));
      k.push(("Esc", "Back"));
      k
    }
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
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::SearchConfig;
  use crate::testing::ScriptedFetcher;
  use crate::youtube::FetchAdapter;
  use ratatui::{Terminal, backend::TestBackend};

  fn idle_app() -> App {
    App::new(SearchConfig::default(), Arc::new(ScriptedFetcher::default()) as Arc<dyn FetchAdapter>, false)
  }

  #[test]
  fn draws_in_a_terminal_too_narrow_for_the_input() {
    let mut app = idle_app();
    app.set_input("cats");
    for width in [3, 4, 5] {
      let mut terminal = Terminal::new(TestBackend::new(width, 10)).unwrap();
      terminal.draw(|frame| ui(frame, &mut app)).unwrap();
    }
  }

  #[test]
  fn input_scrolls_to_keep_cursor_visible() {
    let mut app = idle_app();
    app.set_input("a long query that does not fit");
    let mut terminal = Terminal::new(TestBackend::new(12, 10)).unwrap();
    terminal.draw(|frame| ui(frame, &mut app)).unwrap();
    // 8 text columns inside borders and padding; the cursor sits just past the end.
    assert_eq!(app.input_scroll, app.input.chars().count() - 8 + 1);
  }

  #[test]
  fn truncate_keeps_short_strings() {
    assert_eq!(truncate_str("cats", 10), "cats");
    assert_eq!(truncate_str("cats", 4), "cats");
  }

  #[test]
  fn truncate_appends_ellipsis() {
    assert_eq!(truncate_str("hello world", 6), "hello…");
  }

  #[test]
  fn truncate_counts_wide_chars_by_column() {
    // Each CJK char is two columns wide.
    assert_eq!(truncate_str("日本語です", 5), "日本…");
  }

  #[test]
  fn display_width_counts_columns() {
    assert_eq!(display_width("aé日", 3), 4);
    assert_eq!(display_width("aé日", 2), 2);
  }
}
