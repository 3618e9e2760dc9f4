use ratatui::widgets::ListState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::bus::{Notification, NotificationBus};
use crate::config::{SearchConfig, SearchScope};
use crate::error::SearchError;
use crate::search::{Dispatch, SearchController};
use crate::selection::SelectionEngine;
use crate::theme::{THEME, Theme};
use crate::video::{ResultSet, Video};
use crate::youtube::FetchAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Results,
}

/// Terminal front-end state. Owns the search controller and the selection
/// engine and turns their notifications into what the UI draws.
pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub mode: AppMode,
  pub input_scroll: usize,
  /// Cursor in the results list. Moving it does not focus anything.
  pub list_state: ListState,
  pub search: SearchController,
  pub selection: SelectionEngine,
  notifications: mpsc::UnboundedReceiver<Notification>,
  auto_select_first: bool,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Informational message, shown below status and error in priority.
  pub info_message: Option<String>,
  pub should_quit: bool,
  /// When the last error was set, for auto-dismiss after 5 seconds.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(config: SearchConfig, adapter: Arc<dyn FetchAdapter>, auto_select_first: bool) -> Self {
    let bus = NotificationBus::new();
    let notifications = bus.subscribe();
    Self {
      input: String::new(),
      cursor_position: 0,
      mode: AppMode::Input,
      input_scroll: 0,
      list_state: ListState::default(),
      search: SearchController::new(config, adapter, bus.clone()),
      selection: SelectionEngine::new(bus),
      notifications,
      auto_select_first,
      last_error: None,
      status_message: None,
      info_message: None,
      should_quit: false,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    &THEME
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  /// Clear the current error message and its expiry timer.
  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after 5 seconds.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(5)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  /// Replace the input line, cursor at the end.
  pub fn set_input(&mut self, text: &str) {
    self.input = text.to_string();
    self.cursor_position = self.input.chars().count();
    self.input_scroll = 0;
  }

  /// The result set on screen.
  pub fn results(&self) -> Option<&Arc<ResultSet>> {
    self.selection.active()
  }

  pub fn has_results(&self) -> bool {
    self.results().is_some_and(|r| !r.is_empty())
  }

  /// Video under the list cursor.
  pub fn highlighted(&self) -> Option<&Arc<Video>> {
    let rank = self.list_state.selected()?;
    self.results()?.get(rank)
  }

  /// Label for the input box: the free-text prompt, or the channel being searched.
  pub fn scope_label(&self) -> String {
    let config = self.search.config();
    match config.scope {
      SearchScope::FreeText => format!(" Search YouTube [{}] ", config.api_version.label()),
      SearchScope::Channel(ref id) => format!(" Search channel {} [{}] ", id, config.api_version.label()),
    }
  }

  pub fn trigger_search(&mut self) {
    let query = self.input.trim().to_string();
    self.clear_error();
    self.info_message = None;

    // Enter on the query already shown keeps the current focus instead of rebuilding the shelf.
    if self.has_results() && !self.search.is_fetching() && self.search.is_redundant(&query) {
      self.mode = AppMode::Results;
      return;
    }

    match self.search.search(&query) {
      Ok(Dispatch::Cached(results)) => {
        debug!(query = %query, items = results.len(), "app: served from cache");
      }
      Ok(Dispatch::Fetching { seq }) => {
        info!(query = %query, seq, "search triggered");
        self.status_message = Some(format!("Searching '{}'…", query));
      }
      Err(SearchError::EmptyQuery) => {
        self.info_message = Some("Enter a search term.".to_string());
      }
      Err(e) => {
        self.set_error(format!("Search failed: {}", e));
      }
    }
  }

  /// Pick up finished fetches, expire outgoing items and apply every queued
  /// notification. Called once per frame.
  pub fn check_pending(&mut self, now: Instant) {
    let completed = self.search.poll();
    if !completed.is_empty() {
      debug!(count = completed.len(), "app: fetches completed");
    }
    if !self.search.is_fetching() {
      self.status_message = None;
    }
    self.selection.purge_outgoing(now);

    // Handlers may publish follow-up notifications; keep going until the queue is dry.
    while let Ok(notification) = self.notifications.try_recv() {
      self.apply(notification, now);
    }
  }

  fn apply(&mut self, notification: Notification, now: Instant) {
    match notification {
      Notification::ResultsAvailable { query, results } => {
        if results.is_empty() {
          self.set_error(format!("No results found for {}.", query));
        }
        self.selection.set_active_set(results, now);
      }
      Notification::SearchFailed { message, .. } => {
        // Prior results stay on screen.
        self.set_error(format!("Search failed: {}", message));
      }
      Notification::ActiveSetReplaced { .. } => {
        // Later replacements may already be queued; go by the engine, not the payload.
        let count = self.results().map_or(0, |r| r.len());
        if count == 0 {
          self.list_state.select(None);
          self.mode = AppMode::Input;
          return;
        }
        self.list_state.select(Some(0));
        self.mode = AppMode::Results;
        self.info_message = Some(format!("{} videos", count));
        if self.auto_select_first
          && let Some(id) = self.results().and_then(|r| r.get(0)).map(|v| v.id.clone())
        {
          let _ = self.selection.select(&id);
        }
      }
      Notification::SelectionChanged(video) => {
        debug!(id = video.as_ref().map(|v| v.id.as_str()), "app: focus changed");
        if let Some(video) = video
          && let Some(rank) = self.results().and_then(|r| r.rank_of(&video.id))
        {
          self.list_state.select(Some(rank));
        }
      }
      Notification::TransitionComplete { purged } => {
        debug!(purged, "app: outgoing transition complete");
      }
    }
  }

  /// Focus the video under the list cursor.
  pub fn focus_highlighted(&mut self) {
    let Some(id) = self.highlighted().map(|v| v.id.clone()) else { return };
    if let Err(e) = self.selection.select(&id) {
      debug!(err = %e, "app: focus ignored");
    }
  }

  pub fn clear_focus(&mut self) {
    self.selection.deselect();
  }

  pub fn move_highlight(&mut self, forward: bool) {
    let count = self.results().map_or(0, |r| r.len());
    if count == 0 {
      return;
    }
    let i = match (self.list_state.selected(), forward) {
      (None, _) => 0,
      (Some(i), true) => (i + 1) % count,
      (Some(0), false) => count - 1,
      (Some(i), false) => i - 1,
    };
    self.list_state.select(Some(i));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::selection::SelectionPhase;
  use crate::testing::ScriptedFetcher;

  fn new_app(fetcher: ScriptedFetcher, auto_select_first: bool) -> (App, Arc<ScriptedFetcher>) {
    let fetcher = Arc::new(fetcher);
    (App::new(SearchConfig::default(), Arc::clone(&fetcher) as Arc<dyn FetchAdapter>, auto_select_first), fetcher)
  }

  async fn run_search(app: &mut App, query: &str) {
    app.set_input(query);
    app.trigger_search();
    app.search.settle().await;
    app.check_pending(Instant::now());
  }

  #[tokio::test]
  async fn results_show_unfocused_with_cursor_on_first() {
    let (mut app, _) = new_app(ScriptedFetcher::default().respond("cats", vec!["a", "b", "c"]), false);
    run_search(&mut app, "cats").await;

    assert_eq!(app.mode, AppMode::Results);
    assert_eq!(app.list_state.selected(), Some(0));
    assert_eq!(app.selection.phase(), SelectionPhase::Unselected);
    assert_eq!(app.status_message, None);
    assert_eq!(app.info_message.as_deref(), Some("3 videos"));
  }

  #[tokio::test]
  async fn focus_follows_cursor() {
    let (mut app, _) = new_app(ScriptedFetcher::default().respond("cats", vec!["a", "b", "c"]), false);
    run_search(&mut app, "cats").await;

    app.move_highlight(true);
    app.focus_highlighted();
    assert_eq!(app.selection.selected_id(), Some("b"));
    app.clear_focus();
    assert_eq!(app.selection.phase(), SelectionPhase::Unselected);
  }

  #[tokio::test]
  async fn auto_select_first_focuses_rank_zero() {
    let (mut app, _) = new_app(ScriptedFetcher::default().respond("cats", vec!["a", "b"]), true);
    run_search(&mut app, "cats").await;
    assert_eq!(app.selection.selected_id(), Some("a"));
  }

  #[tokio::test]
  async fn failed_search_keeps_previous_results() {
    let (mut app, _) = new_app(ScriptedFetcher::default().respond("cats", vec!["a"]).fail("dogs"), false);
    run_search(&mut app, "cats").await;
    run_search(&mut app, "dogs").await;

    assert!(app.last_error.as_deref().is_some_and(|e| e.starts_with("Search failed")));
    let shown: Vec<String> = app.results().map(|r| r.ids().map(str::to_string).collect()).unwrap_or_default();
    assert_eq!(shown, vec!["a".to_string()]);
  }

  #[tokio::test]
  async fn empty_input_is_only_a_hint() {
    let (mut app, fetcher) = new_app(ScriptedFetcher::default(), false);
    run_search(&mut app, "  ").await;
    assert_eq!(app.info_message.as_deref(), Some("Enter a search term."));
    assert_eq!(app.last_error, None);
    assert_eq!(fetcher.calls(), 0);
  }

  #[tokio::test]
  async fn repeating_shown_query_keeps_focus() {
    let (mut app, fetcher) = new_app(ScriptedFetcher::default().respond("cats", vec!["a", "b"]), false);
    run_search(&mut app, "cats").await;
    app.move_highlight(true);
    app.focus_highlighted();

    run_search(&mut app, "Cats").await;
    assert_eq!(app.selection.selected_id(), Some("b"));
    assert_eq!(fetcher.calls(), 1);
  }

  #[tokio::test]
  async fn switching_back_to_cached_query_skips_network() {
    let (mut app, fetcher) =
      new_app(ScriptedFetcher::default().respond("cats", vec!["a"]).respond("dogs", vec!["d"]), false);
    run_search(&mut app, "cats").await;
    run_search(&mut app, "dogs").await;
    run_search(&mut app, "cats").await;

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(app.highlighted().map(|v| v.id.as_str()), Some("a"));
    assert_eq!(app.selection.previous().map(|p| p.len()), Some(1));
  }

  #[tokio::test]
  async fn empty_results_report_no_results() {
    let (mut app, _) = new_app(ScriptedFetcher::default().respond("zzz", vec![]), false);
    run_search(&mut app, "zzz").await;
    assert!(app.last_error.as_deref().is_some_and(|e| e.starts_with("No results found")));
    assert_eq!(app.selection.phase(), SelectionPhase::Empty);
    assert_eq!(app.mode, AppMode::Input);
  }

  #[tokio::test]
  async fn outdated_replacement_follows_engine_state() {
    let (mut app, _) = new_app(ScriptedFetcher::default().respond("cats", vec!["a", "b", "c"]), true);
    run_search(&mut app, "cats").await;

    let outdated = Arc::new(ResultSet::from_videos([crate::video::sample_video("z")]));
    app.apply(Notification::ActiveSetReplaced { current: outdated, previous: None }, Instant::now());

    assert_eq!(app.mode, AppMode::Results);
    assert_eq!(app.info_message.as_deref(), Some("3 videos"));
    assert_eq!(app.selection.selected_id(), Some("a"));
  }

  #[tokio::test]
  async fn queued_cache_hits_settle_on_the_last_one() {
    let (mut app, _) =
      new_app(ScriptedFetcher::default().respond("cats", vec!["a", "b", "c"]).respond("dogs", vec!["d"]), true);
    run_search(&mut app, "cats").await;
    run_search(&mut app, "dogs").await;

    // Both searches publish before the next frame drains the bus.
    for query in ["cats", "dogs"] {
      app.set_input(query);
      app.trigger_search();
    }
    app.check_pending(Instant::now());

    assert_eq!(app.info_message.as_deref(), Some("1 videos"));
    assert_eq!(app.selection.selected_id(), Some("d"));
    assert_eq!(app.highlighted().map(|v| v.id.as_str()), Some("d"));
  }

  #[test]
  fn move_highlight_without_results_is_noop() {
    let (mut app, _) = new_app(ScriptedFetcher::default(), false);
    app.move_highlight(true);
    assert_eq!(app.list_state.selected(), None);
  }

  #[tokio::test]
  async fn move_highlight_wraps_both_ways() {
    let (mut app, _) = new_app(ScriptedFetcher::default().respond("cats", vec!["a", "b", "c"]), false);
    run_search(&mut app, "cats").await;
    app.move_highlight(false);
    assert_eq!(app.list_state.selected(), Some(2));
    app.move_highlight(true);
    assert_eq!(app.list_state.selected(), Some(0));
  }
}
