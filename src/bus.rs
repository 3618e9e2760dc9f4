use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::mpsc;
use tracing::trace;

use crate::cache::QueryId;
use crate::video::{ResultSet, Video};

/// Everything the search and selection layers announce to the view.
#[derive(Debug, Clone)]
pub enum Notification {
  /// A search completed (from cache or network) and is the latest one issued.
  ResultsAvailable { query: QueryId, results: Arc<ResultSet> },
  /// The latest search failed. Whatever is on screen stays there.
  SearchFailed { query: QueryId, message: String },
  /// The active set was swapped; `previous` is what is now transitioning out.
  ActiveSetReplaced { current: Arc<ResultSet>, previous: Option<Arc<ResultSet>> },
  /// The focused video changed (`None` when nothing is focused).
  SelectionChanged(Option<Arc<Video>>),
  /// Outgoing items from an earlier set were purged.
  TransitionComplete { purged: usize },
}

impl Notification {
  pub fn kind(&self) -> &'static str {
    match self {
      Notification::ResultsAvailable { .. } => "results_available",
      Notification::SearchFailed { .. } => "search_failed",
      Notification::ActiveSetReplaced { .. } => "active_set_replaced",
      Notification::SelectionChanged(_) => "selection_changed",
      Notification::TransitionComplete { .. } => "transition_complete",
    }
  }
}

/// Typed publish/subscribe channel. Cloning the bus shares the subscriber list.
#[derive(Debug, Clone, Default)]
pub struct NotificationBus {
  subscribers: Arc<StdMutex<Vec<mpsc::UnboundedSender<Notification>>>>,
}

impl NotificationBus {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Notification> {
    let (tx, rx) = mpsc::unbounded_channel();
    if let Ok(mut subs) = self.subscribers.lock() {
      subs.push(tx);
    }
    rx
  }

  /// Deliver `notification` to every live subscriber, dropping closed ones.
  pub fn publish(&self, notification: Notification) {
    trace!(kind = notification.kind(), "bus: publish");
    if let Ok(mut subs) = self.subscribers.lock() {
      subs.retain(|tx| tx.send(notification.clone()).is_ok());
    }
  }

  pub fn subscriber_count(&self) -> usize {
    self.subscribers.lock().map(|subs| subs.len()).unwrap_or(0)
  }
}

/// Drain everything currently queued on `rx`.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
  let mut out = Vec::new();
  while let Ok(n) = rx.try_recv() {
    out.push(n);
  }
  out
}
