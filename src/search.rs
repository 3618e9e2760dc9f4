use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::bus::{Notification, NotificationBus};
use crate::cache::{QueryId, ResultCache};
use crate::config::SearchConfig;
use crate::error::{FetchError, SearchError};
use crate::feed;
use crate::video::ResultSet;
use crate::youtube::{FetchAdapter, Payload, search_url};

/// What `search` did with a query.
#[derive(Debug, Clone)]
pub enum Dispatch {
  /// Served from the cache; `ResultsAvailable` has already been published.
  Cached(Arc<ResultSet>),
  /// A fetch is in flight (new, or an existing one for the same identity).
  Fetching { seq: u64 },
}

/// Result of one fetch reaching the controller.
#[derive(Debug)]
pub struct Completion {
  pub seq: u64,
  pub query: QueryId,
  /// A newer search was issued after this one, so nothing was published.
  pub stale: bool,
  pub outcome: Result<Arc<ResultSet>, SearchError>,
}

struct InFlight {
  seq: u64,
  query: QueryId,
  text: String,
  rx: oneshot::Receiver<Result<Payload, FetchError>>,
}

/// Issues searches, serves repeats from the cache and publishes results.
///
/// Every search is tagged with a sequence number. Only the response to the most
/// recent search is published; older responses still land in the cache.
pub struct SearchController {
  config: SearchConfig,
  cache: ResultCache,
  adapter: Arc<dyn FetchAdapter>,
  bus: NotificationBus,
  last_query: Option<String>,
  latest_seq: u64,
  in_flight: Vec<InFlight>,
}

impl SearchController {
  pub fn new(config: SearchConfig, adapter: Arc<dyn FetchAdapter>, bus: NotificationBus) -> Self {
    Self {
      config,
      cache: ResultCache::new(),
      adapter,
      bus,
      last_query: None,
      latest_seq: 0,
      in_flight: Vec::new(),
    }
  }

  pub fn config(&self) -> &SearchConfig {
    &self.config
  }

  pub fn cache(&self) -> &ResultCache {
    &self.cache
  }

  /// The query text of the last search whose results were published.
  pub fn last_query(&self) -> Option<&str> {
    self.last_query.as_deref()
  }

  /// Whether `query` is what is already on screen (case-insensitive).
  pub fn is_redundant(&self, query: &str) -> bool {
    self.last_query.as_deref().is_some_and(|last| last.to_lowercase() == query.to_lowercase())
  }

  pub fn is_fetching(&self) -> bool {
    !self.in_flight.is_empty()
  }

  /// Start a search for `query`.
  ///
  /// An empty query is rejected with [`SearchError::EmptyQuery`] and changes
  /// nothing. Any other text, whitespace included, is an exact cache key; callers
  /// that want trimming trim first. A cached identity is published immediately;
  /// otherwise a fetch is spawned on the tokio runtime and its response is picked
  /// up by [`poll`](Self::poll) or [`settle`](Self::settle).
  pub fn search(&mut self, query: &str) -> Result<Dispatch, SearchError> {
    if query.is_empty() {
      return Err(SearchError::EmptyQuery);
    }
    let id = self.config.query_id(query);

    if let Some(results) = self.cache.get(&id) {
      let seq = self.next_seq();
      info!(query = %id, seq, items = results.len(), "search: cache hit");
      self.last_query = Some(query.to_string());
      self.bus.publish(Notification::ResultsAvailable { query: id, results: Arc::clone(&results) });
      return Ok(Dispatch::Cached(results));
    }

    // Same identity already on the wire: adopt it instead of fetching twice.
    if let Some(index) = self.in_flight.iter().position(|f| f.query == id) {
      let seq = self.next_seq();
      let flight = &mut self.in_flight[index];
      debug!(query = %id, seq, superseded = flight.seq, "search: joining in-flight fetch");
      flight.seq = seq;
      flight.text = query.to_string();
      return Ok(Dispatch::Fetching { seq });
    }

    // Build the request before taking a sequence number so a failure here
    // leaves in-flight fetches current.
    let url = search_url(&self.config, query)?;
    let seq = self.next_seq();
    let version = self.config.api_version;
    let adapter = Arc::clone(&self.adapter);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(adapter.fetch(url, version).await);
    });
    info!(query = %id, seq, version = version.label(), "search: fetch dispatched");
    self.in_flight.push(InFlight { seq, query: id, text: query.to_string(), rx });
    Ok(Dispatch::Fetching { seq })
  }

  fn next_seq(&mut self) -> u64 {
    self.latest_seq += 1;
    self.latest_seq
  }

  /// Handle every fetch that has finished, without waiting.
  pub fn poll(&mut self) -> Vec<Completion> {
    let mut done = Vec::new();
    for mut flight in std::mem::take(&mut self.in_flight) {
      match flight.rx.try_recv() {
        Ok(result) => done.push(self.complete(flight.seq, flight.query, flight.text, result)),
        Err(oneshot::error::TryRecvError::Empty) => self.in_flight.push(flight),
        Err(oneshot::error::TryRecvError::Closed) => {
          done.push(self.complete(flight.seq, flight.query, flight.text, Err(FetchError::Aborted)))
        }
      }
    }
    done
  }

  /// Wait for every in-flight fetch and handle it, oldest first.
  pub async fn settle(&mut self) -> Vec<Completion> {
    let mut done = Vec::new();
    while !self.in_flight.is_empty() {
      let flight = self.in_flight.remove(0);
      let result = flight.rx.await.unwrap_or(Err(FetchError::Aborted));
      done.push(self.complete(flight.seq, flight.query, flight.text, result));
    }
    done
  }

  fn complete(
    &mut self,
    seq: u64,
    query: QueryId,
    text: String,
    result: Result<Payload, FetchError>,
  ) -> Completion {
    let stale = seq != self.latest_seq;
    let outcome = match result {
      Err(source) => Err(SearchError::FetchFailed { query: query.to_string(), source }),
      Ok(payload) => feed::parse(self.config.api_version, payload)
        // The cache may have changed while this fetch was suspended; merge into whatever is there now.
        .map(|videos| self.cache.merge_unique(query.clone(), videos)),
    };

    match (&outcome, stale) {
      (Ok(results), false) => {
        info!(query = %query, seq, items = results.len(), "search: results available");
        self.last_query = Some(text);
        self.bus.publish(Notification::ResultsAvailable { query: query.clone(), results: Arc::clone(results) });
      }
      (Ok(results), true) => {
        let latest = self.latest_seq;
        debug!(query = %query, seq, latest, items = results.len(), "search: stale response cached, not published");
      }
      (Err(e), false) => {
        warn!(query = %query, seq, err = %e, "search: failed");
        self.bus.publish(Notification::SearchFailed { query: query.clone(), message: failure_message(e) });
      }
      (Err(e), true) => {
        debug!(query = %query, seq, err = %e, "search: stale failure dropped");
      }
    }
    Completion { seq, query, stale, outcome }
  }
}

/// Error text including its source chain, for the status line.
fn failure_message(e: &SearchError) -> String {
  match e {
    SearchError::FetchFailed { source, .. } => format!("{}: {}", e, source),
    _ => e.to_string(),
  }
}
