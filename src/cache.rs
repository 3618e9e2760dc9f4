use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::video::{ResultSet, Video};

/// Cache key for a search. Free-text and channel-scoped searches never share
/// an identity, even when the strings coincide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryId {
  /// The literal query text, case-sensitive and exact.
  Text(String),
  /// The configured channel id; the query text is ignored for identity.
  Channel(String),
}

impl fmt::Display for QueryId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      QueryId::Text(q) => write!(f, "\"{}\"", q),
      QueryId::Channel(id) => write!(f, "channel {}", id),
    }
  }
}

/// Per-session store of fetched result sets, one entry per query identity.
///
/// Entries are shared as `Arc<ResultSet>`. Growing an entry that has already been
/// handed out clones it first, so published snapshots never change under a reader.
#[derive(Debug, Default)]
pub struct ResultCache {
  entries: HashMap<QueryId, Arc<ResultSet>>,
}

impl ResultCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, id: &QueryId) -> Option<Arc<ResultSet>> {
    self.entries.get(id).cloned()
  }

  /// Store `set` under `id`, replacing any existing entry.
  pub fn put(&mut self, id: QueryId, set: ResultSet) -> Arc<ResultSet> {
    let set = Arc::new(set);
    self.entries.insert(id, Arc::clone(&set));
    set
  }

  /// Append the videos whose id is not yet in the entry for `id`, creating the
  /// entry if needed. Existing order is preserved; new videos keep input order.
  ///
  /// When nothing new arrives the existing `Arc` is returned as-is.
  pub fn merge_unique(&mut self, id: QueryId, incoming: impl IntoIterator<Item = Video>) -> Arc<ResultSet> {
    let entry = self.entries.entry(id).or_insert_with(|| Arc::new(ResultSet::new()));
    let fresh: Vec<Video> = incoming.into_iter().filter(|v| !entry.contains(&v.id)).collect();
    if !fresh.is_empty() {
      let set = Arc::make_mut(entry);
      for video in fresh {
        set.insert_unique(video);
      }
    }
    Arc::clone(entry)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
