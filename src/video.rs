use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use crate::constants::constants;

/// One video returned by the search API. Identity is `id`; everything else is
/// descriptive and may differ between fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
  pub id: String,
  pub title: String,
  pub duration_seconds: u64,
  pub published_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub thumbnail_url: String,
  /// Large still of the opening frame.
  pub first_frame_url: String,
  /// Embeddable player URL, when the API version provides one.
  pub preview_url: Option<String>,
  pub description: String,
}

impl Video {
  /// Short human duration: `1:02:03`, `2:05` or `45s`.
  pub fn duration_label(&self) -> String {
    let hours = self.duration_seconds / 3600;
    let minutes = (self.duration_seconds % 3600) / 60;
    let seconds = self.duration_seconds % 60;
    if hours > 0 {
      format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else if minutes > 0 {
      format!("{}:{:02}", minutes, seconds)
    } else {
      format!("{}s", seconds)
    }
  }

  /// URL to open in a browser: the preview player if known, otherwise the watch page.
  pub fn watch_url(&self) -> String {
    match &self.preview_url {
      Some(url) => url.clone(),
      None => format!("{}{}", constants().watch_url_base, self.id),
    }
  }
}

/// Ordered collection of videos, unique by id. Inserting an id that is already
/// present is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
  items: Vec<Arc<Video>>,
  ids: HashSet<String>,
}

impl ResultSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a set from `videos`, keeping the first occurrence of each id.
  pub fn from_videos(videos: impl IntoIterator<Item = Video>) -> Self {
    let mut set = Self::new();
    for video in videos {
      set.insert_unique(video);
    }
    set
  }

  /// Append `video` unless its id is already present. Returns whether it was added.
  pub fn insert_unique(&mut self, video: Video) -> bool {
    if self.ids.contains(&video.id) {
      return false;
    }
    self.ids.insert(video.id.clone());
    self.items.push(Arc::new(video));
    true
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn contains(&self, id: &str) -> bool {
    self.ids.contains(id)
  }

  /// Rank of `id` within the set.
  pub fn rank_of(&self, id: &str) -> Option<usize> {
    if !self.contains(id) {
      return None;
    }
    self.items.iter().position(|v| v.id == id)
  }

  pub fn get(&self, rank: usize) -> Option<&Arc<Video>> {
    self.items.get(rank)
  }

  pub fn find(&self, id: &str) -> Option<&Arc<Video>> {
    self.rank_of(id).and_then(|rank| self.items.get(rank))
  }

  pub fn iter(&self) -> impl Iterator<Item = &Arc<Video>> {
    self.items.iter()
  }

  pub fn ids(&self) -> impl Iterator<Item = &str> {
    self.items.iter().map(|v| v.id.as_str())
  }
}

#[cfg(test)]
pub(crate) fn sample_video(id: &str) -> Video {
  let at = DateTime::parse_from_rfc3339("2014-03-01T10:00:00Z").map(|d| d.with_timezone(&Utc)).unwrap_or_default();
  Video {
    id: id.to_string(),
    title: format!("Video {}", id),
    duration_seconds: 0,
    published_at: at,
    updated_at: at,
    thumbnail_url: format!("https://i.ytimg.com/vi/{}/default.jpg", id),
    first_frame_url: format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id),
    preview_url: None,
    description: String::new(),
  }
}
