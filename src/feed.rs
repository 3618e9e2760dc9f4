//! Parsers turning raw API payloads into [`Video`]s.
//!
//! v2 answers with an Atom feed, v3 with a JSON `search#list` response. Entries
//! that lack an id or carry an unreadable timestamp are skipped, not fatal.

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Deserialize;
use tracing::warn;

use crate::error::SearchError;
use crate::video::Video;
use crate::youtube::{ApiVersion, Payload};

/// Parse `payload` with the parser matching `version`, keeping API order.
pub fn parse(version: ApiVersion, payload: Payload) -> Result<Vec<Video>, SearchError> {
  match (version, payload) {
    (ApiVersion::V2, Payload::Atom(xml)) => parse_atom(&xml),
    (ApiVersion::V3, Payload::Json(json)) => parse_search_list(json),
    (version, _) => Err(SearchError::Parse(format!("unexpected payload shape for {}", version.label()))),
  }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(raw.trim()).ok().map(|d| d.with_timezone(&Utc))
}

// --- v3 (JSON) ---

#[derive(Deserialize)]
struct SearchListResponse {
  #[serde(default)]
  items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
  id: ItemId,
  snippet: Option<Snippet>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
  video_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
  #[serde(default)]
  title: String,
  #[serde(default)]
  description: String,
  published_at: Option<String>,
  #[serde(default)]
  thumbnails: Thumbnails,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
  #[serde(rename = "default")]
  small: Option<Thumbnail>,
  high: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
  url: String,
}

fn parse_search_list(json: serde_json::Value) -> Result<Vec<Video>, SearchError> {
  let response: SearchListResponse =
    serde_json::from_value(json).map_err(|e| SearchError::Parse(format!("v3 response: {}", e)))?;

  let mut videos = Vec::with_capacity(response.items.len());
  for item in response.items {
    // Channels and playlists also come back from search; only videos have a videoId.
    let Some(id) = item.id.video_id.filter(|id| !id.is_empty()) else { continue };
    let Some(snippet) = item.snippet else {
      warn!(id = %id, "feed: v3 item without snippet, skipping");
      continue;
    };
    let Some(published_at) = snippet.published_at.as_deref().and_then(parse_timestamp) else {
      warn!(id = %id, "feed: v3 item with bad publishedAt, skipping");
      continue;
    };
    let thumbnail_url = snippet.thumbnails.small.map(|t| t.url).unwrap_or_default();
    let first_frame_url = snippet.thumbnails.high.map(|t| t.url).unwrap_or_else(|| thumbnail_url.clone());
    videos.push(Video {
      id,
      title: snippet.title,
      duration_seconds: 0,
      published_at,
      updated_at: published_at,
      thumbnail_url,
      first_frame_url,
      preview_url: None,
      description: snippet.description,
    });
  }
  Ok(videos)
}

// --- v2 (Atom) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
  AtomId,
  Title,
  Published,
  Updated,
  VideoId,
  Description,
}

impl TextField {
  fn from_tag(tag: &[u8]) -> Option<Self> {
    match tag {
      b"id" => Some(TextField::AtomId),
      b"title" => Some(TextField::Title),
      b"published" => Some(TextField::Published),
      b"updated" => Some(TextField::Updated),
      b"yt:videoid" => Some(TextField::VideoId),
      b"media:description" => Some(TextField::Description),
      _ => None,
    }
  }
}

#[derive(Debug, Default)]
struct AtomEntry {
  atom_id: String,
  title: String,
  published: String,
  updated: String,
  video_id: String,
  description: String,
  seconds: Option<u64>,
  player_url: Option<String>,
  thumbnails: Vec<String>,
}

impl AtomEntry {
  fn push_text(&mut self, field: TextField, text: &str) {
    let target = match field {
      TextField::AtomId => &mut self.atom_id,
      TextField::Title => &mut self.title,
      TextField::Published => &mut self.published,
      TextField::Updated => &mut self.updated,
      TextField::VideoId => &mut self.video_id,
      TextField::Description => &mut self.description,
    };
    target.push_str(text);
  }

  fn read_attributes(&mut self, e: &BytesStart<'_>) -> Result<(), SearchError> {
    match e.name().as_ref() {
      b"yt:duration" => {
        self.seconds = attribute(e, "seconds")?.and_then(|s| s.trim().parse().ok());
      }
      b"media:player" => {
        self.player_url = attribute(e, "url")?;
      }
      b"media:thumbnail" => {
        if let Some(url) = attribute(e, "url")? {
          self.thumbnails.push(url);
        }
      }
      _ => {}
    }
    Ok(())
  }

  fn into_video(self) -> Option<Video> {
    // Prefer `yt:videoid`; otherwise the entry id, a feed URL or a tag URI (`tag:youtube.com,2008:video:ID`).
    let raw = if self.video_id.trim().is_empty() { self.atom_id.trim() } else { self.video_id.trim() };
    let id = raw.rsplit(['/', ':']).next().unwrap_or_default().to_string();
    if id.is_empty() {
      warn!("feed: atom entry without video id, skipping");
      return None;
    }
    let Some(published_at) = parse_timestamp(&self.published) else {
      warn!(id = %id, "feed: atom entry with bad published date, skipping");
      return None;
    };
    let updated_at = parse_timestamp(&self.updated).unwrap_or(published_at);
    let first_frame_url = self.thumbnails.first().cloned().unwrap_or_default();
    let thumbnail_url = self.thumbnails.get(1).cloned().unwrap_or_else(|| first_frame_url.clone());
    Some(Video {
      id,
      title: self.title.trim().to_string(),
      duration_seconds: self.seconds.unwrap_or(0),
      published_at,
      updated_at,
      thumbnail_url,
      first_frame_url,
      preview_url: self.player_url,
      description: self.description.trim().to_string(),
    })
  }
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, SearchError> {
  let Some(attr) = e.try_get_attribute(key).map_err(|err| SearchError::Parse(format!("atom attribute: {}", err)))?
  else {
    return Ok(None);
  };
  let value = attr.unescape_value().map_err(|err| SearchError::Parse(format!("atom attribute value: {}", err)))?;
  Ok(Some(value.into_owned()))
}

fn parse_atom(xml: &str) -> Result<Vec<Video>, SearchError> {
  let mut reader = Reader::from_str(xml);
  reader.config_mut().trim_text(true);

  let mut videos = Vec::new();
  let mut entry: Option<AtomEntry> = None;
  let mut field: Option<TextField> = None;

  loop {
    let event = reader
      .read_event()
      .map_err(|e| SearchError::Parse(format!("atom feed at byte {}: {}", reader.buffer_position(), e)))?;
    match event {
      Event::Start(e) => {
        if e.name().as_ref() == b"entry" {
          entry = Some(AtomEntry::default());
        } else if let Some(current) = entry.as_mut() {
          field = TextField::from_tag(e.name().as_ref());
          current.read_attributes(&e)?;
        }
      }
      Event::Empty(e) => {
        if let Some(current) = entry.as_mut() {
          current.read_attributes(&e)?;
        }
      }
      Event::Text(t) => {
        if let (Some(current), Some(f)) = (entry.as_mut(), field) {
          let text = t.unescape().map_err(|e| SearchError::Parse(format!("atom text: {}", e)))?;
          current.push_text(f, &text);
        }
      }
      Event::CData(c) => {
        if let (Some(current), Some(f)) = (entry.as_mut(), field) {
          current.push_text(f, &String::from_utf8_lossy(&c));
        }
      }
      Event::End(e) => {
        field = None;
        if e.name().as_ref() == b"entry"
          && let Some(done) = entry.take()
          && let Some(video) = done.into_video()
        {
          videos.push(video);
        }
      }
      Event::Eof => break,
      _ => {}
    }
  }
  Ok(videos)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use serde_json::json;

  const ATOM: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns='http://www.w3.org/2005/Atom' xmlns:media='http://search.yahoo.com/mrss/' xmlns:yt='http://gdata.youtube.com/schemas/2007'>
  <title>YouTube Videos matching query: cats</title>
  <entry>
    <published>2013-05-01T12:00:00.000Z</published>
    <updated>2013-06-02T08:30:00.000Z</updated>
    <title>Cats &amp; Boxes</title>
    <media:group>
      <media:description type='plain'><![CDATA[Cats sit in boxes.]]></media:description>
      <media:player url='https://www.youtube.com/watch?v=abc123&amp;feature=youtube_gdata_player'/>
      <media:thumbnail url='https://i.ytimg.com/vi/abc123/0.jpg' height='360' width='480'/>
      <media:thumbnail url='https://i.ytimg.com/vi/abc123/default.jpg' height='90' width='120'/>
      <yt:duration seconds='125'/>
      <yt:videoid>abc123</yt:videoid>
    </media:group>
  </entry>
  <entry>
    <published>not a date</published>
    <title>Broken</title>
    <media:group><yt:videoid>bad1</yt:videoid></media:group>
  </entry>
  <entry>
    <published>2012-01-01T00:00:00.000Z</published>
    <title>No id</title>
  </entry>
</feed>"#;

  #[test]
  fn atom_entry_fields() {
    let videos = parse(ApiVersion::V2, Payload::Atom(ATOM.to_string())).unwrap_or_default();
    assert_eq!(videos.len(), 1);
    let v = &videos[0];
    assert_eq!(v.id, "abc123");
    assert_eq!(v.title, "Cats & Boxes");
    assert_eq!(v.duration_seconds, 125);
    assert_eq!(v.duration_label(), "2:05");
    assert_eq!(v.description, "Cats sit in boxes.");
    assert_eq!(v.first_frame_url, "https://i.ytimg.com/vi/abc123/0.jpg");
    assert_eq!(v.thumbnail_url, "https://i.ytimg.com/vi/abc123/default.jpg");
    assert_eq!(v.preview_url.as_deref(), Some("https://www.youtube.com/watch?v=abc123&feature=youtube_gdata_player"));
    assert_eq!(v.published_at.to_rfc3339(), "2013-05-01T12:00:00+00:00");
    assert_eq!(v.updated_at.to_rfc3339(), "2013-06-02T08:30:00+00:00");
  }

  #[test]
  fn atom_video_id_takes_last_segment() {
    let xml = "<feed><entry><published>2013-05-01T12:00:00Z</published>\
      <media:group><yt:videoid>tag:youtube.com,2008:video:xyz</yt:videoid></media:group></entry></feed>";
    let videos = parse_atom(xml).unwrap_or_default();
    assert_eq!(videos.iter().map(|v| v.id.as_str()).collect::<Vec<_>>(), vec!["xyz"]);
  }

  #[test]
  fn atom_falls_back_to_entry_id() {
    let xml = "<feed><entry><id>http://gdata.youtube.com/feeds/api/videos/qrs</id>\
      <published>2013-05-01T12:00:00Z</published></entry></feed>";
    let videos = parse_atom(xml).unwrap_or_default();
    assert_eq!(videos.iter().map(|v| v.id.as_str()).collect::<Vec<_>>(), vec!["qrs"]);
  }

  #[test]
  fn atom_malformed_xml_errors() {
    assert!(matches!(parse_atom("<feed><entry></feed>"), Err(SearchError::Parse(_))));
  }

  fn v3_item(id: serde_json::Value, title: &str) -> serde_json::Value {
    json!({
      "kind": "youtube#searchResult",
      "id": id,
      "snippet": {
        "publishedAt": "2014-02-03T04:05:06Z",
        "title": title,
        "description": "desc",
        "thumbnails": {
          "default": { "url": "https://i.ytimg.com/vi/x/default.jpg" },
          "high": { "url": "https://i.ytimg.com/vi/x/hqdefault.jpg" }
        }
      }
    })
  }

  #[test]
  fn v3_items_in_order() {
    let payload = json!({
      "items": [
        v3_item(json!({"kind": "youtube#video", "videoId": "a"}), "First"),
        v3_item(json!({"kind": "youtube#video", "videoId": "b"}), "Second"),
      ]
    });
    let videos = parse(ApiVersion::V3, Payload::Json(payload)).unwrap_or_default();
    assert_eq!(videos.iter().map(|v| v.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    let a = &videos[0];
    assert_eq!(a.title, "First");
    assert_eq!(a.duration_seconds, 0);
    assert_eq!(a.preview_url, None);
    assert_eq!(a.thumbnail_url, "https://i.ytimg.com/vi/x/default.jpg");
    assert_eq!(a.first_frame_url, "https://i.ytimg.com/vi/x/hqdefault.jpg");
    assert_eq!(a.updated_at, a.published_at);
  }

  #[test]
  fn v3_skips_channels_and_playlists() {
    let payload = json!({
      "items": [
        v3_item(json!({"kind": "youtube#channel", "channelId": "UC1"}), "A channel"),
        v3_item(json!({"kind": "youtube#video", "videoId": "v1"}), "A video"),
      ]
    });
    let videos = parse(ApiVersion::V3, Payload::Json(payload)).unwrap_or_default();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, "v1");
  }

  #[test]
  fn v3_missing_items_is_empty() {
    let videos = parse(ApiVersion::V3, Payload::Json(json!({"kind": "youtube#searchListResponse"})));
    assert_eq!(videos.map(|v| v.len()).ok(), Some(0));
  }

  #[test]
  fn mismatched_payload_is_parse_error() {
    let result = parse(ApiVersion::V2, Payload::Json(json!({})));
    assert!(matches!(result, Err(SearchError::Parse(_))));
  }
}
