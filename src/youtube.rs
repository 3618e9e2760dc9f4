use async_trait::async_trait;
use clap::ValueEnum;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{SearchConfig, SearchScope};
use crate::constants::constants;
use crate::error::{FetchError, SearchError};

/// Which YouTube Data API generation to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
  /// GData feeds, Atom XML responses.
  V2,
  /// Data API v3, JSON responses.
  #[default]
  V3,
}

impl ApiVersion {
  pub fn label(self) -> &'static str {
    match self {
      ApiVersion::V2 => "v2",
      ApiVersion::V3 => "v3",
    }
  }

  fn base_url(self) -> &'static str {
    match self {
      ApiVersion::V2 => &constants().api_v2_base,
      ApiVersion::V3 => &constants().api_v3_base,
    }
  }
}

/// Raw response body, shaped by the API version that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
  Atom(String),
  Json(serde_json::Value),
}

/// Transport to the search API. The controller only ever talks to this trait.
#[async_trait]
pub trait FetchAdapter: Send + Sync {
  async fn fetch(&self, url: Url, version: ApiVersion) -> Result<Payload, FetchError>;
}

/// `reqwest`-backed adapter used by the application.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
  client: Client,
}

impl HttpFetcher {
  pub fn new() -> Self {
    Self { client: Client::new() }
  }
}

#[async_trait]
impl FetchAdapter for HttpFetcher {
  async fn fetch(&self, url: Url, version: ApiVersion) -> Result<Payload, FetchError> {
    // The v3 URL carries the API key, so only host and path are logged.
    debug!(host = url.host_str().unwrap_or_default(), path = url.path(), version = version.label(), "fetch: request");
    let response = self.client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status(status.as_u16()));
    }
    match version {
      ApiVersion::V2 => Ok(Payload::Atom(response.text().await?)),
      ApiVersion::V3 => Ok(Payload::Json(response.json::<serde_json::Value>().await?)),
    }
  }
}

/// Query parameters for a search on `query`, in the order they are sent.
///
/// v3 paginates with page tokens, so `page_start_index` only applies to v2.
pub fn query_params(config: &SearchConfig, query: &str) -> Vec<(&'static str, String)> {
  let mut params = vec![("q", query.to_string())];
  match config.api_version {
    ApiVersion::V2 => {
      params.push(("v", "2".to_string()));
      params.push(("start-index", config.page_start_index.to_string()));
      params.push(("max-results", config.max_results.to_string()));
      params.push(("orderby", "published".to_string()));
    }
    ApiVersion::V3 => {
      params.push(("part", "snippet,id".to_string()));
      params.push(("maxResults", config.max_results.to_string()));
      params.push(("order", "date".to_string()));
      params.push(("type", "video".to_string()));
    }
  }
  if let SearchScope::Channel(ref channel_id) = config.scope {
    params.push(("channelId", channel_id.clone()));
  }
  if config.api_version == ApiVersion::V3
    && let Some(ref key) = config.api_key
  {
    params.push(("key", key.clone()));
  }
  params
}

/// Full request URL for a search on `query`.
pub fn search_url(config: &SearchConfig, query: &str) -> Result<Url, SearchError> {
  let base = config.api_version.base_url();
  Url::parse_with_params(base, query_params(config, query))
    .map_err(|e| SearchError::Config(format!("bad API base URL {}: {}", base, e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
  }

  #[test]
  fn v3_params() {
    let config = SearchConfig { api_key: Some("secret".into()), ..SearchConfig::default() };
    let params = query_params(&config, "cats");
    assert_eq!(param(&params, "q"), Some("cats"));
    assert_eq!(param(&params, "part"), Some("snippet,id"));
    assert_eq!(param(&params, "maxResults"), Some("20"));
    assert_eq!(param(&params, "key"), Some("secret"));
    assert_eq!(param(&params, "start-index"), None);
    assert_eq!(param(&params, "channelId"), None);
  }

  #[test]
  fn v2_params() {
    let config = SearchConfig {
      api_version: ApiVersion::V2,
      page_start_index: 21,
      api_key: Some("ignored".into()),
      ..SearchConfig::default()
    };
    let params = query_params(&config, "dogs");
    assert_eq!(param(&params, "v"), Some("2"));
    assert_eq!(param(&params, "start-index"), Some("21"));
    assert_eq!(param(&params, "max-results"), Some("20"));
    assert_eq!(param(&params, "orderby"), Some("published"));
    assert_eq!(param(&params, "key"), None);
  }

  #[test]
  fn channel_scope_adds_channel_id_and_keeps_query() {
    let config = SearchConfig { scope: SearchScope::Channel("UCabc".into()), ..SearchConfig::default() };
    let params = query_params(&config, "live");
    assert_eq!(param(&params, "channelId"), Some("UCabc"));
    assert_eq!(param(&params, "q"), Some("live"));
  }

  #[test]
  fn search_url_encodes_query() {
    let url = search_url(&SearchConfig::default(), "cats & dogs").map(|u| u.to_string()).unwrap_or_default();
    assert!(url.starts_with("https://www.googleapis.com/youtube/v3/search?"));
    assert!(url.contains("q=cats+%26+dogs"));
  }

  #[test]
  fn api_version_serde_is_lowercase() {
    let parsed: ApiVersion = serde_json::from_str("\"v2\"").unwrap_or_default();
    assert_eq!(parsed, ApiVersion::V2);
    assert_eq!(serde_json::to_string(&ApiVersion::V3).ok().as_deref(), Some("\"v3\""));
  }
}
