use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

use crate::cache::QueryId;
use crate::constants::constants;
use crate::error::SearchError;
use crate::youtube::ApiVersion;

/// User preferences persisted in `prefs.toml`. Every field is optional; unset
/// fields fall back to the embedded constants.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub api_version: Option<ApiVersion>,
  pub channel_scoped_search: Option<bool>,
  pub channel_id: Option<String>,
  pub max_results: Option<u32>,
  pub page_start_index: Option<u32>,
  pub api_key: Option<String>,
  /// Focus the first result whenever a new set is shown.
  pub auto_select_first: Option<bool>,
}

fn config_file() -> Option<PathBuf> {
  ProjectDirs::from("", "", "ytshelf").map(|dirs| dirs.config_dir().join("prefs.toml"))
}

impl Config {
  pub fn load() -> Self {
    if let Some(path) = config_file()
      && let Ok(content) = std::fs::read_to_string(&path)
    {
      match Self::from_toml(&content) {
        Ok(config) => return config,
        Err(e) => warn!(path = %path.display(), err = %e, "config: ignoring malformed prefs file"),
      }
    }
    Self::default()
  }

  pub fn from_toml(content: &str) -> Result<Self> {
    toml::from_str(content).context("Failed to parse prefs.toml")
  }

  pub fn save(&self) -> Result<()> {
    let path = config_file().context("No home directory to store preferences in")?;
    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string(self).context("Failed to serialise preferences")?;
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
  }

  pub fn auto_select_first(&self) -> bool {
    self.auto_select_first.unwrap_or(false)
  }

  /// Resolve into a validated [`SearchConfig`].
  pub fn search_config(&self) -> Result<SearchConfig, SearchError> {
    let c = constants();
    let api_version = self.api_version.unwrap_or_default();

    let scope = if self.channel_scoped_search.unwrap_or(false) {
      let channel_id = self.channel_id.clone().unwrap_or_else(|| c.default_channel_id.clone());
      if channel_id.trim().is_empty() {
        return Err(SearchError::Config("channel-scoped search needs a channel id".to_string()));
      }
      SearchScope::Channel(channel_id)
    } else {
      SearchScope::FreeText
    };

    let max_results = self.max_results.unwrap_or(c.default_max_results);
    if max_results == 0 {
      return Err(SearchError::Config("max_results must be at least 1".to_string()));
    }
    if api_version == ApiVersion::V3 && max_results > c.v3_max_results_limit {
      return Err(SearchError::Config(format!(
        "max_results {} exceeds the v3 limit of {}",
        max_results, c.v3_max_results_limit
      )));
    }

    let page_start_index = self.page_start_index.unwrap_or(c.default_start_index);
    if page_start_index == 0 {
      return Err(SearchError::Config("page_start_index is 1-based".to_string()));
    }

    Ok(SearchConfig {
      api_version,
      scope,
      max_results,
      page_start_index,
      api_key: self.api_key.clone().filter(|k| !k.is_empty()),
    })
  }
}

/// What a search is keyed on. The two modes are mutually exclusive per session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchScope {
  #[default]
  FreeText,
  Channel(String),
}

/// Validated search settings consumed by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
  pub api_version: ApiVersion,
  pub scope: SearchScope,
  pub max_results: u32,
  pub page_start_index: u32,
  pub api_key: Option<String>,
}

impl Default for SearchConfig {
  fn default() -> Self {
    let c = constants();
    Self {
      api_version: ApiVersion::default(),
      scope: SearchScope::FreeText,
      max_results: c.default_max_results,
      page_start_index: c.default_start_index,
      api_key: None,
    }
  }
}

impl SearchConfig {
  /// Cache identity for a search on `text`.
  pub fn query_id(&self, text: &str) -> QueryId {
    match self.scope {
      SearchScope::FreeText => QueryId::Text(text.to_string()),
      SearchScope::Channel(ref id) => QueryId::Channel(id.clone()),
    }
  }
}
