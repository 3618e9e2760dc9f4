//! Endpoints, query defaults and shelf geometry from `constants.ron`.
//!
//! The file is compiled into the binary and parsed on first use.

use serde::Deserialize;
use std::sync::LazyLock;

use crate::selection::Position;

/// Values that are fixed per build. User-facing knobs live in `prefs.toml`.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // YouTube endpoints
  pub api_v2_base: String,
  pub api_v3_base: String,
  pub watch_url_base: String,

  // Query defaults
  pub default_channel_id: String,
  pub default_max_results: u32,
  pub default_start_index: u32,
  pub v3_max_results_limit: u32,

  // Shelf geometry
  pub shelf_spacing: i32,
  pub shelf_depth_bias: i32,
  pub shelf_lateral_step: i32,
  pub focus_anchor: Position,
  pub stage_lift: i32,

  // Outgoing transition
  pub outgoing_shift: i32,
  pub outgoing_purge_ms: u64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Covered by `embedded_constants_parse`.
  ron::from_str(include_str!("../constants.ron")).expect("embedded constants.ron is invalid")
});

pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert!(c.api_v3_base.starts_with("https://"));
    assert_eq!(c.default_max_results, 20);
    assert_eq!(c.default_start_index, 1);
    assert_eq!(c.shelf_spacing, 200);
    assert_eq!(c.focus_anchor.turn, 180);
  }
}
