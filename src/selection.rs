//! Which video is focused, and where every video of the active set sits.
//!
//! Results are laid out on a "shelf": rank `i` gets a slot receding in depth by
//! a fixed spacing, drifting sideways by a small per-rank step, with no rotation.
//! Slots depend on rank alone, so re-applying the same ordered set yields the
//! same layout. Focusing a video moves it to a fixed anchor and shifts the
//! stage so its slot lines up with the camera; unfocusing puts it back exactly.

use serde::Deserialize;
use std::ops::{Add, Neg, Sub};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::bus::{Notification, NotificationBus};
use crate::constants::constants;
use crate::error::SelectionError;
use crate::video::{ResultSet, Video};

/// A placement in stage space: translation in px, rotation in whole degrees.
///
/// Integer coordinates keep the focus/restore round trip exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Position {
  pub x: i32,
  pub y: i32,
  pub z: i32,
  /// Rotation about the x axis.
  pub tilt: i32,
  /// Rotation about the y axis.
  pub turn: i32,
}

impl Add for Position {
  type Output = Position;

  fn add(self, rhs: Position) -> Position {
    Position {
      x: self.x + rhs.x,
      y: self.y + rhs.y,
      z: self.z + rhs.z,
      tilt: self.tilt + rhs.tilt,
      turn: self.turn + rhs.turn,
    }
  }
}

impl Neg for Position {
  type Output = Position;

  fn neg(self) -> Position {
    Position { x: -self.x, y: -self.y, z: -self.z, tilt: -self.tilt, turn: -self.turn }
  }
}

impl Sub for Position {
  type Output = Position;

  fn sub(self, rhs: Position) -> Position {
    self + -rhs
  }
}

impl Position {
  /// Shelf slot for `rank`. Pure function of rank.
  pub fn shelf(rank: usize) -> Position {
    let c = constants();
    let rank = i32::try_from(rank).unwrap_or(i32::MAX);
    Position {
      x: rank.saturating_mul(c.shelf_lateral_step),
      y: 0,
      z: c.shelf_depth_bias.saturating_sub(rank.saturating_mul(c.shelf_spacing)),
      tilt: 0,
      turn: 0,
    }
  }

  /// Mirror image drawn beneath the slot (depth flipped, tilted over).
  pub fn reflection(self) -> Position {
    Position { z: -self.z, tilt: self.tilt - 180, ..self }
  }

  /// Focused placement for a video whose shelf slot is `self`: the focus anchor
  /// offset by the inverse of the slot.
  pub fn focus(self) -> Position {
    constants().focus_anchor + -self
  }

  /// Inverse of [`focus`](Self::focus).
  pub fn restore(self) -> Position {
    constants().focus_anchor - self
  }
}

/// Coarse state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
  /// No active set.
  Empty,
  /// An active set, nothing focused.
  Unselected,
  /// An active set with one focused video.
  Selected,
}

/// Whether a call changed anything (and therefore notified).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Changed,
  Unchanged,
}

impl Transition {
  pub fn is_changed(self) -> bool {
    self == Transition::Changed
  }
}

/// Where one video of the active set is drawn right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
  pub rank: usize,
  pub video: Arc<Video>,
  /// Resting slot on the shelf.
  pub shelf: Position,
  /// Current placement, stage offset and focus applied.
  pub position: Position,
  pub reflection: Position,
  pub focused: bool,
  /// Pushed past the camera by the stage shift.
  pub hidden: bool,
}

/// A video from a replaced set, sliding off until it is purged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingItem {
  pub video: Arc<Video>,
  pub position: Position,
  pub expires_at: Instant,
}

/// Owns the selection state and announces every change on the bus.
pub struct SelectionEngine {
  bus: NotificationBus,
  active: Option<Arc<ResultSet>>,
  previous: Option<Arc<ResultSet>>,
  selected: Option<String>,
  /// Slot per rank of `active`.
  shelf: Vec<Position>,
  /// Offset applied to every unfocused slot while something is focused.
  stage: Position,
  outgoing: Vec<OutgoingItem>,
  purge_delay: Duration,
}

impl SelectionEngine {
  pub fn new(bus: NotificationBus) -> Self {
    Self {
      bus,
      active: None,
      previous: None,
      selected: None,
      shelf: Vec::new(),
      stage: Position::default(),
      outgoing: Vec::new(),
      purge_delay: Duration::from_millis(constants().outgoing_purge_ms),
    }
  }

  pub fn phase(&self) -> SelectionPhase {
    match (&self.active, &self.selected) {
      (None, _) => SelectionPhase::Empty,
      (Some(_), None) => SelectionPhase::Unselected,
      (Some(_), Some(_)) => SelectionPhase::Selected,
    }
  }

  pub fn active(&self) -> Option<&Arc<ResultSet>> {
    self.active.as_ref()
  }

  pub fn previous(&self) -> Option<&Arc<ResultSet>> {
    self.previous.as_ref()
  }

  pub fn selected_id(&self) -> Option<&str> {
    self.selected.as_deref()
  }

  pub fn selected(&self) -> Option<&Arc<Video>> {
    let id = self.selected.as_deref()?;
    self.active.as_ref()?.find(id)
  }

  /// Make `set` the active set. Any focus is dropped and the old set's videos
  /// start transitioning out.
  ///
  /// An empty set empties the engine; doing so when already empty is a no-op.
  pub fn set_active_set(&mut self, set: Arc<ResultSet>, now: Instant) -> Transition {
    if set.is_empty() && self.active.is_none() {
      return Transition::Unchanged;
    }

    let had_selection = self.selected.take().is_some();
    self.stage = Position::default();

    if let Some(old) = self.active.take() {
      let shift = Position { x: constants().outgoing_shift, ..Position::default() };
      let expires_at = now + self.purge_delay;
      self.outgoing.extend(old.iter().zip(&self.shelf).map(|(video, slot)| OutgoingItem {
        video: Arc::clone(video),
        position: *slot + shift,
        expires_at,
      }));
      self.previous = Some(old);
    } else {
      self.previous = None;
    }

    self.shelf = (0..set.len()).map(Position::shelf).collect();
    self.active = if set.is_empty() { None } else { Some(Arc::clone(&set)) };

    info!(
      items = set.len(),
      previous = self.previous.as_ref().map_or(0, |p| p.len()),
      outgoing = self.outgoing.len(),
      "selection: active set replaced"
    );
    self.bus.publish(Notification::ActiveSetReplaced { current: set, previous: self.previous.clone() });
    if had_selection {
      self.bus.publish(Notification::SelectionChanged(None));
    }
    Transition::Changed
  }

  /// Focus the video `id` of the active set.
  ///
  /// Unknown ids leave the state untouched and return [`SelectionError::NotFound`].
  /// Re-selecting the focused video is [`Transition::Unchanged`].
  pub fn select(&mut self, id: &str) -> Result<Transition, SelectionError> {
    let Some(active) = self.active.as_ref() else {
      return Err(SelectionError::NotFound(id.to_string()));
    };
    let Some(rank) = active.rank_of(id) else {
      debug!(id, "selection: id not in active set");
      return Err(SelectionError::NotFound(id.to_string()));
    };
    if self.selected.as_deref() == Some(id) {
      return Ok(Transition::Unchanged);
    }
    let video = active.get(rank).cloned();
    let slot = self.shelf.get(rank).copied().unwrap_or_else(|| Position::shelf(rank));

    self.selected = Some(id.to_string());
    self.stage = Position { y: constants().stage_lift, z: -slot.z, ..Position::default() };
    info!(id, rank, "selection: focused");
    self.bus.publish(Notification::SelectionChanged(video));
    Ok(Transition::Changed)
  }

  /// Return the focused video to its shelf slot. Safe to call in any state.
  pub fn deselect(&mut self) -> Transition {
    let Some(id) = self.selected.take() else { return Transition::Unchanged };
    self.stage = Position::default();
    info!(id = %id, "selection: cleared");
    self.bus.publish(Notification::SelectionChanged(None));
    Transition::Changed
  }

  /// Resting shelf slot of `id` in the active set. Outgoing videos have none.
  pub fn shelf_position(&self, id: &str) -> Option<Position> {
    let rank = self.active.as_ref()?.rank_of(id)?;
    self.shelf.get(rank).copied()
  }

  /// Placement of the focused video, if any.
  pub fn focused_position(&self) -> Option<Position> {
    let id = self.selected.as_deref()?;
    self.shelf_position(id).map(Position::focus)
  }

  /// Current placement of every video of the active set, in rank order.
  pub fn placements(&self) -> Vec<Placement> {
    let Some(active) = self.active.as_ref() else { return Vec::new() };
    active
      .iter()
      .zip(&self.shelf)
      .enumerate()
      .map(|(rank, (video, &shelf))| {
        let focused = self.selected.as_deref() == Some(video.id.as_str());
        let position = if focused { shelf.focus() } else { shelf + self.stage };
        Placement {
          rank,
          video: Arc::clone(video),
          shelf,
          position,
          reflection: position.reflection(),
          focused,
          hidden: !focused && position.z > 0,
        }
      })
      .collect()
  }

  pub fn outgoing(&self) -> &[OutgoingItem] {
    &self.outgoing
  }

  /// Drop outgoing videos whose transition has finished by `now`, announcing
  /// how many went. Returns that count.
  pub fn purge_outgoing(&mut self, now: Instant) -> usize {
    let before = self.outgoing.len();
    self.outgoing.retain(|item| item.expires_at > now);
    let purged = before - self.outgoing.len();
    if purged > 0 {
      debug!(purged, remaining = self.outgoing.len(), "selection: outgoing purged");
      self.bus.publish(Notification::TransitionComplete { purged });
    }
    purged
  }
}
