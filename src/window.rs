//! Window identifiers.
//!
//! The unbounded input of a node is cut into windows. A [`WindowId`] names one
//! window; ids increase monotonically over the lifetime of an activation and
//! are carried by every control tuple.

use std::fmt;

/// Identifier of one window of the stream.
///
/// Totally ordered so it can be compared to enforce forward-only progress.
/// The default value (0) is the window in effect before the main loop has seen
/// any boundary.
#[derive(
  Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct WindowId(pub u64);

impl WindowId {
  /// Creates a window id from a raw value.
  #[inline]
  pub const fn new(id: u64) -> Self {
    Self(id)
  }

  /// Returns the raw u64 value.
  #[inline]
  pub const fn as_u64(self) -> u64 {
    self.0
  }

  /// Returns the id of the window that follows this one.
  #[inline]
  pub const fn next(self) -> Self {
    Self(self.0 + 1)
  }
}

impl From<u64> for WindowId {
  fn from(id: u64) -> Self {
    Self(id)
  }
}

impl fmt::Display for WindowId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}
