//! # Node Configuration
//!
//! [`NodeConfig`] also sizes the input reservoir of polling node kinds
//! ([`NodeConfig::buffer_capacity`]) and sets their idle back-off. It makes
//! two behaviours explicit that a node would otherwise
//! have to guess:
//!
//! - **Rewiring while running** ([`RewirePolicy`]): whether an output port
//!   connected or disconnected during an activation changes the set of sinks
//!   that receive control tuples right away, or only after an explicit
//!   republish.
//! - **Requests after a failure** ([`RequestFailurePolicy`]): whether the
//!   requests of a window that were not run because an earlier one failed stay
//!   queued or are dropped.
//!
//! ```rust
//! use std::time::Duration;
//! use streamweave_engine::config::{NodeConfig, RequestFailurePolicy, RewirePolicy};
//!
//! let config = NodeConfig::default()
//!   .with_rewire(RewirePolicy::Immediate)
//!   .with_request_failure(RequestFailurePolicy::Discard)
//!   .with_idle_spin(Duration::from_millis(1))
//!   .with_buffer_capacity(64);
//! assert_eq!(config.rewire, RewirePolicy::Immediate);
//! ```

use std::time::Duration;

/// When rewiring performed during an activation reaches control broadcasts.
///
/// Data always follows the port's live sink immediately; this policy only
/// governs the published snapshot used for end-of-stream and checkpoints.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewirePolicy {
  /// The published snapshot changes only on an explicit republish.
  #[default]
  Deferred,
  /// Every wiring change made while running republishes the snapshot.
  Immediate,
}

/// Fate of the requests left undrained after a request fails.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestFailurePolicy {
  /// Leave them queued; they run at the next window boundary.
  #[default]
  Retain,
  /// Drop the rest of the failing window's drain snapshot. Requests queued
  /// after the snapshot was taken are kept.
  Discard,
}

/// Configuration for a node.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NodeConfig {
  /// Rewiring behaviour while running (default: `Deferred`).
  pub rewire: RewirePolicy,
  /// Request failure behaviour (default: `Retain`).
  pub on_request_failure: RequestFailurePolicy,
  /// Back-off of polling node kinds when they find no input (default: 10ms).
  pub idle_spin: Duration,
  /// Tuples an input reservoir holds before upstream is refused (default: 1Mi).
  pub buffer_capacity: usize,
}

/// Default reservoir capacity, in tuples.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024 * 1024;

impl Default for NodeConfig {
  fn default() -> Self {
    Self {
      rewire: RewirePolicy::Deferred,
      on_request_failure: RequestFailurePolicy::Retain,
      idle_spin: Duration::from_millis(10),
      buffer_capacity: DEFAULT_BUFFER_CAPACITY,
    }
  }
}

impl NodeConfig {
  /// Sets the rewiring policy.
  #[must_use]
  pub fn with_rewire(mut self, rewire: RewirePolicy) -> Self {
    self.rewire = rewire;
    self
  }

  /// Sets the request failure policy.
  #[must_use]
  pub fn with_request_failure(mut self, policy: RequestFailurePolicy) -> Self {
    self.on_request_failure = policy;
    self
  }

  /// Sets the idle back-off.
  #[must_use]
  pub fn with_idle_spin(mut self, idle_spin: Duration) -> Self {
    self.idle_spin = idle_spin;
    self
  }

  /// Sets the input reservoir capacity. Zero is treated as one.
  #[must_use]
  pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
    self.buffer_capacity = buffer_capacity;
    self
  }
}
