//! # Error Types
//!
//! The node core never retries and never logs-and-swallows: every failure is
//! returned synchronously to the immediate caller (the main loop or the
//! activation driver), which decides whether to abort or escalate.
//!
//! - [`SinkError`]: a downstream sink refused a tuple. Propagates out of the
//!   broadcast that hit it; sinks later in that broadcast are not reached.
//! - [`RequestError`]: a control-plane request failed while executing
//!   against the operator.
//! - [`OperatorError`]: the operator's own per-tuple logic failed.
//! - [`NodeError`]: everything the node lifecycle surfaces to its caller.

use crate::node::{LifecycleState, NodeId};
use crate::window::WindowId;
use thiserror::Error;

/// Error raised by a request executed at a window boundary.
pub type RequestError = Box<dyn std::error::Error + Send + Sync>;

/// Error raised by operator business logic.
pub type OperatorError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for downstream sink delivery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
  /// The receiving end is gone.
  #[error("sink closed")]
  Closed,
  /// The sink refused the tuple.
  #[error("sink rejected tuple: {0}")]
  Rejected(String),
  /// The sink's buffer holds its full capacity; the tuple was not taken.
  #[error("sink buffer full at {0} tuples")]
  Full(usize),
}

/// Error type for node lifecycle operations.
#[derive(Error, Debug)]
pub enum NodeError {
  /// A downstream sink failed while a tuple was being delivered.
  #[error("sink error: {0}")]
  Sink(#[from] SinkError),
  /// A pending request failed; remaining requests of that window were not run.
  #[error("request failed on node {node} at window {window}: {source}")]
  Request {
    /// Node that was draining its requests.
    node: NodeId,
    /// Window boundary at which the drain happened.
    window: WindowId,
    /// The request's own error.
    #[source]
    source: RequestError,
  },
  /// `activate` was called on a node that is not freshly constructed.
  #[error("node {node} cannot be activated from state {state:?}")]
  AlreadyActivated {
    /// Offending node.
    node: NodeId,
    /// State the node was in.
    state: LifecycleState,
  },
  /// The main loop tried to move the current window backwards.
  #[error("window id regression: current {current}, requested {requested}")]
  WindowRegression {
    /// Window currently in effect.
    current: WindowId,
    /// Window that was requested.
    requested: WindowId,
  },
  /// The operator or the main loop failed.
  #[error("operator error: {0}")]
  Operator(String),
  /// The thread driving the activation panicked or was cancelled.
  #[error("activation thread failed: {0}")]
  Join(String),
}

impl NodeError {
  /// Wraps an operator failure.
  pub fn operator(err: OperatorError) -> Self {
    Self::Operator(err.to_string())
  }
}

impl From<OperatorError> for NodeError {
  fn from(err: OperatorError) -> Self {
    Self::operator(err)
  }
}
