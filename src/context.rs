//! # Node Context
//!
//! The [`NodeContext`] is what the orchestrator lends a node for the duration
//! of one activation: a queue of pending control-plane requests, a stats
//! reporting sink, and the node's stable id.
//!
//! ## Requests
//!
//! A [`NodeRequest`] is executed against the operator at a window boundary,
//! never in the middle of one. The orchestrator pushes requests from any
//! thread; the node drains them from its main-loop thread. Any
//! `FnOnce(&mut O, &NodeId, WindowId) -> Result<(), RequestError>` closure is a
//! request:
//!
//! ```rust
//! use streamweave_engine::context::RequestQueue;
//!
//! struct Counter { resets: u32 }
//!
//! let queue = RequestQueue::<Counter>::new();
//! queue.submit(|op, _node, _window| {
//!   op.resets += 1;
//!   Ok(())
//! });
//! assert_eq!(queue.len(), 1);
//! ```
//!
//! ## Reporting
//!
//! [`ChannelContext`] is the stock context: statistics go out over a tokio
//! unbounded channel so an async orchestrator can consume them without
//! blocking the node.

use crate::error::RequestError;
use crate::node::NodeId;
use crate::stats::OperatorStats;
use crate::window::WindowId;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use tokio::sync::mpsc;
use tracing::trace;

/// An executable control-plane request.
pub trait NodeRequest<O>: Send {
  /// Runs the request against the operator.
  ///
  /// # Errors
  ///
  /// A failure is fatal to the window's request drain.
  fn execute(
    self: Box<Self>,
    operator: &mut O,
    node_id: &NodeId,
    window_id: WindowId,
  ) -> Result<(), RequestError>;
}

impl<O, F> NodeRequest<O> for F
where
  F: FnOnce(&mut O, &NodeId, WindowId) -> Result<(), RequestError> + Send,
{
  fn execute(
    self: Box<Self>,
    operator: &mut O,
    node_id: &NodeId,
    window_id: WindowId,
  ) -> Result<(), RequestError> {
    (*self)(operator, node_id, window_id)
  }
}

/// Thread-safe FIFO of pending requests.
///
/// Many producers push; the node's main loop is the only consumer.
pub struct RequestQueue<O> {
  inner: Mutex<VecDeque<Box<dyn NodeRequest<O>>>>,
}

impl<O> RequestQueue<O> {
  /// Creates an empty queue.
  pub fn new() -> Self {
    Self {
      inner: Mutex::new(VecDeque::new()),
    }
  }

  /// Appends a request.
  pub fn push<R>(&self, request: R)
  where
    R: NodeRequest<O> + 'static,
  {
    self.inner.lock().push_back(Box::new(request));
  }

  /// Appends a closure request.
  pub fn submit<F>(&self, request: F)
  where
    F: FnOnce(&mut O, &NodeId, WindowId) -> Result<(), RequestError> + Send + 'static,
  {
    self.push(request);
  }

  /// Appends an already boxed request.
  pub fn push_boxed(&self, request: Box<dyn NodeRequest<O>>) {
    self.inner.lock().push_back(request);
  }

  /// Removes the oldest request.
  pub fn pop(&self) -> Option<Box<dyn NodeRequest<O>>> {
    self.inner.lock().pop_front()
  }

  /// Drops up to `count` of the oldest requests and returns how many went.
  pub fn discard(&self, count: usize) -> usize {
    let mut inner = self.inner.lock();
    let count = count.min(inner.len());
    inner.drain(..count);
    count
  }

  /// Number of queued requests.
  pub fn len(&self) -> usize {
    self.inner.lock().len()
  }

  /// Returns `true` if nothing is queued.
  pub fn is_empty(&self) -> bool {
    self.inner.lock().is_empty()
  }
}

impl<O> Default for RequestQueue<O> {
  fn default() -> Self {
    Self::new()
  }
}

impl<O> fmt::Debug for RequestQueue<O> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RequestQueue")
      .field("len", &self.len())
      .finish()
  }
}

/// What a node borrows from its orchestrator for one activation.
pub trait NodeContext<O>: Send + Sync {
  /// Stable identifier, echoed into request execution.
  fn node_id(&self) -> &NodeId;

  /// Pending requests to drain at the next window boundary.
  fn requests(&self) -> &RequestQueue<O>;

  /// Accepts the statistics record of one window. Fire-and-forget.
  fn report(&self, stats: OperatorStats, window_id: WindowId);
}

/// Stock [`NodeContext`] reporting over a tokio channel.
pub struct ChannelContext<O> {
  node_id: NodeId,
  requests: RequestQueue<O>,
  reports: mpsc::UnboundedSender<OperatorStats>,
}

impl<O> ChannelContext<O> {
  /// Creates a context and the receiving end of its stats channel.
  pub fn new(node_id: NodeId) -> (Self, mpsc::UnboundedReceiver<OperatorStats>) {
    let (reports, receiver) = mpsc::unbounded_channel();
    let context = Self {
      node_id,
      requests: RequestQueue::new(),
      reports,
    };
    (context, receiver)
  }
}

impl<O> NodeContext<O> for ChannelContext<O> {
  fn node_id(&self) -> &NodeId {
    &self.node_id
  }

  fn requests(&self) -> &RequestQueue<O> {
    &self.requests
  }

  fn report(&self, stats: OperatorStats, window_id: WindowId) {
    if self.reports.send(stats).is_err() {
      trace!(node = %self.node_id, window = %window_id, "stats receiver dropped");
    }
  }
}

impl<O> fmt::Debug for ChannelContext<O> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ChannelContext")
      .field("node_id", &self.node_id)
      .field("requests", &self.requests)
      .finish()
  }
}
