//! The main loop's view of a running node.

use super::{NodeId, Shared};
use crate::config::{NodeConfig, RequestFailurePolicy};
use crate::context::NodeContext;
use crate::error::NodeError;
use crate::stats::record_emitted;
use crate::tuple::ControlTuple;
use crate::window::WindowId;
use tracing::{error, trace, warn};

/// Handed to [`MainLoop::run`](super::MainLoop::run) for one activation.
///
/// Everything that must only happen on the thread driving the main loop goes
/// through this type: operator access, window progress, checkpoint emission
/// and request draining.
pub struct Activation<'a, O> {
  shared: &'a Shared,
  operator: &'a mut O,
  context: &'a dyn NodeContext<O>,
  window_id: &'a mut WindowId,
}

impl<'a, O> Activation<'a, O> {
  pub(crate) fn new(
    shared: &'a Shared,
    operator: &'a mut O,
    context: &'a dyn NodeContext<O>,
    window_id: &'a mut WindowId,
  ) -> Self {
    Self {
      shared,
      operator,
      context,
      window_id,
    }
  }

  /// Returns the node id.
  pub fn node_id(&self) -> &NodeId {
    self.shared.id()
  }

  /// Returns the node configuration.
  pub fn config(&self) -> &NodeConfig {
    self.shared.config()
  }

  /// Returns `false` once deactivation has been requested.
  ///
  /// Poll this at safe points (between tuples, at window boundaries).
  pub fn is_alive(&self) -> bool {
    self.shared.is_alive()
  }

  /// Returns the hosted operator.
  pub fn operator(&self) -> &O {
    &*self.operator
  }

  /// Returns the hosted operator mutably.
  pub fn operator_mut(&mut self) -> &mut O {
    &mut *self.operator
  }

  /// Returns the context captured at activation.
  pub fn context(&self) -> &dyn NodeContext<O> {
    self.context
  }

  /// Returns the window id in effect.
  pub fn window_id(&self) -> WindowId {
    *self.window_id
  }

  /// Number of sinks in the published snapshot.
  pub fn published_sink_count(&self) -> usize {
    self.shared.published_len()
  }

  /// Moves the current window forward to `window_id`.
  ///
  /// # Errors
  ///
  /// [`NodeError::WindowRegression`] if `window_id` is older than the current
  /// window; the current window is left unchanged.
  pub fn advance_window(&mut self, window_id: WindowId) -> Result<(), NodeError> {
    if window_id < *self.window_id {
      return Err(NodeError::WindowRegression {
        current: *self.window_id,
        requested: window_id,
      });
    }
    *self.window_id = window_id;
    Ok(())
  }

  /// Advances to `window_id` and broadcasts a checkpoint for it.
  ///
  /// Every published sink gets one `Checkpoint` carrying the current window,
  /// synchronously and in snapshot order.
  ///
  /// # Errors
  ///
  /// - [`NodeError::WindowRegression`] if `window_id` is older than the
  ///   current window; nothing is sent.
  /// - The first sink failure; later sinks do not receive the checkpoint.
  pub fn emit_checkpoint(&mut self, window_id: WindowId) -> Result<(), NodeError> {
    self.advance_window(window_id)?;
    let sinks = self.shared.broadcast(ControlTuple::Checkpoint {
      window_id: *self.window_id,
    })?;
    trace!(node = %self.shared.id(), window = %self.window_id, sinks, "checkpoint emitted");
    Ok(())
  }

  /// Services the window boundary `window_id`.
  ///
  /// Executes, in FIFO order, the requests queued when the drain starts;
  /// requests queued later wait for the next boundary. Then reads-and-resets
  /// the count of every attached output port and reports the resulting
  /// statistics to the context.
  ///
  /// # Errors
  ///
  /// [`NodeError::Request`] for the first failing request. No further request
  /// runs and no statistics are reported for this call; what happens to the
  /// undrained requests follows
  /// [`RequestFailurePolicy`](crate::config::RequestFailurePolicy).
  pub fn handle_requests(&mut self, window_id: WindowId) -> Result<(), NodeError> {
    let context = self.context;
    let requests = context.requests();
    let pending = requests.len();

    for executed in 0..pending {
      let Some(request) = requests.pop() else {
        break;
      };
      if let Err(source) = request.execute(&mut *self.operator, context.node_id(), window_id) {
        let undrained = pending - executed - 1;
        if self.shared.config().on_request_failure == RequestFailurePolicy::Discard {
          let dropped = requests.discard(undrained);
          warn!(node = %self.shared.id(), window = %window_id, dropped, "discarded undrained requests");
        }
        error!(node = %self.shared.id(), window = %window_id, error = %source, "request failed");
        return Err(NodeError::Request {
          node: self.shared.id().clone(),
          window: window_id,
          source,
        });
      }
    }

    let stats = self.shared.collect_stats(window_id);
    record_emitted(self.shared.id(), &stats);
    context.report(stats, window_id);
    Ok(())
  }
}
