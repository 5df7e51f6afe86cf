//! # Node Runner
//!
//! A node's main loop is synchronous and owns its thread for the whole
//! activation. [`NodeTask`] gives an async orchestrator a way to run it: the
//! activation goes to tokio's blocking pool, and the task keeps a
//! [`NodeHandle`] for the control actor.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use streamweave_engine::context::ChannelContext;
//! # use streamweave_engine::node::{from_fn, Activation, Node};
//! # use streamweave_engine::runner::NodeTask;
//! # struct Idle;
//! # impl streamweave_engine::operator::Operator for Idle {
//! #   fn output_ports(&self) -> Vec<Arc<streamweave_engine::port::OutputPort>> { Vec::new() }
//! # }
//! # async fn example() -> Result<(), streamweave_engine::error::NodeError> {
//! let node = Node::new("idle", Idle, from_fn(|activation: &mut Activation<'_, Idle>| {
//!   while activation.is_alive() {
//!     std::thread::sleep(std::time::Duration::from_millis(1));
//!   }
//!   Ok(())
//! }));
//! let (context, _stats) = ChannelContext::<Idle>::new(node.id().clone());
//!
//! let task = NodeTask::spawn(node, Arc::new(context));
//! task.deactivate();
//! let (node, result) = task.join().await?;
//! result?;
//! assert!(!node.is_alive());
//! # Ok(())
//! # }
//! ```

use crate::context::NodeContext;
use crate::error::NodeError;
use crate::node::{MainLoop, Node, NodeHandle};
use crate::operator::Operator;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// One activation running on tokio's blocking pool.
pub struct NodeTask<O, L> {
  handle: NodeHandle,
  join: JoinHandle<(Node<O, L>, Result<(), NodeError>)>,
}

impl<O, L> NodeTask<O, L>
where
  O: Operator,
  L: MainLoop<O> + 'static,
{
  /// Activates `node` on a blocking thread.
  ///
  /// Must be called from within a tokio runtime.
  pub fn spawn(mut node: Node<O, L>, context: Arc<dyn NodeContext<O>>) -> Self {
    let handle = node.handle();
    debug!(node = %handle.id(), "spawning activation");
    let join = tokio::task::spawn_blocking(move || {
      let result = node.activate(context);
      (node, result)
    });
    Self { handle, join }
  }

  /// Returns the control-actor handle.
  pub fn handle(&self) -> &NodeHandle {
    &self.handle
  }

  /// Requests the main loop to stop.
  pub fn deactivate(&self) {
    self.handle.deactivate();
  }

  /// Returns `true` once the activation thread has returned.
  pub fn is_finished(&self) -> bool {
    self.join.is_finished()
  }

  /// Waits for the activation to finish and returns the retired node along
  /// with the activation's result. The node comes back whether or not the
  /// activation failed.
  ///
  /// # Errors
  ///
  /// [`NodeError::Join`] if the activation thread panicked; the node is lost.
  pub async fn join(self) -> Result<(Node<O, L>, Result<(), NodeError>), NodeError> {
    self
      .join
      .await
      .map_err(|err| NodeError::Join(err.to_string()))
  }
}
