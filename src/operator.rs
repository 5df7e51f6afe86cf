//! # Operators
//!
//! An [`Operator`] is the user-supplied business logic a node hosts. The node
//! only needs two things from it: the output ports it declares (to build the
//! [`PortRegistry`](crate::port::PortRegistry)) and, optionally, activation
//! hooks.
//!
//! ## Activation capability
//!
//! Operators that need to acquire or release resources around an activation
//! implement [`ActivationListener`] and expose it through
//! [`Operator::as_activation_listener`]. The node probes for the capability
//! once, at construction, and branches on the result at activation time.
//!
//! ## Per-tuple processing
//!
//! How a node kind feeds tuples to its operator is up to the kind. The
//! [`GenericNode`](crate::kinds::GenericNode) kind requires [`InputOperator`].

use crate::context::NodeContext;
use crate::error::OperatorError;
use crate::port::OutputPort;
use crate::tuple::Payload;
use std::sync::Arc;

/// Business logic hosted by a node.
///
/// The operator is exclusively owned by its node for the node's whole life.
pub trait Operator: Send + Sized + 'static {
  /// Output ports this operator emits through.
  fn output_ports(&self) -> Vec<Arc<OutputPort>>;

  /// Names of the input ports this operator accepts. Defaults to none.
  fn input_ports(&self) -> Vec<String> {
    Vec::new()
  }

  /// Activation capability, if the operator has one.
  fn as_activation_listener(&mut self) -> Option<&mut dyn ActivationListener<Self>> {
    None
  }
}

/// Hooks called around one activation of the hosting node.
pub trait ActivationListener<O> {
  /// Called after the sink set is published and before the main loop starts.
  fn activate(&mut self, context: &dyn NodeContext<O>);

  /// Called after the main loop has returned, before end-of-stream is sent.
  fn deactivate(&mut self);
}

/// Operator fed one payload at a time by the generic node kind.
pub trait InputOperator: Operator {
  /// Processes a payload that arrived on input port `port`.
  ///
  /// # Errors
  ///
  /// An error ends the main loop; the activation fails without end-of-stream.
  fn process(&mut self, port: &str, payload: Payload) -> Result<(), OperatorError>;
}
