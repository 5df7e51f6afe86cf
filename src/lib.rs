//! # StreamWeave Engine
//!
//! The node runtime core of a windowed stream-processing engine.
//!
//! A [`Node`](node::Node) hosts exactly one [`Operator`](operator::Operator),
//! wires the operator's declared output ports to downstream
//! [`Sink`](sink::Sink)s, and drives one activation of a node kind's main loop.
//! Control tuples ([`ControlTuple`](tuple::ControlTuple)) travel in the same
//! channel as data so downstream receivers see them in order.
//!
//! ## Key Pieces
//!
//! - **Sinks**: single-method receivers; every attached sink is wrapped in a
//!   [`CountingSink`](sink::CountingSink) so per-port throughput can be reported
//!   per window.
//! - **Ports**: [`PortRegistry`](port::PortRegistry) is built once from the
//!   operator and maps port names to [`OutputPort`](port::OutputPort) handles.
//! - **Activation**: `activate` publishes the live sink set, runs the main loop,
//!   then broadcasts end-of-stream and retires the sink set.
//! - **Control plane**: a [`NodeHandle`](node::NodeHandle) rewires outputs and
//!   requests deactivation from another thread while the loop runs.
//! - **Windows**: at every window boundary the loop drains pending requests and
//!   reports [`OperatorStats`](stats::OperatorStats).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use streamweave_engine::context::ChannelContext;
//! use streamweave_engine::kinds::GenericNode;
//! use streamweave_engine::node::Node;
//! # use streamweave_engine::operator::{InputOperator, Operator};
//! # use streamweave_engine::port::OutputPort;
//! # use streamweave_engine::tuple::Payload;
//! # use streamweave_engine::error::OperatorError;
//! # struct Doubler { out: Arc<OutputPort> }
//! # impl Operator for Doubler {
//! #   fn output_ports(&self) -> Vec<Arc<OutputPort>> { vec![self.out.clone()] }
//! #   fn input_ports(&self) -> Vec<String> { vec!["in".to_string()] }
//! # }
//! # impl InputOperator for Doubler {
//! #   fn process(&mut self, _port: &str, payload: Payload) -> Result<(), OperatorError> {
//! #     Ok(self.out.emit_payload(payload)?)
//! #   }
//! # }
//! # let operator = Doubler { out: OutputPort::new("out") };
//!
//! let mut node = Node::new("doubler", operator, GenericNode::new());
//! let input = node.connect_input_port("in").expect("declared input");
//! let (context, _stats) = ChannelContext::<Doubler>::new(node.id().clone());
//! node.activate(Arc::new(context))?;
//! # Ok::<(), streamweave_engine::error::NodeError>(())
//! ```

// Documentation enforcement - treat missing docs as errors
#![deny(missing_docs)]

/// Node configuration: rewiring and request-failure policies.
pub mod config;
/// Node context, pending requests and stats reporting.
pub mod context;
/// Error types.
pub mod error;
/// Concrete node kinds (main loops).
pub mod kinds;
/// The node abstraction and its activation lifecycle.
pub mod node;
/// Operator traits.
pub mod operator;
/// Output ports and the port registry.
pub mod port;
/// Runs an activation on a dedicated blocking thread.
pub mod runner;
/// Sinks and the counting decorator.
pub mod sink;
/// Per-window operator statistics.
pub mod stats;
/// Data and control tuples.
pub mod tuple;
/// Window identifiers.
pub mod window;

#[cfg(test)]
mod context_test;
#[cfg(test)]
mod port_test;
#[cfg(test)]
mod sink_test;
