//! # Ports
//!
//! An operator declares its output ports as [`OutputPort`] handles and emits
//! data through them. The node attaches a counting sink to a port with
//! [`OutputPort::set_sink`]; the port forwards every emitted payload to the
//! sink attached at that moment.
//!
//! The live-sink pointer is an atomically swappable reference: the control
//! thread can rewire a port while the main loop emits through it, and the
//! emitting thread sees either the old or the new sink, never a torn value.
//!
//! Single-port operators name their ports [`INPUT`] and [`OUTPUT`].
//!
//! [`PortRegistry`] is the static per-node mapping from declared port names to
//! port handles, built once from the operator when the node is constructed.

use crate::error::SinkError;
use crate::operator::Operator;
use crate::sink::CounterSink;
use crate::tuple::{Payload, Tuple};
use arc_swap::ArcSwapOption;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Conventional name of an operator's only input port.
pub const INPUT: &str = "input";

/// Conventional name of an operator's only output port.
pub const OUTPUT: &str = "output";

// `ArcSwapOption` needs a sized pointee.
struct Attached(Arc<dyn CounterSink>);

/// Output port handle declared by an operator.
pub struct OutputPort {
  name: String,
  sink: ArcSwapOption<Attached>,
}

impl OutputPort {
  /// Creates an unconnected port.
  pub fn new(name: impl Into<String>) -> Arc<Self> {
    Arc::new(Self {
      name: name.into(),
      sink: ArcSwapOption::empty(),
    })
  }

  /// Returns the declared port name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Replaces the live sink; `None` disconnects the port.
  pub fn set_sink(&self, sink: Option<Arc<dyn CounterSink>>) {
    self.sink.store(sink.map(|sink| Arc::new(Attached(sink))));
  }

  /// Returns the currently attached sink.
  pub fn sink(&self) -> Option<Arc<dyn CounterSink>> {
    self.sink.load_full().map(|attached| Arc::clone(&attached.0))
  }

  /// Returns `true` if a sink is attached.
  pub fn is_connected(&self) -> bool {
    self.sink.load().is_some()
  }

  /// Emits a value through the port.
  ///
  /// A port with no attached sink discards what it is given.
  ///
  /// # Errors
  ///
  /// Returns the attached sink's [`SinkError`].
  pub fn emit<T: Any + Send + Sync>(&self, value: T) -> Result<(), SinkError> {
    self.emit_payload(Arc::new(value))
  }

  /// Emits an already type-erased payload through the port.
  ///
  /// # Errors
  ///
  /// Returns the attached sink's [`SinkError`].
  pub fn emit_payload(&self, payload: Payload) -> Result<(), SinkError> {
    let guard = self.sink.load();
    match &*guard {
      Some(attached) => attached.0.process(Tuple::Data(payload)),
      None => Ok(()),
    }
  }
}

impl fmt::Debug for OutputPort {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("OutputPort")
      .field("name", &self.name)
      .field("connected", &self.is_connected())
      .finish()
  }
}

/// Immutable mapping from declared port names to port handles.
///
/// Built once from the operator's declarations and never mutated afterwards.
/// Output ports are ordered by name.
#[derive(Debug, Default)]
pub struct PortRegistry {
  outputs: BTreeMap<String, Arc<OutputPort>>,
  inputs: BTreeSet<String>,
}

impl PortRegistry {
  /// Builds the registry from what `operator` declares.
  ///
  /// When two output ports share a name the later declaration wins.
  pub fn describe<O: Operator>(operator: &O) -> Self {
    let mut outputs = BTreeMap::new();
    for port in operator.output_ports() {
      let name = port.name().to_string();
      if outputs.insert(name.clone(), port).is_some() {
        warn!(port = %name, "duplicate output port declaration, keeping the last one");
      }
    }
    let inputs = operator.input_ports().into_iter().collect();
    Self { outputs, inputs }
  }

  /// Returns the output port declared under `name`.
  pub fn output_port(&self, name: &str) -> Option<&Arc<OutputPort>> {
    self.outputs.get(name)
  }

  /// Returns `true` if an output port named `name` is declared.
  pub fn has_output_port(&self, name: &str) -> bool {
    self.outputs.contains_key(name)
  }

  /// Returns `true` if an input port named `name` is declared.
  pub fn has_input_port(&self, name: &str) -> bool {
    self.inputs.contains(name)
  }

  /// Declared output port names, in order.
  pub fn output_port_names(&self) -> impl Iterator<Item = &str> {
    self.outputs.keys().map(String::as_str)
  }

  /// Declared input port names, in order.
  pub fn input_port_names(&self) -> impl Iterator<Item = &str> {
    self.inputs.iter().map(String::as_str)
  }
}
