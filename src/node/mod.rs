//! # Node
//!
//! The runtime wrapper that hosts one operator instance.
//!
//! A [`Node`] owns the operator, the node kind's [`MainLoop`], the operator's
//! [`PortRegistry`] and the table of attached output sinks. It is constructed
//! once per scheduling assignment, wired, activated exactly once and then
//! discarded.
//!
//! ## Lifecycle
//!
//! ```text
//! Constructed -> Activating -> Running -> Deactivating -> Retired
//! ```
//!
//! - `activate` captures the context, publishes the sink snapshot, sets
//!   `alive`, calls the operator's activation hook and enters the main loop.
//! - When the loop returns, the deactivation hook runs, the context is
//!   released, `EndOfStream` is broadcast to every published sink and the
//!   snapshot is retired.
//! - `deactivate` only requests a stop by clearing `alive`; the loop observes
//!   the flag at its own safe points. There is no preemption.
//!
//! ## Two actors
//!
//! The thread that calls `activate` drives the main loop and is the only one
//! that emits. A [`NodeHandle`] (see [`Node::handle`]) is the control actor's
//! view: it can rewire outputs, republish the snapshot and request
//! deactivation from another thread while the loop runs. The published
//! snapshot is swapped as a whole, so the loop always sees a complete
//! pre- or post-change sink list.
//!
//! ## Identity
//!
//! Equality and hashing of nodes (and of handles) use the [`NodeId`] only, so
//! an orchestrator can key maps and sets on topology identity.

mod activation;

pub use activation::Activation;

use crate::config::{NodeConfig, RewirePolicy};
use crate::context::NodeContext;
use crate::error::{NodeError, SinkError};
use crate::operator::Operator;
use crate::port::PortRegistry;
use crate::sink::{CounterSink, CountingSink, Sink};
use crate::stats::{OperatorStats, PortStats};
use crate::tuple::{ControlTuple, Tuple};
use crate::window::WindowId;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Stable identifier of a node.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct NodeId(String);

impl NodeId {
  /// Creates a node id.
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  /// Returns the id as a string slice.
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for NodeId {
  fn from(id: &str) -> Self {
    Self(id.to_string())
  }
}

impl From<String> for NodeId {
  fn from(id: String) -> Self {
    Self(id)
  }
}

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Where a node is in its single activation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum LifecycleState {
  /// Built and possibly wired; not yet activated.
  Constructed = 0,
  /// `activate` is publishing sinks and calling the activation hook.
  Activating = 1,
  /// The main loop is executing.
  Running = 2,
  /// The main loop has returned; hooks and end-of-stream are in progress.
  Deactivating = 3,
  /// Activation complete; the node must not be activated again.
  Retired = 4,
}

impl LifecycleState {
  fn from_u8(value: u8) -> Self {
    match value {
      0 => Self::Constructed,
      1 => Self::Activating,
      2 => Self::Running,
      3 => Self::Deactivating,
      _ => Self::Retired,
    }
  }
}

/// A node kind: the per-window processing cycle driven during activation.
pub trait MainLoop<O>: Send {
  /// Connects input port `port` and returns the sink upstream should feed.
  ///
  /// Only called for ports the operator declares.
  fn connect_input_port(&mut self, port: &str) -> Option<Arc<dyn Sink>>;

  /// Applies the node's configuration. Called once, when the node is built.
  fn configure(&mut self, config: &NodeConfig) {
    let _ = config;
  }

  /// Disconnects input port `port`.
  fn disconnect_input_port(&mut self, port: &str) {
    let _ = port;
  }

  /// Runs the main loop until `alive` is cleared or the kind's own
  /// termination condition fires.
  ///
  /// # Errors
  ///
  /// Any error ends the activation without an end-of-stream broadcast.
  fn run(&mut self, activation: &mut Activation<'_, O>) -> Result<(), NodeError>;
}

/// [`MainLoop`] backed by a closure. See [`from_fn`].
pub struct FnLoop<F>(F);

/// Creates a main loop from a closure. The resulting kind has no inputs.
///
/// ```rust
/// use streamweave_engine::node::{from_fn, Activation, MainLoop};
/// # struct Idle;
/// # impl streamweave_engine::operator::Operator for Idle {
/// #   fn output_ports(&self) -> Vec<std::sync::Arc<streamweave_engine::port::OutputPort>> { Vec::new() }
/// # }
///
/// let main_loop = from_fn(|activation: &mut Activation<'_, Idle>| {
///   while activation.is_alive() {
///     std::thread::yield_now();
///   }
///   Ok(())
/// });
/// ```
pub fn from_fn<O, F>(f: F) -> FnLoop<F>
where
  F: FnMut(&mut Activation<'_, O>) -> Result<(), NodeError> + Send,
{
  FnLoop(f)
}

impl<O, F> MainLoop<O> for FnLoop<F>
where
  F: FnMut(&mut Activation<'_, O>) -> Result<(), NodeError> + Send,
{
  fn connect_input_port(&mut self, _port: &str) -> Option<Arc<dyn Sink>> {
    None
  }

  fn run(&mut self, activation: &mut Activation<'_, O>) -> Result<(), NodeError> {
    (self.0)(activation)
  }
}

/// State shared between the main-loop thread and the control actor.
pub(crate) struct Shared {
  id: NodeId,
  config: NodeConfig,
  registry: PortRegistry,
  /// Written by the control actor; read in bulk to rebuild `published`.
  outputs: Mutex<BTreeMap<String, Arc<dyn CounterSink>>>,
  published: ArcSwap<Vec<Arc<dyn CounterSink>>>,
  alive: AtomicBool,
  stop_requested: AtomicBool,
  state: AtomicU8,
}

impl Shared {
  fn new(id: NodeId, config: NodeConfig, registry: PortRegistry) -> Self {
    Self {
      id,
      config,
      registry,
      outputs: Mutex::new(BTreeMap::new()),
      published: ArcSwap::from_pointee(Vec::new()),
      alive: AtomicBool::new(false),
      stop_requested: AtomicBool::new(false),
      state: AtomicU8::new(LifecycleState::Constructed as u8),
    }
  }

  pub(crate) fn id(&self) -> &NodeId {
    &self.id
  }

  pub(crate) fn config(&self) -> &NodeConfig {
    &self.config
  }

  fn state(&self) -> LifecycleState {
    LifecycleState::from_u8(self.state.load(Ordering::Acquire))
  }

  fn set_state(&self, state: LifecycleState) {
    self.state.store(state as u8, Ordering::Release);
  }

  pub(crate) fn is_alive(&self) -> bool {
    self.alive.load(Ordering::Acquire)
  }

  fn start(&self) {
    // A stop requested before activation must win over this store.
    self.alive.store(true, Ordering::SeqCst);
    if self.stop_requested.load(Ordering::SeqCst) {
      self.alive.store(false, Ordering::SeqCst);
    }
  }

  fn stop(&self) {
    self.alive.store(false, Ordering::Release);
  }

  /// Leaves `Running` for `Deactivating` under `outputs`, so no republish can
  /// land between the state change and the final broadcast.
  fn begin_deactivation(&self) {
    let _outputs = self.outputs.lock();
    self.stop();
    self.set_state(LifecycleState::Deactivating);
  }

  fn deactivate(&self) {
    self.stop_requested.store(true, Ordering::SeqCst);
    self.alive.store(false, Ordering::SeqCst);
    debug!(node = %self.id, "deactivation requested");
  }

  fn connect_output_port(&self, port: &str, sink: Option<Arc<dyn Sink>>) {
    let Some(output) = self.registry.output_port(port) else {
      warn!(node = %self.id, port, "ignoring connection to undeclared output port");
      return;
    };

    {
      let mut outputs = self.outputs.lock();
      match sink {
        None => {
          output.set_sink(None);
          outputs.remove(port);
          debug!(node = %self.id, port, "output port disconnected");
        }
        Some(sink) => {
          let counter = match Arc::clone(&sink).counter() {
            Some(counter) => counter,
            None => Arc::new(CountingSink::new(sink)) as Arc<dyn CounterSink>,
          };
          output.set_sink(Some(Arc::clone(&counter)));
          outputs.insert(port.to_string(), counter);
          debug!(node = %self.id, port, "output port connected");
        }
      }
    }

    if self.config.rewire == RewirePolicy::Immediate {
      self.republish();
    }
  }

  /// Snapshots the attached sinks into the published list.
  fn publish(&self) -> usize {
    let outputs = self.outputs.lock();
    let sinks: Vec<Arc<dyn CounterSink>> = outputs.values().cloned().collect();
    let published = sinks.len();
    self.published.store(Arc::new(sinks));
    published
  }

  fn republish(&self) -> bool {
    // Holding `outputs` orders this against `retire`.
    let outputs = self.outputs.lock();
    match self.state() {
      LifecycleState::Activating | LifecycleState::Running => {
        let sinks: Vec<Arc<dyn CounterSink>> = outputs.values().cloned().collect();
        trace!(node = %self.id, sinks = sinks.len(), "republishing sinks");
        self.published.store(Arc::new(sinks));
        true
      }
      _ => false,
    }
  }

  fn retire(&self) {
    let _outputs = self.outputs.lock();
    self.published.store(Arc::new(Vec::new()));
  }

  pub(crate) fn published_len(&self) -> usize {
    self.published.load().len()
  }

  /// Sends `control` to every published sink, stopping at the first failure.
  pub(crate) fn broadcast(&self, control: ControlTuple) -> Result<usize, SinkError> {
    let sinks = self.published.load_full();
    for sink in sinks.iter() {
      sink.process(Tuple::Control(control))?;
    }
    trace!(node = %self.id, ?control, sinks = sinks.len(), "control tuple broadcast");
    Ok(sinks.len())
  }

  pub(crate) fn collect_stats(&self, window_id: WindowId) -> OperatorStats {
    let outputs = self.outputs.lock();
    let ports = outputs
      .iter()
      .map(|(port, sink)| PortStats::new(port.clone(), sink.reset_count()))
      .collect();
    OperatorStats { window_id, ports }
  }

  fn output_connections(&self) -> Vec<String> {
    self.outputs.lock().keys().cloned().collect()
  }

  fn output_sink(&self, port: &str) -> Option<Arc<dyn CounterSink>> {
    self.outputs.lock().get(port).cloned()
  }
}

/// Control-actor view of a node.
///
/// Cheap to clone, `Send + Sync`, and usable while the node's main loop runs
/// on another thread.
#[derive(Clone)]
pub struct NodeHandle {
  shared: Arc<Shared>,
}

impl NodeHandle {
  /// Returns the node id.
  pub fn id(&self) -> &NodeId {
    &self.shared.id
  }

  /// Attaches `sink` to output port `port`, or detaches it with `None`.
  ///
  /// See [`Node::connect_output_port`].
  pub fn connect_output_port(&self, port: &str, sink: Option<Arc<dyn Sink>>) {
    self.shared.connect_output_port(port, sink);
  }

  /// Requests the main loop to stop. Does not wait for it.
  pub fn deactivate(&self) {
    self.shared.deactivate();
  }

  /// Rebuilds the published snapshot from the attached sinks.
  ///
  /// Only honoured while the node is activating or running; returns whether
  /// the snapshot was replaced.
  pub fn republish(&self) -> bool {
    self.shared.republish()
  }

  /// Returns the liveness flag.
  pub fn is_alive(&self) -> bool {
    self.shared.is_alive()
  }

  /// Returns the lifecycle state.
  pub fn state(&self) -> LifecycleState {
    self.shared.state()
  }

  /// Names of the output ports with an attached sink, in order.
  pub fn output_connections(&self) -> Vec<String> {
    self.shared.output_connections()
  }

  /// Number of sinks in the published snapshot.
  pub fn published_sink_count(&self) -> usize {
    self.shared.published_len()
  }
}

impl PartialEq for NodeHandle {
  fn eq(&self, other: &Self) -> bool {
    self.shared.id == other.shared.id
  }
}

impl Eq for NodeHandle {}

impl Hash for NodeHandle {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.shared.id.hash(state);
  }
}

impl fmt::Debug for NodeHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("NodeHandle")
      .field("id", &self.shared.id)
      .field("state", &self.shared.state())
      .finish()
  }
}

/// Runtime wrapper executing one operator instance.
pub struct Node<O, L> {
  operator: O,
  main_loop: L,
  shared: Arc<Shared>,
  activation_capable: bool,
  context: Option<Arc<dyn NodeContext<O>>>,
  window_id: WindowId,
}

impl<O, L> Node<O, L>
where
  O: Operator,
  L: MainLoop<O>,
{
  /// Creates a node with the default configuration.
  pub fn new(id: impl Into<NodeId>, operator: O, main_loop: L) -> Self {
    Self::with_config(id, operator, main_loop, NodeConfig::default())
  }

  /// Creates a node.
  ///
  /// The port registry is built from the operator here, and the operator is
  /// probed once for its activation capability.
  pub fn with_config(
    id: impl Into<NodeId>,
    mut operator: O,
    mut main_loop: L,
    config: NodeConfig,
  ) -> Self {
    main_loop.configure(&config);
    let registry = PortRegistry::describe(&operator);
    let activation_capable = operator.as_activation_listener().is_some();
    Self {
      operator,
      main_loop,
      shared: Arc::new(Shared::new(id.into(), config, registry)),
      activation_capable,
      context: None,
      window_id: WindowId::default(),
    }
  }

  /// Returns the node id.
  pub fn id(&self) -> &NodeId {
    &self.shared.id
  }

  /// Returns the hosted operator.
  pub fn operator(&self) -> &O {
    &self.operator
  }

  /// Returns the hosted operator mutably. Unavailable during activation.
  pub fn operator_mut(&mut self) -> &mut O {
    &mut self.operator
  }

  /// Returns the node configuration.
  pub fn config(&self) -> &NodeConfig {
    &self.shared.config
  }

  /// Returns the port registry built from the operator.
  pub fn port_registry(&self) -> &PortRegistry {
    &self.shared.registry
  }

  /// Returns the control-actor handle.
  pub fn handle(&self) -> NodeHandle {
    NodeHandle {
      shared: Arc::clone(&self.shared),
    }
  }

  /// Attaches `sink` to output port `port`, or detaches it with `None`.
  ///
  /// - Undeclared `port`: no effect, no error.
  /// - A sink with the [`CounterSink`] capability is attached as-is.
  /// - Any other sink is wrapped in a fresh [`CountingSink`] first.
  ///
  /// The port's live sink changes immediately. The published snapshot used
  /// for control tuples changes only at activation, on
  /// [`republish`](Self::republish), or right away under
  /// [`RewirePolicy::Immediate`].
  pub fn connect_output_port(&self, port: &str, sink: Option<Arc<dyn Sink>>) {
    self.shared.connect_output_port(port, sink);
  }

  /// Connects input port `port` through the node kind.
  ///
  /// Returns the sink upstream should feed, or `None` when the operator does
  /// not declare `port` or the kind refuses it.
  pub fn connect_input_port(&mut self, port: &str) -> Option<Arc<dyn Sink>> {
    if !self.shared.registry.has_input_port(port) {
      warn!(node = %self.shared.id, port, "ignoring connection to undeclared input port");
      return None;
    }
    self.main_loop.connect_input_port(port)
  }

  /// Disconnects input port `port` through the node kind.
  pub fn disconnect_input_port(&mut self, port: &str) {
    if self.shared.registry.has_input_port(port) {
      self.main_loop.disconnect_input_port(port);
    }
  }

  /// Rebuilds the published snapshot. See [`NodeHandle::republish`].
  pub fn republish(&self) -> bool {
    self.shared.republish()
  }

  /// Requests the main loop to stop.
  pub fn deactivate(&self) {
    self.shared.deactivate();
  }

  /// Returns the liveness flag.
  pub fn is_alive(&self) -> bool {
    self.shared.is_alive()
  }

  /// Returns the lifecycle state.
  pub fn state(&self) -> LifecycleState {
    self.shared.state()
  }

  /// Returns the window id in effect.
  pub fn current_window_id(&self) -> WindowId {
    self.window_id
  }

  /// Names of the output ports with an attached sink, in order.
  pub fn output_connections(&self) -> Vec<String> {
    self.shared.output_connections()
  }

  /// Returns the counting sink attached to output port `port`.
  pub fn output_sink(&self, port: &str) -> Option<Arc<dyn CounterSink>> {
    self.shared.output_sink(port)
  }

  /// Runs the node's single activation to completion on the calling thread.
  ///
  /// # Errors
  ///
  /// - [`NodeError::AlreadyActivated`] if the node is not freshly constructed.
  /// - Whatever the main loop returns; the end-of-stream broadcast is then
  ///   skipped.
  /// - The first [`SinkError`] hit while broadcasting end-of-stream; sinks
  ///   after the failing one are not notified.
  pub fn activate(&mut self, context: Arc<dyn NodeContext<O>>) -> Result<(), NodeError> {
    let state = self.shared.state();
    if state != LifecycleState::Constructed {
      return Err(NodeError::AlreadyActivated {
        node: self.shared.id.clone(),
        state,
      });
    }
    self.shared.set_state(LifecycleState::Activating);

    self.context = Some(Arc::clone(&context));
    let published = self.shared.publish();
    self.shared.start();
    if self.activation_capable {
      if let Some(listener) = self.operator.as_activation_listener() {
        listener.activate(&*context);
      }
    }
    debug!(node = %self.shared.id, sinks = published, "node activated");

    self.shared.set_state(LifecycleState::Running);
    let outcome = {
      let mut activation = Activation::new(
        &self.shared,
        &mut self.operator,
        &*context,
        &mut self.window_id,
      );
      self.main_loop.run(&mut activation)
    };
    self.shared.begin_deactivation();

    if self.activation_capable {
      if let Some(listener) = self.operator.as_activation_listener() {
        listener.deactivate();
      }
    }
    self.context = None;

    let result = match outcome {
      Ok(()) => self
        .shared
        .broadcast(ControlTuple::EndOfStream {
          window_id: self.window_id,
        })
        .map(|sinks| {
          debug!(node = %self.shared.id, window = %self.window_id, sinks, "end of stream sent");
        })
        .map_err(|err| {
          error!(node = %self.shared.id, window = %self.window_id, error = %err, "end of stream broadcast failed");
          NodeError::from(err)
        }),
      Err(err) => {
        error!(node = %self.shared.id, window = %self.window_id, error = %err, "main loop failed");
        Err(err)
      }
    };

    self.shared.retire();
    self.shared.set_state(LifecycleState::Retired);
    result
  }
}

impl<O, L> PartialEq for Node<O, L> {
  fn eq(&self, other: &Self) -> bool {
    self.shared.id == other.shared.id
  }
}

impl<O, L> Eq for Node<O, L> {}

impl<O, L> Hash for Node<O, L> {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.shared.id.hash(state);
  }
}

impl<O, L> fmt::Display for Node<O, L> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.shared.id, f)
  }
}

impl<O, L> fmt::Debug for Node<O, L> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Node")
      .field("id", &self.shared.id)
      .field("state", &self.shared.state())
      .field("window_id", &self.window_id)
      .finish()
  }
}
