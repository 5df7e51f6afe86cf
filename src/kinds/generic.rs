//! # Generic Node
//!
//! The general-purpose node kind. Every connected input port feeds one shared,
//! bounded reservoir; the main loop drains it in arrival order:
//!
//! - **Data** is handed to [`InputOperator::process`] with the port it came in
//!   on.
//! - **Checkpoint** from upstream marks a window boundary. Checkpoints are
//!   aligned across inputs: once an input delivers a checkpoint, its later
//!   tuples are held back until every open input has delivered one. The
//!   boundary then fires for the lowest of those windows: pending requests
//!   are drained, statistics reported, and a single checkpoint forwarded
//!   downstream. Held tuples are replayed afterwards, so window `w` counts
//!   exactly the tuples every input sent before its checkpoint `w`.
//! - **End of stream** closes the input it arrived on and counts as that
//!   input's arrival at every later barrier. When every connected input is
//!   closed the loop returns, and the node broadcasts its own end-of-stream.
//!
//! The reservoir holds [`NodeConfig::buffer_capacity`] tuples. A full
//! reservoir refuses further tuples with [`SinkError::Full`] instead of
//! blocking the upstream thread. When the reservoir is empty the loop sleeps
//! for [`NodeConfig::idle_spin`] and checks `alive` again.

use crate::config::{NodeConfig, DEFAULT_BUFFER_CAPACITY};
use crate::error::{NodeError, SinkError};
use crate::node::{Activation, MainLoop};
use crate::operator::InputOperator;
use crate::sink::Sink;
use crate::tuple::{ControlTuple, Tuple};
use crate::window::WindowId;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, trace};

type Arrival = (Arc<str>, Tuple);

/// Input sink handed to upstream for one port.
struct ReservoirSink {
  port: Arc<str>,
  sender: Sender<Arrival>,
  capacity: usize,
}

impl Sink for ReservoirSink {
  fn process(&self, tuple: Tuple) -> Result<(), SinkError> {
    self
      .sender
      .try_send((Arc::clone(&self.port), tuple))
      .map_err(|err| match err {
        TrySendError::Full(_) => SinkError::Full(self.capacity),
        TrySendError::Closed(_) => SinkError::Closed,
      })
  }
}

/// Checkpoint alignment state of one activation.
struct Barrier {
  open: BTreeSet<String>,
  /// Window of the checkpoint each input is waiting at.
  reached: BTreeMap<String, WindowId>,
  /// Tuples of waiting inputs, in arrival order.
  held: VecDeque<Arrival>,
  /// Tuples released by the last barrier, replayed before the reservoir.
  ready: VecDeque<Arrival>,
  last: Option<WindowId>,
}

impl Barrier {
  fn new(open: BTreeSet<String>) -> Self {
    Self {
      open,
      reached: BTreeMap::new(),
      held: VecDeque::new(),
      ready: VecDeque::new(),
      last: None,
    }
  }

  fn is_waiting(&self, port: &str) -> bool {
    self.reached.contains_key(port)
  }

  fn is_stale(&self, window_id: WindowId) -> bool {
    self.last.is_some_and(|last| window_id <= last)
  }

  fn close(&mut self, port: &str) {
    self.open.remove(port);
    self.reached.remove(port);
  }

  /// Window at which every open input is waiting, if they all are.
  fn aligned(&self) -> Option<WindowId> {
    if self.open.is_empty() || !self.open.iter().all(|port| self.reached.contains_key(port)) {
      return None;
    }
    self.reached.values().min().copied()
  }

  /// Lifts the barrier at `window_id` and queues the held tuples for replay.
  fn release(&mut self, window_id: WindowId) {
    self.last = Some(window_id);
    self.reached.retain(|_, reached| *reached > window_id);
    while let Some(arrival) = self.held.pop_back() {
      self.ready.push_front(arrival);
    }
  }
}

/// Node kind that drains a shared input reservoir.
pub struct GenericNode {
  sender: Sender<Arrival>,
  receiver: Receiver<Arrival>,
  capacity: usize,
  inputs: BTreeSet<String>,
}

impl GenericNode {
  /// Creates a generic node kind with no inputs connected and the default
  /// reservoir capacity.
  pub fn new() -> Self {
    Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
  }

  /// Creates a generic node kind whose reservoir holds `capacity` tuples.
  pub fn with_capacity(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    let (sender, receiver) = mpsc::channel(capacity);
    Self {
      sender,
      receiver,
      capacity,
      inputs: BTreeSet::new(),
    }
  }

  /// Reservoir capacity, in tuples.
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Names of the connected input ports.
  pub fn connected_inputs(&self) -> impl Iterator<Item = &str> {
    self.inputs.iter().map(String::as_str)
  }

  fn pass_barrier<O: InputOperator>(
    barrier: &mut Barrier,
    activation: &mut Activation<'_, O>,
  ) -> Result<(), NodeError> {
    let Some(window_id) = barrier.aligned() else {
      return Ok(());
    };
    if window_id >= activation.window_id() {
      activation.handle_requests(window_id)?;
      activation.emit_checkpoint(window_id)?;
    } else {
      trace!(node = %activation.node_id(), window = %window_id, "barrier behind current window");
    }
    barrier.release(window_id);
    Ok(())
  }
}

impl Default for GenericNode {
  fn default() -> Self {
    Self::new()
  }
}

impl<O: InputOperator> MainLoop<O> for GenericNode {
  fn connect_input_port(&mut self, port: &str) -> Option<Arc<dyn Sink>> {
    self.inputs.insert(port.to_string());
    Some(Arc::new(ReservoirSink {
      port: Arc::from(port),
      sender: self.sender.clone(),
      capacity: self.capacity,
    }))
  }

  fn configure(&mut self, config: &NodeConfig) {
    let capacity = config.buffer_capacity.max(1);
    if capacity == self.capacity {
      return;
    }
    if self.inputs.is_empty() {
      *self = Self::with_capacity(capacity);
    } else {
      debug!(capacity = self.capacity, "inputs already connected, keeping reservoir");
    }
  }

  fn disconnect_input_port(&mut self, port: &str) {
    self.inputs.remove(port);
  }

  fn run(&mut self, activation: &mut Activation<'_, O>) -> Result<(), NodeError> {
    let idle_spin = activation.config().idle_spin;
    let mut barrier = Barrier::new(self.inputs.clone());

    while activation.is_alive() {
      let (port, tuple) = match barrier.ready.pop_front() {
        Some(arrival) => arrival,
        None => match self.receiver.try_recv() {
          Ok(arrival) => arrival,
          Err(TryRecvError::Empty) => {
            std::thread::sleep(idle_spin);
            continue;
          }
          Err(TryRecvError::Disconnected) => break,
        },
      };

      if !self.inputs.contains(&*port) {
        trace!(node = %activation.node_id(), port = %port, "dropping tuple from disconnected input");
        continue;
      }
      if barrier.is_waiting(&port) {
        barrier.held.push_back((port, tuple));
        continue;
      }

      match tuple {
        Tuple::Data(payload) => activation.operator_mut().process(&port, payload)?,
        Tuple::Control(ControlTuple::Checkpoint { window_id }) => {
          if barrier.is_stale(window_id) {
            trace!(node = %activation.node_id(), port = %port, window = %window_id, "ignoring stale checkpoint");
            continue;
          }
          barrier.reached.insert(port.to_string(), window_id);
          Self::pass_barrier(&mut barrier, activation)?;
        }
        Tuple::Control(ControlTuple::EndOfStream { window_id }) => {
          if window_id > activation.window_id() {
            activation.advance_window(window_id)?;
          }
          barrier.close(&port);
          if barrier.open.is_empty() {
            debug!(node = %activation.node_id(), window = %activation.window_id(), "all inputs ended");
            break;
          }
          Self::pass_barrier(&mut barrier, activation)?;
        }
      }
    }
    Ok(())
  }
}
