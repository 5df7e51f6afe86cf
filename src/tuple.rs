//! # Data and Control Tuples
//!
//! Everything a sink receives is a [`Tuple`]: either a type-erased data
//! payload or a [`ControlTuple`]. Control tuples share the channel with data
//! so a downstream receiver observes them in order relative to the data that
//! preceded them.
//!
//! ## Payloads
//!
//! Payloads are `Arc<dyn Any + Send + Sync>`. Fan-out to several sinks clones
//! the `Arc`, never the value. Receivers downcast to the type they expect:
//!
//! ```rust
//! use streamweave_engine::tuple::Tuple;
//!
//! let tuple = Tuple::data(42i32);
//! assert_eq!(tuple.downcast_ref::<i32>(), Some(&42));
//! assert!(!tuple.is_control());
//! ```

use crate::window::WindowId;
use std::any::Any;
use std::sync::Arc;

/// Type-erased data carried by a [`Tuple::Data`].
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Out-of-band marker interleaved with data.
///
/// Control tuples are broadcast, never queued: every currently published sink
/// receives its own copy synchronously at emission time.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ControlTuple {
  /// The sending node will emit nothing more.
  EndOfStream {
    /// Window in effect when the node stopped.
    window_id: WindowId,
  },
  /// Window boundary for downstream durability coordination.
  Checkpoint {
    /// Window the checkpoint closes.
    window_id: WindowId,
  },
}

impl ControlTuple {
  /// Returns the window id carried by this control tuple.
  #[inline]
  pub fn window_id(&self) -> WindowId {
    match self {
      Self::EndOfStream { window_id } | Self::Checkpoint { window_id } => *window_id,
    }
  }

  /// Returns `true` for [`ControlTuple::EndOfStream`].
  #[inline]
  pub fn is_end_of_stream(&self) -> bool {
    matches!(self, Self::EndOfStream { .. })
  }

  /// Returns `true` for [`ControlTuple::Checkpoint`].
  #[inline]
  pub fn is_checkpoint(&self) -> bool {
    matches!(self, Self::Checkpoint { .. })
  }
}

/// The unit delivered to a [`Sink`](crate::sink::Sink).
#[derive(Clone, Debug)]
pub enum Tuple {
  /// A data payload produced by an operator.
  Data(Payload),
  /// A control marker produced by the node runtime.
  Control(ControlTuple),
}

impl Tuple {
  /// Wraps a value into a data tuple.
  pub fn data<T: Any + Send + Sync>(value: T) -> Self {
    Self::Data(Arc::new(value))
  }

  /// Returns `true` if this is a control tuple.
  #[inline]
  pub fn is_control(&self) -> bool {
    matches!(self, Self::Control(_))
  }

  /// Returns the control tuple, if any.
  #[inline]
  pub fn as_control(&self) -> Option<&ControlTuple> {
    match self {
      Self::Control(control) => Some(control),
      Self::Data(_) => None,
    }
  }

  /// Returns the payload, if this is a data tuple.
  #[inline]
  pub fn payload(&self) -> Option<&Payload> {
    match self {
      Self::Data(payload) => Some(payload),
      Self::Control(_) => None,
    }
  }

  /// Downcasts the payload of a data tuple to `T`.
  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.payload().and_then(|payload| payload.downcast_ref::<T>())
  }
}

impl From<ControlTuple> for Tuple {
  fn from(control: ControlTuple) -> Self {
    Self::Control(control)
  }
}
