//! # Sinks
//!
//! A [`Sink`] is a single-method receiver of one [`Tuple`] at a time: the unit
//! of downstream connection. [`CounterSink`] is the counting capability a sink
//! may carry; the node relies on it to report per-port throughput at every
//! window boundary.
//!
//! Sinks that do not count themselves are wrapped in a [`CountingSink`] when
//! they are attached to an output port, so every attached sink is uniformly
//! countable no matter what the caller supplied:
//!
//! ```rust
//! use std::sync::Arc;
//! use streamweave_engine::error::SinkError;
//! use streamweave_engine::sink::{CounterSink, CountingSink, Sink};
//! use streamweave_engine::tuple::Tuple;
//!
//! struct Discard;
//!
//! impl Sink for Discard {
//!   fn process(&self, _tuple: Tuple) -> Result<(), SinkError> {
//!     Ok(())
//!   }
//! }
//!
//! let counting = CountingSink::new(Arc::new(Discard));
//! counting.process(Tuple::data(1u8)).unwrap();
//! counting.process(Tuple::data(2u8)).unwrap();
//! assert_eq!(counting.count(), 2);
//! assert_eq!(counting.reset_count(), 2);
//! assert_eq!(counting.count(), 0);
//! ```

use crate::error::SinkError;
use crate::tuple::Tuple;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Receiver of one tuple at a time.
///
/// `process` takes `&self`: a sink is shared between the output port that
/// feeds it data and the node that broadcasts control tuples to it. Only the
/// thread driving the node's main loop calls `process`.
pub trait Sink: Send + Sync {
  /// Delivers one tuple.
  ///
  /// # Errors
  ///
  /// Returns a [`SinkError`] if the tuple could not be delivered. The error is
  /// not caught by the node: it ends the emission that hit it.
  fn process(&self, tuple: Tuple) -> Result<(), SinkError>;

  /// Capability probe for [`CounterSink`].
  ///
  /// Returns `Some` when this sink already counts what it processes, in which
  /// case it is attached as-is instead of being wrapped. The default reports
  /// no counting capability.
  fn counter(self: Arc<Self>) -> Option<Arc<dyn CounterSink>> {
    None
  }
}

/// A sink that counts the tuples it processes.
pub trait CounterSink: Sink {
  /// Returns the number of tuples processed since the last reset.
  fn count(&self) -> u64;

  /// Returns the number of tuples processed since the last reset and sets
  /// the count back to zero in the same atomic step.
  fn reset_count(&self) -> u64;
}

/// Counting decorator around any [`Sink`].
///
/// Increments its counter once per `process` call, then forwards the tuple.
/// The count is exact: no sampling, no loss.
pub struct CountingSink<S: ?Sized = dyn Sink> {
  inner: Arc<S>,
  count: AtomicU64,
}

impl<S: Sink + ?Sized> CountingSink<S> {
  /// Wraps `inner` with a zeroed counter.
  pub fn new(inner: Arc<S>) -> Self {
    Self {
      inner,
      count: AtomicU64::new(0),
    }
  }

  /// Returns the wrapped sink.
  pub fn inner(&self) -> &Arc<S> {
    &self.inner
  }
}

impl<S: Sink + ?Sized + 'static> Sink for CountingSink<S> {
  fn process(&self, tuple: Tuple) -> Result<(), SinkError> {
    self.count.fetch_add(1, Ordering::Relaxed);
    self.inner.process(tuple)
  }

  fn counter(self: Arc<Self>) -> Option<Arc<dyn CounterSink>> {
    Some(self)
  }
}

impl<S: Sink + ?Sized + 'static> CounterSink for CountingSink<S> {
  fn count(&self) -> u64 {
    self.count.load(Ordering::Relaxed)
  }

  fn reset_count(&self) -> u64 {
    self.count.swap(0, Ordering::AcqRel)
  }
}

impl<S: ?Sized> fmt::Debug for CountingSink<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CountingSink")
      .field("count", &self.count.load(Ordering::Relaxed))
      .finish()
  }
}
