//! # Sink Test Suite
//!
//! Covers the counting decorator and the counting-capability probe.

use crate::error::SinkError;
use crate::sink::{CounterSink, CountingSink, Sink};
use crate::tuple::{ControlTuple, Tuple};
use crate::window::WindowId;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Mock Sinks
// ============================================================================

#[derive(Default)]
struct RecordingSink {
  received: Mutex<Vec<Tuple>>,
}

impl Sink for RecordingSink {
  fn process(&self, tuple: Tuple) -> Result<(), SinkError> {
    self.received.lock().push(tuple);
    Ok(())
  }
}

struct RejectingSink;

impl Sink for RejectingSink {
  fn process(&self, _tuple: Tuple) -> Result<(), SinkError> {
    Err(SinkError::Rejected("full".to_string()))
  }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_counting_sink_forwards_and_counts() {
  let inner = Arc::new(RecordingSink::default());
  let counting = CountingSink::new(Arc::clone(&inner));

  counting.process(Tuple::data(1i32)).unwrap();
  counting.process(Tuple::data(2i32)).unwrap();
  counting
    .process(Tuple::Control(ControlTuple::Checkpoint {
      window_id: WindowId::new(3),
    }))
    .unwrap();

  assert_eq!(counting.count(), 3);
  let received = inner.received.lock();
  assert_eq!(received.len(), 3);
  assert_eq!(received[0].downcast_ref::<i32>(), Some(&1));
  assert_eq!(received[1].downcast_ref::<i32>(), Some(&2));
  assert!(received[2].is_control());
}

#[test]
fn test_reset_count_returns_and_zeroes() {
  let counting = CountingSink::new(Arc::new(RecordingSink::default()));
  for i in 0..4u8 {
    counting.process(Tuple::data(i)).unwrap();
  }

  assert_eq!(counting.count(), 4);
  assert_eq!(counting.count(), 4);
  assert_eq!(counting.reset_count(), 4);
  assert_eq!(counting.count(), 0);
  assert_eq!(counting.reset_count(), 0);

  counting.process(Tuple::data(9u8)).unwrap();
  assert_eq!(counting.reset_count(), 1);
}

#[test]
fn test_counting_sink_propagates_inner_failure() {
  let counting = CountingSink::new(Arc::new(RejectingSink));
  let err = counting.process(Tuple::data("x")).unwrap_err();
  assert_eq!(err, SinkError::Rejected("full".to_string()));
  // The attempt is still counted.
  assert_eq!(counting.count(), 1);
}

#[test]
fn test_plain_sink_has_no_counter_capability() {
  let plain: Arc<dyn Sink> = Arc::new(RecordingSink::default());
  assert!(plain.counter().is_none());
}

#[test]
fn test_counting_sink_exposes_counter_capability() {
  let counting = Arc::new(CountingSink::new(Arc::new(RecordingSink::default())));
  let as_sink: Arc<dyn Sink> = Arc::clone(&counting) as Arc<dyn Sink>;

  let counter = as_sink.counter().expect("counting sink is a counter");
  counter.process(Tuple::data(5u64)).unwrap();
  assert_eq!(counting.count(), 1);
}

proptest! {
  #[test]
  fn prop_count_matches_process_calls(first in 0usize..200, second in 0usize..200) {
    let counting = CountingSink::new(Arc::new(RecordingSink::default()));
    for i in 0..first {
      counting.process(Tuple::data(i)).unwrap();
    }
    prop_assert_eq!(counting.count(), first as u64);
    prop_assert_eq!(counting.reset_count(), first as u64);

    for i in 0..second {
      counting.process(Tuple::data(i)).unwrap();
    }
    prop_assert_eq!(counting.reset_count(), second as u64);
    prop_assert_eq!(counting.count(), 0);
  }
}
