//! # Port Test Suite
//!
//! Covers output port emission and registry construction.

use crate::error::SinkError;
use crate::operator::Operator;
use crate::port::{OutputPort, PortRegistry, INPUT, OUTPUT};
use crate::sink::{CounterSink, CountingSink, Sink};
use crate::tuple::Tuple;
use parking_lot::Mutex;
use std::sync::Arc;

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

struct TwoPorts {
  a: Arc<OutputPort>,
  b: Arc<OutputPort>,
}

impl Operator for TwoPorts {
  fn output_ports(&self) -> Vec<Arc<OutputPort>> {
    vec![Arc::clone(&self.b), Arc::clone(&self.a)]
  }

  fn input_ports(&self) -> Vec<String> {
    vec!["in".to_string()]
  }
}

struct Duplicates {
  first: Arc<OutputPort>,
  second: Arc<OutputPort>,
}

impl Operator for Duplicates {
  fn output_ports(&self) -> Vec<Arc<OutputPort>> {
    vec![Arc::clone(&self.first), Arc::clone(&self.second)]
  }
}

#[test]
fn test_unconnected_port_discards() {
  let port = OutputPort::new("out");
  assert!(!port.is_connected());
  assert!(port.emit(7i32).is_ok());
  assert!(port.sink().is_none());
}

#[test]
fn test_emit_reaches_attached_sink() {
  let port = OutputPort::new("out");
  let recorder = Arc::new(RecordingSink::default());
  let counting: Arc<dyn CounterSink> = Arc::new(CountingSink::new(Arc::clone(&recorder)));
  port.set_sink(Some(Arc::clone(&counting)));

  port.emit(1i32).unwrap();
  port.emit(2i32).unwrap();

  assert!(port.is_connected());
  assert_eq!(counting.count(), 2);
  let received = recorder.received.lock();
  assert_eq!(received[1].downcast_ref::<i32>(), Some(&2));
}

#[test]
fn test_set_sink_none_disconnects() {
  let port = OutputPort::new("out");
  let recorder = Arc::new(RecordingSink::default());
  port.set_sink(Some(Arc::new(CountingSink::new(Arc::clone(&recorder)))));
  port.emit(1i32).unwrap();

  port.set_sink(None);
  port.emit(2i32).unwrap();

  assert!(!port.is_connected());
  assert_eq!(recorder.received.lock().len(), 1);
}

#[test]
fn test_registry_describes_operator() {
  let operator = TwoPorts {
    a: OutputPort::new("a"),
    b: OutputPort::new("b"),
  };
  let registry = PortRegistry::describe(&operator);

  assert_eq!(registry.output_port_names().collect::<Vec<_>>(), vec!["a", "b"]);
  assert!(registry.has_output_port("a"));
  assert!(!registry.has_output_port("c"));
  assert!(registry.has_input_port("in"));
  assert!(!registry.has_input_port("a"));
  assert!(Arc::ptr_eq(registry.output_port("a").unwrap(), &operator.a));
}

#[test]
fn test_registry_keeps_last_duplicate() {
  let operator = Duplicates {
    first: OutputPort::new("out"),
    second: OutputPort::new("out"),
  };
  let registry = PortRegistry::describe(&operator);

  assert_eq!(registry.output_port_names().count(), 1);
  assert!(Arc::ptr_eq(registry.output_port("out").unwrap(), &operator.second));
}

struct Relay {
  out: Arc<OutputPort>,
}

impl Operator for Relay {
  fn output_ports(&self) -> Vec<Arc<OutputPort>> {
    vec![Arc::clone(&self.out)]
  }

  fn input_ports(&self) -> Vec<String> {
    vec![INPUT.to_string()]
  }
}

#[test]
fn test_conventional_port_names() {
  let operator = Relay {
    out: OutputPort::new(OUTPUT),
  };
  let registry = PortRegistry::describe(&operator);

  assert_eq!(registry.output_port_names().collect::<Vec<_>>(), vec!["output"]);
  assert!(registry.has_input_port("input"));
  assert_eq!(operator.out.name(), OUTPUT);
}
