//! # Context Test Suite
//!
//! Covers the request queue and the channel-backed context.

use crate::context::{ChannelContext, NodeContext, NodeRequest, RequestQueue};
use crate::error::RequestError;
use crate::node::NodeId;
use crate::stats::{OperatorStats, PortStats};
use crate::window::WindowId;

#[derive(Default)]
struct Journal {
  entries: Vec<String>,
}

struct Append(&'static str);

impl NodeRequest<Journal> for Append {
  fn execute(
    self: Box<Self>,
    operator: &mut Journal,
    node_id: &NodeId,
    window_id: WindowId,
  ) -> Result<(), RequestError> {
    operator
      .entries
      .push(format!("{}@{}:{}", self.0, node_id, window_id));
    Ok(())
  }
}

#[test]
fn test_queue_is_fifo() {
  let queue = RequestQueue::<Journal>::new();
  queue.push(Append("first"));
  queue.submit(|journal, _node, _window| {
    journal.entries.push("second".to_string());
    Ok(())
  });
  queue.push_boxed(Box::new(Append("third")));
  assert_eq!(queue.len(), 3);

  let mut journal = Journal::default();
  let node = NodeId::new("n1");
  while let Some(request) = queue.pop() {
    request.execute(&mut journal, &node, WindowId::new(4)).unwrap();
  }

  assert!(queue.is_empty());
  assert_eq!(journal.entries, vec!["first@n1:4", "second", "third@n1:4"]);
}

#[test]
fn test_queue_discard_is_bounded() {
  let queue = RequestQueue::<Journal>::new();
  queue.push(Append("a"));
  queue.push(Append("b"));
  queue.push(Append("c"));

  assert_eq!(queue.discard(2), 2);
  assert_eq!(queue.len(), 1);
  assert_eq!(queue.discard(5), 1);
  assert!(queue.is_empty());
}

#[test]
fn test_failing_closure_request() {
  let queue = RequestQueue::<Journal>::new();
  queue.submit(|_journal, _node, window| Err(format!("refused at {}", window).into()));

  let request = queue.pop().unwrap();
  let err = request
    .execute(&mut Journal::default(), &NodeId::new("n"), WindowId::new(2))
    .unwrap_err();
  assert_eq!(err.to_string(), "refused at 2");
}

#[test]
fn test_channel_context_reports() {
  let (context, mut receiver) = ChannelContext::<Journal>::new(NodeId::new("reporter"));
  assert_eq!(context.node_id().as_str(), "reporter");
  assert!(context.requests().is_empty());

  let stats = OperatorStats {
    window_id: WindowId::new(7),
    ports: vec![PortStats::new("a", 5)],
  };
  context.report(stats.clone(), WindowId::new(7));

  assert_eq!(receiver.try_recv().unwrap(), stats);
}

#[test]
fn test_channel_context_report_after_receiver_dropped() {
  let (context, receiver) = ChannelContext::<Journal>::new(NodeId::new("orphan"));
  drop(receiver);
  // Fire-and-forget: a gone receiver is not an error.
  context.report(OperatorStats::new(WindowId::new(1)), WindowId::new(1));
}
