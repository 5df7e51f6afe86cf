//! Per-window operator statistics.
//!
//! At every window boundary the node reads-and-resets the counter of each
//! attached output port and hands the resulting [`OperatorStats`] to its
//! context. The same counts are recorded through the `metrics` facade as
//! `streamweave_node_tuples_emitted_total{node, port}`; recording is a no-op
//! unless the host installs a recorder.

use crate::node::NodeId;
use crate::window::WindowId;
use metrics::counter;

/// Tuples emitted on one output port during one window.
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PortStats {
  /// Declared output port name.
  pub port_name: String,
  /// Tuples processed by the port's sink since the previous window boundary.
  pub emitted_count: u64,
}

impl PortStats {
  /// Creates a port statistics entry.
  pub fn new(port_name: impl Into<String>, emitted_count: u64) -> Self {
    Self {
      port_name: port_name.into(),
      emitted_count,
    }
  }
}

/// Statistics record of one window.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OperatorStats {
  /// Window the record covers.
  pub window_id: WindowId,
  /// One entry per attached output port, ordered by port name.
  pub ports: Vec<PortStats>,
}

impl OperatorStats {
  /// Creates an empty record for `window_id`.
  pub fn new(window_id: WindowId) -> Self {
    Self {
      window_id,
      ports: Vec::new(),
    }
  }

  /// Returns the emitted count of `port_name`, if the port was attached.
  pub fn emitted(&self, port_name: &str) -> Option<u64> {
    self
      .ports
      .iter()
      .find(|port| port.port_name == port_name)
      .map(|port| port.emitted_count)
  }

  /// Sum of the emitted counts of every port.
  pub fn total_emitted(&self) -> u64 {
    self.ports.iter().map(|port| port.emitted_count).sum()
  }
}

/// Records the emitted counts of a window for `node` in the metrics facade.
pub fn record_emitted(node: &NodeId, stats: &OperatorStats) {
  for port in &stats.ports {
    counter!(
      "streamweave_node_tuples_emitted_total",
      "node" => node.to_string(),
      "port" => port.port_name.clone()
    )
    .increment(port.emitted_count);
  }
}
