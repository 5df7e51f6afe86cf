//! Concrete node kinds.
//!
//! A node kind is a [`MainLoop`](crate::node::MainLoop): it decides how input
//! ports are connected and how tuples reach the operator.

mod generic;

pub use generic::GenericNode;
