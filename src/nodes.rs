//! Generic composite nodes.
//!
//! The nodes in this module are built entirely in terms of the port
//! contracts: a node owns its ports, exposes them for connection and
//! implements [`Node`] so that graph tooling can introspect it. None of
//! them assumes anything about the region layout; they work unchanged
//! whether their ports are connected within one region or across regions.

mod switch;
mod transform;
mod watch;

pub use switch::{EventSwitch, StateSwitch};
pub use transform::{transform, TransformNode};
pub use watch::{on_changed, watch, WatchNode};

use crate::ports::PortInfo;

/// A user-visible computation unit owning some ports.
///
/// The trait only covers what graph visualization needs: a name and the
/// list of incident ports. Implementing it is not required for a struct to
/// participate in a dataflow graph.
pub trait Node {
    /// Returns the name of the node.
    fn name(&self) -> &str;

    /// Returns a record for each port of the node.
    fn ports(&self) -> Vec<PortInfo>;
}
