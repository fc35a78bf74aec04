//! Typed port primitives.
//!
//! Nodes communicate through four kinds of ports, distinguished by
//! direction and discipline:
//!
//! * [`EventSource`], a push producer exposing [`fire`](EventSource::fire),
//! * [`EventSink`], a push consumer holding a handler,
//! * [`StateSource`], a pull producer wrapping a provider callable,
//! * [`StateSink`], a pull consumer exposing [`get`](StateSink::get).
//!
//! Events are discrete messages delivered synchronously to every connected
//! handler; states are continuous values computed on demand with no change
//! notification. The payload type is identical on both ends of any directly
//! connected pair, which the type system enforces at compile time.
//!
//! Ports can be made aware of the [region](crate::region) they belong to by
//! wrapping them in [`RegionAware`](region_aware::RegionAware), in which
//! case connecting across region boundaries transparently interposes a
//! cross-region buffer (see the [`channel`](crate::channel) module).

mod event;
pub mod markers;
mod port_fn;
pub mod region_aware;
mod state;

use std::fmt;

pub use event::{EventSink, EventSource};
pub use port_fn::{HandlerFn, OpFn};
pub use state::{QueryError, StateSink, StateSource};

/// Unique identifier for a connection installed on an event source.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct LineId(pub(crate) u64);

/// Error raised when the specified line cannot be found.
#[derive(Copy, Clone, Debug)]
pub struct LineError {}

impl fmt::Display for LineError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "no connection with the specified identifier")
    }
}

impl std::error::Error for LineError {}

/// Error reported by a failing event handler.
///
/// A handler failure is logged and suppressed by the dispatching source so
/// that delivery to the remaining handlers proceeds.
#[derive(Clone, Debug)]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Creates a handler error with the specified message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "event handler failed: {}", self.message)
    }
}

impl std::error::Error for HandlerError {}

impl From<QueryError> for HandlerError {
    fn from(e: QueryError) -> Self {
        Self::new(e.to_string())
    }
}

/// The four port disciplines, as reported by node introspection.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PortKind {
    /// A push producer.
    EventSource,
    /// A push consumer.
    EventSink,
    /// A pull producer.
    StateSource,
    /// A pull consumer.
    StateSink,
}

/// Introspection record for one port of a node.
///
/// Port records are consumed by graph visualization tooling through the
/// [`registry`](crate::registry) module; the core only exposes the data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PortInfo {
    /// Name of the port within its node.
    pub name: String,
    /// Direction and discipline of the port.
    pub kind: PortKind,
}

impl PortInfo {
    /// Creates a port record.
    pub fn new(name: impl Into<String>, kind: PortKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}
