//! Push-delivered event ports.

pub(crate) mod broadcaster;

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::ports::{HandlerFn, LineError, LineId};

use broadcaster::{EventBroadcaster, EventHandler};

/// An event source port.
///
/// `EventSource` ports push discrete messages to every connected handler.
/// Delivery is synchronous: when [`fire`](EventSource::fire) returns, all
/// handlers have observed the event. Handlers run in registration order and
/// a failure reported by one handler does not prevent delivery to the
/// others.
///
/// When an `EventSource` is cloned, the information on connected handlers
/// remains shared and therefore all clones use and modify the same list of
/// connections.
///
/// Connections must not be added or removed from within a handler; the
/// graph is expected to be fully assembled before events start flowing.
#[derive(Clone)]
pub struct EventSource<T: Clone + Send + 'static> {
    broadcaster: Arc<RwLock<EventBroadcaster<T>>>,
}

impl<T: Clone + Send + 'static> EventSource<T> {
    /// Creates a new, disconnected `EventSource` port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a handler callable.
    ///
    /// The handler may be any callable admissible as a [`HandlerFn`], i.e.
    /// infallible or fallible, with or without a payload argument for
    /// `T = ()`.
    pub fn connect<F, S>(&self, handler: F) -> LineId
    where
        F: HandlerFn<T, S>,
    {
        self.add(Arc::new(move |arg| handler.deliver(arg)))
    }

    /// Adds a connection to an event sink.
    pub fn connect_sink(&self, sink: &EventSink<T>) -> LineId {
        self.add(sink.handler())
    }

    /// Removes the connection specified by the `LineId` parameter.
    ///
    /// It is a logic error to specify a line identifier from another
    /// `EventSource` instance and may result in the disconnection of an
    /// arbitrary handler.
    pub fn disconnect(&self, line_id: LineId) -> Result<(), LineError> {
        if self.broadcaster.write().unwrap().remove(line_id) {
            Ok(())
        } else {
            Err(LineError {})
        }
    }

    /// Removes all connections.
    pub fn disconnect_all(&self) {
        self.broadcaster.write().unwrap().clear();
    }

    /// Broadcasts an event to all connected handlers.
    pub fn fire(&self, arg: T) {
        self.broadcaster.read().unwrap().broadcast(arg);
    }

    pub(crate) fn add(&self, handler: EventHandler<T>) -> LineId {
        self.broadcaster.write().unwrap().add(handler)
    }
}

impl<T: Clone + Send + 'static> Default for EventSource<T> {
    fn default() -> Self {
        Self {
            broadcaster: Arc::new(RwLock::new(EventBroadcaster::default())),
        }
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for EventSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "EventSource ({} connected handlers)",
            self.broadcaster.read().unwrap().len()
        )
    }
}

/// An event sink port.
///
/// An `EventSink` is a named wrapper around a handler callable. It mainly
/// exists so that sinks can be passed around, registered for introspection
/// and connected to sources after construction; connecting a bare callable
/// with [`EventSource::connect`] is equivalent.
///
/// Clones share the same handler.
pub struct EventSink<T> {
    handler: EventHandler<T>,
}

impl<T: Clone + Send + 'static> EventSink<T> {
    /// Creates an event sink from a handler callable.
    pub fn new<F, S>(handler: F) -> Self
    where
        F: HandlerFn<T, S>,
    {
        Self {
            handler: Arc::new(move |arg| handler.deliver(arg)),
        }
    }

    /// Returns a shared handle to the handler.
    pub(crate) fn handler(&self) -> EventHandler<T> {
        self.handler.clone()
    }
}

impl<T> Clone for EventSink<T> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}

impl<T> fmt::Debug for EventSink<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}
