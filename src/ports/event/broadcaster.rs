use std::sync::Arc;

use tracing::warn;

use crate::ports::{HandlerError, LineId};

/// A type-erased, shareable event handler.
pub(crate) type EventHandler<T> = Arc<dyn Fn(T) -> Result<(), HandlerError> + Send + Sync>;

/// An object that synchronously broadcasts events to several handlers.
///
/// Handlers are invoked in registration order. A failure reported by one
/// handler is logged and delivery proceeds with the remaining handlers.
pub(super) struct EventBroadcaster<T> {
    /// The list of handlers with their associated line identifier.
    handlers: Vec<(LineId, EventHandler<T>)>,
    /// Identifier to be assigned to the next added handler.
    next_line_id: u64,
}

impl<T: Clone> EventBroadcaster<T> {
    /// Adds a new handler and returns its line identifier.
    pub(super) fn add(&mut self, handler: EventHandler<T>) -> LineId {
        let line_id = LineId(self.next_line_id);
        self.next_line_id += 1;
        self.handlers.push((line_id, handler));

        line_id
    }

    /// Removes the handler with the specified identifier, if any.
    ///
    /// Returns `true` if there was indeed a handler associated to the
    /// specified identifier.
    pub(super) fn remove(&mut self, id: LineId) -> bool {
        if let Some(pos) = self.handlers.iter().position(|h| h.0 == id) {
            self.handlers.remove(pos);

            return true;
        }

        false
    }

    /// Removes all handlers.
    pub(super) fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Returns the number of connected handlers.
    pub(super) fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Broadcasts an event to all connected handlers, in registration order.
    pub(super) fn broadcast(&self, arg: T) {
        // Move the argument rather than clone it for the last handler.
        if let Some(((_, last), head)) = self.handlers.split_last() {
            for (_, handler) in head {
                if let Err(e) = handler(arg.clone()) {
                    warn!(error = %e, "event handler failed, continuing delivery");
                }
            }
            if let Err(e) = last(arg) {
                warn!(error = %e, "event handler failed");
            }
        }
    }
}

impl<T> Default for EventBroadcaster<T> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            next_line_id: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    #[test]
    fn broadcast_preserves_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut broadcaster = EventBroadcaster::default();

        for tag in 0..4 {
            let seen = seen.clone();
            broadcaster.add(Arc::new(move |v: u64| {
                seen.lock().unwrap().push((tag, v));
                Ok(())
            }));
        }

        broadcaster.broadcast(7);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(0, 7), (1, 7), (2, 7), (3, 7)]
        );
    }

    #[test]
    fn failed_handler_does_not_stop_delivery() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut broadcaster = EventBroadcaster::default();

        broadcaster.add(Arc::new(|_: u64| Err(HandlerError::new("broken"))));
        let s = seen.clone();
        broadcaster.add(Arc::new(move |v: u64| {
            s.lock().unwrap().push(v);
            Ok(())
        }));

        broadcaster.broadcast(13);

        assert_eq!(*seen.lock().unwrap(), vec![13]);
    }

    #[test]
    fn removed_handler_is_skipped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut broadcaster = EventBroadcaster::default();

        let s = seen.clone();
        let first = broadcaster.add(Arc::new(move |v: u64| {
            s.lock().unwrap().push((0, v));
            Ok(())
        }));
        let s = seen.clone();
        broadcaster.add(Arc::new(move |v: u64| {
            s.lock().unwrap().push((1, v));
            Ok(())
        }));

        assert!(broadcaster.remove(first));
        assert!(!broadcaster.remove(first));

        broadcaster.broadcast(5);

        assert_eq!(*seen.lock().unwrap(), vec![(1, 5)]);
    }
}
