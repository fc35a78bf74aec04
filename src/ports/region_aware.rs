//! Region-aware ports and boundary-crossing connections.
//!
//! A region-aware port is a plain port augmented with a weak reference to
//! the [`Region`] it belongs to. The reference must be weak because regions
//! reach their nodes through tick connections while nodes own ports, so an
//! owning back-reference would form a cycle.
//!
//! [`connect_events`] uses the region identities of its two endpoints to
//! decide how to link them: endpoints of the same region are connected
//! directly and deliver synchronously, endpoints of different regions are
//! linked through a [`channel`](crate::channel) swap buffer wired to the
//! producer region's switch tick and the consumer region's work tick.

use std::ops::Deref;
use std::sync::{Arc, Mutex, Weak};

use tracing::warn;

use crate::channel::swap_buffer;
use crate::connect::ConnectError;
use crate::ports::{EventSink, EventSource, LineId};
use crate::region::Region;

/// A port carrying the identity of the region it belongs to.
///
/// Dereferences to the wrapped port, so intra-region use is unchanged.
#[derive(Debug)]
pub struct RegionAware<P> {
    port: P,
    region: Weak<Region>,
}

impl<P> RegionAware<P> {
    /// Wraps a port, tying it to the specified region.
    pub fn new(region: &Arc<Region>, port: P) -> Self {
        Self {
            port,
            region: Arc::downgrade(region),
        }
    }

    /// Returns the region of the port, if it is still alive.
    pub fn region(&self) -> Option<Arc<Region>> {
        self.region.upgrade()
    }

    /// Returns the wrapped port.
    pub fn port(&self) -> &P {
        &self.port
    }
}

impl<P> Deref for RegionAware<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.port
    }
}

/// Returns `true` if both endpoints belong to the same region.
///
/// Fails with [`ConnectError::RegionDropped`] if either region is gone.
pub fn same_region<P, Q>(a: &RegionAware<P>, b: &RegionAware<Q>) -> Result<bool, ConnectError> {
    let a = a.region().ok_or(ConnectError::RegionDropped)?;
    let b = b.region().ok_or(ConnectError::RegionDropped)?;

    Ok(a.id() == b.id())
}

/// Connects two region-aware event endpoints.
///
/// Same-region endpoints are connected directly: firing the source invokes
/// the sink handler synchronously on the caller's thread. Endpoints of
/// different regions are connected through a swap buffer, so an event fired
/// in the producer region's cycle `i` is observed by the sink during a
/// consumer region cycle `j > i`, after the producer's next switch tick.
///
/// The returned line identifier refers to the connection installed on the
/// source and can be used with
/// [`EventSource::disconnect`](crate::ports::EventSource::disconnect).
pub fn connect_events<T>(
    source: &RegionAware<EventSource<T>>,
    sink: &RegionAware<EventSink<T>>,
) -> Result<LineId, ConnectError>
where
    T: Clone + Send + 'static,
{
    let source_region = source.region().ok_or(ConnectError::RegionDropped)?;
    let sink_region = sink.region().ok_or(ConnectError::RegionDropped)?;

    if source_region.id() == sink_region.id() {
        return Ok(source.port.connect_sink(&sink.port));
    }

    let (producer, consumer) = swap_buffer();
    let producer = Arc::new(Mutex::new(producer));
    let consumer = Mutex::new(consumer);

    // Events fired by the source are appended to the filling queue, on the
    // producer region's thread.
    let p = producer.clone();
    let line_id = source.port.connect(move |value: T| {
        p.lock().unwrap().push(value);
    });

    // The producer region's switch tick publishes the queued batch.
    source_region.ticks().switch_tick().connect(move || {
        producer.lock().unwrap().switch();
    });

    // The consumer region's work tick drains the published batch into the
    // sink handler.
    let handler = sink.port.handler();
    sink_region.ticks().work_tick().connect(move || {
        consumer.lock().unwrap().drain(|value| {
            if let Err(e) = handler(value) {
                warn!(error = %e, "event handler failed");
            }
        });
    });

    Ok(line_id)
}
