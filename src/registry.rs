//! Named endpoint registry and graph introspection.
//!
//! The registry serves two purposes. It holds a snapshot of the registered
//! nodes with their incident ports, which is the data a graph visualizer
//! consumes; and it holds type-erased event endpoints under logical names,
//! so that parts of a graph assembled by independent components can be
//! wired together by name. The named path is runtime-typed: payload
//! disagreement between two endpoints surfaces as
//! [`ConnectError::TypeMismatch`] instead of a compile error.

use std::any::{type_name, Any};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use crate::connect::ConnectError;
use crate::nodes::Node;
use crate::ports::{EventSink, EventSource, LineId, PortInfo};

/// Introspection snapshot of a registered node.
#[derive(Clone, Debug)]
pub struct NodeInfo {
    /// Name of the node.
    pub name: String,
    /// Records of the node's ports at registration time.
    pub ports: Vec<PortInfo>,
}

/// A type-erased event source with its payload type name.
struct SourceEntry {
    payload: &'static str,
    /// Attempts to connect the source to a type-erased sink; `None` means
    /// the sink payload did not match.
    connect: Box<dyn Fn(&(dyn Any + Send + Sync)) -> Option<LineId> + Send + Sync>,
}

/// A type-erased event sink with its payload type name.
struct SinkEntry {
    payload: &'static str,
    sink: Box<dyn Any + Send + Sync>,
}

/// A registry of named endpoints and introspectable nodes.
#[derive(Default)]
pub struct EndpointRegistry {
    event_sources: HashMap<String, SourceEntry>,
    event_sinks: HashMap<String, SinkEntry>,
    nodes: Vec<NodeInfo>,
}

impl EndpointRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an event source to the registry.
    ///
    /// If the specified name is already in use for another event source,
    /// the source provided as argument is returned in the error.
    pub fn add_event_source<T>(
        &mut self,
        source: EventSource<T>,
        name: impl Into<String>,
    ) -> Result<(), EventSource<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        match self.event_sources.entry(name.into()) {
            Entry::Vacant(s) => {
                s.insert(SourceEntry {
                    payload: type_name::<T>(),
                    connect: Box::new(move |sink| {
                        sink.downcast_ref::<EventSink<T>>()
                            .map(|sink| source.connect_sink(sink))
                    }),
                });

                Ok(())
            }
            Entry::Occupied(_) => Err(source),
        }
    }

    /// Adds an event sink to the registry.
    ///
    /// If the specified name is already in use for another event sink, the
    /// sink provided as argument is returned in the error.
    pub fn add_event_sink<T>(
        &mut self,
        sink: EventSink<T>,
        name: impl Into<String>,
    ) -> Result<(), EventSink<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        match self.event_sinks.entry(name.into()) {
            Entry::Vacant(s) => {
                s.insert(SinkEntry {
                    payload: type_name::<T>(),
                    sink: Box::new(sink),
                });

                Ok(())
            }
            Entry::Occupied(_) => Err(sink),
        }
    }

    /// Connects two registered endpoints by name.
    ///
    /// Fails with [`ConnectError::UnknownEndpoint`] if either name is not
    /// registered and with [`ConnectError::TypeMismatch`] if the payload
    /// types of the two endpoints disagree.
    pub fn connect_by_name(&self, source: &str, sink: &str) -> Result<LineId, ConnectError> {
        let source = self
            .event_sources
            .get(source)
            .ok_or_else(|| ConnectError::UnknownEndpoint(source.into()))?;
        let sink = self
            .event_sinks
            .get(sink)
            .ok_or_else(|| ConnectError::UnknownEndpoint(sink.into()))?;

        (source.connect)(sink.sink.as_ref()).ok_or(ConnectError::TypeMismatch {
            expected: source.payload,
            found: sink.payload,
        })
    }

    /// Takes an introspection snapshot of a node.
    pub fn register_node(&mut self, node: &dyn Node) {
        self.nodes.push(NodeInfo {
            name: node.name().to_string(),
            ports: node.ports(),
        });
    }

    /// Returns the snapshots of all registered nodes.
    pub fn nodes(&self) -> &[NodeInfo] {
        &self.nodes
    }
}

impl fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "EndpointRegistry ({} sources, {} sinks, {} nodes)",
            self.event_sources.len(),
            self.event_sinks.len(),
            self.nodes.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use crate::ports::PortKind;

    #[test]
    fn matching_endpoints_are_connected() {
        let mut registry = EndpointRegistry::new();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let source = EventSource::<u64>::new();
        let sink = EventSink::new({
            let seen = seen.clone();
            move |v: u64| seen.lock().unwrap().push(v)
        });

        registry.add_event_source(source.clone(), "producer.out").unwrap();
        registry.add_event_sink(sink, "consumer.in").unwrap();

        registry.connect_by_name("producer.out", "consumer.in").unwrap();

        source.fire(3);
        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[test]
    fn payload_mismatch_is_reported() {
        let mut registry = EndpointRegistry::new();

        registry
            .add_event_source(EventSource::<u64>::new(), "producer.out")
            .unwrap();
        registry
            .add_event_sink(EventSink::new(|_: String| {}), "consumer.in")
            .unwrap();

        assert!(matches!(
            registry.connect_by_name("producer.out", "consumer.in"),
            Err(ConnectError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn unknown_names_are_reported() {
        let registry = EndpointRegistry::new();

        assert!(matches!(
            registry.connect_by_name("nope", "nope"),
            Err(ConnectError::UnknownEndpoint(_))
        ));
    }

    #[test]
    fn duplicate_names_return_the_port() {
        let mut registry = EndpointRegistry::new();

        registry
            .add_event_source(EventSource::<u64>::new(), "out")
            .unwrap();
        assert!(registry
            .add_event_source(EventSource::<u64>::new(), "out")
            .is_err());
    }

    #[test]
    fn node_snapshots_expose_ports() {
        use crate::nodes::on_changed;

        let mut registry = EndpointRegistry::new();
        let node = on_changed::<i32>().named("level_watch");
        registry.register_node(&node);

        let info = &registry.nodes()[0];
        assert_eq!(info.name, "level_watch");
        assert_eq!(info.ports[0].kind, PortKind::StateSink);
        assert_eq!(info.ports[1].kind, PortKind::EventSource);
    }
}
