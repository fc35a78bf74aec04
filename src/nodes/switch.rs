//! Keyed n-ary switches forwarding one of several inputs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::nodes::Node;
use crate::ports::{
    EventSink, EventSource, HandlerError, PortInfo, PortKind, QueryError, StateSink, StateSource,
};

/// A switch forwarding the state of one of its inputs.
///
/// Input ports are created lazily, one per key; the `control` port selects
/// which of them is forwarded. Querying the output with a key for which no
/// input was created fails with [`QueryError::UnknownKey`].
pub struct StateSwitch<T, K> {
    control: StateSink<K>,
    inputs: Arc<Mutex<BTreeMap<K, StateSink<T>>>>,
    out: StateSource<T>,
    name: String,
}

impl<T, K> StateSwitch<T, K>
where
    T: 'static,
    K: Ord + Clone + fmt::Debug + Send + 'static,
{
    /// Creates a switch without any input.
    pub fn new() -> Self {
        let control: StateSink<K> = StateSink::new();
        let inputs: Arc<Mutex<BTreeMap<K, StateSink<T>>>> = Arc::new(Mutex::new(BTreeMap::new()));

        let out = StateSource::fallible({
            let control = control.clone();
            let inputs = inputs.clone();
            move || {
                let key = control.get()?;
                let inputs = inputs.lock().unwrap();
                let input = inputs
                    .get(&key)
                    .ok_or_else(|| QueryError::UnknownKey(format!("{:?}", key)))?;

                input.get()
            }
        });

        Self {
            control,
            inputs,
            out,
            name: String::from("state_switch"),
        }
    }

    /// Renames the node.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the input port identified by `key`, creating it if none
    /// exists yet.
    pub fn in_port(&self, key: K) -> StateSink<T> {
        self.inputs
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .clone()
    }

    /// Returns the port controlling the switch; expects a state of type
    /// `K`.
    pub fn control(&self) -> &StateSink<K> {
        &self.control
    }

    /// Returns the output port of the switch.
    pub fn out(&self) -> &StateSource<T> {
        &self.out
    }
}

impl<T, K> Default for StateSwitch<T, K>
where
    T: 'static,
    K: Ord + Clone + fmt::Debug + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K> Node for StateSwitch<T, K>
where
    K: fmt::Debug,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> Vec<PortInfo> {
        let mut ports = vec![
            PortInfo::new("control", PortKind::StateSink),
            PortInfo::new("out", PortKind::StateSource),
        ];
        for key in self.inputs.lock().unwrap().keys() {
            ports.push(PortInfo::new(format!("in[{:?}]", key), PortKind::StateSink));
        }

        ports
    }
}

impl<T, K> fmt::Debug for StateSwitch<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StateSwitch")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A switch forwarding events from exactly one of its inputs.
///
/// Input ports are created lazily, one per key. An event received on the
/// input whose key equals the current value of the `control` port is fired
/// on `out`; events received on any other input are dropped silently.
pub struct EventSwitch<T, K>
where
    T: Clone + Send + 'static,
{
    control: StateSink<K>,
    inputs: Arc<Mutex<BTreeMap<K, EventSink<T>>>>,
    out: EventSource<T>,
    name: String,
}

impl<T, K> EventSwitch<T, K>
where
    T: Clone + Send + 'static,
    K: Ord + Clone + Eq + fmt::Debug + Send + Sync + 'static,
{
    /// Creates a switch without any input.
    pub fn new() -> Self {
        Self {
            control: StateSink::new(),
            inputs: Arc::new(Mutex::new(BTreeMap::new())),
            out: EventSource::new(),
            name: String::from("event_switch"),
        }
    }

    /// Renames the node.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the input port identified by `key`, creating it if none
    /// exists yet.
    pub fn in_port(&self, key: K) -> EventSink<T> {
        self.inputs
            .lock()
            .unwrap()
            .entry(key.clone())
            .or_insert_with(|| {
                let control = self.control.clone();
                let out = self.out.clone();
                // Fires the incoming event if and only if it arrived on the
                // currently selected input.
                EventSink::new(move |event: T| -> Result<(), HandlerError> {
                    if control.get()? == key {
                        out.fire(event);
                    }

                    Ok(())
                })
            })
            .clone()
    }

    /// Returns the port controlling the switch; expects a state of type
    /// `K`.
    pub fn control(&self) -> &StateSink<K> {
        &self.control
    }

    /// Returns the output port of the switch.
    pub fn out(&self) -> &EventSource<T> {
        &self.out
    }
}

impl<T, K> Default for EventSwitch<T, K>
where
    T: Clone + Send + 'static,
    K: Ord + Clone + Eq + fmt::Debug + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K> Node for EventSwitch<T, K>
where
    T: Clone + Send + 'static,
    K: fmt::Debug,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> Vec<PortInfo> {
        let mut ports = vec![
            PortInfo::new("control", PortKind::StateSink),
            PortInfo::new("out", PortKind::EventSource),
        ];
        for key in self.inputs.lock().unwrap().keys() {
            ports.push(PortInfo::new(format!("in[{:?}]", key), PortKind::EventSink));
        }

        ports
    }
}

impl<T, K> fmt::Debug for EventSwitch<T, K>
where
    T: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventSwitch")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
