//! Pull-queried state ports.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::connect::ConnectError;
use crate::ports::OpFn;

/// A type-erased, shareable state provider.
pub(crate) type Puller<T> = Arc<dyn Fn() -> Result<T, QueryError> + Send + Sync>;

/// Error raised when querying a state port fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// The queried state sink has no upstream source bound to it.
    UnboundSink,
    /// A keyed lookup did not match any registered input.
    UnknownKey(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnboundSink => write!(fmt, "the state sink has no bound upstream source"),
            Self::UnknownKey(key) => write!(fmt, "no input is registered for key {}", key),
        }
    }
}

impl std::error::Error for QueryError {}

/// A state source port.
///
/// A `StateSource` wraps a nullary callable producing the current value of
/// a continuous state. The value is computed on demand when a downstream
/// [`StateSink`] is queried; there is no change notification.
///
/// Clones share the same provider.
pub struct StateSource<T> {
    puller: Puller<T>,
}

impl<T: 'static> StateSource<T> {
    /// Creates a state source from a provider callable.
    pub fn new<F, S>(provider: F) -> Self
    where
        F: OpFn<(), T, S>,
    {
        Self {
            puller: Arc::new(move || Ok(provider.call(()))),
        }
    }

    /// Creates a state source that always produces the same value.
    pub fn constant(value: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        Self {
            puller: Arc::new(move || Ok(value.clone())),
        }
    }

    /// Creates a state source whose provider may fail at query time.
    pub(crate) fn fallible<F>(provider: F) -> Self
    where
        F: Fn() -> Result<T, QueryError> + Send + Sync + 'static,
    {
        Self {
            puller: Arc::new(provider),
        }
    }

    /// Returns a state source producing this source's value mapped through
    /// `f`.
    ///
    /// This is how transformation steps are spliced into a state
    /// connection.
    pub fn map<U, F>(&self, f: F) -> StateSource<U>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let puller = self.puller.clone();

        StateSource {
            puller: Arc::new(move || puller().map(&f)),
        }
    }

    /// Queries the current value.
    pub fn get(&self) -> Result<T, QueryError> {
        (self.puller)()
    }

    pub(crate) fn puller(&self) -> Puller<T> {
        self.puller.clone()
    }
}

impl<T> Clone for StateSource<T> {
    fn clone(&self) -> Self {
        Self {
            puller: self.puller.clone(),
        }
    }
}

impl<T> fmt::Debug for StateSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StateSource").finish_non_exhaustive()
    }
}

/// A state sink port.
///
/// A `StateSink` pulls the current value from the single upstream source
/// bound to it. Querying an unbound sink fails with
/// [`QueryError::UnboundSink`]; binding a second source fails with
/// [`ConnectError::StateSinkAlreadyBound`].
///
/// Clones share the same binding slot, so a sink owned by a node can be
/// handed out and bound later.
pub struct StateSink<T> {
    slot: Arc<OnceLock<Puller<T>>>,
}

impl<T: 'static> StateSink<T> {
    /// Creates a new, unbound `StateSink` port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries the upstream source.
    pub fn get(&self) -> Result<T, QueryError> {
        match self.slot.get() {
            Some(puller) => puller(),
            None => Err(QueryError::UnboundSink),
        }
    }

    /// Binds a provider callable as the upstream source.
    pub fn bind<F, S>(&self, provider: F) -> Result<(), ConnectError>
    where
        F: OpFn<(), T, S>,
    {
        self.bind_puller(Arc::new(move || Ok(provider.call(()))))
    }

    /// Binds a state source as the upstream source.
    pub fn connect_source(&self, source: &StateSource<T>) -> Result<(), ConnectError> {
        self.bind_puller(source.puller())
    }

    /// Returns `true` if an upstream source is bound.
    pub fn is_bound(&self) -> bool {
        self.slot.get().is_some()
    }

    pub(crate) fn bind_puller(&self, puller: Puller<T>) -> Result<(), ConnectError> {
        self.slot
            .set(puller)
            .map_err(|_| ConnectError::StateSinkAlreadyBound)
    }
}

impl<T: 'static> Default for StateSink<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(OnceLock::new()),
        }
    }
}

impl<T> Clone for StateSink<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> fmt::Debug for StateSink<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "StateSink ({})",
            if self.slot.get().is_some() {
                "bound"
            } else {
                "unbound"
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_sink_reports_an_error() {
        let sink: StateSink<u64> = StateSink::new();

        assert_eq!(sink.get(), Err(QueryError::UnboundSink));
    }

    #[test]
    fn bound_sink_pulls_the_source() {
        let sink = StateSink::new();
        sink.bind(|| 42u64).unwrap();

        assert_eq!(sink.get(), Ok(42));
    }

    #[test]
    fn second_binding_is_refused() {
        let sink = StateSink::new();
        sink.bind(|| 1u64).unwrap();

        assert!(matches!(
            sink.bind(|| 2u64),
            Err(ConnectError::StateSinkAlreadyBound)
        ));

        // The original binding is untouched.
        assert_eq!(sink.get(), Ok(1));
    }

    #[test]
    fn map_transforms_the_pulled_value() {
        let source = StateSource::constant(10u64);
        let sink = StateSink::new();
        sink.connect_source(&source.map(|v| v * 2)).unwrap();

        assert_eq!(sink.get(), Ok(20));
    }

    #[test]
    fn clones_share_the_binding_slot() {
        let sink: StateSink<u64> = StateSink::new();
        let alias = sink.clone();
        alias.bind(|| 7u64).unwrap();

        assert_eq!(sink.get(), Ok(7));
    }
}
