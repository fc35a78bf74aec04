//! State observation node firing events on a predicate.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::nodes::Node;
use crate::ports::{EventSource, HandlerError, PortInfo, PortKind, StateSink};

/// Shared state of a watch node, captured by its check handler.
struct WatchInner<T, P>
where
    T: Clone + Send + 'static,
{
    pred: P,
    input: StateSink<T>,
    out: EventSource<T>,
}

/// A node observing a state and firing an event when a predicate holds.
///
/// The observation is driven externally: every invocation of the handler
/// returned by [`check_tick`](WatchNode::check_tick) pulls the input state
/// once, evaluates the predicate once and fires the output with the
/// observed value if the predicate returned `true`. The handler is usually
/// connected to a region's work tick.
pub struct WatchNode<T, P>
where
    T: Clone + Send + 'static,
{
    inner: Arc<WatchInner<T, P>>,
    name: String,
}

impl<T, P> WatchNode<T, P>
where
    T: Clone + Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    /// Creates a watch node with the specified predicate.
    pub fn new(pred: P) -> Self {
        Self {
            inner: Arc::new(WatchInner {
                pred,
                input: StateSink::new(),
                out: EventSource::new(),
            }),
            name: String::from("watch"),
        }
    }

    /// Renames the node.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the observed state input port.
    pub fn input(&self) -> &StateSink<T> {
        &self.inner.input
    }

    /// Returns the event output port.
    pub fn out(&self) -> &EventSource<T> {
        &self.inner.out
    }

    /// Returns the handler that performs one observation.
    ///
    /// Connect it to the tick that should drive the checks, e.g.:
    ///
    /// ```ignore
    /// region.ticks().work_tick().connect(watch.check_tick());
    /// ```
    pub fn check_tick(&self) -> impl Fn() -> Result<(), HandlerError> + Send + Sync + 'static {
        let inner = self.inner.clone();

        move || -> Result<(), HandlerError> {
            let value = inner.input.get()?;
            if (inner.pred)(&value) {
                inner.out.fire(value);
            }

            Ok(())
        }
    }
}

/// Creates a watch node with a predicate.
pub fn watch<T, P>(pred: P) -> WatchNode<T, P>
where
    T: Clone + Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    WatchNode::new(pred)
}

/// Creates a watch node that fires when the observed value changes.
///
/// The first observation never fires, as there is no prior value to
/// compare against.
pub fn on_changed<T>() -> WatchNode<T, impl Fn(&T) -> bool + Send + Sync + 'static>
where
    T: Clone + PartialEq + Send + 'static,
{
    let last: Mutex<Option<T>> = Mutex::new(None);

    watch(move |value: &T| {
        let mut last = last.lock().unwrap();
        let changed = match &*last {
            Some(previous) => previous != value,
            None => false,
        };
        *last = Some(value.clone());

        changed
    })
}

impl<T, P> Node for WatchNode<T, P>
where
    T: Clone + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> Vec<PortInfo> {
        vec![
            PortInfo::new("in", PortKind::StateSink),
            PortInfo::new("out", PortKind::EventSource),
        ]
    }
}

impl<T, P> fmt::Debug for WatchNode<T, P>
where
    T: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("WatchNode")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ports::EventSource as Tick;

    #[test]
    fn fires_when_the_predicate_holds() {
        let threshold = watch(|v: &i32| *v > 10);

        let current = Arc::new(Mutex::new(0));
        let c = current.clone();
        threshold.input().bind(move || *c.lock().unwrap()).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        threshold.out().connect(move |v: i32| s.lock().unwrap().push(v));

        let tick: Tick<()> = Tick::new();
        tick.connect(threshold.check_tick());

        tick.fire(());
        *current.lock().unwrap() = 11;
        tick.fire(());
        tick.fire(());
        *current.lock().unwrap() = 3;
        tick.fire(());

        assert_eq!(*seen.lock().unwrap(), vec![11, 11]);
    }

    #[test]
    fn on_changed_skips_the_first_observation() {
        let node = on_changed::<i32>();

        let values = Mutex::new(vec![5, 5, 5, 6, 6, 7].into_iter());
        node.input()
            .bind(move || values.lock().unwrap().next().unwrap())
            .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        node.out().connect(move |v: i32| s.lock().unwrap().push(v));

        let check = node.check_tick();
        for _ in 0..6 {
            check().unwrap();
        }

        assert_eq!(*seen.lock().unwrap(), vec![6, 7]);
    }
}
