//! The connection algebra.
//!
//! [`connect`] is the single composition primitive: it splices two
//! admissible callables into a [`Chain`], which is itself admissible, so
//! arbitrarily long pipelines can be built by repeated composition. The
//! payload type of the upstream end must equal the parameter type of the
//! downstream end; `()` payloads are ordinary payloads, so sources without
//! parameters and sinks without results compose through the same rules.
//!
//! The right-shift operator provides pipeline syntax. Bare closures are
//! wrapped with [`lift`] first:
//!
//! ```
//! use tickflow::connect::lift;
//!
//! let make_four = lift(|| 1) >> lift(|i: i32| i + 1) >> lift(|i: i32| i + 2);
//! assert_eq!(make_four.run(), 4);
//! ```
//!
//! Ports participate in the same syntax: an [`EventSource`] shifted into a
//! `Chain` yields an [`EventChain`] that installs the composed handler when
//! it is finally shifted into an [`EventSink`], and a [`StateSource`]
//! shifted into a [`StateSink`] binds the sink.

use std::fmt;
use std::ops::Shr;
use std::sync::Arc;

use crate::ports::{markers, EventSink, EventSource, HandlerFn, LineId, OpFn, StateSink, StateSource};

/// Error raised when assembling the graph fails.
///
/// Setup errors are surfaced where the misuse occurs and leave the already
/// assembled part of the graph untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectError {
    /// The payload types of the two endpoints disagree.
    ///
    /// Only the runtime-typed connection path of the
    /// [`registry`](crate::registry) can raise this; directly connected
    /// ports are checked at compile time.
    TypeMismatch {
        /// Payload type of the source endpoint.
        expected: &'static str,
        /// Payload type of the sink endpoint.
        found: &'static str,
    },
    /// A second source was bound to a state sink.
    StateSinkAlreadyBound,
    /// A region-aware endpoint outlived its region.
    RegionDropped,
    /// No endpoint is registered under the specified name.
    UnknownEndpoint(String),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, found } => write!(
                fmt,
                "payload type mismatch: source carries `{}`, sink expects `{}`",
                expected, found
            ),
            Self::StateSinkAlreadyBound => {
                write!(fmt, "the state sink already has a bound upstream source")
            }
            Self::RegionDropped => {
                write!(fmt, "the region of a region-aware endpoint was dropped")
            }
            Self::UnknownEndpoint(name) => {
                write!(fmt, "no endpoint is registered under the name `{}`", name)
            }
        }
    }
}

impl std::error::Error for ConnectError {}

/// A composed connection between two callables.
///
/// A `Chain` behaves as a callable from its open upstream parameter to its
/// open downstream result, so it can be composed further on either side.
/// Clones share the same composition.
pub struct Chain<I, O> {
    f: Arc<dyn Fn(I) -> O + Send + Sync>,
}

impl<I: 'static, O: 'static> Chain<I, O> {
    /// Calls the composed pipeline with the specified argument.
    pub fn call(&self, arg: I) -> O {
        (self.f)(arg)
    }
}

impl<O: 'static> Chain<(), O> {
    /// Calls a pipeline whose upstream end takes no parameter.
    pub fn run(&self) -> O {
        (self.f)(())
    }
}

impl<I, O> Clone for Chain<I, O> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<I, O> fmt::Debug for Chain<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Chain").finish_non_exhaustive()
    }
}

impl<I: 'static, O: 'static> OpFn<I, O, markers::Chained> for Chain<I, O> {
    fn call(&self, arg: I) -> O {
        (self.f)(arg)
    }
}

/// Composes two callables into a [`Chain`].
///
/// The upstream result type must equal the downstream parameter type. All
/// four combinations of void and non-void parameter and result compose;
/// the composition is associative.
pub fn connect<A, B, I, P, O, SA, SB>(source: A, sink: B) -> Chain<I, O>
where
    A: OpFn<I, P, SA>,
    B: OpFn<P, O, SB>,
    I: 'static,
    P: 'static,
    O: 'static,
{
    Chain {
        f: Arc::new(move |arg| sink.call(source.call(arg))),
    }
}

/// Wraps a single callable into a [`Chain`] so that the pipeline operator
/// can be applied to it.
pub fn lift<F, I, O, S>(f: F) -> Chain<I, O>
where
    F: OpFn<I, O, S>,
    I: 'static,
    O: 'static,
{
    Chain {
        f: Arc::new(move |arg| f.call(arg)),
    }
}

impl<I: 'static, P: 'static, O: 'static> Shr<Chain<P, O>> for Chain<I, P> {
    type Output = Chain<I, O>;

    fn shr(self, rhs: Chain<P, O>) -> Chain<I, O> {
        connect(self, rhs)
    }
}

impl<'a, U: 'static> Shr<&'a StateSink<U>> for Chain<(), U> {
    type Output = Result<(), ConnectError>;

    fn shr(self, rhs: &'a StateSink<U>) -> Self::Output {
        rhs.bind(self)
    }
}

impl<'a, 'b, T: 'static> Shr<&'b StateSink<T>> for &'a StateSource<T> {
    type Output = Result<(), ConnectError>;

    fn shr(self, rhs: &'b StateSink<T>) -> Self::Output {
        rhs.connect_source(self)
    }
}

/// An event connection whose sink end is still open.
///
/// An `EventChain` is obtained by shifting a [`Chain`] into an
/// [`EventSource`]. It records the source and the pending transform; the
/// composed handler is only installed once the chain is shifted into an
/// [`EventSink`] or terminated with [`connect`](EventChain::connect).
pub struct EventChain<T: Clone + Send + 'static, U> {
    source: EventSource<T>,
    chain: Chain<T, U>,
}

impl<T: Clone + Send + 'static, U: 'static> EventChain<T, U> {
    /// Terminates the chain with a handler callable and installs the
    /// composed handler on the source.
    pub fn connect<F, S>(self, handler: F) -> LineId
    where
        F: HandlerFn<U, S>,
    {
        let chain = self.chain;
        self.source
            .connect(move |arg: T| handler.deliver(chain.call(arg)))
    }
}

impl<T: Clone + Send + 'static, U> fmt::Debug for EventChain<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventChain").finish_non_exhaustive()
    }
}

impl<'a, T: Clone + Send + 'static, U: 'static> Shr<Chain<T, U>> for &'a EventSource<T> {
    type Output = EventChain<T, U>;

    fn shr(self, rhs: Chain<T, U>) -> EventChain<T, U> {
        EventChain {
            source: self.clone(),
            chain: rhs,
        }
    }
}

impl<'a, 'b, T: Clone + Send + 'static> Shr<&'b EventSink<T>> for &'a EventSource<T> {
    type Output = LineId;

    fn shr(self, rhs: &'b EventSink<T>) -> LineId {
        self.connect_sink(rhs)
    }
}

impl<T: Clone + Send + 'static, U: 'static, V: 'static> Shr<Chain<U, V>> for EventChain<T, U> {
    type Output = EventChain<T, V>;

    fn shr(self, rhs: Chain<U, V>) -> EventChain<T, V> {
        EventChain {
            source: self.source,
            chain: connect(self.chain, rhs),
        }
    }
}

impl<'a, T: Clone + Send + 'static, U: Clone + Send + 'static> Shr<&'a EventSink<U>>
    for EventChain<T, U>
{
    type Output = LineId;

    fn shr(self, rhs: &'a EventSink<U>) -> LineId {
        let chain = self.chain;
        let handler = rhs.handler();
        self.source.connect(move |arg: T| handler(chain.call(arg)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    #[test]
    fn chained_callables() {
        let increment = |i: i32| i + 1;
        let give_one = || 1;

        // This connection has no parameter and returns an i32.
        let one_plus_one = connect(give_one, increment);
        assert_eq!(one_plus_one.run(), 2);

        // Take the connection from above and add a new callable as a sink.
        let two_plus_one = connect(one_plus_one, increment);
        assert_eq!(two_plus_one.run(), 3);

        // Connections can have both a parameter and a return value.
        let plus_two = connect(increment, increment);
        assert_eq!(plus_two.call(1), 3);
    }

    #[test]
    fn pipeline_operator() {
        let make_four = lift(|| 1) >> lift(|i: i32| i + 1) >> lift(|i: i32| i + 2);
        assert_eq!(make_four.run(), 4);
    }

    // Composition over every pair of void and non-void parameter and
    // result types.
    #[test]
    fn parameter_result_pairs() {
        let captured = Arc::new(Mutex::new(0));

        let write_param = {
            let c = captured.clone();
            move |i: i32| *c.lock().unwrap() = i
        };
        let increment = |i: i32| i + 1;
        let give_one = || 1;
        let give_three = || 3;
        let do_nothing = || {};
        let ignore_in = |_: i32| {};
        let increment_captured = {
            let c = captured.clone();
            move || *c.lock().unwrap() += 1
        };

        // param i32, payload i32, result i32
        assert_eq!(connect(increment, increment).call(1), 3);

        // param i32, payload i32, result void
        connect(increment, write_param.clone()).call(0);
        assert_eq!(*captured.lock().unwrap(), 1);

        // param i32, payload void, result i32
        assert_eq!(connect(ignore_in, give_one).call(99), 1);

        // param i32, payload void, result void
        connect(ignore_in, increment_captured.clone()).call(99);
        assert_eq!(*captured.lock().unwrap(), 2);

        // param void, payload i32, result i32
        assert_eq!(connect(give_one, increment).run(), 2);

        // param void, payload i32, result void
        connect(give_three, write_param).run();
        assert_eq!(*captured.lock().unwrap(), 3);

        // param void, payload void, result i32
        assert_eq!(connect(do_nothing, give_one).run(), 1);

        // param void, payload void, result void
        connect(do_nothing, increment_captured).run();
        assert_eq!(*captured.lock().unwrap(), 4);
    }

    #[test]
    fn composition_is_associative() {
        let a = |i: i32| i + 1;
        let b = |i: i32| i * 2;
        let c = |i: i32| i - 3;

        let left = connect(connect(a, b), c);
        let right = connect(a, connect(b, c));

        for i in -10..10 {
            assert_eq!(left.call(i), right.call(i));
        }
    }

    #[test]
    fn event_pipeline_installs_composed_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let source = EventSource::new();

        let sink = EventSink::new({
            let seen = seen.clone();
            move |v: i32| seen.lock().unwrap().push(v)
        });

        // Chain a transform between source and sink, in two steps as they
        // would be written at distinct assembly sites.
        let pending = &source >> lift(|i: i32| i + 1);
        pending >> &sink;

        source.fire(1);
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn event_pipeline_terminated_by_a_closure() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let source = EventSource::new();

        let s = seen.clone();
        (&source >> lift(|i: i32| i * 2) >> lift(|i: i32| i + 1))
            .connect(move |v: i32| s.lock().unwrap().push(v));

        source.fire(3);
        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    #[test]
    fn state_pipeline_binds_the_sink() {
        let source = StateSource::constant(5);
        let sink = StateSink::new();

        (&source >> &sink).unwrap();

        assert_eq!(sink.get(), Ok(5));
    }
}
