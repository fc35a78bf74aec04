//! Traits for the callables that ports and connections accept.

use crate::ports::HandlerError;

use super::markers;

/// A function or closure that can be spliced into a connection.
///
/// This trait is implemented for any function or closure with one of the
/// following signatures, where it is implicitly assumed that the function
/// implements `Send + Sync + 'static`:
///
/// ```ignore
/// Fn() -> O
/// Fn(I) -> O
/// ```
///
/// The nullary form is admissible wherever the payload type is `()`, so
/// sources without parameters, sinks without results and everything in
/// between compose through the same trait.
pub trait OpFn<I, O, S>: Send + Sync + 'static {
    /// Calls the operation.
    fn call(&self, arg: I) -> O;
}

impl<F, O> OpFn<(), O, markers::Nullary> for F
where
    F: Fn() -> O + Send + Sync + 'static,
{
    fn call(&self, _arg: ()) -> O {
        self()
    }
}

impl<F, I, O> OpFn<I, O, markers::Unary> for F
where
    F: Fn(I) -> O + Send + Sync + 'static,
{
    fn call(&self, arg: I) -> O {
        self(arg)
    }
}

/// A function or closure that can be installed as an event handler.
///
/// This trait is implemented for any function or closure with one of the
/// following signatures, where it is implicitly assumed that the function
/// implements `Send + Sync + 'static`:
///
/// ```ignore
/// Fn(T)
/// Fn(T) -> Result<(), HandlerError>
/// ```
///
/// It is also implemented for the nullary forms when `T = ()`:
///
/// ```ignore
/// Fn()
/// Fn() -> Result<(), HandlerError>
/// ```
///
/// Infallible handlers are wrapped so that delivery always reports a
/// [`Result`]; a failure reported by one handler never prevents delivery to
/// the handlers registered after it.
pub trait HandlerFn<T, S>: Send + Sync + 'static {
    /// Delivers one event to the handler.
    fn deliver(&self, arg: T) -> Result<(), HandlerError>;
}

impl<F> HandlerFn<(), markers::Nullary> for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn deliver(&self, _arg: ()) -> Result<(), HandlerError> {
        self();

        Ok(())
    }
}

impl<F> HandlerFn<(), markers::NullaryFallible> for F
where
    F: Fn() -> Result<(), HandlerError> + Send + Sync + 'static,
{
    fn deliver(&self, _arg: ()) -> Result<(), HandlerError> {
        self()
    }
}

impl<T, F> HandlerFn<T, markers::Unary> for F
where
    F: Fn(T) + Send + Sync + 'static,
{
    fn deliver(&self, arg: T) -> Result<(), HandlerError> {
        self(arg);

        Ok(())
    }
}

impl<T, F> HandlerFn<T, markers::UnaryFallible> for F
where
    F: Fn(T) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    fn deliver(&self, arg: T) -> Result<(), HandlerError> {
        self(arg)
    }
}
