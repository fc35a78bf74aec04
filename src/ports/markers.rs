//! Marker types for callables admissible as port endpoints.

/// Marker type for callables that take no argument.
#[derive(Debug)]
pub struct Nullary {}

/// Marker type for callables that take a payload argument.
#[derive(Debug)]
pub struct Unary {}

/// Marker type for fallible handlers that take no argument.
#[derive(Debug)]
pub struct NullaryFallible {}

/// Marker type for fallible handlers that take a payload argument.
#[derive(Debug)]
pub struct UnaryFallible {}

/// Marker type for composed connection chains.
#[derive(Debug)]
pub struct Chained {}
