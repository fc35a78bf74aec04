//! Parameterized transformation node.

use std::fmt;
use std::marker::PhantomData;

use crate::nodes::Node;
use crate::ports::{PortInfo, PortKind, QueryError, StateSink};

/// A node applying a binary operator to its input and a pulled parameter.
///
/// The first operand is the value passed to [`call`](TransformNode::call),
/// the second is pulled from the `param` state sink. Each evaluation pulls
/// the parameter exactly once and invokes the operator exactly once.
pub struct TransformNode<Op, T, P, R>
where
    Op: Fn(T, P) -> R,
{
    op: Op,
    param: StateSink<P>,
    name: String,
    _phantom: PhantomData<fn(T) -> R>,
}

impl<Op, T, P, R> TransformNode<Op, T, P, R>
where
    Op: Fn(T, P) -> R,
    P: 'static,
{
    /// Creates a transform node with the specified operator.
    pub fn new(op: Op) -> Self {
        Self {
            op,
            param: StateSink::new(),
            name: String::from("transform"),
            _phantom: PhantomData,
        }
    }

    /// Renames the node.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the parameter port of the node.
    pub fn param(&self) -> &StateSink<P> {
        &self.param
    }

    /// Applies the operator to the input and the current parameter.
    pub fn call(&self, input: T) -> Result<R, QueryError> {
        let param = self.param.get()?;

        Ok((self.op)(input, param))
    }
}

/// Creates a transform node with `op` as operation.
pub fn transform<Op, T, P, R>(op: Op) -> TransformNode<Op, T, P, R>
where
    Op: Fn(T, P) -> R,
    P: 'static,
{
    TransformNode::new(op)
}

impl<Op, T, P, R> Node for TransformNode<Op, T, P, R>
where
    Op: Fn(T, P) -> R,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> Vec<PortInfo> {
        vec![PortInfo::new("param", PortKind::StateSink)]
    }
}

impl<Op, T, P, R> fmt::Debug for TransformNode<Op, T, P, R>
where
    Op: Fn(T, P) -> R,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TransformNode")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
