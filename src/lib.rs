//! A reactive dataflow framework for concurrent, cycle-driven computation
//! graphs.
//!
//! Applications built with tickflow are directed graphs of nodes that
//! exchange *events* (push-delivered discrete messages) and *states*
//! (pull-queried continuous values) through typed ports joined by
//! connections. Nodes are partitioned into parallel regions, each driven
//! on its own thread by a periodic tick cycle; connections inside a region
//! are synchronous and allocation-free, while connections crossing a
//! region boundary are transparently decoupled by a double-buffered
//! channel.
//!
//! # A practical overview
//!
//! Assembling an application involves three distinct activities:
//!
//! 1. the design of nodes owning [`ports`](crate::ports),
//! 2. the assembly of a graph by connecting ports, either directly with
//!    the [`connect`](crate::connect) algebra or by name through the
//!    [`registry`](crate::registry),
//! 3. the execution of the graph, managed by a
//!    [`Scheduler`](crate::region::scheduler::Scheduler) that drives each
//!    region's tick cycle on a dedicated thread.
//!
//! ## Ports and connections
//!
//! Events flow from an [`EventSource`](ports::EventSource) to every
//! handler connected to it, synchronously and in registration order:
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use tickflow::ports::{EventSink, EventSource};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let source = EventSource::new();
//! let sink = EventSink::new({
//!     let seen = seen.clone();
//!     move |v: u32| seen.lock().unwrap().push(v)
//! });
//! source.connect_sink(&sink);
//!
//! source.fire(3);
//! assert_eq!(*seen.lock().unwrap(), vec![3]);
//! ```
//!
//! States flow the other way round: a [`StateSink`](ports::StateSink)
//! pulls the current value from the single
//! [`StateSource`](ports::StateSource) bound to it when it is queried.
//! Arbitrary callables can be spliced anywhere into a connection; see the
//! [`connect`](crate::connect) module for the composition rules and the
//! pipeline operator.
//!
//! ## Regions
//!
//! Every [`Region`](region::Region) cycles through two ticks on its own
//! thread: a switch tick that publishes the cross-region channels fed by
//! the region, then a work tick that drives its computation. Ports wrapped
//! in [`RegionAware`](ports::region_aware::RegionAware) carry their region
//! identity, and connecting two of them picks the right linkage
//! automatically: a direct synchronous connection within a region, a
//! [`channel`](crate::channel) swap buffer across regions. Events
//! published by a producer region in cycle *i* are observed by the
//! consumer region in one of its later cycles, with no loss and no
//! duplication.
//!
//! ## Composite nodes and time
//!
//! The [`nodes`](crate::nodes) module offers generic building blocks
//! (transforms, keyed switches and state watches) written purely in terms
//! of the port contracts. The [`time`](crate::time) module provides the
//! clocks pacing region threads, including a tick-advanced
//! [`VirtualClock`](time::VirtualClock) for deterministic tests, and the
//! [`settings`](crate::settings) module binds externally configured values
//! once at startup.

#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

pub mod channel;
pub mod connect;
pub mod nodes;
pub mod ports;
pub mod region;
pub mod registry;
pub mod settings;
pub mod time;
