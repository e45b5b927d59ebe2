//! Creo Stats: reads CPU, memory and block I/O statistics of running Linux
//! containers from the cgroup v1 filesystem.
//!
//! Containers are discovered by walking a cgroup hierarchy periodically. Containers
//! removed from the system are pruned from the set of discovered containers the
//! next time their stats are read.
//!
//! This library has no network surface and keeps all state in memory. It reports
//! raw cumulative counters; differencing across snapshots is up to the caller.

pub mod cgroup;
pub mod collector;
pub mod config;
pub mod container;
pub mod error;
pub mod fsutil;

pub use cgroup::ContainerEntry;
pub use collector::{Collector, Delivery, ErrorSink, State};
pub use config::Config;
pub use container::ContainerID;
pub use error::{Error, Result};
