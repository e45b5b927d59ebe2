//! Container discovery and resource accounting using the cgroup v1 filesystem.
//!
//! This module finds containers by walking a cgroup hierarchy and keeps their
//! current CPU, memory and block I/O readings.
//!
//! # Key Components
//!
//! - [`StatsStore`] — Maps container ids to their readings behind a single lock;
//!   runs discovery passes and snapshot passes.
//! - [`ContainerEntry`] — Current readings of one container plus its file bindings.
//! - [`stats`] — Parsers for the accounting files.
//!
//! # Supported Stats
//!
//! The following files are read, if found (names are configurable, see
//! [`crate::config::MetricFiles`]):
//!
//! - `memory.stat`
//! - `cpuacct.stat`
//! - `blkio.throttle.io_service_bytes` and `blkio.throttle.io_serviced`
//!
//! # Lifecycle
//!
//! A container is registered when discovery sees a directory whose path matches
//! the id pattern. It is dropped when one of its bound files has disappeared at
//! snapshot time.
mod entry;
pub mod stats;
mod store;
mod walker;

pub use entry::{ContainerEntry, MetricBindings, MetricKind};
pub use store::StatsStore;
