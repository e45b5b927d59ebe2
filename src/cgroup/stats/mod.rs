//! This module provides the counter types read from cgroup v1 accounting files
//! and the parsers that fill them.
//!
//! # Main types
//!
//! - [`CpuStat`]: user and system CPU time from `cpuacct.stat`.
//! - [`MemoryStat`]: page cache and RSS from `memory.stat`.
//! - [`BlkioStat`]: per-device block I/O tallies, as bytes and as operations.
//!
//! # Usage
//!
//! All types implement [`StatFile`] and are updated in place from the full text of
//! their file. Parsers do no I/O and never fail.

mod blkio;
mod cpu;
mod memory;
mod parser;

pub use blkio::{BlkioDevice, BlkioServiced, BlkioStat};
pub use cpu::CpuStat;
pub use memory::MemoryStat;
pub use parser::{PositionalStat, StatFile};
