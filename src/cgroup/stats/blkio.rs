//! This module provides parsing for the cgroup v1 block I/O accounting files,
//! `blkio.throttle.io_service_bytes` and `blkio.throttle.io_serviced`.
//!
//! Both files share one layout: a row per device and operation,
//!
//! ```text
//! 8:0 Read 4096
//! 8:0 Write 8192
//! 8:0 Sync 12288
//! 8:0 Async 0
//! 8:0 Total 12288
//! 253:0 Read 4096
//! ...
//! Total 24576
//! ```
//!
//! # Grouping
//!
//! Rows are grouped by their device column. Whenever the device differs from the
//! previous row, the current group is closed into one [`BlkioDevice`] and a new
//! group starts, so every device is expected to occupy one contiguous block. The
//! trailing group is flushed at the end of input.
//!
//! Rows that do not have exactly three fields (such as the final `Total` line) are
//! skipped. Unknown operation labels, including the per-device `Total`, are
//! ignored. A device column without a colon leaves `major`/`minor` at zero.
//!
//! # Example
//!
//! ```rust
//! use creo_stats::cgroup::stats::{BlkioServiced, StatFile};
//!
//! let data = "\
//! 8:0 Read 10
//! 8:0 Write 20
//! 8:0 Sync 25
//! 8:0 Async 5
//! 8:16 Read 1
//! 8:16 Write 2
//! 8:16 Sync 3
//! 8:16 Async 0
//! Total 66
//! ";
//! let mut serviced = BlkioServiced::default();
//! serviced.update(data);
//!
//! assert_eq!(serviced.devices.len(), 2);
//! assert_eq!(serviced.devices[1].minor, 16);
//! assert_eq!(serviced.devices[1].write, 2);
//! ```

use std::time::SystemTime;

use super::StatFile;

/// Block device I/O statistics of one container.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct BlkioStat {
    /// Transferred bytes, from `blkio.throttle.io_service_bytes`.
    pub bytes: BlkioServiced,
    /// Completed operations, from `blkio.throttle.io_serviced`.
    pub iops: BlkioServiced,
}

/// Per-device tallies from a single block I/O accounting file.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct BlkioServiced {
    /// One record per device that has accounted activity, in file order.
    pub devices: Vec<BlkioDevice>,
    /// Time of the last parse.
    pub timestamp: Option<SystemTime>,
}

/// Counters of a single block device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct BlkioDevice {
    /// Block device major number.
    pub major: u64,
    /// Block device minor number.
    pub minor: u64,
    /// Units read.
    pub read: u64,
    /// Units written.
    pub write: u64,
    /// Units transferred synchronously.
    pub sync: u64,
    /// Units transferred asynchronously.
    pub r#async: u64,
}

impl BlkioDevice {
    /// Applies one `<major>:<minor> <Operation> <value>` row.
    fn apply_row(&mut self, device: &str, op: &str, value: &str) {
        let mut numbers = device.split(':');
        if let (Some(major), Some(minor)) = (numbers.next(), numbers.next()) {
            self.major = major.parse().unwrap_or_default();
            self.minor = minor.parse().unwrap_or_default();
        }

        let parsed = || value.parse::<u64>().unwrap_or_default();
        match op {
            "Read" => self.read = parsed(),
            "Write" => self.write = parsed(),
            "Sync" => self.sync = parsed(),
            "Async" => self.r#async = parsed(),
            _ => {}
        }
    }
}

/// Splits a row into exactly three whitespace-separated fields.
#[inline]
fn split_row(line: &str) -> Option<(&str, &str, &str)> {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(device), Some(op), Some(value), None) => Some((device, op, value)),
        _ => None,
    }
}

impl StatFile for BlkioServiced {
    /// Replaces the device list with the devices found in `content`.
    fn update(&mut self, content: &str) {
        self.timestamp = Some(SystemTime::now());
        self.devices.clear();

        let mut current: Option<(&str, BlkioDevice)> = None;
        for line in content.lines() {
            let Some((device, op, value)) = split_row(line) else {
                continue;
            };

            let same_device = matches!(&current, Some((last, _)) if *last == device);
            if !same_device {
                if let Some((_, finished)) = current.take() {
                    self.devices.push(finished);
                }
                current = Some((device, BlkioDevice::default()));
            }

            if let Some((_, group)) = current.as_mut() {
                group.apply_row(device, op, value);
            }
        }

        if let Some((_, finished)) = current {
            self.devices.push(finished);
        }
    }
}
