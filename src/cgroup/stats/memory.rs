//! This module provides parsing for the cgroup v1 `memory.stat` file.
//!
//! Only the first two lines are read: line 0 is the page cache (`cache <bytes>`)
//! and line 1 the resident set size (`rss <bytes>`). As with `cpuacct.stat`, the
//! position decides the field, not the label; the remaining statistics in the
//! file are ignored.
//!
//! # Examples
//!
//! ```rust
//! use creo_stats::cgroup::stats::{MemoryStat, StatFile};
//!
//! let mut mem_stat = MemoryStat::default();
//! mem_stat.update("cache 100\nrss 200\nrss_huge 0\n");
//! assert_eq!(mem_stat.cache, 100);
//! assert_eq!(mem_stat.rss, 200);
//! ```

use std::time::SystemTime;

use super::{PositionalStat, StatFile};

/// Represents memory usage from a cgroup `memory.stat` file.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct MemoryStat {
    /// Page cache, in bytes.
    pub cache: u64,
    /// Resident set size, in bytes.
    pub rss: u64,
    /// Time of the last successful parse.
    pub timestamp: Option<SystemTime>,
}

impl MemoryStat {
    /// Sets the `cache` field.
    fn set_cache(&mut self, v: u64) {
        self.cache = v;
    }

    /// Sets the `rss` field.
    fn set_rss(&mut self, v: u64) {
        self.rss = v;
    }
}

type Setter = fn(&mut MemoryStat, u64);

static SETTERS: [Setter; 2] = [MemoryStat::set_cache, MemoryStat::set_rss];

impl PositionalStat for MemoryStat {
    #[inline]
    fn line_setters() -> &'static [fn(&mut Self, u64)] {
        &SETTERS
    }

    fn set_timestamp(&mut self, at: SystemTime) {
        self.timestamp = Some(at);
    }
}

impl StatFile for MemoryStat {
    fn update(&mut self, content: &str) {
        self.update_positional(content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_memory_stat() {
        let mut stat = MemoryStat::default();
        stat.update("");
        assert_eq!(stat, MemoryStat::default());
    }

    #[test]
    fn test_parse_complete_memory_stat() {
        let data = "\
cache 1000
rss 2000
rss_huge 0
shmem 300
mapped_file 400
";
        let mut stat = MemoryStat::default();
        stat.update(data);
        assert_eq!(stat.cache, 1000);
        assert_eq!(stat.rss, 2000);
        assert!(stat.timestamp.is_some());
    }

    #[test]
    fn test_updates_in_place() {
        let mut stat = MemoryStat::default();
        stat.update("cache 1\nrss 2\n");
        let first = stat.timestamp;
        stat.update("cache 3\nrss 4\n");
        assert_eq!(stat.cache, 3);
        assert_eq!(stat.rss, 4);
        assert!(stat.timestamp >= first);
    }

    #[test]
    fn test_unlabelled_positions() {
        let data = "\
a 11
b 22
";
        let mut stat = MemoryStat::default();
        stat.update(data);
        assert_eq!(stat.cache, 11);
        assert_eq!(stat.rss, 22);
    }

    #[test]
    fn test_blank_first_line() {
        let data = "\nrss 22\n";
        let mut stat = MemoryStat {
            cache: 5,
            ..Default::default()
        };
        stat.update(data);
        assert_eq!(stat.cache, 5);
        assert_eq!(stat.rss, 22);
    }
}
