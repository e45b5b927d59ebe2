//! This module provides parsing for the cgroup v1 `cpuacct.stat` file.
//!
//! The file has two lines, `user <n>` followed by `system <n>`, both in
//! `USER_HZ` ticks. Parsing is positional: line 0 is user time and line 1 is
//! system time, regardless of the label text.
//!
//! # Examples
//!
//! ```rust
//! use creo_stats::cgroup::stats::{CpuStat, StatFile};
//!
//! let mut cpu_stat = CpuStat::default();
//! cpu_stat.update("user 5\nsystem 7\n");
//! assert_eq!(cpu_stat.user, 5);
//! assert_eq!(cpu_stat.system, 7);
//! ```

use std::time::SystemTime;

use super::{PositionalStat, StatFile};

/// Represents parsed data from a cgroup `cpuacct.stat` file.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct CpuStat {
    /// Accumulated time spent in user mode.
    pub user: u64,
    /// Accumulated time spent in kernel mode.
    pub system: u64,
    /// Time of the last successful parse.
    pub timestamp: Option<SystemTime>,
}

impl CpuStat {
    /// Sets the `user` field.
    fn set_user(&mut self, user: u64) {
        self.user = user;
    }

    /// Sets the `system` field.
    fn set_system(&mut self, system: u64) {
        self.system = system;
    }
}

type Setter = fn(&mut CpuStat, u64);

static SETTERS: [Setter; 2] = [CpuStat::set_user, CpuStat::set_system];

impl PositionalStat for CpuStat {
    #[inline]
    fn line_setters() -> &'static [fn(&mut Self, u64)] {
        &SETTERS
    }

    fn set_timestamp(&mut self, at: SystemTime) {
        self.timestamp = Some(at);
    }
}

impl StatFile for CpuStat {
    fn update(&mut self, content: &str) {
        self.update_positional(content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complete_cpu_stat() {
        let data = "\
user 4120
system 1337
";
        let mut stat = CpuStat::default();
        stat.update(data);
        assert_eq!(stat.user, 4120);
        assert_eq!(stat.system, 1337);
        assert!(stat.timestamp.is_some());
    }

    #[test]
    fn test_labels_are_ignored() {
        let data = "\
system 10
user 20
";
        let mut stat = CpuStat::default();
        stat.update(data);
        assert_eq!(stat.user, 10);
        assert_eq!(stat.system, 20);
    }

    #[test]
    fn test_single_line_is_noop() {
        let mut stat = CpuStat {
            user: 1,
            system: 2,
            timestamp: None,
        };
        stat.update("user 99");
        assert_eq!(stat.user, 1);
        assert_eq!(stat.system, 2);
        assert!(stat.timestamp.is_none());

        stat.update("");
        assert_eq!(stat.user, 1);
        assert!(stat.timestamp.is_none());
    }

    #[test]
    fn test_short_line_keeps_previous_value() {
        let mut stat = CpuStat {
            user: 1,
            system: 2,
            timestamp: None,
        };
        stat.update("user\nsystem 7\n");
        assert_eq!(stat.user, 1);
        assert_eq!(stat.system, 7);
        assert!(stat.timestamp.is_some());
    }

    #[test]
    fn test_invalid_value_resets_to_zero() {
        let mut stat = CpuStat {
            user: 1,
            system: 2,
            timestamp: None,
        };
        stat.update("user abc\nsystem 7\n");
        assert_eq!(stat.user, 0);
        assert_eq!(stat.system, 7);
    }

    #[test]
    fn test_extra_lines_and_whitespace() {
        let data = "\
   user     5
system\t7
extra 1000
";
        let mut stat = CpuStat::default();
        stat.update(data);
        assert_eq!(stat.user, 5);
        assert_eq!(stat.system, 7);
    }
}
