//! Provides the parsing traits shared by all cgroup v1 stat types.
//!
//! Every stat type is updated in place from the full text of one pseudo-file.
//! Parsing never fails: rows that cannot be understood are skipped, and the
//! affected counters keep whatever value they held before (or zero).
//!
//! # Traits
//!
//! - [`StatFile`]: the common entry point, implemented by every stat type.
//! - [`PositionalStat`]: for fixed-layout files such as `cpuacct.stat` and `memory.stat`,
//!   where the *line index*, not the label, selects the field being set.
//!
//! # Example: Implementing `PositionalStat`
//!
//! ```rust
//! use std::time::SystemTime;
//! use creo_stats::cgroup::stats::{PositionalStat, StatFile};
//!
//! #[derive(Default)]
//! struct MyStat {
//!     foo: u64,
//!     bar: u64,
//!     timestamp: Option<SystemTime>,
//! }
//!
//! static SETTERS: [fn(&mut MyStat, u64); 2] = [
//!     |s: &mut MyStat, v: u64| s.foo = v,
//!     |s: &mut MyStat, v: u64| s.bar = v,
//! ];
//!
//! impl PositionalStat for MyStat {
//!     fn line_setters() -> &'static [fn(&mut Self, u64)] {
//!         &SETTERS
//!     }
//!
//!     fn set_timestamp(&mut self, at: SystemTime) {
//!         self.timestamp = Some(at);
//!     }
//! }
//!
//! impl StatFile for MyStat {
//!     fn update(&mut self, content: &str) {
//!         self.update_positional(content);
//!     }
//! }
//!
//! let mut stat = MyStat::default();
//! stat.update("whatever 1\nlabel 2\n");
//! assert_eq!((stat.foo, stat.bar), (1, 2));
//! ```

use std::time::SystemTime;

/// A stat type that can be refreshed from the content of its cgroup file.
pub trait StatFile {
    /// Parses `content` and updates `self` in place.
    ///
    /// Never fails. Malformed input leaves counters untouched or zeroed.
    fn update(&mut self, content: &str);
}

/// A trait for fixed two-column files whose fields are identified by line position.
///
/// Line `i` sets the field returned by `line_setters()[i]` from its second
/// whitespace-separated token. Labels in the first column are not checked.
pub trait PositionalStat: 'static {
    /// Setters indexed by line number. Lines past the end are ignored.
    fn line_setters() -> &'static [fn(&mut Self, u64)];

    /// Records the wall-clock time of a successful parse.
    fn set_timestamp(&mut self, at: SystemTime);

    /// Applies `content` positionally.
    ///
    /// Content with fewer than two lines (i.e. no line break at all) is a no-op and
    /// does not touch the timestamp. A line with fewer than two fields keeps the
    /// previous value; a value that is not a valid `u64` resets the field to zero.
    fn update_positional(&mut self, content: &str) {
        let lines: Vec<&str> = content.split('\n').collect();
        if lines.len() < 2 {
            return;
        }

        let setters = Self::line_setters();
        for (setter, line) in setters.iter().zip(lines) {
            let mut fields = line.split_whitespace();
            let (Some(_label), Some(value)) = (fields.next(), fields.next()) else {
                continue;
            };
            setter(&mut *self, value.parse::<u64>().unwrap_or_default());
        }

        self.set_timestamp(SystemTime::now());
    }
}
