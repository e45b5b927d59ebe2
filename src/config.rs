//! Configuration for the stats collector.
//!
//! A [`Config`] is built once and handed to [`crate::Collector::new`]; it is never
//! re-read afterwards. [`Config::from_env`] overlays these variables on the defaults:
//!
//! - `CREO_STATS_CGROUP_ROOT` — directory to scan
//! - `CREO_STATS_ID_PATTERN` — container id pattern, one capture group
//! - `CREO_STATS_DISCOVERY_INTERVAL_SECS` — seconds between discovery passes
//! - `CREO_STATS_MEMORY_FILE`, `CREO_STATS_CPU_FILE`,
//!   `CREO_STATS_BLKIO_BYTES_FILE`, `CREO_STATS_BLKIO_IOPS_FILE` — metric file names

use std::path::PathBuf;
use std::time::Duration;

/// Default directory to start the search from.
pub const DEFAULT_CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Default container id pattern, matching Docker's systemd scope units.
/// The parenthesized group is used as the container id.
pub const DEFAULT_ID_PATTERN: &str = r".*docker-([0-9a-z]{64})\.scope.*";

/// Default time between two discovery passes.
pub const DEFAULT_DISCOVERY_INTERVAL: Duration = Duration::from_secs(30);

const ENV_PREFIX: &str = "CREO_STATS_";

/// Base names of the cgroup files read for each metric family.
///
/// Names are compared for exact equality against the last path component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricFiles {
    pub memory: String,
    pub cpu: String,
    /// Feeds [`crate::cgroup::stats::BlkioStat::bytes`].
    pub blkio_bytes: String,
    /// Feeds [`crate::cgroup::stats::BlkioStat::iops`].
    pub blkio_iops: String,
}

impl Default for MetricFiles {
    fn default() -> Self {
        Self {
            memory: "memory.stat".to_owned(),
            cpu: "cpuacct.stat".to_owned(),
            blkio_bytes: "blkio.throttle.io_service_bytes".to_owned(),
            blkio_iops: "blkio.throttle.io_serviced".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub cgroup_root: PathBuf,
    /// Regular expression applied to full paths; its single capture group is the
    /// container id. A capture that is empty or longer than 255 bytes is treated
    /// as no match.
    pub id_pattern: String,
    pub discovery_interval: Duration,
    pub metric_files: MetricFiles,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cgroup_root: PathBuf::from(DEFAULT_CGROUP_ROOT),
            id_pattern: DEFAULT_ID_PATTERN.to_owned(),
            discovery_interval: DEFAULT_DISCOVERY_INTERVAL,
            metric_files: MetricFiles::default(),
        }
    }
}

impl Config {
    /// Load configuration from `CREO_STATS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// `lookup` receives the full variable name, e.g. `CREO_STATS_CGROUP_ROOT`.
    /// Missing or empty values keep their defaults, as does an interval that
    /// is not a whole number of seconds.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(&format!("{ENV_PREFIX}{key}")).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(root) = var("CGROUP_ROOT") {
            config.cgroup_root = PathBuf::from(root);
        }
        if let Some(pattern) = var("ID_PATTERN") {
            config.id_pattern = pattern;
        }
        if let Some(interval) = var("DISCOVERY_INTERVAL_SECS") {
            match interval.trim().parse::<u64>() {
                Ok(secs) => config.discovery_interval = Duration::from_secs(secs),
                Err(err) => log::debug!("ignoring invalid discovery interval `{interval}`: {err}"),
            }
        }

        let files = &mut config.metric_files;
        for (key, slot) in [
            ("MEMORY_FILE", &mut files.memory),
            ("CPU_FILE", &mut files.cpu),
            ("BLKIO_BYTES_FILE", &mut files.blkio_bytes),
            ("BLKIO_IOPS_FILE", &mut files.blkio_iops),
        ] {
            if let Some(name) = var(key) {
                *slot = name;
            }
        }

        config
    }

    pub fn with_cgroup_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cgroup_root = root.into();
        self
    }

    pub fn with_id_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.id_pattern = pattern.into();
        self
    }

    pub fn with_discovery_interval(mut self, interval: Duration) -> Self {
        self.discovery_interval = interval;
        self
    }

    pub fn with_metric_files(mut self, files: MetricFiles) -> Self {
        self.metric_files = files;
        self
    }
}
