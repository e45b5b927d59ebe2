use std::path::{Path, PathBuf};

use crate::config::MetricFiles;
use crate::fsutil::{self, FileReadError};

use super::stats::{BlkioStat, CpuStat, MemoryStat, StatFile};

/// The metric families read for every container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Memory,
    Cpu,
    BlkioBytes,
    BlkioIops,
}

impl MetricKind {
    /// All kinds, in the order they are read during a snapshot.
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Memory,
        MetricKind::Cpu,
        MetricKind::BlkioBytes,
        MetricKind::BlkioIops,
    ];

    /// Maps a file's base name to the metric it holds, if any.
    pub fn from_file_name(name: &str, files: &MetricFiles) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.file_name(files) == name)
    }

    /// Returns the configured base name for this kind.
    pub fn file_name(self, files: &MetricFiles) -> &str {
        match self {
            MetricKind::Memory => &files.memory,
            MetricKind::Cpu => &files.cpu,
            MetricKind::BlkioBytes => &files.blkio_bytes,
            MetricKind::BlkioIops => &files.blkio_iops,
        }
    }
}

/// Absolute paths of the files backing each metric of one container.
///
/// A binding stays `None` until discovery finds the corresponding file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricBindings {
    memory: Option<PathBuf>,
    cpu: Option<PathBuf>,
    blkio_bytes: Option<PathBuf>,
    blkio_iops: Option<PathBuf>,
}

impl MetricBindings {
    pub fn get(&self, kind: MetricKind) -> Option<&Path> {
        self.slot(kind).as_deref()
    }

    /// Returns `true` once a file is bound for every metric.
    pub fn is_complete(&self) -> bool {
        MetricKind::ALL.into_iter().all(|kind| self.get(kind).is_some())
    }

    fn set(&mut self, kind: MetricKind, path: PathBuf) {
        *self.slot_mut(kind) = Some(path);
    }

    fn slot(&self, kind: MetricKind) -> &Option<PathBuf> {
        match kind {
            MetricKind::Memory => &self.memory,
            MetricKind::Cpu => &self.cpu,
            MetricKind::BlkioBytes => &self.blkio_bytes,
            MetricKind::BlkioIops => &self.blkio_iops,
        }
    }

    fn slot_mut(&mut self, kind: MetricKind) -> &mut Option<PathBuf> {
        match kind {
            MetricKind::Memory => &mut self.memory,
            MetricKind::Cpu => &mut self.cpu,
            MetricKind::BlkioBytes => &mut self.blkio_bytes,
            MetricKind::BlkioIops => &mut self.blkio_iops,
        }
    }
}

/// Outcome of re-reading a container's files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Refresh {
    Updated,
    /// A bound file no longer exists; the container has exited.
    Vanished,
}

/// Current readings of one container, along with the files they come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ContainerEntry {
    pub memory: MemoryStat,
    pub cpu: CpuStat,
    pub blkio: BlkioStat,
    #[serde(skip)]
    bindings: MetricBindings,
}

impl ContainerEntry {
    pub fn bindings(&self) -> &MetricBindings {
        &self.bindings
    }

    pub(crate) fn bind(&mut self, kind: MetricKind, path: PathBuf) {
        self.bindings.set(kind, path);
    }

    fn stat_mut(&mut self, kind: MetricKind) -> &mut dyn StatFile {
        match kind {
            MetricKind::Memory => &mut self.memory,
            MetricKind::Cpu => &mut self.cpu,
            MetricKind::BlkioBytes => &mut self.blkio.bytes,
            MetricKind::BlkioIops => &mut self.blkio.iops,
        }
    }

    /// Reads every bound file and updates the matching counters in place.
    ///
    /// Stops at the first file that no longer exists and reports
    /// [`Refresh::Vanished`]; counters updated before that point keep their
    /// new values.
    ///
    /// # Errors
    ///
    /// Returns a [`FileReadError`] for any read failure other than not-found.
    pub(crate) fn refresh(&mut self) -> Result<Refresh, FileReadError> {
        for kind in MetricKind::ALL {
            let Some(path) = self.bindings.get(kind) else {
                continue;
            };
            match fsutil::read_stat_file(path) {
                Ok(content) => self.stat_mut(kind).update(&content),
                Err(err) if err.is_not_found() => {
                    log::trace!("{kind:?} file vanished: {}", err.path.display());
                    return Ok(Refresh::Vanished);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(Refresh::Updated)
    }
}
