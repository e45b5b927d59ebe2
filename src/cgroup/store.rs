use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use regex::Regex;

use crate::config::MetricFiles;
use crate::container::ContainerID;
use crate::error::{Error, Result};

use super::entry::{ContainerEntry, Refresh};
use super::walker::Walker;

/// The shared mapping from container id to its current readings.
///
/// Discovery passes and snapshot passes both hold the single lock for their whole
/// duration, including the blocking filesystem I/O they perform. Callers never see
/// a partially applied pass.
#[derive(Debug)]
pub struct StatsStore {
    containers: Mutex<BTreeMap<ContainerID, ContainerEntry>>,
    pattern: Regex,
    files: MetricFiles,
}

impl StatsStore {
    /// Creates an empty store.
    ///
    /// # Arguments
    ///
    /// * `pattern` - Container id pattern with one capture group.
    /// * `files` - Base names of the metric files to bind.
    pub fn new(pattern: Regex, files: MetricFiles) -> Self {
        Self {
            containers: Mutex::default(),
            pattern,
            files,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<ContainerID, ContainerEntry>> {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one discovery pass over `root`, registering new containers and binding
    /// their metric files.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Scan`] if `root` cannot be traversed at all. Failures on
    /// individual entries below the root are ignored.
    pub fn apply_discovery(&self, root: &Path) -> Result<()> {
        let mut containers = self.lock();
        let before = containers.len();
        Walker::new(&self.pattern, &self.files)
            .walk(root, &mut containers)
            .map_err(|source| Error::Scan {
                path: root.to_path_buf(),
                source,
            })?;
        log::trace!(
            "discovery of {} done: {} containers ({} new)",
            root.display(),
            containers.len(),
            containers.len() - before
        );
        Ok(())
    }

    /// Re-reads the bound files of every container and returns a copy of all entries.
    ///
    /// A container whose bound file no longer exists is removed: a vanished file
    /// means the container has exited.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] for any other read failure. The pass stops there;
    /// containers refreshed or removed earlier in the same pass stay that way.
    pub fn snapshot(&self) -> Result<BTreeMap<ContainerID, ContainerEntry>> {
        let mut containers = self.lock();

        let mut vanished = Vec::new();
        let mut outcome = Ok(());
        for (container_id, entry) in containers.iter_mut() {
            match entry.refresh() {
                Ok(Refresh::Updated) => {}
                Ok(Refresh::Vanished) => vanished.push(container_id.clone()),
                Err(err) => {
                    outcome = Err(Error::Read(err));
                    break;
                }
            }
        }

        for container_id in &vanished {
            log::debug!(
                target: "container monitor",
                "removing exited container: container_id={container_id}"
            );
            containers.remove(container_id);
        }

        outcome?;
        Ok(containers.clone())
    }

    /// Returns a copy of a single entry, without reading any files.
    pub fn get(&self, container_id: &str) -> Option<ContainerEntry> {
        self.lock().get(container_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
