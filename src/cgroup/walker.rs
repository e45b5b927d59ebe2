use std::collections::{BTreeMap, VecDeque};
use std::fs::FileType;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::MetricFiles;
use crate::container::ContainerID;
use crate::error::ResultOkTraceExt;

use super::entry::{ContainerEntry, MetricKind};

/// Discovers container cgroup directories and their metric files below a root.
///
/// The pattern is applied to the full path of every visited entry; its single
/// capture group is the container id. A matching directory registers the
/// container, a matching regular file whose base name is a known metric file
/// binds that file to an already registered container. Files never register
/// containers on their own.
#[derive(Debug)]
pub(crate) struct Walker<'a> {
    pattern: &'a Regex,
    files: &'a MetricFiles,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(pattern: &'a Regex, files: &'a MetricFiles) -> Self {
        Self { pattern, files }
    }

    /// Walks the tree below `root`, including `root` itself.
    ///
    /// Symbolic links below the root are not followed. Entries that cannot be
    /// read (e.g. a container that exited mid-walk) are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if `root` itself cannot be inspected or listed.
    pub(crate) fn walk(
        &self,
        root: &Path,
        containers: &mut BTreeMap<ContainerID, ContainerEntry>,
    ) -> std::io::Result<()> {
        let root_type = std::fs::metadata(root)?.file_type();
        self.visit(root, root_type, containers);
        if !root_type.is_dir() {
            return Ok(());
        }

        let mut stack = VecDeque::new();
        stack.push_back(read_dir_sorted(root)?);
        while let Some(entries) = stack.pop_back() {
            for (path, file_type) in entries {
                self.visit(&path, file_type, containers);
                if !file_type.is_dir() {
                    continue;
                }
                if let Some(children) = read_dir_sorted(&path).ok_trace() {
                    stack.push_back(children);
                }
            }
        }

        Ok(())
    }

    fn visit(
        &self,
        path: &Path,
        file_type: FileType,
        containers: &mut BTreeMap<ContainerID, ContainerEntry>,
    ) {
        let Some(container_id) = self.extract_container_id(path) else {
            return;
        };

        if file_type.is_dir() {
            if !containers.contains_key(&container_id) {
                log::debug!("discovered container {container_id} at {}", path.display());
                containers.insert(container_id, ContainerEntry::default());
            }
        } else if file_type.is_file() {
            let Some(entry) = containers.get_mut(&container_id) else {
                return;
            };
            let kind = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| MetricKind::from_file_name(name, self.files));
            if let Some(kind) = kind {
                log::trace!("binding {kind:?} of {container_id} to {}", path.display());
                entry.bind(kind, path.to_path_buf());
            }
        }
    }

    /// Applies the pattern to the full path and validates the captured id.
    ///
    /// Paths that are not valid UTF-8 never match.
    #[inline]
    fn extract_container_id(&self, path: &Path) -> Option<ContainerID> {
        let path = path.to_str()?;
        let captured = self.pattern.captures(path)?.get(1)?;
        ContainerID::new(captured.as_str()).ok_trace()
    }
}

/// Lists a directory without following symlinks, sorted by path.
fn read_dir_sorted(dir: &Path) -> std::io::Result<Vec<(PathBuf, FileType)>> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| {
            let entry = entry.ok_trace()?;
            let file_type = entry.file_type().ok_trace()?;
            Some((entry.path(), file_type))
        })
        .collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::config::DEFAULT_ID_PATTERN;

    const ID: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn walk(root: &Path, pattern: &str) -> BTreeMap<ContainerID, ContainerEntry> {
        let pattern = Regex::new(pattern).unwrap();
        let files = MetricFiles::default();
        let mut containers = BTreeMap::new();
        Walker::new(&pattern, &files)
            .walk(root, &mut containers)
            .unwrap();
        containers
    }

    fn write_metric_files(dir: &Path) {
        fs::write(dir.join("memory.stat"), "cache 1\nrss 2\n").unwrap();
        fs::write(dir.join("cpuacct.stat"), "user 1\nsystem 2\n").unwrap();
        fs::write(dir.join("blkio.throttle.io_service_bytes"), "").unwrap();
        fs::write(dir.join("blkio.throttle.io_serviced"), "").unwrap();
    }

    #[test]
    fn test_discovers_nested_container() {
        let root = tempfile::tempdir().unwrap();
        let scope = root
            .path()
            .join("system.slice")
            .join(format!("docker-{ID}.scope"));
        fs::create_dir_all(&scope).unwrap();
        write_metric_files(&scope);
        fs::write(scope.join("tasks"), "1\n").unwrap();

        let containers = walk(root.path(), DEFAULT_ID_PATTERN);
        assert_eq!(containers.len(), 1);
        let entry = &containers[ID];
        assert!(entry.bindings().is_complete());
        assert_eq!(
            entry.bindings().get(MetricKind::Memory),
            Some(scope.join("memory.stat").as_path())
        );
    }

    #[test]
    fn test_root_is_container_directory() {
        let parent = tempfile::tempdir().unwrap();
        let scope = parent.path().join(format!("docker-{ID}.scope"));
        fs::create_dir(&scope).unwrap();
        write_metric_files(&scope);

        let containers = walk(&scope, DEFAULT_ID_PATTERN);
        assert_eq!(containers.len(), 1);
        assert!(containers[ID].bindings().is_complete());
    }

    #[test]
    fn test_file_does_not_create_container() {
        let root = tempfile::tempdir().unwrap();
        let plain = root.path().join("plain");
        fs::create_dir(&plain).unwrap();
        fs::write(plain.join("memory.stat"), "cache 1\nrss 2\n").unwrap();

        let containers = walk(root.path(), r"(plain)/memory\.stat$");
        assert!(containers.is_empty());
    }

    #[test]
    fn test_regular_file_named_like_container_is_ignored() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(format!("docker-{ID}.scope")), "").unwrap();

        let containers = walk(root.path(), DEFAULT_ID_PATTERN);
        assert!(containers.is_empty());
    }

    #[test]
    fn test_partial_bindings_and_unknown_files() {
        let root = tempfile::tempdir().unwrap();
        let scope = root.path().join(format!("docker-{ID}.scope"));
        fs::create_dir(&scope).unwrap();
        fs::write(scope.join("memory.stat"), "").unwrap();
        fs::write(scope.join("memory.usage_in_bytes"), "").unwrap();

        let containers = walk(root.path(), DEFAULT_ID_PATTERN);
        let bindings = containers[ID].bindings();
        assert!(bindings.get(MetricKind::Memory).is_some());
        assert!(bindings.get(MetricKind::Cpu).is_none());
        assert!(!bindings.is_complete());
    }

    #[test]
    fn test_walk_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let scope = root.path().join(format!("docker-{ID}.scope"));
        fs::create_dir(&scope).unwrap();
        write_metric_files(&scope);

        let pattern = Regex::new(DEFAULT_ID_PATTERN).unwrap();
        let files = MetricFiles::default();
        let walker = Walker::new(&pattern, &files);
        let mut containers = BTreeMap::new();
        walker.walk(root.path(), &mut containers).unwrap();
        containers.get_mut(ID).unwrap().memory.rss = 42;
        walker.walk(root.path(), &mut containers).unwrap();

        assert_eq!(containers.len(), 1);
        assert_eq!(containers[ID].memory.rss, 42);
    }

    #[test]
    fn test_same_id_in_several_hierarchies() {
        let root = tempfile::tempdir().unwrap();
        let memory = root
            .path()
            .join("memory/system.slice")
            .join(format!("docker-{ID}.scope"));
        let cpuacct = root
            .path()
            .join("cpu,cpuacct/system.slice")
            .join(format!("docker-{ID}.scope"));
        fs::create_dir_all(&memory).unwrap();
        fs::create_dir_all(&cpuacct).unwrap();
        fs::write(memory.join("memory.stat"), "").unwrap();
        fs::write(cpuacct.join("cpuacct.stat"), "").unwrap();

        let containers = walk(root.path(), DEFAULT_ID_PATTERN);
        assert_eq!(containers.len(), 1);
        let bindings = containers[ID].bindings();
        assert_eq!(
            bindings.get(MetricKind::Memory),
            Some(memory.join("memory.stat").as_path())
        );
        assert_eq!(
            bindings.get(MetricKind::Cpu),
            Some(cpuacct.join("cpuacct.stat").as_path())
        );
    }

    #[test]
    fn test_empty_capture_is_no_match() {
        let root = tempfile::tempdir().unwrap();
        let scope = root.path().join("docker-.scope");
        fs::create_dir(&scope).unwrap();
        fs::write(scope.join("memory.stat"), "cache 1\nrss 2\n").unwrap();

        let containers = walk(root.path(), r"docker-([0-9a-z]*)\.scope");
        assert!(containers.is_empty());
    }

    #[test]
    fn test_missing_root_fails() {
        let root = tempfile::tempdir().unwrap();
        let pattern = Regex::new(DEFAULT_ID_PATTERN).unwrap();
        let files = MetricFiles::default();
        let mut containers = BTreeMap::new();
        let err = Walker::new(&pattern, &files)
            .walk(&root.path().join("missing"), &mut containers)
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
