use std::io;
use std::path::{Path, PathBuf};

/// Error that occurs when reading a stat file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to read file `{path}`: {source}")]
pub struct FileReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FileReadError {
    /// Returns `true` if the file no longer exists.
    pub fn is_not_found(&self) -> bool {
        self.source.kind() == io::ErrorKind::NotFound
    }
}

/// Reads the full content of a cgroup pseudo-file.
///
/// Invalid UTF-8 is replaced rather than rejected; the stat parsers skip any
/// line they cannot make sense of anyway.
///
/// # Errors
///
/// Returns a [`FileReadError`] if the file cannot be opened or read.
///
/// # Example
/// ```no_run
/// # use creo_stats::fsutil;
/// let content = fsutil::read_stat_file("/sys/fs/cgroup/memory/memory.stat")?;
/// # Ok::<(), fsutil::FileReadError>(())
/// ```
pub fn read_stat_file(path: impl AsRef<Path>) -> Result<String, FileReadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| FileReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_read_stat_file_success() {
        let mut tmp = tempfile::NamedTempFile::new().expect("failed to create temp file");
        tmp.write_all(b"user 5\nsystem 7\n").unwrap();
        let content = read_stat_file(tmp.path()).expect("should read test file");
        assert_eq!(content, "user 5\nsystem 7\n");
    }

    #[test]
    fn test_read_stat_file_invalid_utf8() {
        let mut tmp = tempfile::NamedTempFile::new().expect("failed to create temp file");
        tmp.write_all(b"cache 1\xff\nrss 2\n").unwrap();
        let content = read_stat_file(tmp.path()).unwrap();
        assert!(content.ends_with("rss 2\n"));
    }

    #[test]
    fn test_read_stat_file_not_found() {
        let result = read_stat_file("/definitely/does/not/exist");
        let err = result.unwrap_err();
        assert_eq!(err.path, PathBuf::from("/definitely/does/not/exist"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_read_stat_file_directory_is_not_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_stat_file(dir.path()).unwrap_err();
        assert!(!err.is_not_found());
    }
}
