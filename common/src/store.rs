//! Whole-file access to the text files that back every editor.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::{
    fs::{copy, read_to_string, remove_file, rename},
    io::Write,
};
use tempfile::NamedTempFile;

/// A blob of text that is read and written as a whole.
pub trait Store {
    /// # Errors
    /// This function returns an error if the backing text cannot be read.
    fn read(&self) -> Result<String>;

    /// # Errors
    /// This function returns an error if the backing text cannot be replaced.
    fn write(&self, contents: &str) -> Result<()>;
}

/// A [`Store`] backed by a single file on disk.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: Utf8PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl Store for FileStore {
    fn read(&self) -> Result<String> {
        read_to_string(&self.path).with_context(|| format!("failed to read {}", self.path))
    }

    fn write(&self, contents: &str) -> Result<()> {
        write_atomic(&self.path, contents.as_bytes())
    }
}

/// Replaces the file at `path` with `contents`.
/// The bytes are written to a temporary file next to the destination,
/// which is then renamed over it, so readers see either the old file or the new one.
///
/// # Errors
/// This function returns an error if:
/// - a temporary file cannot be created in the destination directory
/// - writing or syncing the temporary file fails
/// - the temporary file cannot be moved to the destination
pub fn write_atomic(path: &Utf8Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {dir}"))?;

    file.write_all(contents)
        .and_then(|()| file.as_file().sync_all())
        .with_context(|| format!("failed to write temporary file for {path}"))?;

    file.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to replace {path}"))?;

    log::debug!("wrote {} bytes to {path}", contents.len());

    Ok(())
}

/// Moves a file, falling back to copy-and-delete when a plain rename is not possible
/// (e.g. when the source lives on another file system).
///
/// # Errors
/// This function returns an error if the file could neither be renamed nor copied,
/// or if the source could not be removed after copying.
pub fn move_file(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    if let Err(err) = rename(from, to) {
        log::debug!("rename from {from} to {to} failed ({err}), copying instead");

        copy(from, to).with_context(|| format!("failed to copy file from {from} to {to}"))?;
        remove_file(from).with_context(|| format!("failed to remove {from} after copying"))?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::{move_file, write_atomic, FileStore, Store};
    use camino::Utf8PathBuf;
    use std::{fs, io::ErrorKind};
    use tempfile::tempdir;

    fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path).expect("temporary paths should be UTF-8")
    }

    #[test]
    fn read_write() {
        let dir = tempdir().expect("temporary directory should be created");
        let store = FileStore::new(utf8(dir.path().join("main.css")));

        assert!(!store.exists());
        store.write("a { color: red; }").expect("write should succeed");
        assert!(store.exists());
        assert_eq!(
            store.read().expect("read should succeed"),
            "a { color: red; }"
        );

        // Writing replaces the previous contents entirely
        store.write("b {}").expect("write should succeed");
        assert_eq!(store.read().expect("read should succeed"), "b {}");
    }

    #[test]
    fn missing_file() {
        let dir = tempdir().expect("temporary directory should be created");
        let store = FileStore::new(utf8(dir.path().join("absent.html")));

        let err = store.read().expect_err("reading a missing file should fail");
        assert!(
            err.chain()
                .filter_map(|cause| cause.downcast_ref::<std::io::Error>())
                .any(|io| io.kind() == ErrorKind::NotFound),
            "the I/O error should be kept in the error chain"
        );
    }

    #[test]
    fn no_temporary_files_left() {
        let dir = tempdir().expect("temporary directory should be created");
        let path = utf8(dir.path().join("index.html"));

        write_atomic(&path, b"<p>Hi</p>").expect("write should succeed");

        let names: Vec<_> = fs::read_dir(dir.path())
            .expect("directory should be readable")
            .map(|entry| entry.expect("entry should be readable").file_name())
            .collect();
        assert_eq!(names, ["index.html"]);
    }

    #[test]
    fn move_between_directories() {
        let dir = tempdir().expect("temporary directory should be created");
        let from = utf8(dir.path().join("upload.tmp"));
        let to_dir = utf8(dir.path().join("img"));
        fs::create_dir(&to_dir).expect("directory should be created");
        let to = to_dir.join("hero.jpg");

        fs::write(&from, b"jpeg").expect("write should succeed");
        move_file(&from, &to).expect("move should succeed");

        assert!(!from.exists());
        assert_eq!(fs::read(&to).expect("read should succeed"), b"jpeg");
    }
}
