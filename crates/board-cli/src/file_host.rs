//! A [`HostDocument`] backed by a JSON board file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use board_core::BoardDocument;
use board_sync::{HostDocument, HostError};

/// Reads and writes the whole board file on every call. A missing file is
/// an empty board; it is created on the first write.
#[derive(Debug, Clone)]
pub struct FileHost {
    path: PathBuf,
}

impl FileHost {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileHost { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HostDocument for FileHost {
    fn read_document(&self) -> Result<BoardDocument, HostError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BoardDocument::default()),
            Ok(text) => Ok(BoardDocument::from_json(&text)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BoardDocument::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_document(&self, doc: &BoardDocument) -> Result<(), HostError> {
        let mut text = doc.to_json_pretty()?;
        text.push('\n');
        fs::write(&self.path, text)?;
        tracing::debug!(path = %self.path.display(), nodes = doc.nodes.len(), "wrote board file");
        Ok(())
    }

    /// Flushes the file to disk.
    fn request_persist(&self) -> Result<(), HostError> {
        fs::File::open(&self.path)?.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_empty_and_is_created_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let host = FileHost::new(dir.path().join("board.json"));
        let doc = host.read_document().unwrap();
        assert!(doc.nodes.is_empty());

        host.write_document(&doc).unwrap();
        host.request_persist().unwrap();
        assert!(host.path().exists());
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        fs::write(&path, "{ not json").unwrap();
        let err = FileHost::new(&path).read_document().unwrap_err();
        assert!(matches!(err, HostError::Malformed(_)));
    }
}
