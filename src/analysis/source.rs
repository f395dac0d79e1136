//! Reading source files
//!
//! Files are read as bytes, checked against the size limit and decoded as
//! UTF-8, lossily when needed. The BLAKE3 digest of the raw bytes
//! identifies file contents for the cache.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::errors::{AnalyzerError, Result};

/// Default limit on the size of an analyzed file
pub const DEFAULT_MAX_FILE_BYTES: u64 = 8 * 1024 * 1024;

/// A decoded source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    /// Hex BLAKE3 digest of the bytes on disk
    pub hash: String,
    pub len: u64,
}

fn map_open_error(path: &Path, err: io::Error) -> AnalyzerError {
    if err.kind() == io::ErrorKind::NotFound {
        AnalyzerError::FileNotFound(path.to_path_buf())
    } else {
        AnalyzerError::IoError(err)
    }
}

fn check_size(path: &Path, max_bytes: u64) -> Result<u64> {
    let metadata = std::fs::metadata(path).map_err(|e| map_open_error(path, e))?;
    if !metadata.is_file() {
        return Err(AnalyzerError::FileNotFound(path.to_path_buf()));
    }
    if metadata.len() > max_bytes {
        return Err(AnalyzerError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max: max_bytes,
        });
    }
    Ok(metadata.len())
}

/// Read and decode `path`
pub fn read_source(path: &Path, max_bytes: u64) -> Result<SourceFile> {
    check_size(path, max_bytes)?;
    let bytes = std::fs::read(path).map_err(|e| map_open_error(path, e))?;
    let hash = blake3::hash(&bytes).to_hex().to_string();
    let len = bytes.len() as u64;

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            warn!(
                path = %path.display(),
                valid_up_to = err.utf8_error().valid_up_to(),
                "Source is not valid UTF-8, decoding lossily"
            );
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    };

    Ok(SourceFile {
        path: path.to_path_buf(),
        text,
        hash,
        len,
    })
}

/// Hex BLAKE3 digest of the file contents, streamed from disk
pub fn content_hash(path: &Path, max_bytes: u64) -> Result<String> {
    check_size(path, max_bytes)?;
    let mut file = File::open(path).map_err(|e| map_open_error(path, e))?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_source_and_hash_agree() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.c");
        std::fs::write(&path, "int x;\n").unwrap();

        let source = read_source(&path, DEFAULT_MAX_FILE_BYTES).unwrap();
        assert_eq!(source.text, "int x;\n");
        assert_eq!(source.len, 7);
        assert_eq!(source.hash, content_hash(&path, DEFAULT_MAX_FILE_BYTES).unwrap());
    }

    #[test]
    fn test_missing_file() {
        let err = read_source(Path::new("/definitely/not/here.c"), DEFAULT_MAX_FILE_BYTES).unwrap_err();
        assert!(matches!(err, AnalyzerError::FileNotFound(_)));
    }

    #[test]
    fn test_size_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.c");
        std::fs::write(&path, "x".repeat(64)).unwrap();

        let err = read_source(&path, 16).unwrap_err();
        assert!(matches!(err, AnalyzerError::FileTooLarge { size: 64, max: 16, .. }));
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.c");
        std::fs::write(&path, b"/* caf\xe9 */\nint x;\n").unwrap();

        let source = read_source(&path, DEFAULT_MAX_FILE_BYTES).unwrap();
        assert!(source.text.contains('\u{FFFD}'));
        assert!(source.text.ends_with("int x;\n"));
    }

    #[test]
    fn test_different_contents_hash_differently() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.c");
        std::fs::write(&path, "int x;").unwrap();
        let first = content_hash(&path, DEFAULT_MAX_FILE_BYTES).unwrap();
        std::fs::write(&path, "int y;").unwrap();
        assert_ne!(first, content_hash(&path, DEFAULT_MAX_FILE_BYTES).unwrap());
    }
}
