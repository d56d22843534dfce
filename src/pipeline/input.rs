//! Input resolution: read the diet plan and the photo from local paths.
//!
//! The library itself works on bytes; this stage exists for collaborators
//! that hold file paths (the CLI). Missing and unreadable files are mapped to
//! typed errors so the user sees which path is wrong.

use crate::error::AnalysisError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// First bytes of every PDF file.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Check whether `bytes` start with the PDF magic.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.len() >= PDF_MAGIC.len() && &bytes[..PDF_MAGIC.len()] == PDF_MAGIC
}

/// Read a whole file, mapping I/O failures to [`AnalysisError`].
pub async fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>, AnalysisError> {
    let path = path.as_ref();

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => AnalysisError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => AnalysisError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => AnalysisError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    })?;

    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_looks_like_pdf() {
        assert!(looks_like_pdf(b"%PDF-1.7\n..."));
        assert!(!looks_like_pdf(b"%PD"));
        assert!(!looks_like_pdf(b""));
        assert!(!looks_like_pdf(b"\x89PNG\r\n"));
    }

    #[tokio::test]
    async fn read_missing_file() {
        let err = read_file("/definitely/not/a/real/plan.pdf").await.unwrap_err();
        assert!(matches!(err, AnalysisError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn read_existing_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.4 hello").unwrap();
        let bytes = read_file(tmp.path()).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4 hello");
    }
}
