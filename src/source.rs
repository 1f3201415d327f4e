//! File primitives shared by every stage of the pipeline.

use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// A source file read once for a single extraction pass.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path to the file on disk
    pub path: PathBuf,
    /// Raw file contents
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Reads a file strictly as UTF-8.
    pub fn read(path: &Path) -> Result<Self> {
        Ok(Self::new(path, read_source(path)?))
    }

    /// Async counterpart of [`SourceFile::read`], used by extraction workers.
    pub async fn read_async(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(Error::ProjectNotFound(path.to_path_buf()));
        }
        let text = tokio::fs::read_to_string(path).await?;
        Ok(Self::new(path, text))
    }

    /// File name without directories, for log lines and warnings.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Returns true when the input names a remote document.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Reads a UTF-8 text file. A missing path is reported as `ProjectNotFound`.
pub fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::ProjectNotFound(path.to_path_buf()));
    }
    debug!("Reading file: {}", path.display());
    Ok(fs::read_to_string(path)?)
}

/// Reads a file, replacing invalid UTF-8 sequences instead of failing.
pub fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Lower-cased extension of a path, without the dot.
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Writes string content to a file, creating missing parent directories.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_url() {
        assert!(is_url("http://localhost:8080/v3/api-docs"));
        assert!(is_url("https://example.com/openapi.json"));
        assert!(!is_url("./my-project"));
        assert!(!is_url("ftp://example.com"));
    }

    #[test]
    fn test_read_missing_file_is_project_not_found() {
        let err = read_source(Path::new("/definitely/not/here.java")).unwrap_err();
        assert!(matches!(err, Error::ProjectNotFound(_)));
    }

    #[test]
    fn test_read_lossy_tolerates_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Broken.java");
        fs::write(&path, [b'@', b'R', 0xff, 0xfe, b'\n']).unwrap();

        assert!(read_source(&path).is_err());
        let text = read_lossy(&path).unwrap();
        assert!(text.starts_with("@R"));
    }

    #[test]
    fn test_write_output_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out/nested/collection.json");

        write_output(&path, "{}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(extension(Path::new("api/OpenAPI.YAML")), Some("yaml".to_string()));
        assert_eq!(extension(Path::new("README")), None);
    }
}
