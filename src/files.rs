use crate::error::{GenerationError, Result};
use crate::models::UploadedFile;
use std::fs;
use std::path::{Path, PathBuf};

/// Largest document sent inline with a request
pub const MAX_FILE_BYTES: usize = 20 * 1024 * 1024;

pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "txt" => Some("text/plain"),
        "md" | "markdown" => Some("text/markdown"),
        _ => None,
    }
}

impl UploadedFile {
    /// Read and validate a document from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let mime_type = mime_type_for(path).ok_or_else(|| GenerationError::UnsupportedFile {
            name: name.clone(),
            reason: "expected a PDF, image (png, jpg, webp) or text (txt, md) file".to_string(),
        })?;

        let bytes = fs::read(path).map_err(|source| GenerationError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        if bytes.is_empty() {
            return Err(GenerationError::UnsupportedFile {
                name,
                reason: "the file is empty".to_string(),
            });
        }

        if bytes.len() > MAX_FILE_BYTES {
            return Err(GenerationError::UnsupportedFile {
                name,
                reason: format!(
                    "the file is {} bytes, the limit is {} bytes",
                    bytes.len(),
                    MAX_FILE_BYTES
                ),
            });
        }

        Ok(UploadedFile::new(name, mime_type, bytes))
    }
}

/// A document queued for a workflow, either still on disk or already in memory.
///
/// Paths are read lazily so a file that cannot be read only fails its own
/// request.
#[derive(Debug, Clone)]
pub enum Attachment {
    Path(PathBuf),
    Loaded(UploadedFile),
}

impl Attachment {
    pub fn name(&self) -> String {
        match self {
            Attachment::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            Attachment::Loaded(file) => file.name.clone(),
        }
    }

    pub fn load(self) -> Result<UploadedFile> {
        match self {
            Attachment::Path(path) => UploadedFile::from_path(&path),
            Attachment::Loaded(file) => Ok(file),
        }
    }
}

impl From<PathBuf> for Attachment {
    fn from(path: PathBuf) -> Self {
        Attachment::Path(path)
    }
}

impl From<UploadedFile> for Attachment {
    fn from(file: UploadedFile) -> Self {
        Attachment::Loaded(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_for_known_extensions() {
        assert_eq!(mime_type_for(Path::new("exam.PDF")), Some("application/pdf"));
        assert_eq!(mime_type_for(Path::new("scan.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_type_for(Path::new("notes.md")), Some("text/markdown"));
        assert_eq!(mime_type_for(Path::new("archive.zip")), None);
        assert_eq!(mime_type_for(Path::new("README")), None);
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("problems.txt");
        fs::write(&path, "1) 3x = 12").unwrap();

        let file = UploadedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "problems.txt");
        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.bytes, b"1) 3x = 12");
    }

    #[test]
    fn test_from_path_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.pptx");
        fs::write(&path, "data").unwrap();

        let result = UploadedFile::from_path(&path);
        assert!(matches!(result, Err(GenerationError::UnsupportedFile { .. })));
    }

    #[test]
    fn test_from_path_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.pdf");
        fs::write(&path, "").unwrap();

        match UploadedFile::from_path(&path) {
            Err(GenerationError::UnsupportedFile { reason, .. }) => {
                assert!(reason.contains("empty"))
            }
            other => panic!("expected UnsupportedFile, got {:?}", other),
        }
    }

    #[test]
    fn test_attachment_names_and_loading() {
        let path = Attachment::from(PathBuf::from("/data/week1/algebra.pdf"));
        assert_eq!(path.name(), "algebra.pdf");
        assert!(path.load().is_err());

        let loaded = Attachment::from(UploadedFile::new("a.txt", "text/plain", b"x".to_vec()));
        assert_eq!(loaded.name(), "a.txt");
        assert_eq!(loaded.load().unwrap().bytes, b"x");
    }

    #[test]
    fn test_from_path_missing_file_is_read_error() {
        let result = UploadedFile::from_path(&PathBuf::from("/nonexistent/dir/exam.pdf"));
        assert!(matches!(result, Err(GenerationError::FileRead { .. })));
    }
}
