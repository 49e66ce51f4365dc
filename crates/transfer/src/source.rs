use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use filedock_protocol::constants::DEFAULT_MIME_TYPE;

/// A file selected for upload.
///
/// Sizes and names are declared up front; bytes are read lazily by range so
/// the transport never has to hold more than one chunk in memory.
pub trait FileSource: Send + Sync {
    /// Display name sent to the backend.
    fn name(&self) -> &str;

    /// Declared MIME type.
    fn mime_type(&self) -> &str;

    /// Declared size in bytes.
    fn size(&self) -> u64;

    /// Reads bytes `[start, end)`.
    ///
    /// Fails with `UnexpectedEof` if the source holds fewer bytes than declared.
    fn read_range(&self, start: u64, end: u64) -> std::io::Result<Vec<u8>>;
}

/// A file held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    mime_type: String,
    data: Vec<u8>,
}

impl MemoryFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl FileSource for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_range(&self, start: u64, end: u64) -> std::io::Result<Vec<u8>> {
        let len = self.data.len() as u64;
        if start > end || end > len {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("range {start}..{end} outside of {len} bytes"),
            ));
        }
        Ok(self.data[start as usize..end as usize].to_vec())
    }
}

/// A file on the local filesystem.
///
/// The size is captured when the file is opened; a file that shrinks
/// afterwards surfaces as a read error.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    mime_type: String,
    size: u64,
}

impl LocalFile {
    /// Opens `path`, capturing its name, size and a MIME type guessed from the extension.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".into());
        Ok(Self {
            path: path.to_path_buf(),
            name,
            mime_type: detect_mime_type(path).to_string(),
            size: metadata.len(),
        })
    }

    /// Overrides the guessed MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileSource for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read_range(&self, start: u64, end: u64) -> std::io::Result<Vec<u8>> {
        if start > end {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("inverted range {start}..{end}"),
            ));
        }
        let mut file = std::fs::File::open(&self.path)?;
        file.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; (end - start) as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// Guesses a MIME type from the file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("json") => "application/json",
        Some("txt" | "log") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("html" | "htm") => "text/html",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        _ => DEFAULT_MIME_TYPE,
    }
}
