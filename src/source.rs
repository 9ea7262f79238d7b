//! Video source handles and ephemeral decode bindings.
//!
//! [`VideoSource`] is the caller-owned handle to the raw media: a shared byte
//! buffer plus a MIME type hint, or a path on disk. The sampler never mutates
//! or persists the source — it only opens a short-lived [`SourceBinding`]
//! over it for the duration of one sample call. The binding stages in-memory
//! bytes into a scoped temporary file that FFmpeg can demux, and the file is
//! removed when the binding is dropped, on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::error::StepframeError;

/// An opaque, caller-owned handle to video media.
///
/// Cloning is cheap: the underlying byte buffer is shared. The handle carries
/// no decoder state — use [`bind`](VideoSource::bind) to obtain an ephemeral
/// decodable view.
///
/// # Example
///
/// ```no_run
/// use stepframe::VideoSource;
///
/// let bytes = std::fs::read("recording.webm").unwrap();
/// let source = VideoSource::from_bytes(bytes, "video/webm");
/// ```
#[derive(Clone)]
pub struct VideoSource {
    inner: SourceInner,
}

#[derive(Clone)]
enum SourceInner {
    /// User-supplied bytes, e.g. a browser upload forwarded to the backend.
    Memory {
        bytes: Arc<[u8]>,
        mime_type: String,
    },
    /// A file already on disk; bound without copying.
    File { path: PathBuf },
}

impl std::fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            SourceInner::Memory { bytes, mime_type } => f
                .debug_struct("VideoSource")
                .field("len", &bytes.len())
                .field("mime_type", mime_type)
                .finish(),
            SourceInner::File { path } => {
                f.debug_struct("VideoSource").field("path", path).finish()
            }
        }
    }
}

impl VideoSource {
    /// Create a source from raw media bytes and a MIME type hint.
    ///
    /// The MIME type is used only to pick a file extension for the staging
    /// file; FFmpeg probes the actual container format from the content.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            inner: SourceInner::Memory {
                bytes: Arc::from(bytes.into().into_boxed_slice()),
                mime_type: mime_type.into(),
            },
        }
    }

    /// Create a source referring to a media file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            inner: SourceInner::File {
                path: path.as_ref().to_path_buf(),
            },
        }
    }

    /// Size of the underlying media in bytes, if held in memory.
    pub fn len(&self) -> Option<usize> {
        match &self.inner {
            SourceInner::Memory { bytes, .. } => Some(bytes.len()),
            SourceInner::File { .. } => None,
        }
    }

    /// Whether an in-memory source holds zero bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Open an ephemeral decodable view over this source.
    ///
    /// In-memory bytes are staged into a named temporary file; file-backed
    /// sources bind in place. The returned [`SourceBinding`] releases any
    /// staged resource when dropped, whether sampling completed or was
    /// abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`StepframeError::Io`] if the staging file cannot be written.
    pub fn bind(&self) -> Result<SourceBinding, StepframeError> {
        match &self.inner {
            SourceInner::Memory { bytes, mime_type } => {
                let suffix = extension_for_mime(mime_type);
                let staged = tempfile::Builder::new()
                    .prefix("stepframe-")
                    .suffix(suffix)
                    .tempfile()?;
                std::fs::write(staged.path(), bytes)?;
                log::debug!(
                    "staged {} byte source ({}) at {}",
                    bytes.len(),
                    mime_type,
                    staged.path().display(),
                );
                Ok(SourceBinding {
                    staged: Some(staged),
                    path: None,
                })
            }
            SourceInner::File { path } => Ok(SourceBinding {
                staged: None,
                path: Some(path.clone()),
            }),
        }
    }
}

/// A scoped, decodable view over a [`VideoSource`].
///
/// Holds the temporary staging file (if any) alive for the duration of one
/// sample call. Dropping the binding removes the staging file. This is the
/// resource the sampler must release on every exit path — normal completion,
/// error, or supersession — which Rust's drop semantics give for free.
pub struct SourceBinding {
    staged: Option<NamedTempFile>,
    path: Option<PathBuf>,
}

impl SourceBinding {
    /// Path FFmpeg should open to demux this source.
    pub fn media_path(&self) -> &Path {
        match (&self.staged, &self.path) {
            (Some(staged), _) => staged.path(),
            (None, Some(path)) => path,
            // One of the two is always set by construction.
            (None, None) => unreachable!("binding without backing media"),
        }
    }
}

impl std::fmt::Debug for SourceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceBinding")
            .field("media_path", &self.media_path())
            .field("staged", &self.staged.is_some())
            .finish()
    }
}

/// Map a MIME type to a staging-file extension.
///
/// Purely a hint; FFmpeg identifies the container by probing content.
fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "video/webm" => ".webm",
        "video/quicktime" => ".mov",
        "video/x-matroska" => ".mkv",
        "video/x-msvideo" => ".avi",
        "video/mpeg" => ".mpg",
        "video/ogg" => ".ogv",
        _ => ".mp4",
    }
}
