//! Upload validation and storage.
//!
//! Uploads are accepted only for a fixed set of image/video extensions and a
//! 15 MB ceiling, then written under the uploads directory with a
//! server-generated name. Client filenames are never trusted: the stored name
//! is a UUID plus a sanitized stem, so path traversal is impossible and
//! concurrent uploads cannot collide.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use uuid::Uuid;

use crate::error::Result;

/// Upper bound on accepted upload size, exclusive.
pub const MAX_UPLOAD_BYTES: u64 = 15 * 1024 * 1024;

/// Extensions accepted from clients.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "mp4", "mov"];

/// Broad category of an accepted upload, driving the scripted follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Video,
}

impl FileCategory {
    /// Category for an already-validated extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "png" | "jpg" | "jpeg" => Some(FileCategory::Image),
            "mp4" | "mov" => Some(FileCategory::Video),
            _ => None,
        }
    }
}

/// Why an upload was refused. Each case maps to a fixed client-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRejection {
    Missing,
    UnsupportedType,
    TooLarge,
}

impl UploadRejection {
    /// The message returned to the client with the 400.
    pub fn message(&self) -> &'static str {
        match self {
            UploadRejection::Missing => "No file uploaded.",
            UploadRejection::UnsupportedType => {
                "Unsupported file type. Please upload a product-related image or video."
            }
            UploadRejection::TooLarge => {
                "File too large! Please upload a file smaller than 15MB."
            }
        }
    }
}

/// A validated upload: its extension and category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub extension: String,
    pub category: FileCategory,
}

/// Check a client filename and size against the upload policy.
///
/// Checks run in the order clients observe them: presence, then extension,
/// then size. The extension is whatever follows the last dot, lowercased; a
/// name without a dot is compared whole.
pub fn validate_upload(
    file_name: Option<&str>,
    size: u64,
) -> std::result::Result<UploadTicket, UploadRejection> {
    let name = match file_name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(UploadRejection::Missing),
    };

    let extension = name
        .rsplit('.')
        .next()
        .unwrap_or(name)
        .to_lowercase();
    let Some(category) = FileCategory::from_extension(&extension) else {
        return Err(UploadRejection::UnsupportedType);
    };

    if size > MAX_UPLOAD_BYTES {
        return Err(UploadRejection::TooLarge);
    }

    Ok(UploadTicket {
        extension,
        category,
    })
}

/// A file persisted under the uploads directory.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// The server-generated file name.
    pub file_name: String,
    /// Full path of the stored file.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes_written: u64,
}

/// Sanitize the stem of a client filename for reuse in the stored name.
///
/// Directory components are dropped, the extension is cut off, and anything
/// outside `[A-Za-z0-9._-]` is removed. An empty result becomes `upload`.
pub fn sanitize_file_stem(client_name: &str) -> String {
    let base = Path::new(client_name)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = match base.rfind('.') {
        Some(0) | None => base.as_str(),
        Some(index) => &base[..index],
    };
    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .take(64)
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Write validated upload bytes under `dir`, creating it on demand.
pub fn store_upload(
    dir: &Path,
    client_name: &str,
    ticket: &UploadTicket,
    bytes: &[u8],
) -> Result<StoredUpload> {
    fs::create_dir_all(dir)?;

    let file_name = format!(
        "{}_{}.{}",
        Uuid::new_v4(),
        sanitize_file_stem(client_name),
        ticket.extension
    );
    let path = dir.join(&file_name);
    fs::write(&path, bytes)?;
    info!("stored upload {} ({} bytes)", path.display(), bytes.len());

    Ok(StoredUpload {
        file_name,
        path,
        bytes_written: bytes.len() as u64,
    })
}
