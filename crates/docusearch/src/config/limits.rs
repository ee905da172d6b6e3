//! Upload admission checks, producing the skip reasons the job ledger tracks.

use std::collections::BTreeMap;
use std::fmt;

use crate::config::schema::LimitsConfig;
use crate::jobs::SkipReason;

/// Why a file was refused before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRejection {
    pub reason: SkipReason,
    pub message: String,
}

impl FileRejection {
    /// The key recorded as a FileResult's `skip_reason`.
    pub fn reason_key(&self) -> &'static str {
        self.reason.as_str()
    }
}

impl fmt::Display for FileRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason_key(), self.message)
    }
}

#[derive(Debug, Clone)]
pub struct FileLimits {
    max_file_size_bytes: u64,
    max_file_size_mb: u64,
    max_pages: u32,
    supported_types: BTreeMap<String, String>,
}

impl FileLimits {
    pub fn from_config(config: &LimitsConfig) -> Self {
        Self {
            max_file_size_bytes: config.max_file_size_bytes(),
            max_file_size_mb: config.max_file_size_mb,
            max_pages: config.max_pages_per_document,
            supported_types: config.supported_file_types.clone(),
        }
    }

    /// Short file type label (`PDF`, `DOCX`, ...) for a supported MIME type.
    pub fn file_type(&self, mime_type: &str) -> Option<&str> {
        self.supported_types.get(mime_type).map(String::as_str)
    }

    /// Checks size first, then format, then page count when one is known.
    pub fn check(
        &self,
        size_bytes: u64,
        page_count: Option<u32>,
        mime_type: &str,
    ) -> Result<(), FileRejection> {
        if size_bytes > self.max_file_size_bytes {
            return Err(FileRejection {
                reason: SkipReason::FileSizeLimit,
                message: format!(
                    "File size ({:.1}MB) exceeds maximum allowed size ({}MB)",
                    size_bytes as f64 / (1024.0 * 1024.0),
                    self.max_file_size_mb
                ),
            });
        }

        if self.file_type(mime_type).is_none() {
            return Err(FileRejection {
                reason: SkipReason::UnknownFormat,
                message: format!("Unsupported file type: {}", mime_type),
            });
        }

        if let Some(pages) = page_count {
            if pages > self.max_pages {
                return Err(FileRejection {
                    reason: SkipReason::PageLimit,
                    message: format!(
                        "Document has {} pages, maximum allowed is {}",
                        pages, self.max_pages
                    ),
                });
            }
        }

        Ok(())
    }
}
