//! Upload constraints shared by the server and the client orchestrator.
//!
//! The client checks a selection locally before any network call; the
//! server applies the same size limit to each multipart part it receives.

use serde::Serialize;

/// Default maximum number of files attached through one wizard session.
pub const DEFAULT_MAX_FILES: usize = 5;

/// Default maximum size of a single file (10 MiB).
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Accepted extensions paired with their MIME types.
const ACCEPTED_TYPES: [(&str, &str); 7] = [
    (".pdf", "application/pdf"),
    (".doc", "application/msword"),
    (
        ".docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    (".txt", "text/plain"),
    (".csv", "text/csv"),
    (".xls", "application/vnd.ms-excel"),
    (
        ".xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
];

/// Limits applied to a file selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    pub max_files: usize,
    pub max_size_bytes: u64,
    pub accepted_extensions: Vec<String>,
    pub accepted_mime_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            accepted_extensions: ACCEPTED_TYPES.iter().map(|(ext, _)| ext.to_string()).collect(),
            accepted_mime_types: ACCEPTED_TYPES
                .iter()
                .map(|(_, mime)| mime.to_string())
                .collect(),
        }
    }
}

impl UploadConfig {
    /// Load limits from environment variables, falling back to defaults.
    ///
    /// | Env Var                 | Default      |
    /// |-------------------------|--------------|
    /// | `UPLOAD_MAX_FILES`      | `5`          |
    /// | `UPLOAD_MAX_SIZE_BYTES` | `10485760`   |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_files = std::env::var("UPLOAD_MAX_FILES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_files);

        let max_size_bytes = std::env::var("UPLOAD_MAX_SIZE_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_size_bytes);

        Self {
            max_files,
            max_size_bytes,
            ..defaults
        }
    }

    pub fn accepts_mime(&self, mime: &str) -> bool {
        self.accepted_mime_types.iter().any(|m| m == mime)
    }

    /// Size limit rendered in whole megabytes, as shown to users.
    pub fn max_size_mb(&self) -> u64 {
        self.max_size_bytes / 1024 / 1024
    }
}

/// MIME type for a file name, based on its extension. `None` for
/// extensions outside the accepted set.
pub fn mime_for_filename(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    ACCEPTED_TYPES
        .iter()
        .find(|(ext, _)| lower.ends_with(ext))
        .map(|(_, mime)| *mime)
}

/// Extension (with leading dot) of a file name, lowercased. Empty when
/// the name has none.
pub fn extension_of(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

pub const ERR_NO_FILES_SELECTED: &str = "No files selected";

/// What the constraint checks need to know about a selected file.
pub trait SelectedFile {
    fn file_name(&self) -> &str;
    fn size_bytes(&self) -> u64;
    fn mime_type(&self) -> &str;
}

/// Check a new batch of files against the configured limits.
///
/// `already_accepted` is the number of files accepted by earlier batches.
/// Returns every violation; an empty vector means the batch is accepted.
/// An empty batch is itself a violation.
pub fn validate_selection<F: SelectedFile>(
    config: &UploadConfig,
    already_accepted: usize,
    files: &[F],
) -> Vec<String> {
    if files.is_empty() {
        return vec![ERR_NO_FILES_SELECTED.to_string()];
    }

    let mut errors = Vec::new();

    if already_accepted + files.len() > config.max_files {
        errors.push(format!("Maximum {} files allowed", config.max_files));
    }

    for file in files {
        if file.size_bytes() > config.max_size_bytes {
            errors.push(format!(
                "{} exceeds maximum file size of {}MB",
                file.file_name(),
                config.max_size_mb()
            ));
        }
        if !config.accepts_mime(file.mime_type()) {
            errors.push(format!("{} has an unsupported file type", file.file_name()));
        }
    }

    errors
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Picked {
        name: &'static str,
        size: u64,
        mime: &'static str,
    }

    impl SelectedFile for Picked {
        fn file_name(&self) -> &str {
            self.name
        }
        fn size_bytes(&self) -> u64 {
            self.size
        }
        fn mime_type(&self) -> &str {
            self.mime
        }
    }

    fn pdf(name: &'static str, size: u64) -> Picked {
        Picked {
            name,
            size,
            mime: "application/pdf",
        }
    }

    #[test]
    fn default_config_matches_documented_limits() {
        let config = UploadConfig::default();
        assert_eq!(config.max_files, 5);
        assert_eq!(config.max_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.accepted_extensions.len(), 7);
        assert_eq!(config.accepted_mime_types.len(), 7);
        assert!(config.accepts_mime("text/csv"));
        assert!(!config.accepts_mime("image/png"));
    }

    #[test]
    fn valid_batch_has_no_errors() {
        let errors = validate_selection(&UploadConfig::default(), 0, &[pdf("a.pdf", 100)]);
        assert!(errors.is_empty());
    }

    #[test]
    fn oversized_file_is_rejected() {
        let errors = validate_selection(
            &UploadConfig::default(),
            0,
            &[pdf("big.pdf", 11 * 1024 * 1024)],
        );
        assert_eq!(errors, vec!["big.pdf exceeds maximum file size of 10MB"]);
    }

    #[test]
    fn file_at_exact_limit_is_accepted() {
        let errors = validate_selection(
            &UploadConfig::default(),
            0,
            &[pdf("edge.pdf", 10 * 1024 * 1024)],
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn empty_batch_is_rejected() {
        let errors = validate_selection::<Picked>(&UploadConfig::default(), 0, &[]);
        assert_eq!(errors, vec![ERR_NO_FILES_SELECTED]);
    }

    #[test]
    fn sixth_file_is_rejected_counting_earlier_batches() {
        let errors = validate_selection(&UploadConfig::default(), 5, &[pdf("six.pdf", 1)]);
        assert_eq!(errors, vec!["Maximum 5 files allowed"]);
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let png = Picked {
            name: "cat.png",
            size: 10,
            mime: "image/png",
        };
        let errors = validate_selection(&UploadConfig::default(), 0, &[png]);
        assert_eq!(errors, vec!["cat.png has an unsupported file type"]);
    }

    #[test]
    fn every_violation_is_reported() {
        let files = [
            pdf("a.pdf", 1),
            pdf("b.pdf", 1),
            Picked {
                name: "c.exe",
                size: 20 * 1024 * 1024,
                mime: "application/octet-stream",
            },
        ];
        let errors = validate_selection(&UploadConfig::default(), 3, &files);
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], "Maximum 5 files allowed");
    }

    #[test]
    fn mime_lookup_by_extension() {
        assert_eq!(mime_for_filename("Report.PDF"), Some("application/pdf"));
        assert_eq!(
            mime_for_filename("sheet.xlsx"),
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
        );
        assert_eq!(mime_for_filename("sheet.xls"), Some("application/vnd.ms-excel"));
        assert_eq!(mime_for_filename("photo.jpg"), None);
    }

    #[test]
    fn extension_is_lowercased_with_dot() {
        assert_eq!(extension_of("a/b/Report.PDF"), ".pdf");
        assert_eq!(extension_of("README"), "");
    }
}
