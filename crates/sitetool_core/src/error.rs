use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type SiteResult<T> = Result<T, SiteError>;

/// Failures that abort a single locale or prerender pass.
///
/// Container type disagreements between locale trees are not errors: the
/// reconciler resolves them in favour of the reference and reports the path.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("missing {what}: {} does not exist", display_path(.path))]
    MissingInput { what: &'static str, path: PathBuf },
    #[error("malformed input {}: {reason}", display_path(.path))]
    MalformedInput { path: PathBuf, reason: String },
    #[error("failed to {operation} {}", display_path(.path))]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SiteError {
    pub fn missing(what: &'static str, path: &Path) -> Self {
        Self::MissingInput {
            what,
            path: path.to_path_buf(),
        }
    }

    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::MissingInput { path, .. }
            | Self::MalformedInput { path, .. }
            | Self::Io { path, .. } => path,
        }
    }
}

pub(crate) fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::SiteError;

    #[test]
    fn missing_input_names_expected_path() {
        let error = SiteError::missing("rendered document", Path::new("dist/de/index.html"));
        assert_eq!(
            error.to_string(),
            "missing rendered document: dist/de/index.html does not exist"
        );
        assert_eq!(error.path(), Path::new("dist/de/index.html"));
    }

    #[test]
    fn malformed_input_carries_reason() {
        let error = SiteError::malformed(Path::new("locales/de.json"), "expected a JSON object");
        assert!(error.to_string().contains("locales/de.json"));
        assert!(error.to_string().contains("expected a JSON object"));
    }
}
