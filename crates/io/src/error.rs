use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum IoError {
    Open { path: PathBuf, message: String },
    Read { path: PathBuf, message: String },
    UnsupportedFormat { path: PathBuf },
    NoSheets { path: PathBuf },
    SheetNotFound { path: PathBuf, sheet: String, available: Vec<String> },
    Write { path: PathBuf, message: String },
}

impl IoError {
    pub fn path(&self) -> &PathBuf {
        match self {
            IoError::Open { path, .. }
            | IoError::Read { path, .. }
            | IoError::UnsupportedFormat { path }
            | IoError::NoSheets { path }
            | IoError::SheetNotFound { path, .. }
            | IoError::Write { path, .. } => path,
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoError::Open { path, message } => {
                write!(f, "cannot open {}: {message}", path.display())
            }
            IoError::Read { path, message } => {
                write!(f, "cannot read {}: {message}", path.display())
            }
            IoError::UnsupportedFormat { path } => {
                write!(f, "unsupported file type: {}", path.display())
            }
            IoError::NoSheets { path } => {
                write!(f, "{} contains no sheets", path.display())
            }
            IoError::SheetNotFound { path, sheet, available } => write!(
                f,
                "sheet '{sheet}' not found in {} (available: {})",
                path.display(),
                available.join(", ")
            ),
            IoError::Write { path, message } => {
                write!(f, "cannot write {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for IoError {}
