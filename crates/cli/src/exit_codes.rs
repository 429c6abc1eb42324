//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args, refusing to overwrite)    |
//! | 3    | An input file is missing or could not be read        |
//! | 4    | Config file unreadable or invalid                    |
//! | 5    | Decisions file unreadable or invalid                 |
//! | 6    | Output could not be written                          |
//! | 7    | Ledger records left unmatched (`run --strict` only)  |

use keybridge_io::IoError;
use keybridge_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Left or Right input missing or unreadable.
pub const EXIT_INPUT_READ: u8 = 3;

/// Config file could not be read, parsed, or validated.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// Decisions file could not be read or parsed.
pub const EXIT_DECISIONS: u8 = 5;

/// Writing the output workbook (or summary file) failed.
pub const EXIT_EXPORT: u8 = 6;

/// `--strict`: at least one Left record is still unmatched.
pub const EXIT_UNRESOLVED: u8 = 7;

/// Exit code for an engine error.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::MissingInput { .. } => EXIT_INPUT_READ,
        ReconError::DecisionsParse(_) => EXIT_DECISIONS,
    }
}

/// Exit code for a spreadsheet error. Write failures are export errors,
/// everything else happened while reading input.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Write { .. } => EXIT_EXPORT,
        IoError::Open { .. }
        | IoError::Read { .. }
        | IoError::UnsupportedFormat { .. }
        | IoError::NoSheets { .. }
        | IoError::SheetNotFound { .. } => EXIT_INPUT_READ,
    }
}
