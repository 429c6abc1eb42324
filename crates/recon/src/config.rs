use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Defaults (the ledger ↔ registry columns the tool was built around)
// ---------------------------------------------------------------------------

pub const DEFAULT_LEFT_KEY: &str = "מפתח חשבון";
pub const DEFAULT_LEFT_ID: &str = "מס' ע.מורשה";
pub const DEFAULT_LEFT_NAME: &str = "שם החשבון";
pub const DEFAULT_RIGHT_ID: &str = "עוסק מורשה";
pub const DEFAULT_RIGHT_NAME: &str = "שם";
pub const DEFAULT_MERGED_SHEET: &str = "נתונים ממוזגים";
pub const DEFAULT_UNMATCHED_SHEET: &str = "ללא התאמה מהקובץ הנהלת חשבונות";
pub const DEFAULT_OUTPUT_FILE: &str = "הנהלת חשבונות.xlsx";

/// Excel's hard limit on worksheet name length.
const MAX_SHEET_NAME_CHARS: usize = 31;
const SHEET_NAME_FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];
/// Extensions the merged output can be written as.
pub const OUTPUT_EXTENSIONS: [&str; 4] = ["xlsx", "csv", "tsv", "txt"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    pub name: String,
    pub fields: FieldConfig,
    pub matching: MatchingConfig,
    pub output: OutputConfig,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: "ledger-registry".into(),
            fields: FieldConfig::default(),
            matching: MatchingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Field mapping
// ---------------------------------------------------------------------------

/// Column names on each side. Left supplies the account key, Right receives it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub left_key: String,
    pub left_id: String,
    pub left_name: String,
    pub right_id: String,
    pub right_name: String,
    /// Column written onto Right records. Defaults to `left_key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            left_key: DEFAULT_LEFT_KEY.into(),
            left_id: DEFAULT_LEFT_ID.into(),
            left_name: DEFAULT_LEFT_NAME.into(),
            right_id: DEFAULT_RIGHT_ID.into(),
            right_name: DEFAULT_RIGHT_NAME.into(),
            output_key: None,
        }
    }
}

impl FieldConfig {
    pub fn output_key(&self) -> &str {
        self.output_key.as_deref().unwrap_or(&self.left_key)
    }
}

// ---------------------------------------------------------------------------
// Matching stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ExactKey,
    FuzzyName,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactKey => write!(f, "exact_key"),
            Self::FuzzyName => write!(f, "fuzzy_name"),
        }
    }
}

/// Automatic stages to run before manual matching. Order is fixed
/// (exact before fuzzy); the list only toggles them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub stages: Vec<Stage>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            stages: vec![Stage::ExactKey, Stage::FuzzyName],
        }
    }
}

impl MatchingConfig {
    pub fn enabled(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output path used when none is given on the command line.
    pub file: String,
    pub merged_sheet: String,
    pub unmatched_sheet: String,
    pub include_unmatched_sheet: bool,
    /// Sheet direction flag written alongside the data.
    pub right_to_left: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: DEFAULT_OUTPUT_FILE.into(),
            merged_sheet: DEFAULT_MERGED_SHEET.into(),
            unmatched_sheet: DEFAULT_UNMATCHED_SHEET.into(),
            include_unmatched_sheet: true,
            right_to_left: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ReconError> {
        toml::to_string_pretty(self).map_err(|e| ReconError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let f = &self.fields;
        for (label, value) in [
            ("left_key", f.left_key.as_str()),
            ("left_id", f.left_id.as_str()),
            ("left_name", f.left_name.as_str()),
            ("right_id", f.right_id.as_str()),
            ("right_name", f.right_name.as_str()),
            ("output_key", f.output_key()),
        ] {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "fields.{label} must not be empty"
                )));
            }
        }

        for (i, stage) in self.matching.stages.iter().enumerate() {
            if self.matching.stages[..i].contains(stage) {
                return Err(ReconError::ConfigValidation(format!(
                    "matching.stages lists '{stage}' more than once"
                )));
            }
        }

        if self.output.file.trim().is_empty() {
            return Err(ReconError::ConfigValidation("output.file must not be empty".into()));
        }
        let ext = std::path::Path::new(&self.output.file)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        if !ext.is_some_and(|e| OUTPUT_EXTENSIONS.contains(&e.as_str())) {
            return Err(ReconError::ConfigValidation(format!(
                "output.file '{}' must end in .{}",
                self.output.file,
                OUTPUT_EXTENSIONS.join(", .")
            )));
        }

        validate_sheet_name("output.merged_sheet", &self.output.merged_sheet)?;
        if self.output.include_unmatched_sheet {
            validate_sheet_name("output.unmatched_sheet", &self.output.unmatched_sheet)?;
            if self.output.unmatched_sheet == self.output.merged_sheet {
                return Err(ReconError::ConfigValidation(
                    "output.unmatched_sheet must differ from output.merged_sheet".into(),
                ));
            }
        }

        Ok(())
    }
}

fn validate_sheet_name(label: &str, name: &str) -> Result<(), ReconError> {
    if name.trim().is_empty() {
        return Err(ReconError::ConfigValidation(format!("{label} must not be empty")));
    }
    if name.chars().count() > MAX_SHEET_NAME_CHARS {
        return Err(ReconError::ConfigValidation(format!(
            "{label} '{name}' is longer than {MAX_SHEET_NAME_CHARS} characters"
        )));
    }
    if let Some(c) = name.chars().find(|c| SHEET_NAME_FORBIDDEN.contains(c)) {
        return Err(ReconError::ConfigValidation(format!(
            "{label} '{name}' contains forbidden character '{c}'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
