use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A single flat row: field name → string value, in column order.
///
/// Fields are sparse. A field that was empty in the source sheet is simply
/// absent, and every lookup on it yields `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Set a field, replacing the value in place if the field already exists
    /// so column order is preserved.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Position of a record in the Left (ledger) input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeftId(pub usize);

/// Position of a record in the Right (registry) input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RightId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Both record sets, loaded and ready for matching.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub left: Vec<Record>,
    pub right: Vec<Record>,
}

impl ReconInput {
    /// Pair up two loaded sides. A side that was never loaded is missing
    /// input; a loaded side with no records is not.
    pub fn from_sides(left: Option<Vec<Record>>, right: Option<Vec<Record>>) -> Result<Self, ReconError> {
        let left = left.ok_or(ReconError::MissingInput { side: Side::Left })?;
        let right = right.ok_or(ReconError::MissingInput { side: Side::Right })?;
        Ok(Self { left, right })
    }
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    ExactKey,
    FuzzyName,
    Manual,
}

impl std::fmt::Display for MatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactKey => write!(f, "exact_key"),
            Self::FuzzyName => write!(f, "fuzzy_name"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A resolved pairing: the Right record will receive `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub left: LeftId,
    pub right: RightId,
    pub key: String,
    pub stage: MatchStage,
}

/// A fuzzy-stage pairing. Carries no key until assembly so it can still be
/// shown for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TentativeMatch {
    pub left: LeftId,
    pub right: RightId,
}

impl TentativeMatch {
    pub fn resolve(self, key: impl Into<String>) -> Match {
        Match {
            left: self.left,
            right: self.right,
            key: key.into(),
            stage: MatchStage::FuzzyName,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExactMatchOutput {
    pub matched: Vec<Match>,
    pub pending_left: Vec<LeftId>,
    /// Right records not consumed by this stage, in input order.
    pub available_right: Vec<RightId>,
}

#[derive(Debug, Clone, Default)]
pub struct FuzzyMatchOutput {
    pub tentative: Vec<TentativeMatch>,
    /// Still-pending Left records, in name order.
    pub pending_left: Vec<LeftId>,
    /// Right records not consumed by any stage so far, in name order.
    pub pending_right: Vec<RightId>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One sheet of the export artifact. `right_to_left` is carried through from
/// config untouched; the engine never derives it from the data.
#[derive(Debug, Clone, Copy)]
pub struct OutputSheet<'a> {
    pub name: &'a str,
    pub records: &'a [Record],
    pub right_to_left: bool,
}
