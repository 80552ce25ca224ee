use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::error::TableError;
use super::model::ColumnType;

// ---------------------------------------------------------------------------
// Delimiter
// ---------------------------------------------------------------------------

/// How fields within a line are separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Tab,
    /// Any run of spaces or tabs.
    Whitespace,
    /// Some other single ASCII character, e.g. `|` or `;`.
    Char(char),
}

impl Delimiter {
    /// Candidates tried, in order, when no delimiter is given.
    pub const CANDIDATES: [Delimiter; 3] = [Delimiter::Comma, Delimiter::Tab, Delimiter::Whitespace];

    /// The byte handed to the `csv` reader, or `None` for whitespace.
    pub(crate) fn csv_byte(self) -> Result<Option<u8>, TableError> {
        match self {
            Delimiter::Comma => Ok(Some(b',')),
            Delimiter::Tab => Ok(Some(b'\t')),
            Delimiter::Whitespace => Ok(None),
            Delimiter::Char(c) if c.is_ascii() && c != '\n' && c != '\r' => Ok(Some(c as u8)),
            Delimiter::Char(c) => Err(TableError::Format(format!(
                "delimiter {c:?} is not a single-byte ASCII character"
            ))),
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Comma => write!(f, "comma"),
            Delimiter::Tab => write!(f, "tab"),
            Delimiter::Whitespace => write!(f, "whitespace"),
            Delimiter::Char(c) => write!(f, "{c:?}"),
        }
    }
}

impl FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "comma" | "," => Ok(Delimiter::Comma),
            "tab" | "\t" | "\\t" => Ok(Delimiter::Tab),
            "whitespace" | "space" | " " => Ok(Delimiter::Whitespace),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Delimiter::Char(c)),
                    _ => Err(format!(
                        "unknown delimiter '{s}'; expected comma, tab, whitespace or a single character"
                    )),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Malformed-row policy
// ---------------------------------------------------------------------------

/// What to do with a data line whose field count differs from the header's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Fail the whole read with a row-length error.
    #[default]
    Reject,
    /// Drop the line, log a warning and record it on the table.
    Skip,
}

// ---------------------------------------------------------------------------
// ReadOptions
// ---------------------------------------------------------------------------

/// Parsing options for [`crate::data::reader::read_str`] and friends.
///
/// Line indices count only *retained* lines, i.e. after comment and blank
/// lines have been dropped. Every field has a default, so a JSON options file
/// only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadOptions {
    /// Which retained line holds the column names.
    pub header_row_index: usize,

    /// When false, no line supplies names; they come from `names` or are
    /// positional (`col1`, `col2`, ...).
    pub has_header: bool,

    /// Explicit column names, overriding the header line.
    pub names: Option<Vec<String>>,

    /// First retained line of data. Defaults to the line after the header.
    pub data_start_index: Option<usize>,

    /// Field separator. Auto-detected when `None`.
    pub delimiter: Option<Delimiter>,

    /// Lines starting with this prefix are ignored. `None` keeps every line.
    pub comment_prefix: Option<String>,

    /// Cell text treated as missing, in addition to the empty string.
    pub missing_tokens: Vec<String>,

    /// Force a column's type instead of inferring it.
    pub column_types: BTreeMap<String, ColumnType>,

    pub on_malformed_row: MalformedRowPolicy,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            header_row_index: 0,
            has_header: true,
            names: None,
            data_start_index: None,
            delimiter: None,
            comment_prefix: Some("#".to_string()),
            missing_tokens: Vec::new(),
            column_types: BTreeMap::new(),
            on_malformed_row: MalformedRowPolicy::Reject,
        }
    }
}

impl ReadOptions {
    pub fn from_json_str(s: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load options from a JSON file. Absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, TableError> {
        let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Index of the first data line among retained lines.
    pub fn data_start(&self) -> usize {
        self.data_start_index.unwrap_or(if self.has_header {
            self.header_row_index + 1
        } else {
            0
        })
    }

    pub(crate) fn is_comment(&self, line: &str) -> bool {
        match self.comment_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => line.trim_start().starts_with(prefix),
            _ => false,
        }
    }

    /// `cell` must already be trimmed.
    pub(crate) fn is_missing(&self, cell: &str) -> bool {
        cell.is_empty() || self.missing_tokens.iter().any(|t| t == cell)
    }
}
