// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Filewerk transformation engine.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Blobs ------------------------------------------------------------------

/// An in-memory file handed over by the file-selection front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Size of the blob in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// File name with the last extension removed (`photo.final.png` → `photo.final`).
    pub fn base_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) if idx > 0 => &self.name[..idx],
            _ => &self.name,
        }
    }

    /// Lower-cased extension, if any.
    pub fn extension(&self) -> Option<String> {
        match self.name.rfind('.') {
            Some(idx) if idx > 0 && idx + 1 < self.name.len() => {
                Some(self.name[idx + 1..].to_ascii_lowercase())
            }
            _ => None,
        }
    }

    /// Category implied by the file name's extension.
    pub fn kind(&self) -> Option<FileKind> {
        self.extension().as_deref().and_then(FileKind::from_extension)
    }
}

/// A finished output ready to be persisted or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl OutputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Coarse input category, used to route a file to the right processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Tabular,
    Document,
    Image,
}

impl FileKind {
    /// Infer the file kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Tabular),
            "pdf" => Some(Self::Document),
            "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "tif" | "tiff" => Some(Self::Image),
            _ => None,
        }
    }
}

// -- Tabular ----------------------------------------------------------------

/// One input record: header name (as found in the file) to cell value.
pub type RawRow = HashMap<String, String>;

/// Semantic column roles recognised in tabular input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    UserId,
    FirstName,
    LastName,
    Email,
    Phone,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 5] = [
        Self::UserId,
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::Phone,
    ];

    /// Candidate header names for this role, in priority order. Matching is
    /// case-insensitive against trimmed headers.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::UserId => &["userId", "user id", "user_id", "id"],
            Self::FirstName => &["firstName", "first name", "first_name", "firstname"],
            Self::LastName => &["lastName", "last name", "last_name", "lastname"],
            Self::Email => &["email", "e-mail", "email address"],
            Self::Phone => &["phone", "phone number", "phonenumber", "phone_number", "mobile"],
        }
    }

    /// Output column name for this role.
    pub fn label(&self) -> &'static str {
        match self {
            Self::UserId => "userId",
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

/// Opaque identifier of a tag rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub String);

impl RuleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The condition under which a rule contributes its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Always contributes.
    Static,
    /// Contributes when the named column is non-blank.
    NonEmpty,
    /// Contributes when the named column contains the match value
    /// (case-insensitive substring).
    ValueMatch,
}

/// A declarative tagging rule as produced by the rule editor.
///
/// Accepts both `kind`/`matchValue` and the editor's `type`/`value` field
/// names when deserialised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRule {
    #[serde(default)]
    pub id: RuleId,
    #[serde(alias = "type")]
    pub kind: RuleKind,
    #[serde(default)]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, alias = "value", skip_serializing_if = "Option::is_none")]
    pub match_value: Option<String>,
}

impl TagRule {
    pub fn static_tag(tag: impl Into<String>) -> Self {
        Self {
            id: RuleId::new(),
            kind: RuleKind::Static,
            tag: tag.into(),
            column: None,
            match_value: None,
        }
    }

    pub fn non_empty(column: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: RuleId::new(),
            kind: RuleKind::NonEmpty,
            tag: tag.into(),
            column: Some(column.into()),
            match_value: None,
        }
    }

    pub fn value_match(
        column: impl Into<String>,
        match_value: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            id: RuleId::new(),
            kind: RuleKind::ValueMatch,
            tag: tag.into(),
            column: Some(column.into()),
            match_value: Some(match_value.into()),
        }
    }

    /// Static rule tagging every row with the import date, e.g. `01/15/2025 AM`.
    pub fn dated(date: NaiveDate) -> Self {
        Self::static_tag(date.format("%m/%d/%Y AM").to_string())
    }

    /// A rule whose tag is blank contributes nothing.
    pub fn is_inert(&self) -> bool {
        self.tag.trim().is_empty()
    }
}

/// One normalised output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedRow {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub tags: String,
}

// -- Images -----------------------------------------------------------------

/// Output codec for image recompression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageTarget {
    /// Lossy JPEG.
    Jpeg,
    /// Lossy WebP.
    WebP,
    /// Lossless PNG.
    Png,
}

impl ImageTarget {
    /// Canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Png => "png",
        }
    }

    /// Display name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::WebP => "WebP",
            Self::Png => "PNG",
        }
    }

    /// Lossless targets cannot be quality-tuned.
    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Png)
    }
}

impl std::str::FromStr for ImageTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::WebP),
            "png" => Ok(Self::Png),
            other => Err(format!("unsupported image format: {other}")),
        }
    }
}
