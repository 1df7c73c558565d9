//! Catalog records as served by the upstream listing and by this service.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One font family exactly as the upstream listing describes it.
///
/// Fields the service does not interpret (axes, color capabilities, …) are
/// kept in `extra` so single-family lookups return the record verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontRecord {
    pub family: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub subsets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub files: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FontRecord {
    pub fn summary(&self) -> FontSummary<'_> {
        FontSummary {
            family: &self.family,
            category: &self.category,
            variants: &self.variants,
            subsets: &self.subsets,
            version: self.version.as_deref(),
            last_modified: self.last_modified.as_deref(),
            files: &self.files,
        }
    }

    /// Combined-view entry. Local records keep every field; Google records
    /// are cut down to family, category, subsets and files.
    pub fn tagged(&self, source: FontOrigin) -> TaggedFont {
        let font = match source {
            FontOrigin::Local => TaggedFields::Full(self.clone()),
            FontOrigin::Google => TaggedFields::Basic {
                family: self.family.clone(),
                category: self.category.clone(),
                subsets: self.subsets.clone(),
                files: self.files.clone(),
            },
        };
        TaggedFont { font, source }
    }
}

/// The fields a catalog page lists for each family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSummary<'a> {
    pub family: &'a str,
    pub category: &'a str,
    pub variants: &'a [String],
    pub subsets: &'a [String],
    pub version: Option<&'a str>,
    pub last_modified: Option<&'a str>,
    pub files: &'a BTreeMap<String, String>,
}

/// Where a record in the combined view came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontOrigin {
    Local,
    Google,
}

/// A combined-view entry: the record's fields plus `source`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedFont {
    #[serde(flatten)]
    pub font: TaggedFields,
    pub source: FontOrigin,
}

impl TaggedFont {
    pub fn family(&self) -> &str {
        match &self.font {
            TaggedFields::Full(record) => &record.family,
            TaggedFields::Basic { family, .. } => family,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TaggedFields {
    Full(FontRecord),
    Basic {
        family: String,
        category: String,
        subsets: Vec<String>,
        files: BTreeMap<String, String>,
    },
}

/// A whole upstream listing, shared between the cache and in-flight requests.
pub type Listing = Arc<Vec<FontRecord>>;

/// Ordering the upstream applies to its listing. Each mode is cached on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortMode {
    #[default]
    Popularity,
    Trending,
    Alpha,
    Date,
    Style,
}

impl SortMode {
    pub const ALL: [SortMode; 5] = [
        SortMode::Popularity,
        SortMode::Trending,
        SortMode::Alpha,
        SortMode::Date,
        SortMode::Style,
    ];

    /// Value of the upstream `sort` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Popularity => "popularity",
            Self::Trending => "trending",
            Self::Alpha => "alpha",
            Self::Date => "date",
            Self::Style => "style",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort mode '{0}', expected one of: popularity, trending, alpha, date, style")]
pub struct UnknownSortMode(pub String);

impl FromStr for SortMode {
    type Err = UnknownSortMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSortMode(s.to_owned()))
    }
}
