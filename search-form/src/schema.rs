use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive integer bound pair, serialized as `[low, high]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange(pub i64, pub i64);

impl DateRange {
    pub const fn new(low: i64, high: i64) -> Self {
        Self(low, high)
    }

    pub const fn low(self) -> i64 {
        self.0
    }

    pub const fn high(self) -> i64 {
        self.1
    }

    pub const fn is_inverted(self) -> bool {
        self.0 > self.1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.0, self.1)
    }
}

/// Per-dataset field schema as returned by the portal's detail endpoint.
///
/// Only the members that drive field synthesis are kept; anything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Category field name to its category labels, in the backend's order
    #[serde(default, rename = "cate_fields_detail", alias = "category_fields")]
    pub category_fields: IndexMap<String, Vec<String>>,

    #[serde(default, rename = "id_fields", alias = "identifier_fields")]
    pub identifier_fields: Vec<String>,

    #[serde(default)]
    pub text_fields: Vec<String>,

    #[serde(default)]
    pub date_range: Option<DateRange>,
}

impl Schema {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Total number of named fields (the range control is not counted)
    pub fn field_count(&self) -> usize {
        self.category_fields.len() + self.identifier_fields.len() + self.text_fields.len()
    }
}

/// Metadata for one selectable dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub id: String,

    /// Display name shown in the dataset selector
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

impl DatasetMeta {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            org_name: None,
            title_field: None,
            time_field: None,
            user_name: None,
            create_time: None,
        }
    }
}

/// Ordered list of selectable datasets. The first entry is the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetList(Vec<DatasetMeta>);

impl DatasetList {
    pub fn new(datasets: Vec<DatasetMeta>) -> Self {
        Self(datasets)
    }

    pub fn default_dataset(&self) -> Option<&DatasetMeta> {
        self.0.first()
    }

    /// Read-only lookup by id
    pub fn find(&self, db_id: &str) -> Option<&DatasetMeta> {
        self.0.iter().find(|meta| meta.id == db_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetMeta> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<DatasetMeta>> for DatasetList {
    fn from(datasets: Vec<DatasetMeta>) -> Self {
        Self(datasets)
    }
}
