//! Composite form keys.
//!
//! Every schema-derived input is registered under `"{prefix}-{real name}"` so
//! that a flat map of submitted values can be routed back to the request
//! bucket its role belongs to.

use crate::error::{FormError, Result};
use crate::values::{FieldValue, FormValues, tokenize};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Reserved separator between the role prefix and the real field name
pub const KEY_DELIMITER: char = '-';

/// Role of a field that is addressed through a composite key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    Category,
    Identifier,
    Text,
}

impl KeyRole {
    pub const ALL: [KeyRole; 3] = [KeyRole::Category, KeyRole::Identifier, KeyRole::Text];

    pub const fn prefix(self) -> &'static str {
        match self {
            KeyRole::Category => "cateField",
            KeyRole::Identifier => "idField",
            KeyRole::Text => "textField",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.prefix() == prefix)
    }
}

/// Request member that decoded values are grouped into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Filters,
    SubTerms,
}

impl Bucket {
    pub const fn as_str(self) -> &'static str {
        match self {
            Bucket::Filters => "filters",
            Bucket::SubTerms => "sub_terms",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed role to bucket routing used when compiling a search request
pub const SEARCH_ROUTES: &[(KeyRole, Bucket)] = &[
    (KeyRole::Category, Bucket::Filters),
    (KeyRole::Identifier, Bucket::SubTerms),
    (KeyRole::Text, Bucket::SubTerms),
];

/// A validated `"{prefix}-{real name}"` key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey(String);

impl CompositeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CompositeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encode a role and real field name into a composite key.
///
/// A name containing [`KEY_DELIMITER`] could not be split back unambiguously,
/// so it is rejected here rather than producing a key that decodes wrong.
pub fn encode(role: KeyRole, real_name: &str) -> Result<CompositeKey> {
    if real_name.is_empty() || real_name.contains(KEY_DELIMITER) {
        return Err(FormError::InvalidFieldName {
            name: real_name.to_string(),
            delimiter: KEY_DELIMITER,
        });
    }
    Ok(CompositeKey(format!(
        "{}{KEY_DELIMITER}{real_name}",
        role.prefix()
    )))
}

/// Split a raw key on the first delimiter into its role and real name.
///
/// Returns `None` for keys that were not produced by [`encode`].
pub fn split_key(key: &str) -> Option<(KeyRole, &str)> {
    let (prefix, real_name) = key.split_once(KEY_DELIMITER)?;
    Some((KeyRole::from_prefix(prefix)?, real_name))
}

/// Decoded values grouped by bucket, then by real field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedBuckets(IndexMap<Bucket, IndexMap<String, Vec<String>>>);

impl DecodedBuckets {
    pub fn get(&self, bucket: Bucket) -> Option<&IndexMap<String, Vec<String>>> {
        self.0.get(&bucket)
    }

    /// Remove a bucket, yielding `None` when nothing was routed to it
    pub fn take(&mut self, bucket: Bucket) -> Option<IndexMap<String, Vec<String>>> {
        self.0.shift_remove(&bucket)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Route every composite-keyed entry of `values` into its bucket.
///
/// Keys whose prefix is not routed by `routes` are skipped, as are values that
/// are neither text nor a list. Text is tokenized on whitespace; lists are
/// copied as they are.
pub fn decode(routes: &[(KeyRole, Bucket)], values: &FormValues) -> DecodedBuckets {
    let mut decoded = DecodedBuckets::default();

    for (key, value) in values.iter() {
        let Some((role, real_name)) = split_key(key) else {
            continue;
        };
        let Some(bucket) = routes
            .iter()
            .find_map(|(routed, bucket)| (*routed == role).then_some(*bucket))
        else {
            debug!("No route for key {key}, skipping");
            continue;
        };

        let target = decoded.0.entry(bucket).or_default();
        match value {
            FieldValue::Text(text) => {
                target.insert(real_name.to_string(), tokenize(text));
            }
            FieldValue::List(items) => {
                target.insert(real_name.to_string(), items.clone());
            }
            FieldValue::Flag(_) | FieldValue::Bounds(_) | FieldValue::Other(_) => {
                debug!("Dropping value of unexpected shape for key {key}");
            }
        }
    }

    decoded
}
