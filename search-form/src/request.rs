use crate::config::FormConfig;
use crate::fields::RANGE_FIELD_KEY;
use crate::key_codec::{Bucket, SEARCH_ROUTES, decode};
use crate::schema::{DatasetList, DatasetMeta, DateRange};
use crate::values::{FieldValue, FormValues, tokenize};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Form key of the free-text search box
pub const TERMS_KEY: &str = "terms";

/// Form key of the AND/OR toggle
pub const TERMS_LOGIC_KEY: &str = "terms_logic";

/// Form key of the dataset selector
pub const DB_ID_KEY: &str = "db_id";

/// Canonical search request handed to the query executor.
///
/// Every member is always serialized; absent values are written as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub terms: Option<Vec<String>>,
    pub db_id: String,
    pub filters: Option<IndexMap<String, Vec<String>>>,
    pub sub_terms: Option<IndexMap<String, Vec<String>>>,
    pub date_range: Option<DateRange>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// `true` joins terms with AND, `false` with OR
    pub terms_logic: bool,
}

impl SearchRequest {
    /// Assign pagination. Compilation never does this itself.
    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }
}

/// A compiled request together with the metadata of its dataset, if known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledSearch {
    pub request: SearchRequest,
    pub dataset: Option<DatasetMeta>,
}

/// Turns flat form values into a [`SearchRequest`]
#[derive(Debug, Clone)]
pub struct RequestCompiler {
    default_terms_logic: bool,
}

impl RequestCompiler {
    pub fn new(config: &FormConfig) -> Self {
        Self {
            default_terms_logic: config.default_terms_logic,
        }
    }

    pub fn compile(&self, values: &FormValues, db_id: &str) -> SearchRequest {
        let terms = values
            .get(TERMS_KEY)
            .and_then(FieldValue::as_text)
            .map(tokenize)
            .filter(|tokens| !tokens.is_empty());

        let mut decoded = decode(SEARCH_ROUTES, values);
        let filters = decoded.take(Bucket::Filters).filter(|m| !m.is_empty());
        let sub_terms = decoded.take(Bucket::SubTerms).filter(|m| !m.is_empty());

        SearchRequest {
            terms,
            db_id: db_id.to_string(),
            filters,
            sub_terms,
            date_range: values.get(RANGE_FIELD_KEY).and_then(FieldValue::as_bounds),
            page: None,
            page_size: None,
            terms_logic: values
                .get(TERMS_LOGIC_KEY)
                .and_then(FieldValue::as_flag)
                .unwrap_or(self.default_terms_logic),
        }
    }

    /// Compile and resolve `db_id` against `datasets`. An unknown id is not an error.
    pub fn compile_with_meta(
        &self,
        values: &FormValues,
        db_id: &str,
        datasets: &DatasetList,
    ) -> CompiledSearch {
        CompiledSearch {
            request: self.compile(values, db_id),
            dataset: datasets.find(db_id).cloned(),
        }
    }
}

impl Default for RequestCompiler {
    fn default() -> Self {
        Self::new(&FormConfig::default())
    }
}
