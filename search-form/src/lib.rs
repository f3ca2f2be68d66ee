/*!
# Search Form

Schema-driven complex search form for the dataset portal:

- **Field synthesis**: turns a dataset schema into category selectors,
  identifier/text inputs and a date range slider
- **Composite keys**: every schema-derived input is keyed `"{role}-{name}"`
- **Request compilation**: decodes the flat submitted values into the
  canonical `SearchRequest` consumed by the search backend
- **Last request wins**: schema responses for superseded dataset selections
  are discarded

## Architecture

```text
Dataset id
  └─> SchemaFetcher (GET /api/db/detail)
        └─> synthesize (range + category + identifier + text fields)
              └─> user edits FormValues
                    └─> RequestCompiler
                          ├─> decode composite keys into filters / sub_terms
                          └─> SearchRequest (fully keyed, nulls kept)
```

## Example

```rust,no_run
use portal_search_form::{
    FetcherConfig, FieldValue, FormConfig, HttpSchemaFetcher, SearchForm, SearchSubmission,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fetcher = HttpSchemaFetcher::new(&FetcherConfig::default())?;
    let mut form = SearchForm::new(FormConfig::default());

    form.switch_dataset(&fetcher, "65e94e64").await?;
    form.set_value("cateField-major", FieldValue::list(["CS", "EE"]));

    let request = form.submit("graph neural networks", None, None, &mut |submission: SearchSubmission| {
        println!("{}", serde_json::to_string(&submission.request).unwrap_or_default());
    });
    println!("submitted: {}", request.is_some());
    Ok(())
}
```
*/

mod config;
mod error;
mod fetcher;
mod fields;
mod form;
mod key_codec;
mod marks;
mod request;
mod schema;
mod values;

pub use config::{FetcherConfig, FormConfig, PortalConfig};
pub use error::{FetchError, FormError, Result};
pub use fetcher::{DatasetSource, HttpSchemaFetcher, SchemaFetcher};
pub use fields::{
    FieldDescriptor, FieldRole, FieldSet, RANGE_FIELD_KEY, render_auxiliary_fields,
    render_category_fields, render_range_field, synthesize,
};
pub use form::{
    ApplyOutcome, FetchTicket, FormState, SearchForm, SearchSubmission, SearchSubmitHandler,
    TriggerEvent, TriggerSource,
};
pub use key_codec::{
    Bucket, CompositeKey, DecodedBuckets, KEY_DELIMITER, KeyRole, SEARCH_ROUTES, decode, encode,
    split_key,
};
pub use marks::{DEFAULT_MAX_RANGE_MARKS, Marks, build_marks, build_marks_capped};
pub use request::{
    CompiledSearch, DB_ID_KEY, RequestCompiler, SearchRequest, TERMS_KEY, TERMS_LOGIC_KEY,
};
pub use schema::{DatasetList, DatasetMeta, DateRange, Schema};
pub use values::{FieldValue, FormValues, tokenize};
