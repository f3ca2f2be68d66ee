//! Form state for the currently selected dataset.
//!
//! Each dataset selection starts a new generation. Schema responses are
//! applied only when they carry the current generation, so a slow response
//! for an earlier selection can never replace the fields of a later one.

use crate::config::FormConfig;
use crate::error::{FetchError, Result};
use crate::fetcher::SchemaFetcher;
use crate::fields::{FieldSet, synthesize};
use crate::request::{DB_ID_KEY, RequestCompiler, SearchRequest, TERMS_KEY};
use crate::schema::{DatasetList, DatasetMeta, Schema};
use crate::values::{FieldValue, FormValues};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Immutable snapshot of everything the form currently shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub generation: u64,
    pub db_id: Option<String>,
    pub fields: Arc<FieldSet>,
    pub values: FormValues,
    /// Set when the schema fetch for this generation failed
    pub last_error: Option<FetchError>,
    /// False until the schema for this generation has been applied
    pub loaded: bool,
}

/// Handle for one in-flight schema fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub db_id: String,
}

/// What happened to a schema response handed to [`SearchForm::apply_schema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Fields were rebuilt from the response
    Applied,
    /// A newer selection superseded the ticket; the response was dropped
    Stale,
}

/// DOM-level event that triggered a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Change,
    Click,
    KeyPress,
}

/// Where in the search box the submission came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Clear,
    Input,
}

/// Everything handed to the caller on submit
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSubmission {
    pub query_text: String,
    pub request: SearchRequest,
    /// Snapshot the request was compiled from
    pub form: Arc<FormState>,
    pub trigger_event: Option<TriggerEvent>,
    pub trigger_source: Option<TriggerSource>,
    pub dataset: Option<DatasetMeta>,
}

pub trait SearchSubmitHandler {
    fn on_search_submit(&mut self, submission: SearchSubmission);
}

impl<F> SearchSubmitHandler for F
where
    F: FnMut(SearchSubmission),
{
    fn on_search_submit(&mut self, submission: SearchSubmission) {
        self(submission);
    }
}

/// Owner of the form state. Not shared across threads.
pub struct SearchForm {
    config: FormConfig,
    compiler: RequestCompiler,
    datasets: DatasetList,
    state: Arc<FormState>,
}

impl SearchForm {
    pub fn new(config: FormConfig) -> Self {
        Self {
            compiler: RequestCompiler::new(&config),
            config,
            datasets: DatasetList::default(),
            state: Arc::new(FormState::default()),
        }
    }

    pub fn state(&self) -> Arc<FormState> {
        Arc::clone(&self.state)
    }

    pub fn datasets(&self) -> &DatasetList {
        &self.datasets
    }

    pub fn selected_db_id(&self) -> Option<&str> {
        self.state.db_id.as_deref()
    }

    /// Replace the dataset list and select its first entry.
    ///
    /// Returns `None` when the list is empty; the form is then cleared.
    pub fn set_datasets(&mut self, datasets: DatasetList) -> Option<FetchTicket> {
        self.datasets = datasets;
        let Some(default_id) = self.datasets.default_dataset().map(|meta| meta.id.clone()) else {
            info!("Dataset list is empty, clearing form");
            self.state = Arc::new(FormState {
                generation: self.state.generation + 1,
                ..FormState::default()
            });
            return None;
        };
        Some(self.select_dataset(&default_id))
    }

    /// Start a new generation for `db_id`.
    ///
    /// Fields and every entered value are discarded immediately; the schema
    /// for the returned ticket must be fetched and passed to
    /// [`SearchForm::apply_schema`].
    pub fn select_dataset(&mut self, db_id: &str) -> FetchTicket {
        let generation = self.state.generation + 1;
        info!("Selecting dataset {db_id} (generation {generation})");

        let values = FormValues::new().with(DB_ID_KEY, FieldValue::text(db_id));
        self.state = Arc::new(FormState {
            generation,
            db_id: Some(db_id.to_string()),
            fields: Arc::new(FieldSet::default()),
            values,
            last_error: None,
            loaded: false,
        });

        FetchTicket {
            generation,
            db_id: db_id.to_string(),
        }
    }

    /// Apply the outcome of the fetch started by `ticket`.
    ///
    /// Stale tickets are ignored. A failed fetch leaves an empty field set,
    /// records the failure on the state and is returned as an error. A schema
    /// that cannot be turned into fields is an error as well.
    pub fn apply_schema(
        &mut self,
        ticket: &FetchTicket,
        result: std::result::Result<Schema, FetchError>,
    ) -> Result<ApplyOutcome> {
        if ticket.generation != self.state.generation {
            debug!(
                "Discarding stale schema for {} (generation {}, current {})",
                ticket.db_id, ticket.generation, self.state.generation
            );
            return Ok(ApplyOutcome::Stale);
        }

        let mut next = FormState::clone(&self.state);
        next.loaded = true;
        match result {
            Ok(schema) => {
                let fields = synthesize(&schema, &self.config)?;
                info!(
                    "Loaded {} fields for dataset {}",
                    fields.len(),
                    ticket.db_id
                );
                next.fields = Arc::new(fields);
                next.last_error = None;
                self.state = Arc::new(next);
                Ok(ApplyOutcome::Applied)
            }
            Err(err) => {
                warn!("Schema fetch for {} failed: {err}", ticket.db_id);
                next.fields = Arc::new(FieldSet::default());
                next.last_error = Some(err.clone());
                self.state = Arc::new(next);
                Err(err.into())
            }
        }
    }

    /// Select `db_id`, fetch its schema and apply it
    pub async fn switch_dataset<F>(&mut self, fetcher: &F, db_id: &str) -> Result<ApplyOutcome>
    where
        F: SchemaFetcher + ?Sized,
    {
        let ticket = self.select_dataset(db_id);
        let result = fetcher.fetch(db_id).await;
        self.apply_schema(&ticket, result)
    }

    /// Set a single form value. Values are dropped on the next dataset change.
    pub fn set_value(&mut self, key: impl Into<String>, value: FieldValue) {
        Arc::make_mut(&mut self.state).values.insert(key, value);
    }

    /// Compile the current values into a request for the selected dataset.
    ///
    /// `query_text` is the search box content and is compiled as the `terms`
    /// value of this request only; form state is left untouched.
    /// Returns `None` while no dataset is selected.
    pub fn submit<H>(
        &self,
        query_text: &str,
        trigger_event: Option<TriggerEvent>,
        trigger_source: Option<TriggerSource>,
        handler: &mut H,
    ) -> Option<SearchRequest>
    where
        H: SearchSubmitHandler + ?Sized,
    {
        let db_id = self.state.db_id.as_deref()?;
        let values = self
            .state
            .values
            .clone()
            .with(TERMS_KEY, FieldValue::text(query_text));

        let compiled = self
            .compiler
            .compile_with_meta(&values, db_id, &self.datasets);
        let request = compiled.request.clone();
        handler.on_search_submit(SearchSubmission {
            query_text: query_text.to_string(),
            request: compiled.request,
            form: self.state(),
            trigger_event,
            trigger_source,
            dataset: compiled.dataset,
        });
        Some(request)
    }
}
