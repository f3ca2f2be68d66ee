use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use portal_search_form::{
    ApplyOutcome, FetchError, FieldRole, FieldValue, FormConfig, Schema, SchemaFetcher, SearchForm,
    SearchSubmission,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answers every fetch with a schema holding one text field named after the dataset
struct EchoFetcher {
    calls: AtomicUsize,
}

impl EchoFetcher {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SchemaFetcher for EchoFetcher {
    async fn fetch(&self, db_id: &str) -> Result<Schema, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if db_id == "missing" {
            return Err(FetchError::NotFound {
                db_id: db_id.to_string(),
            });
        }
        Ok(Schema {
            text_fields: vec![db_id.to_string()],
            ..Schema::default()
        })
    }
}

fn text_keys(form: &SearchForm) -> Vec<String> {
    form.state()
        .fields
        .by_role(FieldRole::Text)
        .map(|f| f.key.clone())
        .collect()
}

/// Select each dataset in turn without waiting, then apply responses as they
/// arrive. Each selection carries the network latency of its response.
async fn race(
    form: &mut SearchForm,
    fetcher: &EchoFetcher,
    selections: &[(&str, u64)],
) -> Vec<(String, ApplyOutcome)> {
    let mut in_flight = FuturesUnordered::new();
    for (db_id, latency_ms) in selections {
        let ticket = form.select_dataset(db_id);
        let latency = Duration::from_millis(*latency_ms);
        in_flight.push(async move {
            let result = fetcher.fetch(&ticket.db_id).await;
            tokio::time::sleep(latency).await;
            (ticket, result)
        });
    }

    let mut arrivals = Vec::new();
    while let Some((ticket, result)) = in_flight.next().await {
        let outcome = form.apply_schema(&ticket, result).unwrap();
        arrivals.push((format!("{}#{}", ticket.db_id, ticket.generation), outcome));
    }
    arrivals
}

#[tokio::test(start_paused = true)]
async fn test_reversed_arrival_keeps_current_selection() {
    let fetcher = EchoFetcher::new();
    let mut form = SearchForm::new(FormConfig::default());

    let arrivals = race(&mut form, &fetcher, &[("X", 300), ("Y", 200), ("X", 100)]).await;

    assert_eq!(
        arrivals,
        vec![
            ("X#3".to_string(), ApplyOutcome::Applied),
            ("Y#2".to_string(), ApplyOutcome::Stale),
            ("X#1".to_string(), ApplyOutcome::Stale),
        ]
    );
    assert_eq!(form.selected_db_id(), Some("X"));
    assert_eq!(text_keys(&form), vec!["textField-X".to_string()]);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_in_order_arrival_ends_on_latest_response() {
    let fetcher = EchoFetcher::new();
    let mut form = SearchForm::new(FormConfig::default());

    let arrivals = race(&mut form, &fetcher, &[("X", 50), ("Y", 100), ("X", 150)]).await;

    let outcomes: Vec<ApplyOutcome> = arrivals.iter().map(|(_, outcome)| *outcome).collect();
    assert_eq!(
        outcomes,
        vec![ApplyOutcome::Stale, ApplyOutcome::Stale, ApplyOutcome::Applied]
    );
    assert_eq!(text_keys(&form), vec!["textField-X".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_slow_stale_response_cannot_overwrite_fast_one() {
    let fetcher = EchoFetcher::new();
    let mut form = SearchForm::new(FormConfig::default());

    let arrivals = race(&mut form, &fetcher, &[("X", 500), ("Y", 10)]).await;

    assert_eq!(
        arrivals,
        vec![
            ("Y#2".to_string(), ApplyOutcome::Applied),
            ("X#1".to_string(), ApplyOutcome::Stale),
        ]
    );
    assert_eq!(form.selected_db_id(), Some("Y"));
    assert_eq!(text_keys(&form), vec!["textField-Y".to_string()]);
}

#[tokio::test]
async fn test_switch_then_submit_uses_fresh_fields() {
    let fetcher = EchoFetcher::new();
    let mut form = SearchForm::new(FormConfig::default());

    form.switch_dataset(&fetcher, "X").await.unwrap();
    form.set_value("textField-X", FieldValue::text("kept only for X"));

    form.switch_dataset(&fetcher, "Y").await.unwrap();
    form.set_value("textField-Y", FieldValue::text("alpha beta"));

    let mut seen = Vec::new();
    let request = form
        .submit("", None, None, &mut |s: SearchSubmission| seen.push(s.request))
        .unwrap();

    assert_eq!(request.db_id, "Y");
    assert_eq!(request.terms, None);
    let sub_terms = request.sub_terms.unwrap();
    assert_eq!(sub_terms.len(), 1);
    assert_eq!(
        sub_terms.get("Y"),
        Some(&vec!["alpha".to_string(), "beta".to_string()])
    );
    assert_eq!(seen.len(), 1);
}

#[tokio::test]
async fn test_failed_switch_surfaces_error_and_empties_fields() {
    let fetcher = EchoFetcher::new();
    let mut form = SearchForm::new(FormConfig::default());

    form.switch_dataset(&fetcher, "X").await.unwrap();
    assert_eq!(text_keys(&form).len(), 1);

    let err = form.switch_dataset(&fetcher, "missing").await.unwrap_err();
    assert!(err.to_string().contains("missing"));
    assert!(form.state().fields.is_empty());
    assert!(form.state().last_error.is_some());
}
