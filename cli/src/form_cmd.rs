use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use portal_search_form::{
    DatasetList, DatasetSource, FieldRole, FieldSet, FieldValue, FormValues, HttpSchemaFetcher,
    Marks, PortalConfig, RequestCompiler, Schema, SearchForm, TERMS_KEY, synthesize,
};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "portal-search", about = "Build dataset search forms and requests")]
pub struct FormCli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: FormCommand,
}

#[derive(Debug, Subcommand)]
pub enum FormCommand {
    /// Synthesize form fields from a schema file
    Fields(FieldsArgs),

    /// Compile submitted form values into a search request
    Compile(CompileArgs),

    /// Fetch a dataset schema from the portal and show its fields
    Fetch(FetchArgs),

    /// List the datasets the portal offers
    Datasets(DatasetsArgs),
}

#[derive(Debug, Parser)]
pub struct FieldsArgs {
    /// Schema JSON as returned by the detail endpoint
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Print descriptors as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct CompileArgs {
    /// Flat form values as a JSON object
    #[arg(long, value_name = "FILE")]
    pub values: PathBuf,

    /// Selected dataset id
    #[arg(long)]
    pub db_id: String,

    /// Dataset list JSON used to resolve the dataset metadata
    #[arg(long, value_name = "FILE")]
    pub datasets: Option<PathBuf>,

    /// Search box text; replaces any `terms` value in the file
    #[arg(short, long, value_name = "TEXT")]
    pub query: Option<String>,
}

#[derive(Debug, Parser)]
pub struct FetchArgs {
    /// Dataset id to fetch
    #[arg(long)]
    pub db_id: String,

    /// Portal base URL, overrides the configuration
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Print descriptors as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct DatasetsArgs {
    /// Portal base URL, overrides the configuration
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Print the list as JSON
    #[arg(long)]
    pub json: bool,
}

impl FormCli {
    pub async fn run(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        match self.command {
            FormCommand::Fields(args) => run_fields(&config, args),
            FormCommand::Compile(args) => run_compile(&config, args),
            FormCommand::Fetch(args) => run_fetch(config, args).await,
            FormCommand::Datasets(args) => run_datasets(config, args).await,
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PortalConfig> {
    match path {
        Some(path) => PortalConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(PortalConfig::default()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid {what} in {}", path.display()))
}

fn run_fields(config: &PortalConfig, args: FieldsArgs) -> Result<()> {
    let schema: Schema = read_json(&args.schema, "schema")?;
    let fields = synthesize(&schema, &config.form).context("Failed to synthesize fields")?;
    print_fields(&fields, args.json)
}

fn run_compile(config: &PortalConfig, args: CompileArgs) -> Result<()> {
    let mut values: FormValues = read_json(&args.values, "form values")?;
    if let Some(query) = args.query {
        values.insert(TERMS_KEY, FieldValue::Text(query));
    }
    let datasets: DatasetList = match &args.datasets {
        Some(path) => read_json(path, "dataset list")?,
        None => DatasetList::default(),
    };

    debug!("Compiling {} values for dataset {}", values.len(), args.db_id);
    let compiled =
        RequestCompiler::new(&config.form).compile_with_meta(&values, &args.db_id, &datasets);
    println!("{}", serde_json::to_string_pretty(&compiled)?);
    Ok(())
}

fn fetcher_for(
    mut config: PortalConfig,
    base_url: Option<String>,
) -> Result<(PortalConfig, HttpSchemaFetcher)> {
    if let Some(base_url) = base_url {
        config.fetcher.base_url = base_url;
    }
    let fetcher =
        HttpSchemaFetcher::new(&config.fetcher).context("Invalid fetcher configuration")?;
    Ok((config, fetcher))
}

async fn run_fetch(config: PortalConfig, args: FetchArgs) -> Result<()> {
    let (config, fetcher) = fetcher_for(config, args.base_url)?;
    let mut form = SearchForm::new(config.form);
    form.switch_dataset(&fetcher, &args.db_id)
        .await
        .with_context(|| format!("Failed to load fields for dataset {}", args.db_id))?;
    print_fields(&form.state().fields, args.json)
}

async fn run_datasets(config: PortalConfig, args: DatasetsArgs) -> Result<()> {
    let (_, fetcher) = fetcher_for(config, args.base_url)?;
    let datasets = fetcher
        .list_datasets()
        .await
        .context("Failed to list datasets")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&datasets)?);
        return Ok(());
    }
    if datasets.is_empty() {
        println!("{} No datasets available", "✗".bright_red());
        return Ok(());
    }
    for (i, meta) in datasets.iter().enumerate() {
        let marker = if i == 0 { "*" } else { " " };
        println!("{marker} {} {}", meta.id.bright_cyan(), meta.name);
    }
    Ok(())
}

fn print_fields(fields: &FieldSet, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(fields)?);
        return Ok(());
    }

    for field in fields.fields() {
        let detail = match field.role {
            FieldRole::Category => field
                .options
                .as_deref()
                .map(|options| options.join(", "))
                .unwrap_or_default(),
            FieldRole::Range => match field.bounds {
                Some(range) => format!(
                    "{range} ({} marks)",
                    field.marks.as_ref().map_or(0, Marks::len)
                ),
                None => "disabled".to_string(),
            },
            FieldRole::Identifier | FieldRole::Text => String::new(),
        };
        println!(
            "{} {:<10} {} {}",
            "▶".bright_blue(),
            field.role,
            field.key.bright_cyan(),
            detail.bright_black()
        );
    }
    Ok(())
}
