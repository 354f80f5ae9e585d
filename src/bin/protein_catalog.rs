use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use protein_catalog::app::App;
use protein_catalog::config::{ConfigLoader, Overrides, ResolvedConfig};
use protein_catalog::error::CatalogError;
use protein_catalog::output::{JsonOutput, LogProgress};
use protein_catalog::service;
use protein_catalog::store::Store;

#[derive(Parser)]
#[command(name = "protein-catalog")]
#[command(about = "Load protein dataset tables into a catalog and serve it over HTTP")]
#[command(version, author)]
struct Cli {
    /// Config file (defaults to protein-catalog.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Directory of dataset files to ingest
    #[arg(long, global = true)]
    source_dir: Option<String>,

    /// Store connection string, e.g. sqlite://AdditionalData.db
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Reset the catalog, ingest datasets, then serve HTTP (default)")]
    Serve(ServeArgs),
    #[command(about = "Reset the catalog, ingest datasets and print a JSON report")]
    Ingest,
}

#[derive(Args, Default)]
struct ServeArgs {
    #[arg(long)]
    bind: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CatalogError) -> u8 {
    match error {
        CatalogError::IngestionFormat { .. }
        | CatalogError::ConfigRead(_)
        | CatalogError::ConfigParse(_)
        | CatalogError::InvalidDatabaseUrl(_) => 2,
        CatalogError::Store(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Serve(ServeArgs::default()));
    let bind = match &command {
        Commands::Serve(args) => args.bind.clone(),
        Commands::Ingest => None,
    };
    let flags = Overrides {
        source_dir: cli.source_dir,
        database: cli.database,
        bind,
    };
    let overrides = Overrides::from_env().merge(flags);
    let config = ConfigLoader::resolve(cli.config.as_deref(), overrides)?;

    let store = Store::open(&config.database)?;
    let app = App::new(store);

    match command {
        Commands::Serve(_) => run_serve(app, &config),
        Commands::Ingest => run_ingest(app, &config),
    }
}

fn run_ingest(app: App, config: &ResolvedConfig) -> miette::Result<()> {
    let report = app.reset_and_load(&config.source_dir, &config.layout, &JsonOutput)?;
    JsonOutput::print_ingest(&report).into_diagnostic()?;
    Ok(())
}

fn run_serve(app: App, config: &ResolvedConfig) -> miette::Result<()> {
    let report = app.reset_and_load(&config.source_dir, &config.layout, &LogProgress)?;
    info!(
        datasets = report.files.len(),
        proteins = report.total_inserted,
        "catalog loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    runtime
        .block_on(service::serve(app, &config.bind))
        .into_diagnostic()?;
    Ok(())
}
