//! wgiscraper CLI - download the Worldwide Governance Indicators and
//! reshape them into a long table.
//!
//! Usage:
//!   wgiscraper load [--start-year 2020] [--end-year 2022] [--indicator va] [--output wgi.parquet]
//!   wgiscraper load --archive wgidataset_excel.zip --variable estimate --format csv
//!   wgiscraper indicators

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wgiscraper::{
    fetch::{self, Archive, RetryPolicy},
    output::{self, OutputFormat},
    Config, FilterOptions, IndicatorCatalog, LoadOptions, Variable, WorkbookSource,
};

#[derive(Parser)]
#[command(name = "wgiscraper")]
#[command(about = "Download and reshape the World Bank Worldwide Governance Indicators")]
#[command(version)]
struct Cli {
    /// YAML config file (falls back to $WGI_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the dataset and print or save the long table
    Load(LoadArgs),

    /// List the indicator codes and their sheets
    Indicators,
}

#[derive(clap::Args)]
struct LoadArgs {
    /// Override the download URL
    #[arg(long, conflicts_with_all = ["archive", "workbook"])]
    url: Option<String>,

    /// Use a local archive (zip or extracted directory) instead of downloading
    #[arg(long, conflicts_with = "workbook")]
    archive: Option<PathBuf>,

    /// Read this workbook directly
    #[arg(long)]
    workbook: Option<PathBuf>,

    #[arg(long)]
    start_year: Option<i32>,

    #[arg(long)]
    end_year: Option<i32>,

    /// Country name or ISO3 code (repeatable)
    #[arg(long = "country")]
    countries: Vec<String>,

    /// Indicator code: va, pv, ge, rq, rl, cc (repeatable)
    #[arg(long = "indicator")]
    indicators: Vec<String>,

    /// Variable to keep (repeatable)
    #[arg(long = "variable", value_enum)]
    variables: Vec<VariableArg>,

    /// Keep rows whose value is missing
    #[arg(long)]
    keep_nulls: bool,

    /// Output file; prints CSV to stdout when absent
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (defaults to the output file's extension, else parquet)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum VariableArg {
    Estimate,
    Stddev,
    Nsource,
    Pctrank,
    Pctranklower,
    Pctrankupper,
}

impl From<VariableArg> for Variable {
    fn from(arg: VariableArg) -> Self {
        match arg {
            VariableArg::Estimate => Variable::Estimate,
            VariableArg::Stddev => Variable::StdDev,
            VariableArg::Nsource => Variable::NSource,
            VariableArg::Pctrank => Variable::PctRank,
            VariableArg::Pctranklower => Variable::PctRankLower,
            VariableArg::Pctrankupper => Variable::PctRankUpper,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Parquet,
    Csv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Parquet => OutputFormat::Parquet,
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn non_empty<T>(v: Vec<T>) -> Option<Vec<T>> {
    (!v.is_empty()).then_some(v)
}

impl LoadArgs {
    fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            start_year: self.start_year,
            end_year: self.end_year,
            countries: non_empty(self.countries.clone()),
            indicators: non_empty(self.indicators.clone()),
            variables: non_empty(self.variables.iter().map(|&v| v.into()).collect()),
            drop_nulls: !self.keep_nulls,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wgiscraper=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let catalog = IndicatorCatalog::wgi();

    match cli.command {
        Commands::Indicators => {
            for ind in catalog.iter() {
                println!("{}\t{}\t{}", ind.code, ind.sheet, ind.name);
            }
            Ok(())
        }
        Commands::Load(args) => run_load(cfg, catalog, args).await,
    }
}

async fn run_load(mut cfg: Config, catalog: IndicatorCatalog, args: LoadArgs) -> Result<()> {
    if let Some(url) = &args.url {
        cfg.url = url.clone();
    }
    info!(url = %cfg.url, "startup");

    // ─── 2) acquire the workbook once ────────────────────────────────
    let retry = RetryPolicy::from(&cfg);
    let _archive;
    let source = match (&args.workbook, &args.archive) {
        (Some(path), _) => WorkbookSource::new(path.clone()),
        (None, Some(path)) => {
            let archive = Archive::open_local(path)?;
            let wb = archive.workbook(&cfg.workbook_pattern)?;
            _archive = archive;
            wb
        }
        (None, None) => {
            let client = fetch::build_client(&retry)?;
            let archive = Archive::acquire(&client, &cfg.url, &retry).await?;
            let wb = archive.workbook(&cfg.workbook_pattern)?;
            _archive = archive;
            wb
        }
    };

    // ─── 3) reshape every indicator and filter ───────────────────────
    let load_opts = LoadOptions::from(&cfg);
    let filter_opts = args.filter_options();
    let table = tokio::task::spawn_blocking(move || {
        wgiscraper::load_all(&source, &catalog, &load_opts, &filter_opts)
    })
    .await??;

    // ─── 4) emit ─────────────────────────────────────────────────────
    match &args.output {
        Some(path) => {
            let format = args
                .format
                .map(OutputFormat::from)
                .or_else(|| OutputFormat::from_path(path))
                .unwrap_or(OutputFormat::Parquet);
            output::write_table(&table, path, format)?;
        }
        None => {
            let stdout = io::stdout().lock();
            match args.format.map(OutputFormat::from) {
                Some(OutputFormat::Json) => output::write_json(&table, stdout)?,
                _ => output::write_csv(&table, stdout)?,
            }
        }
    }

    info!(rows = table.len(), "all done");
    Ok(())
}
