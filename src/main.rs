use anyhow::{Context, Result};
use cea_results_processor::{
    CategoryConfig, CombineResults, LogDiagnostics, PipelineConfig, INDEX_COLUMN,
    SCENARIO_COLUMN,
};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use polars::prelude::*;
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cea_results_processor")]
#[command(about = "Combine per-scenario hull geometry and annual demand into one building table")]
struct Args {
    /// Simulation run directory (one subdirectory per scenario)
    simulation_dir: PathBuf,

    /// JSON pipeline configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file (stdout for CSV when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Reference area for area-specific demand
    #[arg(long)]
    area_col: Option<String>,

    /// Reference area for compactness ratios
    #[arg(long)]
    ref_col: Option<String>,

    /// Compactness category bin edges, e.g. 0,0.5,1,10
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    bins: Vec<f64>,

    /// Compactness category labels, one fewer than bin edges
    #[arg(long, value_delimiter = ',')]
    labels: Vec<String>,

    /// Log severity threshold (RUST_LOG overrides)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Csv,
    Parquet,
    Summary,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .parse_default_env()
        .init();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(area_col) = &args.area_col {
        config.area_col = area_col.clone();
    }
    if let Some(ref_col) = &args.ref_col {
        config.compactness_ref = ref_col.clone();
    }
    if !args.bins.is_empty() || !args.labels.is_empty() {
        let mut category = config.category.take().unwrap_or_default();
        category.bins = args.bins.clone();
        category.labels = args.labels.clone();
        config.category = Some(category);
    }

    info!("Combining results in {}", args.simulation_dir.display());
    // RUST_LOG may have raised the level beyond --log-level
    let diag = LogDiagnostics::new(log::max_level());
    let mut combined = CombineResults::new(config.clone(), &diag).run(&args.simulation_dir)?;

    match args.format {
        OutputFormat::Csv => match &args.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                CsvWriter::new(file).finish(&mut combined)?;
                info!("Wrote {} rows to {}", combined.height(), path.display());
            }
            None => CsvWriter::new(std::io::stdout()).finish(&mut combined)?,
        },
        OutputFormat::Parquet => {
            let path = match &args.output {
                Some(path) => path,
                None => anyhow::bail!("--output is required for parquet"),
            };
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            ParquetWriter::new(file).finish(&mut combined)?;
            info!("Wrote {} rows to {}", combined.height(), path.display());
        }
        OutputFormat::Summary => print_summary(&combined, config.category.as_ref())?,
    }

    Ok(())
}

fn print_summary(df: &DataFrame, category: Option<&CategoryConfig>) -> Result<()> {
    println!("Simulation Results Summary");
    println!("==========================");
    println!("Rows: {}", df.height());
    println!("Columns: {}", df.width());
    println!("Buildings: {}", df.column(INDEX_COLUMN)?.n_unique()?);

    let per_scenario = rows_by(df, SCENARIO_COLUMN)?;
    println!();
    println!("Rows by scenario:");
    println!("{}", per_scenario);

    let missing_hull = df.column("hull_ag")?.null_count();
    if missing_hull > 0 {
        println!();
        println!("Rows without geometry: {}", missing_hull);
    }

    if let Some(category) = category {
        println!();
        println!("{}:", category.dest_col);
        println!("{}", rows_by(df, &category.dest_col)?);
    }
    Ok(())
}

/// Row count per distinct value of `column`, in first-seen order.
fn rows_by(df: &DataFrame, column: &str) -> Result<DataFrame> {
    Ok(df
        .clone()
        .lazy()
        .group_by_stable([col(column)])
        .agg([col(INDEX_COLUMN).count().alias("rows")])
        .collect()?)
}
