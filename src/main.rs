//! citeview - exploratory distribution reports for the AI-overview
//! citation search study.
//!
//! Loads the task-level and user-level study tables, filters task
//! observations by treatment, optionally aggregates them per participant,
//! and writes a Markdown or JSON report of variable distributions.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (bad configuration, missing column, unreadable CSV, ...)

mod analysis;
mod catalog;
mod cli;
mod config;
mod data;
mod error;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use data::{DataSource, StudyData};
use models::{Grouping, Report, ReportMetadata};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("citeview v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("Analysis failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .citeview.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to choose input files, treatment filters, grouping and variables.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, filter, aggregate and report.
fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(args)?;
    config.merge_with_args(args);

    // Reject bad names before touching the data files.
    let settings = config.settings().context("Invalid analysis settings")?;

    let source = DataSource::from(&config.data);
    println!("📥 Loading study data...");
    println!("   Tasks: {}", source.task_data.display());
    println!("   Users: {}", source.user_data.display());
    let data = StudyData::load(&source)?;

    if args.dry_run {
        handle_dry_run(&data);
        return Ok(());
    }

    println!("\n🔬 Summarizing distributions...");
    let analysis = analysis::analyze(&data, &settings)?;

    let (citation_design, context_stakeness, source_reliability) = settings.filter.labels();
    let metadata = ReportMetadata {
        task_data: source.task_data.display().to_string(),
        user_data: source.user_data.display().to_string(),
        analysis_date: Utc::now(),
        citation_design: citation_design.into_iter().map(String::from).collect(),
        context_stakeness: context_stakeness.into_iter().map(String::from).collect(),
        source_reliability: source_reliability.into_iter().map(String::from).collect(),
        grouping: settings.grouping,
        method: (settings.grouping != Grouping::None).then_some(settings.method),
        split_by: settings.split_by,
        task_rows_loaded: analysis.task_rows_loaded,
        task_rows_filtered: analysis.task_rows_filtered,
        task_rows_analyzed: analysis.task_rows_analyzed,
        participants: data.users.n_rows(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    if analysis.task_rows_filtered == 0 {
        warn!("The treatment filter selected no task observations");
    }

    let report = Report {
        metadata,
        sections: analysis.sections,
    };

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = Path::new(&config.report.output);
    std::fs::write(output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    println!("\n📊 Summary:");
    println!(
        "   Task rows: {} loaded | {} after filtering | {} analyzed",
        report.metadata.task_rows_loaded,
        report.metadata.task_rows_filtered,
        report.metadata.task_rows_analyzed
    );
    let variables: usize = report.sections.iter().map(|s| s.distributions.len()).sum();
    println!("   Variables: {}", variables);
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
    println!("\n✅ Report saved to: {}", output_path.display());

    Ok(())
}

/// Handle --dry-run: list the loaded columns and exit.
fn handle_dry_run(data: &StudyData) {
    println!("\n🔍 Dry run: loaded tables (no report written)\n");

    for (name, table) in [("Task-level", &data.tasks), ("User-level", &data.users)] {
        println!(
            "   {} table: {} rows x {} columns",
            name,
            table.n_rows(),
            table.n_columns()
        );
        for column in data::describe(table) {
            println!(
                "     📄 {} ({}, {} missing)",
                column.name, column.kind, column.missing
            );
        }
        println!();
    }

    let levels = [
        (catalog::Level::Task, &data.tasks),
        (catalog::Level::Survey, &data.users),
        (catalog::Level::Demographic, &data.users),
    ];
    for (level, table) in levels {
        let absent: Vec<_> = catalog::variables(level)
            .into_iter()
            .filter(|v| !table.has_column(&v.column))
            .collect();
        for variable in absent {
            println!(
                "   ⚠️  {:?} variable '{}' has no '{}' column",
                level, variable.label, variable.column
            );
        }
    }

    println!("\n✅ Dry run complete.");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
