use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Table};
use shiptrack_core::reports::{collect_reports, write_reports, Reports};
use shiptrack_core::summary::PipelineSummary;
use shiptrack_core::{run_pipeline, warehouse, OutputFormat, ShiptrackConfig};
use shiptrack_parser::ShipmentRecord;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Shipment log cleaning pipeline and reports", long_about = None)]
struct Cli {
    /// TOML file with [pipeline] and [report] tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean the raw shipment log and write the dataset, audit logs and run manifest
    Clean(CleanArgs),
    /// Replace the warehouse table with a cleaned CSV
    Load(LoadArgs),
    /// Print the canned reports, optionally exporting them as CSV
    Report(ReportCommandArgs),
    /// Clean, load and report in one go
    Run(RunArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Csv,
    Parquet,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Parquet => OutputFormat::Parquet,
        }
    }
}

#[derive(Args, Debug, Default)]
struct CleanArgs {
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long = "log-dir")]
    log_dir: Option<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    /// Shortest plausible delivery, in days
    #[arg(long)]
    min_days: Option<i64>,
    /// Longest plausible delivery, in days
    #[arg(long)]
    max_days: Option<i64>,
}

#[derive(Args, Debug, Default)]
struct DatabaseArgs {
    /// Overrides SHIPTRACK_DATABASE_URL / DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,
}

#[derive(Args, Debug, Default)]
struct ReportArgs {
    #[arg(long)]
    sla_days: Option<i64>,
    #[arg(long = "export-dir")]
    export_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct LoadArgs {
    #[command(flatten)]
    database: DatabaseArgs,
    /// Cleaned CSV to load; defaults to the pipeline output path
    #[arg(long)]
    cleaned: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct ReportCommandArgs {
    #[command(flatten)]
    database: DatabaseArgs,
    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    #[command(flatten)]
    clean: CleanArgs,
    #[command(flatten)]
    database: DatabaseArgs,
    #[command(flatten)]
    report: ReportArgs,
}

fn init_tracing(format: LogFormat) {
    let subscriber = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.init(),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ShiptrackConfig> {
    dotenvy::dotenv().ok();
    let mut config = match path {
        Some(path) => ShiptrackConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ShiptrackConfig::default(),
    };
    config.report = config.report.with_env_overrides();
    Ok(config)
}

fn apply_clean_args(config: &mut ShiptrackConfig, args: &CleanArgs) {
    let pipeline = &mut config.pipeline;
    if let Some(input) = &args.input {
        pipeline.input_path = input.clone();
    }
    if let Some(output) = &args.output {
        pipeline.output_path = output.clone();
    }
    if let Some(log_dir) = &args.log_dir {
        pipeline.log_directory = log_dir.clone();
    }
    if let Some(format) = args.format {
        pipeline.output_format = format.into();
    }
    if let Some(min_days) = args.min_days {
        pipeline.duration_band.min_days = min_days;
    }
    if let Some(max_days) = args.max_days {
        pipeline.duration_band.max_days = max_days;
    }
}

fn apply_report_args(config: &mut ShiptrackConfig, database: &DatabaseArgs, report: &ReportArgs) {
    if let Some(url) = &database.database_url {
        config.report.database_url = url.clone();
    }
    if let Some(sla_days) = report.sla_days {
        config.report.sla_days = sla_days;
    }
    if let Some(export_dir) = &report.export_dir {
        config.report.export_directory = Some(export_dir.clone());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Clean(args) => {
            apply_clean_args(&mut config, &args);
            clean(&config)?;
            Ok(())
        }
        Command::Load(args) => {
            apply_report_args(&mut config, &args.database, &ReportArgs::default());
            let cleaned = args
                .cleaned
                .unwrap_or_else(|| config.pipeline.output_path.clone());
            let pool = connect(&config).await?;
            let rows = warehouse::load_cleaned_csv(&pool, &cleaned)
                .await
                .with_context(|| format!("failed to load {}", cleaned.display()))?;
            println!("Loaded {rows} shipments into {}", warehouse::CLEANED_TABLE);
            Ok(())
        }
        Command::Report(args) => {
            apply_report_args(&mut config, &args.database, &args.report);
            let pool = connect(&config).await?;
            report(&pool, &config).await
        }
        Command::Run(args) => {
            apply_clean_args(&mut config, &args.clean);
            apply_report_args(&mut config, &args.database, &args.report);

            let records = clean(&config)?;
            let pool = connect(&config).await?;
            warehouse::load_cleaned(&pool, &records)
                .await
                .context("failed to load cleaned shipments")?;
            report(&pool, &config).await
        }
    }
}

async fn connect(config: &ShiptrackConfig) -> Result<warehouse::DbPool> {
    warehouse::connect(&config.report.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.report.database_url))
}

fn clean(config: &ShiptrackConfig) -> Result<Vec<ShipmentRecord>> {
    let input = config.pipeline.input_path.display();
    let report =
        run_pipeline(&config.pipeline).with_context(|| format!("cleaning {input} failed"))?;
    info!(run_id = %report.run_id, manifest = %report.manifest_path.display(), "run recorded");

    print_summary(&report.summary);
    println!("Cleaned dataset: {}", report.output_path.display());
    for path in &report.audit_files {
        println!("Audit log: {}", path.display());
    }
    Ok(report.records)
}

async fn report(pool: &warehouse::DbPool, config: &ShiptrackConfig) -> Result<()> {
    let reports = collect_reports(pool, &config.report)
        .await
        .context("failed to run report queries")?;
    print_reports(&reports);

    if let Some(directory) = &config.report.export_directory {
        let written = write_reports(&reports, directory)
            .with_context(|| format!("failed to export reports to {}", directory.display()))?;
        println!("Exported {} report tables to {}", written.len(), directory.display());
    }
    Ok(())
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_summary(summary: &PipelineSummary) {
    let mut totals = new_table(vec!["Input", "Surviving", "Removed", "Repaired"]);
    totals.add_row(vec![
        summary.input_rows.to_string(),
        summary.surviving_rows.to_string(),
        summary.removed_rows.to_string(),
        summary.repaired_rows.to_string(),
    ]);
    println!("{totals}");

    let mut rules = new_table(vec!["Rule", "Removed", "Repaired", "Flagged"]);
    for (rule, count) in &summary.rules {
        rules.add_row(vec![
            rule.clone(),
            count.removed.to_string(),
            count.repaired.to_string(),
            count.flagged.to_string(),
        ]);
    }
    println!("{rules}");

    let mut statuses = new_table(vec!["Status", "Shipments"]);
    for (status, count) in &summary.status_counts {
        statuses.add_row(vec![status.clone(), count.to_string()]);
    }
    println!("{statuses}");

    let days = &summary.delivery_days;
    let mut durations = new_table(vec!["Measured", "Mean days", "Min days", "Max days"]);
    durations.add_row(vec![
        days.count.to_string(),
        opt(days.mean.map(|mean| format!("{mean:.2}"))),
        opt(days.min),
        opt(days.max),
    ]);
    println!("{durations}");
}

fn print_reports(reports: &Reports) {
    let totals = &reports.overview.totals;
    let mut overview = new_table(vec![
        "Shipments",
        "Avg days",
        "Avg late days",
        "In transit",
    ]);
    overview.add_row(vec![
        totals.total_shipments.to_string(),
        opt(totals.avg_delivery_days),
        opt(totals.avg_late_delivery_days),
        totals.in_transit_count.to_string(),
    ]);
    println!("{overview}");

    let mut destinations = new_table(vec![
        "Destination",
        "Shipments",
        "Delivered",
        "In transit",
        "Success %",
        "Avg days",
        "Min",
        "Max",
    ]);
    for row in &reports.regional.destination_summary {
        destinations.add_row(vec![
            row.destination_region.clone(),
            row.total_shipments.to_string(),
            row.delivered_shipments.to_string(),
            row.in_transit_shipments.to_string(),
            opt(row.delivery_success_rate),
            opt(row.avg_delivery_days),
            opt(row.min_delivery_days),
            opt(row.max_delivery_days),
        ]);
    }
    println!("{destinations}");

    let mut routes = new_table(vec!["Slowest route", "Avg days", "Fastest route", "Avg days"]);
    let slowest = &reports.regional.slowest_routes;
    let fastest = &reports.regional.fastest_routes;
    for index in 0..slowest.len().max(fastest.len()) {
        let describe = |route: Option<&shiptrack_core::reports::RouteSpeed>| match route {
            Some(route) => (
                format!("{} -> {}", route.origin_region, route.destination_region),
                opt(route.avg_delivery_days),
            ),
            None => (String::new(), String::new()),
        };
        let (slow_name, slow_days) = describe(slowest.get(index));
        let (fast_name, fast_days) = describe(fastest.get(index));
        routes.add_row(vec![slow_name, slow_days, fast_name, fast_days]);
    }
    println!("{routes}");

    let mut holiday = new_table(vec![
        "Holiday",
        "Shipments",
        "Avg days",
        "Success %",
        "In transit",
    ]);
    for row in &reports.holiday.periods {
        holiday.add_row(vec![
            row.holiday_period.clone(),
            row.shipment_volume.to_string(),
            opt(row.avg_delivery_days),
            opt(row.delivery_success_rate),
            row.in_transit_count.to_string(),
        ]);
    }
    println!("{holiday}");
    println!("Holiday delay gap (days): {}", opt(reports.holiday.delay_gap));

    let mut weekly = new_table(vec!["Week", "Shipments", "Avg days", "In transit"]);
    for row in &reports.weekly_trend {
        weekly.add_row(vec![
            row.week_number.clone(),
            row.total_shipments.to_string(),
            opt(row.avg_delivery_days),
            row.in_transit_count.to_string(),
        ]);
    }
    println!("{weekly}");
}
