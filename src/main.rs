use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{json, Value};
use sheet_insight::data::DEFAULT_SHEET_NAME;
use sheet_insight::external::repair_report_text;
use sheet_insight::graph::{render_chart, MAX_CANVAS_SIDE};
use sheet_insight::sample::mock_table;
use sheet_insight::{AnalysisConfig, Analyzer, OutputFormat, RenderOptions, Report, TableContent};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sheet-insight")]
#[command(about = "Rule-based insight reports and charts for spreadsheet tables", long_about = None)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a table (CSV or {sheet_name, data} JSON) and print a report
    Analyze(AnalyzeArgs),
    /// Repair a report produced elsewhere, e.g. a fenced model reply
    Repair {
        /// Report file; stdin when absent
        file: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Print a canned sample table matching a description
    Sample {
        description: String,
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Input file; stdin when absent
    file: Option<PathBuf>,

    /// Input format; inferred from the file extension, JSON for stdin
    #[arg(long, value_enum)]
    input_format: Option<InputFormat>,

    /// Sheet name to report (CSV defaults to the file stem)
    #[arg(long)]
    sheet_name: Option<String>,

    /// JSON file with analysis settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also render the primary chart (.png or .svg)
    #[arg(long)]
    chart_out: Option<PathBuf>,

    #[arg(long, default_value_t = 800, value_parser = clap::value_parser!(u32).range(1..=MAX_CANVAS_SIDE as i64))]
    width: u32,

    #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u32).range(1..=MAX_CANVAS_SIDE as i64))]
    height: u32,

    #[arg(long)]
    pretty: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum InputFormat {
    Csv,
    Json,
}

/// RUST_LOG or `warn` by default; any `-v` switches to `debug`
fn log_filter(verbose: u8) -> EnvFilter {
    if verbose > 0 {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

fn init_tracing(verbose: u8) {
    let filter = log_filter(verbose);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Analyze(args) => {
            let report = analyze(&args)?;
            print_json(&report, args.pretty)?;
            if !report.is_success() {
                std::process::exit(1);
            }
        }
        Command::Repair { file, pretty } => {
            let text = read_input(file.as_deref())?;
            let report = repair_report_text(&text).context("Failed to repair report")?;
            print_json(&report, pretty)?;
        }
        Command::Sample { description, pretty } => {
            print_json(&mock_table(&description), pretty)?;
        }
    }

    Ok(())
}

fn analyze(args: &AnalyzeArgs) -> Result<Report> {
    // 1. Load settings
    let config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    let analyzer = Analyzer::with_config(config);

    // 2. Read the table
    let format = args.input_format.unwrap_or_else(|| match &args.file {
        Some(path) if has_extension(path, "csv") => InputFormat::Csv,
        _ => InputFormat::Json,
    });
    let text = read_input(args.file.as_deref())?;

    let report = match format {
        InputFormat::Csv => {
            let sheet_name = args
                .sheet_name
                .clone()
                .or_else(|| {
                    args.file
                        .as_ref()
                        .and_then(|p| p.file_stem())
                        .map(|s| s.to_string_lossy().into_owned())
                })
                .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());
            let table = TableContent::from_csv(text.as_bytes(), sheet_name)
                .context("Failed to parse CSV input")?;
            info!(rows = table.data.len(), "loaded CSV table");
            analyzer.analyze(&table)
        }
        InputFormat::Json => {
            let mut value: Value =
                serde_json::from_str(&text).context("Failed to parse JSON input")?;
            if let Some(name) = &args.sheet_name {
                value = with_sheet_name(value, name);
            }
            info!("loaded JSON table");
            analyzer.analyze_json(&value)
        }
    };

    // 3. Render the primary chart on request
    if let Some(out) = &args.chart_out {
        match report.visualization_data.first() {
            Some(chart) => {
                let options = RenderOptions {
                    width: args.width,
                    height: args.height,
                    format: OutputFormat::from_path(out),
                };
                let bytes = render_chart(chart, &options).context("Failed to render chart")?;
                fs::write(out, bytes)
                    .with_context(|| format!("Failed to write chart to {}", out.display()))?;
                info!(path = %out.display(), "wrote chart");
            }
            None => warn!("report has no chart to render"),
        }
    }

    Ok(report)
}

/// Set the sheet name on a `{sheet_name, data}` object, wrapping a bare row array
fn with_sheet_name(value: Value, name: &str) -> Value {
    match value {
        Value::Object(mut obj) => {
            obj.insert("sheet_name".to_string(), Value::from(name));
            Value::Object(obj)
        }
        Value::Array(rows) => json!({ "sheet_name": name, "data": rows }),
        other => other,
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read from stdin")?;
            Ok(text)
        }
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", text).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
