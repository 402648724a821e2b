// followup: validates a procurement request export and prints the
// dashboard figures for an optional filter.
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use engine::config::PipelineSettings;
use engine::reports::{Granularity, RecordFilter, RecordView};
use engine::services::followup_service::DashboardReport;
use engine::{FollowupService, PipelineError};
use shared::utils::brazilian_format::{format_currency, format_decimal};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "followup", about = "Validates a fleet procurement request export and summarizes it")]
struct Args {
    /// JSON settings file; the embedded defaults are used otherwise
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input export, overrides `source_path`
    #[arg(long)]
    source: Option<PathBuf>,

    /// Where the cleaned copy is written, overrides `cleaned_path`
    #[arg(long)]
    cleaned: Option<PathBuf>,

    /// Start of the request-date range (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End of the request-date range (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Categorical filter, repeatable: --select TIPO=PNEU
    #[arg(long = "select", value_parser = parse_selection)]
    selections: Vec<(String, String)>,

    /// Histogram granularity: D, W or M
    #[arg(long, default_value = "M")]
    granularity: Granularity,

    /// SLA threshold in days, overrides `sla_threshold_days`
    #[arg(long)]
    sla: Option<u32>,

    /// Write the filtered rows to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print up to N filtered rows as JSON lines after the report
    #[arg(long)]
    rows: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn parse_selection(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => Ok((column.trim().to_string(), value.to_string())),
        _ => Err(format!("expected COLUMN=VALUE, got '{}'", s)),
    }
}

// An open-ended range is closed with the dataset's own date bounds. Without
// any dates the given side closes it, so the range still applies.
fn resolve_date_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    bounds: Option<(NaiveDate, NaiveDate)>,
) -> Option<(NaiveDate, NaiveDate)> {
    let from = from.or(bounds.map(|b| b.0));
    let to = to.or(bounds.map(|b| b.1));
    match (from, to) {
        (Some(from), Some(to)) => Some((from, to)),
        (Some(day), None) | (None, Some(day)) => Some((day, day)),
        (None, None) => None,
    }
}

fn load_settings(args: &Args) -> Result<PipelineSettings, PipelineError> {
    let mut settings = match &args.config {
        Some(path) => PipelineSettings::from_json_file(path)?,
        None => PipelineSettings::load_default()?,
    };
    if let Some(source) = &args.source {
        settings.source_path = source.clone();
    }
    if let Some(cleaned) = &args.cleaned {
        settings.cleaned_path = cleaned.clone();
    }
    if let Some(sla) = args.sla {
        settings.sla_threshold_days = sla;
    }
    settings.validate()?;
    Ok(settings)
}

fn run(args: Args) -> Result<(), PipelineError> {
    let settings = load_settings(&args)?;
    let service = FollowupService::new(settings);

    let mut filter = RecordFilter::new();
    for (column, value) in &args.selections {
        filter = filter.select(column, [value.clone()]);
    }

    if args.from.is_some() || args.to.is_some() {
        let dataset = service.load_dataset()?;
        let bounds = RecordView::all(&dataset.records).date_bounds();
        if bounds.is_none() {
            tracing::warn!("No request dates in the dataset; the date range matches no rows");
        }
        if let Some((from, to)) = resolve_date_range(args.from, args.to, bounds) {
            filter = filter.with_date_range(from, to);
        }
    }

    let report = service.build_report(&filter, args.granularity)?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| PipelineError::ProcessingError(format!("Failed to render report: {}", e)))?;
        println!("{}", rendered);
    } else {
        print_report(&report);
    }

    if let Some(limit) = args.rows {
        for row in service.detail_rows(&filter, Some(limit))? {
            println!("{}", row);
        }
    }

    if let Some(dest) = &args.export {
        let written = service.export_filtered(&filter, dest)?;
        tracing::info!(path = %dest.display(), rows = written, "Filtered rows exported");
    }
    Ok(())
}

fn print_report(report: &DashboardReport) {
    let load = &report.load;
    println!("CSV");
    println!("  Separador: {}", load.delimiter);
    println!("  Colunas detectadas: {}", load.expected_columns);
    println!("  Linhas válidas: {}", load.valid_rows);
    println!("  Linhas inválidas: {}", load.invalid_rows);
    if load.coercion_failures > 0 {
        println!("  Células não convertidas: {}", load.coercion_failures);
    }

    if !report.filter_options.is_empty() {
        println!("Filtros disponíveis");
        for (column, values) in &report.filter_options {
            println!("  {}: {} valores", column, values.len());
        }
    }

    let kpis = &report.kpis;
    println!("KPIs");
    match kpis.records_previous {
        Some(prev) => println!("  Registros: {} ({:+})", kpis.records, kpis.records as i64 - prev as i64),
        None => println!("  Registros: {}", kpis.records),
    }
    println!("  Solicitados (distintos): {}", kpis.requested_distinct);
    println!("  Pendentes (distintos): {}", kpis.pending_distinct);
    match kpis.sla_ratio {
        Some(ratio) => println!("  SLA (<={}d): {}%", kpis.sla_threshold_days, format_decimal(ratio * 100.0, 1)),
        None => println!("  SLA (<={}d): n/d", kpis.sla_threshold_days),
    }
    if kpis.pending_alert {
        println!("  Atenção: {}% pendentes", format_decimal(kpis.pending_ratio * 100.0, 1));
    }

    println!("Resumo por tipo");
    for group in &report.by_category {
        println!(
            "  {:<20} {:>10} {:>18}",
            group.key,
            format_decimal(group.pending_qty, 0),
            format_currency(group.value)
        );
    }

    println!("Top equipamentos por valor");
    for group in &report.top_equipment {
        println!("  {:<20} {:>18}", group.key, format_currency(group.value));
    }

    println!("Pedidos por período ({:?})", report.granularity);
    for period in &report.periods {
        println!("  {} {}", period.period, period.count);
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so that --json output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "followup failed");
            ExitCode::from(e.exit_code())
        }
    }
}
