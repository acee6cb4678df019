use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Month, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;

use crate::core::{
    AnnuityTiming, CrossCheck, MonthOverride, MonthlyPattern, NetRates, Projection, RateInputs,
    ScheduleConfig, compute, cross_check, format_pkr, parse_month, to_crore,
};

const MAX_YEARS: u32 = 40;
const MAX_RETURN_PCT: f64 = 100.0;
const MAX_DEVALUATION_PCT: f64 = 100.0;
const MAX_FEE_TAX_DRAG_PCT: f64 = 20.0;
const MAX_STEP_UP_PCT: f64 = 100.0;
const MAX_MONTHLY_CONTRIBUTION: f64 = 10_000_000.0;
const MAX_LUMP_SUM: f64 = 1_000_000_000.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliAnnuityTiming {
    Due,
    Ordinary,
}

impl From<CliAnnuityTiming> for AnnuityTiming {
    fn from(value: CliAnnuityTiming) -> Self {
        match value {
            CliAnnuityTiming::Due => AnnuityTiming::Due,
            CliAnnuityTiming::Ordinary => AnnuityTiming::Ordinary,
        }
    }
}

impl From<AnnuityTiming> for CliAnnuityTiming {
    fn from(value: AnnuityTiming) -> Self {
        match value {
            AnnuityTiming::Due => CliAnnuityTiming::Due,
            AnnuityTiming::Ordinary => CliAnnuityTiming::Ordinary,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "sip",
    about = "PKR SIP projection: nominal vs devaluation-adjusted value with step-ups and monthly patterns"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Project a monthly investment plan and print the result
    Project(ProjectArgs),
    /// Serve the JSON API
    Serve {
        #[arg(long, env = "SIP_PORT", default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, default_value_t = 100_000.0, help = "Base monthly contribution (PKR)")]
    monthly_contribution: f64,
    #[arg(long, default_value_t = 10, help = "Duration in years (1-40)")]
    years: u32,
    #[arg(long, help = "Duration in months; overrides --years")]
    months: Option<u32>,
    #[arg(
        long,
        default_value_t = 19.85,
        help = "Expected nominal annual return in percent"
    )]
    return_rate: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Annual devaluation / inflation in percent"
    )]
    devaluation: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual fees + tax drag in percent")]
    fee_tax_drag: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Annual step-up in contribution in percent, applied on the anchor month"
    )]
    step_up: f64,
    #[arg(long, default_value_t = 0.0, help = "One-time lump sum at start (PKR)")]
    lump_sum: f64,
    #[arg(
        long,
        default_value = "January",
        help = "Anchor month for annual step-ups (name or 1-12)"
    )]
    anchor_month: String,
    #[arg(long, default_value = "2025-01-01", help = "First month of the schedule")]
    start_date: NaiveDate,
    #[arg(
        long,
        value_enum,
        default_value_t = CliAnnuityTiming::Due,
        help = "Contribution timing: due (start of month) or ordinary (end of month)"
    )]
    timing: CliAnnuityTiming,
    #[arg(
        long,
        help = "JSON file with 12 {contribution, extraLump} entries, January first"
    )]
    pattern: Option<PathBuf>,
    #[arg(long, help = "Print the month-by-month table")]
    table: bool,
    #[arg(long, help = "Print the projection as JSON")]
    json: bool,
}

#[derive(Debug, Clone)]
struct ProjectionRequest {
    rates: RateInputs,
    config: ScheduleConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum MonthInput {
    Number(u8),
    Name(String),
}

impl MonthInput {
    fn into_name(self) -> String {
        match self {
            MonthInput::Number(n) => n.to_string(),
            MonthInput::Name(name) => name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    monthly_contribution: Option<f64>,
    years: Option<u32>,
    months: Option<u32>,
    return_rate: Option<f64>,
    devaluation: Option<f64>,
    fee_tax_drag: Option<f64>,
    step_up: Option<f64>,
    lump_sum: Option<f64>,
    anchor_month: Option<MonthInput>,
    start_date: Option<NaiveDate>,
    timing: Option<AnnuityTiming>,
    pattern: Option<Vec<MonthOverride>>,
    pattern_enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CrossCheckQuery {
    monthly_contribution: Option<f64>,
    return_rate: Option<f64>,
    fee_tax_drag: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse<'a> {
    duration_months: u32,
    start_date: NaiveDate,
    anchor_month: &'static str,
    timing: AnnuityTiming,
    pattern_enabled: bool,
    #[serde(flatten)]
    projection: &'a Projection,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn default_args_for_api() -> ProjectArgs {
    ProjectArgs {
        monthly_contribution: 100_000.0,
        years: 10,
        months: None,
        return_rate: 19.85,
        devaluation: 0.0,
        fee_tax_drag: 0.0,
        step_up: 0.0,
        lump_sum: 0.0,
        anchor_month: "January".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
        timing: CliAnnuityTiming::Due,
        pattern: None,
        table: false,
        json: false,
    }
}

fn build_request(
    args: &ProjectArgs,
    pattern: Option<[MonthOverride; 12]>,
) -> Result<ProjectionRequest, String> {
    let duration_months = match args.months {
        Some(0) => return Err("--months must be > 0".to_string()),
        Some(months) if months > MAX_YEARS * 12 => {
            return Err(format!("--months must be <= {}", MAX_YEARS * 12));
        }
        Some(months) => months,
        None => {
            if !(1..=MAX_YEARS).contains(&args.years) {
                return Err(format!("--years must be between 1 and {MAX_YEARS}"));
            }
            args.years * 12
        }
    };

    for (name, value, max) in [
        ("--return-rate", args.return_rate, MAX_RETURN_PCT),
        ("--devaluation", args.devaluation, MAX_DEVALUATION_PCT),
        ("--fee-tax-drag", args.fee_tax_drag, MAX_FEE_TAX_DRAG_PCT),
        ("--step-up", args.step_up, MAX_STEP_UP_PCT),
    ] {
        if !(0.0..=max).contains(&value) {
            return Err(format!("{name} must be between 0 and {max}"));
        }
    }

    for (name, value, max) in [
        (
            "--monthly-contribution",
            args.monthly_contribution,
            MAX_MONTHLY_CONTRIBUTION,
        ),
        ("--lump-sum", args.lump_sum, MAX_LUMP_SUM),
    ] {
        if !(0.0..=max).contains(&value) {
            return Err(format!("{name} must be between 0 and {max}"));
        }
    }

    let anchor_month: Month = parse_month(&args.anchor_month).map_err(|_| {
        format!(
            "--anchor-month must be a month name or 1-12, got {}",
            args.anchor_month
        )
    })?;

    let pattern = match pattern {
        Some(months) => {
            if months
                .iter()
                .any(|m| !(m.contribution >= 0.0 && m.extra_lump >= 0.0))
            {
                return Err("--pattern entries must be >= 0".to_string());
            }
            MonthlyPattern {
                enabled: true,
                months,
            }
        }
        None => MonthlyPattern::level(args.monthly_contribution),
    };

    Ok(ProjectionRequest {
        rates: RateInputs {
            nominal_return_pct: args.return_rate,
            devaluation_pct: args.devaluation,
            fee_tax_drag_pct: args.fee_tax_drag,
            step_up_pct: args.step_up,
        },
        config: ScheduleConfig {
            duration_months,
            start_date: args.start_date,
            anchor_month,
            base_monthly_contribution: args.monthly_contribution,
            pattern,
            lump_sum: args.lump_sum,
            timing: args.timing.into(),
        },
    })
}

fn pattern_from_entries(entries: Vec<MonthOverride>) -> Result<[MonthOverride; 12], String> {
    let len = entries.len();
    entries
        .try_into()
        .map_err(|_| format!("pattern must have exactly 12 entries, got {len}"))
}

fn load_pattern(path: &Path) -> Result<[MonthOverride; 12], String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("cannot read pattern file {}: {e}", path.display()))?;
    let entries = serde_json::from_str::<Vec<MonthOverride>>(&raw)
        .map_err(|e| format!("invalid pattern file {}: {e}", path.display()))?;
    pattern_from_entries(entries)
}

pub fn run_project_command(args: &ProjectArgs) -> Result<String, String> {
    let pattern = args.pattern.as_deref().map(load_pattern).transpose()?;
    let request = build_request(args, pattern)?;
    let projection = compute(&request.rates, &request.config).map_err(|e| e.to_string())?;

    if args.json {
        let response = build_project_response(&request.config, &projection);
        return serde_json::to_string_pretty(&response)
            .map_err(|e| format!("failed to serialize projection: {e}"));
    }

    let mut out = render_summary(&projection);
    if args.table {
        out.push('\n');
        out.push_str(&render_table(&projection));
    }
    Ok(out)
}

fn render_summary(projection: &Projection) -> String {
    let summary = &projection.summary;
    let check = &projection.cross_check;
    let mut out = String::new();
    for (label, value) in [
        ("Final nominal value", summary.final_nominal),
        ("Final real value", summary.final_real),
        ("Total contributions", summary.total_contributions),
        ("Nominal gain", summary.nominal_gain),
        ("Real gain", summary.real_gain),
    ] {
        let _ = writeln!(
            out,
            "{label:<22}{:>22}  ({:.2} crore)",
            format_pkr(value),
            to_crore(value)
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Closed-form cross-check (level contributions only):");
    for (label, value) in [("10 years", check.ten_year), ("20 years", check.twenty_year)] {
        let _ = writeln!(
            out,
            "  {label:<20}{:>22}  ({:.2} crore)",
            format_pkr(value),
            to_crore(value)
        );
    }
    out
}

fn render_table(projection: &Projection) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<10}  {:>16}  {:>16}  {:>20}  {:>20}",
        "month", "date", "contribution", "extra lump", "nominal", "real"
    );
    for record in &projection.records {
        let _ = writeln!(
            out,
            "{:>5}  {:<10}  {:>16}  {:>16}  {:>20}  {:>20}",
            record.month_index,
            record.date,
            format_pkr(record.contribution),
            format_pkr(record.extra_lump),
            format_pkr(record.nominal_balance),
            format_pkr(record.real_balance),
        );
    }
    out
}

fn build_project_response<'a>(
    config: &ScheduleConfig,
    projection: &'a Projection,
) -> ProjectResponse<'a> {
    ProjectResponse {
        duration_months: config.duration_months,
        start_date: config.start_date,
        anchor_month: config.anchor_month.name(),
        timing: config.timing,
        pattern_enabled: config.pattern.enabled,
        projection,
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/healthz", get(health_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/cross-check", get(cross_check_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("SIP HTTP API listening on http://{addr}");
    tracing::info!("Local access: http://127.0.0.1:{port}/api/project");
    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            tracing::warn!(error = %msg, "rejected projection request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match compute(&request.rates, &request.config) {
        Ok(projection) => json_response(
            StatusCode::OK,
            build_project_response(&request.config, &projection),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "projection failed");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

async fn cross_check_handler(Query(query): Query<CrossCheckQuery>) -> Response {
    match cross_check_from_query(query) {
        Ok(check) => json_response(StatusCode::OK, check),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn cross_check_from_query(query: CrossCheckQuery) -> Result<CrossCheck, String> {
    let defaults = default_args_for_api();
    let monthly = query
        .monthly_contribution
        .unwrap_or(defaults.monthly_contribution);
    if !monthly.is_finite() || monthly < 0.0 {
        return Err("monthlyContribution must be >= 0".to_string());
    }
    let rates = RateInputs {
        nominal_return_pct: query.return_rate.unwrap_or(defaults.return_rate),
        devaluation_pct: 0.0,
        fee_tax_drag_pct: query.fee_tax_drag.unwrap_or(defaults.fee_tax_drag),
        step_up_pct: 0.0,
    };
    rates.validate().map_err(|e| e.to_string())?;
    let net = NetRates::from_inputs(&rates);
    Ok(cross_check(monthly, net.net_nominal_monthly))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ProjectionRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ProjectPayload) -> Result<ProjectionRequest, String> {
    let mut args = default_args_for_api();

    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = v;
    }
    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.months {
        args.months = Some(v);
    }
    if let Some(v) = payload.return_rate {
        args.return_rate = v;
    }
    if let Some(v) = payload.devaluation {
        args.devaluation = v;
    }
    if let Some(v) = payload.fee_tax_drag {
        args.fee_tax_drag = v;
    }
    if let Some(v) = payload.step_up {
        args.step_up = v;
    }
    if let Some(v) = payload.lump_sum {
        args.lump_sum = v;
    }
    if let Some(v) = payload.anchor_month {
        args.anchor_month = v.into_name();
    }
    if let Some(v) = payload.start_date {
        args.start_date = v;
    }
    if let Some(v) = payload.timing {
        args.timing = v.into();
    }

    let pattern_enabled = payload
        .pattern_enabled
        .unwrap_or(payload.pattern.is_some());
    let pattern = match (pattern_enabled, payload.pattern) {
        (true, Some(entries)) => Some(pattern_from_entries(entries)?),
        (true, None) => return Err("patternEnabled requires a 12-entry pattern".to_string()),
        (false, _) => None,
    };

    build_request(&args, pattern)
}
