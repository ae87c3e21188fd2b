mod report;

use axum::{
    Router,
    extract::{
        Json, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::core::{
    InputError, MAX_PROJECTION_YEARS, NetWorth, Picker, PickerKind, Preset, RealEstateCashflow,
    SessionContext, Selection, TrackerInputs, TrackerReport, presets, run_tracker,
};

pub use report::{format_currency, render_text_report};

const DEFAULT_LIQUID_ASSETS: f64 = 100_000.0;
const DEFAULT_ANNUAL_SAVINGS: f64 = 30_000.0;
const DEFAULT_TARGET_EXPENSES: f64 = 50_000.0;
const DEFAULT_WITHDRAWAL_RATE: f64 = 4.0;
const DEFAULT_EXPECTED_RETURN: f64 = 7.0;
const DEFAULT_APPRECIATION_RATE: f64 = 3.0;
const DEFAULT_APPRECIATION_YEARS: u32 = 10;

/// Largest accepted money input. A century of growth at the top form rates
/// stays far below `f64::MAX`, so trajectories never overflow to infinity.
const MAX_MONEY_INPUT: f64 = 1e12;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Tracker form fields. Rates are percentages, money is in whole currency units.
#[derive(Args, Debug, Clone)]
pub struct TrackArgs {
    #[arg(
        long,
        default_value_t = DEFAULT_LIQUID_ASSETS,
        help = "Brokerage, retirement accounts, HSA and cash savings"
    )]
    pub liquid_assets: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Home equity, private businesses, collectibles and other non-liquid holdings"
    )]
    pub illiquid_assets: f64,
    #[arg(long, help = "Count illiquid assets toward the projected net worth")]
    pub include_illiquid: bool,
    #[arg(long, default_value_t = DEFAULT_ANNUAL_SAVINGS)]
    pub annual_savings: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_TARGET_EXPENSES,
        help = "Annual spending once financially independent"
    )]
    pub target_expenses: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_WITHDRAWAL_RATE,
        help = "Safe withdrawal rate in percent (2 to 6)"
    )]
    pub withdrawal_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_EXPECTED_RETURN,
        help = "Expected annual return in percent (3 to 10)"
    )]
    pub expected_return: f64,
    #[arg(long, default_value_t = 0.0)]
    pub rental_income: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual mortgage payments")]
    pub mortgage: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual maintenance and repairs")]
    pub maintenance: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual property tax and insurance")]
    pub tax_insurance: f64,
    #[arg(long, help = "Reduce target expenses by the net real estate cashflow")]
    pub include_real_estate: bool,
    #[arg(long, default_value_t = 0.0)]
    pub property_value: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_APPRECIATION_RATE,
        help = "Expected annual property appreciation in percent (0 to 10)"
    )]
    pub appreciation_rate: f64,
    #[arg(long, default_value_t = DEFAULT_APPRECIATION_YEARS)]
    pub appreciation_years: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TrackPayload {
    liquid_assets: Option<f64>,
    illiquid_assets: Option<f64>,
    include_illiquid: Option<bool>,
    annual_savings: Option<f64>,
    target_expenses: Option<f64>,
    withdrawal_rate: Option<f64>,
    expected_return: Option<f64>,
    rental_income: Option<f64>,
    mortgage: Option<f64>,
    maintenance: Option<f64>,
    tax_insurance: Option<f64>,
    include_real_estate: Option<bool>,
    property_value: Option<f64>,
    appreciation_rate: Option<f64>,
    appreciation_years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PickerPayload {
    session: SessionContext,
    selection: Option<Selection>,
    allow_custom: Option<bool>,
    key_prefix: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PickerResponse {
    kind: PickerKind,
    option: String,
    percent: f64,
    rate: f64,
    session: SessionContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PickerInfo {
    kind: PickerKind,
    default_option: &'static str,
    custom_min: f64,
    custom_max: f64,
    presets: &'static [Preset],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackResponse {
    #[serde(flatten)]
    report: TrackerReport,
    goal_line: GoalLine,
}

/// Horizontal target line spanning the trajectory chart.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalLine {
    x0: usize,
    x1: usize,
    y: f64,
    annotation_x: u32,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn ensure_finite(field: &'static str, value: f64) -> Result<(), InputError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InputError::NotFinite { field })
    }
}

fn ensure_money(field: &'static str, value: f64) -> Result<(), InputError> {
    ensure_finite(field, value)?;
    if value.abs() > MAX_MONEY_INPUT {
        return Err(InputError::TooLarge {
            field,
            value,
            max: MAX_MONEY_INPUT,
        });
    }
    Ok(())
}

fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), InputError> {
    ensure_money(field, value)?;
    if value < 0.0 {
        return Err(InputError::Negative { field, value });
    }
    Ok(())
}

fn ensure_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), InputError> {
    if !value.is_finite() || value < min || value > max {
        return Err(InputError::RateOutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

pub fn build_inputs(args: TrackArgs) -> Result<TrackerInputs, InputError> {
    ensure_money("--liquid-assets", args.liquid_assets)?;
    ensure_money("--illiquid-assets", args.illiquid_assets)?;
    ensure_money("--annual-savings", args.annual_savings)?;
    ensure_non_negative("--target-expenses", args.target_expenses)?;
    ensure_range("--withdrawal-rate", args.withdrawal_rate, 2.0, 6.0)?;
    ensure_range("--expected-return", args.expected_return, 3.0, 10.0)?;

    for (name, value) in [
        ("--rental-income", args.rental_income),
        ("--mortgage", args.mortgage),
        ("--maintenance", args.maintenance),
        ("--tax-insurance", args.tax_insurance),
        ("--property-value", args.property_value),
    ] {
        ensure_non_negative(name, value)?;
    }
    ensure_range("--appreciation-rate", args.appreciation_rate, 0.0, 10.0)?;
    if args.appreciation_years > MAX_PROJECTION_YEARS {
        return Err(InputError::TooLarge {
            field: "--appreciation-years",
            value: f64::from(args.appreciation_years),
            max: f64::from(MAX_PROJECTION_YEARS),
        });
    }

    Ok(TrackerInputs {
        net_worth: NetWorth {
            liquid: args.liquid_assets,
            illiquid: args.illiquid_assets,
            include_illiquid: args.include_illiquid,
        },
        annual_savings: args.annual_savings,
        target_expenses: args.target_expenses,
        withdrawal_rate: args.withdrawal_rate / 100.0,
        annual_return: args.expected_return / 100.0,
        real_estate: RealEstateCashflow {
            rental_income: args.rental_income,
            mortgage: args.mortgage,
            maintenance: args.maintenance,
            tax_insurance: args.tax_insurance,
        },
        include_real_estate: args.include_real_estate,
        property_value: args.property_value,
        appreciation_rate: args.appreciation_rate / 100.0,
        appreciation_years: args.appreciation_years,
    })
}

/// One-shot calculation for the `project` subcommand.
pub fn run_project(args: TrackArgs, format: OutputFormat) -> anyhow::Result<String> {
    let inputs = build_inputs(args)?;
    let report = run_tracker(&inputs)?;
    debug!(
        years = report.years_to_fi,
        reached = report.reached,
        goal = report.fire_goal,
        "projection computed"
    );
    Ok(match format {
        OutputFormat::Text => render_text_report(&report),
        OutputFormat::Json => {
            let response = build_track_response(report);
            format!("{}\n", serde_json::to_string_pretty(&response)?)
        }
    })
}

pub fn router() -> Router {
    Router::new()
        .route("/api/track", get(track_get_handler).post(track_post_handler))
        .route("/api/pickers", get(pickers_handler))
        .route("/api/pickers/:kind", post(picker_apply_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "FIRE tracker HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/track");

    axum::serve(listener, router()).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn track_get_handler(payload: Result<Query<TrackPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => track_handler_impl(payload),
        Err(rejection) => rejection_response(&rejection.body_text()),
    }
}

async fn track_post_handler(payload: Result<Json<TrackPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => track_handler_impl(payload),
        Err(rejection) => rejection_response(&rejection.body_text()),
    }
}

fn rejection_response(msg: &str) -> Response {
    debug!(error = msg, "rejected malformed request");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn track_handler_impl(payload: TrackPayload) -> Response {
    let report = match build_inputs(track_args_from_payload(payload))
        .and_then(|inputs| run_tracker(&inputs))
    {
        Ok(report) => report,
        Err(e) => {
            debug!(error = %e, "rejected tracker request");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };
    debug!(
        years = report.years_to_fi,
        reached = report.reached,
        goal = report.fire_goal,
        "projection computed"
    );
    json_response(StatusCode::OK, build_track_response(report))
}

async fn pickers_handler() -> Response {
    let kinds = [
        PickerKind::Inflation,
        PickerKind::Return,
        PickerKind::SavingsGrowth,
        PickerKind::Withdrawal,
    ];
    let body: Vec<PickerInfo> = kinds
        .into_iter()
        .map(|kind| {
            let picker = Picker::new(kind);
            let (custom_min, custom_max) = picker.custom_bounds();
            PickerInfo {
                kind,
                default_option: picker.default_option(),
                custom_min,
                custom_max,
                presets: presets(kind),
            }
        })
        .collect();
    json_response(StatusCode::OK, body)
}

async fn picker_apply_handler(
    Path(kind): Path<String>,
    payload: Result<Json<PickerPayload>, JsonRejection>,
) -> Response {
    let Some(kind) = parse_picker_kind(&kind) else {
        return error_response(StatusCode::NOT_FOUND, &format!("Unknown picker '{kind}'"));
    };
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return rejection_response(&rejection.body_text()),
    };
    let picker = match (kind, payload.key_prefix.as_deref()) {
        (PickerKind::SavingsGrowth, Some(prefix)) => Picker::savings_growth(prefix),
        _ => Picker::new(kind),
    };

    let mut session = payload.session;
    let allow_custom = payload.allow_custom.unwrap_or(true);
    match picker.apply(&mut session, payload.selection, allow_custom) {
        Ok(resolved) => json_response(
            StatusCode::OK,
            PickerResponse {
                kind,
                option: resolved.option,
                percent: resolved.percent,
                rate: resolved.rate,
                session,
            },
        ),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

fn parse_picker_kind(raw: &str) -> Option<PickerKind> {
    match raw {
        "inflation" => Some(PickerKind::Inflation),
        "return" => Some(PickerKind::Return),
        "savings-growth" | "growth" => Some(PickerKind::SavingsGrowth),
        "withdrawal" => Some(PickerKind::Withdrawal),
        _ => None,
    }
}

fn build_track_response(report: TrackerReport) -> TrackResponse {
    let goal_line = GoalLine {
        x0: 0,
        x1: report.trajectory.len(),
        y: report.fire_goal,
        annotation_x: report.years_to_fi,
    };
    TrackResponse { report, goal_line }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
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
fn track_args_from_json(json: &str) -> Result<TrackArgs, String> {
    let payload = serde_json::from_str::<TrackPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    Ok(track_args_from_payload(payload))
}

fn track_args_from_payload(payload: TrackPayload) -> TrackArgs {
    let mut args = default_args_for_api();

    if let Some(v) = payload.liquid_assets {
        args.liquid_assets = v;
    }
    if let Some(v) = payload.illiquid_assets {
        args.illiquid_assets = v;
    }
    if let Some(v) = payload.include_illiquid {
        args.include_illiquid = v;
    }
    if let Some(v) = payload.annual_savings {
        args.annual_savings = v;
    }
    if let Some(v) = payload.target_expenses {
        args.target_expenses = v;
    }
    if let Some(v) = payload.withdrawal_rate {
        args.withdrawal_rate = v;
    }
    if let Some(v) = payload.expected_return {
        args.expected_return = v;
    }
    if let Some(v) = payload.rental_income {
        args.rental_income = v;
    }
    if let Some(v) = payload.mortgage {
        args.mortgage = v;
    }
    if let Some(v) = payload.maintenance {
        args.maintenance = v;
    }
    if let Some(v) = payload.tax_insurance {
        args.tax_insurance = v;
    }
    if let Some(v) = payload.include_real_estate {
        args.include_real_estate = v;
    }
    if let Some(v) = payload.property_value {
        args.property_value = v;
    }
    if let Some(v) = payload.appreciation_rate {
        args.appreciation_rate = v;
    }
    if let Some(v) = payload.appreciation_years {
        args.appreciation_years = v;
    }

    args
}

pub fn default_args_for_api() -> TrackArgs {
    TrackArgs {
        liquid_assets: DEFAULT_LIQUID_ASSETS,
        illiquid_assets: 0.0,
        include_illiquid: false,
        annual_savings: DEFAULT_ANNUAL_SAVINGS,
        target_expenses: DEFAULT_TARGET_EXPENSES,
        withdrawal_rate: DEFAULT_WITHDRAWAL_RATE,
        expected_return: DEFAULT_EXPECTED_RETURN,
        rental_income: 0.0,
        mortgage: 0.0,
        maintenance: 0.0,
        tax_insurance: 0.0,
        include_real_estate: false,
        property_value: 0.0,
        appreciation_rate: DEFAULT_APPRECIATION_RATE,
        appreciation_years: DEFAULT_APPRECIATION_YEARS,
    }
}
