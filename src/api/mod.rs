mod error;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::core::{
    CalculationMode, CalculationResults, FinancialInputs, TimelineSeries, calculate,
    generate_timeline,
};

pub use error::{ApiError, ApiResult};

/// Longest horizon the boundary accepts; matches the 1200-month search ceiling.
const MAX_TIME_HORIZON_YEARS: u32 = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliMode {
    GoalBased,
    TimeBased,
    ContributionBased,
}

impl From<CliMode> for CalculationMode {
    fn from(value: CliMode) -> Self {
        match value {
            CliMode::GoalBased => CalculationMode::GoalBased,
            CliMode::TimeBased => CalculationMode::TimeBased,
            CliMode::ContributionBased => CalculationMode::ContributionBased,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiMode {
    #[serde(alias = "goalBased", alias = "goal_based", alias = "goal")]
    GoalBased,
    #[serde(alias = "timeBased", alias = "time_based", alias = "time")]
    TimeBased,
    #[serde(
        alias = "contributionBased",
        alias = "contribution_based",
        alias = "contribution"
    )]
    ContributionBased,
}

impl From<ApiMode> for CliMode {
    fn from(value: ApiMode) -> Self {
        match value {
            ApiMode::GoalBased => CliMode::GoalBased,
            ApiMode::TimeBased => CliMode::TimeBased,
            ApiMode::ContributionBased => CliMode::ContributionBased,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    mode: Option<ApiMode>,
    timeline: Option<bool>,

    current_income: Option<f64>,
    monthly_expenses: Option<f64>,
    current_savings: Option<f64>,
    current_investments: Option<f64>,
    #[serde(rename = "targetFINumber", alias = "targetFiNumber")]
    target_fi_number: Option<f64>,
    time_horizon: Option<u32>,

    annual_return: Option<f64>,
    inflation_rate: Option<f64>,
    savings_interest_rate: Option<f64>,

    monthly_savings: Option<f64>,
    monthly_investment: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "fi-projection",
    about = "Financial independence projection: required contribution, reachable goal, or time to target"
)]
struct Cli {
    #[arg(
        long,
        value_enum,
        default_value_t = CliMode::GoalBased,
        help = "goal-based, time-based or contribution-based"
    )]
    mode: CliMode,
    #[arg(long, default_value_t = 0.0, help = "Annual income (informational)")]
    current_income: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Monthly expenses; 25x the annual figure is the default target"
    )]
    monthly_expenses: f64,
    #[arg(long, default_value_t = 0.0)]
    current_savings: f64,
    #[arg(long, default_value_t = 0.0)]
    current_investments: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Target amount; nominal value at the horizon in goal-based mode"
    )]
    target_fi_number: f64,
    #[arg(long, help = "Projection horizon in whole years")]
    time_horizon: u32,
    #[arg(long, help = "Expected annual investment return in percent, e.g. 7")]
    annual_return: f64,
    #[arg(long, default_value_t = 3.0, help = "Expected annual inflation in percent")]
    inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Annual interest on cash savings in percent"
    )]
    savings_interest_rate: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Monthly deposit into savings (contribution-based mode)"
    )]
    monthly_savings: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Monthly deposit into investments (contribution-based mode)"
    )]
    monthly_investment: f64,
    #[arg(long, help = "Include the year-by-year chart series in the output")]
    timeline: bool,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: FinancialInputs,
    mode: CalculationMode,
    include_timeline: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    mode: CalculationMode,
    inputs: FinancialInputs,
    results: CalculationResults,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeline: Option<TimelineSeries>,
}

fn build_inputs(cli: &Cli) -> ApiResult<FinancialInputs> {
    if cli.time_horizon == 0 {
        return Err(ApiError::invalid("--time-horizon", "must be > 0"));
    }

    if cli.time_horizon > MAX_TIME_HORIZON_YEARS {
        return Err(ApiError::invalid(
            "--time-horizon",
            format!("must be <= {MAX_TIME_HORIZON_YEARS}"),
        ));
    }

    for (name, amount) in [
        ("--current-income", cli.current_income),
        ("--monthly-expenses", cli.monthly_expenses),
        ("--current-savings", cli.current_savings),
        ("--current-investments", cli.current_investments),
        ("--target-fi-number", cli.target_fi_number),
        ("--monthly-savings", cli.monthly_savings),
        ("--monthly-investment", cli.monthly_investment),
    ] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ApiError::invalid(name, "must be a finite amount >= 0"));
        }
    }

    for (name, rate) in [
        ("--annual-return", cli.annual_return),
        ("--inflation-rate", cli.inflation_rate),
        ("--savings-interest-rate", cli.savings_interest_rate),
    ] {
        if !rate.is_finite() || rate <= -100.0 {
            return Err(ApiError::invalid(name, "must be > -100"));
        }
    }

    match cli.mode {
        CliMode::GoalBased if cli.target_fi_number <= 0.0 => {
            return Err(ApiError::invalid(
                "--target-fi-number",
                "must be > 0 in goal-based mode",
            ));
        }
        CliMode::TimeBased if cli.monthly_expenses <= 0.0 => {
            return Err(ApiError::invalid(
                "--monthly-expenses",
                "must be > 0 in time-based mode",
            ));
        }
        CliMode::ContributionBased
            if cli.target_fi_number <= 0.0 && cli.monthly_expenses <= 0.0 =>
        {
            return Err(ApiError::invalid(
                "--target-fi-number",
                "or --monthly-expenses must be > 0 in contribution-based mode",
            ));
        }
        _ => {}
    }

    Ok(FinancialInputs {
        current_income: cli.current_income,
        monthly_expenses: cli.monthly_expenses,
        current_savings: cli.current_savings,
        current_investments: cli.current_investments,
        target_fi_number: cli.target_fi_number,
        time_horizon: cli.time_horizon,
        annual_return: cli.annual_return / 100.0,
        inflation_rate: cli.inflation_rate / 100.0,
        savings_interest_rate: cli.savings_interest_rate / 100.0,
        monthly_savings: cli.monthly_savings,
        monthly_investment: cli.monthly_investment,
    })
}

/// One-shot calculation from process arguments; returns pretty-printed JSON.
pub fn run_cli() -> ApiResult<String> {
    let cli = Cli::parse();
    let request = ApiRequest {
        inputs: build_inputs(&cli)?,
        mode: cli.mode.into(),
        include_timeline: cli.timeline,
    };
    let response = build_calculate_response(request);
    Ok(serde_json::to_string_pretty(&response)?)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("FI projection HTTP API listening on http://{addr}");
    tracing::info!("Local access: http://127.0.0.1:{port}/api/calculate");

    axum::serve(listener, build_router()).await
}

fn build_router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn not_found_handler() -> Response {
    with_cache_control((
        StatusCode::NOT_FOUND,
        Json(error::ErrorResponse {
            error: "Not found".to_string(),
        }),
    ))
}

async fn calculate_get_handler(Query(payload): Query<CalculatePayload>) -> Response {
    calculate_handler_impl(payload).await
}

async fn calculate_post_handler(Json(payload): Json<CalculatePayload>) -> Response {
    calculate_handler_impl(payload).await
}

async fn calculate_handler_impl(payload: CalculatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return with_cache_control(err),
    };

    tracing::debug!(mode = ?request.mode, horizon = request.inputs.time_horizon, "calculate");
    let response = build_calculate_response(request);
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> ApiResult<ApiRequest> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| ApiError::Payload(e.to_string()))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: CalculatePayload) -> ApiResult<ApiRequest> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.mode {
        cli.mode = v.into();
    }
    if let Some(v) = payload.timeline {
        cli.timeline = v;
    }

    if let Some(v) = payload.current_income {
        cli.current_income = v;
    }
    if let Some(v) = payload.monthly_expenses {
        cli.monthly_expenses = v;
    }
    if let Some(v) = payload.current_savings {
        cli.current_savings = v;
    }
    if let Some(v) = payload.current_investments {
        cli.current_investments = v;
    }
    if let Some(v) = payload.target_fi_number {
        cli.target_fi_number = v;
    }
    if let Some(v) = payload.time_horizon {
        cli.time_horizon = v;
    }

    if let Some(v) = payload.annual_return {
        cli.annual_return = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.savings_interest_rate {
        cli.savings_interest_rate = v;
    }

    if let Some(v) = payload.monthly_savings {
        cli.monthly_savings = v;
    }
    if let Some(v) = payload.monthly_investment {
        cli.monthly_investment = v;
    }

    let inputs = build_inputs(&cli)?;
    Ok(ApiRequest {
        inputs,
        mode: cli.mode.into(),
        include_timeline: cli.timeline,
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        mode: CliMode::GoalBased,
        current_income: 60_000.0,
        monthly_expenses: 3_000.0,
        current_savings: 20_000.0,
        current_investments: 50_000.0,
        target_fi_number: 1_000_000.0,
        time_horizon: 20,
        annual_return: 7.0,
        inflation_rate: 3.0,
        savings_interest_rate: 4.0,
        monthly_savings: 500.0,
        monthly_investment: 1_000.0,
        timeline: true,
    }
}

fn build_calculate_response(request: ApiRequest) -> CalculateResponse {
    let results = calculate(&request.inputs, request.mode);
    let timeline = request
        .include_timeline
        .then(|| generate_timeline(&request.inputs, request.mode, Some(&results)));

    CalculateResponse {
        mode: request.mode,
        inputs: request.inputs,
        results,
        timeline,
    }
}
