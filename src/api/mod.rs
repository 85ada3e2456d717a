use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    Allocation, Catalog, Goal, GoalOrder, GoalPlan, GoalStatus, GoalSummary, Instrument,
    MAX_HORIZON_MONTHS, PlanError, RiskLevel, RiskProfile, SimulationResult, filter_goals,
    plan_goal, run_simulation, seeded_rng, sort_goals, suggested_allocation, summarize_goals,
};

const DEFAULT_TARGET_AMOUNT: f64 = 100_000.0;
const DEFAULT_TIME_HORIZON: u32 = 12;
const DEFAULT_MONTHLY_INVESTMENT: f64 = 5_000.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliRiskLevel {
    Low,
    Medium,
    High,
}

impl From<CliRiskLevel> for RiskLevel {
    fn from(value: CliRiskLevel) -> Self {
        match value {
            CliRiskLevel::Low => RiskLevel::Low,
            CliRiskLevel::Medium => RiskLevel::Medium,
            CliRiskLevel::High => RiskLevel::High,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiGoalOrder {
    Priority,
    Amount,
    Deadline,
}

impl From<ApiGoalOrder> for GoalOrder {
    fn from(value: ApiGoalOrder) -> Self {
        match value {
            ApiGoalOrder::Priority => GoalOrder::Priority,
            ApiGoalOrder::Amount => GoalOrder::Amount,
            ApiGoalOrder::Deadline => GoalOrder::Deadline,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiStatusFilter {
    All,
    Active,
    Paused,
    Completed,
}

impl From<ApiStatusFilter> for Option<GoalStatus> {
    fn from(value: ApiStatusFilter) -> Self {
        match value {
            ApiStatusFilter::All => None,
            ApiStatusFilter::Active => Some(GoalStatus::Active),
            ApiStatusFilter::Paused => Some(GoalStatus::Paused),
            ApiStatusFilter::Completed => Some(GoalStatus::Completed),
        }
    }
}

/// Weights arrive either as a JSON object or, from query strings, as
/// `stocks:60,bonds:40`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AllocationInput {
    Weights(Allocation),
    Entries(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    goal_id: Option<String>,
    target_amount: Option<f64>,
    current_amount: Option<f64>,
    time_horizon: Option<u32>,
    risk_tolerance: Option<RiskLevel>,
    monthly_investment: Option<f64>,
    allocation: Option<AllocationInput>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanPayload {
    goals: Vec<Goal>,
    #[serde(default)]
    sort_by: Option<ApiGoalOrder>,
    #[serde(default)]
    status: Option<ApiStatusFilter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestedQuery {
    risk_tolerance: RiskLevel,
}

#[derive(Parser, Debug)]
#[command(
    name = "goalsim",
    about = "Goal-based savings projections: SIP growth, required contributions and portfolio simulation"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "JSON file with instruments and risk profiles; built-in tables otherwise"
    )]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the portfolio simulator for one goal and print the result as JSON.
    Simulate(SimulateArgs),
    /// Print progress and the required monthly SIP for one goal.
    Plan(GoalArgs),
    /// Serve the JSON API over HTTP.
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
struct GoalArgs {
    #[arg(long)]
    target_amount: f64,
    #[arg(long, default_value_t = 0.0)]
    current_amount: f64,
    #[arg(long, help = "Time horizon in months")]
    time_horizon: u32,
    #[arg(long, value_enum, default_value_t = CliRiskLevel::Medium)]
    risk_tolerance: CliRiskLevel,
}

#[derive(Args, Debug, Clone)]
struct SimulateArgs {
    #[command(flatten)]
    goal: GoalArgs,
    #[arg(long, default_value_t = DEFAULT_MONTHLY_INVESTMENT)]
    monthly_investment: f64,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Instrument weights as id=percent, e.g. stocks=60,bonds=40; defaults to the suggestion for the risk tolerance"
    )]
    allocation: Vec<String>,
    #[arg(long, help = "Seed for the chart path; random when omitted")]
    seed: Option<u64>,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct ServeArgs {
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(
        long,
        default_value_t = 0,
        help = "Artificial delay before answering simulation requests"
    )]
    pub latency_ms: u64,
}

#[derive(Debug)]
struct SimulateRequest {
    goal: Goal,
    allocation: Allocation,
    monthly_investment: f64,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    goal_id: String,
    allocation: Allocation,
    #[serde(flatten)]
    result: SimulationResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    plans: Vec<GoalPlan>,
    summary: GoalSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CliPlanOutput {
    #[serde(flatten)]
    plan: GoalPlan,
    target_amount: f64,
    current_amount: f64,
    time_horizon: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RiskProfileEntry<'a> {
    risk_tolerance: RiskLevel,
    #[serde(flatten)]
    profile: &'a RiskProfile,
    suggested_allocation: Allocation,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
struct AppState {
    catalog: Arc<Catalog>,
    latency: Duration,
}

pub async fn run(cli: Cli) -> Result<(), String> {
    let catalog = match &cli.catalog {
        Some(path) => Catalog::load(path).map_err(|e| e.to_string())?,
        None => Catalog::builtin(),
    };

    match cli.command {
        Command::Simulate(args) => {
            let request = build_simulate_request(args)?;
            let output = execute_simulation(&catalog, request).map_err(|e| e.to_string())?;
            println!("{}", to_pretty_json(&output)?);
            Ok(())
        }
        Command::Plan(args) => {
            let goal = build_goal(&args)?;
            let plan = plan_goal(&catalog, &goal).map_err(|e| e.to_string())?;
            let output = CliPlanOutput {
                plan,
                target_amount: goal.target_amount,
                current_amount: goal.current_amount,
                time_horizon: goal.time_horizon,
            };
            println!("{}", to_pretty_json(&output)?);
            Ok(())
        }
        Command::Serve(args) => run_http_server(catalog, args)
            .await
            .map_err(|e| format!("Server error: {e}")),
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Failed to encode output: {e}"))
}

fn build_goal(args: &GoalArgs) -> Result<Goal, String> {
    if !args.target_amount.is_finite() || args.target_amount <= 0.0 {
        return Err("--target-amount must be > 0".to_string());
    }
    if args.time_horizon == 0 {
        return Err("--time-horizon must be > 0".to_string());
    }
    if args.time_horizon > MAX_HORIZON_MONTHS {
        return Err(format!("--time-horizon must be at most {MAX_HORIZON_MONTHS}"));
    }
    if !args.current_amount.is_finite() || args.current_amount < 0.0 {
        return Err("--current-amount must be >= 0".to_string());
    }

    let mut goal = Goal::new(
        args.target_amount,
        args.time_horizon,
        args.risk_tolerance.into(),
    );
    goal.current_amount = args.current_amount;
    Ok(goal)
}

fn build_simulate_request(args: SimulateArgs) -> Result<SimulateRequest, String> {
    let goal = build_goal(&args.goal)?;

    if !args.monthly_investment.is_finite() || args.monthly_investment < 0.0 {
        return Err("--monthly-investment must be >= 0".to_string());
    }

    let allocation = if args.allocation.is_empty() {
        suggested_allocation(goal.risk_tolerance)
    } else {
        parse_allocation_entries(args.allocation.iter().map(String::as_str))?
    };

    Ok(SimulateRequest {
        goal,
        allocation,
        monthly_investment: args.monthly_investment,
        seed: args.seed,
    })
}

/// Parses `id=percent` (or `id:percent`) entries.
fn parse_allocation_entries<'a>(
    entries: impl IntoIterator<Item = &'a str>,
) -> Result<Allocation, String> {
    let mut allocation = Allocation::new();
    for entry in entries {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((id, pct)) = entry.split_once(['=', ':']) else {
            return Err(format!(
                "allocation entry '{entry}' must look like id=percent"
            ));
        };
        let id = id.trim();
        if id.is_empty() {
            return Err(format!("allocation entry '{entry}' is missing an instrument id"));
        }
        let pct = pct
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("allocation entry '{entry}' has an invalid percent: {e}"))?;
        allocation.set(id, pct);
    }
    Ok(allocation)
}

fn execute_simulation(
    catalog: &Catalog,
    request: SimulateRequest,
) -> Result<SimulateResponse, PlanError> {
    let mut rng = seeded_rng(request.seed);
    let result = run_simulation(
        catalog,
        &request.goal,
        &request.allocation,
        request.monthly_investment,
        &mut rng,
    )?;
    Ok(SimulateResponse {
        goal_id: request.goal.id,
        allocation: request.allocation,
        result,
    })
}

pub async fn run_http_server(catalog: Catalog, args: ServeArgs) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let state = AppState {
        catalog: Arc::new(catalog),
        latency: Duration::from_millis(args.latency_ms),
    };
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, latency_ms = args.latency_ms, "goalsim HTTP API listening");

    axum::serve(listener, app).await
}

fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/plan", post(plan_handler))
        .route("/api/instruments", get(instruments_handler))
        .route("/api/risk-profiles", get(risk_profiles_handler))
        .route("/api/suggested-allocation", get(suggested_allocation_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn instruments_handler(State(state): State<AppState>) -> Response {
    json_response::<&[Instrument]>(StatusCode::OK, &state.catalog.instruments)
}

async fn risk_profiles_handler(State(state): State<AppState>) -> Response {
    let entries: Vec<RiskProfileEntry<'_>> = state
        .catalog
        .risk_profiles
        .iter()
        .map(|(level, profile)| RiskProfileEntry {
            risk_tolerance: *level,
            profile,
            suggested_allocation: suggested_allocation(*level),
        })
        .collect();
    json_response(StatusCode::OK, entries)
}

async fn suggested_allocation_handler(Query(query): Query<SuggestedQuery>) -> Response {
    json_response(StatusCode::OK, suggested_allocation(query.risk_tolerance))
}

async fn simulate_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<SimulatePayload>,
) -> Response {
    simulate_handler_impl(state, payload).await
}

async fn simulate_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<SimulatePayload>,
) -> Response {
    simulate_handler_impl(state, payload).await
}

async fn simulate_handler_impl(state: AppState, payload: SimulatePayload) -> Response {
    let request = match simulate_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    if !state.latency.is_zero() {
        tokio::time::sleep(state.latency).await;
    }

    match execute_simulation(&state.catalog, request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => plan_error_response(&err),
    }
}

async fn plan_handler(State(state): State<AppState>, Json(payload): Json<PlanPayload>) -> Response {
    match build_plan_response(&state.catalog, payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => plan_error_response(&err),
    }
}

fn build_plan_response(catalog: &Catalog, payload: PlanPayload) -> Result<PlanResponse, PlanError> {
    let summary = summarize_goals(&payload.goals);

    let status = payload.status.and_then(Option::<GoalStatus>::from);
    let mut goals = filter_goals(&payload.goals, status);
    sort_goals(&mut goals, payload.sort_by.map(GoalOrder::from).unwrap_or_default());

    let plans = goals
        .iter()
        .map(|goal| plan_goal(catalog, goal).map_err(|e| tag_goal_error(goal, e)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PlanResponse { plans, summary })
}

fn tag_goal_error(goal: &Goal, err: PlanError) -> PlanError {
    if goal.id.is_empty() {
        return err;
    }
    match err {
        PlanError::InvalidGoal(msg) => PlanError::InvalidGoal(format!("goal {}: {msg}", goal.id)),
        other => other,
    }
}

fn simulate_request_from_payload(payload: SimulatePayload) -> Result<SimulateRequest, String> {
    let risk = payload.risk_tolerance.unwrap_or_default();
    let mut goal = Goal::new(
        payload.target_amount.unwrap_or(DEFAULT_TARGET_AMOUNT),
        payload.time_horizon.unwrap_or(DEFAULT_TIME_HORIZON),
        risk,
    );
    if let Some(v) = payload.goal_id {
        goal.id = v;
    }
    if let Some(v) = payload.current_amount {
        goal.current_amount = v;
    }

    let allocation = match payload.allocation {
        None => suggested_allocation(risk),
        Some(AllocationInput::Weights(weights)) => weights,
        Some(AllocationInput::Entries(entries)) => parse_allocation_entries(entries.split(','))?,
    };

    Ok(SimulateRequest {
        goal,
        allocation,
        monthly_investment: payload
            .monthly_investment
            .unwrap_or(DEFAULT_MONTHLY_INVESTMENT),
        seed: payload.seed,
    })
}

fn plan_error_response(err: &PlanError) -> Response {
    let status = match err {
        PlanError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    if status.is_server_error() {
        warn!(error = %err, "request failed");
    }
    error_response(status, &err.to_string())
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
fn simulate_request_from_json(json: &str) -> Result<SimulateRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    simulate_request_from_payload(payload)
}
