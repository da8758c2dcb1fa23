mod error;

use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub use error::{ApiError, ApiResult};

use crate::core::{
    BuyScenario, CustomShockOutcome, FinancialProfile, GrowthPoint, HousingPath, InvestmentStyle,
    LegacyDebtTreatment, LeverageOutcome, LifeEvent, LifeEventImpact, MarketSentiment,
    MonthlyCashFlow, OutcomeSummary, PROJECTION_MONTHS, ProjectionInputs, ProjectionSummary,
    RefinanceComparison, RentScenario, RiskAssessment, RiskHorizon, RiskOptions, SensitivityReport,
    SentimentMode, ShockDuration, ShockVariable, StressTestParams, TimedShock,
    apply_sentiment_preset, assess_risk, baseline_summary, compound_growth_schedule,
    leverage_outcome, life_event_impacts, project, refinance_at_month, run_custom_scenario,
    standardized_analysis, summarize,
};

const MAX_CUSTOM_MAGNITUDE: f64 = 5.0;
const PROJECTION_YEARS: u32 = PROJECTION_MONTHS / 12;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliLegacyDebt {
    ExcludeFromBoth,
    SubtractFromBoth,
}

impl From<CliLegacyDebt> for LegacyDebtTreatment {
    fn from(value: CliLegacyDebt) -> Self {
        match value {
            CliLegacyDebt::ExcludeFromBoth => LegacyDebtTreatment::ExcludeFromBoth,
            CliLegacyDebt::SubtractFromBoth => LegacyDebtTreatment::SubtractFromBoth,
        }
    }
}

impl From<LegacyDebtTreatment> for CliLegacyDebt {
    fn from(value: LegacyDebtTreatment) -> Self {
        match value {
            LegacyDebtTreatment::ExcludeFromBoth => CliLegacyDebt::ExcludeFromBoth,
            LegacyDebtTreatment::SubtractFromBoth => CliLegacyDebt::SubtractFromBoth,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliSentimentMode {
    Pessimistic,
    Neutral,
    Optimistic,
}

impl From<CliSentimentMode> for SentimentMode {
    fn from(value: CliSentimentMode) -> Self {
        match value {
            CliSentimentMode::Pessimistic => SentimentMode::Pessimistic,
            CliSentimentMode::Neutral => SentimentMode::Neutral,
            CliSentimentMode::Optimistic => SentimentMode::Optimistic,
        }
    }
}

impl From<SentimentMode> for CliSentimentMode {
    fn from(value: SentimentMode) -> Self {
        match value {
            SentimentMode::Pessimistic => CliSentimentMode::Pessimistic,
            SentimentMode::Neutral => CliSentimentMode::Neutral,
            SentimentMode::Optimistic => CliSentimentMode::Optimistic,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliInvestmentStyle {
    Conservative,
    Balanced,
    Aggressive,
}

impl From<CliInvestmentStyle> for InvestmentStyle {
    fn from(value: CliInvestmentStyle) -> Self {
        match value {
            CliInvestmentStyle::Conservative => InvestmentStyle::Conservative,
            CliInvestmentStyle::Balanced => InvestmentStyle::Balanced,
            CliInvestmentStyle::Aggressive => InvestmentStyle::Aggressive,
        }
    }
}

impl From<InvestmentStyle> for CliInvestmentStyle {
    fn from(value: InvestmentStyle) -> Self {
        match value {
            InvestmentStyle::Conservative => CliInvestmentStyle::Conservative,
            InvestmentStyle::Balanced => CliInvestmentStyle::Balanced,
            InvestmentStyle::Aggressive => CliInvestmentStyle::Aggressive,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScenarioPayload {
    monthly_income: Option<f64>,
    current_savings: Option<f64>,
    current_debt: Option<f64>,
    expected_salary_growth: Option<f64>,
    investment_rate: Option<f64>,
    minimum_living_expenses: Option<f64>,
    target_emergency_fund_months: Option<f64>,
    income_fluctuation: Option<f64>,
    legacy_debt: Option<LegacyDebtTreatment>,

    monthly_rent: Option<f64>,
    renters_insurance: Option<f64>,
    other_monthly_costs: Option<f64>,
    one_time_fees: Option<f64>,
    rent_inflation: Option<f64>,

    home_price: Option<f64>,
    down_payment_percent: Option<f64>,
    mortgage_rate: Option<f64>,
    loan_term_years: Option<u32>,
    property_tax_rate: Option<f64>,
    maintenance_monthly: Option<f64>,
    buying_closing_costs: Option<f64>,
    selling_closing_costs: Option<f64>,
    buy_home_appreciation: Option<f64>,

    home_appreciation: Option<f64>,
    investment_return: Option<f64>,
    inflation: Option<f64>,
    sentiment_mode: Option<SentimentMode>,
    investment_style: Option<InvestmentStyle>,

    house_price_shock: Option<f64>,
    rent_market_shock: Option<f64>,
    interest_rate_shock: Option<f64>,
    stock_market_crash_year: Option<u32>,
    stock_market_crash_drop: Option<f64>,
    job_loss_year: Option<u32>,
    #[serde(alias = "jobLossDurationMonths")]
    job_loss_duration: Option<u32>,
    cash_hit_amount: Option<f64>,
    cash_hit_year: Option<u32>,
    additional_monthly_expenses: Option<f64>,

    custom_variable: Option<ShockVariable>,
    custom_magnitude: Option<f64>,
    custom_duration: Option<ShockDuration>,
    risk_year: Option<u32>,
    risk_path: Option<HousingPath>,
    monthly_debt_service: Option<f64>,
    living_expenses: Option<f64>,
    life_event: Option<LifeEvent>,
    refinance_rate: Option<f64>,
    refinance_month: Option<u32>,
    price_change_percent: Option<f64>,
    monthly_contribution: Option<f64>,
    growth_years: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tenure",
    about = "30-year rent-vs-buy projection (run `tenure serve [port]` for the HTTP API)"
)]
struct Cli {
    #[arg(long, default_value_t = 4_500.0)]
    monthly_income: f64,
    #[arg(long, default_value_t = 60_000.0)]
    current_savings: f64,
    #[arg(long, default_value_t = 0.0, help = "Non-mortgage debt outstanding")]
    current_debt: f64,
    #[arg(long, default_value_t = 3.0, help = "Annual salary growth in percent")]
    salary_growth: f64,
    #[arg(
        long,
        default_value_t = 50.0,
        help = "Share of disposable income invested, in percent"
    )]
    investment_rate: f64,
    #[arg(long)]
    minimum_living_expenses: Option<f64>,
    #[arg(long)]
    emergency_fund_months: Option<f64>,
    #[arg(long, help = "Flat income adjustment in percent, -50 to 50")]
    income_fluctuation: Option<f64>,
    #[arg(long, value_enum, default_value_t = CliLegacyDebt::ExcludeFromBoth)]
    legacy_debt: CliLegacyDebt,

    #[arg(long, default_value_t = 1_600.0)]
    monthly_rent: f64,
    #[arg(long, default_value_t = 15.0)]
    renters_insurance: f64,
    #[arg(long, default_value_t = 0.0)]
    other_monthly_costs: f64,
    #[arg(long, default_value_t = 3_200.0, help = "Deposit and agency fees at move-in")]
    one_time_fees: f64,
    #[arg(long, default_value_t = 2.5)]
    rent_inflation: f64,

    #[arg(long, default_value_t = 200_000.0)]
    home_price: f64,
    #[arg(long, default_value_t = 10.0)]
    down_payment_percent: f64,
    #[arg(long, default_value_t = 3.5)]
    mortgage_rate: f64,
    #[arg(long, default_value_t = 25)]
    loan_term_years: u32,
    #[arg(long, default_value_t = 0.5)]
    property_tax_rate: f64,
    #[arg(long, default_value_t = 300.0)]
    maintenance_monthly: f64,
    #[arg(long, default_value_t = 8.0)]
    buying_closing_costs: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        help = "Selling costs in percent of home value; 0 means 6"
    )]
    selling_closing_costs: f64,
    #[arg(long, help = "Overrides --home-appreciation for the buy path")]
    buy_home_appreciation: Option<f64>,

    #[arg(long, default_value_t = 3.0)]
    home_appreciation: f64,
    #[arg(long, default_value_t = 7.0)]
    investment_return: f64,
    #[arg(long, default_value_t = 2.5)]
    inflation: f64,
    #[arg(long, value_enum, help = "Replaces appreciation and return with a preset")]
    sentiment_mode: Option<CliSentimentMode>,
    #[arg(long, value_enum, default_value_t = CliInvestmentStyle::Balanced)]
    investment_style: CliInvestmentStyle,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    house_price_shock: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    rent_market_shock: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    interest_rate_shock: f64,
    #[arg(long)]
    stock_market_crash_year: Option<u32>,
    #[arg(long, default_value_t = 0.0)]
    stock_market_crash_drop: f64,
    #[arg(long)]
    job_loss_year: Option<u32>,
    #[arg(long, default_value_t = 0, help = "Months without income; 0 means 12")]
    job_loss_duration: u32,
    #[arg(
        long,
        default_value_t = 0.0,
        allow_hyphen_values = true,
        help = "One-off expense; negative for a windfall"
    )]
    cash_hit_amount: f64,
    #[arg(long)]
    cash_hit_year: Option<u32>,
    #[arg(long, default_value_t = 0.0)]
    additional_monthly_expenses: f64,
}

#[derive(Copy, Clone, Debug)]
struct ApiOptions {
    custom: Option<TimedShock>,
    risk_horizon: RiskHorizon,
    risk_path: HousingPath,
    risk: RiskOptions,
    life_event: Option<LifeEvent>,
    refinance_rate: Option<f64>,
    refinance_month: u32,
    price_change_percent: f64,
    monthly_contribution: f64,
    growth_years: u32,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            custom: None,
            risk_horizon: RiskHorizon::Now,
            risk_path: HousingPath::Buy,
            risk: RiskOptions::default(),
            life_event: None,
            refinance_rate: None,
            refinance_month: 1,
            price_change_percent: 10.0,
            monthly_contribution: 500.0,
            growth_years: 20,
        }
    }
}

#[derive(Debug)]
struct ApiRequest {
    inputs: ProjectionInputs,
    options: ApiOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    inputs: ProjectionInputs,
    summary: ProjectionSummary,
    projections: Vec<MonthlyCashFlow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SensitivityResponse {
    #[serde(flatten)]
    report: SensitivityReport,
    custom: Option<CustomShockOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LifeEventsResponse {
    baseline: OutcomeSummary,
    impacts: Vec<LifeEventImpact>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolsResponse {
    refinance: RefinanceComparison,
    leverage: Option<LeverageOutcome>,
    compound_growth: Vec<GrowthPoint>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn validate_range(field: &str, value: f64, min: f64, max: f64) -> ApiResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(ApiError::validation(
            field,
            format!("must be between {min} and {max}"),
        ));
    }
    Ok(())
}

fn validate_non_negative(field: &str, value: f64) -> ApiResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::validation(field, "must be >= 0"));
    }
    Ok(())
}

fn validate_year(field: &str, year: Option<u32>) -> ApiResult<Option<u32>> {
    match year {
        None | Some(0) => Ok(None),
        Some(y) if y <= PROJECTION_YEARS => Ok(Some(y)),
        Some(_) => Err(ApiError::validation(
            field,
            format!("must be between 1 and {PROJECTION_YEARS}"),
        )),
    }
}

fn build_inputs(cli: Cli) -> ApiResult<ProjectionInputs> {
    validate_non_negative("--monthly-income", cli.monthly_income)?;
    if !cli.current_savings.is_finite() {
        return Err(ApiError::validation("--current-savings", "must be a finite number"));
    }
    validate_non_negative("--current-debt", cli.current_debt)?;
    validate_range("--salary-growth", cli.salary_growth, -50.0, 50.0)?;
    validate_range("--investment-rate", cli.investment_rate, 0.0, 100.0)?;
    if let Some(v) = cli.minimum_living_expenses {
        validate_non_negative("--minimum-living-expenses", v)?;
    }
    if let Some(v) = cli.emergency_fund_months {
        validate_non_negative("--emergency-fund-months", v)?;
    }
    if let Some(v) = cli.income_fluctuation {
        validate_range("--income-fluctuation", v, -50.0, 50.0)?;
    }

    validate_non_negative("--monthly-rent", cli.monthly_rent)?;
    validate_non_negative("--renters-insurance", cli.renters_insurance)?;
    validate_non_negative("--other-monthly-costs", cli.other_monthly_costs)?;
    validate_non_negative("--one-time-fees", cli.one_time_fees)?;
    validate_range("--rent-inflation", cli.rent_inflation, -50.0, 50.0)?;

    if !cli.home_price.is_finite() || cli.home_price <= 0.0 {
        return Err(ApiError::validation("--home-price", "must be > 0"));
    }
    validate_range("--down-payment-percent", cli.down_payment_percent, 0.0, 100.0)?;
    validate_range("--mortgage-rate", cli.mortgage_rate, 0.0, 100.0)?;
    if cli.loan_term_years == 0 || cli.loan_term_years > PROJECTION_YEARS {
        return Err(ApiError::validation(
            "--loan-term-years",
            format!("must be between 1 and {PROJECTION_YEARS}"),
        ));
    }
    validate_range("--property-tax-rate", cli.property_tax_rate, 0.0, 100.0)?;
    validate_non_negative("--maintenance-monthly", cli.maintenance_monthly)?;
    validate_range("--buying-closing-costs", cli.buying_closing_costs, 0.0, 100.0)?;
    validate_range("--selling-closing-costs", cli.selling_closing_costs, 0.0, 100.0)?;
    if let Some(v) = cli.buy_home_appreciation {
        validate_range("--buy-home-appreciation", v, -50.0, 50.0)?;
    }

    validate_range("--home-appreciation", cli.home_appreciation, -50.0, 50.0)?;
    validate_range("--investment-return", cli.investment_return, -50.0, 50.0)?;
    validate_range("--inflation", cli.inflation, -50.0, 50.0)?;

    validate_range("--house-price-shock", cli.house_price_shock, -100.0, 100.0)?;
    validate_range("--rent-market-shock", cli.rent_market_shock, -100.0, 100.0)?;
    validate_range("--interest-rate-shock", cli.interest_rate_shock, -100.0, 100.0)?;
    let stock_market_crash_year =
        validate_year("--stock-market-crash-year", cli.stock_market_crash_year)?;
    validate_range("--stock-market-crash-drop", cli.stock_market_crash_drop, 0.0, 100.0)?;
    let job_loss_year = validate_year("--job-loss-year", cli.job_loss_year)?;
    if cli.job_loss_duration > PROJECTION_MONTHS {
        return Err(ApiError::validation(
            "--job-loss-duration",
            format!("must be <= {PROJECTION_MONTHS}"),
        ));
    }
    if !cli.cash_hit_amount.is_finite() {
        return Err(ApiError::validation("--cash-hit-amount", "must be a finite number"));
    }
    let cash_hit_year = validate_year("--cash-hit-year", cli.cash_hit_year)?;
    validate_non_negative("--additional-monthly-expenses", cli.additional_monthly_expenses)?;

    let inputs = ProjectionInputs {
        profile: FinancialProfile {
            monthly_income: cli.monthly_income,
            current_savings: cli.current_savings,
            current_debt: cli.current_debt,
            expected_salary_growth: cli.salary_growth,
            investment_rate: cli.investment_rate,
            minimum_living_expenses: cli.minimum_living_expenses,
            target_emergency_fund_months: cli.emergency_fund_months,
            income_fluctuation: cli.income_fluctuation,
            legacy_debt: cli.legacy_debt.into(),
        },
        rent: RentScenario {
            monthly_rent: cli.monthly_rent,
            renters_insurance: cli.renters_insurance,
            other_monthly_costs: cli.other_monthly_costs,
            one_time_fees: cli.one_time_fees,
            rent_inflation: cli.rent_inflation,
        },
        buy: BuyScenario {
            home_price: cli.home_price,
            down_payment_percent: cli.down_payment_percent,
            mortgage_rate: cli.mortgage_rate,
            loan_term_years: cli.loan_term_years,
            property_tax_rate: cli.property_tax_rate,
            maintenance_monthly: cli.maintenance_monthly,
            buying_closing_costs: cli.buying_closing_costs,
            selling_closing_costs: cli.selling_closing_costs,
            home_appreciation: cli.buy_home_appreciation,
        },
        sentiment: MarketSentiment {
            home_appreciation: cli.home_appreciation,
            investment_return: cli.investment_return,
            inflation: cli.inflation,
        },
        stress: StressTestParams {
            house_price_shock: cli.house_price_shock,
            rent_market_shock: cli.rent_market_shock,
            interest_rate_shock: cli.interest_rate_shock,
            stock_market_crash_year,
            stock_market_crash_drop: cli.stock_market_crash_drop,
            job_loss_year,
            job_loss_duration_months: cli.job_loss_duration,
            cash_hit_amount: cli.cash_hit_amount,
            cash_hit_year,
            additional_monthly_expenses: cli.additional_monthly_expenses,
        },
    };

    Ok(match cli.sentiment_mode {
        Some(mode) => apply_sentiment_preset(&inputs, mode.into(), cli.investment_style.into()),
        None => inputs,
    })
}

/// Runs one projection from command-line flags and prints the summary as JSON.
pub fn run_cli() -> ApiResult<()> {
    let cli = Cli::parse();
    let inputs = build_inputs(cli)?;
    let projections = project(&inputs);
    let summary = summarize(&inputs, &projections);
    tracing::debug!(
        winner = ?summary.winner,
        break_even_month = ?summary.break_even_month,
        "projection complete"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "tenure HTTP API listening");
    tracing::info!("local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

fn router() -> Router {
    Router::new()
        .route("/api/project", get(project_get_handler).post(project_post_handler))
        .route(
            "/api/sensitivity",
            get(sensitivity_get_handler).post(sensitivity_post_handler),
        )
        .route("/api/risk", get(risk_get_handler).post(risk_post_handler))
        .route(
            "/api/life-events",
            get(life_events_get_handler).post(life_events_post_handler),
        )
        .route(
            "/api/refinance",
            get(refinance_get_handler).post(refinance_post_handler),
        )
        .route("/api/tools", get(tools_get_handler).post(tools_post_handler))
        .fallback(not_found_handler)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(payload: Result<Query<ScenarioPayload>, QueryRejection>) -> Response {
    respond(api_request_from_query(payload).and_then(|r| project_response(&r)))
}

async fn project_post_handler(payload: Result<Json<ScenarioPayload>, JsonRejection>) -> Response {
    respond(api_request_from_body(payload).and_then(|r| project_response(&r)))
}

async fn sensitivity_get_handler(payload: Result<Query<ScenarioPayload>, QueryRejection>) -> Response {
    respond(api_request_from_query(payload).and_then(|r| sensitivity_response(&r)))
}

async fn sensitivity_post_handler(payload: Result<Json<ScenarioPayload>, JsonRejection>) -> Response {
    respond(api_request_from_body(payload).and_then(|r| sensitivity_response(&r)))
}

async fn risk_get_handler(payload: Result<Query<ScenarioPayload>, QueryRejection>) -> Response {
    respond(api_request_from_query(payload).and_then(|r| risk_response(&r)))
}

async fn risk_post_handler(payload: Result<Json<ScenarioPayload>, JsonRejection>) -> Response {
    respond(api_request_from_body(payload).and_then(|r| risk_response(&r)))
}

async fn life_events_get_handler(payload: Result<Query<ScenarioPayload>, QueryRejection>) -> Response {
    respond(api_request_from_query(payload).and_then(|r| life_events_response(&r)))
}

async fn life_events_post_handler(payload: Result<Json<ScenarioPayload>, JsonRejection>) -> Response {
    respond(api_request_from_body(payload).and_then(|r| life_events_response(&r)))
}

async fn refinance_get_handler(payload: Result<Query<ScenarioPayload>, QueryRejection>) -> Response {
    respond(api_request_from_query(payload).and_then(|r| refinance_response(&r)))
}

async fn refinance_post_handler(payload: Result<Json<ScenarioPayload>, JsonRejection>) -> Response {
    respond(api_request_from_body(payload).and_then(|r| refinance_response(&r)))
}

async fn tools_get_handler(payload: Result<Query<ScenarioPayload>, QueryRejection>) -> Response {
    respond(api_request_from_query(payload).and_then(|r| tools_response(&r)))
}

async fn tools_post_handler(payload: Result<Json<ScenarioPayload>, JsonRejection>) -> Response {
    respond(api_request_from_body(payload).and_then(|r| tools_response(&r)))
}

fn api_request_from_query(
    payload: Result<Query<ScenarioPayload>, QueryRejection>,
) -> ApiResult<ApiRequest> {
    let Query(payload) = payload?;
    api_request_from_payload(payload)
}

fn api_request_from_body(
    payload: Result<Json<ScenarioPayload>, JsonRejection>,
) -> ApiResult<ApiRequest> {
    let Json(payload) = payload?;
    api_request_from_payload(payload)
}

fn respond<T: Serialize>(result: ApiResult<T>) -> Response {
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => err.into_response(),
    }
}

fn project_response(request: &ApiRequest) -> ApiResult<ProjectResponse> {
    let projections = project(&request.inputs);
    let summary = summarize(&request.inputs, &projections);
    tracing::debug!(winner = ?summary.winner, "projection served");
    Ok(ProjectResponse {
        inputs: request.inputs.clone(),
        summary,
        projections,
    })
}

fn sensitivity_response(request: &ApiRequest) -> ApiResult<SensitivityResponse> {
    let report = standardized_analysis(&request.inputs);
    let custom = request
        .options
        .custom
        .and_then(|shock| run_custom_scenario(&request.inputs, &report.baseline, shock));
    tracing::debug!(
        flipped = report.flipped().count(),
        custom = custom.is_some(),
        "sensitivity served"
    );
    Ok(SensitivityResponse { report, custom })
}

fn risk_response(request: &ApiRequest) -> ApiResult<RiskAssessment> {
    let projections = project(&request.inputs);
    let options = &request.options;
    assess_risk(
        &projections,
        &request.inputs.profile,
        options.risk_path,
        options.risk_horizon,
        &options.risk,
    )
    .ok_or_else(|| ApiError::InvalidPayload("projection produced no months".to_string()))
}

fn life_events_response(request: &ApiRequest) -> ApiResult<LifeEventsResponse> {
    let events = match request.options.life_event {
        Some(event) => vec![event],
        None => LifeEvent::ALL.to_vec(),
    };
    Ok(LifeEventsResponse {
        baseline: baseline_summary(&request.inputs),
        impacts: life_event_impacts(&request.inputs, &events),
    })
}

fn refinance_response(request: &ApiRequest) -> ApiResult<RefinanceComparison> {
    let inputs = &request.inputs;
    let projections = project(inputs);
    Ok(refinance_at_month(
        &projections,
        &inputs.buy,
        request.options.refinance_month,
        resolved_refinance_rate(request),
    ))
}

fn tools_response(request: &ApiRequest) -> ApiResult<ToolsResponse> {
    let inputs = &request.inputs;
    let options = &request.options;
    Ok(ToolsResponse {
        refinance: refinance_response(request)?,
        leverage: leverage_outcome(
            inputs.buy.home_price,
            inputs.buy.down_payment_percent,
            options.price_change_percent,
        ),
        compound_growth: compound_growth_schedule(
            inputs.profile.current_savings.max(0.0),
            options.monthly_contribution,
            inputs.sentiment.investment_return,
            options.growth_years,
        ),
    })
}

// One point below the current rate unless the caller names one.
fn resolved_refinance_rate(request: &ApiRequest) -> f64 {
    request
        .options
        .refinance_rate
        .unwrap_or((request.inputs.buy.mortgage_rate - 1.0).max(0.0))
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
fn api_request_from_json(json: &str) -> ApiResult<ApiRequest> {
    let payload = serde_json::from_str::<ScenarioPayload>(json)
        .map_err(|e| ApiError::InvalidPayload(e.to_string()))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ScenarioPayload) -> ApiResult<ApiRequest> {
    let mut cli = default_cli_for_api();
    let mut options = ApiOptions::default();

    if let Some(v) = payload.monthly_income {
        cli.monthly_income = v;
    }
    if let Some(v) = payload.current_savings {
        cli.current_savings = v;
    }
    if let Some(v) = payload.current_debt {
        cli.current_debt = v;
    }
    if let Some(v) = payload.expected_salary_growth {
        cli.salary_growth = v;
    }
    if let Some(v) = payload.investment_rate {
        cli.investment_rate = v;
    }
    if payload.minimum_living_expenses.is_some() {
        cli.minimum_living_expenses = payload.minimum_living_expenses;
    }
    if payload.target_emergency_fund_months.is_some() {
        cli.emergency_fund_months = payload.target_emergency_fund_months;
    }
    if payload.income_fluctuation.is_some() {
        cli.income_fluctuation = payload.income_fluctuation;
    }
    if let Some(v) = payload.legacy_debt {
        cli.legacy_debt = v.into();
    }

    if let Some(v) = payload.monthly_rent {
        cli.monthly_rent = v;
    }
    if let Some(v) = payload.renters_insurance {
        cli.renters_insurance = v;
    }
    if let Some(v) = payload.other_monthly_costs {
        cli.other_monthly_costs = v;
    }
    if let Some(v) = payload.one_time_fees {
        cli.one_time_fees = v;
    }
    if let Some(v) = payload.rent_inflation {
        cli.rent_inflation = v;
    }

    if let Some(v) = payload.home_price {
        cli.home_price = v;
    }
    if let Some(v) = payload.down_payment_percent {
        cli.down_payment_percent = v;
    }
    if let Some(v) = payload.mortgage_rate {
        cli.mortgage_rate = v;
    }
    if let Some(v) = payload.loan_term_years {
        cli.loan_term_years = v;
    }
    if let Some(v) = payload.property_tax_rate {
        cli.property_tax_rate = v;
    }
    if let Some(v) = payload.maintenance_monthly {
        cli.maintenance_monthly = v;
    }
    if let Some(v) = payload.buying_closing_costs {
        cli.buying_closing_costs = v;
    }
    if let Some(v) = payload.selling_closing_costs {
        cli.selling_closing_costs = v;
    }
    if payload.buy_home_appreciation.is_some() {
        cli.buy_home_appreciation = payload.buy_home_appreciation;
    }

    if let Some(v) = payload.home_appreciation {
        cli.home_appreciation = v;
    }
    if let Some(v) = payload.investment_return {
        cli.investment_return = v;
    }
    if let Some(v) = payload.inflation {
        cli.inflation = v;
    }
    if let Some(v) = payload.sentiment_mode {
        cli.sentiment_mode = Some(v.into());
    }
    if let Some(v) = payload.investment_style {
        cli.investment_style = v.into();
    }

    if let Some(v) = payload.house_price_shock {
        cli.house_price_shock = v;
    }
    if let Some(v) = payload.rent_market_shock {
        cli.rent_market_shock = v;
    }
    if let Some(v) = payload.interest_rate_shock {
        cli.interest_rate_shock = v;
    }
    if payload.stock_market_crash_year.is_some() {
        cli.stock_market_crash_year = payload.stock_market_crash_year;
    }
    if let Some(v) = payload.stock_market_crash_drop {
        cli.stock_market_crash_drop = v;
    }
    if payload.job_loss_year.is_some() {
        cli.job_loss_year = payload.job_loss_year;
    }
    if let Some(v) = payload.job_loss_duration {
        cli.job_loss_duration = v;
    }
    if let Some(v) = payload.cash_hit_amount {
        cli.cash_hit_amount = v;
    }
    if payload.cash_hit_year.is_some() {
        cli.cash_hit_year = payload.cash_hit_year;
    }
    if let Some(v) = payload.additional_monthly_expenses {
        cli.additional_monthly_expenses = v;
    }

    let inputs = build_inputs(cli)?;

    match (payload.custom_variable, payload.custom_magnitude) {
        (Some(variable), magnitude) => {
            let magnitude = magnitude.unwrap_or(0.0);
            validate_range(
                "--customMagnitude",
                magnitude,
                -MAX_CUSTOM_MAGNITUDE,
                MAX_CUSTOM_MAGNITUDE,
            )?;
            options.custom = Some(TimedShock {
                variable,
                magnitude,
                duration: payload.custom_duration.unwrap_or_default(),
            });
        }
        (None, Some(_)) => {
            return Err(ApiError::validation(
                "--customVariable",
                "is required when customMagnitude is set",
            ));
        }
        (None, None) => {}
    }

    if let Some(years) = payload.risk_year {
        options.risk_horizon = RiskHorizon::try_from(years)
            .map_err(|message| ApiError::validation("--riskYear", message))?;
    }
    if let Some(v) = payload.risk_path {
        options.risk_path = v;
    }
    if let Some(v) = payload.monthly_debt_service {
        validate_non_negative("--monthlyDebtService", v)?;
        options.risk.monthly_debt_service = v;
    }
    if let Some(v) = payload.living_expenses {
        validate_non_negative("--livingExpenses", v)?;
        options.risk.living_expenses = Some(v);
    }
    options.life_event = payload.life_event;

    if let Some(v) = payload.refinance_rate {
        validate_range("--refinanceRate", v, 0.0, 100.0)?;
        options.refinance_rate = Some(v);
    }
    if let Some(month) = payload.refinance_month {
        if month == 0 || month > PROJECTION_MONTHS {
            return Err(ApiError::validation(
                "--refinanceMonth",
                format!("must be between 1 and {PROJECTION_MONTHS}"),
            ));
        }
        options.refinance_month = month;
    }
    if let Some(v) = payload.price_change_percent {
        validate_range("--priceChangePercent", v, -100.0, 100.0)?;
        options.price_change_percent = v;
    }
    if let Some(v) = payload.monthly_contribution {
        validate_non_negative("--monthlyContribution", v)?;
        options.monthly_contribution = v;
    }
    if let Some(years) = payload.growth_years {
        if years > 100 {
            return Err(ApiError::validation("--growthYears", "must be <= 100"));
        }
        options.growth_years = years;
    }

    Ok(ApiRequest { inputs, options })
}

fn default_cli_for_api() -> Cli {
    Cli {
        monthly_income: 4_500.0,
        current_savings: 60_000.0,
        current_debt: 0.0,
        salary_growth: 3.0,
        investment_rate: 50.0,
        minimum_living_expenses: None,
        emergency_fund_months: None,
        income_fluctuation: None,
        legacy_debt: CliLegacyDebt::ExcludeFromBoth,
        monthly_rent: 1_600.0,
        renters_insurance: 15.0,
        other_monthly_costs: 0.0,
        one_time_fees: 3_200.0,
        rent_inflation: 2.5,
        home_price: 200_000.0,
        down_payment_percent: 10.0,
        mortgage_rate: 3.5,
        loan_term_years: 25,
        property_tax_rate: 0.5,
        maintenance_monthly: 300.0,
        buying_closing_costs: 8.0,
        selling_closing_costs: 4.0,
        buy_home_appreciation: None,
        home_appreciation: 3.0,
        investment_return: 7.0,
        inflation: 2.5,
        sentiment_mode: None,
        investment_style: CliInvestmentStyle::Balanced,
        house_price_shock: 0.0,
        rent_market_shock: 0.0,
        interest_rate_shock: 0.0,
        stock_market_crash_year: None,
        stock_market_crash_drop: 0.0,
        job_loss_year: None,
        job_loss_duration: 0,
        cash_hit_amount: 0.0,
        cash_hit_year: None,
        additional_monthly_expenses: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn cli_defaults_match_api_defaults() {
        let parsed = Cli::try_parse_from(["tenure"]).expect("defaults parse");
        let from_cli = build_inputs(parsed).expect("valid inputs");
        let from_api = build_inputs(sample_cli()).expect("valid inputs");
        assert_eq!(from_cli, from_api);
    }

    #[test]
    fn cli_accepts_negative_shocks_and_enums() {
        let parsed = Cli::try_parse_from([
            "tenure",
            "--house-price-shock",
            "-30",
            "--legacy-debt",
            "subtract-from-both",
            "--sentiment-mode",
            "optimistic",
        ])
        .expect("flags parse");
        let inputs = build_inputs(parsed).expect("valid inputs");
        assert_approx(inputs.stress.house_price_shock, -30.0);
        assert_eq!(inputs.profile.legacy_debt, LegacyDebtTreatment::SubtractFromBoth);
        assert_approx(inputs.sentiment.investment_return, 8.0);
        assert_eq!(inputs.buy.home_appreciation, Some(6.0));
    }

    #[test]
    fn build_inputs_maps_percentages_as_points() {
        let inputs = build_inputs(sample_cli()).expect("valid inputs");
        assert_approx(inputs.buy.mortgage_rate, 3.5);
        assert_approx(inputs.profile.investment_rate, 50.0);
        assert_eq!(inputs.buy.loan_term_years, 25);
        assert_eq!(inputs.stress, StressTestParams::default());
    }

    #[test]
    fn build_inputs_rejects_investment_rate_out_of_range() {
        let mut cli = sample_cli();
        cli.investment_rate = 120.0;
        let err = build_inputs(cli).expect_err("must reject investment rate");
        assert!(err.to_string().contains("--investment-rate"));
    }

    #[test]
    fn build_inputs_rejects_zero_loan_term() {
        let mut cli = sample_cli();
        cli.loan_term_years = 0;
        let err = build_inputs(cli).expect_err("must reject zero term");
        assert!(err.to_string().contains("--loan-term-years"));
    }

    #[test]
    fn build_inputs_rejects_income_fluctuation_beyond_half() {
        let mut cli = sample_cli();
        cli.income_fluctuation = Some(-60.0);
        let err = build_inputs(cli).expect_err("must reject fluctuation");
        assert!(err.to_string().contains("--income-fluctuation"));
    }

    #[test]
    fn build_inputs_rejects_down_payment_over_full_price() {
        let mut cli = sample_cli();
        cli.down_payment_percent = 101.0;
        let err = build_inputs(cli).expect_err("must reject down payment");
        assert!(err.to_string().contains("--down-payment-percent"));
    }

    #[test]
    fn zero_event_year_means_no_event() {
        let mut cli = sample_cli();
        cli.stock_market_crash_year = Some(0);
        cli.cash_hit_year = Some(0);
        let inputs = build_inputs(cli).expect("valid inputs");
        assert_eq!(inputs.stress.stock_market_crash_year, None);
        assert_eq!(inputs.stress.cash_hit_year, None);

        let mut cli = sample_cli();
        cli.job_loss_year = Some(31);
        let err = build_inputs(cli).expect_err("must reject year past horizon");
        assert!(err.to_string().contains("--job-loss-year"));
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "monthlyIncome": 5200,
          "currentSavings": 80000,
          "investmentRate": 40,
          "incomeFluctuation": -10,
          "legacyDebt": "subtract-from-both",
          "monthlyRent": 1400,
          "homePrice": 320000,
          "downPaymentPercent": 20,
          "mortgageRate": 4.1,
          "loanTermYears": 30,
          "buyHomeAppreciation": 0,
          "stockMarketCrashYear": 5,
          "stockMarketCrashDrop": 40,
          "jobLossYear": 3,
          "jobLossDuration": 6,
          "cashHitAmount": -50000,
          "cashHitYear": 10,
          "customVariable": "mortgageRate",
          "customMagnitude": 2,
          "customDuration": "temporary",
          "riskYear": 5,
          "riskPath": "rent",
          "lifeEvent": "golden_decade"
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        let inputs = request.inputs;

        assert_approx(inputs.profile.monthly_income, 5_200.0);
        assert_approx(inputs.profile.current_savings, 80_000.0);
        assert_approx(inputs.profile.investment_rate, 40.0);
        assert_eq!(inputs.profile.income_fluctuation, Some(-10.0));
        assert_eq!(inputs.profile.legacy_debt, LegacyDebtTreatment::SubtractFromBoth);
        assert_approx(inputs.rent.monthly_rent, 1_400.0);
        assert_approx(inputs.buy.home_price, 320_000.0);
        assert_eq!(inputs.buy.loan_term_years, 30);
        assert_eq!(inputs.buy.home_appreciation, Some(0.0));
        assert_eq!(inputs.stress.stock_market_crash_year, Some(5));
        assert_eq!(inputs.stress.job_loss_duration_months, 6);
        assert_approx(inputs.stress.cash_hit_amount, -50_000.0);

        let options = request.options;
        assert_eq!(
            options.custom,
            Some(TimedShock::temporary(ShockVariable::MortgageRate, 2.0))
        );
        assert_eq!(options.risk_horizon, RiskHorizon::Year5);
        assert_eq!(options.risk_path, HousingPath::Rent);
        assert_eq!(options.life_event, Some(LifeEvent::GoldenDecade));
    }

    #[test]
    fn api_request_rejects_custom_magnitude_beyond_five_points() {
        let err = api_request_from_json(
            r#"{"customVariable": "investment-return", "customMagnitude": 7}"#,
        )
        .expect_err("must reject magnitude");
        assert!(err.to_string().contains("--customMagnitude"));
    }

    #[test]
    fn api_request_requires_variable_for_custom_magnitude() {
        let err = api_request_from_json(r#"{"customMagnitude": 2}"#)
            .expect_err("must require variable");
        assert!(err.to_string().contains("--customVariable"));
    }

    #[test]
    fn api_request_rejects_unsupported_risk_horizon() {
        let err = api_request_from_json(r#"{"riskYear": 4}"#).expect_err("must reject year");
        assert!(err.to_string().contains("--riskYear"));
    }

    #[test]
    fn api_request_rejects_malformed_json() {
        let err = api_request_from_json(r#"{"homePrice": "lots"}"#).expect_err("bad type");
        assert!(matches!(err, ApiError::InvalidPayload(_)));
    }

    #[test]
    fn refinance_rate_defaults_to_one_point_lower() {
        let request = api_request_from_json("{}").expect("defaults");
        assert_approx(resolved_refinance_rate(&request), 2.5);

        let request = api_request_from_json(r#"{"mortgageRate": 0.5}"#).expect("low rate");
        assert_eq!(resolved_refinance_rate(&request), 0.0);
    }

    #[test]
    fn custom_zero_magnitude_yields_no_custom_outcome() {
        let request = api_request_from_json(
            r#"{"customVariable": "inflation", "customMagnitude": 0}"#,
        )
        .expect("valid request");
        let response = sensitivity_response(&request).expect("response");
        assert!(response.custom.is_none());
        assert_eq!(response.report.shocks.len(), 6);
    }

    #[test]
    fn project_response_serialization_contains_expected_fields() {
        let request = api_request_from_json("{}").expect("defaults");
        let response = project_response(&request).expect("response");
        assert_eq!(response.projections.len(), 360);

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"breakEvenMonth\""));
        assert!(json.contains("\"upfront\""));
        assert!(json.contains("\"netWorthBuy\""));
        assert!(json.contains("\"rentPortfolioValue\""));
    }

    #[test]
    fn sensitivity_response_flattens_report() {
        let request = api_request_from_json(
            r#"{"customVariable": "salary-growth", "customMagnitude": -2}"#,
        )
        .expect("valid request");
        let response = sensitivity_response(&request).expect("response");
        assert!(response.custom.is_some());

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"baseline\""));
        assert!(json.contains("\"shocks\""));
        assert!(json.contains("\"deltaSpread\""));
        assert!(json.contains("\"custom\""));
    }

    #[test]
    fn risk_and_life_event_responses_follow_options() {
        let request = api_request_from_json(
            r#"{"riskYear": 10, "riskPath": "rent", "lifeEvent": "inheritance"}"#,
        )
        .expect("valid request");

        let risk = risk_response(&request).expect("risk");
        assert_eq!(risk.path, HousingPath::Rent);
        assert_eq!(risk.horizon, RiskHorizon::Year10);
        assert_eq!(risk.scores.market, 100.0);

        let events = life_events_response(&request).expect("life events");
        assert_eq!(events.impacts.len(), 1);
        assert_eq!(events.impacts[0].event, LifeEvent::Inheritance);
    }

    #[test]
    fn tools_response_bundles_all_three_tools() {
        let request = api_request_from_json(r#"{"refinanceMonth": 60, "growthYears": 5}"#)
            .expect("valid request");
        let tools = tools_response(&request).expect("tools");
        assert_eq!(tools.refinance.term_years, 20);
        assert!(tools.leverage.is_some());
        assert_eq!(tools.compound_growth.len(), 6);
    }

    #[test]
    fn errors_render_as_json_bad_request_without_caching() {
        let response = ApiError::validation("--home-price", "must be > 0").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );
    }

    async fn send(request: axum::http::Request<axum::body::Body>) -> (StatusCode, Response) {
        let response = router().oneshot(request).await.expect("router is infallible");
        (response.status(), response)
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn post_json(uri: &str, body: &str) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .expect("request")
    }

    fn get(uri: &str) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(axum::body::Body::empty())
            .expect("request")
    }

    fn assert_json_no_store(response: &Response) {
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );
    }

    #[tokio::test]
    async fn router_serves_projection_with_affordability() {
        let (status, response) = send(post_json("/api/project", "{}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_json_no_store(&response);
        let body = json_body(response).await;
        assert_eq!(body["projections"].as_array().map(Vec::len), Some(360));
        assert_eq!(body["summary"]["affordability"]["insufficientSavings"], false);
        assert_eq!(body["summary"]["affordability"]["requiredCash"], 36_000.0);
    }

    #[tokio::test]
    async fn router_rejects_mistyped_body_as_json_bad_request() {
        let (status, response) = send(post_json("/api/project", r#"{"homePrice":"lots"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_json_no_store(&response);
        let body = json_body(response).await;
        let message = body["error"].as_str().expect("error message");
        assert!(message.starts_with("Invalid JSON body"), "{message}");
    }

    #[tokio::test]
    async fn router_rejects_missing_content_type_as_json_bad_request() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/sensitivity")
            .body(axum::body::Body::from("{}"))
            .expect("request");
        let (status, response) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_json_no_store(&response);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn router_rejects_bad_query_as_json_bad_request() {
        let (status, response) = send(get("/api/risk?riskYear=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_json_no_store(&response);
        let body = json_body(response).await;
        let message = body["error"].as_str().expect("error message");
        assert!(message.starts_with("Invalid query string"), "{message}");
    }

    #[tokio::test]
    async fn router_reports_validation_errors_and_unknown_routes_as_json() {
        let (status, response) = send(get("/api/risk?riskYear=4")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_json_no_store(&response);
        assert!(json_body(response).await["error"].is_string());

        let (status, response) = send(get("/api/nowhere")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "Not found");
    }
}
