mod amortization;
mod engine;
mod risk;
mod scenarios;
mod sensitivity;
mod shock;
mod summary;
mod tools;
mod types;

pub use amortization::{calculate_mortgage_payment, total_interest};
pub use engine::{
    calculate_projections, calculate_projections_with_shock, project, project_with,
    project_with_resolver,
};
pub use risk::{
    DEFAULT_LIVING_EXPENSES, RiskAssessment, RiskHorizon, RiskMetrics, RiskOptions, RiskPoint,
    RiskScores, RiskTier, assess_risk, risk_metrics, score_higher_is_better,
    score_lower_is_better,
};
pub use scenarios::{
    InvestmentStyle, LifeEvent, LifeEventImpact, SentimentMode, apply_sentiment_preset,
    life_event_impact, life_event_impacts,
};
pub use sensitivity::{
    CustomShockOutcome, OutcomeSummary, PathDelta, PathRiskFlag, PathRiskKind, SensitivityReport,
    ShockOutcome, baseline_summary, path_risk_flags, run_custom_scenario, run_standard_shock,
    standardized_analysis,
};
pub use shock::{
    NoShock, ShockDuration, ShockResolver, ShockVariable, TEMPORARY_SHOCK_MONTHS, TimedShock,
};
pub use summary::{
    Affordability, ProjectionSummary, UpfrontCosts, annual_schedule, break_even_month, summarize,
};
pub use tools::{
    GrowthPoint, LeverageOutcome, LoanCost, RefinanceComparison, compare_refinance,
    compound_growth_schedule, leverage_outcome, refinance_at_month,
};
pub use types::{
    BuyScenario, FinancialProfile, HousingPath, LegacyDebtTreatment, MarketSentiment,
    MonthlyCashFlow, PROJECTION_MONTHS, ProjectionInputs, RentScenario, StressTestParams,
};
