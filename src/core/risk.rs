use serde::{Deserialize, Serialize};

use super::types::{FinancialProfile, HousingPath, MonthlyCashFlow};

pub const DEFAULT_LIVING_EXPENSES: f64 = 1_500.0;
/// Payment multiplier approximating a two-point rate rise on the buy path.
const RATE_STRESS_PAYMENT_FACTOR: f64 = 1.25;
const INCOME_STRESS_FACTOR: f64 = 0.8;

const SCORE_LOW_RISK: f64 = 100.0;
const SCORE_MEDIUM_RISK: f64 = 70.0;
const SCORE_HIGH_RISK: f64 = 30.0;

/// Supported look-ahead points for a risk assessment.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum RiskHorizon {
    #[default]
    Now,
    Year3,
    Year5,
    Year10,
}

impl RiskHorizon {
    pub fn years(self) -> u32 {
        match self {
            RiskHorizon::Now => 0,
            RiskHorizon::Year3 => 3,
            RiskHorizon::Year5 => 5,
            RiskHorizon::Year10 => 10,
        }
    }
}

impl TryFrom<u32> for RiskHorizon {
    type Error = String;

    fn try_from(years: u32) -> Result<Self, Self::Error> {
        match years {
            0 => Ok(RiskHorizon::Now),
            3 => Ok(RiskHorizon::Year3),
            5 => Ok(RiskHorizon::Year5),
            10 => Ok(RiskHorizon::Year10),
            other => Err(format!("risk horizon must be 0, 3, 5 or 10 years, got {other}")),
        }
    }
}

impl From<RiskHorizon> for u32 {
    fn from(horizon: RiskHorizon) -> Self {
        horizon.years()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RiskOptions {
    /// Non-housing debt service per month.
    pub monthly_debt_service: f64,
    /// Falls back to the profile's minimum living expenses, then 1500.
    pub living_expenses: Option<f64>,
}

impl RiskOptions {
    fn living_expenses_for(&self, profile: &FinancialProfile) -> f64 {
        self.living_expenses
            .or(profile.minimum_living_expenses)
            .unwrap_or(DEFAULT_LIVING_EXPENSES)
    }
}

/// Raw ratios; percentages except `runway` (months) and `price_to_income`
/// (years of gross income).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub dti: f64,
    pub runway: f64,
    pub leverage: f64,
    pub price_to_income: f64,
    pub shock_dti: f64,
    pub burn_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScores {
    pub cash_flow: f64,
    pub liquidity: f64,
    pub leverage: f64,
    pub market: f64,
    pub shock: f64,
    pub holding: f64,
}

impl RiskScores {
    pub fn from_metrics(metrics: &RiskMetrics, path: HousingPath) -> Self {
        Self {
            cash_flow: score_lower_is_better(metrics.dti, 30.0, 40.0),
            liquidity: score_higher_is_better(metrics.runway, 12.0, 6.0),
            leverage: score_lower_is_better(metrics.leverage, 40.0, 60.0),
            market: match path {
                HousingPath::Rent => SCORE_LOW_RISK,
                HousingPath::Buy => score_lower_is_better(metrics.price_to_income, 5.0, 8.0),
            },
            shock: score_lower_is_better(metrics.shock_dti, 40.0, 50.0),
            holding: score_lower_is_better(metrics.burn_rate, 15.0, 25.0),
        }
    }

    pub fn composite(&self) -> f64 {
        let all = [
            self.cash_flow,
            self.liquidity,
            self.leverage,
            self.market,
            self.shock,
            self.holding,
        ];
        all.iter().sum::<f64>() / all.len() as f64
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum RiskTier {
    Secure,
    Stable,
    Critical,
}

impl RiskTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskTier::Secure
        } else if score >= 60.0 {
            RiskTier::Stable
        } else {
            RiskTier::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskPoint {
    pub years: u32,
    pub metrics: RiskMetrics,
    pub scores: RiskScores,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub path: HousingPath,
    pub horizon: RiskHorizon,
    pub metrics: RiskMetrics,
    pub scores: RiskScores,
    pub composite: f64,
    pub tier: RiskTier,
    /// Now, year 5 and year 10, for trend display.
    pub trajectory: Vec<RiskPoint>,
}

/// Scores one path at `horizon`. Returns `None` only for an empty projection.
pub fn assess_risk(
    projections: &[MonthlyCashFlow],
    profile: &FinancialProfile,
    path: HousingPath,
    horizon: RiskHorizon,
    options: &RiskOptions,
) -> Option<RiskAssessment> {
    let metrics = risk_metrics(projections, profile, path, horizon.years(), options)?;
    let scores = RiskScores::from_metrics(&metrics, path);
    let composite = scores.composite();

    let trajectory = [0, 5, 10]
        .into_iter()
        .filter_map(|years| {
            let metrics = risk_metrics(projections, profile, path, years, options)?;
            Some(RiskPoint {
                years,
                metrics,
                scores: RiskScores::from_metrics(&metrics, path),
            })
        })
        .collect();

    Some(RiskAssessment {
        path,
        horizon,
        metrics,
        scores,
        composite,
        tier: RiskTier::from_score(composite),
        trajectory,
    })
}

/// Metrics for `path` using the snapshot that closes year `years` (the first
/// month for year 0) and the income projected to that year.
pub fn risk_metrics(
    projections: &[MonthlyCashFlow],
    profile: &FinancialProfile,
    path: HousingPath,
    years: u32,
    options: &RiskOptions,
) -> Option<RiskMetrics> {
    let index = (years * 12).saturating_sub(1) as usize;
    let row = projections.get(index).or_else(|| projections.first())?;

    let income =
        profile.monthly_income * (1.0 + profile.expected_salary_growth / 100.0).powi(years as i32);
    let debt_service = options.monthly_debt_service;

    let (housing, liquid, property, mortgage_debt, unrecoverable) = match path {
        HousingPath::Buy => (
            row.mortgage_payment + row.property_tax + row.maintenance,
            row.buy_portfolio_value,
            row.home_value,
            row.remaining_loan,
            row.property_tax + row.maintenance + row.interest_payment,
        ),
        HousingPath::Rent => (
            row.rent_total_outflow,
            row.rent_portfolio_value,
            0.0,
            0.0,
            row.rent_total_outflow,
        ),
    };

    let dti = ratio(housing + debt_service, income) * 100.0;
    let runway = ratio(
        liquid,
        housing + debt_service + options.living_expenses_for(profile),
    );

    let total_assets = property + liquid;
    let leverage = if total_assets > 0.0 {
        (mortgage_debt + profile.current_debt) / total_assets * 100.0
    } else {
        0.0
    };

    let price_to_income = match path {
        HousingPath::Buy => ratio(row.home_value, income * 12.0),
        HousingPath::Rent => 0.0,
    };

    let income_shock = ratio(housing + debt_service, income * INCOME_STRESS_FACTOR) * 100.0;
    let rate_shock = match path {
        HousingPath::Buy => {
            let stressed = row.mortgage_payment * RATE_STRESS_PAYMENT_FACTOR
                + row.property_tax
                + row.maintenance;
            ratio(stressed + debt_service, income) * 100.0
        }
        HousingPath::Rent => 0.0,
    };

    Some(RiskMetrics {
        dti,
        runway,
        leverage,
        price_to_income,
        shock_dti: income_shock.max(rate_shock),
        burn_rate: ratio(unrecoverable, income) * 100.0,
    })
}

pub fn score_lower_is_better(value: f64, low: f64, high: f64) -> f64 {
    if value < low {
        SCORE_LOW_RISK
    } else if value <= high {
        SCORE_MEDIUM_RISK
    } else {
        SCORE_HIGH_RISK
    }
}

pub fn score_higher_is_better(value: f64, high: f64, low: f64) -> f64 {
    if value > high {
        SCORE_LOW_RISK
    } else if value >= low {
        SCORE_MEDIUM_RISK
    } else {
        SCORE_HIGH_RISK
    }
}

// 0/0 is treated as no exposure; x/0 saturates so it scores as worst case.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator != 0.0 {
        numerator / denominator
    } else if numerator == 0.0 {
        0.0
    } else {
        numerator.signum() * f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{project, tests::sample_inputs};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn flat_profile(income: f64) -> FinancialProfile {
        let mut profile = sample_inputs().profile;
        profile.monthly_income = income;
        profile.expected_salary_growth = 0.0;
        profile
    }

    fn snapshot() -> MonthlyCashFlow {
        MonthlyCashFlow {
            month: 1,
            year: 1,
            income: 5_000.0,
            rent_total_outflow: 1_800.0,
            rent_portfolio_value: 60_000.0,
            mortgage_payment: 900.0,
            interest_payment: 500.0,
            property_tax: 100.0,
            maintenance: 200.0,
            home_value: 250_000.0,
            remaining_loan: 170_000.0,
            buy_portfolio_value: 30_000.0,
            ..MonthlyCashFlow::default()
        }
    }

    #[test]
    fn buy_path_metrics_and_scores() {
        let profile = flat_profile(5_000.0);
        let assessment = assess_risk(
            &[snapshot()],
            &profile,
            HousingPath::Buy,
            RiskHorizon::Now,
            &RiskOptions::default(),
        )
        .expect("assessment");
        let m = assessment.metrics;

        assert_approx(m.dti, 24.0);
        assert_approx(m.runway, 30_000.0 / 2_700.0);
        assert_approx(m.leverage, 170_000.0 / 280_000.0 * 100.0);
        assert_approx(m.price_to_income, 250_000.0 / 60_000.0);
        assert_approx(m.shock_dti, 30.0);
        assert_approx(m.burn_rate, 16.0);

        let s = assessment.scores;
        assert_eq!(
            [s.cash_flow, s.liquidity, s.leverage, s.market, s.shock, s.holding],
            [100.0, 70.0, 30.0, 100.0, 100.0, 70.0]
        );
        assert_approx(assessment.composite, 470.0 / 6.0);
        assert_eq!(assessment.tier, RiskTier::Stable);
    }

    #[test]
    fn rent_path_scores_market_as_safe() {
        let profile = flat_profile(5_000.0);
        let assessment = assess_risk(
            &[snapshot()],
            &profile,
            HousingPath::Rent,
            RiskHorizon::Now,
            &RiskOptions::default(),
        )
        .expect("assessment");
        let m = assessment.metrics;

        assert_approx(m.dti, 36.0);
        assert_approx(m.leverage, 0.0);
        assert_eq!(m.price_to_income, 0.0);
        assert_approx(m.shock_dti, 45.0);
        assert_approx(m.burn_rate, 36.0);
        assert_eq!(assessment.scores.market, 100.0);
        assert_approx(assessment.composite, 470.0 / 6.0);
    }

    #[test]
    fn legacy_debt_and_debt_service_raise_exposure() {
        let mut profile = flat_profile(5_000.0);
        profile.current_debt = 20_000.0;
        let options = RiskOptions {
            monthly_debt_service: 300.0,
            living_expenses: Some(2_000.0),
        };
        let m = risk_metrics(&[snapshot()], &profile, HousingPath::Rent, 0, &options)
            .expect("metrics");

        assert_approx(m.dti, 42.0);
        assert_approx(m.runway, 60_000.0 / 4_100.0);
        assert_approx(m.leverage, 20_000.0 / 60_000.0 * 100.0);
    }

    #[test]
    fn living_expenses_fall_back_to_profile_then_default() {
        let mut profile = flat_profile(5_000.0);
        let options = RiskOptions::default();
        assert_eq!(options.living_expenses_for(&profile), 1_500.0);
        profile.minimum_living_expenses = Some(2_200.0);
        assert_eq!(options.living_expenses_for(&profile), 2_200.0);
    }

    #[test]
    fn horizon_picks_closing_snapshot_and_projected_income() {
        let inputs = sample_inputs();
        let projections = project(&inputs);
        let m = risk_metrics(
            &projections,
            &inputs.profile,
            HousingPath::Buy,
            5,
            &RiskOptions::default(),
        )
        .expect("metrics");

        let row = &projections[59];
        let income = 4_500.0 * 1.03_f64.powi(5);
        let housing = row.mortgage_payment + row.property_tax + row.maintenance;
        assert_approx(m.dti, housing / income * 100.0);
        assert_approx(m.price_to_income, row.home_value / (income * 12.0));
    }

    #[test]
    fn trajectory_reports_now_year_five_and_year_ten() {
        let inputs = sample_inputs();
        let assessment = assess_risk(
            &project(&inputs),
            &inputs.profile,
            HousingPath::Buy,
            RiskHorizon::Year3,
            &RiskOptions::default(),
        )
        .expect("assessment");
        let years: Vec<u32> = assessment.trajectory.iter().map(|p| p.years).collect();
        assert_eq!(years, vec![0, 5, 10]);
    }

    #[test]
    fn zero_income_scores_worst_case_without_nan() {
        let profile = flat_profile(0.0);
        let m = risk_metrics(&[snapshot()], &profile, HousingPath::Buy, 0, &RiskOptions::default())
            .expect("metrics");
        assert!(m.dti.is_infinite());
        assert!(!m.burn_rate.is_nan());
        assert_eq!(score_lower_is_better(m.dti, 30.0, 40.0), 30.0);
    }

    #[test]
    fn empty_projection_has_no_assessment() {
        let profile = flat_profile(5_000.0);
        assert!(
            assess_risk(&[], &profile, HousingPath::Buy, RiskHorizon::Now, &RiskOptions::default())
                .is_none()
        );
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(RiskTier::from_score(80.0), RiskTier::Secure);
        assert_eq!(RiskTier::from_score(79.9), RiskTier::Stable);
        assert_eq!(RiskTier::from_score(60.0), RiskTier::Stable);
        assert_eq!(RiskTier::from_score(59.9), RiskTier::Critical);
    }

    #[test]
    fn score_thresholds_are_inclusive_at_the_upper_band() {
        assert_eq!(score_lower_is_better(29.9, 30.0, 40.0), 100.0);
        assert_eq!(score_lower_is_better(40.0, 30.0, 40.0), 70.0);
        assert_eq!(score_lower_is_better(40.1, 30.0, 40.0), 30.0);
        assert_eq!(score_higher_is_better(12.0, 12.0, 6.0), 70.0);
        assert_eq!(score_higher_is_better(6.0, 12.0, 6.0), 70.0);
        assert_eq!(score_higher_is_better(5.9, 12.0, 6.0), 30.0);
    }

    #[test]
    fn horizon_accepts_only_supported_years() {
        assert_eq!(RiskHorizon::try_from(5), Ok(RiskHorizon::Year5));
        assert!(RiskHorizon::try_from(7).is_err());
        assert_eq!(u32::from(RiskHorizon::Year10), 10);
    }
}
