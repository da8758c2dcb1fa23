use serde::{Deserialize, Serialize};

/// Number of simulated months in one projection run (30 years).
pub const PROJECTION_MONTHS: u32 = 360;

/// How legacy non-mortgage debt enters the two starting liquid balances.
///
/// Both variants treat the paths symmetrically so the comparison stays fair.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegacyDebtTreatment {
    #[default]
    ExcludeFromBoth,
    SubtractFromBoth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProfile {
    pub monthly_income: f64,
    pub current_savings: f64,
    pub current_debt: f64,
    pub expected_salary_growth: f64,
    /// Share of disposable income invested each month, 0..=100.
    pub investment_rate: f64,
    pub minimum_living_expenses: Option<f64>,
    pub target_emergency_fund_months: Option<f64>,
    /// Flat income multiplier in percent, -50..=50.
    pub income_fluctuation: Option<f64>,
    #[serde(default)]
    pub legacy_debt: LegacyDebtTreatment,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSentiment {
    pub home_appreciation: f64,
    pub investment_return: f64,
    pub inflation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentScenario {
    pub monthly_rent: f64,
    pub renters_insurance: f64,
    pub other_monthly_costs: f64,
    pub one_time_fees: f64,
    pub rent_inflation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyScenario {
    pub home_price: f64,
    pub down_payment_percent: f64,
    pub mortgage_rate: f64,
    pub loan_term_years: u32,
    pub property_tax_rate: f64,
    pub maintenance_monthly: f64,
    pub buying_closing_costs: f64,
    /// Percent of the home value lost on sale; zero falls back to 6%.
    pub selling_closing_costs: f64,
    /// Overrides `MarketSentiment::home_appreciation` when set.
    pub home_appreciation: Option<f64>,
}

/// Shock configuration layered on top of a scenario. `Default` is neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StressTestParams {
    pub house_price_shock: f64,
    pub rent_market_shock: f64,
    pub interest_rate_shock: f64,
    pub stock_market_crash_year: Option<u32>,
    pub stock_market_crash_drop: f64,
    pub job_loss_year: Option<u32>,
    /// Zero means a full year.
    pub job_loss_duration_months: u32,
    pub cash_hit_amount: f64,
    pub cash_hit_year: Option<u32>,
    pub additional_monthly_expenses: f64,
}

/// The five input records of a projection run, bundled so analysis layers can
/// derive perturbed copies without touching the caller's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionInputs {
    pub profile: FinancialProfile,
    pub rent: RentScenario,
    pub buy: BuyScenario,
    pub sentiment: MarketSentiment,
    pub stress: StressTestParams,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HousingPath {
    Buy,
    Rent,
}

impl HousingPath {
    /// Winner of a buy-minus-rent spread; ties go to buying.
    pub fn from_spread(spread: f64) -> Self {
        if spread >= 0.0 {
            HousingPath::Buy
        } else {
            HousingPath::Rent
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCashFlow {
    pub month: u32,
    pub year: u32,
    /// Income actually received this month (zero during a job-loss window).
    pub income: f64,

    pub rent_payment: f64,
    pub rent_insurance: f64,
    pub rent_total_outflow: f64,
    pub rent_invested: f64,
    pub rent_portfolio_value: f64,

    pub mortgage_payment: f64,
    pub interest_payment: f64,
    pub principal_payment: f64,
    pub property_tax: f64,
    pub maintenance: f64,
    pub buy_total_outflow: f64,
    pub home_value: f64,
    pub remaining_loan: f64,
    pub home_equity: f64,
    pub buy_invested: f64,
    pub buy_portfolio_value: f64,

    pub net_worth_rent: f64,
    pub net_worth_buy: f64,
}

impl MonthlyCashFlow {
    pub fn spread(&self) -> f64 {
        self.net_worth_buy - self.net_worth_rent
    }

    pub fn net_worth(&self, path: HousingPath) -> f64 {
        match path {
            HousingPath::Buy => self.net_worth_buy,
            HousingPath::Rent => self.net_worth_rent,
        }
    }

    pub fn portfolio_value(&self, path: HousingPath) -> f64 {
        match path {
            HousingPath::Buy => self.buy_portfolio_value,
            HousingPath::Rent => self.rent_portfolio_value,
        }
    }
}
