use serde::{Deserialize, Serialize};

/// Last month a temporary shock is in force; from the next month on the
/// variable reverts to its unshocked value.
pub const TEMPORARY_SHOCK_MONTHS: u32 = 60;

/// The market and scenario rates a shock can target. Every variant is an
/// annual rate in percentage points.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShockVariable {
    #[serde(alias = "investmentReturn", alias = "investment_return")]
    InvestmentReturn,
    #[serde(alias = "homeAppreciation", alias = "home_appreciation")]
    HomeAppreciation,
    #[serde(alias = "rentInflation", alias = "rent_inflation")]
    RentInflation,
    #[serde(alias = "salaryGrowth", alias = "salary_growth")]
    SalaryGrowth,
    #[serde(alias = "mortgageRate", alias = "mortgage_rate")]
    MortgageRate,
    #[serde(alias = "generalInflation", alias = "general_inflation")]
    Inflation,
}

impl ShockVariable {
    pub const ALL: [ShockVariable; 6] = [
        ShockVariable::InvestmentReturn,
        ShockVariable::HomeAppreciation,
        ShockVariable::RentInflation,
        ShockVariable::SalaryGrowth,
        ShockVariable::MortgageRate,
        ShockVariable::Inflation,
    ];

    /// The one-point move used by the standardized analysis, signed in the
    /// direction that hurts at least one path.
    pub fn standard_shift(self) -> f64 {
        match self {
            ShockVariable::InvestmentReturn => -1.0,
            ShockVariable::HomeAppreciation => -1.0,
            ShockVariable::RentInflation => 1.0,
            ShockVariable::SalaryGrowth => -1.0,
            ShockVariable::MortgageRate => 1.0,
            ShockVariable::Inflation => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShockVariable::InvestmentReturn => "Investment Return",
            ShockVariable::HomeAppreciation => "Home Appreciation",
            ShockVariable::RentInflation => "Rent Inflation",
            ShockVariable::SalaryGrowth => "Salary Growth",
            ShockVariable::MortgageRate => "Mortgage Rate",
            ShockVariable::Inflation => "General Inflation",
        }
    }

    pub fn badge(self) -> String {
        let short = match self {
            ShockVariable::InvestmentReturn => "Inv. Return",
            ShockVariable::HomeAppreciation => "Home Appr.",
            ShockVariable::RentInflation => "Rent Infl.",
            ShockVariable::SalaryGrowth => "Salary Growth",
            ShockVariable::MortgageRate => "Mortgage Rate",
            ShockVariable::Inflation => "Inflation",
        };
        let shift = self.standard_shift();
        let sign = if shift < 0.0 { '−' } else { '+' };
        format!("{short} {sign}{}%", shift.abs())
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShockDuration {
    #[default]
    Permanent,
    Temporary,
}

/// Per-month rate evaluation strategy for the projection engine.
///
/// `base` is the unshocked annual rate for `variable`; the return value is the
/// rate in force during `month` (1-based).
pub trait ShockResolver {
    fn resolve(&self, variable: ShockVariable, month: u32, base: f64) -> f64;
}

/// Baseline resolver: every variable keeps its base rate.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoShock;

impl ShockResolver for NoShock {
    fn resolve(&self, _variable: ShockVariable, _month: u32, base: f64) -> f64 {
        base
    }
}

/// Additive single-variable shock with a timing policy.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedShock {
    pub variable: ShockVariable,
    pub magnitude: f64,
    pub duration: ShockDuration,
}

impl TimedShock {
    pub fn permanent(variable: ShockVariable, magnitude: f64) -> Self {
        Self {
            variable,
            magnitude,
            duration: ShockDuration::Permanent,
        }
    }

    pub fn temporary(variable: ShockVariable, magnitude: f64) -> Self {
        Self {
            variable,
            magnitude,
            duration: ShockDuration::Temporary,
        }
    }

    /// The standardized one-point shock for `variable`.
    pub fn standard(variable: ShockVariable) -> Self {
        Self::permanent(variable, variable.standard_shift())
    }

    fn in_force(&self, month: u32) -> bool {
        match self.duration {
            ShockDuration::Permanent => true,
            ShockDuration::Temporary => month <= TEMPORARY_SHOCK_MONTHS,
        }
    }
}

impl ShockResolver for TimedShock {
    fn resolve(&self, variable: ShockVariable, month: u32, base: f64) -> f64 {
        if variable == self.variable && self.in_force(month) {
            base + self.magnitude
        } else {
            base
        }
    }
}
