use serde::Serialize;

use super::amortization::{calculate_mortgage_payment, total_interest};
use super::types::{BuyScenario, MonthlyCashFlow};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanCost {
    pub rate: f64,
    pub payment: f64,
    pub total_interest: f64,
}

impl LoanCost {
    fn at(principal: f64, rate: f64, term_years: u32) -> Self {
        Self {
            rate,
            payment: calculate_mortgage_payment(principal, rate, term_years),
            total_interest: total_interest(principal, rate, term_years),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinanceComparison {
    pub principal: f64,
    pub term_years: u32,
    pub current: LoanCost,
    pub refinanced: LoanCost,
    /// Both savings figures are floored at zero; a higher new rate saves nothing.
    pub monthly_savings: f64,
    pub total_savings: f64,
}

pub fn compare_refinance(
    principal: f64,
    term_years: u32,
    current_rate: f64,
    new_rate: f64,
) -> RefinanceComparison {
    let term_years = term_years.max(1);
    let current = LoanCost::at(principal, current_rate, term_years);
    let refinanced = LoanCost::at(principal, new_rate, term_years);
    RefinanceComparison {
        principal,
        term_years,
        current,
        refinanced,
        monthly_savings: (current.payment - refinanced.payment).max(0.0),
        total_savings: (current.total_interest - refinanced.total_interest).max(0.0),
    }
}

/// Refinancing the balance outstanding at `month` over the remaining term.
/// Before the loan exists (or after it is repaid) the original loan amount is
/// used instead.
pub fn refinance_at_month(
    projections: &[MonthlyCashFlow],
    buy: &BuyScenario,
    month: u32,
    new_rate: f64,
) -> RefinanceComparison {
    let index = (month.max(1) - 1) as usize;
    let outstanding = projections
        .get(index)
        .or_else(|| projections.first())
        .map(|row| row.remaining_loan)
        .unwrap_or(0.0);
    let principal = if outstanding > 0.0 {
        outstanding
    } else {
        buy.home_price * (1.0 - buy.down_payment_percent / 100.0)
    };
    let remaining_term = buy.loan_term_years.saturating_sub(month / 12).max(1);
    compare_refinance(principal, remaining_term, buy.mortgage_rate, new_rate)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPoint {
    pub year: u32,
    pub contributions: f64,
    pub balance: f64,
    pub interest: f64,
}

/// Yearly future value of a starting principal plus level monthly
/// contributions, compounded monthly. Year 0 is included.
pub fn compound_growth_schedule(
    principal: f64,
    monthly_contribution: f64,
    annual_rate: f64,
    years: u32,
) -> Vec<GrowthPoint> {
    let monthly_rate = annual_rate / 100.0 / 12.0;
    (0..=years)
        .map(|year| {
            let contributions = principal + monthly_contribution * 12.0 * f64::from(year);
            let balance = if annual_rate == 0.0 {
                contributions
            } else {
                let factor = (1.0 + monthly_rate).powf(12.0 * f64::from(year));
                principal * factor + monthly_contribution * (factor - 1.0) / monthly_rate
            };
            GrowthPoint {
                year,
                contributions,
                balance,
                interest: balance - contributions,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageOutcome {
    pub down_payment: f64,
    pub loan_amount: f64,
    pub new_home_value: f64,
    pub equity: f64,
    pub roi_percent: f64,
    pub leverage_ratio: f64,
}

/// Return on the down payment after a price move of `price_change_percent`.
/// `None` without a down payment, where neither ratio is defined.
pub fn leverage_outcome(
    home_price: f64,
    down_payment_percent: f64,
    price_change_percent: f64,
) -> Option<LeverageOutcome> {
    let down_payment = home_price * down_payment_percent / 100.0;
    if down_payment <= 0.0 {
        return None;
    }

    let loan_amount = home_price - down_payment;
    let new_home_value = home_price * (1.0 + price_change_percent / 100.0);
    let equity = new_home_value - loan_amount;
    Some(LeverageOutcome {
        down_payment,
        loan_amount,
        new_home_value,
        equity,
        roi_percent: (equity - down_payment) / down_payment * 100.0,
        leverage_ratio: home_price / down_payment,
    })
}
