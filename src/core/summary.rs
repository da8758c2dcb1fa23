use serde::Serialize;

use super::amortization::calculate_mortgage_payment;
use super::types::{HousingPath, MonthlyCashFlow, ProjectionInputs};

/// First month in which buying is strictly ahead of renting.
pub fn break_even_month(projections: &[MonthlyCashFlow]) -> Option<u32> {
    projections
        .iter()
        .find(|row| row.net_worth_buy > row.net_worth_rent)
        .map(|row| row.month)
}

/// How the starting savings are split on day one, per path. Reserves are
/// shown floored at zero even though the engine carries a negative balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpfrontCosts {
    pub down_payment: f64,
    pub closing_costs: f64,
    pub buy_invested_reserves: f64,
    pub rent_fees: f64,
    pub rent_invested: f64,
}

impl UpfrontCosts {
    pub fn from_inputs(inputs: &ProjectionInputs) -> Self {
        let buy = &inputs.buy;
        let savings = inputs.profile.current_savings;
        let down_payment = buy.home_price * buy.down_payment_percent / 100.0;
        let closing_costs = buy.home_price * buy.buying_closing_costs / 100.0;
        Self {
            down_payment,
            closing_costs,
            buy_invested_reserves: (savings - down_payment - closing_costs).max(0.0),
            rent_fees: inputs.rent.one_time_fees,
            rent_invested: (savings - inputs.rent.one_time_fees).max(0.0),
        }
    }
}

/// Day-one affordability checks on the unstressed inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Affordability {
    /// Rent plus insurance plus other monthly costs.
    pub rent_monthly_cost: f64,
    /// Principal and interest plus property tax plus maintenance.
    pub buy_monthly_cost: f64,
    pub rent_exceeds_income: bool,
    pub buy_exceeds_income: bool,
    /// Down payment plus buying closing costs.
    pub required_cash: f64,
    pub insufficient_savings: bool,
}

impl Affordability {
    pub fn from_inputs(inputs: &ProjectionInputs) -> Self {
        let (profile, rent, buy) = (&inputs.profile, &inputs.rent, &inputs.buy);
        let income = profile.monthly_income;

        let rent_monthly_cost = rent.monthly_rent + rent.renters_insurance + rent.other_monthly_costs;

        let down_payment = buy.home_price * buy.down_payment_percent / 100.0;
        let principal = buy.home_price - down_payment;
        let mortgage = calculate_mortgage_payment(principal, buy.mortgage_rate, buy.loan_term_years);
        let tax = buy.home_price * buy.property_tax_rate / 100.0 / 12.0;
        let buy_monthly_cost = mortgage + tax + buy.maintenance_monthly;

        let required_cash = down_payment + buy.home_price * buy.buying_closing_costs / 100.0;

        Self {
            rent_monthly_cost,
            buy_monthly_cost,
            rent_exceeds_income: income < rent_monthly_cost,
            buy_exceeds_income: income < buy_monthly_cost,
            required_cash,
            insufficient_savings: profile.current_savings < required_cash,
        }
    }
}

/// Month 1, every twelfth month, and the final month.
pub fn annual_schedule(projections: &[MonthlyCashFlow]) -> Vec<MonthlyCashFlow> {
    let last = projections.len() as u32;
    projections
        .iter()
        .filter(|row| row.month % 12 == 0 || row.month == 1 || row.month == last)
        .copied()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub final_net_worth_buy: f64,
    pub final_net_worth_rent: f64,
    pub final_spread: f64,
    pub winner: HousingPath,
    pub break_even_month: Option<u32>,
    pub break_even_year: Option<u32>,
    pub upfront: UpfrontCosts,
    pub affordability: Affordability,
    pub annual: Vec<MonthlyCashFlow>,
}

pub fn summarize(inputs: &ProjectionInputs, projections: &[MonthlyCashFlow]) -> ProjectionSummary {
    let last = projections.last().copied().unwrap_or_default();
    let break_even = break_even_month(projections);
    ProjectionSummary {
        final_net_worth_buy: last.net_worth_buy,
        final_net_worth_rent: last.net_worth_rent,
        final_spread: last.spread(),
        winner: HousingPath::from_spread(last.spread()),
        break_even_month: break_even,
        break_even_year: break_even.map(|month| month.div_ceil(12)),
        upfront: UpfrontCosts::from_inputs(inputs),
        affordability: Affordability::from_inputs(inputs),
        annual: annual_schedule(projections),
    }
}
