use super::amortization::calculate_mortgage_payment;
use super::shock::{NoShock, ShockDuration, ShockResolver, ShockVariable, TimedShock};
use super::types::{
    BuyScenario, FinancialProfile, LegacyDebtTreatment, MarketSentiment, MonthlyCashFlow,
    PROJECTION_MONTHS, ProjectionInputs, RentScenario, StressTestParams,
};

/// Annual rate charged on a negative liquid balance instead of market growth.
const DEBT_PENALTY_RATE: f64 = 0.10;
const DEFAULT_SELLING_COST_PERCENT: f64 = 6.0;
const DEFAULT_JOB_LOSS_MONTHS: u32 = 12;

#[derive(Debug, Clone, Copy)]
struct BaseRates {
    investment_return: f64,
    home_appreciation: f64,
    rent_inflation: f64,
    salary_growth: f64,
    inflation: f64,
}

impl BaseRates {
    fn from_inputs(
        profile: &FinancialProfile,
        rent: &RentScenario,
        buy: &BuyScenario,
        sentiment: &MarketSentiment,
    ) -> Self {
        Self {
            investment_return: sentiment.investment_return,
            home_appreciation: buy.home_appreciation.unwrap_or(sentiment.home_appreciation),
            rent_inflation: rent.rent_inflation,
            salary_growth: profile.expected_salary_growth,
            inflation: sentiment.inflation,
        }
    }

    fn for_month<R: ShockResolver + ?Sized>(self, resolver: &R, month: u32) -> MonthlyRates {
        let rate = |variable, base| monthly_rate(resolver.resolve(variable, month, base));
        MonthlyRates {
            investment_return: rate(ShockVariable::InvestmentReturn, self.investment_return),
            home_appreciation: rate(ShockVariable::HomeAppreciation, self.home_appreciation),
            rent_inflation: rate(ShockVariable::RentInflation, self.rent_inflation),
            salary_growth: rate(ShockVariable::SalaryGrowth, self.salary_growth),
            inflation: rate(ShockVariable::Inflation, self.inflation),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MonthlyRates {
    investment_return: f64,
    home_appreciation: f64,
    rent_inflation: f64,
    salary_growth: f64,
    inflation: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Installment {
    payment: f64,
    interest: f64,
    principal: f64,
}

#[derive(Debug)]
struct Mortgage {
    balance: f64,
    monthly_rate: f64,
    fixed_payment: f64,
    payments_left: u32,
}

impl Mortgage {
    /// The rate is resolved once, at month 1: a fixed-rate loan keeps its
    /// schedule for life whatever happens to market rates afterwards.
    fn originate<R: ShockResolver + ?Sized>(
        buy: &BuyScenario,
        stress: &StressTestParams,
        resolver: &R,
    ) -> Self {
        let principal = buy.home_price * (1.0 - buy.down_payment_percent / 100.0);
        let base_rate = buy.mortgage_rate + stress.interest_rate_shock;
        let annual_rate = resolver
            .resolve(ShockVariable::MortgageRate, 1, base_rate)
            .max(0.0);
        Self {
            balance: principal,
            monthly_rate: monthly_rate(annual_rate),
            fixed_payment: calculate_mortgage_payment(principal, annual_rate, buy.loan_term_years),
            payments_left: buy.loan_term_years.saturating_mul(12),
        }
    }

    fn next_installment(&self) -> Installment {
        if self.balance <= 0.0 || self.payments_left == 0 {
            return Installment::default();
        }

        let interest = self.balance * self.monthly_rate;
        let mut payment = self.fixed_payment;
        let mut principal = payment - interest;
        // The last scheduled payment clears whatever rounding left behind.
        if principal > self.balance || self.payments_left == 1 {
            principal = self.balance;
            payment = principal + interest;
        }
        Installment {
            payment,
            interest,
            principal,
        }
    }

    fn repay(&mut self, principal: f64) {
        self.balance = (self.balance - principal).max(0.0);
        self.payments_left = self.payments_left.saturating_sub(1);
    }
}

/// One-off events that land on a given month.
#[derive(Debug, Clone, Copy)]
struct MonthEvents {
    income_lost: bool,
    crash_multiplier: f64,
    cash_hit: f64,
}

impl MonthEvents {
    fn for_month(stress: &StressTestParams, month: u32) -> Self {
        let crash_multiplier = if is_first_month_of(stress.stock_market_crash_year, month) {
            1.0 - stress.stock_market_crash_drop / 100.0
        } else {
            1.0
        };
        let cash_hit = if is_first_month_of(stress.cash_hit_year, month) {
            stress.cash_hit_amount
        } else {
            0.0
        };
        Self {
            income_lost: in_job_loss_window(stress, month),
            crash_multiplier,
            cash_hit,
        }
    }
}

pub fn calculate_projections(
    profile: &FinancialProfile,
    rent: &RentScenario,
    buy: &BuyScenario,
    sentiment: &MarketSentiment,
    stress: &StressTestParams,
) -> Vec<MonthlyCashFlow> {
    project_with_resolver(profile, rent, buy, sentiment, stress, &NoShock)
}

/// Projection with one variable shocked by `magnitude` points, either for the
/// whole horizon or for the first 60 months only.
#[allow(clippy::too_many_arguments)]
pub fn calculate_projections_with_shock(
    profile: &FinancialProfile,
    rent: &RentScenario,
    buy: &BuyScenario,
    sentiment: &MarketSentiment,
    stress: &StressTestParams,
    variable: ShockVariable,
    magnitude: f64,
    duration: ShockDuration,
) -> Vec<MonthlyCashFlow> {
    let shock = TimedShock {
        variable,
        magnitude,
        duration,
    };
    project_with_resolver(profile, rent, buy, sentiment, stress, &shock)
}

pub fn project(inputs: &ProjectionInputs) -> Vec<MonthlyCashFlow> {
    project_with(inputs, &NoShock)
}

pub fn project_with<R: ShockResolver + ?Sized>(
    inputs: &ProjectionInputs,
    resolver: &R,
) -> Vec<MonthlyCashFlow> {
    project_with_resolver(
        &inputs.profile,
        &inputs.rent,
        &inputs.buy,
        &inputs.sentiment,
        &inputs.stress,
        resolver,
    )
}

pub fn project_with_resolver<R: ShockResolver + ?Sized>(
    profile: &FinancialProfile,
    rent: &RentScenario,
    buy: &BuyScenario,
    sentiment: &MarketSentiment,
    stress: &StressTestParams,
    resolver: &R,
) -> Vec<MonthlyCashFlow> {
    let base_rates = BaseRates::from_inputs(profile, rent, buy, sentiment);
    let mut mortgage = Mortgage::originate(buy, stress, resolver);

    let legacy_debt = match profile.legacy_debt {
        LegacyDebtTreatment::ExcludeFromBoth => 0.0,
        LegacyDebtTreatment::SubtractFromBoth => profile.current_debt,
    };
    let down_payment = buy.home_price * buy.down_payment_percent / 100.0;
    let closing_costs = buy.home_price * buy.buying_closing_costs / 100.0;
    let mut rent_portfolio = profile.current_savings - rent.one_time_fees - legacy_debt;
    let mut buy_portfolio = profile.current_savings - down_payment - closing_costs - legacy_debt;

    let mut current_rent = rent.monthly_rent * (1.0 + stress.rent_market_shock / 100.0);
    let mut home_value = buy.home_price * (1.0 + stress.house_price_shock / 100.0);
    let mut income =
        profile.monthly_income * (1.0 + profile.income_fluctuation.unwrap_or(0.0) / 100.0);
    let mut maintenance_index = 1.0;

    let invest_share = profile.investment_rate / 100.0;
    let selling_cost_rate = selling_cost_percent(buy) / 100.0;

    let mut projections = Vec::with_capacity(PROJECTION_MONTHS as usize);
    for month in 1..=PROJECTION_MONTHS {
        let rates = base_rates.for_month(resolver, month);
        let events = MonthEvents::for_month(stress, month);

        income *= 1.0 + rates.salary_growth;
        let effective_income = if events.income_lost { 0.0 } else { income };

        let rent_outflow = current_rent + rent.renters_insurance + rent.other_monthly_costs;
        let rent_invested = (effective_income - rent_outflow - stress.additional_monthly_expenses)
            * invest_share;

        let installment = mortgage.next_installment();
        let property_tax = home_value * buy.property_tax_rate / 100.0 / 12.0;
        maintenance_index *= 1.0 + rates.inflation;
        let maintenance = buy.maintenance_monthly * maintenance_index;
        let buy_outflow = installment.payment + property_tax + maintenance;
        let buy_invested =
            (effective_income - buy_outflow - stress.additional_monthly_expenses) * invest_share;

        rent_portfolio = advance_portfolio(
            rent_portfolio,
            rates.investment_return,
            events.crash_multiplier,
            rent_invested,
            events.cash_hit,
        );
        buy_portfolio = advance_portfolio(
            buy_portfolio,
            rates.investment_return,
            events.crash_multiplier,
            buy_invested,
            events.cash_hit,
        );

        let rent_paid = current_rent;
        current_rent *= 1.0 + rates.rent_inflation;
        home_value *= 1.0 + rates.home_appreciation;
        mortgage.repay(installment.principal);

        let selling_costs = home_value * selling_cost_rate;
        let home_equity = home_value - mortgage.balance;

        projections.push(MonthlyCashFlow {
            month,
            year: month.div_ceil(12),
            income: effective_income,
            rent_payment: rent_paid,
            rent_insurance: rent.renters_insurance,
            rent_total_outflow: rent_outflow,
            rent_invested,
            rent_portfolio_value: rent_portfolio,
            mortgage_payment: installment.payment,
            interest_payment: installment.interest,
            principal_payment: installment.principal,
            property_tax,
            maintenance,
            buy_total_outflow: buy_outflow,
            home_value,
            remaining_loan: mortgage.balance,
            home_equity,
            buy_invested,
            buy_portfolio_value: buy_portfolio,
            net_worth_rent: rent_portfolio,
            net_worth_buy: buy_portfolio + home_equity - selling_costs,
        });
    }

    projections
}

/// The only rule that moves a liquid balance from one month to the next.
///
/// A non-negative balance earns the market return (scaled by a crash
/// multiplier in a crash month); a negative balance accrues the fixed debt
/// penalty and never crashes. The month's contribution is added after growth,
/// and a one-off cash hit is taken last.
fn advance_portfolio(
    balance: f64,
    monthly_return: f64,
    crash_multiplier: f64,
    contribution: f64,
    cash_hit: f64,
) -> f64 {
    let grown = if balance >= 0.0 {
        balance * (1.0 + monthly_return) * crash_multiplier
    } else {
        balance * (1.0 + DEBT_PENALTY_RATE / 12.0)
    };
    grown + contribution - cash_hit
}

fn monthly_rate(annual_percent: f64) -> f64 {
    annual_percent / 100.0 / 12.0
}

fn selling_cost_percent(buy: &BuyScenario) -> f64 {
    if buy.selling_closing_costs == 0.0 {
        DEFAULT_SELLING_COST_PERCENT
    } else {
        buy.selling_closing_costs
    }
}

fn first_month_of_year(year: u32) -> u32 {
    year.saturating_sub(1).saturating_mul(12).saturating_add(1)
}

fn is_first_month_of(trigger_year: Option<u32>, month: u32) -> bool {
    matches!(trigger_year, Some(year) if year > 0 && month == first_month_of_year(year))
}

fn in_job_loss_window(stress: &StressTestParams, month: u32) -> bool {
    let Some(year) = stress.job_loss_year.filter(|&y| y > 0) else {
        return false;
    };
    let start = first_month_of_year(year);
    let duration = match stress.job_loss_duration_months {
        0 => DEFAULT_JOB_LOSS_MONTHS,
        months => months,
    };
    month >= start && month < start.saturating_add(duration)
}
