/// Level monthly payment that fully retires `principal` over `term_years * 12`
/// payments at `annual_rate_percent`, compounded monthly.
///
/// A zero rate falls back to straight-line repayment. The caller guarantees
/// `term_years > 0`.
pub fn calculate_mortgage_payment(principal: f64, annual_rate_percent: f64, term_years: u32) -> f64 {
    let payments = f64::from(term_years) * 12.0;
    if annual_rate_percent == 0.0 {
        return principal / payments;
    }

    let monthly_rate = annual_rate_percent / 100.0 / 12.0;
    let growth = (1.0 + monthly_rate).powf(payments);
    principal * monthly_rate * growth / (growth - 1.0)
}

/// Total interest paid over the life of a level-payment loan.
pub fn total_interest(principal: f64, annual_rate_percent: f64, term_years: u32) -> f64 {
    let payment = calculate_mortgage_payment(principal, annual_rate_percent, term_years);
    payment * f64::from(term_years) * 12.0 - principal
}
