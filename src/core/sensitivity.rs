use rayon::prelude::*;
use serde::Serialize;

use super::engine::{project, project_with};
use super::shock::{ShockVariable, TimedShock};
use super::types::{HousingPath, MonthlyCashFlow, ProjectionInputs};

/// Share of the month's income above which housing outflow is flagged.
const DTI_FLAG_THRESHOLD: f64 = 0.5;
const MAX_FLAGS_PER_PATH: usize = 2;

/// Final (month 360) position of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeSummary {
    pub net_worth_buy: f64,
    pub net_worth_rent: f64,
    pub spread: f64,
}

impl OutcomeSummary {
    pub fn from_projections(projections: &[MonthlyCashFlow]) -> Self {
        projections
            .last()
            .map(|last| Self {
                net_worth_buy: last.net_worth_buy,
                net_worth_rent: last.net_worth_rent,
                spread: last.spread(),
            })
            .unwrap_or_default()
    }

    pub fn winner(&self) -> HousingPath {
        HousingPath::from_spread(self.spread)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDelta {
    pub absolute: f64,
    /// Change relative to the baseline magnitude; zero when the baseline is zero.
    pub percent: f64,
}

impl PathDelta {
    pub(crate) fn between(baseline: f64, shocked: f64) -> Self {
        let absolute = shocked - baseline;
        let percent = if baseline != 0.0 {
            absolute / baseline.abs() * 100.0
        } else {
            0.0
        };
        Self { absolute, percent }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathRiskKind {
    /// Buy-path housing outflow above half of the month's income.
    Dti,
    /// Rent-path liquid balance below zero.
    Liquidity,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRiskFlag {
    pub path: HousingPath,
    pub kind: PathRiskKind,
    pub year: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShockOutcome {
    pub variable: ShockVariable,
    pub label: &'static str,
    pub badge: String,
    pub magnitude: f64,
    pub net_worth_buy: f64,
    pub net_worth_rent: f64,
    pub buy_delta: PathDelta,
    pub rent_delta: PathDelta,
    pub spread: f64,
    pub delta_spread: f64,
    pub winner: HousingPath,
    pub flipped: bool,
    pub elasticity: f64,
    pub risk_flags: Vec<PathRiskFlag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityReport {
    pub baseline: OutcomeSummary,
    pub baseline_winner: HousingPath,
    /// Standardized shocks ordered by absolute spread impact, largest first.
    pub shocks: Vec<ShockOutcome>,
}

impl SensitivityReport {
    pub fn most_sensitive(&self) -> Option<&ShockOutcome> {
        self.shocks.first()
    }

    pub fn flipped(&self) -> impl Iterator<Item = &ShockOutcome> {
        self.shocks.iter().filter(|shock| shock.flipped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomShockOutcome {
    pub shock: TimedShock,
    pub net_worth_buy: f64,
    pub net_worth_rent: f64,
    pub buy_delta: PathDelta,
    pub rent_delta: PathDelta,
    pub delta_spread: f64,
    pub winner: HousingPath,
    pub flipped: bool,
}

pub fn baseline_summary(inputs: &ProjectionInputs) -> OutcomeSummary {
    OutcomeSummary::from_projections(&project(inputs))
}

/// Runs the six standardized one-point shocks against `inputs` and ranks them.
pub fn standardized_analysis(inputs: &ProjectionInputs) -> SensitivityReport {
    let baseline = baseline_summary(inputs);

    let mut shocks: Vec<ShockOutcome> = ShockVariable::ALL
        .into_par_iter()
        .map(|variable| run_standard_shock(inputs, &baseline, variable, variable.standard_shift()))
        .collect();
    sort_tornado(&mut shocks);

    SensitivityReport {
        baseline,
        baseline_winner: baseline.winner(),
        shocks,
    }
}

/// Re-runs one standardized variable at an arbitrary magnitude. Zero
/// reproduces the baseline.
pub fn run_standard_shock(
    inputs: &ProjectionInputs,
    baseline: &OutcomeSummary,
    variable: ShockVariable,
    magnitude: f64,
) -> ShockOutcome {
    let projections = project_with(inputs, &TimedShock::permanent(variable, magnitude));
    let shocked = OutcomeSummary::from_projections(&projections);

    let buy_delta = PathDelta::between(baseline.net_worth_buy, shocked.net_worth_buy);
    let rent_delta = PathDelta::between(baseline.net_worth_rent, shocked.net_worth_rent);
    let winner = shocked.winner();

    ShockOutcome {
        variable,
        label: variable.label(),
        badge: variable.badge(),
        magnitude,
        net_worth_buy: shocked.net_worth_buy,
        net_worth_rent: shocked.net_worth_rent,
        buy_delta,
        rent_delta,
        spread: shocked.spread,
        delta_spread: shocked.spread - baseline.spread,
        winner,
        flipped: winner != baseline.winner(),
        elasticity: buy_delta.percent.abs().max(rent_delta.percent.abs()),
        risk_flags: path_risk_flags(&projections),
    }
}

/// User-defined shock. A zero magnitude is not a scenario and yields nothing.
pub fn run_custom_scenario(
    inputs: &ProjectionInputs,
    baseline: &OutcomeSummary,
    shock: TimedShock,
) -> Option<CustomShockOutcome> {
    if shock.magnitude == 0.0 {
        return None;
    }

    let shocked = OutcomeSummary::from_projections(&project_with(inputs, &shock));
    let winner = shocked.winner();
    Some(CustomShockOutcome {
        shock,
        net_worth_buy: shocked.net_worth_buy,
        net_worth_rent: shocked.net_worth_rent,
        buy_delta: PathDelta::between(baseline.net_worth_buy, shocked.net_worth_buy),
        rent_delta: PathDelta::between(baseline.net_worth_rent, shocked.net_worth_rent),
        delta_spread: shocked.spread - baseline.spread,
        winner,
        flipped: winner != baseline.winner(),
    })
}

/// Early-warning flags along a run: at most two distinct years per path.
pub fn path_risk_flags(projections: &[MonthlyCashFlow]) -> Vec<PathRiskFlag> {
    let dti = first_years(projections, |row| {
        let ratio = if row.income > 0.0 {
            row.buy_total_outflow / row.income
        } else {
            0.0
        };
        ratio > DTI_FLAG_THRESHOLD
    })
    .map(|year| PathRiskFlag {
        path: HousingPath::Buy,
        kind: PathRiskKind::Dti,
        year,
    });

    let liquidity = first_years(projections, |row| row.rent_portfolio_value < 0.0).map(|year| {
        PathRiskFlag {
            path: HousingPath::Rent,
            kind: PathRiskKind::Liquidity,
            year,
        }
    });

    dti.chain(liquidity).collect()
}

fn first_years<F>(projections: &[MonthlyCashFlow], flagged: F) -> impl Iterator<Item = u32>
where
    F: Fn(&MonthlyCashFlow) -> bool,
{
    let mut years: Vec<u32> = Vec::with_capacity(MAX_FLAGS_PER_PATH);
    for row in projections.iter().filter(|row| flagged(*row)) {
        if years.len() == MAX_FLAGS_PER_PATH {
            break;
        }
        if !years.contains(&row.year) {
            years.push(row.year);
        }
    }
    years.into_iter()
}

fn sort_tornado(shocks: &mut [ShockOutcome]) {
    shocks.sort_by(|a, b| b.delta_spread.abs().total_cmp(&a.delta_spread.abs()));
}
