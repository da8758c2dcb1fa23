use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::engine::project;
use super::sensitivity::{OutcomeSummary, PathDelta, baseline_summary};
use super::types::{HousingPath, ProjectionInputs, StressTestParams};

const LUMP_SUM_PAYDOWN: f64 = 30_000.0;

/// Preset "what if" events. Each one rewrites a copy of the inputs; none of
/// them needs engine support beyond the ordinary stress parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifeEvent {
    #[serde(alias = "housing_crash")]
    HousingCrash,
    #[serde(alias = "market_collapse")]
    MarketCollapse,
    #[serde(alias = "job_loss")]
    JobLoss,
    Childbirth,
    #[serde(alias = "rent_hyperinflation")]
    RentHyperinflation,
    #[serde(alias = "rate_spike")]
    RateSpike,
    Promotion,
    #[serde(alias = "medical")]
    MedicalEmergency,
    #[serde(alias = "new_car")]
    NewCar,
    #[serde(alias = "roof_repair")]
    MajorHomeRepair,
    Inheritance,
    #[serde(alias = "tax_hike")]
    PropertyTaxHike,
    #[serde(alias = "move_cheaper")]
    MoveToCheaperCity,
    #[serde(alias = "partner")]
    PartnerMovesIn,
    #[serde(alias = "crypto_wipeout")]
    CryptoWipeout,
    #[serde(alias = "lump_sum")]
    LumpSumPaydown,
    Sabbatical,
    #[serde(alias = "golden_decade")]
    GoldenDecade,
}

impl LifeEvent {
    pub const ALL: [LifeEvent; 18] = [
        LifeEvent::HousingCrash,
        LifeEvent::MarketCollapse,
        LifeEvent::JobLoss,
        LifeEvent::Childbirth,
        LifeEvent::RentHyperinflation,
        LifeEvent::RateSpike,
        LifeEvent::Promotion,
        LifeEvent::MedicalEmergency,
        LifeEvent::NewCar,
        LifeEvent::MajorHomeRepair,
        LifeEvent::Inheritance,
        LifeEvent::PropertyTaxHike,
        LifeEvent::MoveToCheaperCity,
        LifeEvent::PartnerMovesIn,
        LifeEvent::CryptoWipeout,
        LifeEvent::LumpSumPaydown,
        LifeEvent::Sabbatical,
        LifeEvent::GoldenDecade,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LifeEvent::HousingCrash => "Housing Crash (-30%)",
            LifeEvent::MarketCollapse => "Stock Market Collapse",
            LifeEvent::JobLoss => "Sudden Job Loss (1 Yr)",
            LifeEvent::Childbirth => "Childbirth (+1.5k/mo)",
            LifeEvent::RentHyperinflation => "Rent Hyperinflation",
            LifeEvent::RateSpike => "Interest Rate Spike (+3%)",
            LifeEvent::Promotion => "Career Promotion (+20%)",
            LifeEvent::MedicalEmergency => "Medical Emergency (-20k)",
            LifeEvent::NewCar => "Buy New Car (-40k)",
            LifeEvent::MajorHomeRepair => "Major Home Repair (-15k)",
            LifeEvent::Inheritance => "Inheritance (+50k)",
            LifeEvent::PropertyTaxHike => "Property Tax Hike (2x)",
            LifeEvent::MoveToCheaperCity => "Move Cheaper City",
            LifeEvent::PartnerMovesIn => "Partner Moves In",
            LifeEvent::CryptoWipeout => "Crypto Wipeout (-20%)",
            LifeEvent::LumpSumPaydown => "Lump Sum Paydown (30k)",
            LifeEvent::Sabbatical => "Sabbatical Year",
            LifeEvent::GoldenDecade => "Golden Decade (+3%)",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            LifeEvent::HousingCrash => "Home value drops 30% right after purchase.",
            LifeEvent::MarketCollapse => "Portfolios lose 40% at the start of year 5.",
            LifeEvent::JobLoss => "No income for 12 months from the start of year 3.",
            LifeEvent::Childbirth => "Adds 1,500 per month of childcare expense.",
            LifeEvent::RentHyperinflation => "Rent inflation runs 5 points above base.",
            LifeEvent::RateSpike => "Mortgage rate is 3 points higher for the whole loan.",
            LifeEvent::Promotion => "Income is 20% higher throughout.",
            LifeEvent::MedicalEmergency => "One-off 20,000 expense in year 2.",
            LifeEvent::NewCar => "One-off 40,000 expense in year 2.",
            LifeEvent::MajorHomeRepair => "One-off 15,000 expense in year 5.",
            LifeEvent::Inheritance => "One-off 50,000 windfall in year 10.",
            LifeEvent::PropertyTaxHike => "Property tax rate doubles.",
            LifeEvent::MoveToCheaperCity => "Rent drops 30% and income drops 10%.",
            LifeEvent::PartnerMovesIn => "Rent is shared and halved; ownership costs are unchanged.",
            LifeEvent::CryptoWipeout => "Lose 20% of starting savings.",
            LifeEvent::LumpSumPaydown => "Put an extra 30,000 into the down payment.",
            LifeEvent::Sabbatical => "No income for 12 months from the start of year 4.",
            LifeEvent::GoldenDecade => "Investment returns are 3 points higher every year.",
        }
    }

    pub fn apply(self, inputs: &ProjectionInputs) -> ProjectionInputs {
        let mut next = inputs.clone();
        let stress = &mut next.stress;
        match self {
            LifeEvent::HousingCrash => stress.house_price_shock = -30.0,
            LifeEvent::MarketCollapse => {
                stress.stock_market_crash_year = Some(5);
                stress.stock_market_crash_drop = 40.0;
            }
            LifeEvent::JobLoss => {
                stress.job_loss_year = Some(3);
                stress.job_loss_duration_months = 12;
            }
            LifeEvent::Childbirth => stress.additional_monthly_expenses = 1_500.0,
            LifeEvent::RentHyperinflation => next.rent.rent_inflation += 5.0,
            LifeEvent::RateSpike => stress.interest_rate_shock = 3.0,
            LifeEvent::Promotion => {
                next.profile.income_fluctuation =
                    Some(next.profile.income_fluctuation.unwrap_or(0.0) + 20.0);
            }
            LifeEvent::MedicalEmergency => set_cash_hit(stress, 20_000.0, 2),
            LifeEvent::NewCar => set_cash_hit(stress, 40_000.0, 2),
            LifeEvent::MajorHomeRepair => set_cash_hit(stress, 15_000.0, 5),
            LifeEvent::Inheritance => set_cash_hit(stress, -50_000.0, 10),
            LifeEvent::PropertyTaxHike => next.buy.property_tax_rate *= 2.0,
            LifeEvent::MoveToCheaperCity => {
                next.rent.monthly_rent *= 0.7;
                next.profile.income_fluctuation = Some(-10.0);
            }
            LifeEvent::PartnerMovesIn => next.rent.monthly_rent /= 2.0,
            LifeEvent::CryptoWipeout => next.profile.current_savings *= 0.8,
            LifeEvent::LumpSumPaydown => {
                if next.buy.home_price > 0.0 {
                    let extra = LUMP_SUM_PAYDOWN / next.buy.home_price * 100.0;
                    next.buy.down_payment_percent = (next.buy.down_payment_percent + extra).min(100.0);
                }
            }
            LifeEvent::Sabbatical => {
                stress.job_loss_year = Some(4);
                stress.job_loss_duration_months = 12;
            }
            LifeEvent::GoldenDecade => next.sentiment.investment_return += 3.0,
        }
        next
    }
}

fn set_cash_hit(stress: &mut StressTestParams, amount: f64, year: u32) {
    stress.cash_hit_amount = amount;
    stress.cash_hit_year = Some(year);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeEventImpact {
    pub event: LifeEvent,
    pub label: &'static str,
    pub description: &'static str,
    pub net_worth_buy: f64,
    pub net_worth_rent: f64,
    pub buy_delta: PathDelta,
    pub rent_delta: PathDelta,
    pub spread: f64,
    pub winner: HousingPath,
    pub flipped: bool,
}

/// Month-360 outcome of `event` against the caller's baseline.
pub fn life_event_impact(
    inputs: &ProjectionInputs,
    baseline: &OutcomeSummary,
    event: LifeEvent,
) -> LifeEventImpact {
    let outcome = OutcomeSummary::from_projections(&project(&event.apply(inputs)));
    let winner = outcome.winner();
    LifeEventImpact {
        event,
        label: event.label(),
        description: event.description(),
        net_worth_buy: outcome.net_worth_buy,
        net_worth_rent: outcome.net_worth_rent,
        buy_delta: PathDelta::between(baseline.net_worth_buy, outcome.net_worth_buy),
        rent_delta: PathDelta::between(baseline.net_worth_rent, outcome.net_worth_rent),
        spread: outcome.spread,
        winner,
        flipped: winner != baseline.winner(),
    }
}

pub fn life_event_impacts(inputs: &ProjectionInputs, events: &[LifeEvent]) -> Vec<LifeEventImpact> {
    let baseline = baseline_summary(inputs);
    events
        .par_iter()
        .map(|&event| life_event_impact(inputs, &baseline, event))
        .collect()
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentMode {
    Pessimistic,
    #[default]
    Neutral,
    Optimistic,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentStyle {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

impl SentimentMode {
    pub fn home_appreciation(self) -> f64 {
        match self {
            SentimentMode::Pessimistic => 0.0,
            SentimentMode::Neutral => 2.0,
            SentimentMode::Optimistic => 6.0,
        }
    }

    pub fn investment_return(self, style: InvestmentStyle) -> f64 {
        use InvestmentStyle::*;
        match (self, style) {
            (SentimentMode::Pessimistic, Conservative) => 2.0,
            (SentimentMode::Pessimistic, Balanced) => 0.0,
            (SentimentMode::Pessimistic, Aggressive) => 15.0,
            (SentimentMode::Neutral, Conservative) => 3.0,
            (SentimentMode::Neutral, Balanced) => 4.0,
            (SentimentMode::Neutral, Aggressive) => 5.0,
            (SentimentMode::Optimistic, Conservative) => 5.0,
            (SentimentMode::Optimistic, Balanced) => 8.0,
            (SentimentMode::Optimistic, Aggressive) => 20.0,
        }
    }
}

/// Sets appreciation (sentiment and buy override) and return from a preset.
/// Inflation is left as the caller had it.
pub fn apply_sentiment_preset(
    inputs: &ProjectionInputs,
    mode: SentimentMode,
    style: InvestmentStyle,
) -> ProjectionInputs {
    let mut next = inputs.clone();
    next.sentiment.home_appreciation = mode.home_appreciation();
    next.sentiment.investment_return = mode.investment_return(style);
    next.buy.home_appreciation = Some(mode.home_appreciation());
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::tests::sample_inputs;

    #[test]
    fn every_event_changes_the_inputs() {
        let inputs = sample_inputs();
        for event in LifeEvent::ALL {
            assert_ne!(event.apply(&inputs), inputs, "{event:?} left inputs unchanged");
        }
    }

    #[test]
    fn applying_an_event_never_mutates_the_original() {
        let inputs = sample_inputs();
        let before = inputs.clone();
        let _ = LifeEvent::CryptoWipeout.apply(&inputs);
        assert_eq!(inputs, before);
    }

    #[test]
    fn stress_presets_set_expected_parameters() {
        let inputs = sample_inputs();

        let job_loss = LifeEvent::JobLoss.apply(&inputs).stress;
        assert_eq!(job_loss.job_loss_year, Some(3));
        assert_eq!(job_loss.job_loss_duration_months, 12);

        let crash = LifeEvent::MarketCollapse.apply(&inputs).stress;
        assert_eq!(crash.stock_market_crash_year, Some(5));
        assert_eq!(crash.stock_market_crash_drop, 40.0);

        let inheritance = LifeEvent::Inheritance.apply(&inputs).stress;
        assert_eq!(inheritance.cash_hit_amount, -50_000.0);
        assert_eq!(inheritance.cash_hit_year, Some(10));
    }

    #[test]
    fn promotion_stacks_on_existing_fluctuation_but_move_replaces_it() {
        let mut inputs = sample_inputs();
        inputs.profile.income_fluctuation = Some(5.0);

        let promoted = LifeEvent::Promotion.apply(&inputs);
        assert_eq!(promoted.profile.income_fluctuation, Some(25.0));

        let moved = LifeEvent::MoveToCheaperCity.apply(&inputs);
        assert_eq!(moved.profile.income_fluctuation, Some(-10.0));
        assert_eq!(moved.rent.monthly_rent, 1_600.0 * 0.7);
    }

    #[test]
    fn partner_halves_rent_only() {
        let inputs = sample_inputs();
        let shared = LifeEvent::PartnerMovesIn.apply(&inputs);
        assert_eq!(shared.rent.monthly_rent, 800.0);
        assert_eq!(shared.buy, inputs.buy);
    }

    #[test]
    fn lump_sum_raises_down_payment_by_its_share_of_price() {
        let inputs = sample_inputs();
        let paid = LifeEvent::LumpSumPaydown.apply(&inputs);
        assert!((paid.buy.down_payment_percent - 25.0).abs() < 1e-9);

        let mut cheap = sample_inputs();
        cheap.buy.home_price = 20_000.0;
        assert_eq!(LifeEvent::LumpSumPaydown.apply(&cheap).buy.down_payment_percent, 100.0);
    }

    #[test]
    fn impacts_move_net_worth_in_the_expected_direction() {
        let inputs = sample_inputs();
        let impacts = life_event_impacts(
            &inputs,
            &[LifeEvent::Childbirth, LifeEvent::Inheritance, LifeEvent::RateSpike],
        );

        let childbirth = &impacts[0];
        assert!(childbirth.buy_delta.absolute < 0.0);
        assert!(childbirth.rent_delta.absolute < 0.0);

        let inheritance = &impacts[1];
        assert!(inheritance.buy_delta.absolute > 0.0);
        assert!(inheritance.rent_delta.absolute > 0.0);

        let rate_spike = &impacts[2];
        assert_eq!(rate_spike.rent_delta.absolute, 0.0);
        assert!(rate_spike.buy_delta.absolute < 0.0);
    }

    #[test]
    fn impacts_cover_every_event_in_order() {
        let impacts = life_event_impacts(&sample_inputs(), &LifeEvent::ALL);
        let events: Vec<LifeEvent> = impacts.iter().map(|i| i.event).collect();
        assert_eq!(events, LifeEvent::ALL.to_vec());
    }

    #[test]
    fn event_ids_accept_short_aliases() {
        let event: LifeEvent = serde_json::from_str("\"roof_repair\"").expect("alias");
        assert_eq!(event, LifeEvent::MajorHomeRepair);
        let event: LifeEvent = serde_json::from_str("\"golden-decade\"").expect("kebab");
        assert_eq!(event, LifeEvent::GoldenDecade);
    }

    #[test]
    fn sentiment_presets_set_appreciation_and_return() {
        let inputs = sample_inputs();
        let next = apply_sentiment_preset(&inputs, SentimentMode::Optimistic, InvestmentStyle::Aggressive);
        assert_eq!(next.sentiment.home_appreciation, 6.0);
        assert_eq!(next.buy.home_appreciation, Some(6.0));
        assert_eq!(next.sentiment.investment_return, 20.0);
        assert_eq!(next.sentiment.inflation, inputs.sentiment.inflation);

        assert_eq!(SentimentMode::Pessimistic.investment_return(InvestmentStyle::Balanced), 0.0);
        assert_eq!(SentimentMode::Neutral.investment_return(InvestmentStyle::Conservative), 3.0);
    }
}
