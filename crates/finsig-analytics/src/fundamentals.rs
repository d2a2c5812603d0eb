//! Fundamental scoring: Piotroski F-Score over two statement periods and
//! the Altman Z bankruptcy-risk score with zone classification.

use serde::{Deserialize, Serialize};

use finsig_core::{StatementField, StatementPeriod};

use crate::error::AnalyticsError;

/// Outcome of one Piotroski test.
///
/// `Indeterminate` covers a missing field or a zero denominator; it scores
/// the same as `Failed` but is reported separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    Failed,
    Indeterminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PiotroskiTest {
    pub name: &'static str,
    pub outcome: TestOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PiotroskiScore {
    /// Count of passed tests, 0 through 9.
    pub score: u8,
    pub tests: Vec<PiotroskiTest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltmanZone {
    Safe,
    Grey,
    Distress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltmanScore {
    pub z: f64,
    pub zone: AltmanZone,
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

fn outcome(value: Option<bool>) -> TestOutcome {
    match value {
        Some(true) => TestOutcome::Passed,
        Some(false) => TestOutcome::Failed,
        None => TestOutcome::Indeterminate,
    }
}

/// Piotroski F-Score over the current and prior statement periods.
///
/// Never fails: a test that cannot be evaluated is `Indeterminate` and
/// contributes nothing to the score.
pub fn piotroski(current: &StatementPeriod, prior: &StatementPeriod) -> PiotroskiScore {
    use StatementField::*;

    let roa_now = ratio(current.get(NetIncome), current.get(TotalAssets));
    let roa_prior = ratio(prior.get(NetIncome), prior.get(TotalAssets));
    let leverage_now = ratio(current.get(LongTermDebt), current.get(TotalAssets));
    let leverage_prior = ratio(prior.get(LongTermDebt), prior.get(TotalAssets));
    let current_ratio_now = ratio(current.get(CurrentAssets), current.get(CurrentLiabilities));
    let current_ratio_prior = ratio(prior.get(CurrentAssets), prior.get(CurrentLiabilities));
    let margin_now = ratio(current.get(GrossProfit), current.get(Revenue));
    let margin_prior = ratio(prior.get(GrossProfit), prior.get(Revenue));
    let turnover_now = ratio(current.get(Revenue), current.get(TotalAssets));
    let turnover_prior = ratio(prior.get(Revenue), prior.get(TotalAssets));

    let tests = vec![
        PiotroskiTest {
            name: "positive_net_income",
            outcome: outcome(current.get(NetIncome).map(|value| value > 0.0)),
        },
        PiotroskiTest {
            name: "positive_operating_cash_flow",
            outcome: outcome(current.get(OperatingCashFlow).map(|value| value > 0.0)),
        },
        PiotroskiTest {
            name: "roa_improving",
            outcome: outcome(match (roa_now, roa_prior) {
                (Some(now), Some(prior)) => Some(now > prior),
                _ => None,
            }),
        },
        PiotroskiTest {
            name: "cash_flow_exceeds_net_income",
            outcome: outcome(
                match (current.get(OperatingCashFlow), current.get(NetIncome)) {
                    (Some(ocf), Some(ni)) => Some(ocf > ni),
                    _ => None,
                },
            ),
        },
        PiotroskiTest {
            name: "leverage_decreasing",
            outcome: outcome(match (leverage_now, leverage_prior) {
                (Some(now), Some(prior)) => Some(now < prior),
                _ => None,
            }),
        },
        PiotroskiTest {
            name: "current_ratio_improving",
            outcome: outcome(match (current_ratio_now, current_ratio_prior) {
                (Some(now), Some(prior)) => Some(now > prior),
                _ => None,
            }),
        },
        PiotroskiTest {
            name: "no_share_issuance",
            outcome: outcome(
                match (
                    current.get(SharesOutstanding),
                    prior.get(SharesOutstanding),
                ) {
                    (Some(now), Some(prior)) => Some(now <= prior),
                    _ => None,
                },
            ),
        },
        PiotroskiTest {
            name: "gross_margin_improving",
            outcome: outcome(match (margin_now, margin_prior) {
                (Some(now), Some(prior)) => Some(now > prior),
                _ => None,
            }),
        },
        PiotroskiTest {
            name: "asset_turnover_improving",
            outcome: outcome(match (turnover_now, turnover_prior) {
                (Some(now), Some(prior)) => Some(now > prior),
                _ => None,
            }),
        },
    ];

    let score = tests
        .iter()
        .filter(|test| test.outcome == TestOutcome::Passed)
        .count() as u8;

    PiotroskiScore { score, tests }
}

fn required(period: &StatementPeriod, field: StatementField) -> Result<f64, AnalyticsError> {
    period
        .get(field)
        .ok_or(AnalyticsError::MissingField { field: field.as_str() })
}

/// Altman Z-Score:
/// `1.2*WC/TA + 1.4*RE/TA + 3.3*EBIT/TA + 0.6*MVE/TL + 1.0*Sales/TA`.
///
/// Working capital falls back to current assets minus current liabilities
/// when the field itself is absent. Any other missing input is a hard
/// `MissingField`; zero total assets or liabilities is invalid input.
pub fn altman_z(period: &StatementPeriod) -> Result<AltmanScore, AnalyticsError> {
    use StatementField::*;

    let working_capital = match period.get(WorkingCapital) {
        Some(value) => value,
        None => {
            let assets = required(period, CurrentAssets)?;
            let liabilities = required(period, CurrentLiabilities)?;
            assets - liabilities
        }
    };
    let total_assets = required(period, TotalAssets)?;
    let retained = required(period, RetainedEarnings)?;
    let ebit = required(period, Ebit)?;
    let market_cap = required(period, MarketCap)?;
    let total_liabilities = required(period, TotalLiabilities)?;
    let revenue = required(period, Revenue)?;

    if total_assets == 0.0 {
        return Err(AnalyticsError::invalid_input("total assets are zero"));
    }
    if total_liabilities == 0.0 {
        return Err(AnalyticsError::invalid_input("total liabilities are zero"));
    }

    let z = 1.2 * working_capital / total_assets
        + 1.4 * retained / total_assets
        + 3.3 * ebit / total_assets
        + 0.6 * market_cap / total_liabilities
        + 1.0 * revenue / total_assets;

    let zone = if z >= 2.99 {
        AltmanZone::Safe
    } else if z >= 1.81 {
        AltmanZone::Grey
    } else {
        AltmanZone::Distress
    };

    Ok(AltmanScore { z, zone })
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsig_core::{Symbol, UtcDateTime};

    fn period(fields: &[(StatementField, f64)]) -> StatementPeriod {
        let symbol = Symbol::parse("TEST").expect("symbol");
        let period_end = UtcDateTime::parse("2024-12-31T00:00:00Z").expect("timestamp");
        let mut period = StatementPeriod::new(symbol, period_end);
        for &(field, value) in fields {
            period = period.with_field(field, value).expect("finite");
        }
        period
    }

    fn strong_current() -> StatementPeriod {
        use StatementField::*;
        period(&[
            (NetIncome, 120.0),
            (OperatingCashFlow, 150.0),
            (TotalAssets, 1_000.0),
            (CurrentAssets, 400.0),
            (CurrentLiabilities, 150.0),
            (LongTermDebt, 100.0),
            (SharesOutstanding, 95.0),
            (GrossProfit, 350.0),
            (Revenue, 900.0),
        ])
    }

    fn weak_prior() -> StatementPeriod {
        use StatementField::*;
        period(&[
            (NetIncome, 80.0),
            (OperatingCashFlow, 90.0),
            (TotalAssets, 1_000.0),
            (CurrentAssets, 350.0),
            (CurrentLiabilities, 170.0),
            (LongTermDebt, 150.0),
            (SharesOutstanding, 100.0),
            (GrossProfit, 300.0),
            (Revenue, 850.0),
        ])
    }

    #[test]
    fn clean_improvement_scores_nine() {
        let result = piotroski(&strong_current(), &weak_prior());
        assert_eq!(result.score, 9);
        assert!(result
            .tests
            .iter()
            .all(|test| test.outcome == TestOutcome::Passed));
    }

    #[test]
    fn missing_fields_are_indeterminate_not_errors() {
        let result = piotroski(&period(&[]), &period(&[]));
        assert_eq!(result.score, 0);
        assert!(result
            .tests
            .iter()
            .all(|test| test.outcome == TestOutcome::Indeterminate));
    }

    #[test]
    fn zero_denominator_is_indeterminate() {
        use StatementField::*;
        let current = period(&[(NetIncome, 10.0), (TotalAssets, 0.0)]);
        let prior = period(&[(NetIncome, 5.0), (TotalAssets, 100.0)]);
        let result = piotroski(&current, &prior);
        let roa = result
            .tests
            .iter()
            .find(|test| test.name == "roa_improving")
            .expect("test present");
        assert_eq!(roa.outcome, TestOutcome::Indeterminate);
    }

    #[test]
    fn share_issuance_fails_the_dilution_test() {
        use StatementField::*;
        let current = period(&[(SharesOutstanding, 110.0)]);
        let prior = period(&[(SharesOutstanding, 100.0)]);
        let result = piotroski(&current, &prior);
        let test = result
            .tests
            .iter()
            .find(|test| test.name == "no_share_issuance")
            .expect("test present");
        assert_eq!(test.outcome, TestOutcome::Failed);
    }

    fn altman_period(z_target: &str) -> StatementPeriod {
        use StatementField::*;
        // TA = 1000, TL = 500; tune EBIT to land in the requested zone.
        let ebit = match z_target {
            "safe" => 600.0,
            "grey" => 300.0,
            _ => 0.0,
        };
        period(&[
            (WorkingCapital, 200.0),
            (TotalAssets, 1_000.0),
            (RetainedEarnings, 100.0),
            (Ebit, ebit),
            (MarketCap, 400.0),
            (TotalLiabilities, 500.0),
            (Revenue, 500.0),
        ])
    }

    #[test]
    fn altman_zone_boundaries() {
        // Base without EBIT: 0.24 + 0.14 + 0.48 + 0.5 = 1.36.
        let safe = altman_z(&altman_period("safe")).expect("score");
        assert_eq!(safe.zone, AltmanZone::Safe);
        let grey = altman_z(&altman_period("grey")).expect("score");
        assert_eq!(grey.zone, AltmanZone::Grey);
        let distress = altman_z(&altman_period("distress")).expect("score");
        assert_eq!(distress.zone, AltmanZone::Distress);
    }

    #[test]
    fn working_capital_falls_back_to_current_accounts() {
        use StatementField::*;
        let explicit = altman_z(&altman_period("grey")).expect("score");
        let fallback = period(&[
            (CurrentAssets, 350.0),
            (CurrentLiabilities, 150.0),
            (TotalAssets, 1_000.0),
            (RetainedEarnings, 100.0),
            (Ebit, 300.0),
            (MarketCap, 400.0),
            (TotalLiabilities, 500.0),
            (Revenue, 500.0),
        ]);
        let computed = altman_z(&fallback).expect("score");
        assert!((computed.z - explicit.z).abs() < 1e-12);
    }

    #[test]
    fn missing_ebit_is_a_hard_error() {
        use StatementField::*;
        let incomplete = period(&[
            (WorkingCapital, 200.0),
            (TotalAssets, 1_000.0),
            (RetainedEarnings, 100.0),
            (MarketCap, 400.0),
            (TotalLiabilities, 500.0),
            (Revenue, 500.0),
        ]);
        assert!(matches!(
            altman_z(&incomplete),
            Err(AnalyticsError::MissingField { field: "ebit" })
        ));
    }
}
