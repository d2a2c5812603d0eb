use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Symbol, UtcDateTime, ValidationError};

/// Closed vocabulary of financial-statement fields accepted by the
/// fundamental-scoring components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementField {
    NetIncome,
    OperatingCashFlow,
    TotalAssets,
    CurrentAssets,
    CurrentLiabilities,
    LongTermDebt,
    SharesOutstanding,
    GrossProfit,
    Revenue,
    Ebit,
    MarketCap,
    TotalLiabilities,
    RetainedEarnings,
    WorkingCapital,
}

impl StatementField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NetIncome => "net_income",
            Self::OperatingCashFlow => "operating_cash_flow",
            Self::TotalAssets => "total_assets",
            Self::CurrentAssets => "current_assets",
            Self::CurrentLiabilities => "current_liabilities",
            Self::LongTermDebt => "long_term_debt",
            Self::SharesOutstanding => "shares_outstanding",
            Self::GrossProfit => "gross_profit",
            Self::Revenue => "revenue",
            Self::Ebit => "ebit",
            Self::MarketCap => "market_cap",
            Self::TotalLiabilities => "total_liabilities",
            Self::RetainedEarnings => "retained_earnings",
            Self::WorkingCapital => "working_capital",
        }
    }
}

impl Display for StatementField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Financial-statement snapshot for a single reporting period.
///
/// Optional fields may be absent; consumers apply their own missing-data
/// policy (Piotroski degrades, Altman Z fails hard).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub symbol: Symbol,
    pub period_end: UtcDateTime,
    fields: BTreeMap<StatementField, f64>,
}

impl StatementPeriod {
    pub fn new(symbol: Symbol, period_end: UtcDateTime) -> Self {
        Self {
            symbol,
            period_end,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, field: StatementField, value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: field.as_str(),
            });
        }
        self.fields.insert(field, value);
        Ok(self)
    }

    pub fn get(&self, field: StatementField) -> Option<f64> {
        self.fields.get(&field).copied()
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_reads_fields() {
        let symbol = Symbol::parse("MSFT").expect("symbol");
        let period_end = UtcDateTime::parse("2024-03-31T00:00:00Z").expect("timestamp");
        let period = StatementPeriod::new(symbol, period_end)
            .with_field(StatementField::NetIncome, 21_939_000_000.0)
            .expect("finite");

        assert_eq!(period.get(StatementField::NetIncome), Some(21_939_000_000.0));
        assert_eq!(period.get(StatementField::Revenue), None);
    }

    #[test]
    fn rejects_non_finite_values() {
        let symbol = Symbol::parse("MSFT").expect("symbol");
        let period_end = UtcDateTime::parse("2024-03-31T00:00:00Z").expect("timestamp");
        let err = StatementPeriod::new(symbol, period_end)
            .with_field(StatementField::Ebit, f64::NAN)
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::NonFiniteValue { field: "ebit" }));
    }

    #[test]
    fn serializes_field_keys_as_snake_case() {
        let symbol = Symbol::parse("MSFT").expect("symbol");
        let period_end = UtcDateTime::parse("2024-03-31T00:00:00Z").expect("timestamp");
        let period = StatementPeriod::new(symbol, period_end)
            .with_field(StatementField::OperatingCashFlow, 1.0)
            .expect("finite");

        let json = serde_json::to_string(&period).expect("serialize");
        assert!(json.contains("operating_cash_flow"));
    }
}
