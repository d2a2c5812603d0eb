use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;

use finsig_analytics::indicators::{self, IndicatorConfig, IndicatorSnapshot};
use finsig_analytics::screen::{self, ScreenCriteria, SymbolScreen};
use finsig_core::{PriceSeries, Symbol};

use crate::provider::{ProviderError, SeriesProvider};
use crate::throttle::{BackoffPolicy, RateGate, RateQuota};

/// Fan-out limits for multi-symbol runs.
#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    pub max_concurrency: usize,
    pub per_symbol_timeout: Duration,
    pub quota: RateQuota,
    pub backoff: BackoffPolicy,
    pub indicators: IndicatorConfig,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            per_symbol_timeout: Duration::from_secs(10),
            quota: RateQuota::default(),
            backoff: BackoffPolicy::default(),
            indicators: IndicatorConfig::default(),
        }
    }
}

/// Per-symbol failure carried in a report instead of aborting the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFailure {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl EntryFailure {
    fn from_provider(error: &ProviderError) -> Self {
        Self {
            code: error.code().to_owned(),
            message: error.message().to_owned(),
            retryable: error.retryable(),
        }
    }

    fn from_analytics(error: &finsig_analytics::AnalyticsError) -> Self {
        Self {
            code: error.code().to_owned(),
            message: error.to_string(),
            retryable: false,
        }
    }

    fn timeout(limit: Duration) -> Self {
        Self {
            code: String::from("screener.timeout"),
            message: format!("symbol evaluation exceeded {limit:?}"),
            retryable: true,
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            code: String::from("screener.internal"),
            message: message.into(),
            retryable: false,
        }
    }
}

/// One screened symbol, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScreenEntry {
    Scored { symbol: Symbol, screen: SymbolScreen },
    Failed { symbol: Symbol, failure: EntryFailure },
}

impl ScreenEntry {
    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::Scored { symbol, .. } | Self::Failed { symbol, .. } => symbol,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenReport {
    pub criteria: ScreenCriteria,
    pub total: usize,
    pub scored: usize,
    pub matched: usize,
    pub failed: usize,
    pub entries: Vec<ScreenEntry>,
}

/// One compared symbol, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompareEntry {
    Scored {
        symbol: Symbol,
        snapshot: IndicatorSnapshot,
    },
    Failed {
        symbol: Symbol,
        failure: EntryFailure,
    },
}

impl CompareEntry {
    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::Scored { symbol, .. } | Self::Failed { symbol, .. } => symbol,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareReport {
    pub total: usize,
    pub scored: usize,
    pub failed: usize,
    pub entries: Vec<CompareEntry>,
}

/// Per-symbol outcome before shaping into a report entry.
enum Outcome<T> {
    Scored(T),
    Failed(EntryFailure),
}

/// Concurrent multi-symbol evaluator.
///
/// Symbols fan out through a `JoinSet` bounded by a semaphore and the rate
/// gate; every symbol produces exactly one entry, failures included, and
/// entries come back in input order.
pub struct Screener<P> {
    provider: Arc<P>,
    gate: RateGate,
    config: ScreenerConfig,
}

impl<P> Screener<P>
where
    P: SeriesProvider + 'static,
{
    pub fn new(provider: P, config: ScreenerConfig) -> Self {
        let gate = RateGate::new(config.quota, config.backoff.clone());
        Self {
            provider: Arc::new(provider),
            gate,
            config,
        }
    }

    pub async fn screen(&self, symbols: Vec<Symbol>, criteria: ScreenCriteria) -> ScreenReport {
        let indicator_config = self.config.indicators.clone();
        let outcomes = self
            .run(symbols.clone(), move |series| {
                match screen::evaluate(&series, &criteria, &indicator_config) {
                    Ok(screen) => Outcome::Scored(screen),
                    Err(error) => Outcome::Failed(EntryFailure::from_analytics(&error)),
                }
            })
            .await;

        let entries: Vec<ScreenEntry> = outcomes
            .into_iter()
            .zip(symbols)
            .map(|(outcome, symbol)| match outcome {
                Outcome::Scored(screen) => ScreenEntry::Scored { symbol, screen },
                Outcome::Failed(failure) => ScreenEntry::Failed { symbol, failure },
            })
            .collect();

        let scored = entries
            .iter()
            .filter(|entry| matches!(entry, ScreenEntry::Scored { .. }))
            .count();
        let matched = entries
            .iter()
            .filter(|entry| {
                matches!(entry, ScreenEntry::Scored { screen, .. } if screen.passed)
            })
            .count();
        ScreenReport {
            criteria,
            total: entries.len(),
            scored,
            matched,
            failed: entries.len() - scored,
            entries,
        }
    }

    pub async fn compare(&self, symbols: Vec<Symbol>) -> CompareReport {
        let indicator_config = self.config.indicators.clone();
        let outcomes = self
            .run(symbols.clone(), move |series| {
                match indicators::snapshot(&series, &indicator_config) {
                    Ok(snapshot) => Outcome::Scored(snapshot),
                    Err(error) => Outcome::Failed(EntryFailure::from_analytics(&error)),
                }
            })
            .await;

        let entries: Vec<CompareEntry> = outcomes
            .into_iter()
            .zip(symbols)
            .map(|(outcome, symbol)| match outcome {
                Outcome::Scored(snapshot) => CompareEntry::Scored { symbol, snapshot },
                Outcome::Failed(failure) => CompareEntry::Failed { symbol, failure },
            })
            .collect();

        let scored = entries
            .iter()
            .filter(|entry| matches!(entry, CompareEntry::Scored { .. }))
            .count();
        CompareReport {
            total: entries.len(),
            scored,
            failed: entries.len() - scored,
            entries,
        }
    }

    /// Fans the symbols out and returns one outcome per input position.
    async fn run<T, F>(&self, symbols: Vec<Symbol>, evaluate: F) -> Vec<Outcome<T>>
    where
        T: Send + 'static,
        F: Fn(PriceSeries) -> Outcome<T> + Clone + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks: JoinSet<(usize, Outcome<T>)> = JoinSet::new();

        for (index, symbol) in symbols.iter().cloned().enumerate() {
            let provider = Arc::clone(&self.provider);
            let gate = self.gate.clone();
            let semaphore = Arc::clone(&semaphore);
            let per_symbol_timeout = self.config.per_symbol_timeout;
            let evaluate = evaluate.clone();

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            index,
                            Outcome::Failed(EntryFailure::internal("concurrency gate closed")),
                        )
                    }
                };

                if let Err(error) = gate.acquire().await {
                    return (index, Outcome::Failed(EntryFailure::from_provider(&error)));
                }

                match timeout(per_symbol_timeout, provider.series(&symbol)).await {
                    Ok(Ok(series)) => (index, evaluate(series)),
                    Ok(Err(error)) => {
                        (index, Outcome::Failed(EntryFailure::from_provider(&error)))
                    }
                    Err(_) => (index, Outcome::Failed(EntryFailure::timeout(per_symbol_timeout))),
                }
            });
        }

        let mut slots: Vec<Option<Outcome<T>>> = symbols.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            if let Ok((index, outcome)) = joined {
                slots[index] = Some(outcome);
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Outcome::Failed(EntryFailure::internal("worker task did not report back"))
                })
            })
            .collect()
    }
}
