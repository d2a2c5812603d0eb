use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use finsig_core::{PriceSeries, Symbol};

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    NotFound,
    Unavailable,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Structured provider error carried into per-symbol screener entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    retryable: bool,
}

impl ProviderError {
    pub fn not_found(symbol: &Symbol) -> Self {
        Self {
            kind: ProviderErrorKind::NotFound,
            message: format!("no series available for '{symbol}'"),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::NotFound => "provider.not_found",
            ProviderErrorKind::Unavailable => "provider.unavailable",
            ProviderErrorKind::RateLimited => "provider.rate_limited",
            ProviderErrorKind::InvalidRequest => "provider.invalid_request",
            ProviderErrorKind::Internal => "provider.internal",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ProviderError {}

pub type SeriesFuture<'a> =
    Pin<Box<dyn Future<Output = Result<PriceSeries, ProviderError>> + Send + 'a>>;

/// Price-series supplier contract; implementations are shared across the
/// screener's worker tasks.
pub trait SeriesProvider: Send + Sync {
    fn series<'a>(&'a self, symbol: &'a Symbol) -> SeriesFuture<'a>;
}

/// In-memory provider backed by a symbol map; the screener's test double
/// and the CLI's file-loaded source.
#[derive(Debug, Clone, Default)]
pub struct StaticSeriesProvider {
    series: Arc<HashMap<Symbol, PriceSeries>>,
}

impl StaticSeriesProvider {
    pub fn new(entries: impl IntoIterator<Item = PriceSeries>) -> Self {
        let series = entries
            .into_iter()
            .map(|series| (series.symbol().clone(), series))
            .collect();
        Self {
            series: Arc::new(series),
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl SeriesProvider for StaticSeriesProvider {
    fn series<'a>(&'a self, symbol: &'a Symbol) -> SeriesFuture<'a> {
        Box::pin(async move {
            self.series
                .get(symbol)
                .cloned()
                .ok_or_else(|| ProviderError::not_found(symbol))
        })
    }
}
