use surebet_core::Outcome;
use thiserror::Error;

/// Errors raised by the correlation engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    /// Stakes can only be computed when every outcome has a best quote.
    #[error("cannot stake an incomplete odds map, missing {0:?}")]
    IncompleteOdds(Vec<Outcome>),

    /// The payout to cover must be strictly positive.
    #[error("target payout must be positive, got {0}")]
    NonPositiveTarget(rust_decimal::Decimal),

    /// Engine settings out of range.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// A downstream consumer rejected an accepted plan.
    #[error("plan sink {sink} failed: {reason}")]
    Sink { sink: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, CorrelationError>;
