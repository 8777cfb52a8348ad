pub mod aggregation;
pub mod amortization;
pub mod error;
pub mod schedule;
pub mod types;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "mix")]
pub mod mix;

#[cfg(feature = "scenarios")]
pub mod simulation;

pub use error::RevenueSimError;
pub use types::*;

/// Standard result type for all revenue-sim operations
pub type RevenueSimResult<T> = Result<T, RevenueSimError>;
