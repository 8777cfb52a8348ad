pub mod engine;
pub mod sales;

pub use engine::{
    amortize, truncated_revenue, RevenueMatrix, RuleSeries, TruncatedRevenue, MAX_HORIZON_MONTHS,
};
pub use sales::{SalesMatrix, SalesRow};
