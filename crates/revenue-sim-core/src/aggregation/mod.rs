pub mod summary;

pub use summary::{
    accrual_balance, month_labels, running_total, summarize, MonthFlows, MonthlySummary,
};
