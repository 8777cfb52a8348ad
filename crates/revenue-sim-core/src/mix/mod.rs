pub mod sales_mix;

pub use sales_mix::{build_sales_matrix, MixInput, MixMonth, DEFAULT_AMORTIZATION_MONTHS};
