pub mod rules;

pub use rules::{
    RecognitionKind, RecognitionRule, RuleConfig, RuleId, RuleSet, STANDARD_AMORTIZATION_MONTHS,
    UPFRONT_ID,
};
