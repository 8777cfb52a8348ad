use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

use crate::error::RevenueSimError;
use crate::types::Money;
use crate::RevenueSimResult;

/// Identifier of the default upfront rule.
pub const UPFRONT_ID: &str = "upfront";

/// Amortization lengths of the standard multi-period registry (6..=24, step 2).
pub const STANDARD_AMORTIZATION_MONTHS: [u32; 10] = [6, 8, 10, 12, 14, 16, 18, 20, 22, 24];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Identifier of a recognition rule, e.g. "upfront" or "amortized_12m".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        RuleId(id.into())
    }

    /// Conventional id for an amortized rule spread over `periods` months.
    pub fn amortized(periods: u32) -> Self {
        RuleId(format!("amortized_{periods}m"))
    }

    pub fn upfront() -> Self {
        RuleId(UPFRONT_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(s: &str) -> Self {
        RuleId(s.to_string())
    }
}

/// How a sale converts to revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionKind {
    /// Full recognition in the month of sale.
    Upfront,
    /// Equal installments over `periods` consecutive months starting at the sale month.
    Amortized,
}

/// Declarative rule configuration as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub id: String,
    pub kind: RecognitionKind,
    /// Required for amortized rules; must be 1 (or omitted) for upfront rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periods: Option<u32>,
}

impl RuleConfig {
    pub fn upfront(id: impl Into<String>) -> Self {
        RuleConfig {
            id: id.into(),
            kind: RecognitionKind::Upfront,
            periods: None,
        }
    }

    pub fn amortized(id: impl Into<String>, periods: u32) -> Self {
        RuleConfig {
            id: id.into(),
            kind: RecognitionKind::Amortized,
            periods: Some(periods),
        }
    }
}

/// A validated recognition rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionRule {
    pub id: RuleId,
    pub kind: RecognitionKind,
    /// Always >= 1. Upfront rules have exactly 1.
    pub periods: u32,
}

impl RecognitionRule {
    pub fn is_upfront(&self) -> bool {
        self.kind == RecognitionKind::Upfront
    }

    /// Revenue recognized per month for a sale of `value` under this rule.
    pub fn installment(&self, value: Money) -> Money {
        value / Decimal::from(self.periods)
    }

    /// Output months receiving an installment for a sale made in `origin`,
    /// truncated at `horizon`.
    pub fn recognition_window(&self, origin: usize, horizon: usize) -> Range<usize> {
        let end = origin
            .saturating_add(self.periods as usize)
            .min(horizon);
        origin.min(end)..end
    }
}

impl TryFrom<RuleConfig> for RecognitionRule {
    type Error = RevenueSimError;

    fn try_from(config: RuleConfig) -> RevenueSimResult<Self> {
        if config.id.trim().is_empty() {
            return Err(RevenueSimError::Configuration {
                rule: config.id,
                reason: "Rule id must not be empty".into(),
            });
        }

        let periods = match (config.kind, config.periods) {
            (RecognitionKind::Upfront, None) | (RecognitionKind::Upfront, Some(1)) => 1,
            (RecognitionKind::Upfront, Some(p)) => {
                return Err(RevenueSimError::Configuration {
                    rule: config.id,
                    reason: format!("Upfront rules recognize in a single period, got {p}"),
                });
            }
            (RecognitionKind::Amortized, None) => {
                return Err(RevenueSimError::Configuration {
                    rule: config.id,
                    reason: "Amortized rules require a period count".into(),
                });
            }
            (RecognitionKind::Amortized, Some(0)) => {
                return Err(RevenueSimError::Configuration {
                    rule: config.id,
                    reason: "Period count must be at least 1".into(),
                });
            }
            (RecognitionKind::Amortized, Some(p)) => p,
        };

        Ok(RecognitionRule {
            id: RuleId(config.id),
            kind: config.kind,
            periods,
        })
    }
}

impl From<RecognitionRule> for RuleConfig {
    fn from(rule: RecognitionRule) -> Self {
        RuleConfig {
            id: rule.id.0,
            kind: rule.kind,
            periods: Some(rule.periods),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered, validated set of recognition rules.
///
/// Column order of every matrix built against this set follows the order
/// the rules were declared in. Deserializing a `RuleSet` runs the same
/// validation as [`RuleSet::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RuleConfig>", into = "Vec<RuleConfig>")]
pub struct RuleSet {
    rules: Vec<RecognitionRule>,
}

impl RuleSet {
    /// Validate and register `configs`. Rejects an empty list, duplicate ids
    /// and invalid period counts.
    pub fn new(configs: Vec<RuleConfig>) -> RevenueSimResult<Self> {
        if configs.is_empty() {
            return Err(RevenueSimError::Configuration {
                rule: String::new(),
                reason: "At least one recognition rule is required".into(),
            });
        }

        let mut seen: HashSet<String> = HashSet::with_capacity(configs.len());
        let mut rules = Vec::with_capacity(configs.len());
        for config in configs {
            if !seen.insert(config.id.clone()) {
                return Err(RevenueSimError::Configuration {
                    rule: config.id,
                    reason: "Duplicate rule id".into(),
                });
            }
            rules.push(RecognitionRule::try_from(config)?);
        }

        tracing::debug!(rules = rules.len(), "recognition rule set registered");
        Ok(RuleSet { rules })
    }

    /// "upfront" followed by one "amortized_{N}m" rule per entry of `periods`.
    pub fn upfront_and_amortized(periods: &[u32]) -> RevenueSimResult<Self> {
        let mut configs = Vec::with_capacity(periods.len() + 1);
        configs.push(RuleConfig::upfront(UPFRONT_ID));
        configs.extend(
            periods
                .iter()
                .map(|&p| RuleConfig::amortized(RuleId::amortized(p).0, p)),
        );
        Self::new(configs)
    }

    /// Upfront plus amortization over 6, 8, 10, ..., 24 months.
    pub fn standard() -> Self {
        let rules = std::iter::once(RecognitionRule {
            id: RuleId::upfront(),
            kind: RecognitionKind::Upfront,
            periods: 1,
        })
        .chain(STANDARD_AMORTIZATION_MONTHS.iter().map(|&p| RecognitionRule {
            id: RuleId::amortized(p),
            kind: RecognitionKind::Amortized,
            periods: p,
        }))
        .collect();
        RuleSet { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecognitionRule> {
        self.rules.iter()
    }

    pub fn rules(&self) -> &[RecognitionRule] {
        &self.rules
    }

    pub fn ids(&self) -> Vec<RuleId> {
        self.rules.iter().map(|r| r.id.clone()).collect()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.id.as_str() == id)
    }

    pub fn get(&self, id: &str) -> Option<&RecognitionRule> {
        self.rules.iter().find(|r| r.id.as_str() == id)
    }
}

impl TryFrom<Vec<RuleConfig>> for RuleSet {
    type Error = RevenueSimError;

    fn try_from(configs: Vec<RuleConfig>) -> RevenueSimResult<Self> {
        RuleSet::new(configs)
    }
}

impl From<RuleSet> for Vec<RuleConfig> {
    fn from(set: RuleSet) -> Self {
        set.rules.into_iter().map(RuleConfig::from).collect()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a RecognitionRule;
    type IntoIter = std::slice::Iter<'a, RecognitionRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
