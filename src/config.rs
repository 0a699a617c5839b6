//! Ledger configuration

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::{LedgerError, LedgerResult};

/// Number of decimal places in one currency minor unit
pub const DEFAULT_MINOR_UNIT_SCALE: i64 = 2;

const MAX_MINOR_UNIT_SCALE: i64 = 18;

/// Longest description accepted by the strict validator
pub const DEFAULT_MAX_DESCRIPTION_LEN: usize = 500;

/// Rounding slack allowed when comparing sums, one minor unit (0.01)
pub fn default_tolerance() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

/// How balances treat the shares recorded on each expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Use each participant's stored allocation amount
    #[default]
    RecordedShares,
    /// Divide every expense equally among its split participants,
    /// ignoring the policy it was created with
    EqualDivision,
}

/// Tunables for allocation, validation and aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Absolute slack for allocation and percentage totals
    pub tolerance: BigDecimal,
    /// Decimal places of the currency minor unit
    pub minor_unit_scale: i64,
    /// Round equal shares to the minor unit and hand out the remainder
    pub round_equal_shares: bool,
    pub aggregation: AggregationMode,
    pub max_description_len: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            minor_unit_scale: DEFAULT_MINOR_UNIT_SCALE,
            round_equal_shares: true,
            aggregation: AggregationMode::default(),
            max_description_len: DEFAULT_MAX_DESCRIPTION_LEN,
        }
    }
}

impl LedgerConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> LedgerResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> LedgerResult<()> {
        if self.tolerance < BigDecimal::from(0) {
            return Err(LedgerError::Config(
                "Tolerance cannot be negative".to_string(),
            ));
        }

        if !(0..=MAX_MINOR_UNIT_SCALE).contains(&self.minor_unit_scale) {
            return Err(LedgerError::Config(format!(
                "Minor unit scale must be between 0 and {}",
                MAX_MINOR_UNIT_SCALE
            )));
        }

        if self.max_description_len == 0 {
            return Err(LedgerError::Config(
                "Maximum description length must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether a signed difference falls inside the tolerance
    pub fn within_tolerance(&self, difference: &BigDecimal) -> bool {
        difference.abs() <= self.tolerance
    }

    /// Size of one minor unit, e.g. 0.01 for a scale of 2
    pub fn minor_unit(&self) -> BigDecimal {
        BigDecimal::from(1) / BigDecimal::from(10u64.pow(self.minor_unit_scale as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.tolerance, BigDecimal::from_str("0.01").unwrap());
        assert_eq!(config.minor_unit(), BigDecimal::from_str("0.01").unwrap());
        assert_eq!(config.aggregation, AggregationMode::RecordedShares);
        assert!(config.round_equal_shares);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config =
            LedgerConfig::from_json_str(r#"{"aggregation": "equal_division", "tolerance": "0.05"}"#)
                .unwrap();
        assert_eq!(config.aggregation, AggregationMode::EqualDivision);
        assert_eq!(config.tolerance, BigDecimal::from_str("0.05").unwrap());
        assert_eq!(config.minor_unit_scale, DEFAULT_MINOR_UNIT_SCALE);
    }

    #[test]
    fn test_config_rejects_negative_tolerance() {
        let result = LedgerConfig::from_json_str(r#"{"tolerance": "-1"}"#);
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_config_rejects_malformed_json() {
        assert!(LedgerConfig::from_json_str("{not json").is_err());
    }

    #[test]
    fn test_within_tolerance() {
        let config = LedgerConfig::default();
        assert!(config.within_tolerance(&BigDecimal::from_str("-0.01").unwrap()));
        assert!(!config.within_tolerance(&BigDecimal::from_str("0.011").unwrap()));
    }
}
