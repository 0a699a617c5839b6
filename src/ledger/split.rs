//! Split policies: turning one expense total into per-participant shares

use bigdecimal::BigDecimal;
use std::collections::{HashMap, HashSet};

use crate::config::LedgerConfig;
use crate::types::*;

/// Policy together with the per-participant values it needs
#[derive(Debug, Clone, PartialEq)]
pub enum SplitInputs {
    Equal,
    /// Share amount per participant, passed through unchanged
    Exact(HashMap<ParticipantId, BigDecimal>),
    /// Percentage of the total per participant
    Percentage(HashMap<ParticipantId, BigDecimal>),
}

impl SplitInputs {
    /// Policy these inputs belong to
    pub fn policy(&self) -> SplitPolicy {
        match self {
            SplitInputs::Equal => SplitPolicy::Equal,
            SplitInputs::Exact(_) => SplitPolicy::Exact,
            SplitInputs::Percentage(_) => SplitPolicy::Percentage,
        }
    }
}

/// Computes allocations for a single expense. Pure: no state survives a call.
#[derive(Debug, Clone)]
pub struct SplitAllocator {
    round_equal_shares: bool,
    minor_unit: BigDecimal,
    minor_unit_scale: i64,
}

impl Default for SplitAllocator {
    fn default() -> Self {
        Self::new(&LedgerConfig::default())
    }
}

impl SplitAllocator {
    /// Create an allocator using the rounding settings of a config
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            round_equal_shares: config.round_equal_shares,
            minor_unit: config.minor_unit(),
            minor_unit_scale: config.minor_unit_scale,
        }
    }

    /// Allocate `total` across `participants`.
    ///
    /// The result covers each distinct participant exactly once, in the order
    /// they were first given. Missing exact or percentage inputs allocate zero.
    pub fn allocate(
        &self,
        total: &BigDecimal,
        participants: &[ParticipantId],
        inputs: &SplitInputs,
    ) -> Vec<Allocation> {
        let mut seen = HashSet::new();
        let participants: Vec<&ParticipantId> = participants
            .iter()
            .filter(|id| seen.insert(*id))
            .collect();

        let allocations: Vec<Allocation> = match inputs {
            SplitInputs::Equal => {
                let shares = self.equal_shares(total, participants.len());
                participants
                    .into_iter()
                    .zip(shares)
                    .map(|(id, amount)| Allocation::share(id.clone(), amount))
                    .collect()
            }
            SplitInputs::Exact(amounts) => participants
                .into_iter()
                .map(|id| {
                    let amount = amounts
                        .get(id.as_str())
                        .cloned()
                        .unwrap_or_else(|| BigDecimal::from(0));
                    Allocation::share(id.clone(), amount)
                })
                .collect(),
            SplitInputs::Percentage(percentages) => participants
                .into_iter()
                .map(|id| {
                    let percentage = percentages
                        .get(id.as_str())
                        .cloned()
                        .unwrap_or_else(|| BigDecimal::from(0));
                    let amount = percentage_share(total, &percentage);
                    Allocation::with_percentage(id.clone(), amount, percentage)
                })
                .collect(),
        };

        tracing::debug!(
            policy = %inputs.policy(),
            participants = allocations.len(),
            "allocated expense shares"
        );

        allocations
    }

    /// Divide `total` into `count` equal shares.
    ///
    /// With rounding on, shares are truncated to the minor unit and the
    /// leftover minor units go one each to the leading shares; any dust below
    /// one minor unit lands on the first share. Shares always sum to `total`.
    pub fn equal_shares(&self, total: &BigDecimal, count: usize) -> Vec<BigDecimal> {
        if count == 0 {
            return Vec::new();
        }

        let divisor = BigDecimal::from(count as u64);
        let exact = total / &divisor;

        if !self.round_equal_shares {
            return vec![exact; count];
        }

        let base = exact.with_scale(self.minor_unit_scale);
        let mut remainder = total - &base * &divisor;
        let step = if remainder < BigDecimal::from(0) {
            -self.minor_unit.clone()
        } else {
            self.minor_unit.clone()
        };

        let mut shares = vec![base; count];
        for share in shares.iter_mut() {
            if remainder.abs() < self.minor_unit {
                break;
            }
            *share += &step;
            remainder -= &step;
        }

        if remainder != BigDecimal::from(0) {
            shares[0] += remainder;
        }

        shares
    }
}

/// Share of `total` represented by `percentage` (0-100)
pub fn percentage_share(total: &BigDecimal, percentage: &BigDecimal) -> BigDecimal {
    (total * percentage) / BigDecimal::from(100)
}

/// Allocate with the default configuration
pub fn allocate(
    total: &BigDecimal,
    participants: &[ParticipantId],
    inputs: &SplitInputs,
) -> Vec<Allocation> {
    SplitAllocator::default().allocate(total, participants, inputs)
}
