//! Net balances derived from a collection of expenses

use bigdecimal::BigDecimal;
use std::collections::BTreeMap;

use crate::config::{AggregationMode, LedgerConfig};
use crate::ledger::split::SplitAllocator;
use crate::types::*;

/// Folds expenses into signed per-participant positions.
///
/// Every expense credits its payer with the shares of the other split
/// participants and debits each of those participants their own share, so
/// the positions of any set of expenses sum to exactly zero. Expenses with no
/// split participants contribute nothing.
#[derive(Debug, Clone, Default)]
pub struct BalanceAggregator {
    mode: AggregationMode,
    allocator: SplitAllocator,
}

impl BalanceAggregator {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            mode: config.aggregation,
            allocator: SplitAllocator::new(config),
        }
    }

    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    /// Non-zero balances of every participant touched by the group's
    /// expenses, ordered by participant id
    pub fn group_balances(&self, group_id: &str, expenses: &[Expense]) -> Vec<Balance> {
        let in_scope = expenses.iter().filter(|e| e.in_group(group_id));
        let positions = self.net_positions(in_scope);

        let zero = BigDecimal::from(0);
        let balances: Vec<Balance> = positions
            .into_iter()
            .filter(|(_, amount)| *amount != zero)
            .map(|(participant_id, amount)| Balance::new(participant_id, amount))
            .collect();

        tracing::debug!(
            group_id,
            expenses = expenses.len(),
            balances = balances.len(),
            "aggregated group balances"
        );

        balances
    }

    /// Net position of one participant across every expense given
    pub fn participant_balance(&self, participant_id: &str, expenses: &[Expense]) -> BigDecimal {
        let mut total = BigDecimal::from(0);

        for expense in expenses {
            let shares = self.shares(expense);

            if shares.is_empty() {
                continue;
            }

            if expense.payer_id == participant_id {
                total += others_total(&expense.payer_id, &shares);
            } else {
                for (_, share) in shares.iter().filter(|(id, _)| *id == participant_id) {
                    total -= share;
                }
            }
        }

        tracing::debug!(
            participant_id,
            expenses = expenses.len(),
            "aggregated participant balance"
        );

        total
    }

    /// Positions of every participant involved, including settled ones
    pub fn net_positions<'a>(
        &self,
        expenses: impl IntoIterator<Item = &'a Expense>,
    ) -> BTreeMap<ParticipantId, BigDecimal> {
        let mut positions: BTreeMap<ParticipantId, BigDecimal> = BTreeMap::new();

        for expense in expenses {
            let shares = self.shares(expense);
            if shares.is_empty() {
                continue;
            }

            let credit = others_total(&expense.payer_id, &shares);
            *positions
                .entry(expense.payer_id.clone())
                .or_insert_with(|| BigDecimal::from(0)) += credit;

            for (participant_id, share) in shares {
                if participant_id != expense.payer_id {
                    *positions
                        .entry(participant_id.to_string())
                        .or_insert_with(|| BigDecimal::from(0)) -= share;
                }
            }
        }

        positions
    }

    /// Shares of an expense as seen by the configured mode
    fn shares<'a>(&self, expense: &'a Expense) -> Vec<(&'a str, BigDecimal)> {
        match self.mode {
            AggregationMode::RecordedShares => expense
                .allocations
                .iter()
                .map(|a| (a.participant_id.as_str(), a.amount.clone()))
                .collect(),
            AggregationMode::EqualDivision => {
                let ids: Vec<&str> = expense.participant_ids().collect();
                let shares = self.allocator.equal_shares(&expense.amount, ids.len());
                ids.into_iter().zip(shares).collect()
            }
        }
    }
}

fn others_total(payer_id: &str, shares: &[(&str, BigDecimal)]) -> BigDecimal {
    shares
        .iter()
        .filter(|(id, _)| *id != payer_id)
        .map(|(_, share)| share)
        .sum()
}

/// Group balances with the default configuration
pub fn aggregate_group_balances(group_id: &str, expenses: &[Expense]) -> Vec<Balance> {
    BalanceAggregator::default().group_balances(group_id, expenses)
}

/// A participant's overall balance with the default configuration
pub fn aggregate_user_balance(participant_id: &str, expenses: &[Expense]) -> BigDecimal {
    BalanceAggregator::default().participant_balance(participant_id, expenses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn expense(
        id: &str,
        group_id: &str,
        amount: i64,
        payer: &str,
        policy: SplitPolicy,
        shares: &[(&str, i64)],
    ) -> Expense {
        Expense {
            id: id.to_string(),
            description: format!("Expense {}", id),
            amount: BigDecimal::from(amount),
            payer_id: payer.to_string(),
            group_id: Some(group_id.to_string()),
            policy,
            allocations: shares
                .iter()
                .map(|(p, s)| Allocation::share(*p, BigDecimal::from(*s)))
                .collect(),
            category: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    fn amount_of(balances: &[Balance], id: &str) -> Option<BigDecimal> {
        balances
            .iter()
            .find(|b| b.participant_id == id)
            .map(|b| b.amount.clone())
    }

    #[test]
    fn test_equal_split_credits_payer() {
        let expenses = vec![expense(
            "1",
            "g1",
            8000,
            "1",
            SplitPolicy::Equal,
            &[("1", 2000), ("2", 2000), ("3", 2000), ("4", 2000)],
        )];

        let balances = aggregate_group_balances("g1", &expenses);

        assert_eq!(amount_of(&balances, "1"), Some(BigDecimal::from(6000)));
        for id in ["2", "3", "4"] {
            assert_eq!(amount_of(&balances, id), Some(BigDecimal::from(-2000)));
        }
    }

    #[test]
    fn test_two_expenses_same_payer_accumulate() {
        let expenses = vec![
            expense("5", "g3", 2400, "x", SplitPolicy::Equal, &[("x", 1200), ("y", 1200)]),
            expense("6", "g3", 850, "x", SplitPolicy::Equal, &[("x", 425), ("y", 425)]),
        ];

        let balances = aggregate_group_balances("g3", &expenses);

        assert_eq!(
            balances,
            vec![
                Balance::new("x", BigDecimal::from(1625)),
                Balance::new("y", BigDecimal::from(-1625)),
            ]
        );
    }

    #[test]
    fn test_settled_participants_are_omitted() {
        let expenses = vec![
            expense("1", "g1", 100, "a", SplitPolicy::Equal, &[("a", 50), ("b", 50)]),
            expense("2", "g1", 100, "b", SplitPolicy::Equal, &[("a", 50), ("b", 50)]),
        ];

        assert!(aggregate_group_balances("g1", &expenses).is_empty());
    }

    #[test]
    fn test_other_groups_are_ignored() {
        let expenses = vec![
            expense("1", "g1", 100, "a", SplitPolicy::Equal, &[("a", 50), ("b", 50)]),
            expense("2", "g2", 300, "c", SplitPolicy::Equal, &[("c", 150), ("a", 150)]),
        ];

        let balances = aggregate_group_balances("g1", &expenses);

        assert_eq!(balances.len(), 2);
        assert_eq!(amount_of(&balances, "c"), None);
    }

    #[test]
    fn test_payer_outside_split_is_credited_full_amount() {
        let expenses = vec![expense(
            "1",
            "g1",
            90,
            "p",
            SplitPolicy::Equal,
            &[("a", 30), ("b", 30), ("c", 30)],
        )];

        let balances = aggregate_group_balances("g1", &expenses);

        assert_eq!(amount_of(&balances, "p"), Some(BigDecimal::from(90)));
        let sum: BigDecimal = balances.iter().map(|b| &b.amount).sum();
        assert_eq!(sum, BigDecimal::from(0));
    }

    #[test]
    fn test_recorded_shares_honour_percentage_split() {
        let expenses = vec![expense(
            "1",
            "g1",
            1200,
            "a",
            SplitPolicy::Percentage,
            &[("a", 720), ("b", 480)],
        )];

        let recorded = aggregate_group_balances("g1", &expenses);
        assert_eq!(amount_of(&recorded, "b"), Some(BigDecimal::from(-480)));

        let config = LedgerConfig {
            aggregation: AggregationMode::EqualDivision,
            ..LedgerConfig::default()
        };
        let equal = BalanceAggregator::new(&config).group_balances("g1", &expenses);
        assert_eq!(amount_of(&equal, "b"), Some(BigDecimal::from(-600)));
        assert_eq!(amount_of(&equal, "a"), Some(BigDecimal::from(600)));
    }

    #[test]
    fn test_expense_without_participants_contributes_nothing() {
        let expenses = vec![expense("1", "g1", 100, "a", SplitPolicy::Equal, &[])];

        assert!(aggregate_group_balances("g1", &expenses).is_empty());
        assert_eq!(aggregate_user_balance("a", &expenses), BigDecimal::from(0));
    }

    #[test]
    fn test_scopes_agree_on_repeated_rows() {
        let expenses = vec![expense(
            "1",
            "g1",
            100,
            "p",
            SplitPolicy::Exact,
            &[("a", 50), ("a", 50)],
        )];

        let balances = aggregate_group_balances("g1", &expenses);

        assert_eq!(amount_of(&balances, "a"), Some(BigDecimal::from(-100)));
        assert_eq!(aggregate_user_balance("a", &expenses), BigDecimal::from(-100));
    }

    #[test]
    fn test_user_balance_spans_groups() {
        let expenses = vec![
            expense(
                "1",
                "g1",
                8000,
                "1",
                SplitPolicy::Equal,
                &[("1", 2000), ("2", 2000), ("3", 2000), ("4", 2000)],
            ),
            expense(
                "2",
                "g1",
                1200,
                "2",
                SplitPolicy::Equal,
                &[("1", 300), ("2", 300), ("3", 300), ("4", 300)],
            ),
            expense("5", "g3", 2400, "2", SplitPolicy::Equal, &[("1", 1200), ("2", 1200)]),
            expense("6", "g3", 850, "1", SplitPolicy::Equal, &[("1", 425), ("2", 425)]),
        ];

        // +6000 - 300 - 1200 + 425
        assert_eq!(aggregate_user_balance("1", &expenses), BigDecimal::from(4925));
        assert_eq!(aggregate_user_balance("9", &expenses), BigDecimal::from(0));
    }
}
