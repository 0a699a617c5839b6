//! Property tests for allocation and aggregation

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use proptest::prelude::*;

use split_ledger::{
    aggregate_group_balances, allocate, percentage_share, total_allocated, Expense,
    ParticipantId, SplitInputs, SplitPolicy,
};

const PEOPLE: [&str; 6] = ["1", "2", "3", "4", "5", "6"];

fn cents(value: i64) -> BigDecimal {
    BigDecimal::new(value.into(), 2)
}

fn ids(count: usize) -> Vec<ParticipantId> {
    PEOPLE[..count].iter().map(|p| p.to_string()).collect()
}

fn expense(index: usize, amount: i64, payer: usize, mask: u8) -> Expense {
    let participants: Vec<ParticipantId> = PEOPLE
        .iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, p)| p.to_string())
        .collect();
    let total = cents(amount);

    Expense {
        id: format!("e{}", index),
        description: format!("Expense {}", index),
        allocations: allocate(&total, &participants, &SplitInputs::Equal),
        amount: total,
        payer_id: PEOPLE[payer].to_string(),
        group_id: Some("g1".to_string()),
        policy: SplitPolicy::Equal,
        category: None,
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    }
}

fn expenses_strategy() -> impl Strategy<Value = Vec<Expense>> {
    prop::collection::vec((1i64..10_000_000, 0usize..6, 0u8..64), 0..12).prop_map(|rows| {
        rows
            .into_iter()
            .enumerate()
            .map(|(i, (amount, payer, mask))| expense(i, amount, payer, mask))
            .collect()
    })
}

proptest! {
    #[test]
    fn equal_shares_sum_to_total(amount in 1i64..100_000_000, count in 1usize..=6) {
        let total = cents(amount);
        let shares = allocate(&total, &ids(count), &SplitInputs::Equal);

        prop_assert_eq!(shares.len(), count);
        prop_assert_eq!(total_allocated(&shares), total.clone());

        let exact = &total / BigDecimal::from(count as u64);
        let minor_unit = cents(1);
        for share in &shares {
            prop_assert!((&share.amount - &exact).abs() < minor_unit);
        }
    }

    #[test]
    fn percentage_shares_are_proportional(amount in 1i64..100_000_000, first in 0u32..=100) {
        let total = cents(amount);
        let people = ids(2);
        let percentages = [
            ("1".to_string(), BigDecimal::from(first)),
            ("2".to_string(), BigDecimal::from(100 - first)),
        ]
        .into_iter()
        .collect();

        let shares = allocate(&total, &people, &SplitInputs::Percentage(percentages));

        prop_assert_eq!(
            shares[0].amount.clone(),
            percentage_share(&total, &BigDecimal::from(first))
        );
        prop_assert_eq!(total_allocated(&shares), total);
    }

    #[test]
    fn group_balances_are_zero_sum(expenses in expenses_strategy()) {
        let balances = aggregate_group_balances("g1", &expenses);

        let sum: BigDecimal = balances.iter().map(|b| &b.amount).sum();
        prop_assert_eq!(sum, BigDecimal::from(0));
        prop_assert!(balances.iter().all(|b| !b.is_settled()));
    }

    #[test]
    fn group_balances_are_idempotent(expenses in expenses_strategy()) {
        let first = aggregate_group_balances("g1", &expenses);
        let second = aggregate_group_balances("g1", &expenses);

        prop_assert_eq!(first, second);
    }
}
