//! Property-based tests
//!
//! Randomized checks of the aggregation and rate-resolution invariants:
//! pivot marginals always sum to the grand total, conversion is the identity
//! for same-currency rows, and every day of a timeline resolves to the
//! latest publication effective before it.

use chrono::{Datelike, NaiveDate};
use payout_recon::ledger::{Category, Transaction};
use payout_recon::pivot::MonthlyPivot;
use payout_recon::rates::{
    InMemoryTableSource, RateRecord, RateTimeline, TableFamily, TablePublication,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

const CURRENCIES: [&str; 4] = ["EUR", "GBP", "JPY", "USD"];

fn arb_transaction() -> impl Strategy<Value = Transaction> {
    (
        1u32..=28,
        0usize..CURRENCIES.len(),
        -100_000i64..100_000,
        -100_000i64..100_000,
        1i64..10_000,
    )
        .prop_map(|(day, currency, amount, payout, rate)| Transaction {
            id: Some(format!("T{}{}", day, amount)),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            category: Category::Charge,
            product_name: None,
            sku_id: None,
            buyer_country: None,
            buyer_currency: CURRENCIES[currency].to_string(),
            merchant_currency: "USD".to_string(),
            amount: Decimal::new(amount, 2),
            payout: Decimal::new(payout, 2),
            conversion_rate: Decimal::new(rate, 4),
            conversion_rate_base_units: 1,
            tax_amount: None,
        })
}

fn publication(family: TableFamily, day: u32, id: &str) -> TablePublication {
    TablePublication {
        family,
        effective_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        id: id.to_string(),
    }
}

proptest! {
    #[test]
    fn pivot_day_marginals_sum_to_grand(
        transactions in prop::collection::vec(arb_transaction(), 1..40)
    ) {
        let pivot = MonthlyPivot::new(&transactions).unwrap();
        let mut total = Decimal::ZERO;
        let mut payout = Decimal::ZERO;
        let mut converted = Decimal::ZERO;
        for day in pivot.days() {
            let summary = pivot.day_summary(day).unwrap();
            total += summary.total;
            payout += summary.total_payout;
            converted += summary.total_converted;
        }
        let grand = pivot.grand_summary();
        prop_assert_eq!(total, grand.total);
        prop_assert_eq!(payout, grand.total_payout);
        prop_assert_eq!(converted, grand.total_converted);
    }

    #[test]
    fn pivot_currency_marginals_sum_to_grand(
        transactions in prop::collection::vec(arb_transaction(), 1..40)
    ) {
        let pivot = MonthlyPivot::new(&transactions).unwrap();
        let total: Decimal = pivot
            .currencies()
            .iter()
            .map(|c| pivot.currency_summary(c).unwrap().total)
            .sum();
        prop_assert_eq!(total, pivot.grand_summary().total);
    }

    #[test]
    fn pivot_cells_sum_to_their_marginals(
        transactions in prop::collection::vec(arb_transaction(), 1..40)
    ) {
        let pivot = MonthlyPivot::new(&transactions).unwrap();
        for day in pivot.days() {
            let by_cell: Decimal = pivot
                .currencies()
                .iter()
                .map(|c| pivot.day_currency_summary(day, c).unwrap().total_payout)
                .sum();
            prop_assert_eq!(by_cell, pivot.day_summary(day).unwrap().total_payout);
        }
    }

    #[test]
    fn same_currency_conversion_is_identity(mut transaction in arb_transaction()) {
        transaction.merchant_currency = transaction.buyer_currency.clone();
        prop_assert_eq!(transaction.amount_converted(), transaction.amount);
        prop_assert_eq!(transaction.spread(), Decimal::ZERO);
    }

    #[test]
    fn cross_currency_spread_is_payout_minus_converted(transaction in arb_transaction()) {
        prop_assert_eq!(
            transaction.spread() + transaction.amount_converted(),
            transaction.payout
        );
    }

    #[test]
    fn timeline_resolves_latest_effective_publication(
        offsets in prop::collection::btree_set(1u32..=28, 1..6),
        from_day in 2u32..=28,
        span in 0u32..10,
    ) {
        let mut offsets = offsets;
        // guarantee a publication effective before the range opens; one due
        // exactly on the range start would only land on the second day, so
        // keep the start itself publication-free
        offsets.insert(1);
        offsets.remove(&from_day);
        let from = NaiveDate::from_ymd_opt(2024, 1, from_day).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, (from_day + span).min(31)).unwrap();

        let mut source = InMemoryTableSource::new();
        let mut publications = vec![publication(TableFamily::B, 1, "b001z240101")];
        source.insert("b001z240101", vec![RateRecord::new("XDR", "1", "5,40")]);
        for (i, day) in offsets.iter().enumerate() {
            let id = format!("a{:03}z2401{:02}", i + 1, day);
            // the rate encodes the effective day, so the oracle can read it
            // back out of the resolved quote
            source.insert(&id, vec![RateRecord::new("EUR", "1", &format!("{},00", day))]);
            publications.push(publication(TableFamily::A, *day, &id));
        }
        let timeline = RateTimeline::build(&publications, from, to, &source).unwrap();

        let mut day = from;
        while day <= to {
            let expected = offsets
                .iter()
                .filter(|d| **d <= day.day())
                .max()
                .copied()
                .unwrap();
            let quote = timeline.quote(day, "EUR").unwrap();
            prop_assert_eq!(quote.rate(), Decimal::from(expected));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn timeline_shares_tables_between_publications(
        from_day in 1u32..=20,
        span in 1u32..=10,
    ) {
        let from = NaiveDate::from_ymd_opt(2024, 1, from_day).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, from_day + span).unwrap();
        let mut source = InMemoryTableSource::new();
        source.insert("a001z240101", vec![RateRecord::new("EUR", "1", "4,10")]);
        source.insert("b001z240101", vec![RateRecord::new("XDR", "1", "5,40")]);
        let publications = vec![
            publication(TableFamily::A, 1, "a001z240101"),
            publication(TableFamily::B, 1, "b001z240101"),
        ];
        let timeline = RateTimeline::build(&publications, from, to, &source).unwrap();
        // a single publication per family means one shared table across the
        // whole range
        let first = timeline.table(from).unwrap();
        let mut day = from;
        while day <= to {
            prop_assert!(Arc::ptr_eq(first, timeline.table(day).unwrap()));
            day = day.succ_opt().unwrap();
        }
    }
}
