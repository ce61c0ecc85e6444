use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use payout_recon::{
    ledger::{Category, Transaction},
    pivot::MonthlyPivot,
    rates::{InMemoryTableSource, RateRecord, RateTimeline, TableFamily, TablePublication},
};
use rust_decimal::Decimal;

fn benchmark_timeline_build(c: &mut Criterion) {
    // one family-A publication every other day across a month, one B table
    let mut source = InMemoryTableSource::new();
    let mut publications = Vec::new();
    for (i, day) in (1u32..=31).step_by(2).enumerate() {
        let id = format!("a{:03}z2401{:02}", i + 1, day);
        let records: Vec<RateRecord> = (0..50)
            .map(|n| RateRecord::new(&format!("C{:02}", n), "1", &format!("{},{:02}", day, n)))
            .collect();
        source.insert(&id, records);
        publications.push(TablePublication {
            family: TableFamily::A,
            effective_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            id,
        });
    }
    source.insert("b001z240101", vec![RateRecord::new("XDR", "1", "5,40")]);
    publications.push(TablePublication {
        family: TableFamily::B,
        effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        id: "b001z240101".to_string(),
    });

    c.bench_function("timeline_build_31_days", |b| {
        b.iter(|| {
            let timeline = RateTimeline::build(
                black_box(&publications),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                &source,
            )
            .unwrap();
            black_box(timeline);
        });
    });
}

fn benchmark_quote_lookup(c: &mut Criterion) {
    let mut source = InMemoryTableSource::new();
    source.insert(
        "a001z240101",
        (0..50)
            .map(|n| RateRecord::new(&format!("C{:02}", n), "1", "4,10"))
            .collect(),
    );
    source.insert("b001z240101", vec![RateRecord::new("XDR", "1", "5,40")]);
    let publications = vec![
        TablePublication {
            family: TableFamily::A,
            effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            id: "a001z240101".to_string(),
        },
        TablePublication {
            family: TableFamily::B,
            effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            id: "b001z240101".to_string(),
        },
    ];
    let timeline = RateTimeline::build(
        &publications,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        &source,
    )
    .unwrap();

    c.bench_function("quote_lookup_1000", |b| {
        b.iter(|| {
            for i in 0..1000u32 {
                let day = NaiveDate::from_ymd_opt(2024, 1, i % 31 + 1).unwrap();
                let currency = format!("C{:02}", i % 50);
                let _ = black_box(timeline.quote(day, &currency));
            }
        });
    });
}

fn benchmark_pivot(c: &mut Criterion) {
    let currencies = ["EUR", "GBP", "JPY", "SEK", "USD"];
    let transactions: Vec<Transaction> = (0..10_000u32)
        .map(|i| Transaction {
            id: Some(format!("T{}", i)),
            date: NaiveDate::from_ymd_opt(2024, 1, i % 31 + 1).unwrap(),
            category: Category::Charge,
            product_name: None,
            sku_id: None,
            buyer_country: None,
            buyer_currency: currencies[i as usize % currencies.len()].to_string(),
            merchant_currency: "USD".to_string(),
            amount: Decimal::new(i as i64 % 5000, 2),
            payout: Decimal::new(i as i64 % 4000, 2),
            conversion_rate: Decimal::new(41_000 + i as i64 % 100, 4),
            conversion_rate_base_units: 1,
            tax_amount: None,
        })
        .collect();

    c.bench_function("pivot_10k_transactions", |b| {
        b.iter(|| {
            let pivot = MonthlyPivot::new(black_box(&transactions)).unwrap();
            black_box(pivot.grand_summary().total);
        });
    });
}

criterion_group!(
    benches,
    benchmark_timeline_build,
    benchmark_quote_lookup,
    benchmark_pivot
);
criterion_main!(benches);
