use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use sitestock_core::Batch;
use sitestock_inventory::allocate;

fn batch_strategy() -> impl Strategy<Value = Batch> {
    (0i64..50, 0i64..10_000, 0i64..30, "[A-Z]{3}").prop_map(|(quantity, cents, day, godown)| Batch {
        batch_id: String::new(),
        godown_id: godown.clone(),
        godown_name: godown,
        quantity_remaining: Decimal::new(quantity, 0),
        unit_price: Decimal::new(cents, 2),
        purchase_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
    })
}

fn batches_strategy() -> impl Strategy<Value = Vec<Batch>> {
    prop::collection::vec(batch_strategy(), 0..12).prop_map(|mut batches| {
        for (index, batch) in batches.iter_mut().enumerate() {
            batch.batch_id = format!("B{index}");
        }
        batches
    })
}

proptest! {
    #[test]
    fn never_allocates_more_than_requested(requested in 0i64..300, batches in batches_strategy()) {
        let requested = Decimal::new(requested, 0);
        let result = allocate(requested, &batches).unwrap();
        let allocated = result.allocated_quantity();

        prop_assert!(allocated <= requested);
        prop_assert_eq!(result.fully_satisfied, allocated == requested);
    }

    #[test]
    fn enough_stock_means_fully_satisfied(requested in 0i64..300, batches in batches_strategy()) {
        let requested = Decimal::new(requested, 0);
        let available: Decimal = batches
            .iter()
            .map(|batch| batch.quantity_remaining)
            .filter(|quantity| *quantity > Decimal::ZERO)
            .sum();
        let result = allocate(requested, &batches).unwrap();

        if available >= requested {
            prop_assert!(result.fully_satisfied);
            prop_assert_eq!(result.allocated_quantity(), requested);
        } else {
            prop_assert!(!result.fully_satisfied);
            prop_assert_eq!(result.allocated_quantity(), available);
        }
    }

    #[test]
    fn lines_follow_purchase_order_and_fit_their_batch(
        requested in 0i64..300,
        batches in batches_strategy(),
    ) {
        let result = allocate(Decimal::new(requested, 0), &batches).unwrap();
        let source = |batch_id: &str| batches.iter().find(|batch| batch.batch_id == batch_id).unwrap();

        let mut seen = std::collections::HashSet::new();
        let mut previous_date = None;
        for line in &result.allocations {
            let batch = source(&line.batch_id);
            prop_assert!(seen.insert(line.batch_id.clone()));
            prop_assert!(line.quantity > Decimal::ZERO);
            prop_assert!(line.quantity <= batch.quantity_remaining);
            prop_assert_eq!(line.line_total, line.quantity * line.unit_price);
            if let Some(previous) = previous_date {
                prop_assert!(previous <= batch.purchase_date);
            }
            previous_date = Some(batch.purchase_date);
        }
    }

    #[test]
    fn total_is_sum_of_lines_and_repeatable(requested in 0i64..300, batches in batches_strategy()) {
        let requested = Decimal::new(requested, 0);
        let first = allocate(requested, &batches).unwrap();
        let second = allocate(requested, &batches).unwrap();

        let summed: Decimal = first
            .allocations
            .iter()
            .map(|line| line.quantity * line.unit_price)
            .sum();
        prop_assert_eq!(first.total_price, summed);
        prop_assert_eq!(first, second);
    }
}
