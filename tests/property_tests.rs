//! Property tests for trade ledger ordering.
//!
//! 1. Sorted output is ordered by the selected column in the selected direction
//! 2. Sorting is stable: equal keys keep their input order in both directions
//! 3. Selecting the same column twice returns to the starting direction and order
//! 4. The input snapshot is never reordered

use std::cmp::Ordering;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use strategy_dashboard::ledger::{compare_field, sort_trades, SortDirection, SortField, SortSpec};
use strategy_dashboard::models::{TradeAction, TradeRecord};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_label(options: &'static [&'static str]) -> impl Strategy<Value = String> {
    prop::sample::select(options).prop_map(str::to_string)
}

fn arb_decimal(range: std::ops::Range<i64>) -> impl Strategy<Value = Decimal> {
    range.prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..6).prop_map(|day| {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap() + chrono::Duration::days(day)
    })
}

// Small domains so that ties are common.
fn arb_trade() -> impl Strategy<Value = TradeRecord> {
    (
        arb_label(&["Week0", "Week1", "2", "10", "week3"]),
        arb_label(&["wheel", "Wheel", "rotator"]),
        arb_label(&["SPY", "spy", "Aapl", "aapl", "IWM"]),
        arb_label(&["SELL_PUT", "SELL_CALL", "BUY_SHARES", "ASSIGNED"]),
        arb_decimal(0..300),
        arb_decimal(0..500),
        prop::option::of(arb_decimal(10_000..10_400)),
        arb_decimal(-500..500),
        arb_label(&["", "rolled", "Rolled", "expired"]),
        arb_timestamp(),
    )
        .prop_map(
            |(week, strategy_name, symbol, action, quantity, price, strike, cash_flow, notes, timestamp)| {
                TradeRecord {
                    week,
                    strategy_name,
                    symbol,
                    action: TradeAction::from_api_str(&action),
                    quantity,
                    price,
                    strike,
                    cash_flow,
                    notes,
                    timestamp,
                }
            },
        )
}

fn arb_field() -> impl Strategy<Value = SortField> {
    prop::sample::select(SortField::ALL.to_vec())
}

fn arb_direction() -> impl Strategy<Value = SortDirection> {
    prop::sample::select(vec![SortDirection::Asc, SortDirection::Desc])
}

/// Position of each output row in the input, taking the earliest unused
/// match so identical rows keep a consistent mapping.
fn input_positions(input: &[TradeRecord], output: &[TradeRecord]) -> Vec<usize> {
    let mut used = vec![false; input.len()];
    output
        .iter()
        .map(|row| {
            let idx = input
                .iter()
                .enumerate()
                .position(|(i, candidate)| !used[i] && candidate == row)
                .expect("sorted row missing from input");
            used[idx] = true;
            idx
        })
        .collect()
}

proptest! {
    /// Every adjacent pair respects the column order for the chosen direction.
    #[test]
    fn sorted_rows_are_ordered(
        trades in prop::collection::vec(arb_trade(), 0..24),
        field in arb_field(),
        direction in arb_direction(),
    ) {
        let sorted = sort_trades(&trades, SortSpec { field, direction });
        prop_assert_eq!(sorted.len(), trades.len());
        for pair in sorted.windows(2) {
            let ordering = compare_field(&pair[0], &pair[1], field);
            match direction {
                SortDirection::Asc => prop_assert_ne!(ordering, Ordering::Greater),
                SortDirection::Desc => prop_assert_ne!(ordering, Ordering::Less),
            }
        }
    }

    /// Rows with equal keys appear in their original relative order.
    #[test]
    fn sort_is_stable(
        trades in prop::collection::vec(arb_trade(), 0..24),
        field in arb_field(),
        direction in arb_direction(),
    ) {
        let sorted = sort_trades(&trades, SortSpec { field, direction });
        let positions = input_positions(&trades, &sorted);
        for i in 1..sorted.len() {
            if compare_field(&sorted[i - 1], &sorted[i], field) == Ordering::Equal {
                prop_assert!(positions[i - 1] < positions[i]);
            }
        }
    }

    /// Two clicks on the same header restore both the sort and the rows.
    #[test]
    fn double_select_is_identity(
        trades in prop::collection::vec(arb_trade(), 0..24),
        field in arb_field(),
        direction in arb_direction(),
    ) {
        let spec = SortSpec { field, direction };
        let twice = spec.select(field).select(field);
        prop_assert_eq!(twice, spec);
        prop_assert_eq!(sort_trades(&trades, twice), sort_trades(&trades, spec));
    }

    /// Flipping direction only reverses distinct keys; the input is untouched.
    #[test]
    fn sorting_leaves_input_alone(
        trades in prop::collection::vec(arb_trade(), 0..24),
        field in arb_field(),
    ) {
        let before = trades.clone();
        let asc = sort_trades(&trades, SortSpec { field, direction: SortDirection::Asc });
        let desc = sort_trades(&trades, SortSpec { field, direction: SortDirection::Desc });
        prop_assert_eq!(&trades, &before);

        if let (Some(first), Some(last)) = (asc.first(), desc.last()) {
            prop_assert_eq!(compare_field(first, last, field), Ordering::Equal);
        }
    }
}
