//! Sortable trade ledger for one strategy.
//!
//! Sorting is always stable and never touches the snapshot it was given:
//! every call hands back a fresh, reordered copy.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::TradeRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Week,
    #[serde(alias = "strategy_name")]
    Strategy,
    Symbol,
    Action,
    Quantity,
    Price,
    Strike,
    #[serde(alias = "cashFlow")]
    CashFlow,
    Notes,
    Timestamp,
}

impl SortField {
    pub const ALL: [SortField; 10] = [
        SortField::Week,
        SortField::Strategy,
        SortField::Symbol,
        SortField::Action,
        SortField::Quantity,
        SortField::Price,
        SortField::Strike,
        SortField::CashFlow,
        SortField::Notes,
        SortField::Timestamp,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "week" => Some(SortField::Week),
            "strategy" | "strategy_name" | "strategyname" => Some(SortField::Strategy),
            "symbol" => Some(SortField::Symbol),
            "action" => Some(SortField::Action),
            "quantity" => Some(SortField::Quantity),
            "price" => Some(SortField::Price),
            "strike" => Some(SortField::Strike),
            "cash_flow" | "cashflow" => Some(SortField::CashFlow),
            "notes" => Some(SortField::Notes),
            "timestamp" => Some(SortField::Timestamp),
            _ => None,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortField::Week => "week",
            SortField::Strategy => "strategy",
            SortField::Symbol => "symbol",
            SortField::Action => "action",
            SortField::Quantity => "quantity",
            SortField::Price => "price",
            SortField::Strike => "strike",
            SortField::CashFlow => "cash_flow",
            SortField::Notes => "notes",
            SortField::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    /// Most recent trades first.
    fn default() -> Self {
        Self {
            field: SortField::Timestamp,
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    /// Column-header click: same field flips direction, a new field starts
    /// ascending.
    pub fn select(self, field: SortField) -> Self {
        if field == self.field {
            Self {
                field,
                direction: self.direction.toggled(),
            }
        } else {
            Self {
                field,
                direction: SortDirection::Asc,
            }
        }
    }
}

/// Stable sort into a new vector.
///
/// Descending reverses the key comparison only, so equal keys keep their
/// original relative order in both directions.
pub fn sort_trades(trades: &[TradeRecord], spec: SortSpec) -> Vec<TradeRecord> {
    let mut sorted = trades.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare_field(a, b, spec.field);
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted
}

/// Ascending comparison of two trades on one column.
pub fn compare_field(a: &TradeRecord, b: &TradeRecord, field: SortField) -> Ordering {
    match field {
        SortField::Week => compare_week(&a.week, &b.week),
        SortField::Strategy => locale_cmp(&a.strategy_name, &b.strategy_name),
        SortField::Symbol => locale_cmp(&a.symbol, &b.symbol),
        SortField::Action => locale_cmp(a.action.as_str(), b.action.as_str()),
        SortField::Quantity => a.quantity.cmp(&b.quantity),
        SortField::Price => a.price.cmp(&b.price),
        SortField::Strike => a.strike.cmp(&b.strike),
        SortField::CashFlow => a.cash_flow.cmp(&b.cash_flow),
        SortField::Notes => locale_cmp(&a.notes, &b.notes),
        SortField::Timestamp => a.timestamp.cmp(&b.timestamp),
    }
}

/// Case-insensitive first; on a tie lowercase sorts before uppercase.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.cmp(a))
}

/// Numeric labels compare as numbers and come before anything else.
fn compare_week(a: &str, b: &str) -> Ordering {
    match (Decimal::from_str(a.trim()), Decimal::from_str(b.trim())) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => locale_cmp(a, b),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    /// Successful run with zero trades.
    NoTrades,
    Rows,
}

/// What the trades table renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerView {
    pub status: LedgerStatus,
    pub sort: SortSpec,
    pub collapsed: bool,
    pub total_rows: usize,
    /// Empty while collapsed; the order is unaffected by collapsing.
    pub rows: Vec<TradeRecord>,
}

/// Presentation state of one strategy's trade table.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeLedger {
    trades: Vec<TradeRecord>,
    sorted: Vec<TradeRecord>,
    sort: SortSpec,
    collapsed: bool,
}

impl TradeLedger {
    pub fn new(trades: Vec<TradeRecord>) -> Self {
        Self::with_state(trades, SortSpec::default(), false)
    }

    pub fn with_state(trades: Vec<TradeRecord>, sort: SortSpec, collapsed: bool) -> Self {
        let sorted = sort_trades(&trades, sort);
        Self {
            trades,
            sorted,
            sort,
            collapsed,
        }
    }

    pub fn select_field(&mut self, field: SortField) {
        self.set_sort(self.sort.select(field));
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
        self.sorted = sort_trades(&self.trades, sort);
    }

    pub fn toggle_collapsed(&mut self) {
        self.collapsed = !self.collapsed;
    }

    pub fn status(&self) -> LedgerStatus {
        if self.trades.is_empty() {
            LedgerStatus::NoTrades
        } else {
            LedgerStatus::Rows
        }
    }

    /// Sorted rows regardless of collapse state.
    pub fn rows(&self) -> &[TradeRecord] {
        &self.sorted
    }

    /// Rows to render right now.
    pub fn visible_rows(&self) -> &[TradeRecord] {
        if self.collapsed {
            &[]
        } else {
            &self.sorted
        }
    }

    pub fn view(&self) -> LedgerView {
        LedgerView {
            status: self.status(),
            sort: self.sort,
            collapsed: self.collapsed,
            total_rows: self.sorted.len(),
            rows: self.visible_rows().to_vec(),
        }
    }
}
