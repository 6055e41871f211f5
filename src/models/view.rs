use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::{StrategySummary, TradeRecord};

/// Normalized outcome of one strategy: data or an error, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StrategyView {
    Ready {
        trades: Vec<TradeRecord>,
        summary: StrategySummary,
    },
    Failed {
        error: String,
    },
}

impl StrategyView {
    pub fn failed(error: impl Into<String>) -> Self {
        StrategyView::Failed {
            error: error.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, StrategyView::Ready { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StrategyView::Failed { error } => Some(error),
            StrategyView::Ready { .. } => None,
        }
    }

    pub fn as_ready(&self) -> Option<(&[TradeRecord], &StrategySummary)> {
        match self {
            StrategyView::Ready { trades, summary } => Some((trades, summary)),
            StrategyView::Failed { .. } => None,
        }
    }
}

/// Values keyed by strategy id, kept in request order.
///
/// Serializes as a JSON object whose keys follow that order.
#[derive(Debug, Clone, PartialEq)]
pub struct ByStrategy<V> {
    entries: Vec<(String, V)>,
}

/// Normalized views for one run.
pub type StrategyViews = ByStrategy<StrategyView>;

impl<V> Default for ByStrategy<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> ByStrategy<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced id keeps its original position.
    pub fn insert(&mut self, id: impl Into<String>, value: V) {
        let id = id.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((id, value)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }
}

impl ByStrategy<StrategyView> {
    /// Successful views only, in request order.
    pub fn ready(&self) -> impl Iterator<Item = (&str, &[TradeRecord], &StrategySummary)> {
        self.iter()
            .filter_map(|(id, view)| view.as_ready().map(|(trades, summary)| (id, trades, summary)))
    }
}

impl<V> FromIterator<(String, V)> for ByStrategy<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = ByStrategy::new();
        for (id, value) in iter {
            map.insert(id, value);
        }
        map
    }
}

impl<V> IntoIterator for ByStrategy<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: Serialize> Serialize for ByStrategy<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, value) in &self.entries {
            map.serialize_entry(id, value)?;
        }
        map.end()
    }
}
