//! World state and key history for one deployed contract.

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub tx_id: String,
    pub timestamp: i64,
    pub is_delete: bool,
    pub value: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct WorldState {
    current: BTreeMap<String, Vec<u8>>,
    history: HashMap<String, Vec<HistoryEntry>>,
}

impl WorldState {
    pub fn get(&self, key: &str) -> Option<&Vec<u8>> {
        self.current.get(key)
    }

    /// Keys in `[from, to)`. An empty bound is open.
    pub fn range(&self, from: &str, to: &str) -> Vec<(String, Vec<u8>)> {
        self.current
            .iter()
            .filter(|(k, _)| (from.is_empty() || k.as_str() >= from) && (to.is_empty() || k.as_str() < to))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Oldest first.
    pub fn history(&self, key: &str) -> &[HistoryEntry] {
        self.history.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Applies a committed write set. `None` deletes the key.
    pub fn commit(&mut self, tx_id: &str, timestamp: i64, writes: BTreeMap<String, Option<Vec<u8>>>) {
        for (key, value) in writes {
            let is_delete = value.is_none();
            match &value {
                Some(v) => {
                    self.current.insert(key.clone(), v.clone());
                }
                None => {
                    self.current.remove(&key);
                }
            }
            self.history.entry(key).or_default().push(HistoryEntry {
                tx_id: tx_id.to_string(),
                timestamp,
                is_delete,
                value,
            });
        }
    }
}
