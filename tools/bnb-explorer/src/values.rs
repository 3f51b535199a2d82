use crate::errors::ExplorerError;
use serde::{Deserialize, Serialize};

/// Largest total the engine accepts; every partial sum fits below it.
pub const MAX_TOTAL: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueEntry {
    /// Position after the descending sort.
    pub index: usize,
    pub amount: u64,
    /// Position in the caller's input list.
    pub original_index: usize,
}

/// Input amounts sorted descending (stable), with precomputed suffix sums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ValueEntry>", into = "Vec<ValueEntry>")]
pub struct SortedValues {
    entries: Vec<ValueEntry>,
    suffix: Vec<u64>,
}

impl SortedValues {
    pub fn new(amounts: &[u64]) -> Result<Self, ExplorerError> {
        if amounts.is_empty() {
            return Err(ExplorerError::InvalidInput(
                "value list must not be empty".to_string(),
            ));
        }
        let mut order = amounts.iter().copied().enumerate().collect::<Vec<_>>();
        // sort_by is stable, so equal amounts keep input order.
        order.sort_by(|a, b| b.1.cmp(&a.1));
        let entries = order
            .into_iter()
            .enumerate()
            .map(|(index, (original_index, amount))| ValueEntry {
                index,
                amount,
                original_index,
            })
            .collect::<Vec<_>>();
        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<ValueEntry>) -> Result<Self, ExplorerError> {
        let mut suffix = vec![0u64; entries.len() + 1];
        for idx in (0..entries.len()).rev() {
            suffix[idx] = suffix[idx + 1]
                .checked_add(entries[idx].amount)
                .ok_or_else(|| {
                    ExplorerError::InvalidInput(format!(
                        "sum of values exceeds the maximum representable total {MAX_TOTAL}"
                    ))
                })?;
        }
        Ok(Self { entries, suffix })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn amount(&self, index: usize) -> u64 {
        self.entries[index].amount
    }

    pub fn amounts(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.amount).collect()
    }

    pub fn entries(&self) -> &[ValueEntry] {
        &self.entries
    }

    pub fn total(&self) -> u64 {
        self.suffix[0]
    }

    /// Sum of `values[from..]`; zero once `from` reaches the end.
    pub fn remaining_from(&self, from: usize) -> u64 {
        self.suffix.get(from).copied().unwrap_or(0)
    }

    pub fn original_index(&self, index: usize) -> usize {
        self.entries[index].original_index
    }
}

impl TryFrom<Vec<ValueEntry>> for SortedValues {
    type Error = ExplorerError;

    fn try_from(entries: Vec<ValueEntry>) -> Result<Self, Self::Error> {
        let sorted = entries
            .windows(2)
            .all(|pair| pair[0].amount >= pair[1].amount);
        let indexed = entries.iter().enumerate().all(|(i, e)| e.index == i);
        if entries.is_empty() || !sorted || !indexed {
            return Err(ExplorerError::InvalidInput(
                "value entries must be non-empty, indexed and sorted descending".to_string(),
            ));
        }
        Self::from_entries(entries)
    }
}

impl From<SortedValues> for Vec<ValueEntry> {
    fn from(values: SortedValues) -> Self {
        values.entries
    }
}

/// Parse a comma separated amount list such as `"60, 50,25"`.
pub fn parse_value_list(raw: &str) -> Result<Vec<u64>, ExplorerError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_amount)
        .collect()
}

pub fn parse_amount(raw: &str) -> Result<u64, ExplorerError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('-') {
        return Err(ExplorerError::InvalidInput(format!(
            "amounts must be non-negative, got {trimmed}"
        )));
    }
    trimmed
        .parse::<u64>()
        .map_err(|e| ExplorerError::InvalidInput(format!("invalid amount {trimmed:?}: {e}")))
}
