//! Decision paths: the canonical identity of a node in the include/exclude tree.
//!
//! A path is encoded as a string of `1` (include) and `0` (exclude) characters
//! when a flat key is needed, e.g. for the replay arena. The root is the empty
//! path and the empty key.

use crate::errors::ExplorerError;
use crate::types::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionPath(Vec<bool>);

impl DecisionPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_decisions(decisions: impl IntoIterator<Item = bool>) -> Self {
        Self(decisions.into_iter().collect())
    }

    pub fn from_key(key: &str) -> Result<Self, ExplorerError> {
        key.chars()
            .map(|c| match c {
                '1' => Ok(true),
                '0' => Ok(false),
                other => Err(ExplorerError::InvalidInput(format!(
                    "path key may only contain 0 and 1, found {other:?}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn child(&self, include: bool) -> Self {
        let mut decisions = Vec::with_capacity(self.0.len() + 1);
        decisions.extend_from_slice(&self.0);
        decisions.push(include);
        Self(decisions)
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, head) = self.0.split_last()?;
        Some(Self(head.to_vec()))
    }

    /// Direction of the edge that leads into this node, `None` at the root.
    pub fn direction(&self) -> Option<Direction> {
        self.0.last().copied().map(Direction::from_decision)
    }

    /// `self` is a prefix of `other` (equal paths included).
    pub fn is_prefix_of(&self, other: &DecisionPath) -> bool {
        self.0.len() <= other.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// Every path from the root down to and including `self`.
    pub fn prefixes(&self) -> impl Iterator<Item = DecisionPath> + '_ {
        (0..=self.0.len()).map(move |len| Self(self.0[..len].to_vec()))
    }

    pub fn key(&self) -> String {
        self.0.iter().map(|&d| if d { '1' } else { '0' }).collect()
    }

    /// Indices of the values this path includes.
    pub fn included_indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(idx, &d)| d.then_some(idx))
            .collect()
    }
}

impl fmt::Display for DecisionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("root")
        } else {
            f.write_str(&self.key())
        }
    }
}
