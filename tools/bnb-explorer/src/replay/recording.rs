//! Serializable types for scenario recordings.
//!
//! A recording is a JSONL file where each line is a `RecordEntry` JSON object:
//! one `scenario_start`, every `step` in trace order, every `candidate` in
//! discovery order, then one `scenario_end`.

use crate::search::SearchOptions;
use crate::trace::{SolutionCandidate, Step};
use crate::types::SearchOutcome;
use crate::values::SortedValues;
use serde::{Deserialize, Serialize};

/// The top-level tagged enum that is serialized as a single JSONL line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordEntry {
    ScenarioStart(ScenarioStartRecord),
    Step(Step),
    Candidate(SolutionCandidate),
    ScenarioEnd(ScenarioEndRecord),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStartRecord {
    pub explorer_version: String,
    pub values: SortedValues,
    pub target: u64,
    pub tolerance: u64,
    pub options: SearchOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioEndRecord {
    pub outcome: SearchOutcome,
    pub best: Option<usize>,
    pub step_count: usize,
    /// `Trace::fingerprint` of the recorded steps.
    pub fingerprint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_entry_is_tagged_by_type() {
        let entry = RecordEntry::ScenarioEnd(ScenarioEndRecord {
            outcome: SearchOutcome::Failure,
            best: None,
            step_count: 3,
            fingerprint: "ab".to_string(),
        });
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["type"], "scenario_end");
        assert_eq!(json["outcome"], "failure");
        let back: RecordEntry = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, entry);
    }
}
