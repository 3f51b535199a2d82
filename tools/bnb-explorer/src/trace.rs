//! The append-only execution trace produced by a search.

use crate::errors::ExplorerError;
use crate::path::DecisionPath;
use crate::types::{SearchOutcome, StepKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One recorded search event. Step ids equal their position in the trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: u64,
    pub kind: StepKind,
    pub depth: usize,
    /// Index of the last value decided on the way to this node; `None` at the root.
    pub value_index: Option<usize>,
    pub selection: Vec<usize>,
    pub sum: u64,
    pub remaining_value: u64,
    pub rationale: String,
    pub path: DecisionPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SearchOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionCandidate {
    /// Decisions down to the node where the solution was detected. Values
    /// past that depth were never decided and count as excluded, so `[60, 50,
    /// 25] -> 110` yields `[true, true]`; `selection_mask` pads it to
    /// `[true, true, false]`.
    pub path: DecisionPath,
    /// Id of the `SOLUTION` step recording this candidate.
    pub step_id: u64,
    pub sum: u64,
}

impl SolutionCandidate {
    pub fn input_count(&self) -> usize {
        self.path.as_slice().iter().filter(|&&d| d).count()
    }

    /// The candidate's selection as a full-width include mask over all values.
    pub fn selection_mask(&self, value_count: usize) -> Vec<bool> {
        let mut mask = self.path.as_slice().to_vec();
        mask.resize(value_count.max(mask.len()), false);
        mask
    }
}

/// Frozen trace. Only [`TraceBuilder`] can append to it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    steps: Vec<Step>,
}

impl Trace {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn count_kind(&self, kind: StepKind) -> usize {
        self.steps.iter().filter(|s| s.kind == kind).count()
    }

    /// Rebuild a trace from deserialized steps, checking its shape.
    pub fn from_steps(steps: Vec<Step>) -> Result<Self, ExplorerError> {
        let trace = Self { steps };
        trace.validate_shape()?;
        Ok(trace)
    }

    /// Check the invariants a depth-first search always produces: sequential
    /// ids, paths that grow by at most one decision per step (and only by
    /// extending the previous path), and a single trailing `COMPLETE`.
    pub fn validate_shape(&self) -> Result<(), ExplorerError> {
        let Some(last) = self.steps.last() else {
            return Err(ExplorerError::MalformedTrace("trace is empty".to_string()));
        };
        if last.kind != StepKind::Complete {
            return Err(ExplorerError::MalformedTrace(
                "trace must end with a COMPLETE step".to_string(),
            ));
        }
        if self.count_kind(StepKind::Complete) != 1 {
            return Err(ExplorerError::MalformedTrace(
                "trace must contain exactly one COMPLETE step".to_string(),
            ));
        }

        let mut previous = DecisionPath::root();
        for (position, step) in self.steps.iter().enumerate() {
            if step.id != position as u64 {
                return Err(ExplorerError::MalformedTrace(format!(
                    "step at position {position} has id {}",
                    step.id
                )));
            }
            if step.depth != step.path.len() {
                return Err(ExplorerError::MalformedTrace(format!(
                    "step {} depth {} disagrees with path {}",
                    step.id, step.depth, step.path
                )));
            }
            if step.path.len() > previous.len() + 1 {
                return Err(ExplorerError::MalformedTrace(format!(
                    "step {} jumps from {} to {}",
                    step.id, previous, step.path
                )));
            }
            if step.path.len() == previous.len() + 1 && !previous.is_prefix_of(&step.path) {
                return Err(ExplorerError::MalformedTrace(format!(
                    "step {} path {} does not extend {}",
                    step.id, step.path, previous
                )));
            }
            previous = step.path.clone();
        }
        Ok(())
    }

    /// SHA-256 over the canonical JSON of every step, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut digest = Sha256::new();
        for step in &self.steps {
            // Serializing plain data cannot fail; an empty line keeps positions stable.
            let line = serde_json::to_string(step).unwrap_or_default();
            digest.update(line.as_bytes());
            digest.update(b"\n");
        }
        let bytes = digest.finalize();
        let mut out = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }
}

/// Invocation-local step log. Ids are handed out in recording order.
#[derive(Debug, Default)]
pub struct TraceBuilder {
    steps: Vec<Step>,
}

/// The node-level facts every step copies.
#[derive(Debug, Clone, Copy)]
pub struct NodeFacts<'a> {
    pub path: &'a DecisionPath,
    pub selection: &'a [usize],
    pub sum: u64,
    pub remaining_value: u64,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.steps.len() as u64
    }

    pub fn record(&mut self, kind: StepKind, node: NodeFacts<'_>, rationale: String) -> u64 {
        self.push(kind, node, rationale, None)
    }

    pub fn record_complete(
        &mut self,
        outcome: SearchOutcome,
        remaining_value: u64,
        rationale: String,
    ) -> u64 {
        let root = DecisionPath::root();
        self.push(
            StepKind::Complete,
            NodeFacts {
                path: &root,
                selection: &[],
                sum: 0,
                remaining_value,
            },
            rationale,
            Some(outcome),
        )
    }

    fn push(
        &mut self,
        kind: StepKind,
        node: NodeFacts<'_>,
        rationale: String,
        outcome: Option<SearchOutcome>,
    ) -> u64 {
        let id = self.next_id();
        self.steps.push(Step {
            id,
            kind,
            depth: node.path.len(),
            value_index: node.path.len().checked_sub(1),
            selection: node.selection.to_vec(),
            sum: node.sum,
            remaining_value: node.remaining_value,
            rationale,
            path: node.path.clone(),
            outcome,
        });
        id
    }

    pub fn finish(self) -> Trace {
        Trace { steps: self.steps }
    }
}
