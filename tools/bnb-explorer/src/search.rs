//! Branch-and-bound exact-sum subset search.
//!
//! The search walks a virtual binary tree in which depth `d` decides whether
//! the `d`-th largest value is included. Every decision is appended to a
//! [`Trace`]; the trace is the only output a caller needs to reconstruct what
//! happened.
//!
//! The traversal uses an explicit frame stack rather than recursion, but the
//! recorded order is exactly the recursive include-first order: at each node
//! the include subtree is fully explored before `EXCLUDE` is recorded.

use crate::errors::ExplorerError;
use crate::path::DecisionPath;
use crate::trace::{NodeFacts, SolutionCandidate, Trace, TraceBuilder};
use crate::types::{BestPolicy, SearchOutcome, StepKind};
use crate::values::SortedValues;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub tolerance: u64,
    /// Cap on recorded search steps; `None` explores the whole tree.
    pub max_steps: Option<u64>,
    pub best_policy: BestPolicy,
    pub emit_start_marker: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            tolerance: 0,
            max_steps: None,
            best_policy: BestPolicy::LastFound,
            emit_start_marker: true,
        }
    }
}

/// Everything a search produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub values: SortedValues,
    pub target: u64,
    pub tolerance: u64,
    pub options: SearchOptions,
    pub trace: Trace,
    pub outcome: SearchOutcome,
    pub candidates: Vec<SolutionCandidate>,
    /// Index into `candidates` of the designated answer.
    pub best: Option<usize>,
}

impl Scenario {
    pub fn best_candidate(&self) -> Option<&SolutionCandidate> {
        self.best.and_then(|idx| self.candidates.get(idx))
    }

    pub fn best_path(&self) -> Option<&DecisionPath> {
        self.best_candidate().map(|c| &c.path)
    }

    /// Sorted-order indices of the values in the best solution.
    pub fn best_selection(&self) -> Option<Vec<usize>> {
        self.best_path().map(DecisionPath::included_indices)
    }

    pub fn best_sum(&self) -> Option<u64> {
        self.best_candidate().map(|c| c.sum)
    }

    /// Input-order indices of the values in the best solution.
    pub fn best_original_indices(&self) -> Option<Vec<usize>> {
        self.best_selection().map(|selection| {
            let mut originals = selection
                .into_iter()
                .map(|idx| self.values.original_index(idx))
                .collect::<Vec<_>>();
            originals.sort_unstable();
            originals
        })
    }

    pub fn is_success(&self) -> bool {
        self.outcome == SearchOutcome::Success
    }
}

/// Search with default options other than `tolerance`.
pub fn search(values: &[u64], target: u64, tolerance: u64) -> Result<Scenario, ExplorerError> {
    search_with_options(
        values,
        target,
        SearchOptions {
            tolerance,
            ..SearchOptions::default()
        },
    )
}

pub fn search_with_options(
    values: &[u64],
    target: u64,
    options: SearchOptions,
) -> Result<Scenario, ExplorerError> {
    let sorted = SortedValues::new(values)?;
    let ceiling = target.checked_add(options.tolerance).ok_or_else(|| {
        ExplorerError::InvalidInput(format!(
            "target {target} plus tolerance {} overflows",
            options.tolerance
        ))
    })?;

    let mut run = SearchRun {
        values: &sorted,
        target,
        tolerance: options.tolerance,
        ceiling,
        policy: options.best_policy,
        trace: TraceBuilder::new(),
        candidates: Vec::new(),
        best: None,
    };

    if options.emit_start_marker {
        let root = DecisionPath::root();
        run.trace.record(
            StepKind::Start,
            NodeFacts {
                path: &root,
                selection: &[],
                sum: 0,
                remaining_value: sorted.total(),
            },
            format!(
                "search for target {target} (tolerance {}) over {} values",
                options.tolerance,
                sorted.len()
            ),
        );
    }

    let exhausted = run.explore(options.max_steps);
    let outcome = if exhausted {
        SearchOutcome::Exhausted
    } else if run.candidates.is_empty() {
        SearchOutcome::Failure
    } else {
        SearchOutcome::Success
    };

    let summary = match (outcome, run.best.and_then(|i| run.candidates.get(i))) {
        (SearchOutcome::Exhausted, _) => format!(
            "step budget exhausted after {} candidates",
            run.candidates.len()
        ),
        (_, Some(best)) => format!(
            "search complete: {} candidates, best sum {} at {}",
            run.candidates.len(),
            best.sum,
            best.path
        ),
        (_, None) => format!("search complete: no subset reaches target {target}"),
    };
    run.trace
        .record_complete(outcome, sorted.total(), summary);

    let SearchRun {
        trace,
        candidates,
        best,
        ..
    } = run;
    Ok(Scenario {
        values: sorted,
        target,
        tolerance: options.tolerance,
        options,
        trace: trace.finish(),
        outcome,
        candidates,
        best,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Enter,
    AfterInclude,
}

#[derive(Debug)]
struct Frame {
    path: DecisionPath,
    selection: Vec<usize>,
    sum: u64,
    phase: Phase,
}

impl Frame {
    fn next_index(&self) -> usize {
        self.path.len()
    }

    fn child(&self, include: bool, amount: u64) -> Frame {
        let mut selection = self.selection.clone();
        let mut sum = self.sum;
        if include {
            selection.push(self.next_index());
            // Bounded by the validated total.
            sum += amount;
        }
        Frame {
            path: self.path.child(include),
            selection,
            sum,
            phase: Phase::Enter,
        }
    }
}

/// Mutable state owned by a single search invocation.
struct SearchRun<'a> {
    values: &'a SortedValues,
    target: u64,
    tolerance: u64,
    ceiling: u64,
    policy: BestPolicy,
    trace: TraceBuilder,
    candidates: Vec<SolutionCandidate>,
    best: Option<usize>,
}

impl SearchRun<'_> {
    /// Returns `true` when the step cap stopped the search early.
    fn explore(&mut self, max_steps: Option<u64>) -> bool {
        let mut core_steps: u64 = 0;
        let mut stack = vec![Frame {
            path: DecisionPath::root(),
            selection: Vec::new(),
            sum: 0,
            phase: Phase::Enter,
        }];

        while let Some(frame) = stack.pop() {
            if max_steps.is_some_and(|cap| core_steps >= cap) {
                return true;
            }
            core_steps += 1;
            match frame.phase {
                Phase::Enter => {
                    if self.evaluate(&frame) {
                        continue;
                    }
                    let next = frame.next_index();
                    let amount = self.values.amount(next);
                    let child = frame.child(true, amount);
                    self.record_at(
                        StepKind::Include,
                        &child,
                        format!(
                            "include value[{next}]={amount}; sum {} -> {}",
                            frame.sum, child.sum
                        ),
                    );
                    stack.push(Frame {
                        phase: Phase::AfterInclude,
                        ..frame
                    });
                    stack.push(child);
                }
                Phase::AfterInclude => {
                    let next = frame.next_index();
                    let amount = self.values.amount(next);
                    let child = frame.child(false, amount);
                    self.record_at(
                        StepKind::Exclude,
                        &child,
                        format!("exclude value[{next}]={amount}; sum stays {}", child.sum),
                    );
                    stack.push(child);
                }
            }
        }
        false
    }

    /// Apply the solution, exhaustion and pruning tests in order. Records the
    /// terminal step and returns `true` if the node must not be expanded.
    fn evaluate(&mut self, frame: &Frame) -> bool {
        let sum = frame.sum;
        let next = frame.next_index();

        if sum == self.target || (self.target < sum && sum <= self.ceiling) {
            let rationale = if sum == self.target {
                format!("sum {sum} matches target {}", self.target)
            } else {
                format!(
                    "sum {sum} within tolerance {} of target {}",
                    self.tolerance, self.target
                )
            };
            let step_id = self.record_at(StepKind::Solution, frame, rationale);
            self.accept(SolutionCandidate {
                path: frame.path.clone(),
                step_id,
                sum,
            });
            return true;
        }

        if next >= self.values.len() {
            self.record_at(
                StepKind::Backtrack,
                frame,
                format!("no values left; sum {sum} misses target {}", self.target),
            );
            return true;
        }

        let remaining = self.values.remaining_from(next);
        // sum + remaining never exceeds the validated total.
        if sum + remaining < self.target {
            self.record_at(
                StepKind::PruneSum,
                frame,
                format!(
                    "sum {sum} + remaining {remaining} cannot reach target {}",
                    self.target
                ),
            );
            return true;
        }

        if sum > self.ceiling {
            self.record_at(
                StepKind::PruneVal,
                frame,
                format!(
                    "sum {sum} exceeds target {} + tolerance {}",
                    self.target, self.tolerance
                ),
            );
            return true;
        }

        false
    }

    fn record_at(&mut self, kind: StepKind, frame: &Frame, rationale: String) -> u64 {
        self.trace.record(
            kind,
            NodeFacts {
                path: &frame.path,
                selection: &frame.selection,
                sum: frame.sum,
                remaining_value: self.values.remaining_from(frame.path.len()),
            },
            rationale,
        )
    }

    fn accept(&mut self, candidate: SolutionCandidate) {
        let replace = self
            .best
            .and_then(|i| self.candidates.get(i))
            .map_or(true, |best| replaces_best(self.policy, self.target, &candidate, best));
        self.candidates.push(candidate);
        if replace {
            self.best = Some(self.candidates.len() - 1);
        }
    }
}

fn replaces_best(
    policy: BestPolicy,
    target: u64,
    candidate: &SolutionCandidate,
    best: &SolutionCandidate,
) -> bool {
    match policy {
        BestPolicy::LastFound => true,
        BestPolicy::FewestInputs => candidate.input_count() < best.input_count(),
        BestPolicy::LeastExcess => {
            candidate.sum.saturating_sub(target) < best.sum.saturating_sub(target)
        }
    }
}

/// The candidate `policy` designates when `candidates` are discovered in order.
pub(crate) fn designate_best(
    policy: BestPolicy,
    target: u64,
    candidates: &[SolutionCandidate],
) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let replace = best
            .and_then(|i| candidates.get(i))
            .map_or(true, |current| replaces_best(policy, target, candidate, current));
        if replace {
            best = Some(idx);
        }
    }
    best
}
