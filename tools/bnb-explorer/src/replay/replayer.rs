//! Load a JSONL recording back into a [`Scenario`] ready for replay.
//!
//! A recording is only accepted when its header, candidates and footer agree
//! with the steps it carries; the fingerprint alone covers the steps.

use crate::errors::ExplorerError;
use crate::replay::recording::{RecordEntry, ScenarioEndRecord, ScenarioStartRecord};
use crate::runtime::FileSystem;
use crate::search::{designate_best, Scenario};
use crate::trace::{SolutionCandidate, Step, Trace};
use crate::types::{SearchOutcome, StepKind};
use std::path::Path;

/// A parsed recording file.
#[derive(Debug, Clone)]
pub struct ScenarioRecording {
    pub header: ScenarioStartRecord,
    pub footer: ScenarioEndRecord,
    pub scenario: Scenario,
}

impl ScenarioRecording {
    /// Load and parse a JSONL recording file.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, ExplorerError> {
        let raw = fs.read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ExplorerError> {
        let mut header: Option<ScenarioStartRecord> = None;
        let mut footer: Option<ScenarioEndRecord> = None;
        let mut steps: Vec<Step> = Vec::new();
        let mut candidates: Vec<SolutionCandidate> = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let entry: RecordEntry = serde_json::from_str(line).map_err(|e| {
                ExplorerError::Recording(format!("recording line {}: {e}", idx + 1))
            })?;
            match entry {
                RecordEntry::ScenarioStart(record) => header = Some(record),
                RecordEntry::Step(step) => steps.push(step),
                RecordEntry::Candidate(candidate) => candidates.push(candidate),
                RecordEntry::ScenarioEnd(record) => footer = Some(record),
            }
        }
        let header = header.ok_or_else(|| {
            ExplorerError::Recording("recording has no ScenarioStart entry".to_string())
        })?;
        let footer = footer.ok_or_else(|| {
            ExplorerError::Recording("recording has no ScenarioEnd entry".to_string())
        })?;

        let trace = Trace::from_steps(steps)?;
        if trace.len() != footer.step_count {
            return Err(ExplorerError::Recording(format!(
                "recording declares {} steps but contains {}",
                footer.step_count,
                trace.len()
            )));
        }
        let fingerprint = trace.fingerprint();
        if fingerprint != footer.fingerprint {
            return Err(ExplorerError::Recording(format!(
                "fingerprint mismatch: recorded {}, recomputed {fingerprint}",
                footer.fingerprint
            )));
        }
        check_steps_against_header(&header, &trace)?;
        check_footer_outcome(&footer, &trace, &candidates)?;
        check_candidates(&trace, &candidates)?;

        let expected_best = designate_best(header.options.best_policy, header.target, &candidates);
        if footer.best != expected_best {
            return Err(ExplorerError::Recording(format!(
                "best candidate {:?} disagrees with {} policy, expected {:?}",
                footer.best,
                header.options.best_policy.as_str(),
                expected_best
            )));
        }

        let scenario = Scenario {
            values: header.values.clone(),
            target: header.target,
            tolerance: header.tolerance,
            options: header.options,
            trace,
            outcome: footer.outcome,
            candidates,
            best: footer.best,
        };
        Ok(Self {
            header,
            footer,
            scenario,
        })
    }
}

/// Every step's selection, sum and remaining value must follow from the
/// recorded values, and every terminal step must agree with the recorded
/// target band.
fn check_steps_against_header(
    header: &ScenarioStartRecord,
    trace: &Trace,
) -> Result<(), ExplorerError> {
    if header.tolerance != header.options.tolerance {
        return Err(ExplorerError::Recording(format!(
            "header tolerance {} disagrees with options tolerance {}",
            header.tolerance, header.options.tolerance
        )));
    }
    let ceiling = header.target.checked_add(header.tolerance).ok_or_else(|| {
        ExplorerError::Recording("header target plus tolerance overflows".to_string())
    })?;
    let entries = header.values.entries();

    for step in trace.steps() {
        let sum = step
            .selection
            .iter()
            .try_fold(0u64, |acc, &idx| {
                let amount = entries.get(idx)?.amount;
                acc.checked_add(amount)
            });
        let consistent = step.depth <= entries.len()
            && sum == Some(step.sum)
            && step.remaining_value == header.values.remaining_from(step.depth);
        if !consistent {
            return Err(ExplorerError::Recording(format!(
                "step {} at {} disagrees with the recorded values",
                step.id, step.path
            )));
        }
        let in_band = (header.target..=ceiling).contains(&step.sum);
        let agrees = match step.kind {
            StepKind::Solution => in_band,
            StepKind::Backtrack => !in_band,
            StepKind::PruneSum => step.sum.saturating_add(step.remaining_value) < header.target,
            StepKind::PruneVal => step.sum > ceiling,
            _ => true,
        };
        if !agrees {
            return Err(ExplorerError::Recording(format!(
                "{} step {} sum {} disagrees with target {} (tolerance {})",
                step.kind.as_str(),
                step.id,
                step.sum,
                header.target,
                header.tolerance
            )));
        }
    }
    Ok(())
}

fn check_footer_outcome(
    footer: &ScenarioEndRecord,
    trace: &Trace,
    candidates: &[SolutionCandidate],
) -> Result<(), ExplorerError> {
    let completed = trace.last().and_then(|step| step.outcome);
    if completed != Some(footer.outcome) {
        return Err(ExplorerError::Recording(format!(
            "footer outcome {} disagrees with COMPLETE outcome {}",
            footer.outcome.as_str(),
            completed.map_or("none", SearchOutcome::as_str)
        )));
    }
    let consistent = match footer.outcome {
        SearchOutcome::Success => !candidates.is_empty(),
        SearchOutcome::Failure => candidates.is_empty(),
        SearchOutcome::Exhausted => true,
    };
    if !consistent {
        return Err(ExplorerError::Recording(format!(
            "outcome {} disagrees with {} recorded candidates",
            footer.outcome.as_str(),
            candidates.len()
        )));
    }
    Ok(())
}

/// Candidates must be exactly the SOLUTION steps, in trace order.
fn check_candidates(trace: &Trace, candidates: &[SolutionCandidate]) -> Result<(), ExplorerError> {
    let solutions = trace
        .steps()
        .iter()
        .filter(|step| step.kind == StepKind::Solution)
        .collect::<Vec<_>>();
    if solutions.len() != candidates.len() {
        return Err(ExplorerError::Recording(format!(
            "recording has {} SOLUTION steps but {} candidates",
            solutions.len(),
            candidates.len()
        )));
    }
    for (step, candidate) in solutions.into_iter().zip(candidates) {
        if candidate.step_id != step.id || candidate.path != step.path || candidate.sum != step.sum
        {
            return Err(ExplorerError::Recording(format!(
                "candidate at {} does not match SOLUTION step {}",
                candidate.path, step.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ScenarioRecording;
    use crate::replay::recorder::{render_jsonl, scenario_records};
    use crate::replay::recording::RecordEntry;
    use crate::runtime::{FakeFileSystem, ProductionFileSystem};
    use crate::search::{search, Scenario};
    use crate::types::{Lineage, SearchOutcome};
    use crate::values::SortedValues;
    use std::path::Path;

    fn join(entries: Vec<RecordEntry>) -> String {
        entries
            .into_iter()
            .map(|entry| serde_json::to_string(&entry).expect("serialize"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn edited(
        scenario: &Scenario,
        edit: impl FnMut(RecordEntry) -> Option<RecordEntry>,
    ) -> String {
        join(scenario_records(scenario).into_iter().filter_map(edit).collect())
    }

    fn two_candidates() -> Scenario {
        let scenario = search(&[3, 2, 1], 3, 0).expect("search");
        assert_eq!(scenario.candidates.len(), 2);
        scenario
    }

    #[test]
    fn parse_restores_the_recorded_scenario() {
        let scenario = search(&[60, 50, 25], 110, 0).expect("search");
        let text = render_jsonl(&scenario).expect("render");
        let recording = ScenarioRecording::parse(&text).expect("parse");
        assert_eq!(recording.scenario, scenario);
        assert_eq!(recording.header.explorer_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn load_requires_scenario_start_entry() {
        let scenario = search(&[100], 100, 0).expect("search");
        let text = edited(&scenario, |e| {
            (!matches!(e, RecordEntry::ScenarioStart(_))).then_some(e)
        });
        let err = ScenarioRecording::parse(&text).expect_err("missing header");
        assert_eq!(
            err.to_string(),
            "recording error: recording has no ScenarioStart entry"
        );
    }

    #[test]
    fn tampered_steps_fail_fingerprint_check() {
        let scenario = search(&[100], 100, 0).expect("search");
        let text = edited(&scenario, |e| match e {
            RecordEntry::Step(mut step) => {
                step.rationale.push('!');
                Some(RecordEntry::Step(step))
            }
            other => Some(other),
        });
        let err = ScenarioRecording::parse(&text).expect_err("tampered");
        assert!(err.to_string().contains("fingerprint mismatch"));
    }

    #[test]
    fn footer_outcome_must_match_the_complete_step() {
        let scenario = two_candidates();
        let text = edited(&scenario, |e| match e {
            RecordEntry::ScenarioEnd(mut end) => {
                end.outcome = SearchOutcome::Failure;
                Some(RecordEntry::ScenarioEnd(end))
            }
            other => Some(other),
        });
        let err = ScenarioRecording::parse(&text).expect_err("outcome");
        assert!(err.to_string().contains("disagrees with COMPLETE outcome success"));
    }

    #[test]
    fn success_without_candidates_is_rejected() {
        let scenario = two_candidates();
        let text = edited(&scenario, |e| {
            (!matches!(e, RecordEntry::Candidate(_))).then_some(e)
        });
        let err = ScenarioRecording::parse(&text).expect_err("no candidates");
        assert!(err.to_string().contains("0 recorded candidates"));
    }

    #[test]
    fn candidates_must_cover_every_solution_step() {
        let scenario = two_candidates();
        let mut seen = 0;
        let text = edited(&scenario, |e| match e {
            RecordEntry::Candidate(_) => {
                seen += 1;
                (seen == 1).then_some(e)
            }
            RecordEntry::ScenarioEnd(mut end) => {
                end.best = Some(0);
                Some(RecordEntry::ScenarioEnd(end))
            }
            other => Some(other),
        });
        let err = ScenarioRecording::parse(&text).expect_err("missing candidate");
        assert!(err.to_string().contains("2 SOLUTION steps but 1 candidates"));
    }

    #[test]
    fn candidate_sums_must_match_their_solution_step() {
        let scenario = two_candidates();
        let text = edited(&scenario, |e| match e {
            RecordEntry::Candidate(mut candidate) => {
                candidate.sum += 1;
                Some(RecordEntry::Candidate(candidate))
            }
            other => Some(other),
        });
        let err = ScenarioRecording::parse(&text).expect_err("sum");
        assert!(err.to_string().contains("does not match SOLUTION step"));
    }

    #[test]
    fn best_index_must_follow_the_recorded_policy() {
        let scenario = two_candidates();
        let text = edited(&scenario, |e| match e {
            RecordEntry::ScenarioEnd(mut end) => {
                end.best = Some(0);
                Some(RecordEntry::ScenarioEnd(end))
            }
            other => Some(other),
        });
        let err = ScenarioRecording::parse(&text).expect_err("best");
        assert!(err
            .to_string()
            .contains("disagrees with last_found policy, expected Some(1)"));
    }

    #[test]
    fn header_target_must_agree_with_terminal_steps() {
        let scenario = two_candidates();
        let text = edited(&scenario, |e| match e {
            RecordEntry::ScenarioStart(mut start) => {
                start.target = 999;
                Some(RecordEntry::ScenarioStart(start))
            }
            other => Some(other),
        });
        let err = ScenarioRecording::parse(&text).expect_err("target");
        assert!(err.to_string().contains("disagrees with target 999"));
    }

    #[test]
    fn header_values_must_reproduce_step_sums() {
        let scenario = two_candidates();
        let text = edited(&scenario, |e| match e {
            RecordEntry::ScenarioStart(mut start) => {
                start.values = SortedValues::new(&[4, 2, 1]).expect("values");
                Some(RecordEntry::ScenarioStart(start))
            }
            other => Some(other),
        });
        let err = ScenarioRecording::parse(&text).expect_err("values");
        assert!(err.to_string().contains("disagrees with the recorded values"));
    }

    #[test]
    fn recording_that_hides_its_solutions_is_rejected() {
        let scenario = two_candidates();
        let text = edited(&scenario, |e| match e {
            RecordEntry::Candidate(_) => None,
            RecordEntry::ScenarioStart(mut start) => {
                start.target = 999;
                Some(RecordEntry::ScenarioStart(start))
            }
            RecordEntry::ScenarioEnd(mut end) => {
                end.outcome = SearchOutcome::Failure;
                end.best = None;
                Some(RecordEntry::ScenarioEnd(end))
            }
            other => Some(other),
        });
        assert!(ScenarioRecording::parse(&text).is_err());

        let intact = ScenarioRecording::parse(&render_jsonl(&scenario).expect("render"))
            .expect("parse")
            .scenario;
        let frame = crate::replay::replay(&intact, intact.trace.len() - 1).expect("frame");
        assert!(frame.nodes.iter().any(|n| n.lineage == Lineage::Best));
    }

    #[test]
    fn garbage_lines_report_their_position() {
        let err = ScenarioRecording::parse("\n{not json}\n").expect_err("garbage");
        assert!(err.to_string().contains("recording line 2"));
    }

    #[test]
    fn load_goes_through_the_file_system() {
        let scenario = search(&[3, 2, 1], 3, 0).expect("search");
        let fs = FakeFileSystem::with_file("/rec.jsonl", render_jsonl(&scenario).expect("render"));
        let recording = ScenarioRecording::load(&fs, Path::new("/rec.jsonl")).expect("load");
        assert_eq!(recording.scenario.best, Some(1));
        let err = ScenarioRecording::load(&fs, Path::new("/missing.jsonl")).expect_err("missing");
        assert!(err.to_string().starts_with("io error"));
    }

    #[test]
    fn load_reads_from_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("scenario.jsonl");
        let scenario = search(&[60, 50, 25], 110, 0).expect("search");
        std::fs::write(&path, render_jsonl(&scenario).expect("render")).expect("write");
        let recording = ScenarioRecording::load(&ProductionFileSystem, &path).expect("load");
        assert_eq!(recording.scenario, scenario);
    }
}
