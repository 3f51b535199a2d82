//! Plain-text views of a scenario and of a replay frame.

use crate::replay::ReplayFrame;
use crate::search::Scenario;
use crate::trace::Step;

pub fn scenario_summary(scenario: &Scenario) -> Vec<String> {
    let mut lines = vec![
        format!(
            "values={:?} target={} tolerance={}",
            scenario.values.amounts(),
            scenario.target,
            scenario.tolerance
        ),
        format!(
            "outcome={} steps={} candidates={} policy={}",
            scenario.outcome.as_str(),
            scenario.trace.len(),
            scenario.candidates.len(),
            scenario.options.best_policy.as_str()
        ),
    ];
    match (scenario.best_candidate(), scenario.best_original_indices()) {
        (Some(best), Some(inputs)) => lines.push(format!(
            "best path={} sum={} selection={:?} inputs={inputs:?}",
            best.path,
            best.sum,
            best.path.included_indices()
        )),
        _ => lines.push("best none".to_string()),
    }
    lines.push(format!("fingerprint={}", scenario.trace.fingerprint()));
    lines
}

pub fn step_line(step: &Step) -> String {
    format!(
        "#{:<4} {:<9} depth={} path={} sum={} remaining={}  {}",
        step.id,
        step.kind.as_str(),
        step.depth,
        step.path,
        step.sum,
        step.remaining_value,
        step.rationale
    )
}

pub fn trace_lines(scenario: &Scenario) -> Vec<String> {
    scenario.trace.steps().iter().map(step_line).collect()
}

pub fn frame_lines(frame: &ReplayFrame) -> Vec<String> {
    let mut lines = vec![format!(
        "cursor={} nodes={} edges={}",
        frame.cursor,
        frame.nodes.len(),
        frame.edges.len()
    )];
    lines.push(step_line(&frame.step));
    for node in &frame.nodes {
        let marker = if node.is_cursor { " *" } else { "" };
        lines.push(format!(
            "  {:<12} {:<8} lineage={:<9} last={}{marker}",
            node.path.to_string(),
            node.status.as_str(),
            node.lineage.as_str(),
            node.last_kind.map(|k| k.as_str()).unwrap_or("-")
        ));
    }
    lines
}
