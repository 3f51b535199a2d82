//! Render a scenario as a JSONL recording.

use crate::errors::ExplorerError;
use crate::replay::recording::{RecordEntry, ScenarioEndRecord, ScenarioStartRecord};
use crate::runtime::FileSystem;
use crate::search::Scenario;
use std::path::Path;

pub fn scenario_records(scenario: &Scenario) -> Vec<RecordEntry> {
    let mut entries = Vec::with_capacity(scenario.trace.len() + scenario.candidates.len() + 2);
    entries.push(RecordEntry::ScenarioStart(ScenarioStartRecord {
        explorer_version: env!("CARGO_PKG_VERSION").to_string(),
        values: scenario.values.clone(),
        target: scenario.target,
        tolerance: scenario.tolerance,
        options: scenario.options,
    }));
    entries.extend(scenario.trace.steps().iter().cloned().map(RecordEntry::Step));
    entries.extend(scenario.candidates.iter().cloned().map(RecordEntry::Candidate));
    entries.push(RecordEntry::ScenarioEnd(ScenarioEndRecord {
        outcome: scenario.outcome,
        best: scenario.best,
        step_count: scenario.trace.len(),
        fingerprint: scenario.trace.fingerprint(),
    }));
    entries
}

pub fn render_jsonl(scenario: &Scenario) -> Result<String, ExplorerError> {
    let mut out = String::new();
    for entry in scenario_records(scenario) {
        let line =
            serde_json::to_string(&entry).map_err(|e| ExplorerError::Recording(e.to_string()))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

pub fn write_scenario(
    fs: &dyn FileSystem,
    path: &Path,
    scenario: &Scenario,
) -> Result<(), ExplorerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs.create_dir_all(parent)?;
    }
    fs.write_string(path, &render_jsonl(scenario)?)
}
