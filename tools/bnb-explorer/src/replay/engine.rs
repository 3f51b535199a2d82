use crate::errors::ExplorerError;
use crate::path::DecisionPath;
use crate::replay::tree::{NodeArena, TreeEdge, TreeNode};
use crate::search::Scenario;
use crate::trace::Step;
use crate::types::{Lineage, NodeStatus, StepKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplayOptions {
    /// Also project nodes the trace reaches after the cursor, as `pending`.
    pub include_pending: bool,
}

/// The tree implied by steps `0..=cursor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub cursor: usize,
    pub step: Step,
    pub nodes: Vec<TreeNode>,
    pub edges: Vec<TreeEdge>,
}

impl ReplayFrame {
    pub fn node(&self, path: &DecisionPath) -> Option<&TreeNode> {
        self.nodes.iter().find(|n| &n.path == path)
    }

    pub fn status_of(&self, path: &DecisionPath) -> Option<NodeStatus> {
        self.node(path).map(|n| n.status)
    }

    pub fn cursor_node(&self) -> Option<&TreeNode> {
        self.nodes.iter().find(|n| n.is_cursor)
    }

    pub fn count_status(&self, status: NodeStatus) -> usize {
        self.nodes.iter().filter(|n| n.status == status).count()
    }
}

/// Read-only projection over a frozen scenario. Safe to share across threads.
#[derive(Debug, Clone, Copy)]
pub struct ReplayEngine<'a> {
    scenario: &'a Scenario,
    options: ReplayOptions,
}

impl<'a> ReplayEngine<'a> {
    pub fn new(scenario: &'a Scenario) -> Result<Self, ExplorerError> {
        Self::with_options(scenario, ReplayOptions::default())
    }

    pub fn with_options(
        scenario: &'a Scenario,
        options: ReplayOptions,
    ) -> Result<Self, ExplorerError> {
        scenario.trace.validate_shape()?;
        Ok(Self { scenario, options })
    }

    pub fn scenario(&self) -> &'a Scenario {
        self.scenario
    }

    /// Number of steps; valid cursors are `0..len()`.
    pub fn len(&self) -> usize {
        self.scenario.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenario.trace.is_empty()
    }

    pub fn check_cursor(&self, cursor: usize) -> Result<(), ExplorerError> {
        if cursor >= self.len() {
            return Err(ExplorerError::CursorOutOfRange {
                cursor,
                len: self.len(),
            });
        }
        Ok(())
    }

    pub fn clamp_cursor(&self, cursor: usize) -> usize {
        cursor.min(self.len().saturating_sub(1))
    }

    pub fn frame(&self, cursor: usize) -> Result<ReplayFrame, ExplorerError> {
        self.check_cursor(cursor)?;
        Ok(self.build_frame(cursor))
    }

    pub fn frame_clamped(&self, cursor: usize) -> ReplayFrame {
        self.build_frame(self.clamp_cursor(cursor))
    }

    /// Whether `path` leads to the best solution, to a candidate already
    /// recorded at `cursor`, or to neither.
    pub fn classify_lineage(&self, path: &DecisionPath, cursor: usize) -> Lineage {
        if self
            .scenario
            .best_path()
            .is_some_and(|best| path.is_prefix_of(best))
        {
            return Lineage::Best;
        }
        let visible = self
            .scenario
            .candidates
            .iter()
            .filter(|c| c.step_id as usize <= cursor)
            .any(|c| path.is_prefix_of(&c.path));
        if visible {
            Lineage::Candidate
        } else {
            Lineage::None
        }
    }

    fn build_frame(&self, cursor: usize) -> ReplayFrame {
        let steps = self.scenario.trace.steps();
        let mut arena = NodeArena::default();

        for step in &steps[..=cursor] {
            let slot = arena.materialize(&step.path, NodeStatus::Visited);
            let node = arena.node_mut(slot);
            node.last_kind = Some(step.kind);
            match step.kind {
                kind if kind.is_prune() => node.status = NodeStatus::Pruned,
                StepKind::Solution => node.status = NodeStatus::Solution,
                _ => {}
            }
        }

        let current = &steps[cursor];
        if current.kind != StepKind::Complete {
            let slot = arena.materialize(&current.path, NodeStatus::Visited);
            let node = arena.node_mut(slot);
            node.is_cursor = true;
            if !node.status.is_terminal() {
                node.status = NodeStatus::Active;
            }
        }

        if self.options.include_pending {
            for step in &steps[cursor + 1..] {
                arena.materialize(&step.path, NodeStatus::Pending);
            }
        }

        for node in arena.nodes_mut() {
            node.lineage = self.classify_lineage(&node.path, cursor);
        }

        let (nodes, edges) = arena.into_parts();
        ReplayFrame {
            cursor,
            step: current.clone(),
            nodes,
            edges,
        }
    }
}

/// Project `scenario` at `cursor`, rejecting out-of-range cursors.
pub fn replay(scenario: &Scenario, cursor: usize) -> Result<ReplayFrame, ExplorerError> {
    ReplayEngine::new(scenario)?.frame(cursor)
}

#[cfg(test)]
mod tests {
    use super::{replay, ReplayEngine, ReplayOptions};
    use crate::errors::ExplorerError;
    use crate::path::DecisionPath;
    use crate::search::search;
    use crate::types::{Lineage, NodeStatus, StepKind};

    fn p(key: &str) -> DecisionPath {
        DecisionPath::from_key(key).expect("key")
    }

    #[test]
    fn first_frame_shows_only_the_active_root() {
        let scenario = search(&[60, 50, 25], 110, 0).expect("search");
        let frame = replay(&scenario, 0).expect("frame");
        assert_eq!(frame.step.kind, StepKind::Start);
        assert_eq!(frame.nodes.len(), 1);
        assert_eq!(frame.status_of(&p("")), Some(NodeStatus::Active));
        assert!(frame.edges.is_empty());
    }

    #[test]
    fn cursor_node_is_active_and_ancestors_visited() {
        let scenario = search(&[60, 50, 25], 110, 0).expect("search");
        // START, INCLUDE 1, INCLUDE 11
        let frame = replay(&scenario, 2).expect("frame");
        assert_eq!(frame.status_of(&p("11")), Some(NodeStatus::Active));
        assert_eq!(frame.status_of(&p("1")), Some(NodeStatus::Visited));
        assert_eq!(frame.status_of(&p("")), Some(NodeStatus::Visited));
        assert_eq!(frame.cursor_node().map(|n| n.key.as_str()), Some("11"));
        assert_eq!(frame.edges.len(), 2);
    }

    #[test]
    fn terminal_statuses_persist_as_cursor_advances() {
        let scenario = search(&[60, 50, 25], 110, 0).expect("search");
        let engine = ReplayEngine::new(&scenario).expect("engine");
        let solution_at = scenario.candidates[0].step_id as usize;

        let at_solution = engine.frame(solution_at).expect("frame");
        assert_eq!(at_solution.status_of(&p("11")), Some(NodeStatus::Solution));
        assert!(at_solution.node(&p("11")).is_some_and(|n| n.is_cursor));

        let last = engine.frame(engine.len() - 1).expect("frame");
        assert_eq!(last.status_of(&p("11")), Some(NodeStatus::Solution));
        assert_eq!(last.status_of(&p("10")), Some(NodeStatus::Pruned));
        assert_eq!(last.status_of(&p("0")), Some(NodeStatus::Pruned));
        assert!(last.cursor_node().is_none());
        assert_eq!(last.count_status(NodeStatus::Active), 0);
    }

    #[test]
    fn lineage_prefers_best_then_visible_candidates() {
        let scenario = search(&[3, 2, 1], 3, 0).expect("search");
        let engine = ReplayEngine::new(&scenario).expect("engine");
        // Candidates: "1" (first) and "011" (last found, best).
        let first = scenario.candidates[0].step_id as usize;
        assert_eq!(engine.classify_lineage(&p("0"), 0), Lineage::Best);
        assert_eq!(engine.classify_lineage(&p("011"), 0), Lineage::Best);
        assert_eq!(engine.classify_lineage(&p(""), 0), Lineage::Best);
        assert_eq!(engine.classify_lineage(&p("1"), first - 1), Lineage::None);
        assert_eq!(engine.classify_lineage(&p("1"), first), Lineage::Candidate);
        assert_eq!(engine.classify_lineage(&p("00"), engine.len() - 1), Lineage::None);
        // Longer than the best path cannot be on its lineage.
        assert_eq!(engine.classify_lineage(&p("0110"), 0), Lineage::None);
    }

    #[test]
    fn out_of_range_cursor_is_rejected_or_clamped() {
        let scenario = search(&[100], 100, 0).expect("search");
        let engine = ReplayEngine::new(&scenario).expect("engine");
        let len = engine.len();
        match engine.frame(len) {
            Err(ExplorerError::CursorOutOfRange { cursor, len: got }) => {
                assert_eq!(cursor, len);
                assert_eq!(got, len);
            }
            other => panic!("expected cursor error, got {other:?}"),
        }
        let clamped = engine.frame_clamped(len + 10);
        assert_eq!(clamped.cursor, len - 1);
        assert_eq!(clamped.step.kind, StepKind::Complete);
    }

    #[test]
    fn pending_nodes_cover_the_rest_of_the_trace() {
        let scenario = search(&[60, 50, 25], 110, 0).expect("search");
        let engine = ReplayEngine::with_options(
            &scenario,
            ReplayOptions {
                include_pending: true,
            },
        )
        .expect("engine");
        let frame = engine.frame(1).expect("frame");
        assert_eq!(frame.status_of(&p("1")), Some(NodeStatus::Active));
        assert_eq!(frame.status_of(&p("11")), Some(NodeStatus::Pending));
        assert_eq!(frame.status_of(&p("0")), Some(NodeStatus::Pending));

        let full = engine.frame(engine.len() - 1).expect("frame");
        assert_eq!(full.nodes.len(), frame.nodes.len());
        assert_eq!(full.count_status(NodeStatus::Pending), 0);
    }

    #[test]
    fn engine_rejects_malformed_traces() {
        let mut scenario = search(&[100], 100, 0).expect("search");
        let steps = scenario.trace.steps()[..2].to_vec();
        assert!(crate::trace::Trace::from_steps(steps).is_err());
        scenario.trace = crate::trace::Trace::default();
        assert!(matches!(
            ReplayEngine::new(&scenario),
            Err(ExplorerError::MalformedTrace(_))
        ));
    }
}
