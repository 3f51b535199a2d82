use crate::errors::ExplorerError;
use crate::replay::engine::{ReplayEngine, ReplayFrame};
use crate::trace::Step;

/// Sequential cursor over a replay. Owns no trace data; each frame is
/// recomputed from the engine.
#[derive(Debug, Clone)]
pub struct Stepper<'a> {
    engine: ReplayEngine<'a>,
    cursor: usize,
}

impl<'a> Stepper<'a> {
    pub fn new(engine: ReplayEngine<'a>) -> Self {
        Self { engine, cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_step(&self) -> Option<&'a Step> {
        self.engine.scenario().trace.get(self.cursor)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor + 1 >= self.engine.len()
    }

    /// Move one step forward; `false` once the last step is reached.
    pub fn advance(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn rewind(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn seek(&mut self, cursor: usize) -> Result<(), ExplorerError> {
        self.engine.check_cursor(cursor)?;
        self.cursor = cursor;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn frame(&self) -> ReplayFrame {
        self.engine.frame_clamped(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::Stepper;
    use crate::replay::engine::ReplayEngine;
    use crate::search::search;
    use crate::types::StepKind;

    #[test]
    fn advances_to_complete_and_stops() {
        let scenario = search(&[100], 100, 0).expect("search");
        let mut stepper = Stepper::new(ReplayEngine::new(&scenario).expect("engine"));
        let mut seen = vec![stepper.current_step().map(|s| s.kind)];
        while stepper.advance() {
            seen.push(stepper.current_step().map(|s| s.kind));
        }
        assert!(stepper.is_finished());
        assert_eq!(seen.len(), scenario.trace.len());
        assert_eq!(seen.last(), Some(&Some(StepKind::Complete)));
        assert!(!stepper.advance());
        assert_eq!(stepper.frame().cursor, scenario.trace.len() - 1);
    }

    #[test]
    fn rewind_seek_and_reset() {
        let scenario = search(&[60, 50, 25], 110, 0).expect("search");
        let mut stepper = Stepper::new(ReplayEngine::new(&scenario).expect("engine"));
        assert!(!stepper.rewind());
        stepper.seek(3).expect("seek");
        assert_eq!(stepper.current_step().map(|s| s.kind), Some(StepKind::Solution));
        assert!(stepper.rewind());
        assert_eq!(stepper.cursor(), 2);
        assert!(stepper.seek(scenario.trace.len()).is_err());
        assert_eq!(stepper.cursor(), 2);
        stepper.reset();
        assert_eq!(stepper.cursor(), 0);
    }
}
