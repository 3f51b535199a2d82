//! Trace replay: rebuild the decision tree implied by a prefix of a trace.
//!
//! # Overview
//!
//! A [`Scenario`](crate::search::Scenario) carries a frozen trace. Replay
//! never re-runs the search; it projects steps `0..=cursor` onto a tree:
//! 1. **engine** – `ReplayEngine` builds one `ReplayFrame` per cursor and
//!    answers lineage queries (best / candidate / none)
//! 2. **tree** – the node/edge arena a frame is made of
//! 3. **stepper** – a single-threaded cursor over an engine
//! 4. **recording / recorder / replayer** – JSONL export of a scenario and
//!    loading it back for replay in another process

pub mod engine;
pub mod recorder;
pub mod recording;
pub mod replayer;
pub mod stepper;
pub mod tree;

pub use engine::{replay, ReplayEngine, ReplayFrame, ReplayOptions};
pub use stepper::Stepper;
pub use tree::{TreeEdge, TreeNode};
