use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The closed set of events a search can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepKind {
    Start,
    Include,
    Exclude,
    PruneVal,
    PruneSum,
    Solution,
    Backtrack,
    Complete,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Include => "INCLUDE",
            Self::Exclude => "EXCLUDE",
            Self::PruneVal => "PRUNE_VAL",
            Self::PruneSum => "PRUNE_SUM",
            Self::Solution => "SOLUTION",
            Self::Backtrack => "BACKTRACK",
            Self::Complete => "COMPLETE",
        }
    }

    pub fn is_prune(self) -> bool {
        matches!(self, Self::PruneVal | Self::PruneSum)
    }

    pub fn is_branch(self) -> bool {
        matches!(self, Self::Include | Self::Exclude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOutcome {
    Success,
    Failure,
    /// The step cap was reached before the tree was fully explored.
    Exhausted,
}

impl SearchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Exhausted => "exhausted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Pending,
    Visited,
    Active,
    Pruned,
    Solution,
}

impl NodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Visited => "visited",
            Self::Active => "active",
            Self::Pruned => "pruned",
            Self::Solution => "solution",
        }
    }

    /// Pruned and solution classifications never revert once assigned.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Pruned | Self::Solution)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lineage {
    Best,
    Candidate,
    None,
}

impl Lineage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::Candidate => "candidate",
            Self::None => "none",
        }
    }
}

/// Edge direction in the decision tree. Include is the left child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Include,
    Exclude,
}

impl Direction {
    pub fn from_decision(include: bool) -> Self {
        if include {
            Self::Include
        } else {
            Self::Exclude
        }
    }

    pub fn is_left(self) -> bool {
        matches!(self, Self::Include)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BestPolicy {
    /// The most recently discovered candidate wins.
    #[default]
    #[value(alias = "last_found")]
    LastFound,
    /// Fewer included values wins; ties keep the earlier candidate.
    #[value(alias = "fewest_inputs")]
    FewestInputs,
    /// Smaller overshoot of the target wins; ties keep the earlier candidate.
    #[value(alias = "least_excess")]
    LeastExcess,
}

impl BestPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastFound => "last_found",
            Self::FewestInputs => "fewest_inputs",
            Self::LeastExcess => "least_excess",
        }
    }
}
