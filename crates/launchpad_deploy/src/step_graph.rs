//! Static step ordering for each deployment variant.
//!
//! Each variant owns its own adjacency table. Tables are never derived from one
//! another, so editing one path cannot change the other.

use serde::{Deserialize, Serialize};

use crate::fields::Variant;

/// One screen of the deployment wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Mode,
    Info,
    Network,
    LeaderConnection,
    Config,
    Ec2,
    Aws,
    Database,
    Deploying,
    Success,
    Error,
}

impl Step {
    /// Stable identifier, as used by the web console.
    pub fn key(self) -> &'static str {
        match self {
            Self::Mode => "mode",
            Self::Info => "info",
            Self::Network => "network",
            Self::LeaderConnection => "leaderConnection",
            Self::Config => "config",
            Self::Ec2 => "ec2",
            Self::Aws => "aws",
            Self::Database => "database",
            Self::Deploying => "deploying",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Mode => "Node Type",
            Self::Info => "Requirements",
            Self::Network => "Network",
            Self::LeaderConnection => "Leader Connection",
            Self::Config => "Node Configuration",
            Self::Ec2 => "EC2 Instance",
            Self::Aws => "AWS Account",
            Self::Database => "Database",
            Self::Deploying => "Deploying",
            Self::Success => "Deployed",
            Self::Error => "Deployment Failed",
        }
    }

    /// Whether the step collects operator input (as opposed to reporting a
    /// submission outcome).
    pub fn is_data_entry(self) -> bool {
        !matches!(self, Self::Deploying | Self::Success | Self::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

struct Edge {
    step: Step,
    prev: Option<Step>,
    next: Option<Step>,
}

const fn edge(step: Step, prev: Option<Step>, next: Option<Step>) -> Edge {
    Edge { step, prev, next }
}

/// The single entry step shared by every variant.
pub const ENTRY_STEP: Step = Step::Mode;
/// The last data-entry step; `submit()` is only accepted here.
pub const FINAL_STEP: Step = Step::Database;

static LEADER_GRAPH: [Edge; 6] = [
    edge(Step::Mode, None, Some(Step::Info)),
    edge(Step::Info, Some(Step::Mode), Some(Step::Network)),
    edge(Step::Network, Some(Step::Info), Some(Step::Config)),
    edge(Step::Config, Some(Step::Network), Some(Step::Aws)),
    edge(Step::Aws, Some(Step::Config), Some(Step::Database)),
    edge(Step::Database, Some(Step::Aws), None),
];

static REGULAR_GRAPH: [Edge; 8] = [
    edge(Step::Mode, None, Some(Step::Info)),
    edge(Step::Info, Some(Step::Mode), Some(Step::Network)),
    edge(Step::Network, Some(Step::Info), Some(Step::LeaderConnection)),
    edge(Step::LeaderConnection, Some(Step::Network), Some(Step::Config)),
    edge(Step::Config, Some(Step::LeaderConnection), Some(Step::Ec2)),
    edge(Step::Ec2, Some(Step::Config), Some(Step::Aws)),
    edge(Step::Aws, Some(Step::Ec2), Some(Step::Database)),
    edge(Step::Database, Some(Step::Aws), None),
];

fn table(variant: Variant) -> &'static [Edge] {
    match variant {
        Variant::Leader => &LEADER_GRAPH,
        Variant::Regular => &REGULAR_GRAPH,
    }
}

/// The step adjacent to `step` in `direction`, or `None` at either end of the
/// graph or when `step` is not part of the variant's data-entry path.
pub fn adjacent(variant: Variant, step: Step, direction: Direction) -> Option<Step> {
    let edge = table(variant).iter().find(|e| e.step == step)?;
    match direction {
        Direction::Forward => edge.next,
        Direction::Backward => edge.prev,
    }
}

pub fn next_step(variant: Variant, step: Step) -> Option<Step> {
    adjacent(variant, step, Direction::Forward)
}

pub fn prev_step(variant: Variant, step: Step) -> Option<Step> {
    adjacent(variant, step, Direction::Backward)
}

/// Data-entry steps of a variant, in order.
pub fn steps(variant: Variant) -> Vec<Step> {
    table(variant).iter().map(|e| e.step).collect()
}

/// Whether `step` may be the current step under `variant`. Submission steps
/// are valid under every variant.
pub fn contains(variant: Variant, step: Step) -> bool {
    !step.is_data_entry() || table(variant).iter().any(|e| e.step == step)
}

/// Zero-based index for a stepper component. Submission steps map past the end.
pub fn position(variant: Variant, step: Step) -> Option<usize> {
    let table = table(variant);
    if step.is_data_entry() {
        table.iter().position(|e| e.step == step)
    } else {
        Some(table.len())
    }
}
