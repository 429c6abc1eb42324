//! Manual decisions recorded outside the tool and replayed against a session.
//!
//! ```toml
//! [[proposal]]
//! left = 4
//! right = 9
//! ```
//!
//! Handles are 0-based data-row positions in each input set.

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::{LeftId, RightId};
use crate::session::{ProposalOutcome, ReconSession, Rejection};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Decisions {
    #[serde(default, rename = "proposal")]
    pub proposals: Vec<Proposal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub left: LeftId,
    pub right: RightId,
}

/// Outcome of one replayed proposal.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalReport {
    pub left: LeftId,
    pub right: RightId,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl Decisions {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        toml::from_str(input).map_err(|e| ReconError::DecisionsParse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ReconError> {
        toml::to_string_pretty(self).map_err(|e| ReconError::DecisionsParse(e.to_string()))
    }
}

/// Replay proposals in file order. Rejections are reported, never fatal.
pub fn apply_decisions(session: &mut ReconSession, decisions: &Decisions) -> Vec<ProposalReport> {
    decisions
        .proposals
        .iter()
        .map(|p| match session.propose_match(p.left, p.right) {
            ProposalOutcome::Accepted(m) => ProposalReport {
                left: p.left,
                right: p.right,
                accepted: true,
                key: Some(m.key),
                rejection: None,
            },
            ProposalOutcome::Rejected(reason) => ProposalReport {
                left: p.left,
                right: p.right,
                accepted: false,
                key: None,
                rejection: Some(reason),
            },
        })
        .collect()
}
