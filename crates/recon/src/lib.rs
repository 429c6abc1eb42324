//! `keybridge-recon`: account-key reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded Left (ledger) and Right (registry)
//! records, pairs them in three stages (exact id, fuzzy name, manual) and
//! assembles the merged output. No CLI or IO dependencies.

pub mod config;
pub mod decisions;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod session;
pub mod summary;

pub use config::ReconConfig;
pub use decisions::{apply_decisions, Decisions, Proposal, ProposalReport};
pub use engine::run;
pub use error::ReconError;
pub use merge::{assemble, MergedOutput};
pub use model::{
    LeftId, Match, MatchStage, OutputSheet, ReconInput, Record, RightId, Side, TentativeMatch,
};
pub use session::{ProposalOutcome, ReconSession, Rejection, SessionState};
pub use summary::{build_report, compute_summary, ReconReport, ReconSummary};
