//! Manual reconciliation over the records the automatic stages left behind.
//!
//! The session owns both record sets, the two pending pools and every match
//! produced so far. The only mutation is [`ReconSession::propose_match`],
//! applied one proposal at a time; once [`ReconSession::close`] runs (the
//! merge assembler does this) nothing changes any more.

use serde::Serialize;

use crate::config::FieldConfig;
use crate::matcher::left_key;
use crate::model::{LeftId, Match, MatchStage, Record, RightId, TentativeMatch};
use crate::normalize::shares_word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Open,
    Closed,
}

/// Why a manual proposal changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The two names have no word in common.
    NoSharedWord,
    LeftNotPending,
    RightNotPending,
    SessionClosed,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSharedWord => write!(f, "names share no word"),
            Self::LeftNotPending => write!(f, "left record is not pending"),
            Self::RightNotPending => write!(f, "right record is not pending"),
            Self::SessionClosed => write!(f, "session is closed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalOutcome {
    Accepted(Match),
    Rejected(Rejection),
}

impl ProposalOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

#[derive(Debug, Clone)]
pub struct ReconSession {
    fields: FieldConfig,
    left: Vec<Record>,
    right: Vec<Record>,
    exact: Vec<Match>,
    tentative: Vec<TentativeMatch>,
    manual: Vec<Match>,
    pending_left: Vec<LeftId>,
    pending_right: Vec<RightId>,
    state: SessionState,
}

impl ReconSession {
    /// Build a session from the automatic stages' results. Pools are taken
    /// as given (already in display order).
    pub(crate) fn new(
        fields: FieldConfig,
        left: Vec<Record>,
        right: Vec<Record>,
        exact: Vec<Match>,
        tentative: Vec<TentativeMatch>,
        pending_left: Vec<LeftId>,
        pending_right: Vec<RightId>,
    ) -> Self {
        Self {
            fields,
            left,
            right,
            exact,
            tentative,
            manual: Vec::new(),
            pending_left,
            pending_right,
            state: SessionState::Open,
        }
    }

    pub fn fields(&self) -> &FieldConfig {
        &self.fields
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn left_records(&self) -> &[Record] {
        &self.left
    }

    pub fn right_records(&self) -> &[Record] {
        &self.right
    }

    pub fn left_record(&self, id: LeftId) -> Option<&Record> {
        self.left.get(id.0)
    }

    pub fn right_record(&self, id: RightId) -> Option<&Record> {
        self.right.get(id.0)
    }

    pub fn left_name(&self, id: LeftId) -> Option<&str> {
        self.left_record(id).and_then(|r| r.get(&self.fields.left_name))
    }

    pub fn right_name(&self, id: RightId) -> Option<&str> {
        self.right_record(id).and_then(|r| r.get(&self.fields.right_name))
    }

    pub fn pending_left_ids(&self) -> &[LeftId] {
        &self.pending_left
    }

    pub fn pending_right_ids(&self) -> &[RightId] {
        &self.pending_right
    }

    pub fn pending_left(&self) -> impl Iterator<Item = (LeftId, &Record)> + '_ {
        self.pending_left
            .iter()
            .filter_map(|id| self.left.get(id.0).map(|r| (*id, r)))
    }

    pub fn pending_right(&self) -> impl Iterator<Item = (RightId, &Record)> + '_ {
        self.pending_right
            .iter()
            .filter_map(|id| self.right.get(id.0).map(|r| (*id, r)))
    }

    pub fn exact_matches(&self) -> &[Match] {
        &self.exact
    }

    pub fn tentative_matches(&self) -> &[TentativeMatch] {
        &self.tentative
    }

    pub fn manual_matches(&self) -> &[Match] {
        &self.manual
    }

    /// Every match with its key resolved, in stage order (exact, fuzzy,
    /// manual).
    pub fn resolved_matches(&self) -> Vec<Match> {
        let fuzzy = self
            .tentative
            .iter()
            .filter_map(|t| {
                let record = self.left.get(t.left.0)?;
                Some(t.resolve(left_key(record, &self.fields)))
            });
        self.exact
            .iter()
            .cloned()
            .chain(fuzzy)
            .chain(self.manual.iter().cloned())
            .collect()
    }

    /// Whether a proposal would be accepted right now. Does not mutate.
    pub fn can_match(&self, left: LeftId, right: RightId) -> Result<(), Rejection> {
        if !self.is_open() {
            return Err(Rejection::SessionClosed);
        }
        if !self.pending_left.contains(&left) {
            return Err(Rejection::LeftNotPending);
        }
        if !self.pending_right.contains(&right) {
            return Err(Rejection::RightNotPending);
        }
        match (self.left_name(left), self.right_name(right)) {
            (Some(l), Some(r)) if shares_word(l, r) => Ok(()),
            _ => Err(Rejection::NoSharedWord),
        }
    }

    /// Pair a pending Left record with a pending Right record.
    ///
    /// A rejected proposal is a no-op: pools and matches are untouched.
    pub fn propose_match(&mut self, left: LeftId, right: RightId) -> ProposalOutcome {
        if let Err(reason) = self.can_match(left, right) {
            log::warn!("manual: left #{} / right #{} rejected: {reason}", left.0, right.0);
            return ProposalOutcome::Rejected(reason);
        }

        self.pending_left.retain(|id| *id != left);
        self.pending_right.retain(|id| *id != right);

        let m = Match {
            left,
            right,
            key: left_key(&self.left[left.0], &self.fields),
            stage: MatchStage::Manual,
        };
        log::debug!("manual: left #{} -> right #{} (key '{}')", left.0, right.0, m.key);
        self.manual.push(m.clone());
        ProposalOutcome::Accepted(m)
    }

    /// End the session. Later proposals are rejected.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> FieldConfig {
        FieldConfig {
            left_key: "key".into(),
            left_id: "id".into(),
            left_name: "name".into(),
            right_id: "id".into(),
            right_name: "name".into(),
            output_key: None,
        }
    }

    fn session(left_names: &[&str], right_names: &[&str]) -> ReconSession {
        let left: Vec<Record> = left_names
            .iter()
            .enumerate()
            .map(|(i, n)| Record::new().with_field("name", *n).with_field("key", format!("K{i}")))
            .collect();
        let right: Vec<Record> = right_names
            .iter()
            .map(|n| Record::new().with_field("name", *n))
            .collect();
        let pending_left = (0..left.len()).map(LeftId).collect();
        let pending_right = (0..right.len()).map(RightId).collect();
        ReconSession::new(fields(), left, right, vec![], vec![], pending_left, pending_right)
    }

    #[test]
    fn shared_word_accepted() {
        let mut s = session(&["David Levi"], &["Levi Sons"]);
        let outcome = s.propose_match(LeftId(0), RightId(0));
        match outcome {
            ProposalOutcome::Accepted(m) => {
                assert_eq!(m.key, "K0");
                assert_eq!(m.stage, MatchStage::Manual);
            }
            other => panic!("expected accept, got {other:?}"),
        }
        assert!(s.pending_left_ids().is_empty());
        assert!(s.pending_right_ids().is_empty());
        assert_eq!(s.manual_matches().len(), 1);
    }

    #[test]
    fn no_shared_word_is_noop() {
        let mut s = session(&["David Levi"], &["Cohen Inc"]);
        let before = (s.pending_left_ids().len(), s.pending_right_ids().len());
        let outcome = s.propose_match(LeftId(0), RightId(0));
        assert_eq!(outcome, ProposalOutcome::Rejected(Rejection::NoSharedWord));
        assert_eq!((s.pending_left_ids().len(), s.pending_right_ids().len()), before);
        assert!(s.manual_matches().is_empty());
    }

    #[test]
    fn removal_is_by_handle_not_value() {
        // Two Left records with identical names; only the proposed one leaves.
        let mut s = session(&["Levi", "Levi"], &["Levi Sons"]);
        assert!(s.propose_match(LeftId(1), RightId(0)).is_accepted());
        assert_eq!(s.pending_left_ids(), &[LeftId(0)]);
    }

    #[test]
    fn matched_records_cannot_match_again() {
        let mut s = session(&["Levi", "Levi Bros"], &["Levi Sons", "Levi Ltd"]);
        assert!(s.propose_match(LeftId(0), RightId(0)).is_accepted());
        assert_eq!(
            s.propose_match(LeftId(1), RightId(0)),
            ProposalOutcome::Rejected(Rejection::RightNotPending)
        );
        assert_eq!(
            s.propose_match(LeftId(0), RightId(1)),
            ProposalOutcome::Rejected(Rejection::LeftNotPending)
        );
        assert!(s.propose_match(LeftId(1), RightId(1)).is_accepted());
    }

    #[test]
    fn out_of_range_handles_rejected() {
        let mut s = session(&["Levi"], &["Levi"]);
        assert_eq!(
            s.propose_match(LeftId(7), RightId(0)),
            ProposalOutcome::Rejected(Rejection::LeftNotPending)
        );
        assert_eq!(
            s.propose_match(LeftId(0), RightId(7)),
            ProposalOutcome::Rejected(Rejection::RightNotPending)
        );
    }

    #[test]
    fn missing_name_rejected() {
        let mut s = session(&["Levi"], &["Levi"]);
        s.right[0] = Record::new().with_field("id", "1");
        assert_eq!(s.can_match(LeftId(0), RightId(0)), Err(Rejection::NoSharedWord));
    }

    #[test]
    fn closed_session_rejects() {
        let mut s = session(&["Levi"], &["Levi"]);
        s.close();
        assert_eq!(
            s.propose_match(LeftId(0), RightId(0)),
            ProposalOutcome::Rejected(Rejection::SessionClosed)
        );
        assert_eq!(s.pending_left_ids().len(), 1);
    }

    #[test]
    fn resolved_matches_carry_fuzzy_keys() {
        let left = vec![Record::new().with_field("name", "Cohen Store").with_field("key", "K2")];
        let right = vec![Record::new().with_field("name", "Store")];
        let s = ReconSession::new(
            fields(),
            left,
            right,
            vec![],
            vec![TentativeMatch { left: LeftId(0), right: RightId(0) }],
            vec![],
            vec![],
        );
        let all = s.resolved_matches();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].key, "K2");
        assert_eq!(all[0].stage, MatchStage::FuzzyName);
    }

    #[test]
    fn accessors_skip_handles_without_records() {
        let left = vec![Record::new().with_field("name", "Levi").with_field("key", "K0")];
        let right = vec![Record::new().with_field("name", "Levi")];
        let mut s = ReconSession::new(
            fields(),
            left,
            right,
            vec![],
            vec![TentativeMatch { left: LeftId(5), right: RightId(0) }],
            vec![LeftId(0), LeftId(9)],
            vec![RightId(9), RightId(0)],
        );
        let left_ids: Vec<LeftId> = s.pending_left().map(|(id, _)| id).collect();
        let right_ids: Vec<RightId> = s.pending_right().map(|(id, _)| id).collect();
        assert_eq!(left_ids, vec![LeftId(0)]);
        assert_eq!(right_ids, vec![RightId(0)]);
        assert!(s.resolved_matches().is_empty());
        assert_eq!(
            s.propose_match(LeftId(9), RightId(0)),
            ProposalOutcome::Rejected(Rejection::NoSharedWord)
        );
    }
}
