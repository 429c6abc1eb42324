use std::collections::HashSet;

use serde::Serialize;

use crate::decisions::ProposalReport;
use crate::merge::MergedOutput;
use crate::model::{LeftId, MatchStage, RightId};
use crate::session::ReconSession;

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub left_total: usize,
    pub right_total: usize,
    pub exact_matched: usize,
    pub fuzzy_matched: usize,
    pub manual_matched: usize,
    pub left_unmatched: usize,
    pub right_unmatched: usize,
    /// Every Left record sits in exactly one of exact, fuzzy, manual or
    /// unmatched, and no Right record is matched twice.
    pub partition_ok: bool,
}

/// Compute stage counts and check the partition invariant.
pub fn compute_summary(session: &ReconSession) -> ReconSummary {
    let left_total = session.left_records().len();
    let right_total = session.right_records().len();

    let mut seen_left: HashSet<LeftId> = HashSet::new();
    let mut seen_right: HashSet<RightId> = HashSet::new();
    let mut partition_ok = true;

    let matched_pairs = session
        .exact_matches()
        .iter()
        .map(|m| (m.left, m.right))
        .chain(session.tentative_matches().iter().map(|t| (t.left, t.right)))
        .chain(session.manual_matches().iter().map(|m| (m.left, m.right)));
    for (l, r) in matched_pairs {
        partition_ok &= seen_left.insert(l);
        partition_ok &= seen_right.insert(r);
    }
    for id in session.pending_left_ids() {
        partition_ok &= seen_left.insert(*id);
    }
    partition_ok &= seen_left.len() == left_total;
    partition_ok &= session
        .pending_right_ids()
        .iter()
        .all(|id| !seen_right.contains(id));

    ReconSummary {
        left_total,
        right_total,
        exact_matched: session.exact_matches().len(),
        fuzzy_matched: session.tentative_matches().len(),
        manual_matched: session.manual_matches().len(),
        left_unmatched: session.pending_left_ids().len(),
        right_unmatched: right_total.saturating_sub(seen_right.len()),
        partition_ok,
    }
}

// ---------------------------------------------------------------------------
// Report (JSON output)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

/// One match as shown to people: handles plus both names.
#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    pub stage: MatchStage,
    pub left: LeftId,
    pub right: RightId,
    pub key: String,
    pub left_name: Option<String>,
    pub right_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub output_rows: usize,
    pub matches: Vec<MatchView>,
    pub decisions: Vec<ProposalReport>,
}

pub fn build_report(
    config_name: &str,
    session: &ReconSession,
    output: &MergedOutput,
    decisions: Vec<ProposalReport>,
) -> ReconReport {
    let matches = output
        .matches
        .iter()
        .map(|m| MatchView {
            stage: m.stage,
            left: m.left,
            right: m.right,
            key: m.key.clone(),
            left_name: session.left_name(m.left).map(str::to_string),
            right_name: session.right_name(m.right).map(str::to_string),
        })
        .collect();

    ReconReport {
        meta: ReconMeta {
            config_name: config_name.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary: compute_summary(session),
        output_rows: output.merged.len(),
        matches,
        decisions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::merge::assemble;
    use crate::model::{Match, Record, TentativeMatch};

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

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new().with_field("name", format!("n{i}")).with_field("key", format!("K{i}")))
            .collect()
    }

    #[test]
    fn counts_per_stage() {
        let session = ReconSession::new(
            fields(),
            records(3),
            records(4),
            vec![Match { left: LeftId(0), right: RightId(2), key: "K0".into(), stage: MatchStage::ExactKey }],
            vec![TentativeMatch { left: LeftId(1), right: RightId(0) }],
            vec![LeftId(2)],
            vec![RightId(1), RightId(3)],
        );
        let s = compute_summary(&session);
        assert_eq!(s.exact_matched, 1);
        assert_eq!(s.fuzzy_matched, 1);
        assert_eq!(s.manual_matched, 0);
        assert_eq!(s.left_unmatched, 1);
        assert_eq!(s.right_unmatched, 2);
        assert!(s.partition_ok);
    }

    #[test]
    fn detects_double_matched_right() {
        let session = ReconSession::new(
            fields(),
            records(2),
            records(1),
            vec![Match { left: LeftId(0), right: RightId(0), key: "K0".into(), stage: MatchStage::ExactKey }],
            vec![TentativeMatch { left: LeftId(1), right: RightId(0) }],
            vec![],
            vec![],
        );
        assert!(!compute_summary(&session).partition_ok);
    }

    #[test]
    fn detects_lost_left_record() {
        let session = ReconSession::new(fields(), records(2), records(1), vec![], vec![], vec![LeftId(0)], vec![RightId(0)]);
        assert!(!compute_summary(&session).partition_ok);
    }

    #[test]
    fn report_lists_matches_with_names() {
        let mut session = ReconSession::new(
            fields(),
            records(1),
            records(1),
            vec![],
            vec![TentativeMatch { left: LeftId(0), right: RightId(0) }],
            vec![],
            vec![],
        );
        let output = assemble(&mut session);
        let report = build_report("test", &session, &output, vec![]);
        assert_eq!(report.meta.config_name, "test");
        assert_eq!(report.output_rows, 1);
        assert_eq!(report.matches[0].stage, MatchStage::FuzzyName);
        assert_eq!(report.matches[0].left_name.as_deref(), Some("n0"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["matches"][0]["stage"], "fuzzy_name");
        assert_eq!(json["summary"]["partition_ok"], true);
    }
}
