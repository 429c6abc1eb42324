use std::collections::HashSet;

use proptest::prelude::*;

use keybridge_recon::config::{FieldConfig, ReconConfig};
use keybridge_recon::{
    apply_decisions, assemble, compute_summary, run, Decisions, LeftId, MatchStage, Proposal,
    ReconInput, Record, RightId,
};

fn config() -> ReconConfig {
    let mut config = ReconConfig::default();
    config.fields = FieldConfig {
        left_key: "key".into(),
        left_id: "id".into(),
        left_name: "name".into(),
        right_id: "id".into(),
        right_name: "name".into(),
        output_key: None,
    };
    config
}

fn rec(pairs: &[(&str, &str)]) -> Record {
    pairs.iter().copied().collect()
}

// -------------------------------------------------------------------------
// Scenarios
// -------------------------------------------------------------------------

#[test]
fn full_pipeline_ledger_to_registry() {
    let input = ReconInput {
        left: vec![
            rec(&[("id", "123-45"), ("name", "A B"), ("key", "K1")]),
            rec(&[("name", "Cohen Store"), ("key", "K2")]),
            rec(&[("name", "David Levi"), ("key", "K3")]),
            rec(&[("name", "Nobody Here"), ("key", "K4")]),
        ],
        right: vec![
            rec(&[("id", "12345"), ("name", "A B")]),
            rec(&[("name", "Store")]),
            rec(&[("name", "Levi Sons")]),
            rec(&[("name", "Cohen Inc")]),
        ],
    };

    let mut session = run(&config(), input).unwrap();
    assert_eq!(session.exact_matches().len(), 1);
    assert_eq!(session.tentative_matches().len(), 1);

    let decisions = Decisions {
        proposals: vec![
            Proposal { left: LeftId(2), right: RightId(3) }, // "David Levi" / "Cohen Inc"
            Proposal { left: LeftId(2), right: RightId(2) }, // "David Levi" / "Levi Sons"
        ],
    };
    let reports = apply_decisions(&mut session, &decisions);
    assert!(!reports[0].accepted);
    assert!(reports[1].accepted);

    let summary = compute_summary(&session);
    assert_eq!(summary.exact_matched, 1);
    assert_eq!(summary.fuzzy_matched, 1);
    assert_eq!(summary.manual_matched, 1);
    assert_eq!(summary.left_unmatched, 1);
    assert_eq!(summary.right_unmatched, 1);
    assert!(summary.partition_ok);

    let out = assemble(&mut session);
    assert_eq!(out.merged.len(), 4 + 1);
    let keys: Vec<_> = out.merged[..4].iter().map(|r| r.get("key").unwrap()).collect();
    assert_eq!(keys, vec!["K1", "K2", "K3", ""]);
    assert_eq!(out.merged[4].get("name"), Some("Nobody Here"));
    assert_eq!(out.merged[4].get("key"), Some("K4"));

    let stages: Vec<_> = out.matches.iter().map(|m| m.stage).collect();
    assert_eq!(stages, vec![MatchStage::ExactKey, MatchStage::FuzzyName, MatchStage::Manual]);
}

#[test]
fn hebrew_default_columns() {
    let config = ReconConfig::default();
    let f = &config.fields;
    let (lid, lname, lkey) = (f.left_id.as_str(), f.left_name.as_str(), f.left_key.as_str());
    let (rid, rname) = (f.right_id.as_str(), f.right_name.as_str());
    let input = ReconInput {
        left: vec![
            rec(&[(lid, "51-234567-8"), (lname, "כהן ובניו"), (lkey, "1001")]),
            rec(&[(lname, "מכולת השכונה"), (lkey, "1002")]),
        ],
        right: vec![
            rec(&[(rid, "512345678"), (rname, "כהן ובניו בע\"מ")]),
            rec(&[(rname, "השכונה")]),
        ],
    };
    let mut session = run(&config, input).unwrap();
    let out = assemble(&mut session);
    assert_eq!(out.merged[0].get(f.output_key()), Some("1001"));
    assert_eq!(out.merged[1].get(f.output_key()), Some("1002"));
    assert!(out.unmatched_left.is_empty());
}

#[test]
fn rejected_proposals_leave_pools_unchanged() {
    let input = ReconInput {
        left: vec![rec(&[("name", "David Levi"), ("key", "K3")])],
        right: vec![rec(&[("name", "Cohen Inc")])],
    };
    let mut session = run(&config(), input).unwrap();
    let before_left = session.pending_left_ids().to_vec();
    let before_right = session.pending_right_ids().to_vec();

    assert!(!session.propose_match(LeftId(0), RightId(0)).is_accepted());

    assert_eq!(session.pending_left_ids(), before_left.as_slice());
    assert_eq!(session.pending_right_ids(), before_right.as_slice());
}

// -------------------------------------------------------------------------
// Properties
// -------------------------------------------------------------------------

const NAMES: [&str; 8] = ["Store", "Cohen Store", "Levi", "David Levi", "Levi Sons", "Market", "A B", ""];
const IDS: [&str; 5] = ["1", "1-0", "2", "3.", ""];

/// (name index, id index) into the pools above.
fn arb_record() -> impl Strategy<Value = (usize, usize)> {
    (0..NAMES.len(), 0..IDS.len())
}

fn build(records: &[(usize, usize)], with_key: bool) -> Vec<Record> {
    records
        .iter()
        .enumerate()
        .map(|(i, (n, id))| {
            let mut r = Record::new();
            if !NAMES[*n].is_empty() {
                r.set("name", NAMES[*n]);
            }
            if !IDS[*id].is_empty() {
                r.set("id", IDS[*id]);
            }
            if with_key {
                r.set("key", format!("K{i}"));
            }
            r
        })
        .collect()
}

proptest! {
    #[test]
    fn every_record_accounted_for_once(
        left in prop::collection::vec(arb_record(), 1..12),
        right in prop::collection::vec(arb_record(), 1..12),
        proposals in prop::collection::vec((0usize..14, 0usize..14), 0..10),
    ) {
        let input = ReconInput { left: build(&left, true), right: build(&right, false) };
        let left_total = input.left.len();
        let right_total = input.right.len();

        let mut session = run(&config(), input).unwrap();
        let decisions = Decisions {
            proposals: proposals
                .iter()
                .map(|(l, r)| Proposal { left: LeftId(*l), right: RightId(*r) })
                .collect(),
        };
        apply_decisions(&mut session, &decisions);

        let summary = compute_summary(&session);
        prop_assert!(summary.partition_ok);
        prop_assert_eq!(
            summary.exact_matched + summary.fuzzy_matched + summary.manual_matched + summary.left_unmatched,
            left_total
        );

        let out = assemble(&mut session);
        prop_assert_eq!(out.merged.len(), right_total + out.unmatched_left.len());

        let rights: HashSet<RightId> = out.matches.iter().map(|m| m.right).collect();
        prop_assert_eq!(rights.len(), out.matches.len());
        let lefts: HashSet<LeftId> = out.matches.iter().map(|m| m.left).collect();
        prop_assert_eq!(lefts.len(), out.matches.len());

        for m in &out.matches {
            prop_assert_eq!(out.merged[m.right.0].get("key"), Some(m.key.as_str()));
        }
    }
}
