use crate::config::{ReconConfig, Stage};
use crate::error::ReconError;
use crate::matcher::{match_exact_key, match_fuzzy_name, sort_left_by_name, sort_right_by_name};
use crate::model::{ExactMatchOutput, FuzzyMatchOutput, LeftId, ReconInput, RightId};
use crate::session::ReconSession;

/// Run the automatic stages per config and open a session for manual
/// matching over whatever is left.
///
/// Exact-key runs first over all records; fuzzy-name then sees only the Left
/// records exact-key could not place and the Right records it did not
/// consume. Empty record sets are valid input: an empty ledger leaves every
/// registry record without a key.
pub fn run(config: &ReconConfig, input: ReconInput) -> Result<ReconSession, ReconError> {
    config.validate()?;

    let ReconInput { left, right } = input;
    if left.is_empty() || right.is_empty() {
        log::info!("running with {} ledger and {} registry records", left.len(), right.len());
    }
    let fields = &config.fields;

    let exact = if config.matching.enabled(Stage::ExactKey) {
        match_exact_key(&left, &right, fields)
    } else {
        ExactMatchOutput {
            matched: Vec::new(),
            pending_left: (0..left.len()).map(LeftId).collect(),
            available_right: (0..right.len()).map(RightId).collect(),
        }
    };
    log::info!(
        "exact_key: {} matched, {} left pending",
        exact.matched.len(),
        exact.pending_left.len()
    );

    let fuzzy = if config.matching.enabled(Stage::FuzzyName) {
        match_fuzzy_name(&left, &right, &exact.pending_left, &exact.available_right, fields)
    } else {
        let mut pending_left = exact.pending_left.clone();
        sort_left_by_name(&mut pending_left, &left, fields);
        let mut pending_right = exact.available_right.clone();
        sort_right_by_name(&mut pending_right, &right, fields);
        FuzzyMatchOutput {
            tentative: Vec::new(),
            pending_left,
            pending_right,
        }
    };
    log::info!(
        "fuzzy_name: {} tentative, {} left / {} right pending for manual matching",
        fuzzy.tentative.len(),
        fuzzy.pending_left.len(),
        fuzzy.pending_right.len()
    );

    Ok(ReconSession::new(
        fields.clone(),
        left,
        right,
        exact.matched,
        fuzzy.tentative,
        fuzzy.pending_left,
        fuzzy.pending_right,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::model::{MatchStage, Record};

    fn config(stages: Vec<Stage>) -> ReconConfig {
        let mut config = ReconConfig::default();
        config.fields = FieldConfig {
            left_key: "key".into(),
            left_id: "id".into(),
            left_name: "name".into(),
            right_id: "reg".into(),
            right_name: "title".into(),
            output_key: None,
        };
        config.matching.stages = stages;
        config
    }

    fn left(id: &str, name: &str, key: &str) -> Record {
        Record::new()
            .with_field("id", id)
            .with_field("name", name)
            .with_field("key", key)
    }

    fn right(reg: &str, title: &str) -> Record {
        Record::new().with_field("reg", reg).with_field("title", title)
    }

    #[test]
    fn empty_record_sets_run() {
        let cfg = config(vec![Stage::ExactKey, Stage::FuzzyName]);
        let session = run(&cfg, ReconInput { left: vec![], right: vec![right("1", "a")] }).unwrap();
        assert!(session.resolved_matches().is_empty());
        assert!(session.pending_left_ids().is_empty());
        assert_eq!(session.pending_right_ids(), &[RightId(0)]);

        let session = run(&cfg, ReconInput { left: vec![left("1", "a", "k")], right: vec![] }).unwrap();
        assert_eq!(session.pending_left_ids(), &[LeftId(0)]);
        assert!(session.pending_right_ids().is_empty());

        let session = run(&cfg, ReconInput::default()).unwrap();
        assert!(session.pending_left_ids().is_empty());
    }

    #[test]
    fn invalid_config_rejected_before_matching() {
        let mut cfg = config(vec![Stage::ExactKey]);
        cfg.fields.left_key = " ".into();
        let err = run(&cfg, ReconInput::default()).unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }

    #[test]
    fn exact_consumed_right_hidden_from_fuzzy() {
        // Right #0 is taken by id; the second Left record would otherwise
        // fuzzy-match it by name.
        let input = ReconInput {
            left: vec![left("1", "Store", "K1"), left("9", "Store", "K9")],
            right: vec![right("1", "Store"), right("2", "Market")],
        };
        let session = run(&config(vec![Stage::ExactKey, Stage::FuzzyName]), input).unwrap();
        assert_eq!(session.exact_matches().len(), 1);
        assert!(session.tentative_matches().is_empty());
        assert_eq!(session.pending_left_ids(), &[LeftId(1)]);
        assert_eq!(session.pending_right_ids(), &[RightId(1)]);
    }

    #[test]
    fn stages_can_be_disabled() {
        let input = ReconInput {
            left: vec![left("1", "Cohen Store", "K1")],
            right: vec![right("1", "Store")],
        };
        let session = run(&config(vec![Stage::FuzzyName]), input.clone()).unwrap();
        assert!(session.exact_matches().is_empty());
        assert_eq!(session.tentative_matches().len(), 1);

        let session = run(&config(vec![]), input).unwrap();
        assert!(session.exact_matches().is_empty());
        assert!(session.tentative_matches().is_empty());
        assert_eq!(session.pending_left_ids().len(), 1);
        assert_eq!(session.pending_right_ids().len(), 1);
    }

    #[test]
    fn pools_are_in_name_order() {
        let input = ReconInput {
            left: vec![left("", "Zed", "K1"), left("", "Amy", "K2")],
            right: vec![right("", "Yak"), right("", "Bee")],
        };
        let session = run(&config(vec![Stage::ExactKey, Stage::FuzzyName]), input).unwrap();
        assert_eq!(session.pending_left_ids(), &[LeftId(1), LeftId(0)]);
        assert_eq!(session.pending_right_ids(), &[RightId(1), RightId(0)]);
    }

    #[test]
    fn three_stage_flow() {
        let input = ReconInput {
            left: vec![
                left("123-45", "A B", "K1"),
                left("", "Cohen Store", "K2"),
                left("", "David Levi", "K3"),
            ],
            right: vec![right("12345", "A B"), right("", "Store"), right("", "Levi Sons")],
        };
        let mut session = run(&config(vec![Stage::ExactKey, Stage::FuzzyName]), input).unwrap();
        assert_eq!(session.exact_matches()[0].stage, MatchStage::ExactKey);
        assert_eq!(session.tentative_matches().len(), 1);
        assert!(session.propose_match(LeftId(2), RightId(2)).is_accepted());
        assert!(session.pending_left_ids().is_empty());
        assert_eq!(session.resolved_matches().len(), 3);
    }
}
