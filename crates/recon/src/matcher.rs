use std::collections::HashMap;

use crate::config::FieldConfig;
use crate::model::{
    ExactMatchOutput, FuzzyMatchOutput, LeftId, Match, MatchStage, Record, RightId,
    TentativeMatch,
};
use crate::normalize::{names_overlap, normalize, NameCollator};

/// Key value a Left record propagates. Absent keys propagate as empty.
pub fn left_key(record: &Record, fields: &FieldConfig) -> String {
    record.get(&fields.left_key).unwrap_or("").to_string()
}

/// Pair Left and Right records by normalized id.
///
/// Left records are visited in input order; each takes the first available
/// Right record (input order) with the same normalized id. A matched Right
/// record is consumed and never offered again.
pub fn match_exact_key(left: &[Record], right: &[Record], fields: &FieldConfig) -> ExactMatchOutput {
    // normalized id → Right positions in input order, front = next available
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (ri, record) in right.iter().enumerate() {
        if let Some(id) = normalize(record.get(&fields.right_id)).filter(|id| !id.is_empty()) {
            index.entry(id).or_default().push(ri);
        }
    }
    for positions in index.values_mut() {
        positions.reverse();
    }

    let mut right_used = vec![false; right.len()];
    let mut matched = Vec::new();
    let mut pending_left = Vec::new();

    for (li, record) in left.iter().enumerate() {
        let hit = normalize(record.get(&fields.left_id))
            .filter(|id| !id.is_empty())
            .and_then(|id| index.get_mut(&id))
            .and_then(|positions| positions.pop());

        match hit {
            Some(ri) => {
                right_used[ri] = true;
                let key = left_key(record, fields);
                log::debug!("exact_key: left #{li} -> right #{ri} (key '{key}')");
                matched.push(Match {
                    left: LeftId(li),
                    right: RightId(ri),
                    key,
                    stage: MatchStage::ExactKey,
                });
            }
            None => pending_left.push(LeftId(li)),
        }
    }

    let available_right = (0..right.len())
        .filter(|ri| !right_used[*ri])
        .map(RightId)
        .collect();

    ExactMatchOutput {
        matched,
        pending_left,
        available_right,
    }
}

/// Stable alphabetical sort of Left handles by the Left name field.
pub fn sort_left_by_name(ids: &mut [LeftId], left: &[Record], fields: &FieldConfig) {
    let collator = NameCollator::new();
    ids.sort_by(|a, b| {
        collator.compare(
            left[a.0].get(&fields.left_name),
            left[b.0].get(&fields.left_name),
        )
    });
}

/// Stable alphabetical sort of Right handles by the Right name field.
pub fn sort_right_by_name(ids: &mut [RightId], right: &[Record], fields: &FieldConfig) {
    let collator = NameCollator::new();
    ids.sort_by(|a, b| {
        collator.compare(
            right[a.0].get(&fields.right_name),
            right[b.0].get(&fields.right_name),
        )
    });
}

/// Pair still-pending Left records with available Right records by
/// symmetric containment of normalized names.
///
/// Both sides are taken in name order. For each Left record the first Right
/// record (name order) whose name contains, or is contained in, the Left name
/// wins. No scoring. Short names may over-match.
/// Blank names on either side never match.
pub fn match_fuzzy_name(
    left: &[Record],
    right: &[Record],
    pending_left: &[LeftId],
    available_right: &[RightId],
    fields: &FieldConfig,
) -> FuzzyMatchOutput {
    let mut left_order = pending_left.to_vec();
    sort_left_by_name(&mut left_order, left, fields);
    let mut right_order = available_right.to_vec();
    sort_right_by_name(&mut right_order, right, fields);

    let right_names: Vec<String> = right_order
        .iter()
        .map(|id| normalize(right[id.0].get(&fields.right_name)).unwrap_or_default())
        .collect();
    let mut right_used = vec![false; right_order.len()];

    let mut tentative = Vec::new();
    let mut still_pending = Vec::new();

    for lid in left_order {
        let left_name = normalize(left[lid.0].get(&fields.left_name)).unwrap_or_default();

        let hit = right_names
            .iter()
            .enumerate()
            .find(|(pos, name)| !right_used[*pos] && names_overlap(&left_name, name))
            .map(|(pos, _)| pos);

        match hit {
            Some(pos) => {
                right_used[pos] = true;
                let rid = right_order[pos];
                log::debug!("fuzzy_name: left #{} -> right #{}", lid.0, rid.0);
                tentative.push(TentativeMatch { left: lid, right: rid });
            }
            None => still_pending.push(lid),
        }
    }

    let pending_right = right_order
        .into_iter()
        .enumerate()
        .filter(|(pos, _)| !right_used[*pos])
        .map(|(_, id)| id)
        .collect();

    FuzzyMatchOutput {
        tentative,
        pending_left: still_pending,
        pending_right,
    }
}
