use std::collections::HashMap;

use crate::config::OutputConfig;
use crate::model::{Match, OutputSheet, Record, RightId};
use crate::session::ReconSession;

/// Final dataset handed to the export collaborator.
#[derive(Debug, Clone)]
pub struct MergedOutput {
    /// Every Right record with the output key column set, followed by the
    /// residual Left records unmodified.
    pub merged: Vec<Record>,
    /// Left records no stage resolved, in input order.
    pub unmatched_left: Vec<Record>,
    /// All matches (exact, fuzzy, manual) with keys resolved.
    pub matches: Vec<Match>,
}

impl MergedOutput {
    /// Sheets for export: the merged data, then optionally the residual Left
    /// records. The direction flag comes from config as-is.
    pub fn sheets<'a>(&'a self, output: &'a OutputConfig) -> Vec<OutputSheet<'a>> {
        let mut sheets = vec![OutputSheet {
            name: &output.merged_sheet,
            records: &self.merged,
            right_to_left: output.right_to_left,
        }];
        if output.include_unmatched_sheet {
            sheets.push(OutputSheet {
                name: &output.unmatched_sheet,
                records: &self.unmatched_left,
                right_to_left: output.right_to_left,
            });
        }
        sheets
    }
}

/// Close the session and project each match's key onto its Right record.
///
/// Right records without a match get an empty key. The match for a Right
/// record is found by handle, so Right records sharing a name keep their own
/// keys. Output length is always `|Right| + |residual Left|`.
pub fn assemble(session: &mut ReconSession) -> MergedOutput {
    session.close();

    let matches = session.resolved_matches();
    let by_right: HashMap<RightId, &Match> = matches.iter().map(|m| (m.right, m)).collect();
    let output_key = session.fields().output_key().to_string();

    let mut merged: Vec<Record> = session
        .right_records()
        .iter()
        .enumerate()
        .map(|(ri, record)| {
            let key = by_right
                .get(&RightId(ri))
                .map(|m| m.key.as_str())
                .unwrap_or("");
            let mut out = record.clone();
            out.set(output_key.as_str(), key);
            out
        })
        .collect();

    let mut residual = session.pending_left_ids().to_vec();
    residual.sort();
    let unmatched_left: Vec<Record> = residual
        .iter()
        .filter_map(|id| session.left_record(*id).cloned())
        .collect();

    merged.extend(unmatched_left.iter().cloned());

    log::info!(
        "assembled {} rows: {} right, {} unmatched left, {} matches",
        merged.len(),
        session.right_records().len(),
        unmatched_left.len(),
        matches.len()
    );

    MergedOutput {
        merged,
        unmatched_left,
        matches,
    }
}
