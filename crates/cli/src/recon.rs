//! `keybridge run|pending|validate|init`: ledger ↔ registry reconciliation.

use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::json;

use keybridge_io::IoError;
use keybridge_recon::{
    apply_decisions, assemble, build_report, compute_summary, run, Decisions, ProposalReport,
    ReconConfig, ReconError, ReconInput, ReconSession,
};

use crate::exit_codes::{
    io_exit_code, recon_exit_code, EXIT_DECISIONS, EXIT_ERROR, EXIT_EXPORT, EXIT_INVALID_CONFIG,
    EXIT_UNRESOLVED, EXIT_USAGE,
};
use crate::util::render_table;
use crate::CliError;

/// Inputs shared by `run` and `pending`.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Left file: the ledger that holds the account keys
    pub left: PathBuf,

    /// Right file: the registry that receives the keys
    pub right: PathBuf,

    /// Recon config (TOML). Built-in column names are used when omitted
    #[arg(long, short = 'c', env = "KEYBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Manual match decisions (TOML) replayed after the automatic stages
    #[arg(long, short = 'd')]
    pub decisions: Option<PathBuf>,

    /// Sheet to read from a Left workbook (default: first sheet)
    #[arg(long)]
    pub left_sheet: Option<String>,

    /// Sheet to read from a Right workbook (default: first sheet)
    #[arg(long)]
    pub right_sheet: Option<String>,
}

fn recon_err(err: ReconError) -> CliError {
    let hint = match &err {
        ReconError::MissingInput { .. } => Some("pass both a ledger and a registry file".to_string()),
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
            Some("`keybridge init` prints a complete default config".to_string())
        }
        ReconError::DecisionsParse(_) => {
            Some("each entry is [[proposal]] with integer `left` and `right` handles".to_string())
        }
    };
    CliError { code: recon_exit_code(&err), message: err.to_string(), hint }
}

fn io_err(err: IoError) -> CliError {
    let hint = match &err {
        IoError::UnsupportedFormat { .. } => {
            Some("supported inputs: .xlsx .xlsm .xlsb .xls .ods .csv .tsv; outputs: .xlsx .csv .tsv".to_string())
        }
        IoError::SheetNotFound { .. } => Some("pick a sheet with --left-sheet / --right-sheet".to_string()),
        IoError::Write { .. } => Some("nothing was lost; fix the output path and run again".to_string()),
        _ => None,
    };
    CliError { code: io_exit_code(&err), message: err.to_string(), hint }
}

// ============================================================================
// Loading
// ============================================================================

pub(crate) fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        log::info!("no config given; using built-in defaults");
        return Ok(ReconConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_INVALID_CONFIG,
        message: format!("cannot read config {}: {e}", path.display()),
        hint: None,
    })?;
    ReconConfig::from_toml(&text).map_err(recon_err)
}

fn load_decisions(path: Option<&Path>) -> Result<Decisions, CliError> {
    let Some(path) = path else {
        return Ok(Decisions::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_DECISIONS,
        message: format!("cannot read decisions {}: {e}", path.display()),
        hint: None,
    })?;
    Decisions::from_toml(&text).map_err(recon_err)
}

fn load_input(args: &InputArgs) -> Result<ReconInput, CliError> {
    let left = keybridge_io::read_records(&args.left, args.left_sheet.as_deref()).map_err(io_err)?;
    let right = keybridge_io::read_records(&args.right, args.right_sheet.as_deref()).map_err(io_err)?;
    Ok(ReconInput { left, right })
}

/// Load inputs and decisions, run the automatic stages and replay decisions.
fn prepare(args: &InputArgs, config: &ReconConfig) -> Result<(ReconSession, Vec<ProposalReport>), CliError> {
    let decisions = load_decisions(args.decisions.as_deref())?;
    let input = load_input(args)?;

    let mut session = run(config, input).map_err(recon_err)?;

    let reports = apply_decisions(&mut session, &decisions);
    for r in &reports {
        match &r.rejection {
            Some(reason) => eprintln!("proposal left {} / right {}: rejected ({reason})", r.left.0, r.right.0),
            None => log::info!("proposal left {} / right {}: accepted", r.left.0, r.right.0),
        }
    }
    Ok((session, reports))
}

// ============================================================================
// run
// ============================================================================

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output file (.xlsx, or .csv/.tsv for the merged sheet only).
    /// Defaults to `output.file` from the config
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Print the JSON report to stdout
    #[arg(long)]
    pub json: bool,

    /// Write the JSON report to a file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Leave out the sheet of unmatched ledger records
    #[arg(long)]
    pub no_unmatched_sheet: bool,

    /// Exit 7 when ledger records are left unmatched
    #[arg(long)]
    pub strict: bool,
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let mut config = load_config(args.input.config.as_deref())?;
    let out_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.file));
    keybridge_io::output_format(&out_path).map_err(|e| CliError {
        code: EXIT_USAGE,
        hint: Some("write the output as .xlsx, .csv or .tsv".to_string()),
        ..io_err(e)
    })?;

    let (mut session, reports) = prepare(&args.input, &config)?;
    if args.no_unmatched_sheet {
        config.output.include_unmatched_sheet = false;
    }

    let output = assemble(&mut session);
    let report = build_report(&config.name, &session, &output, reports);
    let s = &report.summary;

    if !s.partition_ok {
        return Err(CliError {
            code: EXIT_ERROR,
            message: "internal error: a record was matched twice or lost".to_string(),
            hint: None,
        });
    }

    let sheets = output.sheets(&config.output);

    // Report output does not depend on the export succeeding.
    let export = keybridge_io::write_output(&out_path, &sheets);

    let json_str = serde_json::to_string_pretty(&report).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })?;
    if let Some(ref path) = args.summary {
        std::fs::write(path, &json_str).map_err(|e| CliError {
            code: EXIT_EXPORT,
            message: format!("cannot write summary {}: {e}", path.display()),
            hint: None,
        })?;
        eprintln!("wrote {}", path.display());
    }
    if args.json {
        println!("{json_str}");
    }

    eprintln!(
        "{}: {} of {} ledger records matched (exact {}, fuzzy {}, manual {}); {} ledger and {} registry records unmatched",
        config.name,
        s.exact_matched + s.fuzzy_matched + s.manual_matched,
        s.left_total,
        s.exact_matched,
        s.fuzzy_matched,
        s.manual_matched,
        s.left_unmatched,
        s.right_unmatched,
    );

    export.map_err(io_err)?;
    eprintln!(
        "wrote {} ({} sheet{}, {} rows)",
        out_path.display(),
        sheets.len(),
        if sheets.len() == 1 { "" } else { "s" },
        output.merged.len()
    );

    if args.strict && s.left_unmatched > 0 {
        return Err(CliError {
            code: EXIT_UNRESOLVED,
            message: format!("{} ledger records remain unmatched", s.left_unmatched),
            hint: Some("`keybridge pending` lists them with handles for a decisions file".to_string()),
        });
    }
    Ok(())
}

// ============================================================================
// pending
// ============================================================================

#[derive(Args, Debug)]
pub struct PendingArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print pools as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn cmd_pending(args: PendingArgs) -> Result<(), CliError> {
    let config = load_config(args.input.config.as_deref())?;
    let (session, _reports) = prepare(&args.input, &config)?;
    let fields = session.fields();

    if args.json {
        let left: Vec<_> = session
            .pending_left()
            .map(|(id, r)| json!({ "handle": id, "name": r.get(&fields.left_name), "record": r }))
            .collect();
        let right: Vec<_> = session
            .pending_right()
            .map(|(id, r)| json!({ "handle": id, "name": r.get(&fields.right_name), "record": r }))
            .collect();
        let tentative: Vec<_> = session
            .tentative_matches()
            .iter()
            .map(|t| {
                json!({
                    "left": t.left,
                    "right": t.right,
                    "left_name": session.left_name(t.left),
                    "right_name": session.right_name(t.right),
                })
            })
            .collect();
        let value = json!({
            "summary": compute_summary(&session),
            "tentative": tentative,
            "left": left,
            "right": right,
        });
        let out = serde_json::to_string_pretty(&value).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        println!("{out}");
        return Ok(());
    }

    let tentative: Vec<Vec<String>> = session
        .tentative_matches()
        .iter()
        .map(|t| {
            vec![
                t.left.0.to_string(),
                session.left_name(t.left).unwrap_or("").to_string(),
                t.right.0.to_string(),
                session.right_name(t.right).unwrap_or("").to_string(),
            ]
        })
        .collect();
    println!("Fuzzy matches ({})", tentative.len());
    print!("{}", render_table(&["left", "name", "right", "name"], &tentative));

    let left: Vec<Vec<String>> = session
        .pending_left()
        .map(|(id, r)| {
            vec![
                id.0.to_string(),
                r.get(&fields.left_name).unwrap_or("").to_string(),
                r.get(&fields.left_id).unwrap_or("").to_string(),
                r.get(&fields.left_key).unwrap_or("").to_string(),
            ]
        })
        .collect();
    println!();
    println!("Unmatched left ({})", left.len());
    print!("{}", render_table(&["#", "name", "id", "key"], &left));

    let right: Vec<Vec<String>> = session
        .pending_right()
        .map(|(id, r)| {
            vec![
                id.0.to_string(),
                r.get(&fields.right_name).unwrap_or("").to_string(),
                r.get(&fields.right_id).unwrap_or("").to_string(),
            ]
        })
        .collect();
    println!();
    println!("Unmatched right ({})", right.len());
    print!("{}", render_table(&["#", "name", "id"], &right));

    Ok(())
}

// ============================================================================
// validate / init
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path))?;
    let stages: Vec<String> = config.matching.stages.iter().map(|s| s.to_string()).collect();
    eprintln!(
        "ok: {} (left key '{}', stages [{}], output '{}')",
        config.name,
        config.fields.left_key,
        stages.join(", "),
        config.output.file
    );
    Ok(())
}

pub fn cmd_init(path: Option<PathBuf>, force: bool) -> Result<(), CliError> {
    let text = ReconConfig::default().to_toml().map_err(recon_err)?;
    let Some(path) = path else {
        print!("{text}");
        return Ok(());
    };
    if path.exists() && !force {
        return Err(CliError {
            code: EXIT_USAGE,
            message: format!("{} already exists", path.display()),
            hint: Some("pass --force to overwrite".to_string()),
        });
    }
    std::fs::write(&path, text).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("cannot write {}: {e}", path.display()),
        hint: None,
    })?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
