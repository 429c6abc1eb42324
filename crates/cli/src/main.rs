// keybridge CLI - carry account keys from a ledger onto a registry

mod exit_codes;
mod recon;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use env_logger::Env;

use exit_codes::EXIT_SUCCESS;
use recon::{PendingArgs, RunArgs};

#[derive(Parser)]
#[command(name = "keybridge")]
#[command(about = "Reconcile a ledger with a registry and carry account keys across")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Match both files and write the merged workbook
    #[command(after_help = "\
Examples:
  keybridge run ledger.xlsx registry.xlsx
  keybridge run ledger.xlsx registry.xlsx -c vendors.toml -o merged.xlsx
  keybridge run ledger.csv registry.csv -d decisions.toml --json
  keybridge run ledger.xlsx registry.xlsx --summary report.json --strict")]
    Run(RunArgs),

    /// List records still unmatched after the automatic stages and decisions
    #[command(after_help = "\
Examples:
  keybridge pending ledger.xlsx registry.xlsx
  keybridge pending ledger.xlsx registry.xlsx -d decisions.toml --json

Handles in the '#' column go into a decisions file:
  [[proposal]]
  left = 4
  right = 9")]
    Pending(PendingArgs),

    /// Check a recon config without running
    #[command(after_help = "\
Examples:
  keybridge validate vendors.toml")]
    Validate {
        /// Path to the config file
        config: PathBuf,
    },

    /// Write the default config as TOML (stdout when no path is given)
    #[command(after_help = "\
Examples:
  keybridge init > keybridge.toml
  keybridge init vendors.toml
  keybridge init vendors.toml --force")]
    Init {
        /// Where to write the config
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\nengine:  keybridge-recon ", env!("CARGO_PKG_VERSION"),
        "\nstages:  exact_key, fuzzy_name, manual",
    )
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: keybridge <command> [options]");
            eprintln!("       keybridge --help for more information");
            Ok(())
        }
        Some(Commands::Run(args)) => recon::cmd_run(args),
        Some(Commands::Pending(args)) => recon::cmd_pending(args),
        Some(Commands::Validate { config }) => recon::cmd_validate(config),
        Some(Commands::Init { path, force }) => recon::cmd_init(path, force),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}
