#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the power-knobs tool.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use argh::FromArgs;
use power_knobs::{ConfigError, PlatformConfig, RunInput, RunOutcome, run};
use tracing_subscriber::EnvFilter;

/// Control CPU cores, SMT, TDP, battery charge limit and boost through sysfs.
#[derive(FromArgs)]
struct Args {
    /// control CPU boost (0 | 1)
    #[argh(option)]
    boost: Option<i64>,

    /// control max battery charge limit (50 - 100)
    #[argh(option)]
    charge: Option<i64>,

    /// control online CPU cores (2 - physical core count)
    #[argh(option)]
    cores: Option<i64>,

    /// control simultaneous multithreading (0 | 1)
    #[argh(option)]
    smt: Option<i64>,

    /// control TDP limit (8 - 25)
    #[argh(option)]
    tdp: Option<i64>,

    /// output the current state in JSON format instead of applying anything
    #[argh(switch)]
    json: bool,

    /// platform configuration file (TOML)
    #[argh(option)]
    config: Option<PathBuf>,

    /// directory to resolve every control file path under, instead of /
    #[argh(option)]
    sysfs_root: Option<PathBuf>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
    {
        eprintln!("failed to initialize logging: {e}");
    }
}

fn load_config(args: &Args) -> Result<PlatformConfig, ConfigError> {
    let config = match &args.config {
        Some(path) => PlatformConfig::from_toml_file(path)?,
        None => PlatformConfig::default(),
    };

    Ok(match &args.sysfs_root {
        Some(root) => config.rerooted(root),
        None => config,
    })
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    init_tracing();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let input = RunInput {
        cores: args.cores,
        tdp: args.tdp,
        charge: args.charge,
        smt: args.smt,
        boost: args.boost,
        json: args.json,
        config,
    };

    if input.is_empty() {
        let program = env::args()
            .next()
            .unwrap_or_else(|| "power-knobs".to_string());

        if let Err(usage) = Args::from_args(&[program.as_str()], &["--help"]) {
            println!("{}", usage.output);
        }

        return ExitCode::FAILURE;
    }

    let outcome = run(&input);

    match &outcome {
        RunOutcome::Status(report) => match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: failed to render status: {e}");
                return ExitCode::FAILURE;
            }
        },
        RunOutcome::Applied(outcomes) => {
            for diagnostic in outcomes.iter().filter_map(|o| o.diagnostic()) {
                println!("{diagnostic}");
            }
        }
        _ => {}
    }

    if outcome.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
