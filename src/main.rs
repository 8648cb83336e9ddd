//! cslrun-config
//!
//! Resolves the layered cslrun configuration and prints it, or writes the
//! default user config file.

use anyhow::Result;
use clap::Parser;
use cslrun_config::cli::{Cli, Command, InitArgs, ShowArgs};
use cslrun_config::config::{
    ConfigResolver, ResolvedConfig, ResolverEnv, ensure_user_config, write_default_config,
};
use cslrun_config::error::{ConfigError, ErrorReport};
use cslrun_config::format::{OutputFormat, format_config, format_sources};
use cslrun_config::logging::{LogTarget, init_logging};
use std::process::ExitCode;
use tracing::{debug, error};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&LogTarget::parse(&cli.log), cli.verbose) {
        eprintln!("Warning: unable to initialize logging: {e:#}");
    }

    let json_errors = matches!(
        cli.command,
        Some(Command::Show(ShowArgs {
            format: OutputFormat::Json
        }))
    );

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, json_errors);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Init(args)) => run_init(&args),
        Some(Command::Where) => {
            let config = resolve()?;
            print!("{}", format_sources(&config));
            Ok(())
        }
        Some(Command::Show(args)) => run_show(&args),
        None => run_show(&ShowArgs::default()),
    }
}

fn resolve() -> Result<ResolvedConfig, ConfigError> {
    let resolver = ConfigResolver::discover()?;
    debug!(env = ?resolver.env, "Resolving configuration");
    let config = resolver.resolve()?;

    if let Some(ref notice) = config.notice {
        eprintln!("{notice}");
    }
    Ok(config)
}

fn run_show(args: &ShowArgs) -> Result<()> {
    let config = resolve()?;
    print!("{}", format_config(&config, args.format)?);
    Ok(())
}

fn run_init(args: &InitArgs) -> Result<()> {
    let env = ResolverEnv::discover()?;
    let file = env.user_config_file();

    if args.force {
        write_default_config(&file)?;
        println!("Wrote {}", file.display());
    } else if ensure_user_config(&file)? {
        println!("Wrote {}", file.display());
    } else {
        println!("{} already exists (use --force to overwrite)", file.display());
    }
    Ok(())
}

/// Top-level handler for every failure in the resolution pipeline.
fn report_error(err: &anyhow::Error, json: bool) {
    let Some(config_err) = err.downcast_ref::<ConfigError>() else {
        eprintln!("Error: {err:#}");
        return;
    };

    debug!(code = ?config_err.code(), "Configuration failed");
    if json {
        match serde_json::to_string_pretty(&ErrorReport::from(config_err)) {
            Ok(report) => println!("{report}"),
            Err(e) => error!("Unable to serialize error report: {e}"),
        }
    }
    eprintln!("Error: {config_err}");
}
