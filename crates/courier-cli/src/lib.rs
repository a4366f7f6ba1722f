//! Command-line runtime for the courier shadow-dispatch tool.
//!
//! The runtime splits leading configuration flags from the command, parses
//! the command, resolves layered configuration, initialises telemetry, loads
//! the service manifest, and runs one inspection command.
//! IO streams are parameters so tests can capture output.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::info;

use courier_config::Config;
use courier_core::{Envelope, Manifest, ServiceDeclaration, ShadowRegistrationPolicy};

mod cli;
mod config;
mod errors;
pub mod output;
mod runtime;
mod telemetry;

use cli::{Cli, CliCommand};
use config::{ConfigLoader, OrthoConfigLoader, split_arguments};
use errors::AppError;
use output::{
    PlanReport, ResolvedOutputFormat, RouteReport, SignatureReport, write_plans, write_route,
    write_signatures,
};
use runtime::{EchoContext, LocalBus};

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E, stdout_is_terminal: bool) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, stdout_is_terminal, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
#[must_use]
pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    stdout_is_terminal: bool,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_arguments(&args);
    let result = Cli::try_parse_from(split.command)
        .map_err(AppError::CliUsage)
        .and_then(|cli| {
            let config = loader
                .load(&split.config)
                .map_err(AppError::LoadConfiguration)?;
            execute(cli, &config, stdout, stdout_is_terminal)
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error))
            if matches!(
                error.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "courier: {error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write>(
    cli: Cli,
    config: &Config,
    stdout: &mut W,
    stdout_is_terminal: bool,
) -> Result<(), AppError> {
    telemetry::initialise(config)?;

    let path = config.manifest().ok_or(AppError::MissingManifest)?;
    let manifest = Manifest::load(path.as_std_path())?;
    info!(manifest = %path, "loaded service manifest");

    let format = cli.output.resolve(stdout_is_terminal);
    match cli.command {
        CliCommand::Plan { render } => plan(&manifest, format, render, stdout),
        CliCommand::Signatures => signatures(&manifest, format, stdout),
        CliCommand::Route { channel, envelope } => {
            route(&manifest, &channel, &envelope, format, stdout)
        }
    }
}

fn plan<W: Write>(
    manifest: &Manifest,
    format: ResolvedOutputFormat,
    render: bool,
    stdout: &mut W,
) -> Result<(), AppError> {
    let policy = ShadowRegistrationPolicy::new();
    let declarations = manifest.resolve()?;
    let plans = declarations
        .iter()
        .map(|declaration| policy.plan(declaration))
        .collect::<Result<Vec<_>, _>>()?;
    let reports: Vec<PlanReport<'_>> = plans
        .iter()
        .zip(&declarations)
        .map(|(plan, declaration)| PlanReport::new(plan, declaration.scope(), render))
        .collect();
    write_plans(stdout, format, &reports)
}

fn signatures<W: Write>(
    manifest: &Manifest,
    format: ResolvedOutputFormat,
    stdout: &mut W,
) -> Result<(), AppError> {
    let contracts = manifest.resolve_contracts()?;
    let mut reports = Vec::new();
    for contract in &contracts {
        reports.extend(SignatureReport::for_contract(contract)?);
    }
    write_signatures(stdout, format, &reports)
}

fn route<W: Write>(
    manifest: &Manifest,
    channel: &str,
    envelope: &str,
    format: ResolvedOutputFormat,
    stdout: &mut W,
) -> Result<(), AppError> {
    let envelope = Envelope::parse(envelope.as_bytes())?;
    let bus = Arc::new(LocalBus::default());
    let context = Arc::new(EchoContext::default());
    install_all(&manifest.resolve()?, &bus, &context)?;
    context.reset();

    if !bus.deliver(channel, &envelope)? {
        return Err(AppError::UnknownChannel {
            label: channel.to_owned(),
        });
    }

    let report = RouteReport {
        channel: channel.to_owned(),
        command: envelope.command_label().to_owned(),
        replies: bus.take_replies(),
        delegated_to: context.delegated(),
        instances_created: context.created(),
        instances_destroyed: context.destroyed(),
    };
    write_route(stdout, format, &report)
}

fn install_all(
    declarations: &[ServiceDeclaration],
    bus: &Arc<LocalBus>,
    context: &Arc<EchoContext>,
) -> Result<(), AppError> {
    let policy = ShadowRegistrationPolicy::new();
    for declaration in declarations {
        let plan = policy.plan(declaration)?;
        policy.install(&plan, bus, context.clone())?;
    }
    Ok(())
}
