//! Output models and rendering for CLI commands.
//!
//! Every command builds a serialisable report. JSON output emits the report
//! as-is; human output renders the same report as indented text.

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use courier_core::contract::ServiceContract;
use courier_core::dispatch::DispatchRule;
use courier_core::signature::signature_set;
use courier_core::{GenerationError, InstanceScope, RegistrationPlan, ReplyEnvelope, ShadowBinding};

use crate::errors::AppError;

/// Output format selection for command results.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Selects `human` for terminal output and `json` for redirected output.
    #[default]
    Auto,
    /// Always render human-readable output.
    Human,
    /// Always emit JSON.
    Json,
}

/// Output format after resolving `auto` based on TTY detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolvedOutputFormat {
    /// Human-readable text.
    Human,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Resolves the output format based on whether stdout is a terminal.
    #[must_use]
    pub const fn resolve(self, stdout_is_terminal: bool) -> ResolvedOutputFormat {
        match self {
            Self::Auto => {
                if stdout_is_terminal {
                    ResolvedOutputFormat::Human
                } else {
                    ResolvedOutputFormat::Json
                }
            }
            Self::Human => ResolvedOutputFormat::Human,
            Self::Json => ResolvedOutputFormat::Json,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PlanReport<'a> {
    service: &'a str,
    scope: InstanceScope,
    bindings: Vec<BindingReport<'a>>,
}

#[derive(Debug, Serialize)]
struct BindingReport<'a> {
    label: &'a str,
    kind: &'static str,
    remote_delegate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    contract: Option<&'a str>,
    rules: Vec<RuleReport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    routine: Option<String>,
}

#[derive(Debug, Serialize)]
struct RuleReport<'a> {
    signature: &'a str,
    parameters: Vec<&'a str>,
    returns: Option<&'a str>,
    teardown: bool,
}

impl<'a> PlanReport<'a> {
    pub(crate) fn new(plan: &'a RegistrationPlan, scope: InstanceScope, render: bool) -> Self {
        Self {
            service: plan.service(),
            scope,
            bindings: plan
                .bindings()
                .iter()
                .map(|binding| BindingReport::new(binding, render))
                .collect(),
        }
    }
}

impl<'a> BindingReport<'a> {
    fn new(binding: &'a ShadowBinding, render: bool) -> Self {
        let table = binding.table();
        Self {
            label: binding.label(),
            kind: binding.kind().as_str(),
            remote_delegate: binding.has_remote_delegate(),
            contract: binding.contract(),
            rules: table
                .map(|table| table.rules().iter().map(RuleReport::new).collect())
                .unwrap_or_default(),
            routine: table
                .filter(|_| render)
                .map(|table| table.render().to_string()),
        }
    }
}

impl<'a> RuleReport<'a> {
    fn new(rule: &'a DispatchRule) -> Self {
        Self {
            signature: rule.signature().as_str(),
            parameters: rule
                .method()
                .parameters()
                .iter()
                .map(|ty| ty.name())
                .collect(),
            returns: rule.method().returns().map(|ty| ty.name()),
            teardown: rule.tears_down(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SignatureReport<'a> {
    contract: &'a str,
    remote: bool,
    signature: String,
    returns: Option<&'a str>,
}

impl<'a> SignatureReport<'a> {
    pub(crate) fn for_contract(
        contract: &'a ServiceContract,
    ) -> Result<Vec<Self>, GenerationError> {
        Ok(signature_set(contract)?
            .into_iter()
            .map(|(signature, method)| Self {
                contract: contract.name(),
                remote: contract.is_remote(),
                signature: signature.as_str().to_owned(),
                returns: method.returns().map(|ty| ty.name()),
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RouteReport {
    pub(crate) channel: String,
    pub(crate) command: String,
    pub(crate) replies: Vec<ReplyEnvelope>,
    pub(crate) delegated_to: Vec<String>,
    pub(crate) instances_created: usize,
    pub(crate) instances_destroyed: usize,
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub(crate) fn write_plans<W: Write>(
    out: &mut W,
    format: ResolvedOutputFormat,
    reports: &[PlanReport<'_>],
) -> Result<(), AppError> {
    if format == ResolvedOutputFormat::Json {
        return write_json(out, reports);
    }
    if reports.is_empty() {
        writeln!(out, "no decorated services")?;
    }
    for report in reports {
        let scope = match report.scope {
            InstanceScope::Shared => "shared",
            InstanceScope::Dependent => "dependent",
        };
        writeln!(out, "{} ({scope})", report.service)?;
        for binding in &report.bindings {
            write!(out, "  {} [{}]", binding.label, binding.kind)?;
            if let Some(contract) = binding.contract {
                write!(out, " contract {contract}")?;
            }
            writeln!(out)?;
            for rule in &binding.rules {
                match rule.returns {
                    Some(returns) => writeln!(out, "    {} -> {returns}", rule.signature)?,
                    None => writeln!(out, "    {}", rule.signature)?,
                }
            }
            if let Some(routine) = &binding.routine {
                for line in routine.lines() {
                    writeln!(out, "    {line}")?;
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn write_signatures<W: Write>(
    out: &mut W,
    format: ResolvedOutputFormat,
    reports: &[SignatureReport<'_>],
) -> Result<(), AppError> {
    if format == ResolvedOutputFormat::Json {
        return write_json(out, reports);
    }
    for report in reports {
        let marker = if report.remote { " (remote)" } else { "" };
        writeln!(out, "{}{marker}", report.signature)?;
    }
    Ok(())
}

pub(crate) fn write_route<W: Write>(
    out: &mut W,
    format: ResolvedOutputFormat,
    report: &RouteReport,
) -> Result<(), AppError> {
    if format == ResolvedOutputFormat::Json {
        return write_json(out, report);
    }
    writeln!(out, "routed '{}' on {}", report.command, report.channel)?;
    for service in &report.delegated_to {
        writeln!(out, "delegated to shadow instance of {service}")?;
    }
    if report.replies.is_empty() {
        writeln!(out, "no reply published")?;
    }
    for reply in &report.replies {
        writeln!(
            out,
            "reply {} to {}: {}",
            reply.topic(),
            reply.conversation_id(),
            reply.value()
        )?;
    }
    writeln!(
        out,
        "instances: {} created, {} destroyed",
        report.instances_created, report.instances_destroyed
    )?;
    Ok(())
}
