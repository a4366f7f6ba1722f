//! CLI argument definitions for the courier tool.

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Command-line interface for the courier tool.
///
/// Configuration flags (`--config-path`, `--log-filter`, `--log-format`,
/// `--manifest`) precede these arguments and are parsed separately.
#[derive(Parser, Debug)]
#[command(
    name = "courier",
    version,
    disable_help_subcommand = true,
    override_usage = "courier [CONFIG FLAGS] [--output <OUTPUT>] <COMMAND>"
)]
pub(crate) struct Cli {
    /// Controls how command output is rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Auto)]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Inspection commands.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Prints the shadow registrations of every decorated service.
    Plan {
        /// Also prints the dispatch routine behind each method-routed binding.
        #[arg(long)]
        render: bool,
    },
    /// Lists the call signature of every contract method.
    Signatures,
    /// Delivers one envelope to the handler registered on a channel, using
    /// echo instances in place of real services.
    Route {
        /// Channel label to deliver on, such as `OnlineService:RPC`.
        #[arg(long, value_name = "LABEL")]
        channel: String,
        /// Envelope JSON, for example
        /// `{"commandLabel":"OnlineService|greet(String)","parameters":["Ada"],"replyTo":"conv-1"}`.
        #[arg(value_name = "ENVELOPE")]
        envelope: String,
    },
}
