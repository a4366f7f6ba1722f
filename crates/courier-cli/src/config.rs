//! Configuration loading for the CLI.
//!
//! Configuration flags must come before the command. The leading run of
//! recognised flags (and their values) goes to the derived loader, and
//! everything from the first other token onwards goes to the command parser.

use std::ffi::{OsStr, OsString};
use std::sync::Arc;

use courier_config::{Config, OrthoError};
use ortho_config::OrthoConfig;

/// Flags owned by the configuration loader.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] =
    &["--config-path", "--log-filter", "--log-format", "--manifest"];

/// Source of the runtime configuration.
pub(crate) trait ConfigLoader {
    /// Loads configuration from the program name plus the leading
    /// configuration flags.
    fn load(&self, args: &[OsString]) -> Result<Config, Arc<OrthoError>>;
}

/// Loader backed by defaults, files, `COURIER_*` variables and flags.
pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(args.iter().cloned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Arguments partitioned between the loader and the command parser.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ArgumentSplit {
    pub(crate) config: Vec<OsString>,
    pub(crate) command: Vec<OsString>,
}

/// Splits `args` at the first token that is not a configuration flag or a
/// flag's value. Both halves keep the program name.
pub(crate) fn split_arguments(args: &[OsString]) -> ArgumentSplit {
    let program = args.first().cloned();
    let mut config: Vec<OsString> = program.iter().cloned().collect();
    let mut command_start = args.len().min(1);

    let mut tokens = args.iter().enumerate().skip(1);
    while let Some((index, argument)) = tokens.next() {
        let FlagAction::Include { needs_value } = classify(argument) else {
            break;
        };
        config.push(argument.clone());
        command_start = index + 1;
        if needs_value && let Some((value_index, value)) = tokens.next() {
            config.push(value.clone());
            command_start = value_index + 1;
        }
    }

    let command = program
        .into_iter()
        .chain(args.iter().skip(command_start).cloned())
        .collect();
    ArgumentSplit { config, command }
}
