//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use courier_core::{
    ContainerError, DispatchError, EnvelopeError, GenerationError, ManifestError,
};

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("no service manifest configured; pass --manifest or set COURIER_MANIFEST")]
    MissingManifest,
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("failed to install shadow handlers: {0}")]
    Install(#[from] ContainerError),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error("no handler is registered on channel '{label}'")]
    UnknownChannel { label: String },
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("failed to serialise output: {0}")]
    Serialise(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),
}
