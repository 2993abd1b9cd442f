use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("invalid wing parameters: {0}")]
    InvalidParameters(String),
    #[error("unknown generator mode: {0}")]
    UnknownMode(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{0} generator is not configured")]
    NotConfigured(&'static str),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("service returned {status}: {message}")]
    Service { status: u16, message: String },
    #[error("response did not include a model URL")]
    MissingAssetUrl,
    #[error("all generators failed: {0}")]
    AllGeneratorsFailed(String),
    #[error("invalid GLB data: {0}")]
    InvalidGlb(String),
    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Scene(#[from] skyview_scene::Error),
}

pub type Result<T> = std::result::Result<T, GenerateError>;
