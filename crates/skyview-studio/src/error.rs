use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("no file selected")]
    NoFileSelected,
    #[error("unsupported file '{0}': only .glb and .gltf models can be imported")]
    UnsupportedFormat(String),
    #[error("model '{model}' failed to render: {message}")]
    Render { model: String, message: String },
    #[error("no saved session found")]
    SessionMissing,
    #[error("saved session is malformed")]
    SessionMalformed(#[source] serde_json::Error),
    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Scene(#[from] skyview_scene::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StudioError>;
