pub mod client;
pub mod config;
pub mod error;
pub mod fallback;
pub mod glb;
pub mod prompt;
pub mod request;
pub mod wing;

pub use client::GenerationClient;
pub use config::GeneratorConfig;
pub use error::{GenerateError, Result};
pub use fallback::{
    DreamFusionGenerator, Generator, GeneratorChain, LocalGenerator, RemoteGenerator,
};
pub use glb::{encode_glb, read_glb_json, write_glb};
pub use prompt::{WingMetrics, WingParameters, extract_parameters};
pub use request::{GenerationRequest, GenerationResponse, GeneratorMode, ModelLink};
pub use wing::{NacaProfile, WingModel, WingSide};
