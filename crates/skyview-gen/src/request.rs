use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GenerateError, Result};
use crate::prompt::{WingParameters, extract_parameters};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorMode {
    #[default]
    Auto,
    Remote,
    Dreamfusion,
    Local,
}

impl GeneratorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GeneratorMode::Auto => "auto",
            GeneratorMode::Remote => "remote",
            GeneratorMode::Dreamfusion => "dreamfusion",
            GeneratorMode::Local => "local",
        }
    }
}

impl fmt::Display for GeneratorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneratorMode {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(GeneratorMode::Auto),
            "remote" => Ok(GeneratorMode::Remote),
            "dreamfusion" => Ok(GeneratorMode::Dreamfusion),
            "local" => Ok(GeneratorMode::Local),
            other => Err(GenerateError::UnknownMode(other.to_string())),
        }
    }
}

/// Body of `POST /generate`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt_text: String,
    #[serde(flatten)]
    pub parameters: WingParameters,
    pub generator: GeneratorMode,
}

impl GenerationRequest {
    /// Derives parameters from `prompt`. Blank prompts are rejected before
    /// anything leaves the process.
    pub fn from_prompt(prompt: &str, mode: GeneratorMode) -> Result<Self> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerateError::EmptyPrompt);
        }
        let parameters = extract_parameters(prompt);
        parameters.validate()?;
        Ok(Self {
            prompt_text: prompt.to_string(),
            parameters,
            generator: mode,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glb_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_chord: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_span: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wing_area: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl GenerationResponse {
    /// First non-blank of `viewer_url`, `public_url`, `url`, `model.glb_url`.
    pub fn asset_url(&self) -> Option<&str> {
        [
            self.viewer_url.as_deref(),
            self.public_url.as_deref(),
            self.url.as_deref(),
            self.model.as_ref().and_then(|model| model.glb_url.as_deref()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
    }

    /// Fills metrics the service left out from the requested parameters.
    pub fn fill_metrics(&mut self, parameters: &WingParameters) {
        let metrics = parameters.metrics();
        self.root_chord.get_or_insert(parameters.root_chord);
        self.total_span.get_or_insert(metrics.total_span);
        self.wing_area.get_or_insert(metrics.wing_area);
        if self.aspect_ratio.is_none() {
            self.aspect_ratio = metrics.aspect_ratio;
        }
    }
}
