//! Generation pipeline: remote wing service, DreamFusion, then the local
//! procedural wing.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::client::{http_client, service_error};
use crate::config::GeneratorConfig;
use crate::error::{GenerateError, Result};
use crate::glb::write_glb;
use crate::request::{GenerationRequest, GenerationResponse, GeneratorMode, ModelLink};
use crate::wing::{NacaProfile, WingModel};

const GCS_SCHEME: &str = "gs://";
const GCS_PUBLIC_HOST: &str = "https://storage.googleapis.com/";

pub trait Generator {
    fn mode(&self) -> GeneratorMode;
    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse>;
}

/// Posts bare wing parameters to an external wing-generator service.
pub struct RemoteGenerator {
    client: Client,
    endpoint: Option<String>,
}

impl RemoteGenerator {
    pub fn new(client: Client, endpoint: Option<String>) -> Self {
        Self { client, endpoint }
    }
}

impl Generator for RemoteGenerator {
    fn mode(&self) -> GeneratorMode {
        GeneratorMode::Remote
    }

    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(GenerateError::NotConfigured("remote"))?;
        info!(endpoint, "sending parameters to wing generator");
        let response = self.client.post(endpoint).json(&request.parameters).send()?;
        if !response.status().is_success() {
            return Err(service_error(response));
        }
        let mut generated: GenerationResponse = response.json()?;
        let url = generated
            .public_url
            .clone()
            .or_else(|| generated.model.as_ref().and_then(|m| m.glb_url.clone()))
            .filter(|url| !url.trim().is_empty())
            .ok_or(GenerateError::MissingAssetUrl)?;

        generated.public_url = Some(url.clone());
        generated.viewer_url = Some(url);
        generated.source.get_or_insert_with(|| "remote".to_string());
        generated
            .message
            .get_or_insert_with(|| "Wing model generated and uploaded successfully.".to_string());
        generated.fill_metrics(&request.parameters);
        generated
            .extra
            .insert("original_prompt".to_string(), json!(request.prompt_text));
        Ok(generated)
    }
}

#[derive(Deserialize)]
struct DreamFusionReply {
    #[serde(default)]
    url: Option<String>,
    #[serde(default, alias = "outputUri")]
    output_uri: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Text-to-3D service fed with the user prompt plus a structured summary of
/// the parameters.
pub struct DreamFusionGenerator {
    client: Client,
    endpoint: Option<String>,
}

impl DreamFusionGenerator {
    pub fn new(client: Client, endpoint: Option<String>) -> Self {
        Self { client, endpoint }
    }

    pub fn structured_prompt(request: &GenerationRequest) -> String {
        let p = &request.parameters;
        let summary = format!(
            "DreamFusion wing concept with root chord {:.2} m, semi-span {:.2} m, \
             sweep angle {:.1} degrees, taper ratio {:.2}.",
            p.root_chord, p.semi_span, p.sweep_angle_deg, p.taper_ratio
        );
        let original = request.prompt_text.trim();
        if original.is_empty() {
            summary
        } else {
            format!("{original}\n\n{summary}")
        }
    }
}

fn public_asset_url(url: &str) -> String {
    match url.strip_prefix(GCS_SCHEME) {
        Some(object) => format!("{GCS_PUBLIC_HOST}{object}"),
        None => url.to_string(),
    }
}

impl Generator for DreamFusionGenerator {
    fn mode(&self) -> GeneratorMode {
        GeneratorMode::Dreamfusion
    }

    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(GenerateError::NotConfigured("dreamfusion"))?;
        let prompt = Self::structured_prompt(request);
        info!(endpoint, "generating wing with DreamFusion");
        let response = self
            .client
            .post(endpoint)
            .json(&json!({ "prompt": prompt }))
            .send()?;
        if !response.status().is_success() {
            return Err(service_error(response));
        }
        let reply: DreamFusionReply = response.json()?;
        let url = reply
            .url
            .or(reply.output_uri)
            .filter(|url| !url.trim().is_empty())
            .map(|url| public_asset_url(url.trim()))
            .ok_or(GenerateError::MissingAssetUrl)?;

        let mut generated = GenerationResponse {
            viewer_url: Some(url.clone()),
            public_url: Some(url),
            source: Some("dreamfusion".to_string()),
            message: reply
                .note
                .or(reply.message)
                .or_else(|| Some("Wing model generated via DreamFusion.".to_string())),
            ..GenerationResponse::default()
        };
        generated.fill_metrics(&request.parameters);
        generated
            .extra
            .insert("structured_prompt".to_string(), json!(prompt));
        Ok(generated)
    }
}

/// Builds the wing in-process and writes it under `out_dir`.
pub struct LocalGenerator {
    out_dir: PathBuf,
    public_base_url: String,
    profile: NacaProfile,
}

impl LocalGenerator {
    pub fn new(out_dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            public_base_url: public_base_url.into(),
            profile: NacaProfile::default(),
        }
    }

    pub fn with_profile(mut self, profile: NacaProfile) -> Self {
        self.profile = profile;
        self
    }

    fn file_name() -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        format!("wing_{millis}.glb")
    }
}

impl Generator for LocalGenerator {
    fn mode(&self) -> GeneratorMode {
        GeneratorMode::Local
    }

    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let wing = WingModel::build(&request.parameters, self.profile)?;
        let file_name = Self::file_name();
        let path = self.out_dir.join(&file_name);
        let bytes = write_glb(&path, &wing)?;
        let url = format!(
            "{}/models/{file_name}",
            self.public_base_url.trim_end_matches('/')
        );
        info!(path = %path.display(), bytes, url = %url, "wing generated locally");

        let metrics = wing.metrics();
        let mut generated = GenerationResponse {
            viewer_url: Some(url.clone()),
            public_url: Some(url.clone()),
            model: Some(ModelLink { glb_url: Some(url) }),
            source: Some("local".to_string()),
            message: Some("Wing model generated locally (fallback).".to_string()),
            root_chord: Some(request.parameters.root_chord),
            total_span: Some(metrics.total_span),
            aspect_ratio: metrics.aspect_ratio,
            wing_area: Some(metrics.wing_area),
            ..GenerationResponse::default()
        };
        generated
            .extra
            .insert("local_path".to_string(), json!(path.display().to_string()));
        Ok(generated)
    }
}

/// Generators in fallback order.
pub struct GeneratorChain {
    generators: Vec<Box<dyn Generator>>,
}

impl GeneratorChain {
    pub fn new(generators: Vec<Box<dyn Generator>>) -> Self {
        Self { generators }
    }

    /// Remote, DreamFusion and local generators wired from `config`.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let client = http_client(config.timeout())?;
        Ok(Self::new(vec![
            Box::new(RemoteGenerator::new(
                client.clone(),
                config.wing_generator_api.clone(),
            )),
            Box::new(DreamFusionGenerator::new(
                client,
                config.dreamfusion_api.clone(),
            )),
            Box::new(LocalGenerator::new(
                config.models_dir.clone(),
                config.public_base_url.clone(),
            )),
        ]))
    }

    /// Runs the generator selected by `request.generator`. `Auto` walks the
    /// chain in order and returns the first success.
    pub fn run(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        if request.generator != GeneratorMode::Auto {
            let generator = self
                .generators
                .iter()
                .find(|generator| generator.mode() == request.generator)
                .ok_or(GenerateError::NotConfigured(request.generator.as_str()))?;
            return generator.generate(request).inspect_err(|err| {
                error!(generator = %request.generator, error = %err, "generation failed");
            });
        }

        let mut failures = Vec::new();
        for generator in &self.generators {
            match generator.generate(request) {
                Ok(generated) => return Ok(generated),
                Err(err) => {
                    warn!(generator = %generator.mode(), error = %err, "generator failed, falling back");
                    failures.push(format!("{}: {err}", generator.mode()));
                }
            }
        }
        Err(GenerateError::AllGeneratorsFailed(failures.join("; ")))
    }
}
