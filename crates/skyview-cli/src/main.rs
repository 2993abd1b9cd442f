use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use skyview_gen::{
    GenerationClient, GenerationRequest, GeneratorChain, GeneratorConfig, GeneratorMode,
    NacaProfile, WingModel, WingParameters, write_glb,
};
use skyview_studio::{
    FileStorage, InteractionStore, SessionStorage, StudioConfig, TransformMode, save_session,
    try_load_session,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "skyview")]
#[command(about = "Aircraft design studio tools: wing generation and viewer sessions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the wing parameters derived from a prompt.
    Params(PromptArgs),
    /// Ask the studio backend for a wing model.
    Generate(GenerateArgs),
    /// Run the generator fallback chain in-process.
    Pipeline(PipelineArgs),
    /// Build the procedural wing and write it as GLB.
    Wing(WingArgs),
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },
}

#[derive(Args)]
struct PromptArgs {
    #[arg(long)]
    prompt: String,
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long, default_value = "auto")]
    mode: GeneratorMode,
    /// Backend base URL; defaults to SKYVIEW_API_URL.
    #[arg(long)]
    api: Option<String>,
    /// HEAD the returned asset URL.
    #[arg(long)]
    verify: bool,
}

#[derive(Args)]
struct PipelineArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long, default_value = "auto")]
    mode: GeneratorMode,
    /// Where locally built models go; defaults to GENERATED_MODELS_DIR.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Args)]
struct WingArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value = "2412")]
    profile: String,
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Load a generated wing into a fresh studio and store its session.
    Save(SessionSaveArgs),
    /// Restore the stored session onto a freshly generated wing.
    Load(SessionArgs),
    /// Print the stored session record.
    Show(SessionArgs),
}

#[derive(Args)]
struct SessionArgs {
    #[arg(long)]
    dir: PathBuf,
    #[arg(long, default_value = "a 12m wingspan trainer")]
    prompt: String,
    /// JSON file with studio settings.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct SessionSaveArgs {
    #[command(flatten)]
    session: SessionArgs,
    #[arg(long)]
    annotate: Option<String>,
    /// Part name to anchor the annotation on; defaults to the scene center.
    #[arg(long, requires = "annotate")]
    at: Option<String>,
    #[arg(long)]
    explode: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Params(args) => print_params(args),
        Command::Generate(args) => generate(args),
        Command::Pipeline(args) => pipeline(args),
        Command::Wing(args) => wing(args),
        Command::Session {
            command: SessionCommand::Save(args),
        } => session_save(args),
        Command::Session {
            command: SessionCommand::Load(args),
        } => session_load(args),
        Command::Session {
            command: SessionCommand::Show(args),
        } => session_show(args),
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct ParamsReport {
    #[serde(flatten)]
    parameters: WingParameters,
    #[serde(flatten)]
    metrics: skyview_gen::WingMetrics,
}

fn print_params(args: PromptArgs) -> Result<()> {
    let request = GenerationRequest::from_prompt(&args.prompt, GeneratorMode::Auto)
        .context("prompt rejected")?;
    print_json(&ParamsReport {
        parameters: request.parameters,
        metrics: request.parameters.metrics(),
    })
}

fn generate(args: GenerateArgs) -> Result<()> {
    let request =
        GenerationRequest::from_prompt(&args.prompt, args.mode).context("prompt rejected")?;
    let mut config = GeneratorConfig::from_env().context("invalid generator environment")?;
    if let Some(api) = args.api {
        config.api_url = api;
    }

    let client = GenerationClient::from_config(&config).context("failed to build HTTP client")?;
    let response = client
        .generate(&request)
        .with_context(|| format!("generation via {} failed", client.endpoint()))?;
    if args.verify {
        if let Some(url) = response.asset_url() {
            if !client.verify_asset(url) {
                warn!(url, "generated asset is not reachable yet");
            }
        }
    }
    print_json(&response)
}

fn pipeline(args: PipelineArgs) -> Result<()> {
    let request =
        GenerationRequest::from_prompt(&args.prompt, args.mode).context("prompt rejected")?;
    let mut config = GeneratorConfig::from_env().context("invalid generator environment")?;
    if let Some(dir) = args.out_dir {
        config.models_dir = dir;
    }

    let chain = GeneratorChain::from_config(&config).context("failed to set up generators")?;
    let response = chain.run(&request).context("generation failed")?;
    info!(
        source = response.source.as_deref().unwrap_or("unknown"),
        url = response.asset_url().unwrap_or_default(),
        "pipeline complete"
    );
    print_json(&response)
}

fn wing(args: WingArgs) -> Result<()> {
    let request =
        GenerationRequest::from_prompt(&args.prompt, GeneratorMode::Local).context("prompt rejected")?;
    let profile: NacaProfile = args.profile.parse().context("invalid --profile")?;
    let model = WingModel::build(&request.parameters, profile).context("failed to build wing")?;
    let bytes = write_glb(&args.out, &model).context("GLB export failed")?;
    info!(path = %args.out.display(), bytes, "GLB export complete");
    print_json(&model.metrics())
}

fn studio_with_wing(args: &SessionArgs) -> Result<InteractionStore> {
    let config = match &args.config {
        Some(path) => StudioConfig::from_json_file(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => StudioConfig::default(),
    };
    let request =
        GenerationRequest::from_prompt(&args.prompt, GeneratorMode::Local).context("prompt rejected")?;
    let model = WingModel::build(&request.parameters, NacaProfile::default())
        .context("failed to build wing")?;

    let mut store = InteractionStore::new(config);
    store
        .load_model(model.to_model_spec())
        .context("failed to load wing into the scene")?;
    Ok(store)
}

#[derive(Serialize)]
struct StudioSummary {
    nodes: usize,
    annotations: usize,
    transform_mode: TransformMode,
    cut_axis: String,
    cut_offset: f64,
    scene_version: u64,
}

impl StudioSummary {
    fn of(store: &InteractionStore) -> Self {
        Self {
            nodes: store.scene().len(),
            annotations: store.annotations().len(),
            transform_mode: store.transform_mode(),
            cut_axis: store.cut().axis().to_string(),
            cut_offset: store.cut().offset(),
            scene_version: store.scene_version(),
        }
    }
}

fn session_save(args: SessionSaveArgs) -> Result<()> {
    let mut store = studio_with_wing(&args.session)?;
    if let Some(text) = args.annotate {
        let scene = store.scene();
        let anchor = match &args.at {
            Some(name) => {
                let part = scene
                    .find_by_name(name)
                    .with_context(|| format!("no part named '{name}'"))?;
                scene.world_center(part.id)
            }
            None => scene.scene_bounds().map(|bounds| bounds.center()),
        }
        .context("generated wing has no geometry")?;
        let id = store.add_annotation(anchor);
        store.update_annotation(id, text);
    }
    if args.explode {
        let mut driver = skyview_studio::FrameDriver::new();
        store.set_exploded(true);
        let step = std::time::Duration::from_millis(16);
        while driver.frame(&mut store, step) {}
    }

    let mut storage = FileStorage::new(&args.session.dir);
    let snapshot = save_session(&store, &mut storage).context("failed to save session")?;
    info!(
        path = %storage.path_for(&store.config().session_key).display(),
        "session written"
    );
    print_json(&snapshot)
}

fn session_load(args: SessionArgs) -> Result<()> {
    let mut store = studio_with_wing(&args)?;
    let storage = FileStorage::new(&args.dir);
    let snapshot = try_load_session(&mut store, &storage).context("failed to load session")?;
    info!(
        stored_nodes = snapshot.transforms.as_ref().map_or(0, |t| t.len()),
        "session applied"
    );
    print_json(&StudioSummary::of(&store))
}

fn session_show(args: SessionArgs) -> Result<()> {
    let storage = FileStorage::new(&args.dir);
    let key = match &args.config {
        Some(path) => StudioConfig::from_json_file(path)
            .with_context(|| format!("failed to read {}", path.display()))?
            .session_key,
        None => StudioConfig::default().session_key,
    };
    let Some(text) = storage.read(&key).context("failed to read session")? else {
        bail!("no session stored in {}", args.dir.display());
    };
    let value: serde_json::Value = serde_json::from_str(&text).context("session is not JSON")?;
    print_json(&value)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
