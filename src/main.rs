use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use facelab_client::api::{BackgroundMode, RgbColor};
use facelab_client::processing::{region_preset, ColorEditor, ColorPreviewEngine};
use facelab_client::tools::BlendSlider;
use facelab_client::{
    Adjustment, BackgroundRemovalTool, ClientConfig, FaceLabApi, FaceSwapWizard, HeadNerfTool, HttpApi,
    ImageAsset, ImageCompressor, Step, SwapMode, TonePreset, WizardStage,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// FaceLab from the terminal: face swaps, color edits and image tools
/// against a running FaceLab API.
#[derive(Parser, Debug)]
#[command(name = "facelab")]
#[command(about = "Face swap, color editing and image tools for the FaceLab API")]
struct Cli {
    /// API base URL (overrides FACELAB_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Debug logging for the client library
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the API is up
    Health,
    /// List regions and their color presets
    Regions,
    /// Compress an image the way uploads are compressed
    Compress {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Color-edit a local image and export it as PNG
    Edit {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        look: LookArgs,
    },
    /// Swap one face onto a target image
    Swap {
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        target: PathBuf,
        /// Export the (optionally color-edited) result as PNG
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        look: LookArgs,
    },
    /// Swap several faces onto a target image
    SwapMulti {
        #[arg(long = "source", required = true)]
        sources: Vec<PathBuf>,
        #[arg(long)]
        target: PathBuf,
        /// Assignment as TARGET:SOURCE, e.g. 0:1 (repeatable)
        #[arg(long = "map")]
        maps: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        look: LookArgs,
    },
    /// Remove the background of an image
    RemoveBg {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value = "transparent")]
        mode: BackgroundMode,
        /// Fill color as r,g,b (repeatable, color mode)
        #[arg(long = "color")]
        colors: Vec<RgbColor>,
        /// Replacement background (image mode)
        #[arg(long)]
        bg_image: Option<PathBuf>,
        /// Download the results into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// HeadNeRF head blending
    Headnerf {
        #[command(subcommand)]
        action: HeadAction,
    },
}

#[derive(Args, Debug, Default)]
struct LookArgs {
    /// Region whose color preset seeds the edit
    #[arg(long)]
    region: Option<String>,
    /// warm, cool, neutral or vivid
    #[arg(long)]
    tone: Option<TonePreset>,
    #[arg(long)]
    brightness: Option<f32>,
    #[arg(long)]
    contrast: Option<f32>,
    #[arg(long)]
    saturation: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    temperature: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    exposure: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    shadows: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    highlights: Option<f32>,
}

impl LookArgs {
    fn sliders(&self) -> Vec<(Adjustment, f32)> {
        [
            (Adjustment::Brightness, self.brightness),
            (Adjustment::Contrast, self.contrast),
            (Adjustment::Saturation, self.saturation),
            (Adjustment::Temperature, self.temperature),
            (Adjustment::Exposure, self.exposure),
            (Adjustment::Shadows, self.shadows),
            (Adjustment::Highlights, self.highlights),
        ]
        .into_iter()
        .filter_map(|(a, v)| v.map(|v| (a, v)))
        .collect()
    }
}

#[derive(Subcommand, Debug)]
enum HeadAction {
    /// List the latent samples
    Samples,
    /// Render a blend to PNG
    Render {
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        identity: Option<f32>,
        #[arg(long)]
        expression: Option<f32>,
        #[arg(long)]
        albedo: Option<f32>,
        #[arg(long)]
        illumination: Option<f32>,
        #[arg(long, allow_negative_numbers = true)]
        pitch: Option<f32>,
        #[arg(long, allow_negative_numbers = true)]
        yaw: Option<f32>,
        #[arg(long, allow_negative_numbers = true)]
        roll: Option<f32>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Fit a face photo to a new latent sample
    Fit {
        #[arg(long)]
        image: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = ClientConfig::from_env()?;
    if let Some(base) = &cli.api_base {
        config = config.with_api_base(base);
    }
    config.validate()?;
    let api: Arc<dyn FaceLabApi> = Arc::new(HttpApi::from_config(&config)?);

    match cli.command {
        Command::Health => {
            if !api.health().await {
                bail!("FaceLab API at {} is not available", config.api_base);
            }
            println!("ok");
        }
        Command::Regions => {
            for region in api.regions().await? {
                let s = region.color_settings;
                println!(
                    "{:<12} {:<20} brightness={:?} contrast={:?} saturation={:?} temperature={:?}",
                    region.id, region.name, s.brightness, s.contrast, s.saturation, s.temperature
                );
            }
        }
        Command::Compress { input, output } => {
            let asset = load(&input).await?;
            let compressed = ImageCompressor::new(config.compression).compress_async(asset.clone()).await?;
            let dims = compressed.dimensions()?;
            write(&output, &compressed).await?;
            println!(
                "{} -> {} bytes ({}x{})",
                asset.size(),
                compressed.size(),
                dims.width,
                dims.height
            );
        }
        Command::Edit { input, output, look } => {
            let asset = load(&input).await?;
            let engine = ColorPreviewEngine::load(&asset)?;
            let mut editor = ColorEditor::new(engine);
            if let Some(id) = &look.region {
                let region = api.region(id).await?;
                editor = editor.with_region_preset(region_preset(&region.color_settings));
            }
            if let Some(tone) = look.tone {
                editor.apply_tone_preset(tone);
            }
            for (which, value) in look.sliders() {
                editor.set(which, value);
            }
            write(&output, &editor.export()?).await?;
            println!("{}", output.display());
        }
        Command::Swap { source, target, output, look } => {
            let sources = vec![load(&source).await?];
            run_swap(api, &config, SwapMode::Single, sources, &target, &[], output, look).await?;
        }
        Command::SwapMulti { sources, target, maps, output, look } => {
            let mut assets = Vec::with_capacity(sources.len());
            for path in &sources {
                assets.push(load(path).await?);
            }
            run_swap(api, &config, SwapMode::Multi, assets, &target, &maps, output, look).await?;
        }
        Command::RemoveBg { image, mode, colors, bg_image, out_dir } => {
            let mut tool = BackgroundRemovalTool::new(api.clone());
            if tool.set_image(vec![load(&image).await?]) == 0 {
                bail!("{} is not an image", image.display());
            }
            tool.set_mode(mode);
            for color in colors {
                tool.toggle_color(color);
            }
            if let Some(path) = &bg_image {
                tool.set_background(vec![load(path).await?]);
            }
            let results = tool.process().await?.to_vec();
            for result in &results {
                println!("{}  {}", result.file_name, result.url);
                if let Some(dir) = &out_dir {
                    let fetched = api.fetch_image(&result.url).await?;
                    write(&dir.join(&result.file_name), &fetched).await?;
                }
            }
        }
        Command::Headnerf { action } => run_headnerf(api, &config, action).await?,
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "facelab_client=debug,facelab=debug" } else { "facelab_client=info,facelab=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
}

async fn load(path: &Path) -> Result<ImageAsset> {
    ImageAsset::from_path(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

async fn write(path: &Path, asset: &ImageAsset) -> Result<()> {
    tokio::fs::write(path, asset.bytes())
        .await
        .with_context(|| format!("writing {}", path.display()))
}

fn parse_map(map: &str) -> Result<(u32, i32)> {
    let (target, source) = map
        .split_once(':')
        .ok_or_else(|| anyhow!("mapping '{map}' is not TARGET:SOURCE"))?;
    Ok((target.trim().parse()?, source.trim().parse()?))
}

#[allow(clippy::too_many_arguments)]
async fn run_swap(
    api: Arc<dyn FaceLabApi>,
    config: &ClientConfig,
    mode: SwapMode,
    sources: Vec<ImageAsset>,
    target: &Path,
    maps: &[String],
    output: Option<PathBuf>,
    look: LookArgs,
) -> Result<()> {
    let mut wizard = FaceSwapWizard::new(api.clone(), config, mode);
    if let Some(id) = &look.region {
        wizard.select_region(Some(api.region(id).await?));
    }
    if wizard.set_sources(sources)? == 0 {
        bail!("no image among the sources");
    }
    if wizard.set_target(vec![load(target).await?])? == 0 {
        bail!("{} is not an image", target.display());
    }

    let mut progress = wizard.watch_progress();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let p = progress.borrow_and_update().clone();
            if !p.status.is_empty() {
                info!(progress = p.value, "{}", p.status);
            }
        }
    });

    let mut step = wizard.proceed().await?;
    if wizard.stage() == WizardStage::Mapping {
        if let Some(error) = wizard.error() {
            warn!(%error, "face detection failed, swapping without a mapping");
        }
        for face in wizard.faces() {
            println!("face {}  {}", face.index, face.url);
        }
        for map in maps {
            let (target_face, source_face) = parse_map(map)?;
            wizard.assign_face(target_face, source_face)?;
        }
        step = wizard.generate().await?;
    }
    printer.abort();

    match step {
        Step::Disabled => bail!("a target and at least one source image are required"),
        Step::Degraded => warn!(warning = wizard.warning().unwrap_or_default(), "showing a preview only"),
        Step::Advanced(_) => {}
    }
    let result = wizard.result().context("swap produced no result")?;
    println!("{}", result.display_url());

    if let Some(output) = output {
        wizard.enter_editing().await?;
        if let Some(tone) = look.tone {
            wizard.apply_tone(tone)?;
        }
        for (which, value) in look.sliders() {
            wizard.adjust(which, value)?;
        }
        write(&output, &wizard.export()?).await?;
        println!("{}", output.display());
    }
    Ok(())
}

async fn run_headnerf(api: Arc<dyn FaceLabApi>, config: &ClientConfig, action: HeadAction) -> Result<()> {
    match action {
        HeadAction::Samples => {
            for sample in api.headnerf_samples().await? {
                println!("{:<24} {}", sample.label(), sample.name);
            }
        }
        HeadAction::Render {
            source,
            target,
            identity,
            expression,
            albedo,
            illumination,
            pitch,
            yaw,
            roll,
            output,
        } => {
            let mut tool = HeadNerfTool::from_config(api, config);
            let mut ticket = tool.init().await?;
            if let Some(name) = &source {
                ticket = tool.select_source(name).await?;
            }
            if let Some(name) = &target {
                ticket = tool.select_target(name).await?;
            }
            let sliders = [
                (BlendSlider::Identity, identity),
                (BlendSlider::Expression, expression),
                (BlendSlider::Albedo, albedo),
                (BlendSlider::Illumination, illumination),
                (BlendSlider::Pitch, pitch),
                (BlendSlider::Yaw, yaw),
                (BlendSlider::Roll, roll),
            ];
            for (slider, value) in sliders {
                if let Some(value) = value {
                    ticket = tool.set_param(slider, value);
                }
            }
            let png = wait_for_render(&tool, ticket).await?;
            tokio::fs::write(&output, png)
                .await
                .with_context(|| format!("writing {}", output.display()))?;
            println!("{}", output.display());
        }
        HeadAction::Fit { image, output } => {
            let mut tool = HeadNerfTool::from_config(api, config);
            let fitted = tool.fit(&load(&image).await?).await?;
            println!("{}", fitted.fitted_name);
            if let (Some(output), Some(png)) = (output, fitted.result_png) {
                tokio::fs::write(&output, png)
                    .await
                    .with_context(|| format!("writing {}", output.display()))?;
            }
        }
    }
    Ok(())
}

/// Wait until the render for `ticket` is published or has failed.
async fn wait_for_render(tool: &HeadNerfTool, ticket: u64) -> Result<Vec<u8>> {
    let mut renders = tool.watch_renders();
    loop {
        let finished = !tool.render_pending();
        if let Some(published) = renders.borrow_and_update().as_ref().filter(|p| p.ticket == ticket) {
            return Ok(published.value.clone());
        }
        if finished {
            let reason = tool.render_error().unwrap_or_else(|| "render was not published".to_string());
            bail!("head render failed: {reason}");
        }
        let _ = tokio::time::timeout(Duration::from_millis(250), renders.changed()).await;
    }
}
