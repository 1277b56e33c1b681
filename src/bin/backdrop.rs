use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use backdrop::{
    BackgroundAsset, CancelToken, Canvas2DSurface, CpuSurface, ExportFormat, ExportOptions,
    ExportRequest, Exporter, FfmpegEncoderFactory, FfmpegVideoLoader, FrameCompositor,
    FsImageLoader, PipelineConfig, Playhead, QualityTier, Resolution, VideoAsset, VideoLoader,
};

#[derive(Parser, Debug)]
#[command(name = "backdrop", version)]
struct Cli {
    /// Pipeline config JSON (defaults apply when omitted).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a video over a background and encode it (requires `ffmpeg` on PATH).
    Export(ExportArgs),
    /// Composite a single frame and write it as a PNG.
    Frame(FrameArgs),
    /// Print the built-in backgrounds as JSON.
    Presets,
}

#[derive(Args, Debug)]
struct BackgroundArgs {
    /// Background picture (path or file:// URL).
    #[arg(long, conflicts_with_all = ["blur", "preset"])]
    background: Option<String>,

    /// Use the video itself, blurred by this many pixels, as the background.
    #[arg(long, conflicts_with = "preset")]
    blur: Option<u32>,

    /// Built-in background id (see `backdrop presets`).
    #[arg(long)]
    preset: Option<String>,
}

impl BackgroundArgs {
    fn resolve(&self) -> anyhow::Result<Option<BackgroundAsset>> {
        if let Some(url) = &self.background {
            let name = Path::new(url)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| url.clone());
            return Ok(Some(BackgroundAsset::custom_image(name, url.clone())?));
        }
        if let Some(amount) = self.blur {
            return Ok(Some(BackgroundAsset::blur("blur", "Blur", amount)?));
        }
        if let Some(id) = &self.preset {
            let preset = backdrop::find_preset(id)
                .with_context(|| format!("unknown background preset '{id}'"))?;
            return Ok(Some(preset));
        }
        Ok(None)
    }
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input video.
    #[arg(long)]
    video: PathBuf,

    #[command(flatten)]
    background: BackgroundArgs,

    /// low | medium | high.
    #[arg(long, default_value = "medium")]
    quality: QualityTier,

    /// 480p | 720p | 1080p.
    #[arg(long, default_value = "1080p")]
    resolution: Resolution,

    /// mp4 | mov | gif | webm.
    #[arg(long, default_value = "mp4")]
    format: ExportFormat,

    /// Output file.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input video.
    #[arg(long)]
    video: PathBuf,

    /// Playback time in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    #[command(flatten)]
    background: BackgroundArgs,

    /// 480p | 720p | 1080p.
    #[arg(long, default_value = "1080p")]
    resolution: Resolution,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    backdrop::init_logging(&config.logging);

    match cli.cmd {
        Command::Export(args) => cmd_export(args, config),
        Command::Frame(args) => cmd_frame(args, config),
        Command::Presets => cmd_presets(),
    }
}

fn cmd_export(args: ExportArgs, config: PipelineConfig) -> anyhow::Result<()> {
    let video = VideoAsset::from_path(&args.video)?;
    let background = args.background.resolve()?;
    let options = ExportOptions {
        format: args.format,
        quality: args.quality,
        resolution: args.resolution,
    };

    let exporter = Exporter::new(
        Arc::new(FfmpegVideoLoader::new(config.ffmpeg.clone())),
        Arc::new(FsImageLoader::new()),
        Arc::new(FfmpegEncoderFactory::new(config.ffmpeg.clone())),
        config,
    )?;
    let request = ExportRequest {
        video,
        background,
        options,
    };

    let mut on_progress = |pct: u8| eprintln!("progress {pct:>3}%");
    let result = exporter.export(request, &mut on_progress, &CancelToken::new())?;
    let artifact = exporter
        .store()
        .resolve(&result.url)
        .context("export finished but its artifact is gone")?;

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &artifact.bytes)
        .with_context(|| format!("write output '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}x{}, {} frames, {} bytes)",
        args.out.display(),
        result.width,
        result.height,
        result.frames,
        artifact.bytes.len()
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs, config: PipelineConfig) -> anyhow::Result<()> {
    let video = VideoAsset::from_path(&args.video)?;
    let cancel = CancelToken::new();
    let loader = FfmpegVideoLoader::new(config.ffmpeg.clone());
    let source = backdrop::load_with_timeout("video", config.load_timeout(), &cancel, move || {
        loader.open(&video)
    })?;
    let background = backdrop::prepare_background(
        args.background.resolve()?.as_ref(),
        Arc::new(FsImageLoader::new()),
        config.load_timeout(),
        &cancel,
    )?;

    let canvas = args.resolution.canvas();
    let compositor =
        FrameCompositor::new(canvas, background).with_overlay_alpha(config.blur_overlay_alpha);
    let mut playhead = Playhead::new(source);
    let frame = playhead
        .advance_to(args.time)?
        .with_context(|| format!("no frame at {}s", args.time))?;

    let mut surface = CpuSurface::new(canvas);
    compositor.composite(&mut surface, &frame.image)?;
    let mut out = surface.snapshot();
    unpremultiply_rgba8_in_place(&mut out.data);

    ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &out.data,
        out.width,
        out.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_presets() -> anyhow::Result<()> {
    let mut all = backdrop::preset_backgrounds();
    all.push(backdrop::blur_background());
    println!("{}", serde_json::to_string_pretty(&all)?);
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}
