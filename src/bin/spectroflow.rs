use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use spectroflow::{
    ANALYSIS_SAMPLE_RATE, App, BandColor, CodecSupport as _, DirectoryDownloads,
    FfmpegCapabilities, FfmpegEncoderFactory, ManualClock, Notifier, PREFERENCE, PacedScheduler,
    PlaybackClock, Recorder, SteppedScheduler, SystemClock, Viewport, VisualizerConfig,
    decode_audio_mono,
};

#[derive(Parser, Debug)]
#[command(name = "spectroflow", version, about = "Audio-reactive waveform visualizer")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play the audio through the visualizer and record it to a video file (requires `ffmpeg`).
    Export(ExportArgs),
    /// Render the visualizer at one point of the audio as a PNG.
    Frame(FrameArgs),
    /// List recording formats in preference order and whether the local ffmpeg supports them.
    Formats,
    /// Print the default configuration as JSON.
    Config,
}

#[derive(Args, Debug)]
struct VisualArgs {
    /// Input audio file (anything ffmpeg can decode).
    #[arg(long)]
    audio: PathBuf,

    /// Visualizer configuration JSON; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Wave intensity multiplier.
    #[arg(long)]
    intensity: Option<f64>,

    /// Band color override as `NAME=#rrggbb` (applied at half opacity). Repeatable.
    #[arg(long = "color", value_name = "NAME=#RRGGBB")]
    colors: Vec<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    visual: VisualArgs,

    /// Directory the export is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Render as fast as possible instead of in real time.
    #[arg(long)]
    offline: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    visual: VisualArgs,

    /// Playback position in seconds.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&mut self, message: &str) {
        tracing::warn!(notice = message, "user notice");
        eprintln!("{message}");
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Formats => cmd_formats(),
        Command::Config => cmd_config(),
    }
}

fn load_config(args: &VisualArgs) -> anyhow::Result<VisualizerConfig> {
    let mut config = match &args.config {
        Some(path) => VisualizerConfig::from_json_path(path)?,
        None => VisualizerConfig::default(),
    };
    if let Some(intensity) = args.intensity {
        config.intensity = intensity;
    }
    for spec in &args.colors {
        let (name, hex) = spec
            .split_once('=')
            .with_context(|| format!("color override '{spec}' must look like NAME=#rrggbb"))?;
        let index = config
            .band_index(name.trim())
            .with_context(|| format!("no band named '{}'", name.trim()))?;
        let color = BandColor::from_picker_hex(hex.trim())
            .map_err(|e| anyhow::anyhow!("color override '{spec}': {e}"))?;
        config = config.with_band_color(index, color)?;
    }
    config.validate()?;
    Ok(config)
}

fn viewport(args: &VisualArgs) -> anyhow::Result<Viewport> {
    Ok(Viewport::new(args.width, args.height)?)
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let config = load_config(&args.visual)?;
    let viewport = viewport(&args.visual)?;
    let audio = decode_audio_mono(&args.visual.audio, ANALYSIS_SAMPLE_RATE)
        .with_context(|| format!("decode audio '{}'", args.visual.audio.display()))?;

    let support = FfmpegCapabilities::probe()?;
    let recorder = Recorder::new(
        support,
        FfmpegEncoderFactory::default(),
        StderrNotifier,
        DirectoryDownloads::new(&args.out_dir),
    );

    let outcome = if args.offline {
        let clock = ManualClock::new();
        let transport = PlaybackClock::new(clock.clone(), audio.duration_sec());
        let mut app =
            App::new(config, &audio, viewport, transport, recorder)?.with_tick_clock(clock);
        let mut scheduler = SteppedScheduler::new(60.0, u64::MAX)?;
        spectroflow::run_export(&mut app, &mut scheduler)?
    } else {
        let transport = PlaybackClock::new(SystemClock::new(), audio.duration_sec());
        let mut app = App::new(config, &audio, viewport, transport, recorder)?;
        let mut scheduler = PacedScheduler::new(60.0)?;
        spectroflow::run_export(&mut app, &mut scheduler)?
    };

    if let Some(err) = &outcome.encoder_error {
        eprintln!("warning: encoder reported a failure, output may be incomplete: {err}");
    }
    println!("{}", outcome.path.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = load_config(&args.visual)?;
    let viewport = viewport(&args.visual)?;
    let audio = decode_audio_mono(&args.visual.audio, ANALYSIS_SAMPLE_RATE)
        .with_context(|| format!("decode audio '{}'", args.visual.audio.display()))?;

    let frame = spectroflow::render_still(config, &audio, viewport, args.at)?;
    let straight = unpremultiply(&frame.data);
    write_png(&args.out, &straight, frame.width, frame.height)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn write_png(path: &Path, rgba: &[u8], width: u32, height: u32) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        path,
        rgba,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn unpremultiply(premul: &[u8]) -> Vec<u8> {
    premul
        .chunks_exact(4)
        .flat_map(|px| {
            let a = u16::from(px[3]);
            if a == 0 {
                return [0, 0, 0, 0];
            }
            let un = |c: u8| ((u16::from(c) * 255 + a / 2) / a).min(255) as u8;
            [un(px[0]), un(px[1]), un(px[2]), px[3]]
        })
        .collect()
}

fn cmd_formats() -> anyhow::Result<()> {
    let caps = FfmpegCapabilities::probe()?;
    for format in PREFERENCE {
        let mark = if caps.is_type_supported(format.mime_type) {
            "yes"
        } else {
            "no"
        };
        println!("{:<24} .{:<5} {mark}", format.mime_type, format.extension);
    }
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    println!("{}", VisualizerConfig::default().to_json_pretty()?);
    Ok(())
}
