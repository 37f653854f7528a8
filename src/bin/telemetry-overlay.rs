use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use telemetry_overlay::{
    CancelFlag, ExportOpts, FfmpegProRes, RawActivity, RenderProgress, Scene, Template, Track,
    render_video,
};

#[derive(Parser, Debug)]
#[command(name = "telemetry-overlay", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the overlay video (requires `ffmpeg`).
    Render(RenderArgs),
    /// Render one preview frame as a PNG.
    Frame(FrameArgs),
    /// Print what a track contains.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct SourceArgs {
    /// Input GPX track.
    #[arg(long)]
    track: PathBuf,

    /// Overlay template JSON.
    #[arg(long)]
    template: PathBuf,

    /// Directory bare font names resolve against.
    #[arg(long)]
    fonts: Option<PathBuf>,

    /// First second of the activity to render.
    #[arg(long)]
    start: Option<u32>,

    /// End second (exclusive) of the activity to render.
    #[arg(long)]
    end: Option<u32>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output video path; defaults to the template's `overlay_filename`.
    #[arg(long)]
    out: Option<PathBuf>,

    /// ffmpeg executable.
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Second within the rendered window.
    #[arg(long, default_value_t = 0)]
    second: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input GPX track.
    #[arg(long)]
    track: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn load(source: &SourceArgs) -> anyhow::Result<(Track, Template)> {
    let track = Track::from_path(&source.track)?;
    let mut template = Template::from_path(&source.template)?;
    if source.start.is_some() {
        template.scene.start = source.start;
    }
    if source.end.is_some() {
        template.scene.end = source.end;
    }
    template.validate()?;
    Ok((track, template))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (track, template) = load(&args.source)?;
    let opts = ExportOpts {
        encoder: Arc::new(FfmpegProRes::new(args.ffmpeg)),
        fonts_dir: args.source.fonts.clone(),
        output: args.out,
        ..ExportOpts::default()
    };
    let progress = RenderProgress::new();
    let cancel = CancelFlag::new();
    let done = AtomicBool::new(false);

    let out = std::thread::scope(|s| {
        s.spawn(|| {
            while !done.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(500));
                let snap = progress.snapshot();
                if snap.total > 0 && !done.load(Ordering::Relaxed) {
                    eprint!(
                        "\rframe {}/{} (encoded {}) eta {}s   ",
                        snap.current,
                        snap.total,
                        snap.encoded,
                        snap.estimated_seconds_remaining
                            .map(|e| format!("{e:.0}"))
                            .unwrap_or_else(|| "?".to_owned())
                    );
                }
            }
        });
        let result = render_video(&track, template, &opts, &progress, &cancel);
        done.store(true, Ordering::Relaxed);
        result
    })?;

    eprintln!("\nwrote {}", out.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (track, template) = load(&args.source)?;
    let activity = RawActivity::from_track(&track)?;
    let mut scene = Scene::new(&activity, template, args.source.fonts.clone())?;
    let frame = scene.render_preview(args.second)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_alpha(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let track = Track::from_path(&args.track)?;
    let activity = RawActivity::from_track(&track)?;
    let attributes: Vec<&str> = activity.capabilities().iter().map(|k| k.name()).collect();
    println!("points: {}", activity.point_count());
    println!("native rate: {} Hz", activity.native_rate());
    println!("duration: {} s", activity.duration_seconds());
    println!("attributes: {}", attributes.join(", "));
    Ok(())
}
