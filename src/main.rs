use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidmark::{
    capture::{self, CaptureOptions},
    FrameSource, OutputFiles, Session, VideoSource, Viewport, WindowSurface,
};

/// Play a video; letter keys pick `<key>.csv`, shift saves the cursor position.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the video.
    video: PathBuf,

    /// Seconds to skip at the beginning of the video.
    #[arg(long, default_value_t = 0.0)]
    skip: f64,

    /// Directory the CSV files are written to.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Largest window width; bigger videos are scaled down.
    #[arg(long, default_value_t = 1920, value_parser = clap::value_parser!(u32).range(1..))]
    max_width: u32,

    /// Largest window height; bigger videos are scaled down.
    #[arg(long, default_value_t = 1080, value_parser = clap::value_parser!(u32).range(1..))]
    max_height: u32,

    /// Start with playback paused, space toggles.
    #[arg(long)]
    paused: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidmark=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut video = VideoSource::open(&args.video)
        .with_context(|| format!("failed to open video {}", args.video.display()))?;

    if video.is_empty() {
        anyhow::bail!("{} contains no frames", args.video.display());
    }

    let (width, height) = video.dimensions();
    println!("Video frame dimensions: width={}, height={}", width, height);
    tracing::debug!("video has ~{} frames", video.len());

    let start = capture::frame_at(args.skip, video.frame_rate());
    if start > 0 {
        video
            .start_at(start)
            .with_context(|| format!("cannot skip {} seconds", args.skip))?;
    }

    if !args.output_dir.is_dir() {
        anyhow::bail!("output directory {} does not exist", args.output_dir.display());
    }

    let viewport = Viewport::fit(width, height, args.max_width, args.max_height);
    let mut surface = WindowSurface::open(viewport, video.frame_rate())?;
    let mut session = Session::new(OutputFiles::new(&args.output_dir));

    let options = CaptureOptions {
        label: args
            .video
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string()),
        paused: args.paused,
    };

    let summary = capture::run(&mut video, &mut surface, &viewport, &mut session, &options)?;

    tracing::info!(
        "done: {} frames shown, {} records saved",
        summary.frames_shown,
        summary.records
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["vidmark", "clip.mp4"]).unwrap();
        assert_eq!(args.video, PathBuf::from("clip.mp4"));
        assert_eq!((args.max_width, args.max_height), (1920, 1080));
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert!(!args.paused);
    }

    #[test]
    fn zero_display_bounds_are_rejected() {
        assert!(Args::try_parse_from(["vidmark", "clip.mp4", "--max-width", "0"]).is_err());
        assert!(Args::try_parse_from(["vidmark", "clip.mp4", "--max-height", "0"]).is_err());
        assert!(Args::try_parse_from(["vidmark", "clip.mp4", "--max-width", "1"]).is_ok());
    }
}
