//! The capture loop: play frames, follow the cursor, react to keys.

use crate::error::CaptureResult;
use crate::input::Command;
use crate::session::{Flow, Session};
use crate::surface::Surface;
use crate::video::FrameSource;
use crate::viewport::Viewport;

#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Shown in the window title next to the playback time.
    pub label: String,
    /// Start with playback paused on the first frame.
    pub paused: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            label: env!("CARGO_PKG_NAME").to_string(),
            paused: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub frames_shown: u64,
    pub records: u64,
    pub last_frame: Option<u64>,
}

/// Formats the playback time of a frame as `MM:SS`.
pub fn timecode(index: u64, frame_rate: f64) -> String {
    let secs = if frame_rate > 0.0 {
        (index as f64 / frame_rate) as u64
    } else {
        0
    };
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Index of the frame at `seconds` into a video.
pub fn frame_at(seconds: f64, frame_rate: f64) -> u64 {
    (seconds.max(0.0) * frame_rate).round() as u64
}

fn window_title(
    options: &CaptureOptions,
    session: &Session,
    index: u64,
    fps: f64,
    playing: bool,
) -> String {
    let mut title = format!("{} {}", options.label, timecode(index, fps));
    if !playing {
        title.push_str(" [paused]");
    }
    if let Some(key) = session.active() {
        title.push_str(&format!(" -> {}.csv", key));
    }
    title
}

/// Runs until the video ends, Escape is pressed or the surface is closed.
pub fn run<F, S>(
    source: &mut F,
    surface: &mut S,
    viewport: &Viewport,
    session: &mut Session,
    options: &CaptureOptions,
) -> CaptureResult<Summary>
where
    F: FrameSource,
    S: Surface,
{
    let fps = source.frame_rate();
    let mut summary = Summary::default();

    let Some(mut frame) = source.next_frame()? else {
        tracing::warn!("video has no frames");
        return Ok(summary);
    };

    let mut playing = !options.paused;
    let mut fresh = true;

    tracing::info!("playback started at frame {}", frame.index);

    while surface.is_open() {
        let title = window_title(options, session, frame.index, fps, playing);
        if fresh {
            surface.present(&frame.image, &title)?;
            summary.frames_shown += 1;
            fresh = false;
        } else {
            surface.refresh(&title)?;
        }

        session.set_frame(frame.index);
        summary.last_frame = Some(frame.index);

        if let Some((x, y)) = surface.cursor() {
            let (x, y) = viewport.to_video(x, y);
            session.move_cursor(x, y);
        }

        let mut flow = Flow::Continue;
        for command in surface.keys_pressed().into_iter().filter_map(Command::from_key) {
            match session.apply(command)? {
                Flow::Continue => {}
                Flow::TogglePause => {
                    playing = !playing;
                    tracing::debug!("playback {}", if playing { "resumed" } else { "paused" });
                }
                Flow::Quit => {
                    flow = Flow::Quit;
                    break;
                }
            }
        }

        if flow == Flow::Quit {
            tracing::info!("quit at frame {}", frame.index);
            break;
        }

        if playing {
            match source.next_frame()? {
                Some(next) => {
                    frame = next;
                    fresh = true;
                }
                None => {
                    tracing::info!("end of video after frame {}", frame.index);
                    break;
                }
            }
        }
    }

    summary.records = session.saved();
    Ok(summary)
}
