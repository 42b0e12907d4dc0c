use std::{path::Path, sync::Once, time::Duration};

use gstreamer::{
    prelude::{Cast, ElementExtManual, ObjectExt},
    traits::ElementExt,
    ElementFactory, MessageView,
};
use image::RgbImage;

static GST_INIT: Once = Once::new();

fn check_or_init_gst() -> anyhow::Result<()> {
    let mut result = Ok(());
    GST_INIT.call_once(|| result = gstreamer::init());
    result.map_err(|e| anyhow::anyhow!("failed to initialize gstreamer: {}", e))
}

/// A decoded frame, tagged with its position in the video.
pub struct Frame {
    pub index: u64,
    pub image: RgbImage,
}

/// Anything that hands out frames in display order.
pub trait FrameSource {
    /// Frames per second, used for pacing and the playback clock.
    fn frame_rate(&self) -> f64;

    /// Width and height of every frame, in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// The next frame, or `None` once the stream is exhausted.
    fn next_frame(&mut self) -> anyhow::Result<Option<Frame>>;
}

struct Pipeline {
    pipeline: gstreamer::Element,
    appsink: gstreamer_app::AppSink,
}

impl Pipeline {
    fn set_state_with_timeout(
        &self,
        state: gstreamer::State,
        timeout: Duration,
    ) -> anyhow::Result<()> {
        match self.pipeline.set_state(state)? {
            gstreamer::StateChangeSuccess::Success => Ok(()),
            gstreamer::StateChangeSuccess::Async => self.wait_async_done(timeout),
            gstreamer::StateChangeSuccess::NoPreroll => {
                Err(anyhow::anyhow!("live sources not supported"))
            }
        }
    }

    fn wait_async_done(&self, timeout: Duration) -> anyhow::Result<()> {
        let bus = self
            .pipeline
            .bus()
            .ok_or(anyhow::anyhow!("pipeline has no bus"))?;

        loop {
            match bus.timed_pop(Some(timeout.try_into()?)) {
                Some(msg) => match msg.view() {
                    MessageView::AsyncDone(_) => return Ok(()),
                    MessageView::Error(err) => return Err(err.error().into()),
                    _ => {}
                },
                None => return Err(anyhow::anyhow!("timed out waiting for ASYNC_DONE")),
            }
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            tracing::warn!("failed to shut down video pipeline: {}", e);
        }
    }
}

/// A video file opened for frame-by-frame playback.
///
/// Frame positions are derived from the frame rate reported by the stream, so:
/// - a variable frame rate can make the assumed frame count drift
/// - the assumed count may overshoot, the last few frames might not exist
///
/// Playback stops at whichever end comes first.
pub struct VideoSource {
    inner: Pipeline,

    per_frame: Duration,
    frame_rate: f64,
    width: u32,
    height: u32,
    frames: u64,
    current_index: u64,
    next_index: u64,
}

impl VideoSource {
    /// Open a video file and preroll the first frame.
    ///
    /// Fails when the path does not exist, the file is not a video, or the
    /// gstreamer plugins needed to decode it are not installed.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let uri = format!(
            "file://{}",
            path.canonicalize()
                .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?
                .to_str()
                .ok_or(anyhow::anyhow!("path is not valid unicode"))?
        );

        check_or_init_gst()?;

        let pipeline = ElementFactory::make("playbin", None)?;

        pipeline.set_property("uri", uri)?;
        pipeline.set_property(
            "audio-sink",
            ElementFactory::make("fakesink", Some("fakeaudio"))?,
        )?;

        let videocaps = gstreamer::Caps::builder("video/x-raw")
            .field("format", "RGB")
            .build();

        let appsink = ElementFactory::make("appsink", None)
            .map_err(|_| anyhow::anyhow!("appsink is missing"))?
            .dynamic_cast::<gstreamer_app::AppSink>()
            .map_err(|_| anyhow::anyhow!("sink element is not an appsink"))?;

        appsink.set_property("caps", videocaps)?;
        pipeline.set_property("video-sink", appsink.clone())?;

        let inner = Pipeline { pipeline, appsink };

        inner.set_state_with_timeout(gstreamer::State::Paused, Duration::from_secs(10))?;

        let sample = inner.appsink.pull_preroll()?;

        let caps = sample
            .caps_owned()
            .ok_or(anyhow::anyhow!("no video stream in file"))?;

        let struc = caps
            .structure(0)
            .ok_or(anyhow::anyhow!("video caps are empty"))?;

        let fraction: gstreamer::Fraction = struc
            .get("framerate")
            .map_err(|_| anyhow::anyhow!("could not determine frame rate"))?;
        let width: i32 = struc.get("width")?;
        let height: i32 = struc.get("height")?;

        let num = *fraction.0.numer();
        let denom = *fraction.0.denom();

        if num <= 0 || denom <= 0 {
            return Err(anyhow::anyhow!("unusable frame rate {}/{}", num, denom));
        }

        let g_sec: Duration = gstreamer::ClockTime::SECOND.into();

        let per_frame: Duration = g_sec.mul_f32(denom as f32).div_f32(num as f32);

        let duration: gstreamer::ClockTime = inner
            .pipeline
            .query_duration()
            .ok_or(anyhow::anyhow!("could not determine duration of video"))?;

        let duration: Duration = duration.into();

        let frames = (duration.as_nanos() / per_frame.as_nanos()) as u64;

        let mut s = Self {
            inner,
            per_frame,
            frame_rate: num as f64 / denom as f64,
            width: width as u32,
            height: height as u32,
            frames,
            current_index: 0,
            next_index: 0,
        };

        s.raw_seek(0)?;

        tracing::info!(
            "opened {} ({}x{}, {:.3} fps, ~{} frames)",
            path.display(),
            s.width,
            s.height,
            s.frame_rate,
            s.frames
        );

        Ok(s)
    }

    fn raw_seek(&mut self, index: u64) -> anyhow::Result<()> {
        use gstreamer::{ClockTime, SeekFlags, SeekType};

        if index > self.frames {
            return Err(anyhow::anyhow!("frame range exceeds file duration"));
        }

        let timestamp: ClockTime = self.per_frame.mul_f64(index as f64).try_into()?;

        let flags = SeekFlags::ACCURATE | SeekFlags::FLUSH;

        self.inner
            .pipeline
            .seek(
                1.0,
                flags,
                SeekType::Set,
                timestamp,
                SeekType::None,
                ClockTime::ZERO,
            )
            .map_err(|e| anyhow::anyhow!("seek event not handled: {}", e))?;

        self.inner.wait_async_done(Duration::from_secs(10))?;

        self.current_index = index;

        Ok(())
    }

    fn step(&mut self, count: u64) -> anyhow::Result<()> {
        if count == 0 {
            return Ok(());
        }

        use gstreamer::ClockTime;

        let step_dur: ClockTime = self.per_frame.mul_f64(count as f64).try_into()?;

        let ev = gstreamer::event::Step::new(step_dur, 1.0, true, false);

        if !self.inner.pipeline.send_event(ev) {
            return Err(anyhow::anyhow!("step event not handled"));
        }

        self.inner.wait_async_done(Duration::from_secs(10))?;

        self.current_index += count;

        Ok(())
    }

    fn seek(&mut self, index: u64) -> anyhow::Result<()> {
        const MAX_STEP: u64 = 1;

        if index < self.current_index {
            self.raw_seek(index)
        } else if index - self.current_index > MAX_STEP {
            self.raw_seek(index)
        } else {
            self.step(index - self.current_index)
        }
    }

    /// Grab the frame at a frame index, see struct documentation for caveats.
    ///
    /// Returns `Ok(None)` when the pipeline has no buffer for that position.
    pub fn get_frame(&mut self, index: u64) -> anyhow::Result<Option<RgbImage>> {
        self.seek(index)?;

        let sample = self.inner.appsink.pull_preroll()?;

        if sample.buffer().is_none() {
            return Ok(None);
        }

        convert_sample_to_image(sample).map(Some)
    }

    /// Make `index` the first frame handed out by [`FrameSource::next_frame`].
    pub fn start_at(&mut self, index: u64) -> anyhow::Result<()> {
        if index >= self.frames {
            return Err(anyhow::anyhow!(
                "cannot start at frame {}, video has ~{} frames",
                index,
                self.frames
            ));
        }
        self.next_index = index;
        Ok(())
    }

    /// Assumed amount of frames in the video, see struct documentation for caveats.
    pub fn len(&self) -> u64 {
        self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }
}

impl FrameSource for VideoSource {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        let index = self.next_index;
        if index >= self.frames {
            return Ok(None);
        }

        match self.get_frame(index) {
            Ok(Some(image)) => {
                self.next_index += 1;
                Ok(Some(Frame { index, image }))
            }
            Ok(None) => Ok(None),
            // the assumed frame count overshot the real end of the stream
            Err(_) if self.inner.appsink.is_eos() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Converts a single RGB frame sample to an `image::RgbImage`
pub fn convert_sample_to_image(sample: gstreamer::Sample) -> anyhow::Result<RgbImage> {
    let caps = sample
        .caps()
        .ok_or(anyhow::anyhow!("could not grab caps"))?;
    let buffer = sample
        .buffer()
        .ok_or(anyhow::anyhow!("could not grab buffer"))?;

    let mut buf = vec![0u8; buffer.size()];

    buffer
        .copy_to_slice(0, &mut buf)
        .map_err(|_| anyhow::anyhow!("could not copy full image buffer"))?;

    let struc = caps
        .structure(0)
        .ok_or(anyhow::anyhow!("caps have no structure"))?;

    let width: i32 = struc.get("width")?;
    let height: i32 = struc.get("height")?;
    let format: String = struc.get("format")?;

    if format != "RGB" {
        return Err(anyhow::anyhow!("need RGB frame sample to convert to image"));
    }

    pack_rgb_rows(width as u32, height as u32, buf)
        .ok_or(anyhow::anyhow!("image buffer was not sufficient"))
}

/// Rebuilds a tightly packed RGB image from gstreamer's buffer layout, where
/// every row is padded to a multiple of four bytes.
fn pack_rgb_rows(width: u32, height: u32, buf: Vec<u8>) -> Option<RgbImage> {
    let row = width as usize * 3;
    let stride = (row + 3) & !3;

    if stride == row {
        return RgbImage::from_raw(width, height, buf);
    }

    if buf.len() < stride * height as usize {
        return None;
    }

    let packed = buf
        .chunks(stride)
        .take(height as usize)
        .flat_map(|line| &line[..row])
        .copied()
        .collect();

    RgbImage::from_raw(width, height, packed)
}
