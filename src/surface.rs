//! Display and input boundary of the capture loop.

use image::RgbImage;
use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use crate::error::{CaptureError, CaptureResult};
use crate::viewport::Viewport;

/// Where frames are shown and where key presses and the cursor come from.
///
/// Input is collected while drawing, so `keys_pressed` and `cursor`
/// describe the state as of the last `present` or `refresh`.
pub trait Surface {
    fn is_open(&self) -> bool;

    /// Show a new frame.
    fn present(&mut self, frame: &RgbImage, title: &str) -> CaptureResult<()>;

    /// Keep showing the current frame.
    fn refresh(&mut self, title: &str) -> CaptureResult<()>;

    /// Keys that went down since the last update, without auto-repeat.
    ///
    /// The loop applies them in the order returned. `WindowSurface` reports
    /// one update's keys in minifb's key-table order (letters before shift),
    /// not press order: shift followed by a letter within a single update
    /// lands in the letter's file.
    fn keys_pressed(&self) -> Vec<Key>;

    /// Cursor position in window coordinates, `None` outside the window.
    fn cursor(&self) -> Option<(f32, f32)>;
}

/// A native window backed by `minifb`.
pub struct WindowSurface {
    window: Window,
    viewport: Viewport,
    buffer: Vec<u32>,
    title: String,
}

impl WindowSurface {
    pub fn open(viewport: Viewport, frame_rate: f64) -> CaptureResult<Self> {
        let (width, height) = viewport.display_size();
        let title = env!("CARGO_PKG_NAME").to_string();

        let mut window = Window::new(
            &title,
            width as usize,
            height as usize,
            WindowOptions::default(),
        )
        .map_err(|e| CaptureError::Window(e.to_string()))?;

        window.set_target_fps(frame_rate.round().max(1.0) as usize);

        Ok(Self {
            window,
            viewport,
            buffer: vec![0; (width * height) as usize],
            title,
        })
    }

    fn set_title(&mut self, title: &str) {
        if self.title != title {
            self.window.set_title(title);
            self.title = title.to_string();
        }
    }

    fn redraw(&mut self) -> CaptureResult<()> {
        let (width, height) = self.viewport.display_size();
        self.window
            .update_with_buffer(&self.buffer, width as usize, height as usize)
            .map_err(|e| CaptureError::Window(e.to_string()))
    }
}

impl Surface for WindowSurface {
    fn is_open(&self) -> bool {
        self.window.is_open()
    }

    fn present(&mut self, frame: &RgbImage, title: &str) -> CaptureResult<()> {
        self.viewport.render(frame, &mut self.buffer);
        self.set_title(title);
        self.redraw()
    }

    fn refresh(&mut self, title: &str) -> CaptureResult<()> {
        self.set_title(title);
        self.redraw()
    }

    fn keys_pressed(&self) -> Vec<Key> {
        self.window.get_keys_pressed(KeyRepeat::No)
    }

    fn cursor(&self) -> Option<(f32, f32)> {
        self.window.get_mouse_pos(MouseMode::Discard)
    }
}
