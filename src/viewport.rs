//! Fitting video frames into the window and mapping the cursor back.

use image::{imageops, imageops::FilterType, RgbImage};

/// How a video of a given size is laid out in a window of bounded size.
///
/// Video is only ever scaled down, so that a cursor position in the window
/// maps to a whole pixel of the original frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    video: (u32, u32),
    scale: f64,
}

impl Viewport {
    pub fn fit(video_width: u32, video_height: u32, max_width: u32, max_height: u32) -> Self {
        let scale_w = max_width.max(1) as f64 / video_width.max(1) as f64;
        let scale_h = max_height.max(1) as f64 / video_height.max(1) as f64;

        Self {
            video: (video_width, video_height),
            scale: scale_w.min(scale_h).min(1.0),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Window size in pixels.
    pub fn display_size(&self) -> (u32, u32) {
        let w = (self.video.0 as f64 * self.scale) as u32;
        let h = (self.video.1 as f64 * self.scale) as u32;
        (w.max(1), h.max(1))
    }

    /// Maps a position inside the window to video pixel coordinates.
    pub fn to_video(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x as f64 / self.scale) as i32,
            (y as f64 / self.scale) as i32,
        )
    }

    /// Draws `frame` into a `0RGB` window buffer of `display_size()`.
    pub fn render(&self, frame: &RgbImage, buffer: &mut Vec<u32>) {
        let (w, h) = self.display_size();

        let resized;
        let frame = if frame.dimensions() == (w, h) {
            frame
        } else {
            resized = imageops::resize(frame, w, h, FilterType::Triangle);
            &resized
        };

        buffer.clear();
        buffer.extend(frame.pixels().map(|p| {
            let [r, g, b] = p.0;
            (r as u32) << 16 | (g as u32) << 8 | b as u32
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn small_video_is_not_upscaled() {
        let vp = Viewport::fit(640, 480, 1920, 1080);
        assert_eq!(vp.scale(), 1.0);
        assert_eq!(vp.display_size(), (640, 480));
        assert_eq!(vp.to_video(10.0, 20.0), (10, 20));
    }

    #[test]
    fn large_video_is_scaled_by_tighter_axis() {
        let vp = Viewport::fit(3840, 1600, 1920, 1080);
        assert_eq!(vp.scale(), 0.5);
        assert_eq!(vp.display_size(), (1920, 800));
    }

    #[test]
    fn cursor_maps_back_to_video_pixels() {
        let vp = Viewport::fit(3840, 2160, 1920, 1080);
        assert_eq!(vp.to_video(100.0, 50.5), (200, 101));
        assert_eq!(vp.to_video(0.0, 0.0), (0, 0));
    }

    #[test]
    fn zero_bounds_still_map_the_cursor() {
        let vp = Viewport::fit(64, 64, 0, 0);
        assert_eq!(vp.scale(), 1.0 / 64.0);
        assert_eq!(vp.display_size(), (1, 1));
        assert_eq!(vp.to_video(0.5, 0.0), (32, 0));
    }

    #[test]
    fn render_packs_pixels_as_0rgb() {
        let vp = Viewport::fit(2, 1, 100, 100);
        let mut frame = RgbImage::new(2, 1);
        frame.put_pixel(0, 0, Rgb([0x12, 0x34, 0x56]));
        frame.put_pixel(1, 0, Rgb([0xff, 0x00, 0x01]));

        let mut buffer = vec![7; 10];
        vp.render(&frame, &mut buffer);
        assert_eq!(buffer, vec![0x123456, 0xff0001]);
    }

    #[test]
    fn render_downscales_to_display_size() {
        let vp = Viewport::fit(8, 4, 4, 4);
        let frame = RgbImage::from_pixel(8, 4, Rgb([1, 2, 3]));

        let mut buffer = Vec::new();
        vp.render(&frame, &mut buffer);
        assert_eq!(buffer.len(), 4 * 2);
        assert!(buffer.iter().all(|&px| px == 0x010203));
    }
}
