//! Play a video and mark cursor positions per frame.
//!
//! Letter keys pick an output file (`a` → `a.csv`), shift saves the cursor
//! position on the displayed frame as a `frame,x,y` row in that file.

pub mod capture;
pub mod error;
pub mod input;
pub mod output;
pub mod session;
pub mod surface;
pub mod video;
pub mod viewport;

pub use capture::{run, CaptureOptions, Summary};
pub use error::{CaptureError, CaptureResult};
pub use input::Command;
pub use output::{OutputFiles, Record, Selection};
pub use session::{Flow, Session};
pub use surface::{Surface, WindowSurface};
pub use video::{Frame, FrameSource, VideoSource};
pub use viewport::Viewport;
