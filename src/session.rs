use crate::error::CaptureResult;
use crate::input::Command;
use crate::output::{OutputFiles, Record, Selection};

/// What the loop should do after a command was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    TogglePause,
    Quit,
}

/// State carried through the capture loop.
pub struct Session {
    files: OutputFiles,
    active: Option<char>,
    frame: u64,
    cursor: Option<(i32, i32)>,
    saved: u64,
}

impl Session {
    pub fn new(files: OutputFiles) -> Self {
        Self {
            files,
            active: None,
            frame: 0,
            cursor: None,
            saved: 0,
        }
    }

    pub fn set_frame(&mut self, index: u64) {
        self.frame = index;
    }

    /// Cursor position in video coordinates.
    pub fn move_cursor(&mut self, x: i32, y: i32) {
        self.cursor = Some((x, y));
    }

    pub fn active(&self) -> Option<char> {
        self.active
    }

    /// Number of records written so far.
    pub fn saved(&self) -> u64 {
        self.saved
    }

    pub fn select(&mut self, key: char) -> CaptureResult<()> {
        let selection = self.files.select(key)?;
        let path = self.files.path_for(key);

        match selection {
            Selection::Created => tracing::info!("created new output file {}", path.display()),
            Selection::Existing => tracing::info!("switched to output file {}", path.display()),
        }

        self.active = Some(key);
        Ok(())
    }

    /// Save the cursor position for the current frame into the active file.
    ///
    /// Nothing is written, and `None` returned, until a file has been
    /// selected and the cursor has been over the video at least once.
    pub fn trigger(&mut self) -> CaptureResult<Option<Record>> {
        let Some(key) = self.active else {
            tracing::warn!("no output file selected, press a letter key first");
            return Ok(None);
        };
        let Some((x, y)) = self.cursor else {
            tracing::warn!("cursor position unknown, move the mouse over the video");
            return Ok(None);
        };

        let record = Record {
            frame: self.frame,
            x,
            y,
        };
        self.files.append(key, &record)?;
        self.saved += 1;

        tracing::debug!(
            "saved frame {}: x={}, y={} to {}.csv",
            record.frame,
            record.x,
            record.y,
            key
        );

        Ok(Some(record))
    }

    pub fn apply(&mut self, command: Command) -> CaptureResult<Flow> {
        match command {
            Command::Select(key) => self.select(key)?,
            Command::Trigger => {
                self.trigger()?;
            }
            Command::TogglePause => return Ok(Flow::TogglePause),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn session(dir: &Path) -> Session {
        Session::new(OutputFiles::new(dir))
    }

    #[test]
    fn trigger_without_selection_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        s.move_cursor(1, 2);

        assert_eq!(s.trigger().unwrap(), None);
        assert_eq!(s.saved(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn trigger_without_cursor_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        s.select('a').unwrap();

        assert_eq!(s.trigger().unwrap(), None);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.csv")).unwrap(),
            "frame,x,y\n"
        );
    }

    #[test]
    fn trigger_goes_to_most_recent_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());

        s.select('a').unwrap();
        s.select('b').unwrap();
        s.set_frame(4);
        s.move_cursor(5, 6);

        assert_eq!(
            s.trigger().unwrap(),
            Some(Record { frame: 4, x: 5, y: 6 })
        );
        assert_eq!(s.active(), Some('b'));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.csv")).unwrap(),
            "frame,x,y\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("b.csv")).unwrap(),
            "frame,x,y\n4,5,6\n"
        );
    }

    #[test]
    fn apply_reports_loop_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());

        assert_eq!(s.apply(Command::Select('x')).unwrap(), Flow::Continue);
        assert_eq!(s.apply(Command::Trigger).unwrap(), Flow::Continue);
        assert_eq!(s.apply(Command::TogglePause).unwrap(), Flow::TogglePause);
        assert_eq!(s.apply(Command::Quit).unwrap(), Flow::Quit);
        assert_eq!(s.active(), Some('x'));
    }
}
