//! Per-key CSV files.
//!
//! Every letter key owns one append-only file, `<key>.csv`, in the output
//! directory. Files start with a `frame,x,y` header and are only ever
//! appended to, so reopening a session keeps what was recorded before.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use serde::Serialize;

use crate::error::CaptureResult;

const HEADER: [&str; 3] = ["frame", "x", "y"];

/// One saved cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Record {
    pub frame: u64,
    pub x: i32,
    pub y: i32,
}

/// Whether selecting a key created its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Created,
    Existing,
}

pub struct OutputFiles {
    dir: PathBuf,
    writers: HashMap<char, csv::Writer<File>>,
}

impl OutputFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            writers: HashMap::new(),
        }
    }

    pub fn path_for(&self, key: char) -> PathBuf {
        self.dir.join(format!("{}.csv", key))
    }

    /// Open the file for `key`, creating it with a header if needed.
    pub fn select(&mut self, key: char) -> CaptureResult<Selection> {
        if self.writers.contains_key(&key) {
            return Ok(Selection::Existing);
        }

        let path = self.path_for(key);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let fresh = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if fresh {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }

        self.writers.insert(key, writer);

        Ok(if fresh {
            Selection::Created
        } else {
            Selection::Existing
        })
    }

    /// Append one row to the file for `key` and flush it to disk.
    pub fn append(&mut self, key: char, record: &Record) -> CaptureResult<()> {
        self.select(key)?;

        if let Some(writer) = self.writers.get_mut(&key) {
            writer.serialize(record)?;
            writer.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn new_file_gets_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = OutputFiles::new(dir.path());

        assert_eq!(files.select('a').unwrap(), Selection::Created);
        assert_eq!(read(&dir.path().join("a.csv")), "frame,x,y\n");
    }

    #[test]
    fn rows_follow_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = OutputFiles::new(dir.path());

        files.append('a', &Record { frame: 0, x: 10, y: 20 }).unwrap();
        files.append('a', &Record { frame: 3, x: -1, y: 7 }).unwrap();

        assert_eq!(read(&files.path_for('a')), "frame,x,y\n0,10,20\n3,-1,7\n");
    }

    #[test]
    fn reselecting_does_not_truncate() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = OutputFiles::new(dir.path());

        files.append('b', &Record { frame: 1, x: 2, y: 3 }).unwrap();
        assert_eq!(files.select('b').unwrap(), Selection::Existing);
        assert_eq!(read(&files.path_for('b')), "frame,x,y\n1,2,3\n");
    }

    #[test]
    fn existing_file_from_earlier_run_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.csv");
        std::fs::write(&path, "frame,x,y\n5,6,7\n").unwrap();

        let mut files = OutputFiles::new(dir.path());
        assert_eq!(files.select('c').unwrap(), Selection::Existing);
        files.append('c', &Record { frame: 8, x: 9, y: 10 }).unwrap();

        assert_eq!(read(&path), "frame,x,y\n5,6,7\n8,9,10\n");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = OutputFiles::new(dir.path().join("nope"));
        assert!(files.select('a').is_err());
    }
}
