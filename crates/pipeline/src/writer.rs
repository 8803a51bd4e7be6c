//! Append-only frame writer for landmark recordings.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use handctl_common::error::{HandctlError, HandctlResult};
use handctl_hand_model::landmark::{FrameInput, FrameStreamHeader};

/// Writes frames to a JSONL file, header first.
pub struct FrameWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    frames_written: u64,
}

impl FrameWriter {
    /// Create (or truncate) `path` and write the header as a `#` line.
    pub fn create(path: &Path, header: &FrameStreamHeader) -> HandctlResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);
        let header_json = serde_json::to_string(header)?;
        writeln!(writer, "# {header_json}")
            .map_err(|e| HandctlError::landmark_source(format!("Failed to write header: {e}")))?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            frames_written: 0,
        })
    }

    pub fn write_frame(&mut self, frame: &FrameInput) -> HandctlResult<()> {
        let json = serde_json::to_string(frame)?;
        writeln!(self.writer, "{json}")
            .map_err(|e| HandctlError::landmark_source(format!("Failed to write frame: {e}")))?;
        self.frames_written += 1;

        if self.frames_written % 300 == 0 {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> HandctlResult<()> {
        self.writer
            .flush()
            .map_err(|e| HandctlError::landmark_source(format!("Failed to flush frames: {e}")))
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FrameWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{JsonlReplaySource, LandmarkSource};
    use handctl_hand_model::synthetic::SyntheticHand;

    #[test]
    fn test_written_recording_replays() {
        let dir = std::env::temp_dir().join("handctl_test_writer");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("frames.jsonl");

        let mut header = FrameStreamHeader::new("2026-01-01T00:00:00Z", 1280, 720);
        header.frame_rate_hz = Some(30);
        header.source = "test".to_string();

        {
            let mut writer = FrameWriter::create(&path, &header).unwrap();
            let hand = SyntheticHand::new((640.0, 360.0)).pattern("01000");
            writer.write_frame(&hand.input(0)).unwrap();
            writer.write_frame(&FrameInput::empty(33_333_333)).unwrap();
            assert_eq!(writer.frames_written(), 2);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.lines().next().unwrap().starts_with("# "));

        let mut source = JsonlReplaySource::open(&path).unwrap();
        assert_eq!(source.header(), Some(&header));
        assert_eq!(source.remaining(), 2);
        let first = source.poll().unwrap().unwrap();
        assert_eq!(first.hands.len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
