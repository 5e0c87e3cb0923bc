use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{MediaError, MediaToolkit};

/// Minimal RIFF/WAVE header, enough for magic-byte sniffing.
pub const FAKE_WAV: &[u8] = b"RIFF\x24\x00\x00\x00WAVEfmt \x10\x00\x00\x00";
/// JPEG SOI + JFIF APP0 marker.
pub const FAKE_JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00";

/// A toolkit for tests that writes canned output instead of running tools.
#[derive(Default)]
pub struct MockToolkit {
    fail_audio: bool,
    fail_pdf: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl MockToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `transcode_audio` fail as if the input could not be decoded.
    pub fn failing_audio(mut self) -> Self {
        self.fail_audio = true;
        self
    }

    /// Make `compress_pdf` fail as if Ghostscript were missing.
    pub fn failing_pdf(mut self) -> Self {
        self.fail_pdf = true;
        self
    }

    /// Names of the operations invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

fn failure(program: &str) -> MediaError {
    MediaError::Command {
        program: program.to_string(),
        status: "exit status: 1".into(),
        stderr: "invalid data found when processing input".into(),
    }
}

#[async_trait]
impl MediaToolkit for MockToolkit {
    async fn transcode_audio(&self, _src: &Path, dst: &Path) -> Result<(), MediaError> {
        self.record("transcode_audio");
        if self.fail_audio {
            return Err(failure("ffmpeg"));
        }
        tokio::fs::write(dst, FAKE_WAV).await?;
        Ok(())
    }

    async fn compress_image(&self, _src: &Path, dst: &Path) -> Result<(), MediaError> {
        self.record("compress_image");
        tokio::fs::write(dst, FAKE_JPEG).await?;
        Ok(())
    }

    async fn compress_pdf(&self, _path: &Path) -> Result<(), MediaError> {
        self.record("compress_pdf");
        if self.fail_pdf {
            return Err(failure("gs"));
        }
        Ok(())
    }
}
