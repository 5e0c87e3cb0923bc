mod command;
mod config;
pub mod mock;
pub mod sniff;

pub use command::CommandToolkit;
pub use config::MediaConfig;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} failed ({status}): {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Join(String),
}

/// Conversion tools the attachment pipeline relies on. Every call blocks the
/// caller until the output is complete.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Decode `src` and write it to `dst` as a WAV file.
    async fn transcode_audio(&self, src: &Path, dst: &Path) -> Result<(), MediaError>;

    /// Decode `src` and write it to `dst` as a compressed JPEG.
    async fn compress_image(&self, src: &Path, dst: &Path) -> Result<(), MediaError>;

    /// Shrink the PDF at `path`, replacing it only when compression succeeds.
    async fn compress_pdf(&self, path: &Path) -> Result<(), MediaError>;
}
