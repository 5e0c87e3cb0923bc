use std::path::Path;
use std::sync::Arc;

use tempfile::TempPath;
use tracing::{debug, warn};

use remark_core::{AttachmentFormat, Comment, ContentType};
use remark_media::{sniff, MediaToolkit};

use crate::{ServiceError, Upload};

/// Converts uploads into their stored form. Placing the result in the store
/// is left to the caller, which orders it against the database update.
#[derive(Clone)]
pub struct AttachmentProcessor {
    toolkit: Arc<dyn MediaToolkit>,
}

/// A converted attachment waiting to be placed. The backing file is removed
/// on drop unless the store has already moved it.
#[derive(Debug)]
pub struct Converted {
    pub format: AttachmentFormat,
    file: ConvertedFile,
}

#[derive(Debug)]
enum ConvertedFile {
    Staged(TempPath),
    Upload(Upload),
}

impl Converted {
    pub fn path(&self) -> &Path {
        match &self.file {
            ConvertedFile::Staged(path) => &**path,
            ConvertedFile::Upload(upload) => upload.path(),
        }
    }
}

impl AttachmentProcessor {
    pub fn new(toolkit: Arc<dyn MediaToolkit>) -> Self {
        Self { toolkit }
    }

    /// Convert `upload` according to the comment's content type. Returns
    /// `None` when audio could not be transcoded. The upload's temporary
    /// file is released on every path out of this function, or later with
    /// the returned `Converted`.
    pub async fn convert(
        &self,
        comment: &Comment,
        upload: Upload,
    ) -> Result<Option<Converted>, ServiceError> {
        let converted = match comment.kind() {
            ContentType::Audio => {
                let staged = staging_file(".wav")?;
                if let Err(e) = self.toolkit.transcode_audio(upload.path(), &staged).await {
                    warn!("audio for comment {} could not be converted: {e}", comment.id);
                    return Ok(None);
                }
                Converted {
                    format: AttachmentFormat::Wav,
                    file: ConvertedFile::Staged(staged),
                }
            }
            ContentType::Image => {
                if sniff::is_gif(upload.path())? {
                    Converted {
                        format: AttachmentFormat::Gif,
                        file: ConvertedFile::Upload(upload),
                    }
                } else {
                    let staged = staging_file(".jpg")?;
                    self.toolkit.compress_image(upload.path(), &staged).await?;
                    Converted {
                        format: AttachmentFormat::Jpg,
                        file: ConvertedFile::Staged(staged),
                    }
                }
            }
            ContentType::Pdf => {
                if let Err(e) = self.toolkit.compress_pdf(upload.path()).await {
                    warn!("storing pdf for comment {} uncompressed: {e}", comment.id);
                }
                Converted {
                    format: AttachmentFormat::Pdf,
                    file: ConvertedFile::Upload(upload),
                }
            }
            ContentType::Text | ContentType::Discussion => {
                return Err(ServiceError::InvalidInput(format!(
                    "{} comments do not take attachments",
                    comment.kind()
                )));
            }
        };

        debug!("converted {} upload for comment {}", converted.format, comment.id);
        Ok(Some(converted))
    }
}

/// Scratch output file, deleted on drop unless moved into the store.
fn staging_file(suffix: &str) -> Result<TempPath, ServiceError> {
    let file = tempfile::Builder::new()
        .prefix("comment")
        .suffix(suffix)
        .tempfile()?;
    Ok(file.into_temp_path())
}
