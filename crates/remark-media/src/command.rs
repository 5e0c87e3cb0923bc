use std::io::{BufWriter, Write};
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ImageReader;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{MediaConfig, MediaError, MediaToolkit};

/// `MediaToolkit` backed by ffmpeg, Ghostscript and the `image` crate.
pub struct CommandToolkit {
    config: MediaConfig,
}

impl CommandToolkit {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Run `cmd` to completion under the configured timeout. The child is
    /// killed if the timeout fires or the future is dropped.
    async fn run(&self, program: &str, cmd: &mut Command) -> Result<(), MediaError> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.config.timeout, cmd.output())
            .await
            .map_err(|_| MediaError::Timeout {
                program: program.to_string(),
                timeout: self.config.timeout,
            })?
            .map_err(|source| MediaError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(MediaError::Command {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MediaToolkit for CommandToolkit {
    async fn transcode_audio(&self, src: &Path, dst: &Path) -> Result<(), MediaError> {
        debug!("transcoding {} to wav", src.display());
        let mut cmd = Command::new(&self.config.ffmpeg_bin);
        cmd.arg("-nostdin")
            .arg("-y")
            .args(["-loglevel", "error"])
            .arg("-i")
            .arg(src)
            .args(["-vn", "-acodec", "pcm_s16le", "-f", "wav"])
            .arg(dst);
        self.run(&self.config.ffmpeg_bin, &mut cmd).await
    }

    async fn compress_image(&self, src: &Path, dst: &Path) -> Result<(), MediaError> {
        let src = src.to_path_buf();
        let dst = dst.to_path_buf();
        let quality = self.config.jpeg_quality;
        let max_dim = self.config.max_image_dimension;
        tokio::task::spawn_blocking(move || encode_jpeg(&src, &dst, quality, max_dim))
            .await
            .map_err(|e| MediaError::Join(e.to_string()))?
    }

    async fn compress_pdf(&self, path: &Path) -> Result<(), MediaError> {
        let dir = path.parent().unwrap_or(Path::new("."));
        let out = tempfile::Builder::new()
            .prefix("compress")
            .suffix(".pdf")
            .tempfile_in(dir)?
            .into_temp_path();

        let mut cmd = Command::new(&self.config.gs_bin);
        cmd.args([
            "-sDEVICE=pdfwrite",
            "-dCompatibilityLevel=1.4",
            "-dPDFSETTINGS=/ebook",
            "-dNOPAUSE",
            "-dQUIET",
            "-dBATCH",
        ])
        .arg(output_file_arg(&out))
        .arg(path);
        self.run(&self.config.gs_bin, &mut cmd).await?;

        let before = tokio::fs::metadata(path).await?.len();
        let after = tokio::fs::metadata(&out).await?.len();
        if after == 0 || after >= before {
            debug!("keeping original pdf ({before} bytes, compressed {after})");
            return Ok(());
        }
        out.persist(path).map_err(|e| MediaError::Io(e.error))?;
        info!("compressed pdf {} from {before} to {after} bytes", path.display());
        Ok(())
    }
}

fn output_file_arg(path: &Path) -> String {
    format!("-sOutputFile={}", path.display())
}

fn encode_jpeg(src: &Path, dst: &Path, quality: u8, max_dim: u32) -> Result<(), MediaError> {
    let mut img = ImageReader::open(src)?.with_guessed_format()?.decode()?;
    if img.width() > max_dim || img.height() > max_dim {
        img = img.resize(max_dim, max_dim, FilterType::Lanczos3);
    }
    let rgb = img.to_rgb8();

    let mut writer = BufWriter::new(std::fs::File::create(dst)?);
    JpegEncoder::new_with_quality(&mut writer, quality).encode_image(&rgb)?;
    writer.flush()?;
    Ok(())
}
