use std::time::Duration;

/// Settings for the external conversion tools.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// ffmpeg binary used for audio transcoding.
    pub ffmpeg_bin: String,
    /// Ghostscript binary used for PDF compression.
    pub gs_bin: String,
    /// Upper bound on any single external conversion.
    pub timeout: Duration,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
    /// Images larger than this on either side are scaled down.
    pub max_image_dimension: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".into(),
            gs_bin: "gs".into(),
            timeout: Duration::from_secs(120),
            jpeg_quality: 75,
            max_image_dimension: 2048,
        }
    }
}

impl MediaConfig {
    /// Defaults overridden by `REMARK_FFMPEG`, `REMARK_GS`,
    /// `REMARK_MEDIA_TIMEOUT` (seconds) and `REMARK_JPEG_QUALITY`.
    /// Unparseable numbers keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(bin) = std::env::var("REMARK_FFMPEG") {
            config.ffmpeg_bin = bin;
        }
        if let Ok(bin) = std::env::var("REMARK_GS") {
            config.gs_bin = bin;
        }
        if let Some(secs) = std::env::var("REMARK_MEDIA_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(q) = std::env::var("REMARK_JPEG_QUALITY")
            .ok()
            .and_then(|v| v.parse::<u8>().ok())
            .filter(|q| (1..=100).contains(q))
        {
            config.jpeg_quality = q;
        }
        config
    }
}
