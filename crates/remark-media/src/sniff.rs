//! Content sniffing by magic bytes.

use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type detected from the file's leading bytes, if recognizable.
pub fn sniff_mime(path: &Path) -> std::io::Result<Option<&'static str>> {
    Ok(infer::get_from_path(path)?.map(|kind| kind.mime_type()))
}

/// Like [`sniff_mime`], falling back to `application/octet-stream`.
pub fn mime_or_octet_stream(path: &Path) -> std::io::Result<&'static str> {
    Ok(sniff_mime(path)?.unwrap_or(OCTET_STREAM))
}

pub fn is_gif(path: &Path) -> std::io::Result<bool> {
    Ok(sniff_mime(path)? == Some("image/gif"))
}
