use std::io::Write;
use std::path::Path;

use tempfile::TempPath;

/// An uploaded file held in a temporary location. The file is removed when
/// the `Upload` is dropped, whichever way processing ends.
#[derive(Debug)]
pub struct Upload {
    path: TempPath,
}

impl Upload {
    pub fn from_temp_path(path: TempPath) -> Self {
        Self { path }
    }

    pub fn from_bytes(bytes: &[u8]) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new().prefix("upload").tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self::from_temp_path(file.into_temp_path()))
    }

    /// Copy an existing file into a fresh temporary upload.
    pub fn copy_from(src: &Path) -> std::io::Result<Self> {
        let file = tempfile::Builder::new().prefix("upload").tempfile()?;
        std::fs::copy(src, file.path())?;
        Ok(Self::from_temp_path(file.into_temp_path()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
